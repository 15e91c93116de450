//! Mailboxes (labels) and their per-uid message handle cache.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::connection::Connection;
use crate::error::Result;
use crate::message::{Message, MessageState};
use crate::search::Query;
use crate::session::Gmail;
use crate::types::Uid;

/// Session-owned state for one mailbox name. Lives in the session registry
/// for the lifetime of the session; [`Mailbox`] handles share it.
pub(crate) struct MailboxState {
    name: String,
    /// One message state per uid for the lifetime of the mailbox, so every
    /// search resolving the same uid hands back the same handle state.
    pub(crate) messages: RefCell<HashMap<Uid, Rc<MessageState>>>,
}

impl MailboxState {
    pub(crate) fn new(name: &str) -> MailboxState {
        MailboxState {
            name: name.to_string(),
            messages: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }
}

/// One named container of messages.
///
/// Handles are cheap to clone and all refer to the same session-owned
/// state; obtain them through [`Gmail::mailbox`] (or [`Gmail::inbox`]),
/// never by construction, so the one-instance-per-name guarantee holds.
pub struct Mailbox<'g, C: Connection> {
    pub(crate) session: &'g Gmail<C>,
    pub(crate) state: Rc<MailboxState>,
}

impl<'g, C: Connection> Clone for Mailbox<'g, C> {
    fn clone(&self) -> Self {
        Mailbox {
            session: self.session,
            state: Rc::clone(&self.state),
        }
    }
}

impl<'g, C: Connection> Mailbox<'g, C> {
    pub(crate) fn new(session: &'g Gmail<C>, state: Rc<MailboxState>) -> Self {
        Mailbox { session, state }
    }

    /// The server-addressable mailbox name.
    pub fn name(&self) -> &str {
        self.state.name()
    }

    /// Search this mailbox and return a handle for every matching message,
    /// in the order the connection reports them.
    ///
    /// A uid seen before resolves to its cached handle state; a new uid
    /// gets a fresh one. An invalid `query` fails before anything is sent.
    pub fn emails(&self, query: &Query) -> Result<Vec<Message<'g, C>>> {
        let terms = query.build()?;
        self.session.with_selected(self.state.name(), || {
            let uids = self.session.conn()?.uid_search(&terms)?;
            let mut cache = self.state.messages.borrow_mut();
            Ok(uids
                .into_iter()
                .map(|uid| {
                    let state = cache
                        .entry(uid)
                        .or_insert_with(|| Rc::new(MessageState::new(uid)))
                        .clone();
                    Message::new(self.session, Rc::clone(&self.state), state)
                })
                .collect())
        })
    }

    /// How many messages match `query`. This is the length of
    /// [`Mailbox::emails`], not a separate protocol call.
    pub fn count(&self, query: &Query) -> Result<usize> {
        Ok(self.emails(query)?.len())
    }

    /// The current contents of the message cache, in ascending uid order.
    /// Empty until the first search.
    pub fn messages(&self) -> Vec<Message<'g, C>> {
        let cache = self.state.messages.borrow();
        let mut handles: Vec<Message<'g, C>> = cache
            .values()
            .map(|state| Message::new(self.session, Rc::clone(&self.state), Rc::clone(state)))
            .collect();
        handles.sort_by_key(Message::uid);
        handles
    }
}

impl<'g, C: Connection> fmt::Debug for Mailbox<'g, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mailbox({})", self.state.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_connection::MockConnection;
    use crate::session::Credentials;
    use crate::Error;

    fn session(mock: MockConnection) -> Gmail<MockConnection> {
        Gmail::with_connection(mock, Credentials::new("alice", "secret"))
    }

    #[test]
    fn search_returns_handles_in_reported_order() {
        let mock = MockConnection::new().with_search(vec![101, 100]);
        let log = mock.log();
        let gmail = session(mock);

        let found = gmail.inbox().emails(&Query::all()).unwrap();

        assert_eq!(vec![101, 100], found.iter().map(|m| m.uid()).collect::<Vec<_>>());
        assert_eq!(
            vec![
                "LOGIN alice@gmail.com secret",
                "SELECT inbox",
                "UID SEARCH ALL",
            ],
            log.commands()
        );
    }

    #[test]
    fn repeated_searches_reuse_cached_handles() {
        let mock = MockConnection::new()
            .with_search(vec![100, 101])
            .with_search(vec![100]);
        let gmail = session(mock);
        let inbox = gmail.inbox();

        let first = inbox.emails(&Query::all()).unwrap();
        let second = inbox.emails(&Query::unread()).unwrap();

        assert!(Rc::ptr_eq(&first[0].state, &second[0].state));
    }

    #[test]
    fn count_is_the_search_length() {
        let mock = MockConnection::new()
            .with_search(vec![])
            .with_search(vec![7, 8, 9]);
        let log = mock.log();
        let gmail = session(mock);
        let inbox = gmail.inbox();

        assert_eq!(0, inbox.count(&Query::all()).unwrap());
        assert_eq!(3, inbox.count(&Query::all()).unwrap());
        // count never issues protocol work beyond the search itself
        assert_eq!(2, log.count_of("UID SEARCH"));
    }

    #[test]
    fn cache_is_empty_until_a_search_runs() {
        let gmail = session(MockConnection::new());
        assert!(gmail.inbox().messages().is_empty());
    }

    #[test]
    fn cache_view_holds_exactly_the_seen_uids() {
        let mock = MockConnection::new().with_search(vec![101, 100]);
        let gmail = session(mock);
        let inbox = gmail.inbox();

        let found = inbox.emails(&Query::all()).unwrap();
        let cached = inbox.messages();

        assert_eq!(vec![100, 101], cached.iter().map(|m| m.uid()).collect::<Vec<_>>());
        let by_uid = |uid| found.iter().find(|m| m.uid() == uid).unwrap();
        assert!(Rc::ptr_eq(&by_uid(100).state, &cached[0].state));
        assert!(Rc::ptr_eq(&by_uid(101).state, &cached[1].state));
    }

    #[test]
    fn invalid_queries_fail_before_any_protocol_work() {
        let mock = MockConnection::new();
        let log = mock.log();
        let gmail = session(mock);

        let result = gmail.inbox().emails(&Query::raw(["ALL"]).from("Me"));

        assert!(matches!(result, Err(Error::BadQuery(_))));
        assert!(log.commands().is_empty());
    }

    #[test]
    fn unread_search_end_to_end() {
        // "alice" normalizes to alice@gmail.com; an unread search on inbox
        // against a connection reporting 100 and 101 yields those handles,
        // and the cache then holds exactly those two entries.
        let mock = MockConnection::new().with_search(vec![100, 101]);
        let log = mock.log();
        let gmail = session(mock);
        assert_eq!("alice@gmail.com", gmail.username());

        let inbox = gmail.inbox();
        let found = inbox.emails(&Query::unread()).unwrap();

        assert_eq!(vec![100, 101], found.iter().map(|m| m.uid()).collect::<Vec<_>>());
        assert_eq!(1, log.count_of("UID SEARCH UNSEEN"));

        let cached = inbox.messages();
        assert_eq!(2, cached.len());
        assert!(Rc::ptr_eq(&found[0].state, &cached[0].state));
        assert!(Rc::ptr_eq(&found[1].state, &cached[1].state));
    }
}
