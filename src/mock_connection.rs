//! A scripted [`Connection`] for unit tests.
//!
//! Every executed operation is recorded as one rendered command string in a
//! shared [`CommandLog`], so tests can assert the exact protocol
//! conversation, order included, the same way they would inspect bytes
//! written to a mock stream. Builder-style `with_*` knobs script the
//! responses.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::types::{Flag, StoreAction, Uid};
use crate::utils::iter_join;

/// A cloneable view of the commands a [`MockConnection`] has executed,
/// usable even after the session has taken ownership of the connection.
#[derive(Clone, Default)]
pub(crate) struct CommandLog(Rc<RefCell<Vec<String>>>);

impl CommandLog {
    fn push(&self, command: String) {
        self.0.borrow_mut().push(command);
    }

    pub(crate) fn commands(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub(crate) fn count_of(&self, prefix: &str) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|command| command.starts_with(prefix))
            .count()
    }
}

#[derive(Default)]
pub(crate) struct MockConnection {
    log: CommandLog,
    /// Queued `uid_search` results, handed out in order; an exhausted queue
    /// yields empty results.
    searches: VecDeque<Vec<Uid>>,
    bodies: HashMap<Uid, Vec<u8>>,
    lists: HashMap<String, Vec<String>>,
    /// Labels that reject copies until `create` provisions them.
    missing_labels: HashSet<String>,
    /// Labels that reject copies even after `create`.
    uncreatable_labels: HashSet<String>,
    reject_login: bool,
    fail_stores: bool,
}

impl MockConnection {
    pub(crate) fn new() -> MockConnection {
        MockConnection::default()
    }

    pub(crate) fn log(&self) -> CommandLog {
        self.log.clone()
    }

    pub(crate) fn with_search(mut self, uids: Vec<Uid>) -> Self {
        self.searches.push_back(uids);
        self
    }

    pub(crate) fn with_body(mut self, uid: Uid, raw: &[u8]) -> Self {
        self.bodies.insert(uid, raw.to_vec());
        self
    }

    pub(crate) fn with_list(mut self, reference: &str, names: &[&str]) -> Self {
        self.lists.insert(
            reference.to_string(),
            names.iter().map(|name| name.to_string()).collect(),
        );
        self
    }

    pub(crate) fn with_missing_label(mut self, name: &str) -> Self {
        self.missing_labels.insert(name.to_string());
        self
    }

    pub(crate) fn with_uncreatable_label(mut self, name: &str) -> Self {
        self.uncreatable_labels.insert(name.to_string());
        self
    }

    pub(crate) fn with_rejected_login(mut self) -> Self {
        self.reject_login = true;
        self
    }

    pub(crate) fn with_failing_stores(mut self) -> Self {
        self.fail_stores = true;
        self
    }

    fn no(explain: impl Into<String>) -> Error {
        Error::Imap(imap::Error::No(explain.into()))
    }
}

impl Connection for MockConnection {
    fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.log.push(format!("LOGIN {} {}", username, password));
        if self.reject_login {
            return Err(Error::Authentication("invalid credentials".to_string()));
        }
        Ok(())
    }

    fn logout(&mut self) -> Result<()> {
        self.log.push("LOGOUT".to_string());
        Ok(())
    }

    fn select(&mut self, mailbox: &str) -> Result<()> {
        self.log.push(format!("SELECT {}", mailbox));
        Ok(())
    }

    fn uid_search(&mut self, terms: &[String]) -> Result<Vec<Uid>> {
        self.log.push(format!("UID SEARCH {}", terms.join(" ")));
        Ok(self.searches.pop_front().unwrap_or_default())
    }

    fn uid_store(&mut self, uid: Uid, action: StoreAction, flags: &[Flag]) -> Result<()> {
        self.log
            .push(format!("UID STORE {} {} ({})", uid, action, iter_join(flags, " ")));
        if self.fail_stores {
            return Err(Self::no("STORE rejected"));
        }
        Ok(())
    }

    fn uid_copy(&mut self, uid: Uid, mailbox: &str) -> Result<()> {
        self.log.push(format!("UID COPY {} {}", uid, mailbox));
        if self.missing_labels.contains(mailbox) || self.uncreatable_labels.contains(mailbox) {
            return Err(Self::no(format!("[TRYCREATE] No folder {}", mailbox)));
        }
        Ok(())
    }

    fn uid_fetch_body(&mut self, uid: Uid) -> Result<Vec<u8>> {
        self.log.push(format!("UID FETCH {} RFC822", uid));
        self.bodies.get(&uid).cloned().ok_or(Error::MissingBody)
    }

    fn create(&mut self, mailbox: &str) -> Result<()> {
        self.log.push(format!("CREATE {}", mailbox));
        self.missing_labels.remove(mailbox);
        Ok(())
    }

    fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<String>> {
        self.log.push(format!("LIST {:?} {}", reference, pattern));
        Ok(self.lists.get(reference).cloned().unwrap_or_default())
    }
}
