//! Identifier-addressed message handles and their operations.

use std::cell::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::debug;

use crate::connection::Connection;
use crate::error::{Error, Result};
use crate::mail::Mail;
use crate::mailbox::MailboxState;
use crate::session::Gmail;
use crate::types::{Flag, Mark, StoreAction, Uid};

/// Gmail's archive destination.
const ALL_MAIL: &str = "[Gmail]/All Mail";
/// Gmail's spam destination.
const SPAM: &str = "[Gmail]/Spam";

/// Shared state for one message handle: its uid and, once fetched, its
/// parsed body. A state can only be constructed around a uid, since an
/// unaddressable message handle is meaningless.
pub(crate) struct MessageState {
    uid: Uid,
    mail: OnceCell<Mail>,
}

impl MessageState {
    pub(crate) fn new(uid: Uid) -> MessageState {
        MessageState {
            uid,
            mail: OnceCell::new(),
        }
    }
}

/// One addressable message in a mailbox.
///
/// Handles come out of [`Mailbox::emails`](crate::Mailbox::emails) and are
/// memoized per uid: searching the same mailbox twice hands back handles
/// sharing the same state, including the lazily fetched body.
///
/// The flag/mark/move family reports plain booleans rather than result
/// codes: `true` when the command completed without error, `false`
/// otherwise, with failures logged at debug level. [`Message::label`] and
/// [`Message::label_or_create`] return proper errors since callers need to
/// distinguish a missing label.
pub struct Message<'g, C: Connection> {
    session: &'g Gmail<C>,
    mailbox: Rc<MailboxState>,
    pub(crate) state: Rc<MessageState>,
}

impl<'g, C: Connection> Clone for Message<'g, C> {
    fn clone(&self) -> Self {
        Message {
            session: self.session,
            mailbox: Rc::clone(&self.mailbox),
            state: Rc::clone(&self.state),
        }
    }
}

impl<'g, C: Connection> Message<'g, C> {
    pub(crate) fn new(
        session: &'g Gmail<C>,
        mailbox: Rc<MailboxState>,
        state: Rc<MessageState>,
    ) -> Self {
        Message {
            session,
            mailbox,
            state,
        }
    }

    /// The protocol-assigned unique identifier of this message.
    pub fn uid(&self) -> Uid {
        self.state.uid
    }

    fn store(&self, action: StoreAction, flag: Flag) -> Result<()> {
        self.session.with_selected(self.mailbox.name(), || {
            self.session
                .conn()?
                .uid_store(self.state.uid, action, &[flag])
        })
    }

    fn succeeded(&self, what: &str, result: Result<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => {
                debug!("{} on uid {} failed: {}", what, self.state.uid, err);
                false
            }
        }
    }

    /// Set `flag` on this message. True iff the store completed without the
    /// connection raising an error.
    pub fn flag(&self, flag: Flag) -> bool {
        let result = self.store(StoreAction::Add, flag);
        self.succeeded("flag", result)
    }

    /// Clear `flag` on this message.
    pub fn unflag(&self, flag: Flag) -> bool {
        let result = self.store(StoreAction::Remove, flag);
        self.succeeded("unflag", result)
    }

    /// Mark this message read, unread, deleted, or spam.
    pub fn mark(&self, mark: Mark) -> bool {
        match mark {
            Mark::Read => self.flag(Flag::Seen),
            Mark::Unread => self.unflag(Flag::Seen),
            Mark::Deleted => self.flag(Flag::Deleted),
            Mark::Spam => self.move_to(SPAM),
        }
    }

    /// Drop this message from its mailbox's cache and flag it `\Deleted`.
    ///
    /// The server-side deletion stays advisory until an expunge, which this
    /// crate does not issue. The handle itself remains readable; the next
    /// search on the mailbox re-resolves the uid fresh if it still exists.
    pub fn delete(&self) -> bool {
        self.mailbox.messages.borrow_mut().remove(&self.state.uid);
        self.flag(Flag::Deleted)
    }

    /// Copy this message into the label `name`.
    ///
    /// If the server reports that no such label exists this fails with
    /// [`Error::NoLabel`]; use [`Message::label_or_create`] to provision it
    /// on demand.
    pub fn label(&self, name: &str) -> Result<()> {
        self.session.with_selected(self.mailbox.name(), || {
            self.session
                .conn()?
                .uid_copy(self.state.uid, name)
                .map_err(|err| match err {
                    Error::Imap(imap::Error::No(_)) => Error::NoLabel(name.to_string()),
                    other => other,
                })
        })
    }

    /// Like [`Message::label`], but when the label is missing it is created
    /// and the copy retried, once. A second failure propagates.
    pub fn label_or_create(&self, name: &str) -> Result<()> {
        match self.label(name) {
            Err(Error::NoLabel(_)) => {
                debug!("provisioning missing label {}", name);
                self.session.create_label(name)?;
                self.label(name)
            }
            result => result,
        }
    }

    /// Copy this message into `name`, then delete it here. True only when
    /// both steps succeed; the delete is skipped if the copy fails.
    ///
    /// This is copy-then-remove, not an atomic server-side move.
    pub fn move_to(&self, name: &str) -> bool {
        let labeled = self.label(name);
        self.succeeded("move", labeled) && self.delete()
    }

    /// Move this message to `[Gmail]/All Mail`.
    pub fn archive(&self) -> bool {
        self.move_to(ALL_MAIL)
    }

    /// The parsed message body.
    ///
    /// Fetched lazily, at most once per handle: the first call issues a
    /// `UID FETCH` for the full body and parses it, subsequent calls return
    /// the cached [`Mail`] with no protocol traffic.
    pub fn mail(&self) -> Result<&Mail> {
        if let Some(mail) = self.state.mail.get() {
            return Ok(mail);
        }
        let raw = self.session.with_selected(self.mailbox.name(), || {
            self.session.conn()?.uid_fetch_body(self.state.uid)
        })?;
        let mail = Mail::parse(raw)?;
        Ok(self.state.mail.get_or_init(|| mail))
    }

    /// Write every attachment of this message into `dir`, returning the
    /// written paths. Fetches the body if it has not been fetched yet.
    pub fn save_attachments_to(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        self.mail()?
            .attachments()
            .iter()
            .map(|attachment| attachment.save_to_file(dir))
            .collect()
    }
}

impl<'g, C: Connection> fmt::Debug for Message<'g, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Message(mailbox={} uid={})",
            self.mailbox.name(),
            self.state.uid
        )
    }
}
