//! The session layer: credentials, lazy authentication, and the
//! mailbox-selection stack.

use std::cell::{Cell, RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use log::{debug, trace};

use crate::connection::{Connection, TlsConnection};
use crate::error::Result;
use crate::mailbox::{Mailbox, MailboxState};

const IMAP_DOMAIN: &str = "imap.gmail.com";
const IMAP_PORT: u16 = 993;
const DEFAULT_DOMAIN: &str = "gmail.com";

/// Provider-reserved labels live under this namespace, distinct from
/// user-created top-level labels.
pub(crate) const SYSTEM_PREFIX: &str = "[Gmail]/";

/// An immutable account credential pair.
///
/// A bare username (one without `@`) is normalized to the Gmail domain at
/// construction time; a full address is kept verbatim.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Build credentials, normalizing the username.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Credentials {
        let username = username.into();
        let username = if username.contains('@') {
            username
        } else {
            format!("{}@{}", username, DEFAULT_DOMAIN)
        };
        Credentials {
            username,
            password: password.into(),
        }
    }

    /// The normalized account address.
    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    // The secret must not leak into logs or debug dumps.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A Gmail session over one connection.
///
/// The session owns the connection exclusively and defers `LOGIN` until the
/// first operation that needs the wire. Only one mailbox can be selected on
/// the connection at a time; the session serializes selection with a stack
/// so that nested operations against different mailboxes leave each other's
/// selection state intact (see [`Mailbox`] and [`Message`](crate::Message)).
///
/// A session is driven by one sequential caller. The handles it produces
/// share state through `Rc`, so none of these types cross threads; the
/// compiler enforces what the protocol requires anyway.
///
/// Dropping a session that is still authenticated logs it out, best-effort,
/// so the connection is released even when the caller never calls
/// [`Gmail::logout`].
pub struct Gmail<C: Connection = TlsConnection> {
    credentials: Credentials,
    conn: RefCell<C>,
    authenticated: Cell<bool>,
    /// Name of the mailbox currently selected on the wire. Always the top
    /// of `stack`, or `None` when the stack is empty.
    selected: RefCell<Option<String>>,
    stack: RefCell<Vec<String>>,
    mailboxes: RefCell<HashMap<String, Rc<MailboxState>>>,
}

impl Gmail<TlsConnection> {
    /// Open a TLS connection to the Gmail IMAP endpoint.
    ///
    /// No credentials are sent yet: login happens transparently when the
    /// first protocol operation requires it, or explicitly via
    /// [`Gmail::login`].
    pub fn connect(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let conn = TlsConnection::open(IMAP_DOMAIN, IMAP_PORT)?;
        Ok(Gmail::with_connection(
            conn,
            Credentials::new(username, password),
        ))
    }
}

impl<C: Connection> Gmail<C> {
    /// Build a session over an already-opened connection. This is how a
    /// non-TLS or scripted [`Connection`] backend is plugged in.
    pub fn with_connection(conn: C, credentials: Credentials) -> Gmail<C> {
        Gmail {
            credentials,
            conn: RefCell::new(conn),
            authenticated: Cell::new(false),
            selected: RefCell::new(None),
            stack: RefCell::new(Vec::new()),
            mailboxes: RefCell::new(HashMap::new()),
        }
    }

    /// The normalized account address this session authenticates as.
    pub fn username(&self) -> &str {
        self.credentials.username()
    }

    pub(crate) fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Log in, if not already logged in.
    ///
    /// Calling this when authenticated is a no-op; no second `LOGIN` is
    /// issued. Rejected credentials surface as
    /// [`Error::Authentication`](crate::Error::Authentication).
    pub fn login(&self) -> Result<()> {
        if self.authenticated.get() {
            return Ok(());
        }
        debug!("logging in as {}", self.credentials.username());
        self.conn
            .borrow_mut()
            .login(self.credentials.username(), self.credentials.password())?;
        self.authenticated.set(true);
        Ok(())
    }

    /// Whether a login has succeeded with no logout since.
    pub fn is_logged_in(&self) -> bool {
        self.authenticated.get()
    }

    /// Log out, if logged in. When the session never authenticated this is
    /// a no-op and the server is not contacted.
    pub fn logout(&self) -> Result<()> {
        if !self.authenticated.get() {
            return Ok(());
        }
        debug!("logging out {}", self.credentials.username());
        self.conn.borrow_mut().logout()?;
        self.authenticated.set(false);
        Ok(())
    }

    /// Borrow the connection, logging in first if that has not happened
    /// yet. Every protocol operation in the crate goes through here.
    pub(crate) fn conn(&self) -> Result<RefMut<'_, C>> {
        self.login()?;
        Ok(self.conn.borrow_mut())
    }

    /// Run `op` with `mailbox` selected on the wire.
    ///
    /// The mailbox is pushed onto the selection stack and selected if it is
    /// not the current selection. The stack entry is popped whether `op`
    /// succeeds or fails, and the mailbox underneath (if any) is re-selected
    /// so an enclosing operation resumes against its own mailbox. `op`'s
    /// error wins over a restore error.
    pub(crate) fn with_selected<T, F>(&self, mailbox: &str, op: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        self.stack.borrow_mut().push(mailbox.to_string());
        let result = self.select_if_needed(mailbox).and_then(|()| op());
        self.stack.borrow_mut().pop();
        let restored = self.restore_selection();
        match (result, restored) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), _) => Err(err),
        }
    }

    fn select_if_needed(&self, mailbox: &str) -> Result<()> {
        if self.selected.borrow().as_deref() == Some(mailbox) {
            return Ok(());
        }
        trace!("selecting mailbox {}", mailbox);
        self.conn()?.select(mailbox)?;
        *self.selected.borrow_mut() = Some(mailbox.to_string());
        Ok(())
    }

    fn restore_selection(&self) -> Result<()> {
        let top = self.stack.borrow().last().cloned();
        match top {
            Some(name) => self.select_if_needed(&name),
            None => {
                *self.selected.borrow_mut() = None;
                Ok(())
            }
        }
    }

    /// The mailbox named `name`, creating the session-local handle state on
    /// first reference and reusing it afterwards. This is the only
    /// constructor path for mailboxes: one state per name per session.
    pub fn mailbox(&self, name: &str) -> Mailbox<'_, C> {
        let state = self
            .mailboxes
            .borrow_mut()
            .entry(name.to_string())
            .or_insert_with(|| Rc::new(MailboxState::new(name)))
            .clone();
        Mailbox::new(self, state)
    }

    /// Alias for [`Gmail::mailbox`]; Gmail calls them labels.
    pub fn label(&self, name: &str) -> Mailbox<'_, C> {
        self.mailbox(name)
    }

    /// The inbox.
    pub fn inbox(&self) -> Mailbox<'_, C> {
        self.mailbox("inbox")
    }

    /// Create a label on the server.
    pub fn create_label(&self, name: &str) -> Result<()> {
        debug!("creating label {}", name);
        self.conn()?.create(name)
    }

    /// All labels visible to the account: the default namespace listing
    /// followed by the `[Gmail]/` system namespace listing, flattened.
    pub fn labels(&self) -> Result<Vec<String>> {
        let mut labels = self.conn()?.list("", "%")?;
        labels.extend(self.conn()?.list(SYSTEM_PREFIX, "%")?);
        Ok(labels)
    }
}

impl<C: Connection> Drop for Gmail<C> {
    fn drop(&mut self) {
        // Release the connection if the caller never logged out explicitly.
        if self.authenticated.get() {
            let _ = self.conn.get_mut().logout();
        }
    }
}

impl<C: Connection> fmt::Debug for Gmail<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Gmail({} {}connected)",
            self.credentials.username(),
            if self.authenticated.get() { "" } else { "dis" }
        )
    }
}
