//! The protocol seam between the session layer and the IMAP wire.
//!
//! Everything above this module speaks in terms of [`Connection`], a small
//! trait covering exactly the commands a Gmail session needs. The shipped
//! implementation, [`TlsConnection`], delegates the wire protocol itself
//! (framing, response parsing, TLS) to the `imap` crate; tests substitute a
//! scripted connection instead.

use std::fmt;
use std::mem;
use std::net::TcpStream;

use log::debug;
use native_tls::{TlsConnector, TlsStream};

use crate::error::{Error, Result};
use crate::types::{Flag, StoreAction, Uid};
use crate::utils::iter_join;

/// The imperative protocol operations a [`Gmail`](crate::Gmail) session
/// consumes.
///
/// Implementations are stateful in the same way the wire is: `select`
/// changes which mailbox subsequent UID-scoped commands operate against,
/// and `login` must precede everything but `logout`. The session layer is
/// responsible for sequencing; an implementation only executes.
pub trait Connection {
    /// Log in to the server. A rejection by the server (as opposed to a
    /// transport failure) is reported as [`Error::Authentication`].
    fn login(&mut self, username: &str, password: &str) -> Result<()>;

    /// Log out and release the connection.
    fn logout(&mut self) -> Result<()>;

    /// Select the mailbox subsequent UID-scoped commands operate against.
    fn select(&mut self, mailbox: &str) -> Result<()>;

    /// Run a `UID SEARCH` with the given terms against the selected
    /// mailbox. The order of the returned uids is implementation-defined;
    /// the protocol does not guarantee sorted output.
    fn uid_search(&mut self, terms: &[String]) -> Result<Vec<Uid>>;

    /// Add or remove flags on one message.
    fn uid_store(&mut self, uid: Uid, action: StoreAction, flags: &[Flag]) -> Result<()>;

    /// Copy one message into another mailbox. A missing target mailbox is
    /// reported as the server's NO response
    /// ([`Error::Imap`] wrapping [`imap::Error::No`]).
    fn uid_copy(&mut self, uid: Uid, mailbox: &str) -> Result<()>;

    /// Fetch the full RFC822 body of one message.
    fn uid_fetch_body(&mut self, uid: Uid) -> Result<Vec<u8>>;

    /// Create a mailbox.
    fn create(&mut self, mailbox: &str) -> Result<()>;

    /// List mailbox names under `reference` matching `pattern`.
    fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<String>>;
}

/// Serialize search terms into one wire query.
///
/// Terms that are plain atoms go out bare; anything else becomes a quoted
/// string with `\` and `"` escaped. CR/LF can never be sent.
fn serialize_terms(terms: &[String]) -> Result<String> {
    let mut rendered = Vec::with_capacity(terms.len());
    for term in terms {
        rendered.push(quote_term(term)?);
    }
    Ok(rendered.join(" "))
}

fn quote_term(term: &str) -> Result<String> {
    if term.contains('\r') || term.contains('\n') {
        return Err(Error::BadQuery(
            "search term contains a line break".to_string(),
        ));
    }
    let atom = !term.is_empty()
        && term
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"-_.:/+*@$#,".contains(&b));
    if atom {
        Ok(term.to_string())
    } else {
        Ok(format!(
            "\"{}\"",
            term.replace('\\', "\\\\").replace('"', "\\\"")
        ))
    }
}

enum State {
    /// Greeting read, not yet authenticated.
    Connected(imap::Client<TlsStream<TcpStream>>),
    Authenticated(imap::Session<TlsStream<TcpStream>>),
    Closed,
}

/// A [`Connection`] over TLS, backed by the `imap` crate.
///
/// Holds the backend's unauthenticated/authenticated typestate pair behind
/// one value so the session layer can defer `LOGIN` until a protocol
/// operation actually needs it.
pub struct TlsConnection {
    state: State,
}

impl TlsConnection {
    /// Open a TLS connection to `domain:port` and read the server greeting.
    /// No credentials are sent.
    pub fn open(domain: &str, port: u16) -> Result<Self> {
        debug!("connecting to {}:{}", domain, port);
        let tls = TlsConnector::builder().build()?;
        let client = imap::connect((domain, port), domain, &tls)?;
        Ok(TlsConnection {
            state: State::Connected(client),
        })
    }

    fn session(&mut self) -> Result<&mut imap::Session<TlsStream<TcpStream>>> {
        match self.state {
            State::Authenticated(ref mut session) => Ok(session),
            _ => Err(Error::ConnectionClosed),
        }
    }
}

impl Connection for TlsConnection {
    fn login(&mut self, username: &str, password: &str) -> Result<()> {
        match mem::replace(&mut self.state, State::Closed) {
            State::Connected(client) => match client.login(username, password) {
                Ok(session) => {
                    self.state = State::Authenticated(session);
                    Ok(())
                }
                Err((err, client)) => {
                    // The backend hands the unauthenticated client back on
                    // rejection, so the caller may retry with new credentials.
                    self.state = State::Connected(client);
                    Err(match err {
                        imap::Error::No(explain) | imap::Error::Bad(explain) => {
                            Error::Authentication(explain)
                        }
                        other => Error::Imap(other),
                    })
                }
            },
            State::Authenticated(session) => {
                self.state = State::Authenticated(session);
                Ok(())
            }
            State::Closed => Err(Error::ConnectionClosed),
        }
    }

    fn logout(&mut self) -> Result<()> {
        match mem::replace(&mut self.state, State::Closed) {
            State::Authenticated(mut session) => {
                session.logout()?;
                Ok(())
            }
            // Nothing was ever sent; there is nothing to log out of.
            State::Connected(client) => {
                self.state = State::Connected(client);
                Ok(())
            }
            State::Closed => Ok(()),
        }
    }

    fn select(&mut self, mailbox: &str) -> Result<()> {
        self.session()?.select(mailbox)?;
        Ok(())
    }

    fn uid_search(&mut self, terms: &[String]) -> Result<Vec<Uid>> {
        let query = serialize_terms(terms)?;
        let matches = self.session()?.uid_search(query)?;
        // The backend reports matches as an unordered set; hand them out in
        // ascending uid order.
        let mut uids: Vec<Uid> = matches.into_iter().collect();
        uids.sort_unstable();
        Ok(uids)
    }

    fn uid_store(&mut self, uid: Uid, action: StoreAction, flags: &[Flag]) -> Result<()> {
        let query = format!("{} ({})", action, iter_join(flags, " "));
        self.session()?.uid_store(uid.to_string(), query)?;
        Ok(())
    }

    fn uid_copy(&mut self, uid: Uid, mailbox: &str) -> Result<()> {
        self.session()?.uid_copy(uid.to_string(), mailbox)?;
        Ok(())
    }

    fn uid_fetch_body(&mut self, uid: Uid) -> Result<Vec<u8>> {
        let fetches = self.session()?.uid_fetch(uid.to_string(), "RFC822")?;
        fetches
            .first()
            .and_then(|fetch| fetch.body())
            .map(|body| body.to_vec())
            .ok_or(Error::MissingBody)
    }

    fn create(&mut self, mailbox: &str) -> Result<()> {
        self.session()?.create(mailbox)?;
        Ok(())
    }

    fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<String>> {
        let names = self.session()?.list(Some(reference), Some(pattern))?;
        Ok(names.iter().map(|name| name.name().to_string()).collect())
    }
}

impl fmt::Debug for TlsConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            State::Connected(_) => "connected",
            State::Authenticated(_) => "authenticated",
            State::Closed => "closed",
        };
        write!(f, "TlsConnection({})", state)
    }
}
