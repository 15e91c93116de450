use std::result;

use thiserror::Error;

/// A convenience wrapper around `Result` for the crate's [`Error`].
pub type Result<T> = result::Result<T, Error>;

/// A set of errors that can occur while driving a Gmail session.
///
/// Errors raised by the collaborators this crate delegates to (the IMAP
/// backend, TLS setup, MIME parsing, SMTP submission) are wrapped
/// transparently so their identity is preserved for callers that want to
/// match on them.
#[derive(Debug, Error)]
pub enum Error {
    /// The server rejected the supplied credentials during `LOGIN`.
    #[error("authentication rejected: {0}")]
    Authentication(String),

    /// A copy targeted a label that does not exist on the server.
    ///
    /// [`Message::label_or_create`](crate::Message::label_or_create)
    /// recovers from this exactly once by provisioning the label;
    /// everywhere else it is surfaced as-is.
    #[error("no label `{0}` exists")]
    NoLabel(String),

    /// A search filter that matches none of the recognized forms.
    ///
    /// Raised by [`Query`](crate::Query) before any command is sent.
    #[error("could not make sense of search filter: {0}")]
    BadQuery(String),

    /// A fetch completed but carried no message body.
    #[error("fetch response contained no message body")]
    MissingBody,

    /// The fetched message body could not be parsed as a MIME message.
    #[error("unable to parse message body")]
    ParseMail,

    /// An operation was attempted on a connection that has been logged out.
    #[error("connection is closed")]
    ConnectionClosed,

    /// An error bubbled up from the IMAP backend.
    #[error(transparent)]
    Imap(#[from] imap::Error),

    /// An error from `native_tls` while building the TLS connector.
    #[error(transparent)]
    Tls(#[from] native_tls::Error),

    /// An error from the SMTP transport during delivery.
    #[error(transparent)]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// The session username could not be parsed as a sender address.
    #[error(transparent)]
    Address(#[from] lettre::address::AddressError),

    /// An `io::Error` while writing an attachment to disk.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
