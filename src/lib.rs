//! Gmail client for Rust.
//!
//! This crate layers Gmail's mailbox/label/message model over a blocking
//! IMAP connection. It does not speak the wire protocol itself (that is
//! delegated to the `imap` crate behind the [`Connection`] trait) and
//! instead owns the session logic above it:
//!
//! - **Lazy authentication.** A [`Gmail`] session opens its connection up
//!   front but sends `LOGIN` only when an operation first needs the wire
//!   (and at most once). Logout is idempotent, and a session dropped while
//!   authenticated logs itself out.
//! - **Transparent mailbox selection.** The protocol allows one selected
//!   mailbox per connection. The session keeps a selection stack so that
//!   operations on one mailbox can be nested inside operations on another;
//!   each level finds its own mailbox selected again when control returns.
//! - **Memoized message handles.** Searching a mailbox resolves each uid to
//!   a handle through a per-mailbox cache, so the same message is always
//!   represented by the same state, including its lazily fetched,
//!   parse-once body.
//!
//! # Usage
//!
//! ```no_run
//! use gmail::{Gmail, Mark, Query};
//!
//! fn main() -> gmail::Result<()> {
//!     let gmail = Gmail::connect("username", "password")?;
//!
//!     for message in gmail.inbox().emails(&Query::unread())? {
//!         let mail = message.mail()?;
//!         println!("{} {}", message.uid(), mail.subject().unwrap_or("(none)"));
//!         message.mark(Mark::Read);
//!     }
//!
//!     let reports = gmail.label("Weekly Reports");
//!     for message in reports.emails(&Query::all().from("boss@example.com"))? {
//!         message.archive();
//!     }
//!
//!     gmail.logout()?;
//!     Ok(())
//! }
//! ```
//!
//! Messages can be labeled (with on-demand label creation), moved, flagged,
//! and deleted; see [`Message`]. Filters are built with [`Query`]; see the
//! module docs in [`Query`] for the recognized options and their fixed
//! emission order. Outbound mail goes through [`Gmail::compose`] and
//! [`Gmail::deliver`], which delegate to `lettre`.

mod connection;
mod error;
mod mail;
mod mailbox;
mod message;
mod search;
mod session;
mod smtp;
mod types;
mod utils;

pub use crate::connection::{Connection, TlsConnection};
pub use crate::error::{Error, Result};
pub use crate::mail::{Address, Attachment, Mail};
pub use crate::mailbox::Mailbox;
pub use crate::message::Message;
pub use crate::search::Query;
pub use crate::session::{Credentials, Gmail};
pub use crate::types::{Flag, Mark, StoreAction, Uid};

#[cfg(test)]
mod mock_connection;
