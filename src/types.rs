//! Types shared across the session, mailbox, and message layers.

use std::fmt;

/// From section [2.3.1.1 of RFC 3501](https://tools.ietf.org/html/rfc3501#section-2.3.1.1).
///
/// A 32-bit value assigned to each message, which when used with the unique
/// identifier validity value forms a 64-bit value that will not refer to any
/// other message in the mailbox. Unique identifiers are assigned in a
/// strictly ascending fashion in the mailbox, and do not change during a
/// session. Every [`Message`](crate::Message) handle is addressed by its
/// `Uid`; a handle without one cannot be constructed.
pub type Uid = u32;

/// With the exception of [`Flag::Custom`], these are the system flags
/// pre-defined in [RFC 3501 section
/// 2.3.2](https://tools.ietf.org/html/rfc3501#section-2.3.2) that a client
/// is allowed to set or clear. All system flags begin with `\` in the IMAP
/// protocol.
///
/// Gmail exposes labels through mailboxes rather than through keywords, so
/// in practice [`Flag::Seen`] and [`Flag::Deleted`] are the flags this crate
/// manipulates; the rest are provided for callers that store their own.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Flag {
    /// Message has been read.
    Seen,

    /// Message has been answered.
    Answered,

    /// Message is "flagged" for urgent/special attention.
    Flagged,

    /// Message is "deleted" for removal by a later EXPUNGE.
    Deleted,

    /// Message has not completed composition.
    Draft,

    /// A non-standard user- or server-defined flag.
    Custom(String),
}

impl Flag {
    fn system(s: &str) -> Option<Self> {
        match s {
            "\\Seen" => Some(Flag::Seen),
            "\\Answered" => Some(Flag::Answered),
            "\\Flagged" => Some(Flag::Flagged),
            "\\Deleted" => Some(Flag::Deleted),
            "\\Draft" => Some(Flag::Draft),
            _ => None,
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Flag::Seen => write!(f, "\\Seen"),
            Flag::Answered => write!(f, "\\Answered"),
            Flag::Flagged => write!(f, "\\Flagged"),
            Flag::Deleted => write!(f, "\\Deleted"),
            Flag::Draft => write!(f, "\\Draft"),
            Flag::Custom(ref s) => write!(f, "{}", s),
        }
    }
}

impl From<String> for Flag {
    fn from(s: String) -> Self {
        if let Some(f) = Flag::system(&s) {
            f
        } else {
            Flag::Custom(s)
        }
    }
}

impl From<&str> for Flag {
    fn from(s: &str) -> Self {
        if let Some(f) = Flag::system(s) {
            f
        } else {
            Flag::Custom(s.to_string())
        }
    }
}

/// The states a message can be marked with through
/// [`Message::mark`](crate::Message::mark).
///
/// `Read`, `Unread`, and `Deleted` translate to flag stores; `Spam` moves
/// the message into Gmail's spam label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mark {
    /// Set `\Seen`.
    Read,
    /// Clear `\Seen`.
    Unread,
    /// Set `\Deleted`.
    Deleted,
    /// Move to `[Gmail]/Spam`.
    Spam,
}

/// Whether a `UID STORE` adds flags to a message or removes them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreAction {
    /// `+FLAGS`
    Add,
    /// `-FLAGS`
    Remove,
}

impl fmt::Display for StoreAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            StoreAction::Add => write!(f, "+FLAGS"),
            StoreAction::Remove => write!(f, "-FLAGS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_flags_display_protocol_form() {
        assert_eq!("\\Seen", Flag::Seen.to_string());
        assert_eq!("\\Deleted", Flag::Deleted.to_string());
        assert_eq!("\\Draft", Flag::Draft.to_string());
    }

    #[test]
    fn custom_flag_displays_verbatim() {
        assert_eq!("receipts", Flag::from("receipts").to_string());
    }

    #[test]
    fn system_flag_round_trips_through_str() {
        assert_eq!(Flag::Seen, Flag::from("\\Seen"));
        assert_eq!(Flag::Answered, Flag::from("\\Answered".to_string()));
    }

    #[test]
    fn store_actions_display_protocol_form() {
        assert_eq!("+FLAGS", StoreAction::Add.to_string());
        assert_eq!("-FLAGS", StoreAction::Remove.to_string());
    }
}
