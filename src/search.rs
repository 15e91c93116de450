//! Translation of a search filter into protocol search terms.
//!
//! A [`Query`] starts from a base (a read-status keyword, or a raw term
//! sequence passed through unchanged) and appends recognized filter options
//! in a fixed order. Building is pure: validation happens before anything
//! touches the connection.

use chrono::NaiveDate;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Status {
    All,
    Unread,
    Read,
}

impl Status {
    fn keyword(self) -> &'static str {
        match self {
            Status::All => "ALL",
            Status::Unread => "UNSEEN",
            Status::Read => "SEEN",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Base {
    Status(Status),
    Raw(Vec<String>),
}

/// A search filter over a mailbox.
///
/// ```no_run
/// # fn main() -> gmail::Result<()> {
/// use chrono::NaiveDate;
/// use gmail::{Gmail, Query};
///
/// let gmail = Gmail::connect("alice", "password")?;
/// let since = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
/// let urgent = gmail
///     .inbox()
///     .emails(&Query::unread().after(since).from("boss@example.com"))?;
/// # Ok(())
/// # }
/// ```
///
/// Option terms are emitted after the base in a fixed order (`SINCE`,
/// `BEFORE`, `ON`, `FROM`, `TO`, `BODY`, `SUBJECT`) so a given filter
/// always renders the same wire query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    base: Base,
    after: Option<NaiveDate>,
    before: Option<NaiveDate>,
    on: Option<NaiveDate>,
    from: Option<String>,
    to: Option<String>,
    body: Option<String>,
    subject: Option<String>,
}

impl Default for Query {
    fn default() -> Self {
        Query::all()
    }
}

impl Query {
    fn with_base(base: Base) -> Query {
        Query {
            base,
            after: None,
            before: None,
            on: None,
            from: None,
            to: None,
            body: None,
            subject: None,
        }
    }

    /// Match every message (`ALL`). This is also the base implied when a
    /// query is built from options alone, via [`Query::default`].
    pub fn all() -> Query {
        Query::with_base(Base::Status(Status::All))
    }

    /// Match messages without `\Seen` (`UNSEEN`).
    pub fn unread() -> Query {
        Query::with_base(Base::Status(Status::Unread))
    }

    /// Match messages with `\Seen` (`SEEN`).
    pub fn read() -> Query {
        Query::with_base(Base::Status(Status::Read))
    }

    /// A raw term sequence, passed to the server exactly as given.
    ///
    /// Raw queries cannot be combined with the option setters; doing so is
    /// reported by [`Mailbox::emails`](crate::Mailbox::emails) as
    /// [`Error::BadQuery`].
    pub fn raw<I, S>(terms: I) -> Query
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Query::with_base(Base::Raw(terms.into_iter().map(Into::into).collect()))
    }

    /// Resolve a status keyword (`"all"`, `"unread"`, `"read"`) to its
    /// query. Anything else is [`Error::BadQuery`].
    pub fn parse(keyword: &str) -> Result<Query> {
        match keyword {
            "all" => Ok(Query::all()),
            "unread" => Ok(Query::unread()),
            "read" => Ok(Query::read()),
            other => Err(Error::BadQuery(format!(
                "unrecognized status keyword `{}`",
                other
            ))),
        }
    }

    /// Only messages received since `date` (`SINCE`).
    pub fn after(mut self, date: NaiveDate) -> Query {
        self.after = Some(date);
        self
    }

    /// Only messages received before `date` (`BEFORE`).
    pub fn before(mut self, date: NaiveDate) -> Query {
        self.before = Some(date);
        self
    }

    /// Only messages received on `date` (`ON`).
    pub fn on(mut self, date: NaiveDate) -> Query {
        self.on = Some(date);
        self
    }

    /// Only messages whose From header contains `value`.
    pub fn from(mut self, value: impl Into<String>) -> Query {
        self.from = Some(value.into());
        self
    }

    /// Only messages whose To header contains `value`.
    pub fn to(mut self, value: impl Into<String>) -> Query {
        self.to = Some(value.into());
        self
    }

    /// Only messages whose body contains `value`.
    pub fn body(mut self, value: impl Into<String>) -> Query {
        self.body = Some(value.into());
        self
    }

    /// Only messages whose Subject header contains `value`.
    pub fn subject(mut self, value: impl Into<String>) -> Query {
        self.subject = Some(value.into());
        self
    }

    fn has_options(&self) -> bool {
        self.after.is_some()
            || self.before.is_some()
            || self.on.is_some()
            || self.from.is_some()
            || self.to.is_some()
            || self.body.is_some()
            || self.subject.is_some()
    }

    /// Render the ordered term sequence this filter stands for.
    pub(crate) fn build(&self) -> Result<Vec<String>> {
        let mut terms = match self.base {
            Base::Status(status) => vec![status.keyword().to_string()],
            Base::Raw(ref raw) => {
                if self.has_options() {
                    return Err(Error::BadQuery(
                        "raw terms cannot be combined with filter options".to_string(),
                    ));
                }
                return Ok(raw.clone());
            }
        };
        if let Some(date) = self.after {
            terms.push("SINCE".to_string());
            terms.push(to_imap_date(date));
        }
        if let Some(date) = self.before {
            terms.push("BEFORE".to_string());
            terms.push(to_imap_date(date));
        }
        if let Some(date) = self.on {
            terms.push("ON".to_string());
            terms.push(to_imap_date(date));
        }
        if let Some(ref value) = self.from {
            terms.push("FROM".to_string());
            terms.push(value.clone());
        }
        if let Some(ref value) = self.to {
            terms.push("TO".to_string());
            terms.push(value.clone());
        }
        if let Some(ref value) = self.body {
            terms.push("BODY".to_string());
            terms.push(value.clone());
        }
        if let Some(ref value) = self.subject {
            terms.push("SUBJECT".to_string());
            terms.push(value.clone());
        }
        Ok(terms)
    }
}

/// The protocol's date literal grammar: two-digit day, three-letter month
/// abbreviation, four-digit year. Locale-independent.
fn to_imap_date(date: NaiveDate) -> String {
    date.format("%d-%b-%Y").to_string()
}
