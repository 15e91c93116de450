//! The parsed form of a fetched message body.
//!
//! MIME parsing is delegated entirely to `mail-parser`; this module owns
//! the extracted surface (the fields a caller can reach once
//! [`Message::mail`](crate::Message::mail) has fetched the body) as plain
//! owned data, so a [`Mail`] has no ties to the parser's borrow lifetimes.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use mail_parser::{MessageParser, MimeHeaders};

use crate::error::{Error, Result};

/// One name/address pair from a sender or recipient header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    name: Option<String>,
    address: Option<String>,
}

impl Address {
    /// The display name, if the header carried one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The bare address.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
}

/// A parsed MIME message.
pub struct Mail {
    raw: Vec<u8>,
    subject: Option<String>,
    from: Vec<Address>,
    to: Vec<Address>,
    date: Option<DateTime<FixedOffset>>,
    message_id: Option<String>,
    text: Option<String>,
    html: Option<String>,
    attachments: Vec<Attachment>,
}

impl Mail {
    pub(crate) fn parse(raw: Vec<u8>) -> Result<Mail> {
        let parsed = MessageParser::default()
            .parse(&raw[..])
            .ok_or(Error::ParseMail)?;
        let subject = parsed.subject().map(str::to_string);
        let from = collect_addresses(parsed.from());
        let to = collect_addresses(parsed.to());
        let date = parsed
            .date()
            .and_then(|date| DateTime::parse_from_rfc3339(&date.to_rfc3339()).ok());
        let message_id = parsed.message_id().map(str::to_string);
        let text = parsed.body_text(0).map(Cow::into_owned);
        let html = parsed.body_html(0).map(Cow::into_owned);
        let attachments = parsed
            .attachments()
            .map(|part| Attachment {
                filename: part.attachment_name().map(str::to_string),
                content_type: media_type(part),
                contents: part.contents().to_vec(),
            })
            .collect();
        Ok(Mail {
            raw,
            subject,
            from,
            to,
            date,
            message_id,
            text,
            html,
            attachments,
        })
    }

    /// The Subject header.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// The first sender.
    pub fn from(&self) -> Option<&Address> {
        self.from.first()
    }

    /// All recipients from the To header.
    pub fn to(&self) -> &[Address] {
        &self.to
    }

    /// The Date header.
    pub fn date(&self) -> Option<DateTime<FixedOffset>> {
        self.date
    }

    /// The Message-ID header.
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    /// The plain-text body, if there is one.
    pub fn text_body(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// The HTML body, if there is one.
    pub fn html_body(&self) -> Option<&str> {
        self.html.as_deref()
    }

    /// The attachments, in message order.
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// The exact bytes the body was fetched as.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

fn collect_addresses(header: Option<&mail_parser::Address>) -> Vec<Address> {
    header
        .map(|addresses| {
            addresses
                .iter()
                .map(|addr| Address {
                    name: addr.name().map(str::to_string),
                    address: addr.address().map(str::to_string),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn media_type(part: &mail_parser::MessagePart<'_>) -> String {
    match part.content_type() {
        Some(ct) => match ct.subtype() {
            Some(subtype) => format!("{}/{}", ct.ctype(), subtype),
            None => ct.ctype().to_string(),
        },
        None => "application/octet-stream".to_string(),
    }
}

/// One attachment part of a [`Mail`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attachment {
    filename: Option<String>,
    content_type: String,
    contents: Vec<u8>,
}

impl Attachment {
    /// The attachment filename, if the part declared one.
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// The declared media type, `type/subtype`.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The decoded attachment bytes.
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// Write this attachment into `dir`, using its declared filename (or
    /// `attachment.bin` when it has none), and return the written path.
    pub fn save_to_file(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let name = self.filename.as_deref().unwrap_or("attachment.bin");
        let path = dir.as_ref().join(name);
        fs::write(&path, &self.contents)?;
        Ok(path)
    }
}
