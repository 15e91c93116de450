//! Outbound delivery, delegated entirely to `lettre`.
//!
//! The session only contributes what it already knows: the account address
//! for the `From` header and the credentials for the submission endpoint.
//! Everything else (message building, encoding, the SMTP conversation) is
//! `lettre`'s.

use lettre::message::{Mailbox as SenderMailbox, MessageBuilder};
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{SmtpTransport, Transport};
use log::debug;

use crate::connection::Connection;
use crate::error::Result;
use crate::session::Gmail;

const SMTP_DOMAIN: &str = "smtp.gmail.com";

impl<C: Connection> Gmail<C> {
    /// Start composing a message with the `From` header prefilled from this
    /// session's account address.
    pub fn compose(&self) -> Result<MessageBuilder> {
        let from: SenderMailbox = self.username().parse()?;
        Ok(lettre::Message::builder().from(from))
    }

    /// Deliver `mail` through Gmail's submission endpoint (STARTTLS) using
    /// this session's credentials.
    pub fn deliver(&self, mail: &lettre::Message) -> Result<()> {
        debug!("delivering message via {}", SMTP_DOMAIN);
        let credentials = SmtpCredentials::new(
            self.credentials().username().to_string(),
            self.credentials().password().to_string(),
        );
        let mailer = SmtpTransport::starttls_relay(SMTP_DOMAIN)?
            .credentials(credentials)
            .build();
        mailer.send(mail)?;
        Ok(())
    }
}
