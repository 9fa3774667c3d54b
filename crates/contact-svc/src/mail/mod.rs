//! Notification email rendering and delivery.

mod render;
mod sendgrid;

pub use render::render_notice;
pub use sendgrid::SendGridMailer;

use async_trait::async_trait;
use thiserror::Error;

/// A rendered notification ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    /// Provider answered with a non-2xx status
    #[error("mail provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Request never completed
    #[error("mail transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Outbound email delivery
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

/// Records every email instead of sending it
#[cfg(test)]
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: parking_lot::Mutex<Vec<Email>>,
    /// When set, every send fails with this status
    pub fail_with: Option<u16>,
}

#[cfg(test)]
#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        if let Some(status) = self.fail_with {
            return Err(MailError::Status {
                status,
                body: String::new(),
            });
        }
        self.sent.lock().push(email.clone());
        Ok(())
    }
}
