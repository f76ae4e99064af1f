//! Outbound notification delivery.
//!
//! The [`Notifier`] trait is the seam between the account flows and the
//! email transport. Registration awaits the send result and aborts when it
//! fails -- a verification code that was never delivered must not leave a
//! half-registered account behind. Security notices are best-effort.

pub mod email;

use async_trait::async_trait;

pub use email::{EmailConfig, EmailError, SmtpNotifier};

/// Sends one-time codes and account notices to users.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a registration verification code. Callers that require
    /// confirmed delivery must await this and treat `Err` as flow failure.
    async fn send_verification_code(&self, to: &str, code: &str) -> Result<(), EmailError>;

    /// Deliver a security notice (e.g. "your password was changed").
    async fn send_security_notice(&self, to: &str, body: &str) -> Result<(), EmailError>;
}

/// Discards all notifications. Used when SMTP is not configured.
#[derive(Debug, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send_verification_code(&self, to: &str, _code: &str) -> Result<(), EmailError> {
        tracing::warn!(recipient = %to, "SMTP not configured; dropping verification code");
        Ok(())
    }

    async fn send_security_notice(&self, to: &str, _body: &str) -> Result<(), EmailError> {
        tracing::warn!(recipient = %to, "SMTP not configured; dropping security notice");
        Ok(())
    }
}
