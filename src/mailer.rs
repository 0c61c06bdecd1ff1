use std::fmt;

use tracing::info;

/// Outbound mail side channel used by registration. Delivery is
/// best-effort: callers log a failure and carry on, the response does not
/// depend on it.
pub trait Mailer: Send + Sync + fmt::Debug {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Default mailer: writes the message to the log stream. Stands in for a
/// real relay in development deployments; the confirmation code lands in
/// the server log instead of an inbox.
#[derive(Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, recipient: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        info!(recipient, subject, body, "outbound mail");
        Ok(())
    }
}
