//! Alert delivery.
//!
//! [`Notifier`] implementations push a formatted message to an external
//! channel. The monitor never calls them directly; it queues messages on an
//! [`AlertDispatcher`], which delivers them from a background task.

mod dispatch;
mod message;
mod telegram;

use std::future::Future;

use tracing::info;

pub use dispatch::{AlertDispatcher, DEFAULT_QUEUE_CAPACITY, DispatchStats};
pub use message::{escape_markdown, format_alert};
pub use telegram::{TelegramConfig, TelegramNotifier};

/// Errors from delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Messaging API rejected the message
    #[error("messaging API error {status}: {description}")]
    Api { status: u16, description: String },

    /// No destination accepted the message
    #[error("message not delivered to any of {attempted} destination(s)")]
    Undelivered { attempted: usize },
}

/// Delivers a text message to one or more destinations.
pub trait Notifier {
    /// Send `message`, returning how many destinations accepted it.
    ///
    /// Destinations are tried independently; one failing does not stop the
    /// others. Returns an error only if none accepted the message.
    fn send(&self, message: &str) -> impl Future<Output = Result<usize, NotifyError>> + Send;
}

/// Writes alerts to the log instead of a messaging channel.
///
/// Used when no messaging credentials are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    async fn send(&self, message: &str) -> Result<usize, NotifyError> {
        info!(%message, "alert (no messaging channel configured)");
        Ok(1)
    }
}
