pub mod telegram;

use crate::error::DeliveryError;
use async_trait::async_trait;
use tracing::{error, info, warn};

pub use self::telegram::TelegramTransport;

/// Outbound chat delivery for one message.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), DeliveryError>;

    /// Largest message the endpoint accepts, in characters.
    fn max_message_chars(&self) -> usize {
        usize::MAX
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Delivered,
    LoggedLocally,
    /// Delivery was attempted and at least one part was rejected.
    Failed,
}

pub struct Notifier {
    transport: Option<Box<dyn MessageTransport>>,
}

impl Notifier {
    /// `None` means credentials are absent: messages are only logged.
    pub fn new(transport: Option<Box<dyn MessageTransport>>) -> Self {
        Self { transport }
    }

    /// Deliver `text`, splitting it when it exceeds the transport limit.
    /// Never returns an error; failures are logged.
    pub async fn notify(&self, text: &str) -> NotifyOutcome {
        let Some(transport) = &self.transport else {
            warn!("Messaging credentials missing; message not sent");
            info!("--- Generated message (not sent) ---\n{}", text);
            return NotifyOutcome::LoggedLocally;
        };

        let parts = split_message(text, transport.max_message_chars());
        let total = parts.len();
        let mut failed = 0usize;

        for (i, part) in parts.iter().enumerate() {
            match transport.send(part).await {
                Ok(()) => info!("✅ Message part {}/{} sent", i + 1, total),
                Err(e) => {
                    error!("❌ Message part {}/{} failed: {}", i + 1, total, e);
                    failed += 1;
                }
            }
        }

        if failed == 0 { NotifyOutcome::Delivered } else { NotifyOutcome::Failed }
    }
}

/// Split on line boundaries into chunks of at most `max` chars.
/// A single line longer than `max` is cut at char boundaries.
pub fn split_message(text: &str, max: usize) -> Vec<String> {
    let max = max.max(1);
    if text.chars().count() <= max {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();

        if current_len + line_len > max && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > max {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max) {
                parts.push(piece.iter().collect());
            }
            continue;
        }

        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        parts.push(current);
    }
    parts
}
