use super::MessageTransport;
use crate::config::TelegramConfig;
use crate::error::DeliveryError;
use crate::http_client::HttpClient;
use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

/// Bot API hard limit for `sendMessage` text.
pub const TELEGRAM_MAX_CHARS: usize = 4096;

pub struct TelegramTransport {
    client: HttpClient,
    endpoint: String,
    chat_id: String,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
    disable_web_page_preview: bool,
}

impl TelegramTransport {
    pub fn new(client: HttpClient, config: &TelegramConfig, token: &str, chat_id: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: format!("{}/bot{}/sendMessage", config.api_base_url.trim_end_matches('/'), token),
            chat_id: chat_id.into(),
        }
    }

    fn payload<'a>(&'a self, text: &'a str, parse_mode: Option<&'a str>) -> SendMessage<'a> {
        SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode,
            disable_web_page_preview: true,
        }
    }

    async fn post(&self, payload: &SendMessage<'_>) -> Result<(), DeliveryError> {
        let resp = self
            .client
            .inner()
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(DeliveryError::http)?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(DeliveryError::Status { status: status.as_u16(), body })
    }
}

#[async_trait]
impl MessageTransport for TelegramTransport {
    /// Sends as Markdown; text the Markdown parser rejects is resent once as plain text.
    async fn send(&self, text: &str) -> Result<(), DeliveryError> {
        match self.post(&self.payload(text, Some("Markdown"))).await {
            Err(e) if e.is_markup_rejection() => {
                warn!("Telegram rejected the Markdown ({}); resending as plain text", e);
                self.post(&self.payload(text, None)).await
            }
            other => other,
        }
    }

    fn max_message_chars(&self) -> usize {
        TELEGRAM_MAX_CHARS
    }
}
