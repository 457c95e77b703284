//! Typed failures for each external collaborator.
//!
//! None of these abort a run on their own: fetchers turn them into skips,
//! the composer into a placeholder and the notifier into a log line.

use thiserror::Error;

/// Why a symbol or feed was left out of a stage's output.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("unexpected payload: {0}")]
    Decode(String),

    #[error("need 2 closes, got {points}")]
    InsufficientHistory { points: usize },

    #[error("prior close is zero")]
    ZeroPriorClose,

    #[error("change is not a finite number")]
    NonFinite,

    #[error("feed unreadable: {0}")]
    Feed(String),
}

impl FetchError {
    /// Short label used when counting skips.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Http(_) => "http",
            FetchError::Status { .. } => "status",
            FetchError::Decode(_) => "decode",
            FetchError::InsufficientHistory { .. } => "insufficient-history",
            FetchError::ZeroPriorClose => "zero-prior-close",
            FetchError::NonFinite => "non-finite",
            FetchError::Feed(_) => "feed",
        }
    }
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response had no text")]
    EmptyResponse,
}

/// Chat delivery failure. The endpoint URL carries the bot token, so `Http`
/// errors must be built with the URL stripped.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("request failed: {0}")]
    Http(reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

impl DeliveryError {
    pub fn http(err: reqwest::Error) -> Self {
        DeliveryError::Http(err.without_url())
    }

    /// Telegram's answer to text its Markdown parser cannot read.
    pub fn is_markup_rejection(&self) -> bool {
        matches!(self, DeliveryError::Status { status: 400, body } if body.contains("can't parse entities"))
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("trend file I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("trend file CSV: {0}")]
    Csv(#[from] csv::Error),
}
