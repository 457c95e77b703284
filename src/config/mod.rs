use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::Instrument;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub briefing: BriefingConfig,
    #[serde(default)]
    pub digest: DigestConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Secrets never come from config files.
    #[serde(skip)]
    pub credentials: Credentials,
}

/// Shared HTTP client settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// `None` leaves reqwest's default (no timeout).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Market-data provider and instrument lists
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketConfig {
    #[serde(default = "default_chart_base_url")]
    pub chart_base_url: String,

    #[serde(default = "default_search_base_url")]
    pub search_base_url: String,

    /// Provider range string; must cover at least two trading days.
    #[serde(default = "default_lookback")]
    pub lookback: String,

    #[serde(default = "default_news_limit")]
    pub news_limit: usize,

    #[serde(default = "default_macro_instruments")]
    pub macro_instruments: Vec<Instrument>,

    #[serde(default = "default_sector_instruments")]
    pub sector_instruments: Vec<Instrument>,
}

/// Prompt and text-generation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BriefingConfig {
    /// Absolute % change a sector must exceed to count as a mover.
    #[serde(default = "default_significance_threshold")]
    pub significance_threshold: f64,

    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_gemini_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_language")]
    pub language: String,
}

/// Community feed settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DigestConfig {
    #[serde(default = "default_feeds")]
    pub feeds: Vec<String>,

    #[serde(default = "default_per_feed_limit")]
    pub per_feed_limit: usize,
}

/// Trend record settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_trend_path")]
    pub trend_path: PathBuf,

    /// Abort the run when the trend file cannot be written.
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    #[serde(default = "default_telegram_base_url")]
    pub api_base_url: String,
}

/// External service secrets, read once from the environment.
#[derive(Clone, Default)]
pub struct Credentials {
    pub telegram_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub gemini_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("telegram_token", &self.telegram_token.is_some())
            .field("telegram_chat_id", &self.telegram_chat_id.is_some())
            .field("gemini_api_key", &self.gemini_api_key.is_some())
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Blank values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            telegram_token: get("TELEGRAM_TOKEN"),
            telegram_chat_id: get("TELEGRAM_CHAT_ID"),
            gemini_api_key: get("GEMINI_API_KEY"),
        }
    }

    /// Token and chat id, only when both are present.
    pub fn telegram(&self) -> Option<(&str, &str)> {
        Some((self.telegram_token.as_deref()?, self.telegram_chat_id.as_deref()?))
    }
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible; market-brief/0.1; daily market briefing job)".to_string()
}
fn default_chart_base_url() -> String {
    "https://query1.finance.yahoo.com/v8/finance/chart".to_string()
}
fn default_search_base_url() -> String {
    "https://query2.finance.yahoo.com/v1/finance/search".to_string()
}
fn default_lookback() -> String {
    "5d".to_string()
}
fn default_news_limit() -> usize {
    2
}
fn default_macro_instruments() -> Vec<Instrument> {
    [
        ("^GSPC", "🇺🇸 S&P 500"),
        ("^IXIC", "🇺🇸 Nasdaq"),
        ("^TNX", "🇺🇸 10Y Treasury"),
        ("DX-Y.NYB", "💵 Dollar Index"),
        ("CL=F", "🛢️ Crude Oil (WTI)"),
        ("GC=F", "🥇 Gold"),
    ]
    .into_iter()
    .map(|(s, l)| Instrument::new(s, l))
    .collect()
}
fn default_sector_instruments() -> Vec<Instrument> {
    [
        ("XLK", "Technology"),
        ("XLF", "Financials"),
        ("XLV", "Healthcare"),
        ("XLE", "Energy"),
        ("XLY", "Consumer Discretionary"),
        ("XLP", "Consumer Staples"),
        ("XLI", "Industrials"),
        ("XLC", "Communication Services"),
        ("XLU", "Utilities"),
        ("XLB", "Materials"),
        ("XLRE", "Real Estate"),
    ]
    .into_iter()
    .map(|(s, l)| Instrument::new(s, l))
    .collect()
}
fn default_significance_threshold() -> f64 {
    0.5
}
fn default_top_n() -> usize {
    5
}
fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}
fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_language() -> String {
    "Korean".to_string()
}
fn default_feeds() -> Vec<String> {
    vec![
        "https://www.reddit.com/r/stocks/top/.rss?t=day".to_string(),
        "https://www.reddit.com/r/economics/top/.rss?t=day".to_string(),
    ]
}
fn default_per_feed_limit() -> usize {
    3
}
fn default_trend_path() -> PathBuf {
    PathBuf::from("daily_sector_trend.csv")
}
fn default_telegram_base_url() -> String {
    "https://api.telegram.org".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            chart_base_url: default_chart_base_url(),
            search_base_url: default_search_base_url(),
            lookback: default_lookback(),
            news_limit: default_news_limit(),
            macro_instruments: default_macro_instruments(),
            sector_instruments: default_sector_instruments(),
        }
    }
}

impl Default for BriefingConfig {
    fn default() -> Self {
        Self {
            significance_threshold: default_significance_threshold(),
            top_n: default_top_n(),
            model: default_model(),
            api_base_url: default_gemini_base_url(),
            language: default_language(),
        }
    }
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            feeds: default_feeds(),
            per_feed_limit: default_per_feed_limit(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            trend_path: default_trend_path(),
            strict: false,
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_telegram_base_url(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides, then credentials.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(config::Environment::with_prefix("BRIEF").separator("__"))
            .build()
            .context("Failed to read configuration sources")?;

        let mut app_cfg: AppConfig = cfg
            .try_deserialize()
            .context("Invalid configuration")?;
        app_cfg.credentials = Credentials::from_env();
        app_cfg.validate()?;
        Ok(app_cfg)
    }

    fn validate(&self) -> Result<()> {
        let t = self.briefing.significance_threshold;
        anyhow::ensure!(t.is_finite() && t >= 0.0, "briefing.significance_threshold must be >= 0, got {t}");
        anyhow::ensure!(self.market.news_limit <= 2, "market.news_limit is capped at 2");
        Ok(())
    }
}
