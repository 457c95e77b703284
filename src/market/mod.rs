pub mod sectors;
pub mod snapshot;
pub mod yahoo;

use crate::error::FetchError;
use crate::models::{ChangeRecord, Instrument, NewsItem, PricePoint};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{info, warn};

pub use self::sectors::SectorPerformanceAggregator;
pub use self::snapshot::MarketSnapshotFetcher;
pub use self::yahoo::YahooFinance;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable market-data provider. Each call may fail independently per symbol.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Daily closes, oldest first, covering `lookback` (e.g. "5d").
    async fn fetch_history(&self, symbol: &str, lookback: &str) -> Result<Vec<PricePoint>, FetchError>;

    /// Most recent related headlines, newest first, at most `limit`.
    async fn fetch_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsItem>, FetchError>;
}

/// History request + change computation for one instrument.
pub async fn fetch_change(
    source: &dyn MarketDataSource,
    instrument: &Instrument,
    lookback: &str,
) -> Result<ChangeRecord, FetchError> {
    let history = source.fetch_history(&instrument.symbol, lookback).await?;
    ChangeRecord::from_history(instrument, &history)
}

// ── Skip accounting ───────────────────────────────────────────────────────────

/// Symbols or feeds dropped from a stage, with the reason.
#[derive(Debug, Default)]
pub struct SkipLog {
    stage: &'static str,
    entries: Vec<(String, FetchError)>,
}

impl SkipLog {
    pub fn new(stage: &'static str) -> Self {
        Self { stage, entries: Vec::new() }
    }

    pub fn record(&mut self, key: impl Into<String>, err: FetchError) {
        let key = key.into();
        warn!("{}: skipping {}: {}", self.stage, key, err);
        self.entries.push((key, err));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Skip counts grouped by failure kind.
    pub fn by_kind(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for (_, err) in &self.entries {
            *counts.entry(err.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// One summary line; a stage where everything failed is called out.
    pub fn log_summary(&self, attempted: usize) {
        if self.is_empty() {
            return;
        }
        if self.len() == attempted {
            let keys: Vec<&str> = self.keys().collect();
            warn!("{}: all {} sources failed {:?}: {}", self.stage, attempted, self.by_kind(), keys.join(", "));
        } else {
            info!("{}: {}/{} skipped {:?}", self.stage, self.entries.len(), attempted, self.by_kind());
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeMarket;
    use super::*;

    #[tokio::test]
    async fn fetch_change_reports_skip_reason() {
        let market = FakeMarket::default().with_closes("ONE", &[5.0]);
        let err = fetch_change(&market, &Instrument::new("ONE", "One"), "5d").await.unwrap_err();
        assert_eq!(err.kind(), "insufficient-history");

        let err = fetch_change(&market, &Instrument::new("NOPE", "Missing"), "5d").await.unwrap_err();
        assert_eq!(err.kind(), "status");
    }

    #[test]
    fn skip_log_counts_by_kind() {
        let mut log = SkipLog::new("test");
        log.record("A", FetchError::ZeroPriorClose);
        log.record("B", FetchError::ZeroPriorClose);
        log.record("C", FetchError::InsufficientHistory { points: 1 });
        assert_eq!(log.len(), 3);
        assert_eq!(log.by_kind().get("zero-prior-close"), Some(&2));
        assert_eq!(log.keys().collect::<Vec<_>>(), ["A", "B", "C"]);
        log.log_summary(3);
    }
}
