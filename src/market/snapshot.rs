use super::{MarketDataSource, SkipLog, fetch_change};
use crate::models::{ChangeRecord, Instrument};
use std::fmt::Write as _;
use tracing::info;

/// Day-over-day change for each instrument that could be priced.
/// Instruments that failed are simply absent.
#[derive(Debug, Default)]
pub struct MarketSnapshot {
    pub records: Vec<ChangeRecord>,
    pub skipped: SkipLog,
}

impl MarketSnapshot {
    #[cfg(test)]
    pub fn get(&self, symbol: &str) -> Option<&ChangeRecord> {
        self.records.iter().find(|r| r.instrument.symbol == symbol)
    }

    /// One line per instrument: `label: close (icon +x.xx%)`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for r in &self.records {
            let icon = if r.percent_change > 0.0 { "🔺" } else { "🔻" };
            let _ = writeln!(
                out,
                "{}: {:.2} ({} {:+.2}%)",
                r.instrument.label, r.current_close, icon, r.percent_change
            );
        }
        out
    }
}

pub struct MarketSnapshotFetcher<'a> {
    source: &'a dyn MarketDataSource,
    lookback: &'a str,
}

impl<'a> MarketSnapshotFetcher<'a> {
    pub fn new(source: &'a dyn MarketDataSource, lookback: &'a str) -> Self {
        Self { source, lookback }
    }

    pub async fn fetch(&self, instruments: &[Instrument]) -> MarketSnapshot {
        let mut snapshot = MarketSnapshot {
            records: Vec::with_capacity(instruments.len()),
            skipped: SkipLog::new("macro"),
        };

        for instrument in instruments {
            match fetch_change(self.source, instrument, self.lookback).await {
                Ok(record) => snapshot.records.push(record),
                Err(e) => snapshot.skipped.record(&instrument.symbol, e),
            }
        }

        snapshot.skipped.log_summary(instruments.len());
        info!("Macro snapshot: {}/{} instruments", snapshot.records.len(), instruments.len());
        snapshot
    }
}
