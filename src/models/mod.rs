use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

// ── Instrument ────────────────────────────────────────────────────────────────

/// A tradable symbol with a human-readable label (index, commodity, sector ETF).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Instrument {
    pub symbol: String,
    pub label: String,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            label: label.into(),
        }
    }
}

// ── Price history ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    pub close: f64,
    pub observed_on: NaiveDate,
}

// ── Day-over-day change ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub instrument: Instrument,
    pub current_close: f64,
    pub prior_close: f64,
    pub percent_change: f64,
}

impl ChangeRecord {
    /// Build a record from the last two points of `history` (oldest first).
    ///
    /// Fails when fewer than two points exist, the prior close is zero, or the
    /// computed change is not a finite number.
    pub fn from_history(instrument: &Instrument, history: &[PricePoint]) -> Result<Self, FetchError> {
        let [.., prior, current] = history else {
            return Err(FetchError::InsufficientHistory { points: history.len() });
        };

        if prior.close == 0.0 {
            return Err(FetchError::ZeroPriorClose);
        }

        let percent_change = percent_change(current.close, prior.close);
        if !percent_change.is_finite() {
            return Err(FetchError::NonFinite);
        }

        Ok(Self {
            instrument: instrument.clone(),
            current_close: current.close,
            prior_close: prior.close,
            percent_change,
        })
    }
}

pub fn percent_change(current: f64, prior: f64) -> f64 {
    (current - prior) / prior * 100.0
}

// ── Sector performance ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorEntry {
    pub ticker: String,
    pub name: String,
    pub percent_change: f64,
    /// At most two items; only filled for significant movers.
    pub news: Vec<NewsItem>,
}

impl SectorEntry {
    pub fn is_significant(&self, threshold: f64) -> bool {
        is_significant(self.percent_change, threshold)
    }
}

/// Strictly greater than: a move exactly at the threshold is not significant.
pub fn is_significant(percent_change: f64, threshold: f64) -> bool {
    percent_change.abs() > threshold
}

/// Sector entries sorted by change, best first. Equal changes keep fetch order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedSectorList(Vec<SectorEntry>);

impl RankedSectorList {
    pub fn rank(mut entries: Vec<SectorEntry>) -> Self {
        // sort_by is stable
        entries.sort_by(|a, b| b.percent_change.total_cmp(&a.percent_change));
        Self(entries)
    }

    pub fn entries(&self) -> &[SectorEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Top `n` by rank, then only those beyond the significance threshold.
    pub fn top_movers(&self, n: usize, threshold: f64) -> impl Iterator<Item = &SectorEntry> {
        self.0.iter().take(n).filter(move |e| e.is_significant(threshold))
    }
}

// ── Trend record row ──────────────────────────────────────────────────────────

/// One line of the trend CSV: `Date,Sector,Ticker,Change(%)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Sector")]
    pub sector: String,
    #[serde(rename = "Ticker")]
    pub ticker: String,
    #[serde(rename = "Change(%)")]
    pub change_pct: f64,
}

impl TrendRow {
    pub fn from_entry(date: NaiveDate, entry: &SectorEntry) -> Self {
        Self {
            date,
            sector: entry.name.clone(),
            ticker: entry.ticker.clone(),
            change_pct: round2(entry.percent_change),
        }
    }
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ── Discussion ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiscussionItem {
    pub title: String,
    pub url: String,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn entry(ticker: &str, change: f64) -> SectorEntry {
        SectorEntry {
            ticker: ticker.into(),
            name: ticker.into(),
            percent_change: change,
            news: vec![],
        }
    }

    #[test]
    fn change_record_uses_last_two_points() {
        let spx = Instrument::new("^GSPC", "S&P 500");
        let history = [
            PricePoint { close: 90.0, observed_on: day(1) },
            PricePoint { close: 100.0, observed_on: day(4) },
            PricePoint { close: 101.0, observed_on: day(5) },
        ];
        let rec = ChangeRecord::from_history(&spx, &history).unwrap();
        assert_eq!(rec.prior_close, 100.0);
        assert_eq!(rec.current_close, 101.0);
        assert!((rec.percent_change - 1.0).abs() < 1e-9);
    }

    #[test]
    fn change_record_rejects_short_or_zero_history() {
        let i = Instrument::new("XLK", "Technology");
        let one = [PricePoint { close: 10.0, observed_on: day(1) }];
        assert!(matches!(
            ChangeRecord::from_history(&i, &one),
            Err(FetchError::InsufficientHistory { points: 1 })
        ));
        assert!(matches!(
            ChangeRecord::from_history(&i, &[]),
            Err(FetchError::InsufficientHistory { points: 0 })
        ));

        let zero = [
            PricePoint { close: 0.0, observed_on: day(1) },
            PricePoint { close: 5.0, observed_on: day(2) },
        ];
        assert!(matches!(ChangeRecord::from_history(&i, &zero), Err(FetchError::ZeroPriorClose)));
    }

    #[test]
    fn percent_change_formula() {
        for (cur, prior) in [(101.0, 100.0), (96.6, 100.0), (3.3, 7.1), (1e6, 0.5)] {
            let expected = (cur - prior) / prior * 100.0;
            assert!((percent_change(cur, prior) - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn rank_is_descending_and_stable() {
        let ranked = RankedSectorList::rank(vec![
            entry("A", 0.3),
            entry("B", 1.2),
            entry("C", 0.3),
            entry("D", -2.0),
            entry("E", 1.2),
        ]);
        let order: Vec<&str> = ranked.entries().iter().map(|e| e.ticker.as_str()).collect();
        assert_eq!(order, ["B", "E", "A", "C", "D"]);
        for pair in ranked.entries().windows(2) {
            assert!(pair[0].percent_change >= pair[1].percent_change);
        }
    }

    #[test]
    fn top_movers_takes_n_then_filters() {
        let ranked = RankedSectorList::rank(vec![
            entry("A", 3.0),
            entry("B", 0.2),
            entry("C", 0.1),
            entry("D", -0.1),
            entry("E", -0.4),
            entry("F", -4.0),
        ]);
        // F is significant but ranked sixth
        let movers: Vec<&str> = ranked.top_movers(5, 0.5).map(|e| e.ticker.as_str()).collect();
        assert_eq!(movers, ["A"]);
    }

    #[test]
    fn threshold_is_exclusive() {
        assert!(!is_significant(0.5, 0.5));
        assert!(!is_significant(-0.5, 0.5));
        assert!(is_significant(-0.51, 0.5));
    }

    #[test]
    fn trend_row_rounds_to_two_places() {
        let row = TrendRow::from_entry(day(5), &entry("XLE", -3.4567));
        assert_eq!(row.change_pct, -3.46);
        assert_eq!(row.sector, "XLE");
    }
}
