//! Append-only CSV trend record: one row per sector per run.
//!
//! Layout: `Date,Sector,Ticker,Change(%)`, header written once when the file
//! is empty. Existing rows are never rewritten.

use crate::error::StoreError;
use crate::models::{RankedSectorList, TrendRow};
use chrono::NaiveDate;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const TREND_HEADER: [&str; 4] = ["Date", "Sector", "Ticker", "Change(%)"];

pub struct TrendRecordStore {
    path: PathBuf,
}

impl TrendRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `entries` in the order given. Returns the number of data rows written.
    pub fn append(&self, date: NaiveDate, entries: &RankedSectorList) -> Result<usize, StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if is_new {
            writer.write_record(TREND_HEADER)?;
        }

        for entry in entries.entries() {
            writer.serialize(TrendRow::from_entry(date, entry))?;
        }

        let mut file = writer.into_inner().map_err(|e| e.into_error())?;
        file.flush()?;

        info!("Saved {} sector rows to {:?}{}", entries.len(), self.path, if is_new { " (new file)" } else { "" });
        Ok(entries.len())
    }

    /// Every row recorded so far, in file order.
    pub fn read_all(&self) -> Result<Vec<TrendRow>, StoreError> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(&self.path)?;
        let rows = reader.deserialize().collect::<Result<Vec<TrendRow>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static SEQ: AtomicUsize = AtomicUsize::new(0);

    /// Fresh path under the system temp dir; the file itself does not exist yet.
    pub fn scratch_path(name: &str) -> PathBuf {
        let n = SEQ.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!("market-brief-{}-{}-{}", std::process::id(), name, n));
        let _ = std::fs::remove_dir_all(&dir);
        dir.join("trend.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::scratch_path;
    use super::*;
    use crate::models::SectorEntry;

    fn ranked(rows: &[(&str, &str, f64)]) -> RankedSectorList {
        RankedSectorList::rank(
            rows.iter()
                .map(|(t, n, c)| SectorEntry {
                    ticker: t.to_string(),
                    name: n.to_string(),
                    percent_change: *c,
                    news: vec![],
                })
                .collect(),
        )
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn header_written_once() {
        let store = TrendRecordStore::new(scratch_path("header"));

        let first = ranked(&[("XLK", "Technology", 2.104), ("XLE", "Energy", -3.4)]);
        assert_eq!(store.append(day(4), &first).unwrap(), 2);

        let second = ranked(&[("XLF", "Financials", 0.1)]);
        assert_eq!(store.append(day(5), &second).unwrap(), 1);

        let text = std::fs::read_to_string(store.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "Date,Sector,Ticker,Change(%)",
                "2024-03-04,Technology,XLK,2.1",
                "2024-03-04,Energy,XLE,-3.4",
                "2024-03-05,Financials,XLF,0.1",
            ]
        );
    }

    #[test]
    fn appends_accumulate_without_touching_prior_rows() {
        let store = TrendRecordStore::new(scratch_path("accumulate"));
        let batches = [
            ranked(&[("XLK", "Technology", 1.0), ("XLV", "Healthcare", -1.0)]),
            ranked(&[]),
            ranked(&[("XLK", "Technology", 0.5), ("XLV", "Healthcare", 0.25), ("XLU", "Utilities", 0.0)]),
        ];

        let mut previous = String::new();
        for (i, batch) in batches.iter().enumerate() {
            store.append(day(i as u32 + 1), batch).unwrap();
            let now = std::fs::read_to_string(store.path()).unwrap();
            assert!(now.starts_with(&previous));
            previous = now;
        }

        let total: usize = batches.iter().map(|b| b.len()).sum();
        assert_eq!(previous.lines().count(), 1 + total);
        assert_eq!(store.read_all().unwrap().len(), total);
    }

    #[test]
    fn empty_first_run_still_writes_header() {
        let store = TrendRecordStore::new(scratch_path("empty"));
        store.append(day(1), &RankedSectorList::default()).unwrap();
        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text.trim_end(), "Date,Sector,Ticker,Change(%)");
    }

    #[test]
    fn names_with_commas_are_quoted() {
        let store = TrendRecordStore::new(scratch_path("quote"));
        store.append(day(1), &ranked(&[("XLY", "Consumer, Discretionary", 1.234)])).unwrap();
        let rows = store.read_all().unwrap();
        assert_eq!(rows[0].sector, "Consumer, Discretionary");
        assert_eq!(rows[0].change_pct, 1.23);
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let dir = scratch_path("blocked");
        std::fs::create_dir_all(&dir).unwrap();
        // the target is a directory, so opening it for append fails
        let store = TrendRecordStore::new(&dir);
        assert!(matches!(store.append(day(1), &RankedSectorList::default()), Err(StoreError::Io(_))));
    }
}
