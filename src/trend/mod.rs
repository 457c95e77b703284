//! Read-side of the trend record: per-sector summaries for the `trend` command.

use crate::models::TrendRow;
use chrono::NaiveDate;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct SectorTrend {
    pub sector: String,
    pub ticker: String,
    pub days: usize,
    pub latest: (NaiveDate, f64),
    pub mean: f64,
    pub best: (NaiveDate, f64),
    pub worst: (NaiveDate, f64),
}

/// Restrict to the most recent `last` distinct run dates.
pub fn recent_rows(rows: &[TrendRow], last: Option<usize>) -> Vec<&TrendRow> {
    let Some(last) = last else {
        return rows.iter().collect();
    };
    let dates: BTreeSet<NaiveDate> = rows.iter().map(|r| r.date).collect();
    let Some(cutoff) = dates.iter().rev().take(last).last().copied() else {
        return Vec::new();
    };
    rows.iter().filter(|r| r.date >= cutoff).collect()
}

/// Summaries in order of each ticker's first appearance.
pub fn summarise(rows: &[&TrendRow]) -> Vec<SectorTrend> {
    let mut out: Vec<SectorTrend> = Vec::new();
    let mut sums: Vec<f64> = Vec::new();

    for row in rows {
        let point = (row.date, row.change_pct);
        match out.iter().position(|t| t.ticker == row.ticker) {
            Some(i) => {
                let t = &mut out[i];
                t.days += 1;
                sums[i] += row.change_pct;
                // later rows win on equal dates
                if row.date >= t.latest.0 {
                    t.latest = point;
                    t.sector = row.sector.clone();
                }
                if row.change_pct > t.best.1 {
                    t.best = point;
                }
                if row.change_pct < t.worst.1 {
                    t.worst = point;
                }
            }
            None => {
                out.push(SectorTrend {
                    sector: row.sector.clone(),
                    ticker: row.ticker.clone(),
                    days: 1,
                    latest: point,
                    mean: 0.0,
                    best: point,
                    worst: point,
                });
                sums.push(row.change_pct);
            }
        }
    }

    for (t, sum) in out.iter_mut().zip(sums) {
        t.mean = sum / t.days as f64;
    }
    out
}
