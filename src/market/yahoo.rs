//! Yahoo Finance public JSON endpoints: `v8/finance/chart` for daily closes
//! and `v1/finance/search` for related headlines.

use super::MarketDataSource;
use crate::config::MarketConfig;
use crate::error::FetchError;
use crate::http_client::HttpClient;
use crate::models::{NewsItem, PricePoint};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use tracing::debug;
use url::Url;

pub struct YahooFinance {
    client: HttpClient,
    chart_base: Url,
    search_base: Url,
}

impl YahooFinance {
    pub fn new(client: HttpClient, config: &MarketConfig) -> Result<Self> {
        let chart_base = Url::parse(&config.chart_base_url)
            .with_context(|| format!("Bad chart URL {}", config.chart_base_url))?;
        anyhow::ensure!(!chart_base.cannot_be_a_base(), "chart URL cannot take a path: {chart_base}");
        let search_base = Url::parse(&config.search_base_url)
            .with_context(|| format!("Bad search URL {}", config.search_base_url))?;

        Ok(Self { client, chart_base, search_base })
    }

    /// e.g. `.../chart/%5EGSPC?range=5d&interval=1d`
    fn chart_url(&self, symbol: &str, lookback: &str) -> Url {
        let mut url = self.chart_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(symbol);
        }
        url.query_pairs_mut()
            .append_pair("range", lookback)
            .append_pair("interval", "1d");
        url
    }

    fn search_url(&self, symbol: &str, limit: usize) -> Url {
        let mut url = self.search_base.clone();
        url.query_pairs_mut()
            .append_pair("q", symbol)
            .append_pair("quotesCount", "0")
            .append_pair("newsCount", &limit.to_string());
        url
    }
}

#[async_trait]
impl MarketDataSource for YahooFinance {
    async fn fetch_history(&self, symbol: &str, lookback: &str) -> Result<Vec<PricePoint>, FetchError> {
        let url = self.chart_url(symbol, lookback);
        let resp: ChartResponse = self.client.get_json(url.as_str()).await?;
        let points = resp.into_points()?;
        debug!("{}: {} daily closes", symbol, points.len());
        Ok(points)
    }

    async fn fetch_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsItem>, FetchError> {
        let url = self.search_url(symbol, limit);
        let resp: SearchResponse = self.client.get_json(url.as_str()).await?;
        Ok(resp.into_news(limit))
    }
}

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC, seconds.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl ChartResponse {
    /// Pair timestamps with closes, dropping null closes (halted/partial days).
    fn into_points(self) -> Result<Vec<PricePoint>, FetchError> {
        if let Some(err) = self.chart.error {
            return Err(FetchError::Decode(format!(
                "{}: {}",
                err.code.unwrap_or_default(),
                err.description.unwrap_or_default()
            )));
        }

        let result = self
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| FetchError::Decode("chart has no result".into()))?;

        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        let offset = result.meta.gmtoffset;
        let points = result
            .timestamp
            .iter()
            .zip(closes)
            .filter_map(|(ts, close)| {
                Some(PricePoint {
                    close: close?,
                    observed_on: exchange_date(*ts, offset)?,
                })
            })
            .collect();
        Ok(points)
    }
}

fn exchange_date(ts: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts + gmtoffset, 0).map(|dt| dt.date_naive())
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<SearchNews>,
}

#[derive(Debug, Deserialize)]
struct SearchNews {
    title: Option<String>,
    link: Option<String>,
}

impl SearchResponse {
    fn into_news(self, limit: usize) -> Vec<NewsItem> {
        self.news
            .into_iter()
            .filter_map(|n| {
                Some(NewsItem {
                    title: n.title?.trim().to_string(),
                    url: n.link?,
                })
            })
            .take(limit)
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
