use super::{MarketDataSource, SkipLog, fetch_change};
use crate::models::{Instrument, RankedSectorList, SectorEntry, is_significant};
use tracing::{debug, info, warn};

/// Never attach more than this many headlines to a sector.
pub const MAX_SECTOR_NEWS: usize = 2;

pub struct SectorPerformanceAggregator<'a> {
    source: &'a dyn MarketDataSource,
    lookback: &'a str,
    news_limit: usize,
}

impl<'a> SectorPerformanceAggregator<'a> {
    pub fn new(source: &'a dyn MarketDataSource, lookback: &'a str) -> Self {
        Self {
            source,
            lookback,
            news_limit: MAX_SECTOR_NEWS,
        }
    }

    /// Lower the per-sector headline count (still capped at two).
    pub fn with_news_limit(mut self, limit: usize) -> Self {
        self.news_limit = limit.min(MAX_SECTOR_NEWS);
        self
    }

    /// Price every sector, attach news to significant movers, rank best first.
    pub async fn aggregate(&self, sectors: &[Instrument], threshold: f64) -> (RankedSectorList, SkipLog) {
        let mut skipped = SkipLog::new("sectors");
        let mut entries = Vec::with_capacity(sectors.len());

        for sector in sectors {
            let record = match fetch_change(self.source, sector, self.lookback).await {
                Ok(r) => r,
                Err(e) => {
                    skipped.record(&sector.symbol, e);
                    continue;
                }
            };

            let mut entry = SectorEntry {
                ticker: sector.symbol.clone(),
                name: sector.label.clone(),
                percent_change: record.percent_change,
                news: Vec::new(),
            };

            if is_significant(entry.percent_change, threshold) && self.news_limit > 0 {
                match self.source.fetch_news(&sector.symbol, self.news_limit).await {
                    Ok(mut news) => {
                        news.truncate(self.news_limit);
                        debug!("{}: {} headlines", sector.symbol, news.len());
                        entry.news = news;
                    }
                    Err(e) => warn!("{}: news unavailable: {}", sector.symbol, e),
                }
            }

            entries.push(entry);
        }

        skipped.log_summary(sectors.len());
        let ranked = RankedSectorList::rank(entries);
        info!("Sectors ranked: {}/{}", ranked.len(), sectors.len());
        (ranked, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::fake::FakeMarket;

    fn sectors() -> Vec<Instrument> {
        vec![
            Instrument::new("XLK", "Technology"),
            Instrument::new("XLE", "Energy"),
            Instrument::new("XLF", "Financials"),
        ]
    }

    #[tokio::test]
    async fn ranks_and_enriches_movers() {
        let market = FakeMarket::default()
            .with_change("XLK", 2.1)
            .with_change("XLE", -3.4)
            .with_change("XLF", 0.1)
            .with_news("XLK", &["AI capex", "Chip export rules", "Third story"])
            .with_news("XLE", &["Oil slides"])
            .with_news("XLF", &["Banks flat"]);

        let (ranked, skipped) = SectorPerformanceAggregator::new(&market, "5d")
            .aggregate(&sectors(), 0.5)
            .await;

        assert!(skipped.is_empty());
        let order: Vec<&str> = ranked.entries().iter().map(|e| e.ticker.as_str()).collect();
        assert_eq!(order, ["XLK", "XLF", "XLE"]);

        let by = |t: &str| ranked.entries().iter().find(|e| e.ticker == t).unwrap();
        assert_eq!(by("XLK").news.len(), 2);
        assert_eq!(by("XLE").news.len(), 1);
        assert!(by("XLF").news.is_empty());
        assert_eq!(market.news_calls(), ["XLK", "XLE"]);
    }

    #[tokio::test]
    async fn news_failure_keeps_sector() {
        let market = FakeMarket::default()
            .with_change("XLK", 2.1)
            .with_change("XLE", -3.4)
            .with_change("XLF", 0.1)
            .with_failing_news("XLE");

        let (ranked, _) = SectorPerformanceAggregator::new(&market, "5d")
            .aggregate(&sectors(), 0.5)
            .await;

        assert_eq!(ranked.len(), 3);
        assert!(ranked.entries()[2].news.is_empty());
    }

    #[tokio::test]
    async fn unpriced_sectors_are_skipped() {
        let market = FakeMarket::default()
            .with_change("XLK", 1.0)
            .with_closes("XLE", &[80.0]);

        let (ranked, skipped) = SectorPerformanceAggregator::new(&market, "5d")
            .aggregate(&sectors(), 0.5)
            .await;

        assert_eq!(ranked.len(), 1);
        assert_eq!(skipped.keys().collect::<Vec<_>>(), ["XLE", "XLF"]);
    }

    #[tokio::test]
    async fn news_only_beyond_threshold() {
        let market = FakeMarket::default()
            .with_change("XLK", 0.5)
            .with_change("XLE", -0.75)
            .with_news("XLK", &["a"])
            .with_news("XLE", &["b", "c", "d"]);

        let (ranked, _) = SectorPerformanceAggregator::new(&market, "5d")
            .aggregate(&sectors()[..2], 0.5)
            .await;

        for e in ranked.entries() {
            assert!(e.news.len() <= MAX_SECTOR_NEWS);
            if !e.news.is_empty() {
                assert!(e.percent_change.abs() > 0.5);
            }
        }
        assert_eq!(market.news_calls(), ["XLE"]);
    }

    #[tokio::test]
    async fn ties_keep_input_order() {
        let market = FakeMarket::default()
            .with_change("XLK", 0.2)
            .with_change("XLE", 0.2)
            .with_change("XLF", 0.2);

        let (ranked, _) = SectorPerformanceAggregator::new(&market, "5d")
            .with_news_limit(0)
            .aggregate(&sectors(), 0.5)
            .await;

        let order: Vec<&str> = ranked.entries().iter().map(|e| e.ticker.as_str()).collect();
        assert_eq!(order, ["XLK", "XLE", "XLF"]);
    }
}
