//! Pipeline orchestrator: ties market data → trend store → briefing → chat.
//!
//! ## Run order
//!
//! 1. Macro snapshot (indices, rates, dollar, commodities)
//! 2. Sector performance, ranked, movers enriched with news
//! 3. Append the sector rows to the trend CSV
//! 4. Community discussion digest
//! 5. Briefing narrative from the text generator
//! 6. Delivery to the chat (or local log without credentials)
//!
//! Every stage degrades to partial/empty output on failure. The only stage
//! that can abort the run is the trend store, and only with `storage.strict`.

use crate::briefing::{BriefingComposer, GeminiClient, TextGenerator, final_message};
use crate::config::AppConfig;
use crate::digest::{DiscussionDigest, FeedSource, HttpFeedSource};
use crate::http_client::HttpClient;
use crate::market::{MarketDataSource, MarketSnapshotFetcher, SectorPerformanceAggregator, YahooFinance};
use crate::models::{DiscussionItem, RankedSectorList};
use crate::notify::{MessageTransport, Notifier, NotifyOutcome, TelegramTransport};
use crate::storage::TrendRecordStore;
use crate::utils::Timer;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{error, info, warn};

pub struct Pipeline {
    config: AppConfig,
    market: Box<dyn MarketDataSource>,
    feeds: Box<dyn FeedSource>,
    generator: Option<Box<dyn TextGenerator>>,
    notifier: Notifier,
    store: TrendRecordStore,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub persist: bool,
    pub send: bool,
}

#[derive(Debug, Default)]
pub struct RunStats {
    pub macro_priced: usize,
    pub macro_skipped: usize,
    pub sectors_ranked: usize,
    pub sectors_skipped: usize,
    pub rows_written: usize,
    pub store_error: Option<String>,
    pub discussions: usize,
    pub feeds_skipped: usize,
    pub notify: Option<NotifyOutcome>,
}

/// Everything fetched before composing.
pub struct Gathered {
    pub macro_text: String,
    pub ranked: RankedSectorList,
    pub discussions: Vec<DiscussionItem>,
}

impl Pipeline {
    /// Production collaborators built from config and credentials.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let http = HttpClient::new(&config.http)?;

        let market = YahooFinance::new(http.clone(), &config.market).context("Failed to build market client")?;
        let feeds = HttpFeedSource::new(http.clone());

        let creds = &config.credentials;
        let generator = creds.gemini_api_key.as_deref().map(|key| {
            Box::new(GeminiClient::new(http.clone(), &config.briefing, key)) as Box<dyn TextGenerator>
        });

        let transport = match creds.telegram() {
            Some((token, chat_id)) => {
                let telegram = TelegramTransport::new(http.clone(), &config.telegram, token, chat_id);
                Some(Box::new(telegram) as Box<dyn MessageTransport>)
            }
            None => {
                warn!(
                    "Telegram credentials incomplete (token: {}, chat id: {})",
                    creds.telegram_token.is_some(),
                    creds.telegram_chat_id.is_some()
                );
                None
            }
        };

        let store = TrendRecordStore::new(&config.storage.trend_path);
        Ok(Self::with_collaborators(
            config,
            Box::new(market),
            Box::new(feeds),
            generator,
            Notifier::new(transport),
            store,
        ))
    }

    pub fn with_collaborators(
        config: AppConfig,
        market: Box<dyn MarketDataSource>,
        feeds: Box<dyn FeedSource>,
        generator: Option<Box<dyn TextGenerator>>,
        notifier: Notifier,
        store: TrendRecordStore,
    ) -> Self {
        Self { config, market, feeds, generator, notifier, store }
    }

    fn composer(&self) -> BriefingComposer<'_> {
        let b = &self.config.briefing;
        BriefingComposer::new(self.generator.as_deref(), b.top_n, b.significance_threshold, &b.language)
    }

    async fn fetch_macro(&self, stats: &mut RunStats) -> String {
        let _t = Timer::start("Macro snapshot");
        let m = &self.config.market;
        let snapshot = MarketSnapshotFetcher::new(self.market.as_ref(), &m.lookback)
            .fetch(&m.macro_instruments)
            .await;
        stats.macro_priced = snapshot.records.len();
        stats.macro_skipped = snapshot.skipped.len();
        snapshot.render()
    }

    async fn fetch_sectors(&self, stats: &mut RunStats) -> RankedSectorList {
        let _t = Timer::start("Sector performance");
        let m = &self.config.market;
        let (ranked, skipped) = SectorPerformanceAggregator::new(self.market.as_ref(), &m.lookback)
            .with_news_limit(m.news_limit)
            .aggregate(&m.sector_instruments, self.config.briefing.significance_threshold)
            .await;
        stats.sectors_ranked = ranked.len();
        stats.sectors_skipped = skipped.len();
        if ranked.is_empty() {
            warn!("No sector could be priced; the trend record gets no rows today");
        }
        ranked
    }

    async fn fetch_discussions(&self, stats: &mut RunStats) -> Vec<DiscussionItem> {
        let _t = Timer::start("Discussion digest");
        let d = &self.config.digest;
        let (items, skipped) = DiscussionDigest::new(self.feeds.as_ref())
            .fetch(&d.feeds, d.per_feed_limit)
            .await;
        stats.discussions = items.len();
        stats.feeds_skipped = skipped.len();
        items
    }

    /// Fetch stages only; nothing persisted or sent.
    pub async fn gather(&self) -> Gathered {
        let mut stats = RunStats::default();
        let macro_text = self.fetch_macro(&mut stats).await;
        let ranked = self.fetch_sectors(&mut stats).await;
        let discussions = self.fetch_discussions(&mut stats).await;
        Gathered { macro_text, ranked, discussions }
    }

    pub fn prompt(&self, gathered: &Gathered) -> String {
        self.composer().prompt_for(&gathered.macro_text, &gathered.ranked, &gathered.discussions)
    }

    pub async fn run(&self, today: NaiveDate, opts: RunOptions) -> Result<RunStats> {
        let mut stats = RunStats::default();

        info!("=== Step 1: Macro indicators ===");
        let macro_text = self.fetch_macro(&mut stats).await;

        info!("=== Step 2: Sector performance ===");
        let ranked = self.fetch_sectors(&mut stats).await;

        info!("=== Step 3: Trend record ===");
        if opts.persist {
            match self.store.append(today, &ranked) {
                Ok(n) => stats.rows_written = n,
                Err(e) if self.config.storage.strict => {
                    return Err(e).with_context(|| format!("Failed to append to {:?}", self.store.path()));
                }
                Err(e) => {
                    error!("Trend record not updated ({:?}): {}", self.store.path(), e);
                    stats.store_error = Some(e.to_string());
                }
            }
        } else {
            info!("Persistence disabled; {} rows not written", ranked.len());
        }

        info!("=== Step 4: Trending discussions ===");
        let discussions = self.fetch_discussions(&mut stats).await;

        info!("=== Step 5: Briefing ===");
        let narrative = {
            let _t = Timer::start("Briefing generation");
            self.composer().compose(&macro_text, &ranked, &discussions).await
        };
        let message = final_message(today, &narrative);

        info!("=== Step 6: Delivery ===");
        if opts.send {
            stats.notify = Some(self.notifier.notify(&message).await);
        } else {
            println!("{message}");
        }

        info!(
            "=== Done: macro {}/{} | sectors {}/{} | rows {} | discussions {} | delivery {:?} ===",
            stats.macro_priced,
            stats.macro_priced + stats.macro_skipped,
            stats.sectors_ranked,
            stats.sectors_ranked + stats.sectors_skipped,
            stats.rows_written,
            stats.discussions,
            stats.notify,
        );

        Ok(stats)
    }
}
