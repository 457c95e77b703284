pub mod feed;

use crate::error::FetchError;
use crate::market::SkipLog;
use crate::models::DiscussionItem;
use async_trait::async_trait;
use tracing::info;

pub use self::feed::HttpFeedSource;

/// Source of RSS/Atom entries, in feed order.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_entries(&self, url: &str) -> Result<Vec<DiscussionItem>, FetchError>;
}

pub struct DiscussionDigest<'a> {
    source: &'a dyn FeedSource,
}

impl<'a> DiscussionDigest<'a> {
    pub fn new(source: &'a dyn FeedSource) -> Self {
        Self { source }
    }

    /// Up to `per_feed_limit` items from each feed, feeds in input order.
    /// A failing feed is skipped; duplicates across feeds are kept.
    pub async fn fetch(&self, feed_urls: &[String], per_feed_limit: usize) -> (Vec<DiscussionItem>, SkipLog) {
        let mut skipped = SkipLog::new("discussions");
        let mut items = Vec::new();

        for url in feed_urls {
            match self.source.fetch_entries(url).await {
                Ok(entries) => items.extend(entries.into_iter().take(per_feed_limit)),
                Err(e) => skipped.record(url.as_str(), e),
            }
        }

        skipped.log_summary(feed_urls.len());
        info!("Discussions: {} items from {} feeds", items.len(), feed_urls.len() - skipped.len());
        (items, skipped)
    }
}

/// Markdown bullet list, one `- [title](url)` per line.
pub fn render_digest(items: &[DiscussionItem]) -> String {
    items
        .iter()
        .map(|i| format!("- [{}]({})", i.title, i.url))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct FakeFeeds {
        pub feeds: HashMap<String, Vec<DiscussionItem>>,
    }

    impl FakeFeeds {
        pub fn with_feed(mut self, url: &str, titles: &[&str]) -> Self {
            let items = titles
                .iter()
                .map(|t| DiscussionItem {
                    title: t.to_string(),
                    url: format!("{url}/{}", t.to_lowercase().replace(' ', "_")),
                })
                .collect();
            self.feeds.insert(url.to_string(), items);
            self
        }
    }

    #[async_trait]
    impl FeedSource for FakeFeeds {
        async fn fetch_entries(&self, url: &str) -> Result<Vec<DiscussionItem>, FetchError> {
            self.feeds
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Feed(format!("no such feed {url}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeFeeds;
    use super::*;

    #[tokio::test]
    async fn feeds_in_order_with_limit() {
        let feeds = FakeFeeds::default()
            .with_feed("https://r/stocks", &["A", "B", "C", "D"])
            .with_feed("https://r/economics", &["E", "A"]);
        let urls = vec![
            "https://r/stocks".to_string(),
            "https://r/down".to_string(),
            "https://r/economics".to_string(),
        ];

        let (items, skipped) = DiscussionDigest::new(&feeds).fetch(&urls, 3).await;

        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["A", "B", "C", "E", "A"]);
        assert_eq!(skipped.keys().collect::<Vec<_>>(), ["https://r/down"]);
    }

    #[test]
    fn digest_lines() {
        let items = vec![
            DiscussionItem { title: "Rate cut odds".into(), url: "https://x/1".into() },
            DiscussionItem { title: "NVDA earnings".into(), url: "https://x/2".into() },
        ];
        assert_eq!(render_digest(&items), "- [Rate cut odds](https://x/1)\n- [NVDA earnings](https://x/2)");
        assert_eq!(render_digest(&[]), "");
    }
}
