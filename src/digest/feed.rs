//! RSS 2.0 / Atom entry extraction.
//!
//! Documents go through the `scraper` HTML parser, which is lenient enough for
//! feed markup with two quirks handled here: `<link>` is a void element, so an
//! RSS link's URL lands in the following text node, and CDATA inside
//! `<title>` survives as literal text.

use super::FeedSource;
use crate::error::FetchError;
use crate::http_client::HttpClient;
use crate::models::DiscussionItem;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

pub struct HttpFeedSource {
    client: HttpClient,
}

impl HttpFeedSource {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch_entries(&self, url: &str) -> Result<Vec<DiscussionItem>, FetchError> {
        let body = self.client.get_text(url).await?;
        let items = parse_feed(&body)?;
        debug!("{}: {} entries", url, items.len());
        Ok(items)
    }
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::Feed(format!("selector {css}: {e:?}")))
}

/// Entries with both a title and a link, in document order.
pub fn parse_feed(body: &str) -> Result<Vec<DiscussionItem>, FetchError> {
    let doc = Html::parse_document(body);

    let root_sel = selector("feed, rss, channel")?;
    if doc.select(&root_sel).next().is_none() {
        return Err(FetchError::Feed("not an RSS or Atom document".into()));
    }

    let entry_sel = selector("entry, item")?;
    let title_sel = selector("title")?;
    let link_sel = selector("link")?;

    let items = doc
        .select(&entry_sel)
        .filter_map(|entry| {
            let title = entry
                .select(&title_sel)
                .next()
                .map(|t| clean_text(&t.text().collect::<String>()))
                .filter(|t| !t.is_empty())?;
            let url = entry_link(entry, &link_sel)?;
            Some(DiscussionItem { title, url })
        })
        .collect();

    Ok(items)
}

/// Atom `href` (alternate preferred), else the RSS text that follows `<link>`.
fn entry_link(entry: ElementRef<'_>, link_sel: &Selector) -> Option<String> {
    let links: Vec<ElementRef<'_>> = entry.select(link_sel).collect();

    let href = links
        .iter()
        .filter(|l| matches!(l.value().attr("rel"), None | Some("alternate")))
        .chain(links.iter())
        .find_map(|l| l.value().attr("href"));
    if let Some(href) = href {
        return Some(href.trim().to_string());
    }

    links.iter().find_map(|l| {
        let text = l.next_sibling()?.value().as_text()?.trim().to_string();
        (!text.is_empty()).then_some(text)
    })
}

fn clean_text(raw: &str) -> String {
    let s = raw.trim();
    let s = s
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
        .unwrap_or(s);
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
