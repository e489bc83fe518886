//! Headlines gathered from market news feeds.

use serde::{Deserialize, Serialize};

use super::error::DeskError;

/// Headlines kept from any one feed per fetch.
pub const ITEMS_PER_FEED: usize = 15;

/// A named feed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsFeed {
    pub name: String,
    pub url: String,
}

impl NewsFeed {
    pub fn new(name: &str, url: &str) -> Self {
        NewsFeed {
            name: name.to_string(),
            url: url.to_string(),
        }
    }
}

pub fn default_feeds() -> Vec<NewsFeed> {
    vec![
        NewsFeed::new("MarketWatch", "https://feeds.a.dj.com/rss/RSSMarketsMain.xml"),
        NewsFeed::new("Yahoo Finance", "https://finance.yahoo.com/news/rssindex"),
        NewsFeed::new("Investing.com", "https://www.investing.com/rss/news.rss"),
    ]
}

/// Parse `Name|url` entries separated by commas. An entry without a name
/// is labelled with its URL.
pub fn parse_feed_list(raw: &str) -> Result<Vec<NewsFeed>, DeskError> {
    let mut feeds = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, url) = match entry.split_once('|') {
            Some((name, url)) => (name.trim(), url.trim()),
            None => (entry, entry),
        };
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(DeskError::validation(format!(
                "feed '{entry}' needs an http(s) URL"
            )));
        }
        let name = if name.is_empty() { url } else { name };
        feeds.push(NewsFeed::new(name, url));
    }
    Ok(feeds)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Feed name the headline came from.
    pub source: String,
    pub title: String,
    pub link: String,
}
