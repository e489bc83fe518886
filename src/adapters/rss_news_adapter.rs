//! Headlines merged from RSS and Atom feeds.

use std::time::Duration;

use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::domain::error::DeskError;
use crate::domain::news::{NewsFeed, NewsItem, ITEMS_PER_FEED};
use crate::ports::news_port::NewsPort;

const NEWS_SYMBOL: &str = "news";

pub struct RssNewsAdapter {
    feeds: Vec<NewsFeed>,
    timeout: Duration,
}

impl RssNewsAdapter {
    pub fn new(feeds: Vec<NewsFeed>, timeout: Duration) -> Self {
        Self { feeds, timeout }
    }

    fn fetch_feed(
        &self,
        client: &reqwest::blocking::Client,
        feed: &NewsFeed,
    ) -> Result<Vec<NewsItem>, DeskError> {
        let unavailable =
            |reason: String| DeskError::data_unavailable(NEWS_SYMBOL, format!("{}: {reason}", feed.name));

        debug!("news: GET {}", feed.url);
        let response = client
            .get(&feed.url)
            .send()
            .map_err(|e| unavailable(format!("request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(unavailable(format!("HTTP {}", response.status())));
        }
        let body = response
            .text()
            .map_err(|e| unavailable(format!("reading body: {e}")))?;
        parse_feed(&body, &feed.name)
    }
}

impl NewsPort for RssNewsAdapter {
    /// Blocking. Feeds that fail are skipped with a warning; only when every
    /// configured feed fails is the whole fetch an error.
    fn fetch(&self, limit: usize) -> Result<Vec<NewsItem>, DeskError> {
        if self.feeds.is_empty() {
            return Ok(Vec::new());
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| DeskError::data_unavailable(NEWS_SYMBOL, format!("http client: {e}")))?;

        let mut items = Vec::new();
        let mut failed = 0;
        for feed in &self.feeds {
            match self.fetch_feed(&client, feed) {
                Ok(mut batch) => items.append(&mut batch),
                Err(e) => {
                    warn!("skipping feed {}: {e}", feed.name);
                    failed += 1;
                }
            }
        }
        if failed == self.feeds.len() {
            return Err(DeskError::data_unavailable(
                NEWS_SYMBOL,
                format!("all {failed} feeds failed"),
            ));
        }
        items.truncate(limit);
        Ok(items)
    }

    fn name(&self) -> &'static str {
        "rss"
    }
}

#[derive(Clone, Copy)]
enum Field {
    Title,
    Link,
}

#[derive(Default)]
struct Entry {
    title: String,
    link: String,
}

impl Entry {
    fn push(&mut self, field: Field, text: &str) {
        match field {
            Field::Title => self.title.push_str(text),
            Field::Link => self.link.push_str(text),
        }
    }

    fn into_item(self, source: &str) -> Option<NewsItem> {
        let title = self.title.trim();
        if title.is_empty() {
            return None;
        }
        Some(NewsItem {
            source: source.to_string(),
            title: title.to_string(),
            link: self.link.trim().to_string(),
        })
    }
}

fn href_of(e: &BytesStart) -> Option<String> {
    let attr = e.try_get_attribute("href").ok()??;
    attr.unescape_value().ok().map(|v| v.trim().to_string())
}

/// Pull up to [`ITEMS_PER_FEED`] headlines out of an RSS `<item>` or Atom
/// `<entry>` document. Entries without a title are dropped.
pub fn parse_feed(xml: &str, source: &str) -> Result<Vec<NewsItem>, DeskError> {
    let malformed =
        |e: quick_xml::Error| DeskError::data_unavailable(NEWS_SYMBOL, format!("{source}: malformed feed: {e}"));

    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut items = Vec::new();
    let mut current: Option<Entry> = None;
    let mut field: Option<Field> = None;

    while items.len() < ITEMS_PER_FEED {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"item" | b"entry" => current = Some(Entry::default()),
                b"title" if current.is_some() => field = Some(Field::Title),
                b"link" => {
                    if let Some(entry) = current.as_mut() {
                        field = Some(Field::Link);
                        if let Some(href) = href_of(&e) {
                            entry.link = href;
                        }
                    }
                }
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"link" => {
                if let (Some(entry), Some(href)) = (current.as_mut(), href_of(&e)) {
                    if entry.link.is_empty() {
                        entry.link = href;
                    }
                }
            }
            Event::Text(t) => {
                if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    entry.push(f, &t.unescape().map_err(malformed)?);
                }
            }
            Event::CData(c) => {
                if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    entry.push(f, &String::from_utf8_lossy(&c));
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"item" | b"entry" => {
                    field = None;
                    if let Some(item) = current.take().and_then(|entry| entry.into_item(source)) {
                        items.push(item);
                    }
                }
                b"title" | b"link" => field = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <title>Markets</title>
  <link>https://example.com/</link>
  <item>
    <title>Stocks &amp; bonds rally</title>
    <link>https://example.com/a</link>
  </item>
  <item>
    <title><![CDATA[Fed <holds> rates]]></title>
    <link>https://example.com/b</link>
  </item>
  <item><link>https://example.com/untitled</link></item>
</channel></rss>"#;

    const ATOM: &str = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom markets</title>
  <entry>
    <title>Oil slips</title>
    <link rel="alternate" href="https://example.com/oil"/>
  </entry>
</feed>"#;

    #[test]
    fn rss_items_with_entities_and_cdata() {
        let items = parse_feed(RSS, "Markets").unwrap();
        assert_eq!(
            items,
            vec![
                NewsItem {
                    source: "Markets".into(),
                    title: "Stocks & bonds rally".into(),
                    link: "https://example.com/a".into(),
                },
                NewsItem {
                    source: "Markets".into(),
                    title: "Fed <holds> rates".into(),
                    link: "https://example.com/b".into(),
                },
            ]
        );
    }

    #[test]
    fn atom_link_from_href() {
        let items = parse_feed(ATOM, "Atom").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Oil slips");
        assert_eq!(items[0].link, "https://example.com/oil");
    }

    #[test]
    fn at_most_fifteen_items_per_feed() {
        let body: String = (0..40)
            .map(|i| format!("<item><title>h{i}</title><link>https://e.com/{i}</link></item>"))
            .collect();
        let xml = format!("<rss><channel>{body}</channel></rss>");
        let items = parse_feed(&xml, "Many").unwrap();
        assert_eq!(items.len(), ITEMS_PER_FEED);
        assert_eq!(items[14].title, "h14");
    }

    #[test]
    fn mismatched_tags_are_an_error() {
        let err = parse_feed("<rss><item><title>x</link></item></rss>", "Bad").unwrap_err();
        assert!(matches!(err, DeskError::DataUnavailable { .. }));
        assert!(err.to_string().contains("Bad"));
    }

    #[test]
    fn no_feeds_is_empty() {
        let adapter = RssNewsAdapter::new(Vec::new(), Duration::from_millis(100));
        assert!(adapter.fetch(10).unwrap().is_empty());
    }

    #[test]
    fn all_feeds_unreachable_is_data_unavailable() {
        let adapter = RssNewsAdapter::new(
            vec![
                NewsFeed::new("A", "http://127.0.0.1:9/a.xml"),
                NewsFeed::new("B", "http://127.0.0.1:9/b.xml"),
            ],
            Duration::from_millis(500),
        );
        let err = adapter.fetch(10).unwrap_err();
        assert!(err.to_string().contains("all 2 feeds failed"));
    }
}
