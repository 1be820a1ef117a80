// src/fetch/rss.rs
use std::collections::HashSet;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::future::join_all;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use super::text::{join_title_body, strip_publisher_suffix};
use super::TextProvider;
use crate::model::SignalSource;
use crate::subject::Subject;

pub const GOOGLE_NEWS_SEARCH: &str = "https://news.google.com/rss/search";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

/// One parsed feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: Option<String>,
    /// Unix seconds, 0 when missing or unparsable.
    pub published_at: u64,
    pub text: String,
}

/// Language/country pair of a Google News edition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edition {
    pub lang: &'static str,
    pub country: &'static str,
}

impl Edition {
    fn query_params(&self, q: &str) -> [(&'static str, String); 4] {
        [
            ("q", q.to_string()),
            ("hl", format!("{}-{}", self.lang, self.country)),
            ("gl", self.country.to_string()),
            ("ceid", format!("{}:{}", self.country, self.lang)),
        ]
    }
}

pub const EDITIONS: [Edition; 2] = [
    Edition {
        lang: "en",
        country: "IN",
    },
    Edition {
        lang: "hi",
        country: "IN",
    },
];

fn parse_rfc2822_to_unix(ts: &str) -> u64 {
    OffsetDateTime::parse(ts.trim(), &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
        .unwrap_or(0)
}

/// quick-xml rejects HTML-only entities; map the common ones first.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

/// Parse an RSS 2.0 document into feed items. Items without any text are skipped.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedItem>> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

    let mut out = Vec::with_capacity(rss.channel.item.len());
    for it in rss.channel.item {
        let title = strip_publisher_suffix(it.title.as_deref().unwrap_or_default())
            .trim()
            .to_string();
        let text = join_title_body(&title, it.description.as_deref());
        if text.is_empty() {
            continue;
        }
        out.push(FeedItem {
            title,
            link: it.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()),
            published_at: it.pub_date.as_deref().map(parse_rfc2822_to_unix).unwrap_or(0),
            text,
        });
    }
    Ok(out)
}

/// Keep the first occurrence of every link; items without a link are kept.
pub fn dedup_by_link(items: Vec<FeedItem>) -> Vec<FeedItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|it| match &it.link {
            Some(l) => seen.insert(l.clone()),
            None => true,
        })
        .collect()
}

/// Google News search feeds, English and Hindi editions for India.
pub struct GoogleNewsRss {
    mode: Mode,
}

enum Mode {
    /// Each string is one edition's feed body.
    Fixture(Vec<String>),
    Http {
        client: reqwest::Client,
        base_url: String,
        editions: Vec<Edition>,
    },
}

impl GoogleNewsRss {
    pub fn from_client(client: reqwest::Client) -> Self {
        Self::with_base_url(client, GOOGLE_NEWS_SEARCH)
    }

    pub fn with_base_url(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            mode: Mode::Http {
                client,
                base_url: base_url.to_string(),
                editions: EDITIONS.to_vec(),
            },
        }
    }

    /// Serve pre-recorded feed bodies instead of hitting the network.
    pub fn from_fixtures<I, S>(bodies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: Mode::Fixture(bodies.into_iter().map(Into::into).collect()),
        }
    }

    pub async fn fetch_items(&self, subject: &Subject) -> Result<Vec<FeedItem>> {
        let per_edition: Vec<Result<Vec<FeedItem>>> = match &self.mode {
            Mode::Fixture(bodies) => bodies.iter().map(|b| parse_feed(b)).collect(),
            Mode::Http {
                client,
                base_url,
                editions,
            } => {
                join_all(
                    editions
                        .iter()
                        .map(|ed| fetch_edition(client, base_url, *ed, subject.display())),
                )
                .await
            }
        };

        let attempted = per_edition.len();
        let mut items = Vec::new();
        let mut failures = Vec::new();
        for r in per_edition {
            match r {
                Ok(v) => items.extend(v),
                Err(e) => failures.push(e),
            }
        }
        if attempted > 0 && failures.len() == attempted {
            let first = failures.remove(0);
            return Err(first.context("all rss editions failed"));
        }
        for e in &failures {
            tracing::warn!(target: "likability::fetch", provider = "google_news", error = %e, "rss edition failed");
        }
        Ok(dedup_by_link(items))
    }
}

async fn fetch_edition(
    client: &reqwest::Client,
    base_url: &str,
    edition: Edition,
    query: &str,
) -> Result<Vec<FeedItem>> {
    let resp = client
        .get(base_url)
        .query(&edition.query_params(query))
        .send()
        .await
        .with_context(|| format!("rss http get ({}-{})", edition.lang, edition.country))?;
    let status = resp.status();
    if !status.is_success() {
        anyhow::bail!("rss http status {status}");
    }
    let body = resp.text().await.context("rss http .text()")?;
    parse_feed(&body)
}

#[async_trait]
impl TextProvider for GoogleNewsRss {
    async fn collect(&self, subject: &Subject) -> Result<Vec<String>> {
        Ok(self
            .fetch_items(subject)
            .await?
            .into_iter()
            .map(|it| it.text)
            .collect())
    }

    fn source(&self) -> SignalSource {
        SignalSource::Rss
    }

    fn name(&self) -> &'static str {
        "google_news"
    }
}
