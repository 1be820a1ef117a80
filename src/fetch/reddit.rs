// src/fetch/reddit.rs
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::future::join_all;
use serde::Deserialize;
use tokio::sync::Mutex;

use super::text::join_title_body;
use super::TextProvider;
use crate::model::SignalSource;
use crate::subject::Subject;

pub const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
pub const OAUTH_BASE: &str = "https://oauth.reddit.com";

/// Indian politics subreddits searched for every subject.
pub const SUBREDDITS: [&str; 4] = ["india", "IndiaSpeaks", "indianews", "IndianPoliticalMemes"];

const MAX_POSTS: usize = 50;
const SELFTEXT_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}
fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}
#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}
#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub permalink: String,
}

impl Post {
    pub fn text(&self) -> String {
        let body: String = self.selftext.chars().take(SELFTEXT_CHARS).collect();
        join_title_body(&self.title, Some(&body))
    }
}

/// Posts of a subreddit search Listing.
pub fn parse_listing(body: &str) -> Result<Vec<Post>> {
    let listing: Listing = serde_json::from_str(body).context("parsing reddit listing")?;
    Ok(listing.data.children.into_iter().map(|c| c.data).collect())
}

/// Most upvoted first, capped, as scoring texts.
pub fn rank_posts(mut posts: Vec<Post>) -> Vec<String> {
    posts.sort_by(|a, b| b.score.cmp(&a.score));
    posts
        .iter()
        .take(MAX_POSTS)
        .map(Post::text)
        .filter(|t| !t.is_empty())
        .collect()
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Application-only OAuth (client credentials) search over `SUBREDDITS`.
pub struct RedditProvider {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl RedditProvider {
    pub fn new(client: reqwest::Client, client_id: String, client_secret: String) -> Self {
        Self {
            client,
            client_id,
            client_secret,
            token: Mutex::new(None),
        }
    }

    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(t) = guard.as_ref() {
            if Instant::now() < t.expires_at {
                return Ok(t.value.clone());
            }
        }

        let resp = self
            .client
            .post(TOKEN_URL)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("reddit token request")?;
        if !resp.status().is_success() {
            anyhow::bail!("reddit auth failed: {}", resp.status());
        }
        let tok: TokenResponse = resp.json().await.context("reddit token json")?;

        // refresh a minute early
        let ttl = Duration::from_secs(tok.expires_in.saturating_sub(60).max(1));
        let value = tok.access_token.clone();
        *guard = Some(CachedToken {
            value: tok.access_token,
            expires_at: Instant::now() + ttl,
        });
        Ok(value)
    }

    async fn search(&self, token: &str, subreddit: &str, query: &str) -> Result<Vec<Post>> {
        let limit = (MAX_POSTS / SUBREDDITS.len()).to_string();
        let resp = self
            .client
            .get(format!("{OAUTH_BASE}/r/{subreddit}/search"))
            .bearer_auth(token)
            .query(&[
                ("q", query),
                ("restrict_sr", "1"),
                ("sort", "relevance"),
                ("t", "month"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("r/{subreddit} search"))?;
        if !resp.status().is_success() {
            anyhow::bail!("r/{subreddit}: {}", resp.status());
        }
        let body = resp.text().await.context("reddit .text()")?;
        parse_listing(&body)
    }
}

#[async_trait]
impl TextProvider for RedditProvider {
    async fn collect(&self, subject: &Subject) -> Result<Vec<String>> {
        let token = self.access_token().await?;
        let results = join_all(
            SUBREDDITS
                .iter()
                .map(|sub| self.search(&token, sub, subject.display())),
        )
        .await;

        let mut posts = Vec::new();
        let mut failed = 0usize;
        for r in results {
            match r {
                Ok(p) => posts.extend(p),
                Err(e) => {
                    failed += 1;
                    tracing::warn!(target: "likability::fetch", provider = "reddit", error = %e, "subreddit search failed");
                }
            }
        }
        if failed == SUBREDDITS.len() {
            anyhow::bail!("all subreddit searches failed");
        }
        Ok(rank_posts(posts))
    }

    fn source(&self) -> SignalSource {
        SignalSource::Social
    }

    fn name(&self) -> &'static str {
        "reddit"
    }
}
