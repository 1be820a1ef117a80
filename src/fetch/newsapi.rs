// src/fetch/newsapi.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::StatusCode;
use serde::Deserialize;

use super::text::join_title_body;
use super::TextProvider;
use crate::model::SignalSource;
use crate::subject::Subject;

pub const NEWSAPI_EVERYTHING: &str = "https://newsapi.org/v2/everything";

/// Free tier only reaches one month back.
const DAYS_BACK: i64 = 30;
const PAGE_SIZE: u32 = 50;

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
    description: Option<String>,
}

/// Texts from a NewsAPI `/v2/everything` body. Removed articles are dropped.
pub fn parse_articles(body: &str) -> Result<Vec<String>> {
    let resp: Response = serde_json::from_str(body).context("parsing newsapi json")?;
    Ok(resp
        .articles
        .into_iter()
        .filter(|a| a.title.as_deref() != Some("[Removed]"))
        .map(|a| join_title_body(a.title.as_deref().unwrap_or_default(), a.description.as_deref()))
        .filter(|t| !t.is_empty())
        .collect())
}

pub struct NewsApiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl NewsApiProvider {
    pub fn new(client: reqwest::Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            base_url: NEWSAPI_EVERYTHING.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }
}

#[async_trait]
impl TextProvider for NewsApiProvider {
    async fn collect(&self, subject: &Subject) -> Result<Vec<String>> {
        if self.api_key.is_empty() {
            anyhow::bail!("NewsAPI key not configured");
        }
        let from = (Utc::now() - Duration::days(DAYS_BACK)).format("%Y-%m-%d").to_string();
        // exact phrase match
        let q = format!("\"{}\"", subject.display());
        let page_size = PAGE_SIZE.to_string();

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", q.as_str()),
                ("from", from.as_str()),
                ("sortBy", "relevancy"),
                ("pageSize", page_size.as_str()),
                ("language", "en"),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("newsapi http get()")?;

        match resp.status() {
            s if s.is_success() => {
                let body = resp.text().await.context("newsapi http .text()")?;
                parse_articles(&body)
            }
            StatusCode::UNAUTHORIZED => anyhow::bail!("invalid NewsAPI key"),
            StatusCode::TOO_MANY_REQUESTS => anyhow::bail!("NewsAPI rate limit exceeded"),
            s => anyhow::bail!("NewsAPI error: {s}"),
        }
    }

    fn source(&self) -> SignalSource {
        SignalSource::News
    }

    fn name(&self) -> &'static str {
        "newsapi"
    }
}
