use reqwest::{Client, ClientBuilder, StatusCode, header};
use std::time::Duration;
use once_cell::sync::Lazy;
use url::Url;
use crate::error::{AppError, Result};

const USER_AGENT: &str = "GreentextGenerator/1.0";
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

// Create a static client to reuse connections
static CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .timeout(FETCH_TIMEOUT)
        .connect_timeout(Duration::from_secs(5))
        .pool_max_idle_per_host(10)
        .user_agent(USER_AGENT)
        .build()
        .expect("Failed to build HTTP client")
});

/// Title and lead-section extract of one article, as returned by the
/// summary endpoint. Built once per request and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleSummary {
    pub title: String,
    pub extract: String,
}

/// Validates an article URL and returns its host and percent-decoded title.
/// Runs before any network I/O; every rejection here costs no request.
pub fn parse_article_url(raw: &str) -> Result<(String, String)> {
    let parsed = Url::parse(raw).map_err(|_| AppError::InvalidUrl)?;
    let host = parsed.host_str().ok_or(AppError::InvalidUrl)?;
    if !host.ends_with("wikipedia.org") {
        return Err(AppError::DisallowedHost);
    }

    // The title is everything after the first '/wiki/' segment.
    let title = parsed
        .path()
        .split_once("/wiki/")
        .map(|(_, rest)| rest)
        .filter(|rest| !rest.is_empty())
        .ok_or(AppError::MissingTitle)?;
    let title = urlencoding::decode(title)
        .map_err(|_| AppError::InvalidUrl)?
        .into_owned();

    Ok((host.to_string(), title))
}

/// Fetches the summary of the article at `raw`. `api_base` overrides the
/// per-host REST endpoint when set.
pub async fn fetch_summary(raw: &str, api_base: Option<&str>) -> Result<ArticleSummary> {
    let (host, title) = parse_article_url(raw)?;
    let encoded = urlencoding::encode(&title);
    let endpoint = match api_base {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), encoded),
        None => format!("https://{}/api/rest_v1/page/summary/{}", host, encoded),
    };

    let response = CLIENT
        .get(&endpoint)
        .header(header::ACCEPT, "application/json")
        .send()
        .await?;

    match response.status() {
        StatusCode::NOT_FOUND => return Err(AppError::ArticleNotFound),
        status if !status.is_success() => return Err(AppError::WikiStatus(status.as_u16())),
        _ => {}
    }

    let body: serde_json::Value = response.json().await?;

    // Missing fields degrade gracefully rather than failing the request.
    Ok(ArticleSummary {
        title: body["title"].as_str().unwrap_or("Unknown").to_string(),
        extract: body["extract"].as_str().unwrap_or_default().to_string(),
    })
}
