//! Best-effort page metadata (title and favicon) for newly added links.
//!
//! Metadata is cosmetic: nothing in here returns an error. Fetch or parse
//! failures degrade to an empty title and the origin `/favicon.ico`.

mod html_meta;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub use html_meta::{extract_metadata, fallback_favicon};

/// Only `<head>` is scraped, so bodies are read up to this many bytes
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    pub favicon: String,
    pub title: String,
}

#[async_trait]
pub trait MetadataProbe: Send + Sync {
    async fn probe(&self, url: &str) -> PageMeta;
}

/// Fetches the page over HTTP and scrapes it
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("linkboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &Url) -> Result<(Url, String), reqwest::Error> {
        let mut response = self.client.get(url.clone()).send().await?.error_for_status()?;
        let final_url = response.url().clone();

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let room = MAX_BODY_BYTES - body.len();
            body.extend_from_slice(&chunk[..chunk.len().min(room)]);
            if body.len() >= MAX_BODY_BYTES {
                tracing::debug!(url = %final_url, "Page body truncated");
                break;
            }
        }
        Ok((final_url, String::from_utf8_lossy(&body).into_owned()))
    }
}

#[async_trait]
impl MetadataProbe for HttpProbe {
    async fn probe(&self, url: &str) -> PageMeta {
        let Ok(parsed) = Url::parse(url.trim()) else {
            tracing::debug!(url = %url, "Not probing unparseable URL");
            return PageMeta::default();
        };

        match self.fetch(&parsed).await {
            Ok((final_url, body)) => extract_metadata(&body, &final_url),
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "Metadata fetch failed");
                PageMeta {
                    favicon: fallback_favicon(&parsed),
                    title: String::new(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn probe() -> HttpProbe {
        HttpProbe::new(Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_probe_scrapes_fetched_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"<html><head><title>Served</title><link rel="icon" href="/i.png"></head></html>"#,
                "text/html",
            ))
            .mount(&server)
            .await;

        let meta = probe().probe(&format!("{}/page", server.uri())).await;
        assert_eq!(meta.title, "Served");
        assert_eq!(meta.favicon, format!("{}/i.png", server.uri()));
    }

    #[tokio::test]
    async fn test_probe_error_status_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let meta = probe().probe(&format!("{}/broken", server.uri())).await;
        assert_eq!(meta.title, "");
        assert_eq!(meta.favicon, format!("{}/favicon.ico", server.uri()));
    }

    #[tokio::test]
    async fn test_oversized_body_is_truncated() {
        let server = MockServer::start().await;
        let padding = " ".repeat(MAX_BODY_BYTES + 1024);
        Mock::given(method("GET"))
            .and(path("/early"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                format!("<html><head><title>Early</title></head><body>{padding}</body></html>"),
                "text/html",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/late"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                format!("<html><head>{padding}<title>Late</title></head></html>"),
                "text/html",
            ))
            .mount(&server)
            .await;

        let early = probe().probe(&format!("{}/early", server.uri())).await;
        assert_eq!(early.title, "Early");

        // The title sits past the cap and is never read
        let late = probe().probe(&format!("{}/late", server.uri())).await;
        assert_eq!(late.title, "");
        assert_eq!(late.favicon, format!("{}/favicon.ico", server.uri()));
    }

    #[tokio::test]
    async fn test_probe_unparseable_url_is_empty() {
        assert_eq!(probe().probe("not a url").await, PageMeta::default());
    }
}
