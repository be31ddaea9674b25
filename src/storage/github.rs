//! GitHub contents API backend
//!
//! Documents live as files in a repository branch. The blob `sha` GitHub
//! returns with every read is the version token; a `PUT` carrying a stale
//! `sha` is rejected by GitHub, which surfaces as a version conflict.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::{Document, KeyedJsonStore, StoreError, Version};
use crate::config::GitHubConfig;

pub struct GitHubContentsStore {
    api_url: String,
    branch: String,
    client: reqwest::Client,
    path_prefix: String,
    repo: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    branch: &'a str,
    content: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

impl GitHubContentsStore {
    pub fn new(config: &GitHubConfig, timeout: Duration) -> Result<Self, StoreError> {
        let token = config
            .token
            .clone()
            .ok_or_else(|| StoreError::Unavailable("GitHub token is not configured".into()))?;
        let repo = config
            .repo
            .clone()
            .ok_or_else(|| StoreError::Unavailable("GitHub repository is not configured".into()))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("linkboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            branch: config.branch.clone(),
            client,
            path_prefix: config.path_prefix.clone(),
            repo,
            token,
        })
    }

    fn contents_url(&self, doc: Document) -> String {
        format!(
            "{}/repos/{}/contents/{}{}",
            self.api_url,
            self.repo,
            self.path_prefix,
            doc.key()
        )
    }

    fn request(&self, method: Method, doc: Document) -> RequestBuilder {
        self.client
            .request(method, self.contents_url(doc))
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Current content and sha, or `None` if the file does not exist
    async fn fetch(&self, doc: Document) -> Result<Option<(Value, Version)>, StoreError> {
        let response = self
            .request(Method::GET, doc)
            .query(&[("ref", self.branch.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(StoreError::Unavailable(format!(
                "GET {doc} returned {status}"
            )));
        }

        let body: ContentsResponse = response.json().await?;
        let value = decode_content(doc, &body.content)?;
        Ok(Some((value, Version::new(body.sha))))
    }

    async fn write(
        &self,
        doc: Document,
        value: &Value,
        sha: Option<&str>,
    ) -> Result<Version, StoreError> {
        let body = PutRequest {
            branch: &self.branch,
            content: BASE64.encode(serde_json::to_vec_pretty(value)?),
            message: format!("Update {doc}"),
            sha,
        };

        let response = self.request(Method::PUT, doc).json(&body).send().await?;
        let status = response.status();

        match status {
            s if s.is_success() => {
                let body: PutResponse = response.json().await?;
                Ok(Version::new(body.content.sha))
            }
            // 409: sha does not match HEAD; 422: sha missing for an existing file
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(StoreError::VersionConflict(doc))
            }
            _ => Err(StoreError::Unavailable(format!(
                "PUT {doc} returned {status}"
            ))),
        }
    }
}

fn decode_content(doc: Document, content: &str) -> Result<Value, StoreError> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64
        .decode(compact)
        .map_err(|e| StoreError::Malformed(doc, e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Malformed(doc, e.to_string()))
}

#[async_trait]
impl KeyedJsonStore for GitHubContentsStore {
    async fn get_or_init(
        &self,
        doc: Document,
        initial: &Value,
    ) -> Result<(Value, Version), StoreError> {
        if let Some(found) = self.fetch(doc).await? {
            return Ok(found);
        }

        match self.write(doc, initial, None).await {
            Ok(version) => {
                tracing::debug!(document = %doc, "Initialized missing document");
                Ok((initial.clone(), version))
            }
            // Another writer created it first
            Err(StoreError::VersionConflict(_)) => self.fetch(doc).await?.ok_or_else(|| {
                StoreError::Unavailable(format!("{doc} could neither be created nor read"))
            }),
            Err(e) => Err(e),
        }
    }

    async fn put(
        &self,
        doc: Document,
        value: &Value,
        expected: Option<&Version>,
    ) -> Result<Version, StoreError> {
        match expected {
            Some(version) => self.write(doc, value, Some(version.as_str())).await,
            None => {
                let current = self.fetch(doc).await?.map(|(_, version)| version);
                self.write(doc, value, current.as_ref().map(Version::as_str))
                    .await
            }
        }
    }
}
