//! Catalog client for the HTTP API, with blocking-query support.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Url;
use shared::protocol::{
    CATALOG_SERVICE_PATH, HEADER_INDEX, HEADER_KNOWN_LEADER, HEADER_LAST_CONTACT, HEADER_TOKEN,
    PARAM_DC, PARAM_INDEX, PARAM_NAMESPACE, PARAM_NEAR, PARAM_PARTITION, PARAM_STALE, PARAM_TAG,
    PARAM_WAIT,
};
use shared::types::CatalogService;
use super::{CatalogClient, QueryMeta, QueryOptions};
use crate::config::CatalogConfig;
use crate::error::ClientError;

/// Catalog client for the HTTP API.
#[derive(Clone)]
pub struct HttpCatalog {
    client: reqwest::Client,
    base: Url,
    token: Option<String>,
    timeout_headroom: Duration,
}

impl HttpCatalog {
    pub fn new(config: &CatalogConfig) -> Result<Self, ClientError> {
        let base = Url::parse(&config.address)
            .map_err(|e| ClientError::Url(format!("{}: {}", config.address, e)))?;

        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            base,
            token: config.token.clone().filter(|t| !t.is_empty()),
            timeout_headroom: Duration::from_secs(config.timeout_headroom_secs),
        })
    }

    /// Build `/v1/catalog/service/<name>` with the lookup's query parameters
    fn service_url(
        &self,
        name: &str,
        tag: Option<&str>,
        options: &QueryOptions,
    ) -> Result<Url, ClientError> {
        let mut url = self
            .base
            .join(CATALOG_SERVICE_PATH)
            .map_err(|e| ClientError::Url(e.to_string()))?;

        url.path_segments_mut()
            .map_err(|_| ClientError::Url(format!("{} cannot be a base URL", self.base)))?
            .pop_if_empty()
            .push(name);

        {
            let mut pairs = url.query_pairs_mut();
            if let Some(tag) = tag {
                pairs.append_pair(PARAM_TAG, tag);
            }
            for (key, value) in [
                (PARAM_DC, &options.datacenter),
                (PARAM_NEAR, &options.near),
                (PARAM_NAMESPACE, &options.namespace),
                (PARAM_PARTITION, &options.partition),
            ] {
                if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                    pairs.append_pair(key, value);
                }
            }
            if let Some(index) = options.wait_index {
                pairs.append_pair(PARAM_INDEX, &index.to_string());
            }
            if let Some(wait) = options.wait_time {
                pairs.append_pair(PARAM_WAIT, &format_wait(wait));
            }
            if options.allow_stale {
                pairs.append_pair(PARAM_STALE, "");
            }
        }

        // drop a dangling '?' when no parameters were added
        if url.query() == Some("") {
            url.set_query(None);
        }

        Ok(url)
    }

    /// The server may hold a blocking query up to wait + wait/16.
    /// No timeout is applied when that sum does not fit in a `Duration`.
    fn request_timeout(&self, wait: Duration) -> Option<Duration> {
        wait.checked_add(wait / 16)?
            .checked_add(self.timeout_headroom)
    }

    async fn send(
        &self,
        url: Url,
        options: &QueryOptions,
    ) -> Result<(Vec<CatalogService>, QueryMeta), ClientError> {
        tracing::debug!("GET {}", url);

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.header(HEADER_TOKEN, token);
        }
        if let Some(timeout) = options.wait_time.and_then(|w| self.request_timeout(w)) {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let meta = parse_meta(response.headers());
        let body = response.bytes().await?;
        let services: Option<Vec<CatalogService>> = serde_json::from_slice(&body)?;

        Ok((services.unwrap_or_default(), meta))
    }
}

#[async_trait]
impl CatalogClient for HttpCatalog {
    async fn service(
        &self,
        name: &str,
        tag: Option<&str>,
        options: &QueryOptions,
    ) -> Result<(Vec<CatalogService>, QueryMeta), ClientError> {
        let url = self.service_url(name, tag, options)?;
        let request = self.send(url, options);

        match &options.cancel {
            Some(cancel) => tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(ClientError::Cancelled),
                result = request => result,
            },
            None => request.await,
        }
    }
}

fn format_wait(wait: Duration) -> String {
    if wait.subsec_millis() == 0 {
        format!("{}s", wait.as_secs())
    } else {
        format!("{}ms", wait.as_millis())
    }
}

fn parse_meta(headers: &HeaderMap) -> QueryMeta {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    QueryMeta {
        last_index: header(HEADER_INDEX)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0),
        last_contact: header(HEADER_LAST_CONTACT)
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or_default(),
        known_leader: header(HEADER_KNOWN_LEADER) == Some("true"),
    }
}
