//! Boundary to the service catalog.
//!
//! [`CatalogClient`] is the only way the query layer talks to the outside
//! world. [`http::HttpCatalog`] speaks the catalog HTTP API and
//! [`memory::MemoryCatalog`] keeps registrations in process.

pub mod http;
pub mod memory;

use std::time::Duration;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use shared::types::CatalogService;
use crate::error::ClientError;

/// Per-request options for a catalog lookup.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub datacenter: Option<String>,
    /// Sort results by round-trip time from this node
    pub near: Option<String>,
    pub namespace: Option<String>,
    pub partition: Option<String>,
    /// Block until the catalog index moves past this value
    pub wait_index: Option<u64>,
    /// Upper bound on how long a blocking lookup may wait
    pub wait_time: Option<Duration>,
    /// Allow any server to answer, not only the leader
    pub allow_stale: bool,
    /// Aborts the lookup when cancelled
    pub cancel: Option<CancellationToken>,
}

impl QueryOptions {
    /// Options for a blocking lookup that returns once the index passes `index`
    pub fn blocking(index: u64, wait: Duration) -> Self {
        Self {
            wait_index: Some(index),
            wait_time: Some(wait),
            ..Self::default()
        }
    }

    /// True when the cancellation token, if any, has fired
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
    }
}

/// Metadata returned alongside a lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryMeta {
    /// Catalog index at the time of the response; feed back as `wait_index`
    pub last_index: u64,
    /// Time since the answering server last heard from the leader
    pub last_contact: Duration,
    pub known_leader: bool,
}

/// Service lookup capability of a catalog.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Return the instances of `name`, filtered by `tag` when given.
    async fn service(
        &self,
        name: &str,
        tag: Option<&str>,
        options: &QueryOptions,
    ) -> Result<(Vec<CatalogService>, QueryMeta), ClientError>;
}
