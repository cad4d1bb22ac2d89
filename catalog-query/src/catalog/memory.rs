//! In-process catalog with blocking-query semantics.
//!
//! Every registration change bumps a catalog-wide index. A lookup that
//! carries a `wait_index` blocks until the index moves past it, the wait
//! time runs out, or its cancellation token fires.

use std::sync::RwLock;
use std::time::Duration;
use async_trait::async_trait;
use tokio::sync::watch;
use shared::types::CatalogService;
use super::{CatalogClient, QueryMeta, QueryOptions};
use crate::error::ClientError;

pub const DEFAULT_DATACENTER: &str = "dc1";
pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_PARTITION: &str = "default";

/// Wait applied to blocking lookups that do not set `wait_time`
const DEFAULT_WAIT: Duration = Duration::from_secs(300);

struct Registration {
    service: CatalogService,
    namespace: String,
    partition: String,
}

impl Registration {
    fn same_instance(&self, other: &Registration) -> bool {
        self.service.datacenter == other.service.datacenter
            && self.service.node == other.service.node
            && self.service.service_id == other.service.service_id
            && self.namespace == other.namespace
            && self.partition == other.partition
    }
}

pub struct MemoryCatalog {
    registrations: RwLock<Vec<Registration>>,
    index_tx: watch::Sender<u64>,
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCatalog {
    pub fn new() -> Self {
        let (index_tx, _) = watch::channel(1);
        Self {
            registrations: RwLock::new(Vec::new()),
            index_tx,
        }
    }

    /// Current catalog index
    pub fn index(&self) -> u64 {
        *self.index_tx.borrow()
    }

    /// Register in the default namespace and partition.
    /// An empty datacenter is stored as `dc1`.
    pub fn register(&self, service: CatalogService) -> u64 {
        self.register_in(service, DEFAULT_NAMESPACE, DEFAULT_PARTITION)
    }

    /// Register, replacing any instance with the same node and service ID.
    /// Returns the new catalog index.
    pub fn register_in(&self, mut service: CatalogService, namespace: &str, partition: &str) -> u64 {
        if service.datacenter.is_empty() {
            service.datacenter = DEFAULT_DATACENTER.to_string();
        }
        tracing::debug!(
            "Registering {} on {} in {}",
            service.service_id,
            service.node,
            service.datacenter
        );

        let registration = Registration {
            service,
            namespace: namespace.to_string(),
            partition: partition.to_string(),
        };

        let mut registrations = self.write();
        match registrations.iter_mut().find(|r| r.same_instance(&registration)) {
            Some(existing) => *existing = registration,
            None => registrations.push(registration),
        }
        drop(registrations);

        self.bump()
    }

    /// Remove one instance from the default namespace and partition.
    /// Returns false, leaving the index alone, when nothing matched.
    pub fn deregister(&self, datacenter: &str, node: &str, service_id: &str) -> bool {
        let mut registrations = self.write();
        let before = registrations.len();
        registrations.retain(|r| {
            !(r.service.datacenter == datacenter
                && r.service.node == node
                && r.service.service_id == service_id
                && r.namespace == DEFAULT_NAMESPACE
                && r.partition == DEFAULT_PARTITION)
        });
        let removed = registrations.len() != before;
        drop(registrations);

        if removed {
            self.bump();
        }
        removed
    }

    fn bump(&self) -> u64 {
        let mut next = 0;
        self.index_tx.send_modify(|index| {
            *index += 1;
            next = *index;
        });
        next
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Registration>> {
        // a panicked writer leaves the list itself intact
        self.registrations.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Wait until the index is past `wait_index`, the wait elapses, or the
    /// lookup is cancelled
    async fn wait_past(&self, wait_index: u64, options: &QueryOptions) -> Result<(), ClientError> {
        let mut rx = self.index_tx.subscribe();
        if wait_index == 0 || *rx.borrow_and_update() > wait_index {
            return Ok(());
        }

        let wait = options.wait_time.unwrap_or(DEFAULT_WAIT);
        let cancel = options.cancel.clone().unwrap_or_default();

        let changed = async {
            // the sender lives as long as self, so changed() only fails on drop
            while rx.changed().await.is_ok() {
                if *rx.borrow_and_update() > wait_index {
                    break;
                }
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            _ = tokio::time::timeout(wait, changed) => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogClient for MemoryCatalog {
    async fn service(
        &self,
        name: &str,
        tag: Option<&str>,
        options: &QueryOptions,
    ) -> Result<(Vec<CatalogService>, QueryMeta), ClientError> {
        if options.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        if let Some(wait_index) = options.wait_index {
            self.wait_past(wait_index, options).await?;
        }

        let datacenter = options.datacenter.as_deref().unwrap_or(DEFAULT_DATACENTER);
        let namespace = options.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE);
        let partition = options.partition.as_deref().unwrap_or(DEFAULT_PARTITION);

        let registrations = self.registrations.read().unwrap_or_else(|e| e.into_inner());
        let services = registrations
            .iter()
            .filter(|r| {
                r.service.service_name == name
                    && r.service.datacenter == datacenter
                    && r.namespace == namespace
                    && r.partition == partition
                    && tag.map_or(true, |t| r.service.has_tag(t))
            })
            .map(|r| r.service.clone())
            .collect();

        let meta = QueryMeta {
            last_index: self.index(),
            last_contact: Duration::ZERO,
            known_leader: true,
        };

        Ok((services, meta))
    }
}
