//! Catalog service queries.
//!
//! A query names one service in the catalog, optionally narrowed by tag,
//! datacenter, namespace and partition, and optionally sorted by proximity
//! to a node:
//!
//! ```text
//! [tag.]name[?ns=<namespace>&partition=<partition>][@dc][~near]
//! ```
//!
//! Queries are built by [`parse`] and rendered back to their canonical
//! `catalog.service(...)` form through `Display`.

mod parser;
mod render;

use std::hash::{Hash, Hasher};
use tokio_util::sync::CancellationToken;

pub use parser::parse;

/// A parsed catalog service lookup.
///
/// Fields are fixed at parse time. The only state change a query supports is
/// [`cancel`](ServiceQuery::cancel), which aborts a fetch blocked on it.
/// Share a query between tasks with `Arc` rather than cloning it: a query
/// owns exactly one cancellation signal.
#[derive(Debug)]
pub struct ServiceQuery {
    name: String,
    tag: String,
    dc: String,
    near: String,
    namespace: String,
    partition: String,
    stop: CancellationToken,
}

impl ServiceQuery {
    fn new(
        name: String,
        tag: String,
        dc: String,
        near: String,
        namespace: String,
        partition: String,
    ) -> Self {
        Self {
            name,
            tag,
            dc,
            near,
            namespace,
            partition,
            stop: CancellationToken::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag filter, `None` when the query is unfiltered
    pub fn tag(&self) -> Option<&str> {
        non_empty(&self.tag)
    }

    pub fn datacenter(&self) -> Option<&str> {
        non_empty(&self.dc)
    }

    pub fn near(&self) -> Option<&str> {
        non_empty(&self.near)
    }

    pub fn namespace(&self) -> Option<&str> {
        non_empty(&self.namespace)
    }

    pub fn partition(&self) -> Option<&str> {
        non_empty(&self.partition)
    }

    /// Abort any fetch currently blocked on this query.
    /// Calling this more than once has no further effect.
    pub fn cancel(&self) {
        if !self.stop.is_cancelled() {
            tracing::debug!("Cancelling {}", self);
        }
        self.stop.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.stop.is_cancelled()
    }

    /// Token observed by fetches; cancelled by [`cancel`](ServiceQuery::cancel)
    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.stop
    }

    fn semantic_fields(&self) -> [&str; 6] {
        [
            self.name.as_str(),
            self.tag.as_str(),
            self.dc.as_str(),
            self.near.as_str(),
            self.namespace.as_str(),
            self.partition.as_str(),
        ]
    }
}

// Equality and hashing ignore the cancellation signal.
impl PartialEq for ServiceQuery {
    fn eq(&self, other: &Self) -> bool {
        self.semantic_fields() == other.semantic_fields()
    }
}

impl Eq for ServiceQuery {}

impl Hash for ServiceQuery {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.semantic_fields().hash(state);
    }
}

impl std::str::FromStr for ServiceQuery {
    type Err = crate::error::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
