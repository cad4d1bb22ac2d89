//! Executes a [`ServiceQuery`] against a catalog.

use shared::types::CatalogService;
use crate::catalog::{CatalogClient, QueryMeta, QueryOptions};
use crate::error::{ClientError, FetchError};
use crate::query::ServiceQuery;

/// Look up the instances matched by `query`.
///
/// The query's datacenter, near, namespace and partition override the ones in
/// `options`, and its cancellation signal is attached so a blocking lookup
/// can be aborted with [`ServiceQuery::cancel`]. Results are ordered by node,
/// then service ID, so repeated fetches of unchanged state compare equal.
pub async fn fetch(
    query: &ServiceQuery,
    client: &dyn CatalogClient,
    options: QueryOptions,
) -> Result<(Vec<CatalogService>, QueryMeta), FetchError> {
    let cancel = query.cancel_token();
    if cancel.is_cancelled() {
        return Err(cancelled(query));
    }

    let options = merge_options(query, options);
    tracing::debug!(
        "Fetching {} (index {:?})",
        query,
        options.wait_index
    );

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(cancelled(query)),
        result = client.service(query.name(), query.tag(), &options) => result,
    };

    let (mut services, meta) = result.map_err(|e| match e {
        ClientError::Cancelled => cancelled(query),
        source => FetchError::Catalog {
            query: query.to_string(),
            source,
        },
    })?;

    sort_services(&mut services);

    tracing::debug!(
        "Fetched {}: {} instances at index {}",
        query,
        services.len(),
        meta.last_index
    );

    Ok((services, meta))
}

fn merge_options(query: &ServiceQuery, mut options: QueryOptions) -> QueryOptions {
    let overrides = [
        (&mut options.datacenter, query.datacenter()),
        (&mut options.near, query.near()),
        (&mut options.namespace, query.namespace()),
        (&mut options.partition, query.partition()),
    ];
    for (slot, value) in overrides {
        if let Some(value) = value {
            *slot = Some(value.to_string());
        }
    }
    options.cancel = Some(query.cancel_token().clone());
    options
}

/// Stable sort by node, then service ID
fn sort_services(services: &mut [CatalogService]) {
    services.sort_by(|a, b| {
        a.node
            .cmp(&b.node)
            .then_with(|| a.service_id.cmp(&b.service_id))
    });
}

fn cancelled(query: &ServiceQuery) -> FetchError {
    FetchError::Cancelled {
        query: query.to_string(),
    }
}
