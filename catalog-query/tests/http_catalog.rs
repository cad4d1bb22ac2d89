//! End-to-end fetches against a fake catalog served over HTTP.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use catalog_query::catalog::http::HttpCatalog;
use catalog_query::config::{CatalogConfig, Config};
use catalog_query::{fetch, parse, ClientError, FetchError, QueryOptions};
use shared::protocol::NEAR_AGENT;
use shared::types::CatalogService;

const CATALOG_INDEX: u64 = 42;

#[derive(Debug, Clone)]
struct Recorded {
    name: String,
    params: HashMap<String, String>,
    token: Option<String>,
}

#[derive(Clone)]
struct AppState {
    services: Arc<Vec<CatalogService>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/catalog/service/:name", get(get_service))
        .with_state(state)
}

async fn get_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    state.requests.lock().unwrap().push(Recorded {
        name: name.clone(),
        params: params.clone(),
        token: headers
            .get("x-consul-token")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    if name == "leaderless" {
        return (StatusCode::INTERNAL_SERVER_ERROR, "No cluster leader").into_response();
    }

    // nothing ever changes, so a blocking query at the current index hangs
    let wait_index = params.get("index").and_then(|v| v.parse::<u64>().ok());
    if wait_index.is_some_and(|i| i >= CATALOG_INDEX) {
        std::future::pending::<()>().await;
    }

    let tag = params.get("tag");
    let matching: Vec<CatalogService> = state
        .services
        .iter()
        .filter(|s| s.service_name == name)
        .filter(|s| tag.map_or(true, |t| s.has_tag(t)))
        .cloned()
        .collect();

    (
        [
            ("X-Consul-Index", CATALOG_INDEX.to_string()),
            ("X-Consul-KnownLeader", "true".to_string()),
            ("X-Consul-LastContact", "3".to_string()),
        ],
        Json(matching),
    )
        .into_response()
}

fn instance(node: &str, id: &str, tags: &[&str]) -> CatalogService {
    CatalogService {
        node: node.to_string(),
        address: "127.0.0.1".to_string(),
        datacenter: "dc1".to_string(),
        tagged_addresses: HashMap::from([
            ("lan".to_string(), "127.0.0.1".to_string()),
            ("wan".to_string(), "127.0.0.1".to_string()),
        ]),
        service_id: id.to_string(),
        service_name: "web".to_string(),
        service_tags: tags.iter().map(|t| t.to_string()).collect(),
        service_meta: HashMap::from([("meta1".to_string(), "value1".to_string())]),
        service_port: 8080,
        ..CatalogService::default()
    }
}

struct FakeCatalog {
    address: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeCatalog {
    async fn start() -> Self {
        // deliberately out of node order
        let services = vec![
            instance("node-b", "web-2", &["v2"]),
            instance("node-a", "web-9", &["v1", "primary"]),
            instance("node-a", "web-1", &["v1"]),
        ];
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = AppState {
            services: Arc::new(services),
            requests: requests.clone(),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        Self { address, requests }
    }

    fn client(&self, token: Option<&str>) -> HttpCatalog {
        HttpCatalog::new(&CatalogConfig {
            address: self.address.clone(),
            token: token.map(str::to_string),
            ..CatalogConfig::default()
        })
        .unwrap()
    }

    fn last_request(&self) -> Recorded {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[tokio::test]
async fn test_fetch_untagged_sorted() {
    let fake = FakeCatalog::start().await;
    let client = fake.client(None);

    let q = parse("web").unwrap();
    let (services, meta) = fetch(&q, &client, QueryOptions::default()).await.unwrap();

    let ids: Vec<_> = services
        .iter()
        .map(|s| (s.node.as_str(), s.service_id.as_str()))
        .collect();
    assert_eq!(ids, vec![("node-a", "web-1"), ("node-a", "web-9"), ("node-b", "web-2")]);
    assert_eq!(services[0].service_meta.get("meta1").map(String::as_str), Some("value1"));

    assert_eq!(meta.last_index, CATALOG_INDEX);
    assert_eq!(meta.last_contact, Duration::from_millis(3));
    assert!(meta.known_leader);

    let request = fake.last_request();
    assert_eq!(request.name, "web");
    assert!(!request.params.contains_key("tag"), "untagged query must not filter");
}

#[tokio::test]
async fn test_fetch_forwards_query_fields() {
    let fake = FakeCatalog::start().await;
    let client = fake.client(Some("s3cr3t"));

    let q = parse(&format!("v1.web?ns=team&partition=blue@dc1~{}", NEAR_AGENT)).unwrap();
    let (services, _) = fetch(&q, &client, QueryOptions::default()).await.unwrap();

    assert_eq!(services.len(), 2);
    assert!(services.iter().all(|s| s.has_tag("v1")));

    let request = fake.last_request();
    let param = |k: &str| request.params.get(k).map(String::as_str);
    assert_eq!(param("tag"), Some("v1"));
    assert_eq!(param("dc"), Some("dc1"));
    assert_eq!(param("near"), Some(NEAR_AGENT));
    assert_eq!(param("ns"), Some("team"));
    assert_eq!(param("partition"), Some("blue"));
    assert_eq!(request.token.as_deref(), Some("s3cr3t"));
}

#[tokio::test]
async fn test_config_options_reach_catalog() {
    let fake = FakeCatalog::start().await;
    let client = fake.client(None);

    let mut config = Config::default();
    config.catalog.datacenter = Some("dc1".to_string());
    config.query.wait_secs = 5;
    config.query.allow_stale = true;

    let q = parse("web").unwrap();
    fetch(&q, &client, config.query_options()).await.unwrap();

    let request = fake.last_request();
    assert_eq!(request.params.get("dc").map(String::as_str), Some("dc1"));
    assert_eq!(request.params.get("wait").map(String::as_str), Some("5s"));
    assert!(request.params.contains_key("stale"));
}

#[tokio::test]
async fn test_repeated_fetch_is_stable() {
    let fake = FakeCatalog::start().await;
    let client = fake.client(None);
    let q = parse("web").unwrap();

    let (first, _) = fetch(&q, &client, QueryOptions::default()).await.unwrap();
    let (second, _) = fetch(&q, &client, QueryOptions::default()).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        catalog_query::hash::fingerprint(&first),
        catalog_query::hash::fingerprint(&second)
    );
}

#[tokio::test]
async fn test_unknown_service_is_empty() {
    let fake = FakeCatalog::start().await;
    let client = fake.client(None);

    let q = parse("nothing-here").unwrap();
    let (services, _) = fetch(&q, &client, QueryOptions::default()).await.unwrap();
    assert!(services.is_empty());
}

#[tokio::test]
async fn test_server_error_is_wrapped() {
    let fake = FakeCatalog::start().await;
    let client = fake.client(None);

    let q = parse("leaderless@dc1").unwrap();
    let err = fetch(&q, &client, QueryOptions::default()).await.unwrap_err();

    match &err {
        FetchError::Catalog {
            query,
            source: ClientError::Status { status, body },
        } => {
            assert_eq!(query, "catalog.service(leaderless@dc1)");
            assert_eq!(*status, 500);
            assert_eq!(body, "No cluster leader");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_refused_is_wrapped() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = HttpCatalog::new(&CatalogConfig {
        address,
        ..CatalogConfig::default()
    })
    .unwrap();

    let q = parse("web").unwrap();
    let err = fetch(&q, &client, QueryOptions::default()).await.unwrap_err();
    assert!(matches!(
        err,
        FetchError::Catalog { source: ClientError::Http(_), .. }
    ));
}

#[tokio::test]
async fn test_cancel_blocking_fetch() {
    let fake = FakeCatalog::start().await;
    let client = Arc::new(fake.client(None));
    let q = Arc::new(parse("web").unwrap());

    let task = {
        let client = client.clone();
        let q = q.clone();
        tokio::spawn(async move {
            let opts = QueryOptions::blocking(CATALOG_INDEX, Duration::from_secs(300));
            fetch(&q, client.as_ref(), opts).await
        })
    };

    // let the request reach the server before cancelling
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        fake.last_request().params.get("index").map(String::as_str),
        Some("42")
    );
    q.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("cancelled fetch should return promptly")
        .unwrap();
    assert!(result.unwrap_err().is_cancelled());

    // cancelling again is harmless
    q.cancel();
}
