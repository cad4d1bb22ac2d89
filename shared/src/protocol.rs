/// Catalog endpoint for service lookups; the service name is appended
pub const CATALOG_SERVICE_PATH: &str = "/v1/catalog/service/";

/// Query parameters understood by the catalog service endpoint
pub const PARAM_TAG: &str = "tag";
pub const PARAM_DC: &str = "dc";
pub const PARAM_NEAR: &str = "near";
pub const PARAM_NAMESPACE: &str = "ns";
pub const PARAM_PARTITION: &str = "partition";
pub const PARAM_INDEX: &str = "index";
pub const PARAM_WAIT: &str = "wait";
pub const PARAM_STALE: &str = "stale";

/// Request header carrying the ACL token
pub const HEADER_TOKEN: &str = "X-Consul-Token";

/// Response headers describing a blocking query result
pub const HEADER_INDEX: &str = "X-Consul-Index";
pub const HEADER_LAST_CONTACT: &str = "X-Consul-LastContact";
pub const HEADER_KNOWN_LEADER: &str = "X-Consul-KnownLeader";

/// `near` value the catalog resolves to the agent serving the request
pub const NEAR_AGENT: &str = "_agent";
