use std::collections::HashMap;
use serde::{Deserialize, Deserializer, Serialize};

/// A single service instance as returned by the catalog.
/// Field names on the wire follow the catalog's PascalCase JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogService {
    /// Node ID, empty when the catalog does not report one
    #[serde(rename = "ID", default)]
    pub id: String,

    /// Node name, e.g. "node-1"
    #[serde(default)]
    pub node: String,

    /// Node address
    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub datacenter: String,

    /// Address class ("lan", "wan", ...) to address
    #[serde(default, deserialize_with = "null_as_default")]
    pub tagged_addresses: HashMap<String, String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub node_meta: HashMap<String, String>,

    #[serde(rename = "ServiceID", default)]
    pub service_id: String,

    #[serde(default)]
    pub service_name: String,

    /// Advertised service address; empty means "use the node address"
    #[serde(default)]
    pub service_address: String,

    /// Tags in catalog order, duplicates preserved
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_tags: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub service_meta: HashMap<String, String>,

    #[serde(default)]
    pub service_port: u16,
}

impl CatalogService {
    /// Whether this instance carries the given tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.service_tags.iter().any(|t| t == tag)
    }
}

/// The catalog encodes empty maps and lists as `null`
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
