use std::collections::{BTreeMap, HashMap};
use serde::Serialize;
use sha2::{Digest, Sha256};
use shared::types::CatalogService;

/// Maps are re-keyed into BTreeMaps so their serialisation order is fixed.
#[derive(Serialize)]
struct HashView<'a> {
    id: &'a str,
    node: &'a str,
    address: &'a str,
    datacenter: &'a str,
    tagged_addresses: BTreeMap<&'a str, &'a str>,
    node_meta: BTreeMap<&'a str, &'a str>,
    service_id: &'a str,
    service_name: &'a str,
    service_address: &'a str,
    service_tags: &'a [String],
    service_meta: BTreeMap<&'a str, &'a str>,
    service_port: u16,
}

fn sorted(map: &HashMap<String, String>) -> BTreeMap<&str, &str> {
    map.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
}

/// Computes a SHA-256 fingerprint of a fetch result.
/// Instances are taken in node, then service ID order, so the fingerprint
/// does not depend on the order of the slice.
pub fn fingerprint(services: &[CatalogService]) -> String {
    let mut indices: Vec<usize> = (0..services.len()).collect();
    indices.sort_by(|&a, &b| {
        let (a, b) = (&services[a], &services[b]);
        a.node.cmp(&b.node).then_with(|| a.service_id.cmp(&b.service_id))
    });

    let views: Vec<HashView<'_>> = indices
        .iter()
        .map(|&i| {
            let s = &services[i];
            HashView {
                id: &s.id,
                node: &s.node,
                address: &s.address,
                datacenter: &s.datacenter,
                tagged_addresses: sorted(&s.tagged_addresses),
                node_meta: sorted(&s.node_meta),
                service_id: &s.service_id,
                service_name: &s.service_name,
                service_address: &s.service_address,
                service_tags: &s.service_tags,
                service_meta: sorted(&s.service_meta),
                service_port: s.service_port,
            }
        })
        .collect();

    let json = serde_json::to_string(&views)
        .expect("Failed to serialize services for hashing");

    let hash = Sha256::digest(json.as_bytes());
    hex::encode(hash)
}
