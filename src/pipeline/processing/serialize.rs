//! Column-oriented node/link documents.
//!
//! Every node (and every link) shares one attribute schema, so the keys are
//! written once and each record becomes a positional value list. Readers
//! re-zip `node_keys` with each entry of `nodes` to get the objects back.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::error::{NetworkError, Result};
use crate::pipeline::processing::graph::{VenueGraph, VenueNode};

pub const NODE_KEYS: [&str; 14] = [
    "club_id",
    "region",
    "country",
    "logo",
    "number_of_dates",
    "rank",
    "number_of_unique_artists",
    "total_number_of_artists",
    "artists",
    "followers",
    "capacity",
    "attending",
    "group",
    "id",
];

pub const LINK_KEYS: [&str; 3] = ["weight", "source", "target"];

pub type Record = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDocument {
    pub directed: bool,
    pub multigraph: bool,
    pub graph: Record,
    pub node_keys: Vec<String>,
    pub nodes: Vec<Vec<Value>>,
    pub link_keys: Vec<String>,
    pub links: Vec<Vec<Value>>,
    pub artist_names_to_ids: BTreeMap<String, String>,
}

impl NetworkDocument {
    pub fn node_records(&self) -> Result<Vec<Record>> {
        rezip(&self.node_keys, &self.nodes)
    }

    pub fn link_records(&self) -> Result<Vec<Record>> {
        rezip(&self.link_keys, &self.links)
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

/// Split records into one key list plus positional rows. The key order is the
/// first record's; an empty input falls back to `default_keys`.
pub fn to_columnar(records: Vec<Record>, default_keys: &[&str]) -> Result<(Vec<String>, Vec<Vec<Value>>)> {
    let keys: Vec<String> = match records.first() {
        Some(first) => first.keys().cloned().collect(),
        None => default_keys.iter().map(|k| k.to_string()).collect(),
    };

    let mut rows = Vec::with_capacity(records.len());
    for (i, record) in records.into_iter().enumerate() {
        if record.len() != keys.len() || !record.keys().zip(&keys).all(|(a, b)| a == b) {
            return Err(NetworkError::Schema(format!(
                "record {} has keys {:?}, expected {:?}",
                i,
                record.keys().collect::<Vec<_>>(),
                keys
            )));
        }
        rows.push(record.into_iter().map(|(_, v)| v).collect());
    }
    Ok((keys, rows))
}

/// Inverse of [`to_columnar`]
pub fn rezip(keys: &[String], rows: &[Vec<Value>]) -> Result<Vec<Record>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            if row.len() != keys.len() {
                return Err(NetworkError::Schema(format!(
                    "row {} has {} values for {} keys",
                    i,
                    row.len(),
                    keys.len()
                )));
            }
            Ok(keys.iter().cloned().zip(row.iter().cloned()).collect())
        })
        .collect()
}

pub fn node_record(node: &VenueNode) -> Record {
    let s = &node.summary;
    let mut record = Map::new();
    record.insert("club_id".into(), json!(s.club_id));
    record.insert("region".into(), json!(s.region));
    record.insert("country".into(), json!(s.country));
    record.insert("logo".into(), json!(s.logo));
    record.insert("number_of_dates".into(), json!(s.number_of_dates));
    record.insert("rank".into(), json!(s.rank));
    record.insert("number_of_unique_artists".into(), json!(s.number_of_unique_artists));
    record.insert("total_number_of_artists".into(), json!(s.total_number_of_artists));
    record.insert("artists".into(), json!(s.artists));
    record.insert("followers".into(), json!(s.followers));
    record.insert("capacity".into(), json!(s.capacity));
    record.insert("attending".into(), json!(s.attending));
    record.insert("group".into(), json!(node.group));
    record.insert("id".into(), json!(s.venue_name));
    record
}

pub fn link_record(source: &str, target: &str, weight: f64) -> Record {
    let mut record = Map::new();
    record.insert("weight".into(), json!(weight));
    record.insert("source".into(), json!(source));
    record.insert("target".into(), json!(target));
    record
}

/// Build the standalone document for one year's graph
pub fn network_document(
    graph: &VenueGraph,
    artist_names_to_ids: &BTreeMap<String, String>,
) -> Result<NetworkDocument> {
    let (node_keys, nodes) = to_columnar(graph.nodes().map(node_record).collect(), &NODE_KEYS)?;
    let (link_keys, links) = to_columnar(
        graph.links().map(|(s, t, w)| link_record(s, t, w)).collect(),
        &LINK_KEYS,
    )?;

    Ok(NetworkDocument {
        directed: false,
        multigraph: false,
        graph: Map::new(),
        node_keys,
        nodes,
        link_keys,
        links,
        artist_names_to_ids: artist_names_to_ids.clone(),
    })
}
