mod common;

use anyhow::Result;
use jsonschema::JSONSchema;
use serde_json::{json, Value};
use std::fs;
use tempfile::tempdir;

use club_network::pipeline::NetworkPipeline;

fn compiled_schema() -> JSONSchema {
    let schema = include_str!("../schemas/network.v1.json");
    let schema_json: Value = serde_json::from_str(schema).unwrap();
    let schema_static: &'static Value = Box::leak(Box::new(schema_json));
    JSONSchema::options().compile(schema_static).unwrap()
}

fn built_documents() -> Result<Vec<Value>> {
    let root = tempdir()?;
    common::write_sources(&root.path().join("data"))?;
    let result = NetworkPipeline::new(common::config_in(root.path())).run()?;
    result
        .years
        .iter()
        .map(|y| -> Result<Value> { Ok(serde_json::from_str(&fs::read_to_string(&y.output)?)?) })
        .collect()
}

#[test]
fn emitted_documents_are_valid() -> Result<()> {
    let compiled = compiled_schema();
    let documents = built_documents()?;
    assert_eq!(documents.len(), 2);
    for doc in &documents {
        assert!(compiled.is_valid(doc), "document failed schema: {doc}");
    }
    Ok(())
}

#[test]
fn directed_graphs_are_rejected() -> Result<()> {
    let compiled = compiled_schema();
    let mut doc = built_documents()?.remove(0);
    doc["directed"] = json!(true);
    assert!(!compiled.is_valid(&doc));
    Ok(())
}

#[test]
fn short_link_rows_are_rejected() -> Result<()> {
    let compiled = compiled_schema();
    let mut doc = built_documents()?.remove(0);
    doc["links"][0] = json!(["Berghain", "Tresor"]);
    assert!(!compiled.is_valid(&doc));
    Ok(())
}
