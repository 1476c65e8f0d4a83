mod common;

use anyhow::Result;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::fs;
use tempfile::tempdir;

use club_network::pipeline::{read_document, NetworkPipeline};
use club_network::NetworkError;

#[test]
fn test_build_writes_one_document_per_year() -> Result<()> {
    let root = tempdir()?;
    common::write_sources(&root.path().join("data"))?;
    let config = common::config_in(root.path());

    let result = NetworkPipeline::new(config.clone()).run()?;

    assert!(!result.cache_hit);
    // e6 has no detail record, every other event contributes its lineup
    assert_eq!(result.fact_rows, 8);
    assert_eq!(result.years.iter().map(|y| y.year).collect::<Vec<_>>(), vec![2019, 2020]);
    assert_eq!(result.artist_exceptions, 1);

    let y2019 = &result.years[0];
    assert_eq!((y2019.venues, y2019.links), (3, 3));
    assert_eq!(y2019.output, config.output.dir.join("network-2019.json"));

    // zero-overlap pair is not linked by default
    let y2020 = &result.years[1];
    assert_eq!((y2020.venues, y2020.links, y2020.communities), (2, 0, 2));

    for year in &result.years {
        assert!(year.output.exists());
    }
    Ok(())
}

#[test]
fn test_documents_rezip_to_node_attributes() -> Result<()> {
    let root = tempdir()?;
    common::write_sources(&root.path().join("data"))?;
    let config = common::config_in(root.path());
    NetworkPipeline::new(config.clone()).run()?;

    let doc = read_document(&config.output.dir.join("network-2019.json"))?;
    let nodes = doc.node_records()?;
    let names: Vec<&str> = nodes.iter().filter_map(|n| n["id"].as_str()).collect();
    assert_eq!(names, vec!["Berghain", "Fabric", "Tresor"]);

    let berghain = &nodes[0];
    assert_eq!(berghain["club_id"], json!("c2"));
    assert_eq!(berghain["region"], json!("Berlin"));
    assert_eq!(berghain["logo"], json!("https://img.example/berghain.jpg"));
    assert_eq!(berghain["capacity"], Value::Null);
    assert_eq!(berghain["attending"], json!(250));
    assert_eq!(berghain["artists"], json!({"Ben Klock": 1, "Marcel Dettmann": 1}));
    assert_eq!(berghain["number_of_dates"], json!(1));

    // Berghain and Tresor share their whole lineup
    let links = doc.link_records()?;
    let strongest = links
        .iter()
        .find(|l| l["source"] == json!("Berghain") && l["target"] == json!("Tresor"))
        .expect("Berghain-Tresor link");
    assert_eq!(strongest["weight"], json!(1.0));
    assert_eq!(berghain["group"], nodes[2]["group"]);

    assert_eq!(doc.artist_names_to_ids.get("DJ Koze").map(String::as_str), Some("dj-koze"));
    Ok(())
}

#[test]
fn test_no_cross_year_leakage() -> Result<()> {
    let root = tempdir()?;
    common::write_sources(&root.path().join("data"))?;
    let config = common::config_in(root.path());
    NetworkPipeline::new(config.clone()).run()?;

    let doc = read_document(&config.output.dir.join("network-2020.json"))?;
    let nodes = doc.node_records()?;
    let names: BTreeSet<&str> = nodes.iter().filter_map(|n| n["id"].as_str()).collect();
    // Tresor only appears in 2019 with a lineup
    assert_eq!(names, BTreeSet::from(["Berghain", "Fabric"]));
    assert!(doc.links.is_empty());
    assert_eq!(doc.link_keys, vec!["weight", "source", "target"]);

    let fabric = nodes.iter().find(|n| n["id"] == json!("Fabric")).unwrap();
    assert_eq!(fabric["artists"], json!({"Ben UFO": 1}));
    assert_eq!(fabric["attending"], json!(30));
    Ok(())
}

#[test]
fn test_rebuilds_are_byte_identical() -> Result<()> {
    let root = tempdir()?;
    common::write_sources(&root.path().join("data"))?;
    let mut config = common::config_in(root.path());
    config.cache.enabled = false;

    NetworkPipeline::new(config.clone()).run()?;
    let first = fs::read(config.output.dir.join("network-2019.json"))?;
    NetworkPipeline::new(config.clone()).run()?;
    let second = fs::read(config.output.dir.join("network-2019.json"))?;

    assert_eq!(first, second);
    assert!(!config.cache.path.exists());
    Ok(())
}

#[test]
fn test_malformed_row_fails_without_output() -> Result<()> {
    let root = tempdir()?;
    let data = root.path().join("data");
    common::write_sources(&data)?;
    fs::write(
        data.join("top-clubs-dates.csv"),
        common::DATES.replace("2019-05-17", "the seventeenth"),
    )?;
    let config = common::config_in(root.path());

    let err = NetworkPipeline::new(config.clone()).run().unwrap_err();
    match err {
        NetworkError::MalformedRow { file, line, .. } => {
            assert!(file.ends_with("top-clubs-dates.csv"));
            assert_eq!(line, 4);
        }
        other => panic!("expected MalformedRow, got {other:?}"),
    }
    assert!(!config.output.dir.join("network-2019.json").exists());
    Ok(())
}

#[test]
fn test_duplicate_detail_across_files_is_fatal() -> Result<()> {
    let root = tempdir()?;
    let data = root.path().join("data");
    common::write_sources(&data)?;
    let repeated = format!(
        "{}e1,23:00,07:00,,,,,\"[['benufo', 'Ben UFO']]\",,\n",
        common::DETAILS_2020
    );
    fs::write(data.join("date-details-2020.csv"), repeated)?;

    let err = NetworkPipeline::new(common::config_in(root.path())).run().unwrap_err();
    assert!(matches!(err, NetworkError::DuplicateKey { key, .. } if key == "e1"));
    Ok(())
}

#[test]
fn test_conflicting_venue_attributes() -> Result<()> {
    let root = tempdir()?;
    let data = root.path().join("data");
    common::write_sources(&data)?;
    // a second club listed under the same name
    fs::write(
        data.join("top-clubs.csv"),
        format!("{}c4,,Tresor,Elsewhere,9,de-berlin,,\n", common::CLUBS),
    )?;
    fs::write(
        data.join("top-clubs-dates.csv"),
        format!("{}e7,2019-06-01,5,Tresor too,,c4\n", common::DATES),
    )?;
    fs::write(
        data.join("date-details-2019.csv"),
        format!("{}e7,,,,,,,\"[['benklock', 'Ben Klock']]\",,5\n", common::DETAILS_2019),
    )?;

    let mut config = common::config_in(root.path());
    let lenient = NetworkPipeline::new(config.clone()).run()?;
    assert_eq!(lenient.years[0].venues, 3);

    config.aggregate.strict_venue_attributes = true;
    config.output.dir = root.path().join("strict");
    let err = NetworkPipeline::new(config.clone()).run().unwrap_err();
    assert!(matches!(
        err,
        NetworkError::InconsistentVenue { ref venue, field: "club_id", .. } if venue == "Tresor"
    ));
    assert!(!config.output.dir.exists());
    Ok(())
}

#[test]
fn test_inclusive_threshold_links_zero_overlap() -> Result<()> {
    let root = tempdir()?;
    common::write_sources(&root.path().join("data"))?;
    let mut config = common::config_in(root.path());
    config.similarity.inclusive = true;

    let result = NetworkPipeline::new(config).run()?;
    assert_eq!(result.years[1].links, 1);
    Ok(())
}

#[test]
fn test_analyze_reports_every_region() -> Result<()> {
    let root = tempdir()?;
    common::write_sources(&root.path().join("data"))?;
    let years = NetworkPipeline::new(common::config_in(root.path())).analyze()?;

    assert_eq!(years.len(), 2);
    let regions: Vec<&str> = years[0].comparisons.iter().map(|c| c.region.as_str()).collect();
    assert_eq!(regions, vec!["Berlin", "London"]);
    // far too few venues to call anything distinct
    assert!(years.iter().flat_map(|y| &y.comparisons).all(|c| !c.distinct));
    Ok(())
}
