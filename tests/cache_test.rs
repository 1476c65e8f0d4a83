mod common;

use anyhow::Result;
use std::fs;
use tempfile::tempdir;

use club_network::pipeline::storage::cache;
use club_network::pipeline::NetworkPipeline;

#[test]
fn test_second_run_uses_cache() -> Result<()> {
    let root = tempdir()?;
    common::write_sources(&root.path().join("data"))?;
    let config = common::config_in(root.path());

    let first = NetworkPipeline::new(config.clone()).run()?;
    assert!(!first.cache_hit);
    assert!(config.cache.path.exists());
    let fresh = fs::read(config.output.dir.join("network-2019.json"))?;

    let second = NetworkPipeline::new(config.clone()).run()?;
    assert!(second.cache_hit);
    assert_eq!(second.fact_rows, first.fact_rows);
    assert_ne!(second.run_id, first.run_id);

    // the cached join must produce the same documents
    let cached = fs::read(config.output.dir.join("network-2019.json"))?;
    assert_eq!(fresh, cached);
    Ok(())
}

#[test]
fn test_corrupt_cache_falls_back_to_sources() -> Result<()> {
    let root = tempdir()?;
    common::write_sources(&root.path().join("data"))?;
    let config = common::config_in(root.path());
    fs::write(&config.cache.path, "{\"version\": 1, \"rows\": [tru")?;

    let result = NetworkPipeline::new(config.clone()).run()?;
    assert!(!result.cache_hit);
    assert_eq!(result.fact_rows, 8);

    // and the broken file was replaced with a usable one
    assert!(NetworkPipeline::new(config).run()?.cache_hit);
    Ok(())
}

#[test]
fn test_changed_sources_invalidate_cache() -> Result<()> {
    let root = tempdir()?;
    let data = root.path().join("data");
    common::write_sources(&data)?;
    let config = common::config_in(root.path());
    NetworkPipeline::new(config.clone()).run()?;

    fs::write(
        data.join("date-details-2020.csv"),
        common::DETAILS_2020.replace("'DJ Koze'", "'Ben UFO'").replace("'dj-koze'", "'benufo'"),
    )?;
    let result = NetworkPipeline::new(config).run()?;
    assert!(!result.cache_hit);
    assert_eq!(result.artist_exceptions, 0);
    assert_eq!(result.years[1].links, 1);
    Ok(())
}

#[test]
fn test_rebuild_and_disable_flags() -> Result<()> {
    let root = tempdir()?;
    common::write_sources(&root.path().join("data"))?;
    let mut config = common::config_in(root.path());
    NetworkPipeline::new(config.clone()).run()?;

    config.cache.rebuild = true;
    assert!(!NetworkPipeline::new(config.clone()).run()?.cache_hit);

    config.cache.rebuild = false;
    config.cache.enabled = false;
    assert!(!NetworkPipeline::new(config.clone()).run()?.cache_hit);

    assert!(cache::clear(&config.cache.path)?);
    assert!(!cache::clear(&config.cache.path)?);
    Ok(())
}
