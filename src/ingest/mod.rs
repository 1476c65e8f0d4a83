//! Loads the scraper's tabular output into typed relations.

pub mod artists;
pub mod fields;

use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::constants;
use crate::domain::{EventDetail, EventOverview, Region, SourceTables, Venue};
use crate::error::{NetworkError, Result};

/// Where the scraper left its files
#[derive(Debug, Clone)]
pub struct SourceFiles {
    pub regions: PathBuf,
    pub venues: PathBuf,
    pub events: PathBuf,
    pub details: Vec<PathBuf>,
}

impl SourceFiles {
    /// Resolve the standard file layout under `data_dir`. With no explicit detail
    /// files every `date-details-*.csv` is picked up in file-name order.
    pub fn discover(data_dir: &Path, detail_files: &[String]) -> Result<Self> {
        let details = if detail_files.is_empty() {
            let entries =
                fs::read_dir(data_dir).map_err(|e| NetworkError::io(data_dir, e))?;
            let mut found = Vec::new();
            for entry in entries {
                let entry = entry.map_err(|e| NetworkError::io(data_dir, e))?;
                let name = entry.file_name().to_string_lossy().to_string();
                if name.starts_with(constants::DETAILS_PREFIX) && name.ends_with(constants::CSV_SUFFIX)
                {
                    found.push(entry.path());
                }
            }
            found.sort();
            found
        } else {
            detail_files.iter().map(|f| data_dir.join(f)).collect()
        };

        if details.is_empty() {
            return Err(NetworkError::Config(format!(
                "no {}*{} files found in {}",
                constants::DETAILS_PREFIX,
                constants::CSV_SUFFIX,
                data_dir.display()
            )));
        }

        Ok(Self {
            regions: data_dir.join(constants::REGIONS_FILE),
            venues: data_dir.join(constants::VENUES_FILE),
            events: data_dir.join(constants::EVENTS_FILE),
            details,
        })
    }

    fn all(&self) -> impl Iterator<Item = &PathBuf> {
        [&self.regions, &self.venues, &self.events]
            .into_iter()
            .chain(self.details.iter())
    }

    /// SHA-256 over every source file's name and bytes, in a fixed order
    pub fn fingerprint(&self) -> Result<String> {
        let mut hasher = Sha256::new();
        for path in self.all() {
            let bytes = fs::read(path).map_err(|e| NetworkError::io(path, e))?;
            if let Some(name) = path.file_name() {
                hasher.update(name.to_string_lossy().as_bytes());
            }
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(&bytes);
        }
        Ok(hex::encode(hasher.finalize()))
    }
}

/// Read one CSV file into typed rows. Any row that fails to decode aborts the
/// whole file with the offending line.
pub fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)
        .map_err(|e| NetworkError::csv(path, e))?;

    let mut rows = Vec::new();
    for record in reader.deserialize::<T>() {
        rows.push(record.map_err(|e| row_error(path, e))?);
    }
    debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn row_error(path: &Path, err: csv::Error) -> NetworkError {
    match err.position() {
        Some(pos) => NetworkError::MalformedRow {
            file: path.display().to_string(),
            line: pos.line(),
            message: err.to_string(),
        },
        None => NetworkError::csv(path, err),
    }
}

fn ensure_unique<'a, I>(table: &str, keys: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            return Err(NetworkError::DuplicateKey {
                table: table.to_string(),
                key: key.to_string(),
            });
        }
    }
    Ok(())
}

#[instrument(skip_all)]
pub fn load_source_tables(files: &SourceFiles) -> Result<SourceTables> {
    let regions: Vec<Region> = read_table(&files.regions)?;
    let venues: Vec<Venue> = read_table(&files.venues)?;
    ensure_unique(constants::VENUES_FILE, venues.iter().map(|v| v.venue_id.as_str()))?;

    let events: Vec<EventOverview> = read_table(&files.events)?;
    ensure_unique(constants::EVENTS_FILE, events.iter().map(|e| e.event_id.as_str()))?;

    let mut details: Vec<EventDetail> = Vec::new();
    for path in &files.details {
        let mut batch: Vec<EventDetail> = read_table(path)?;
        info!("Loaded {} event details from {}", batch.len(), path.display());
        details.append(&mut batch);
    }
    ensure_unique("date-details", details.iter().map(|d| d.event_id.as_str()))?;

    info!(
        regions = regions.len(),
        venues = venues.len(),
        events = events.len(),
        details = details.len(),
        "Loaded source tables"
    );
    metrics::gauge!("club_network_source_rows", "table" => "events").set(events.len() as f64);
    metrics::gauge!("club_network_source_rows", "table" => "details").set(details.len() as f64);

    Ok(SourceTables {
        regions,
        venues,
        events,
        details,
    })
}
