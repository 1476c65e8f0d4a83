// Data processing pipeline: source tables in, one network document per year out

pub mod processing;
pub mod storage;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, info_span, instrument, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::constants;
use crate::error::{NetworkError, Result};
use crate::ingest::{load_source_tables, SourceFiles};
use processing::aggregate::{aggregate_by_year_and_venue, Aggregation};
use processing::analysis::{compare_regions, log_comparisons, RegionComparison};
use processing::community::Louvain;
use processing::graph::VenueGraph;
use processing::identity::artist_id_exceptions;
use processing::join::{build_fact_table, FactTable};
use processing::normalize::normalize_artists;
use processing::serialize::{network_document, NetworkDocument};
use processing::similarity::venue_similarities;

/// What was produced for one year
#[derive(Debug, Clone, Serialize)]
pub struct YearOutcome {
    pub year: i32,
    pub venues: usize,
    pub links: usize,
    pub communities: usize,
    pub output: PathBuf,
}

/// Result of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub fact_rows: usize,
    pub cache_hit: bool,
    pub artist_exceptions: usize,
    pub years: Vec<YearOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearAnalysis {
    pub year: i32,
    pub comparisons: Vec<RegionComparison>,
}

pub struct NetworkPipeline {
    config: Config,
}

impl NetworkPipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Load the source tables and join them, or reuse the cached join.
    /// The flag is true when the cache was used.
    #[instrument(skip(self), fields(data_dir = %self.config.input.data_dir.display()))]
    pub fn fact_table(&self) -> Result<(FactTable, bool)> {
        let files = SourceFiles::discover(&self.config.input.data_dir, &self.config.input.detail_files)?;
        let cache = &self.config.cache;

        let fingerprint = if cache.enabled {
            Some(files.fingerprint()?)
        } else {
            None
        };

        if let Some(fp) = fingerprint.as_deref() {
            if cache.rebuild {
                info!("Cache rebuild requested, ignoring {}", cache.path.display());
            } else if let Some(table) = storage::cache::load(&cache.path, fp) {
                info!("Loaded {} fact rows from cache {}", table.len(), cache.path.display());
                return Ok((table, true));
            }
        }

        let tables = load_source_tables(&files)?;
        let appearances = normalize_artists(&tables.details);
        let table = build_fact_table(&tables, &appearances);

        if let Some(fp) = fingerprint.as_deref() {
            storage::cache::store(&cache.path, fp, &table);
        }
        Ok((table, false))
    }

    fn aggregate(&self, table: &FactTable) -> Result<Aggregation> {
        let aggregation = aggregate_by_year_and_venue(table, self.config.aggregate.strict_venue_attributes)?;
        if !aggregation.conflicts.is_empty() {
            warn!(
                "{} venue attribute conflicts; first values were kept",
                aggregation.conflicts.len()
            );
        }
        Ok(aggregation)
    }

    /// Similarity, graph and partition for one year; nothing touches the disk.
    #[instrument(skip(self, aggregation, artist_names_to_ids))]
    pub fn build_year(
        &self,
        year: i32,
        aggregation: &Aggregation,
        artist_names_to_ids: &BTreeMap<String, String>,
    ) -> Result<(NetworkDocument, usize)> {
        let venues = aggregation.for_year(year);
        let edges = venue_similarities(&venues, self.config.similarity.edge_policy());

        let mut graph = VenueGraph::build(year, &venues, &edges)?;
        let detector = Louvain::new(self.config.community.seed)
            .with_resolution(self.config.community.resolution);
        let communities = graph.assign_communities(&detector)?;

        let document = network_document(&graph, artist_names_to_ids)?;
        Ok((document, communities))
    }

    /// Run every stage and write `network-<year>.json` for each year present.
    pub fn run(&self) -> Result<PipelineResult> {
        let run_id = Uuid::new_v4();
        let span = info_span!("pipeline_run", %run_id);
        let _enter = span.enter();
        let started = Instant::now();

        let (table, cache_hit) = self.fact_table()?;
        let aggregation = self.aggregate(&table)?;
        let exceptions = artist_id_exceptions(&table);

        let mut years = Vec::new();
        for year in aggregation.years() {
            let year_started = Instant::now();
            let (document, communities) = self.build_year(year, &aggregation, &exceptions)?;
            let output = write_document(&self.config.output.dir, year, &document, self.config.output.pretty)?;

            if self.config.analysis.enabled {
                let comparisons = compare_regions(&aggregation.for_year(year), self.config.analysis.significance);
                log_comparisons(year, &comparisons);
            }

            info!(
                year,
                venues = document.nodes.len(),
                links = document.links.len(),
                communities,
                "Wrote {}",
                output.display()
            );
            metrics::counter!("club_network_documents_written_total").increment(1);
            metrics::histogram!("club_network_year_duration_seconds")
                .record(year_started.elapsed().as_secs_f64());

            years.push(YearOutcome {
                year,
                venues: document.nodes.len(),
                links: document.links.len(),
                communities,
                output,
            });
        }

        let total_secs = started.elapsed().as_secs_f64();
        metrics::histogram!("club_network_pipeline_duration_seconds").record(total_secs);
        info!(
            "Pipeline finished in {:.2}s: {} years from {} fact rows",
            total_secs,
            years.len(),
            table.len()
        );

        Ok(PipelineResult {
            run_id,
            fact_rows: table.len(),
            cache_hit,
            artist_exceptions: exceptions.len(),
            years,
        })
    }

    /// Residency comparison for every year, without building any graphs
    pub fn analyze(&self) -> Result<Vec<YearAnalysis>> {
        let (table, _) = self.fact_table()?;
        let aggregation = self.aggregate(&table)?;
        Ok(aggregation
            .years()
            .into_iter()
            .map(|year| YearAnalysis {
                year,
                comparisons: compare_regions(&aggregation.for_year(year), self.config.analysis.significance),
            })
            .collect())
    }
}

/// Serialize and atomically write one year's document; returns its path.
pub fn write_document(dir: &Path, year: i32, document: &NetworkDocument, pretty: bool) -> Result<PathBuf> {
    let path = dir.join(constants::network_file_name(year));
    let json = document.to_json(pretty)?;
    storage::write_atomic(&path, json.as_bytes())?;
    Ok(path)
}

pub fn read_document(path: &Path) -> Result<NetworkDocument> {
    let content = fs::read_to_string(path).map_err(|e| NetworkError::io(path, e))?;
    let document: NetworkDocument = serde_json::from_str(&content)?;
    Ok(document)
}
