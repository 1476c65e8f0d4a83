use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{info, instrument, warn};

use crate::error::{NetworkError, Result};
use crate::pipeline::processing::join::{FactRow, FactTable};
use crate::pipeline::processing::multiset::Multiset;

/// One venue's activity within one calendar year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VenueYearSummary {
    pub year: i32,
    pub venue_name: String,
    pub club_id: String,
    pub region: String,
    pub country: String,
    pub logo: String,
    pub number_of_dates: usize,
    pub rank: Option<u64>,
    pub number_of_unique_artists: usize,
    pub total_number_of_artists: usize,
    pub artists: Multiset<String>,
    pub followers: Option<u64>,
    pub capacity: Option<u64>,
    pub attending: u64,
}

/// Two rows of the same venue-year that disagree on a per-venue attribute
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeConflict {
    pub year: i32,
    pub venue: String,
    pub field: &'static str,
    pub first: String,
    pub other: String,
}

impl From<AttributeConflict> for NetworkError {
    fn from(c: AttributeConflict) -> Self {
        NetworkError::InconsistentVenue {
            year: c.year,
            venue: c.venue,
            field: c.field,
            first: c.first,
            other: c.other,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Sorted by (year, venue_name)
    pub summaries: Vec<VenueYearSummary>,
    pub conflicts: Vec<AttributeConflict>,
}

impl Aggregation {
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.summaries.iter().map(|s| s.year).collect();
        years.dedup();
        years
    }

    pub fn for_year(&self, year: i32) -> Vec<&VenueYearSummary> {
        self.summaries.iter().filter(|s| s.year == year).collect()
    }
}

fn venue_attributes(row: &FactRow) -> [(&'static str, String); 7] {
    [
        ("club_id", row.venue_id.clone()),
        ("region", row.region_name.clone()),
        ("country", row.country.clone()),
        ("logo", row.logo_url.clone().unwrap_or_default()),
        ("rank", format!("{:?}", row.venue_rank)),
        ("followers", format!("{:?}", row.followers)),
        ("capacity", format!("{:?}", row.capacity)),
    ]
}

/// Group the fact table by (year, venue name).
///
/// Per-venue attributes are taken from the first row of each group after
/// checking that the remaining rows agree. With `strict` a disagreement is an
/// error, otherwise it is logged and reported in [`Aggregation::conflicts`].
#[instrument(skip_all, fields(rows = table.len()))]
pub fn aggregate_by_year_and_venue(table: &FactTable, strict: bool) -> Result<Aggregation> {
    let mut groups: BTreeMap<(i32, &str), Vec<&FactRow>> = BTreeMap::new();
    for row in &table.rows {
        groups
            .entry((row.year(), row.venue_name.as_str()))
            .or_default()
            .push(row);
    }

    let mut summaries = Vec::with_capacity(groups.len());
    let mut conflicts = Vec::new();

    for ((year, venue_name), rows) in groups {
        let first = rows[0];
        let expected = venue_attributes(first);
        let mut reported: HashSet<&'static str> = HashSet::new();
        for row in &rows[1..] {
            for ((field, want), (_, got)) in expected.iter().cloned().zip(venue_attributes(row)) {
                if want != got && reported.insert(field) {
                    let conflict = AttributeConflict {
                        year,
                        venue: venue_name.to_string(),
                        field,
                        first: want,
                        other: got,
                    };
                    if strict {
                        return Err(conflict.into());
                    }
                    warn!(
                        "Venue '{}' ({}) rows disagree on {}: '{}' vs '{}'",
                        conflict.venue, year, field, conflict.first, conflict.other
                    );
                    metrics::counter!("club_network_venue_attribute_conflicts_total").increment(1);
                    conflicts.push(conflict);
                }
            }
        }

        let mut seen_events: HashSet<&str> = HashSet::new();
        let mut attending = 0u64;
        for row in &rows {
            if seen_events.insert(row.event_id.as_str()) {
                attending += row.attending.unwrap_or(0);
            }
        }

        let artists = Multiset::count_present(rows.iter().map(|r| r.artist_name.clone()));

        summaries.push(VenueYearSummary {
            year,
            venue_name: venue_name.to_string(),
            club_id: first.venue_id.clone(),
            region: first.region_name.clone(),
            country: first.country.clone(),
            logo: first.logo_url.clone().unwrap_or_default(),
            number_of_dates: seen_events.len(),
            rank: first.venue_rank,
            number_of_unique_artists: artists.distinct(),
            total_number_of_artists: artists.total() as usize,
            artists,
            followers: first.followers,
            capacity: first.capacity,
            attending,
        });
    }

    info!("Aggregated {} venue-year summaries", summaries.len());
    metrics::gauge!("club_network_venue_years").set(summaries.len() as f64);

    Ok(Aggregation {
        summaries,
        conflicts,
    })
}
