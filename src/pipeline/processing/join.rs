//! Relational joins that turn the scraper's per-entity tables into one fact table.
//!
//! Row order follows the region file, then each region's venues in file order,
//! then each venue's listings in file order, then each lineup in credit order,
//! so the same inputs always produce the same table.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info, instrument};

use crate::domain::{ArtistAppearance, EventDetail, EventOverview, Region, SourceTables, Venue};

/// One (event, artist) row annotated with venue and region attributes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactRow {
    pub region_name: String,
    pub country: String,
    pub region_key: String,
    pub region_rank: Option<u64>,
    pub venue_id: String,
    pub venue_name: String,
    pub address: Option<String>,
    pub logo_url: Option<String>,
    pub venue_rank: Option<u64>,
    pub followers: Option<u64>,
    pub capacity: Option<u64>,
    pub event_id: String,
    pub date: NaiveDate,
    pub event_name: Option<String>,
    pub attending: Option<u64>,
    pub thumbnail: Option<String>,
    pub cost: Option<String>,
    pub minimum_age: Option<String>,
    pub featured: bool,
    pub detail_attending: Option<u64>,
    pub artist_id: Option<String>,
    pub artist_name: Option<String>,
}

impl FactRow {
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactTable {
    pub rows: Vec<FactRow>,
}

impl FactTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn years(&self) -> BTreeSet<i32> {
        self.rows.iter().map(FactRow::year).collect()
    }
}

/// Region ⟕ Venue
#[derive(Debug, Clone, Copy)]
pub struct VenueListing<'a> {
    pub region: &'a Region,
    pub venue: Option<&'a Venue>,
}

/// (Region ⟕ Venue) ⟕ EventOverview
#[derive(Debug, Clone, Copy)]
pub struct EventListing<'a> {
    pub region: &'a Region,
    pub venue: Option<&'a Venue>,
    pub event: Option<&'a EventOverview>,
}

/// Listing with a detail record; venue and event are always present here
#[derive(Debug, Clone, Copy)]
pub struct DetailedEvent<'a> {
    pub region: &'a Region,
    pub venue: &'a Venue,
    pub event: &'a EventOverview,
    pub detail: &'a EventDetail,
}

fn index_by<'a, T, F>(items: &'a [T], key: F) -> HashMap<&'a str, Vec<&'a T>>
where
    F: Fn(&'a T) -> &'a str,
{
    let mut index: HashMap<&str, Vec<&T>> = HashMap::new();
    for item in items {
        index.entry(key(item)).or_default().push(item);
    }
    index
}

/// Left join: a region without venues still yields one row with no venue.
pub fn join_regions_venues<'a>(regions: &'a [Region], venues: &'a [Venue]) -> Vec<VenueListing<'a>> {
    let by_region = index_by(venues, |v| v.region_key.as_str());
    let mut out = Vec::new();
    for region in regions {
        match by_region.get(region.region_key.as_str()) {
            Some(matches) => out.extend(matches.iter().map(|venue| VenueListing {
                region,
                venue: Some(*venue),
            })),
            None => out.push(VenueListing {
                region,
                venue: None,
            }),
        }
    }
    out
}

/// Left join on venue id: venues without listings keep a row with no event.
pub fn join_event_overviews<'a>(
    listings: &[VenueListing<'a>],
    events: &'a [EventOverview],
) -> Vec<EventListing<'a>> {
    let by_venue = index_by(events, |e| e.venue_id.as_str());
    let mut out = Vec::new();
    for listing in listings {
        let matches = listing
            .venue
            .and_then(|venue| by_venue.get(venue.venue_id.as_str()));
        match matches {
            Some(events) => out.extend(events.iter().map(|event| EventListing {
                region: listing.region,
                venue: listing.venue,
                event: Some(*event),
            })),
            None => out.push(EventListing {
                region: listing.region,
                venue: listing.venue,
                event: None,
            }),
        }
    }
    out
}

/// Inner join: only listings with a detail record survive.
pub fn join_event_details<'a>(
    listings: &[EventListing<'a>],
    details: &'a [EventDetail],
) -> Vec<DetailedEvent<'a>> {
    let by_event: HashMap<&str, &EventDetail> =
        details.iter().map(|d| (d.event_id.as_str(), d)).collect();
    listings
        .iter()
        .filter_map(|listing| {
            let (venue, event) = (listing.venue?, listing.event?);
            let detail = *by_event.get(event.event_id.as_str())?;
            Some(DetailedEvent {
                region: listing.region,
                venue,
                event,
                detail,
            })
        })
        .collect()
}

/// Inner join: one fact row per credited artist; events without a lineup vanish.
pub fn join_artists(events: &[DetailedEvent<'_>], appearances: &[ArtistAppearance]) -> Vec<FactRow> {
    let by_event = index_by(appearances, |a| a.event_id.as_str());
    let mut rows = Vec::new();
    for e in events {
        let Some(lineup) = by_event.get(e.event.event_id.as_str()) else {
            continue;
        };
        for appearance in lineup {
            rows.push(FactRow {
                region_name: e.region.name.clone(),
                country: e.region.country.clone(),
                region_key: e.region.region_key.clone(),
                region_rank: e.region.rank,
                venue_id: e.venue.venue_id.clone(),
                venue_name: e.venue.name.clone(),
                address: e.venue.address.clone(),
                logo_url: e.venue.logo_url.clone(),
                venue_rank: e.venue.rank,
                followers: e.venue.followers,
                capacity: e.venue.capacity,
                event_id: e.event.event_id.clone(),
                date: e.event.date,
                event_name: e.event.name.clone(),
                attending: e.event.attending,
                thumbnail: e.event.thumbnail.clone(),
                cost: e.detail.cost.clone(),
                minimum_age: e.detail.minimum_age.clone(),
                featured: e.detail.featured,
                detail_attending: e.detail.attending,
                artist_id: appearance.artist_id.clone(),
                artist_name: appearance.artist_name.clone(),
            });
        }
    }
    rows
}

/// Drop exact duplicates, keeping the first occurrence.
pub fn dedupe(rows: Vec<FactRow>) -> Vec<FactRow> {
    let mut seen: HashSet<FactRow> = HashSet::with_capacity(rows.len());
    let mut unique = Vec::with_capacity(rows.len());
    for row in rows {
        if !seen.contains(&row) {
            seen.insert(row.clone());
            unique.push(row);
        }
    }
    unique
}

#[instrument(skip_all)]
pub fn build_fact_table(tables: &SourceTables, appearances: &[ArtistAppearance]) -> FactTable {
    let venue_listings = join_regions_venues(&tables.regions, &tables.venues);
    let event_listings = join_event_overviews(&venue_listings, &tables.events);
    let detailed = join_event_details(&event_listings, &tables.details);
    let joined = join_artists(&detailed, appearances);
    let joined_len = joined.len();
    let rows = dedupe(joined);

    debug!(
        venue_listings = venue_listings.len(),
        event_listings = event_listings.len(),
        detailed_events = detailed.len(),
        "Join stages complete"
    );
    info!(
        "Built fact table with {} rows ({} duplicates dropped)",
        rows.len(),
        joined_len - rows.len()
    );
    metrics::gauge!("club_network_fact_rows").set(rows.len() as f64);

    FactTable { rows }
}
