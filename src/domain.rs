use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ingest::fields;

/// A listings region (city or country page) with its popular venues
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub country: String,
    #[serde(alias = "region")]
    pub region_key: String,
    #[serde(default, deserialize_with = "fields::optional_count")]
    pub rank: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    #[serde(rename = "id")]
    pub venue_id: String,
    #[serde(rename = "img", default)]
    pub logo_url: Option<String>,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "fields::optional_count")]
    pub rank: Option<u64>,
    #[serde(alias = "region")]
    pub region_key: String,
    #[serde(default, deserialize_with = "fields::optional_count")]
    pub followers: Option<u64>,
    #[serde(default, deserialize_with = "fields::optional_count")]
    pub capacity: Option<u64>,
}

/// One listing on a venue's calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventOverview {
    #[serde(rename = "id")]
    pub event_id: String,
    #[serde(deserialize_with = "fields::calendar_date")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "fields::optional_count")]
    pub attending: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "img", default)]
    pub thumbnail: Option<String>,
    #[serde(rename = "club_id")]
    pub venue_id: String,
}

/// A credited performer; either member may be missing in the source data
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtistCredit {
    pub artist_id: Option<String>,
    pub artist_name: Option<String>,
}

impl ArtistCredit {
    pub fn new(artist_id: &str, artist_name: &str) -> Self {
        Self {
            artist_id: Some(artist_id.to_string()),
            artist_name: Some(artist_name.to_string()),
        }
    }
}

/// Full event page, only scraped for a subset of listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetail {
    #[serde(rename = "id")]
    pub event_id: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub cost: Option<String>,
    #[serde(rename = "age", default)]
    pub minimum_age: Option<String>,
    #[serde(default)]
    pub promoters: Option<String>,
    #[serde(default)]
    pub flyers: Option<String>,
    #[serde(default, deserialize_with = "fields::artist_list")]
    pub artists: Vec<ArtistCredit>,
    #[serde(rename = "pick", default, deserialize_with = "fields::flag")]
    pub featured: bool,
    #[serde(default, deserialize_with = "fields::optional_count")]
    pub attending: Option<u64>,
}

/// One (event, artist) pair flattened out of an event's lineup
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtistAppearance {
    pub event_id: String,
    pub artist_id: Option<String>,
    pub artist_name: Option<String>,
}

/// Everything the scraper deposited for one run
#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    pub regions: Vec<Region>,
    pub venues: Vec<Venue>,
    pub events: Vec<EventOverview>,
    pub details: Vec<EventDetail>,
}
