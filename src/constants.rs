/// File names written by the scraper into the data directory
pub const REGIONS_FILE: &str = "top-regions.csv";
pub const VENUES_FILE: &str = "top-clubs.csv";
pub const EVENTS_FILE: &str = "top-clubs-dates.csv";

// Detail files are split per year: date-details-2019.csv, date-details-2020.csv, ...
pub const DETAILS_PREFIX: &str = "date-details-";
pub const CSV_SUFFIX: &str = ".csv";

pub const NETWORK_PREFIX: &str = "network-";

/// Bumped whenever the cached fact-table layout changes
pub const CACHE_FORMAT_VERSION: u32 = 1;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_OUTPUT_DIR: &str = "public";
pub const DEFAULT_CACHE_FILE: &str = "data/all-data.json";
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

// Environment overrides
pub const ENV_DATA_DIR: &str = "CLUB_NETWORK_DATA_DIR";
pub const ENV_OUTPUT_DIR: &str = "CLUB_NETWORK_OUTPUT_DIR";
pub const ENV_SEED: &str = "CLUB_NETWORK_SEED";

/// Output file name for one year's network document
pub fn network_file_name(year: i32) -> String {
    format!("{}{}.json", NETWORK_PREFIX, year)
}
