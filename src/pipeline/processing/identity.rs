use std::collections::BTreeMap;
use tracing::debug;

use crate::pipeline::processing::join::FactTable;

/// The id the listings site would derive from a display name: lowercase, spaces removed.
pub fn artist_slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "")
}

/// Artists whose id can't be derived from their name, as name → id.
///
/// Distinct (id, name) pairs are taken across the whole table in row order; if
/// one name carries several ids the last one wins. Pairs without an id are skipped.
pub fn artist_id_exceptions(table: &FactTable) -> BTreeMap<String, String> {
    let mut ids_by_name: BTreeMap<&str, Option<&str>> = BTreeMap::new();
    for row in &table.rows {
        if let Some(name) = row.artist_name.as_deref() {
            ids_by_name.insert(name, row.artist_id.as_deref());
        }
    }

    let exceptions: BTreeMap<String, String> = ids_by_name
        .into_iter()
        .filter_map(|(name, id)| {
            let id = id?;
            (id != artist_slug(name)).then(|| (name.to_string(), id.to_string()))
        })
        .collect();

    debug!("{} artists have ids that differ from their name slug", exceptions.len());
    exceptions
}
