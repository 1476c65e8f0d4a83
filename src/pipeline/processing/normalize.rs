use tracing::debug;

use crate::domain::{ArtistAppearance, EventDetail};

/// Flatten every detail record's lineup into one row per (event, artist).
///
/// An event contributes exactly as many rows as it has credits, so an empty
/// lineup contributes none and the event later falls out of the join.
pub fn normalize_artists(details: &[EventDetail]) -> Vec<ArtistAppearance> {
    let mut appearances = Vec::with_capacity(details.iter().map(|d| d.artists.len()).sum());
    let mut without_lineup = 0usize;

    for detail in details {
        if detail.artists.is_empty() {
            without_lineup += 1;
        }
        for credit in &detail.artists {
            appearances.push(ArtistAppearance {
                event_id: detail.event_id.clone(),
                artist_id: credit.artist_id.clone(),
                artist_name: credit.artist_name.clone(),
            });
        }
    }

    debug!(
        "Normalized {} artist appearances from {} events ({} without lineup)",
        appearances.len(),
        details.len(),
        without_lineup
    );
    metrics::counter!("club_network_artist_appearances_total").increment(appearances.len() as u64);

    appearances
}
