//! Residency statistics: does a region book the same artists more often than the rest?

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::info;

use crate::pipeline::processing::aggregate::VenueYearSummary;

/// Appearances per distinct artist; 0 when a venue has no named artists.
pub fn residency_factor(summary: &VenueYearSummary) -> f64 {
    if summary.number_of_unique_artists == 0 {
        return 0.0;
    }
    summary.total_number_of_artists as f64 / summary.number_of_unique_artists as f64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionComparison {
    pub region: String,
    pub sample_size: usize,
    pub statistic: f64,
    pub p_value: f64,
    /// p_value <= significance: the region's residency factors likely come from a different distribution
    pub distinct: bool,
}

/// Two-sample Kolmogorov–Smirnov test; returns (D, p-value).
///
/// The p-value uses the asymptotic Kolmogorov distribution with the usual
/// small-sample correction of the effective size.
pub fn ks_two_sample(a: &[f64], b: &[f64]) -> (f64, f64) {
    if a.is_empty() || b.is_empty() {
        return (0.0, 1.0);
    }
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);

    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0usize, 0usize);
    let mut d: f64 = 0.0;
    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / n1 - j as f64 / n2).abs());
    }

    let en = (n1 * n2 / (n1 + n2)).sqrt();
    let lambda = (en + 0.12 + 0.11 / en) * d;
    (d, kolmogorov_q(lambda))
}

/// Q_KS(λ) = 2 Σ (−1)^(k−1) exp(−2 k² λ²)
fn kolmogorov_q(lambda: f64) -> f64 {
    if lambda < 1e-3 {
        return 1.0;
    }
    let mut sum = 0.0;
    let mut sign = 1.0;
    let mut previous = 0.0;
    for k in 1..=100 {
        let k = k as f64;
        let term = sign * 2.0 * (-2.0 * k * k * lambda * lambda).exp();
        sum += term;
        if term.abs() <= 1e-10 * previous || term.abs() <= 1e-12 * sum.abs() {
            return sum.clamp(0.0, 1.0);
        }
        sign = -sign;
        previous = term.abs();
    }
    // series failed to converge, only happens for tiny λ
    1.0
}

/// Compare each region's residency factors against every other region's.
pub fn compare_regions(venues: &[&VenueYearSummary], significance: f64) -> Vec<RegionComparison> {
    let regions: BTreeSet<&str> = venues.iter().map(|v| v.region.as_str()).collect();
    regions
        .into_iter()
        .map(|region| {
            let (inside, outside): (Vec<&&VenueYearSummary>, Vec<&&VenueYearSummary>) =
                venues.iter().partition(|v| v.region == region);
            let inside: Vec<f64> = inside.into_iter().map(|v| residency_factor(v)).collect();
            let outside: Vec<f64> = outside.into_iter().map(|v| residency_factor(v)).collect();
            let (statistic, p_value) = ks_two_sample(&inside, &outside);
            RegionComparison {
                region: region.to_string(),
                sample_size: inside.len(),
                statistic,
                p_value,
                distinct: !outside.is_empty() && p_value <= significance,
            }
        })
        .collect()
}

pub fn log_comparisons(year: i32, comparisons: &[RegionComparison]) {
    for c in comparisons {
        if c.distinct {
            info!(
                year,
                region = %c.region,
                p_value = c.p_value,
                "{} residency is likely not from the same distribution",
                c.region
            );
        } else {
            info!(year, region = %c.region, p_value = c.p_value, "{} residency in line with other regions", c.region);
        }
    }
}
