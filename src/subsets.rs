//! Exhaustive hotspot subset search.
//!
//! Every non-empty subset of the representative points is checked for
//! cohesion: a subset is valid when each member lies within the radius of
//! the subset's own centroid. Valid subsets nested inside a larger valid
//! subset are discarded, leaving only maximal groupings.
//!
//! The search is exact rather than heuristic. Representative points are
//! capped upstream (5 by default, i.e. at most 31 subsets), and
//! [`MAX_EXHAUSTIVE_POINTS`] is a hard ceiling on the input size.

use std::time::Instant;

use log::{debug, warn};

use crate::geo_utils::{compute_centroid, distance_to_centroid_km};
use crate::{Centroid, GeoPoint, HotspotCluster};

/// Largest input the exhaustive search accepts (2^16 - 1 subsets).
pub const MAX_EXHAUSTIVE_POINTS: usize = 16;

/// A valid subset, identified by its membership bitmask.
struct Candidate {
    mask: u32,
    members: Vec<GeoPoint>,
    centroid: Centroid,
}

#[inline]
fn is_strict_subset(inner: u32, outer: u32) -> bool {
    inner != outer && inner & outer == inner
}

fn subset_members(points: &[GeoPoint], mask: u32) -> Vec<GeoPoint> {
    points
        .iter()
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0)
        .map(|(_, p)| p.clone())
        .collect()
}

/// Build the candidate for `mask` if every member is within `radius_km`
/// of the subset centroid.
fn evaluate_subset(points: &[GeoPoint], mask: u32, radius_km: f64) -> Option<Candidate> {
    let members = subset_members(points, mask);
    let centroid = compute_centroid(&members).ok()?;

    let cohesive = members
        .iter()
        .all(|p| distance_to_centroid_km(p, &centroid) <= radius_km);

    cohesive.then_some(Candidate {
        mask,
        members,
        centroid,
    })
}

/// Find the maximal cohesive clusters among `points`.
///
/// Returns clusters ordered by descending member count, then ascending
/// centroid latitude. Remaining ties keep subset enumeration order, so the
/// result is fully deterministic. Empty input yields an empty result.
///
/// `radius_km` must be positive. Coordinates are already validated by
/// [`GeoPoint::new`], so this never fails.
///
/// # Example
/// ```
/// use hotspot_finder::{GeoPoint, find_hotspots};
///
/// let near = vec![
///     GeoPoint::new("a", 51.3127, 9.4797, "").unwrap(),
///     GeoPoint::new("b", 51.3140, 9.4810, "").unwrap(),
///     // ~10 km north
///     GeoPoint::new("c", 51.4027, 9.4797, "").unwrap(),
/// ];
///
/// let hotspots = find_hotspots(&near, 2.0);
/// assert_eq!(hotspots.len(), 2);
/// assert_eq!(hotspots[0].len(), 2);
/// assert!(hotspots[1].contains("c"));
/// ```
pub fn find_hotspots(points: &[GeoPoint], radius_km: f64) -> Vec<HotspotCluster> {
    debug_assert!(radius_km > 0.0, "radius_km must be positive");

    if points.is_empty() {
        return Vec::new();
    }

    let points = if points.len() > MAX_EXHAUSTIVE_POINTS {
        warn!(
            "[HotspotFinder] {} points exceed the exhaustive limit, using the first {}",
            points.len(),
            MAX_EXHAUSTIVE_POINTS
        );
        &points[..MAX_EXHAUSTIVE_POINTS]
    } else {
        points
    };

    let start = Instant::now();
    let subset_count = (1u32 << points.len()) - 1;

    let mut valid: Vec<Candidate> = (1..=subset_count)
        .filter_map(|mask| evaluate_subset(points, mask, radius_km))
        .collect();
    let valid_count = valid.len();

    // Larger subsets first: anything nested in a valid subset is nested in
    // a maximal one that has already been kept.
    valid.sort_by_key(|c| std::cmp::Reverse(c.mask.count_ones()));

    let mut maximal: Vec<Candidate> = Vec::new();
    for candidate in valid {
        let nested = maximal
            .iter()
            .any(|kept| is_strict_subset(candidate.mask, kept.mask));
        if !nested {
            maximal.push(candidate);
        }
    }

    maximal.sort_by(|a, b| {
        b.members
            .len()
            .cmp(&a.members.len())
            .then_with(|| a.centroid.latitude.total_cmp(&b.centroid.latitude))
            .then_with(|| a.mask.cmp(&b.mask))
    });

    debug!(
        "[HotspotFinder] {} points: {} subsets, {} valid, {} maximal in {:?}",
        points.len(),
        subset_count,
        valid_count,
        maximal.len(),
        start.elapsed()
    );

    maximal
        .into_iter()
        .map(|c| HotspotCluster {
            points: c.members,
            centroid: c.centroid,
            radius_km,
        })
        .collect()
}

/// Run [`find_hotspots`] over several independent point sets.
pub fn find_hotspots_batch(point_sets: &[Vec<GeoPoint>], radius_km: f64) -> Vec<Vec<HotspotCluster>> {
    point_sets
        .iter()
        .map(|points| find_hotspots(points, radius_km))
        .collect()
}

/// Parallel version of [`find_hotspots_batch`] using rayon.
///
/// Output order matches input order.
#[cfg(feature = "parallel")]
pub fn find_hotspots_batch_parallel(
    point_sets: &[Vec<GeoPoint>],
    radius_km: f64,
) -> Vec<Vec<HotspotCluster>> {
    use rayon::prelude::*;

    point_sets
        .par_iter()
        .map(|points| find_hotspots(points, radius_km))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
