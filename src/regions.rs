//! Region partitioning and dominant-region selection.
//!
//! Records arrive as one flat list (the per-region fetches are joined before
//! this runs). They are partitioned into buckets keyed by region id, and the
//! bucket with the most qualifying records wins, subject to a minimum
//! activity threshold.
//!
//! Bucket order is the order in which each region id first appears in the
//! input. Ties on record count go to the earlier bucket, so the decision
//! depends only on counts and that order, never on fetch completion timing.

use std::collections::HashMap;

use log::debug;

use crate::GeoPoint;

/// A validated record: a region id and an optional origin point.
///
/// A record is "qualifying" when it has both.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRecord {
    pub region_id: Option<String>,
    pub origin: Option<GeoPoint>,
}

impl RegionRecord {
    pub fn new(region_id: Option<String>, origin: Option<GeoPoint>) -> Self {
        Self { region_id, origin }
    }

    /// Shorthand for a record with both a region and an origin.
    pub fn qualifying(region_id: impl Into<String>, origin: GeoPoint) -> Self {
        Self {
            region_id: Some(region_id.into()),
            origin: Some(origin),
        }
    }
}

/// All records of one region.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RegionBucket {
    pub region_id: String,
    /// Origin points of qualifying records, in arrival order
    pub points: Vec<GeoPoint>,
    /// Every record of the region, including those without an origin
    pub total_records: usize,
}

impl RegionBucket {
    fn new(region_id: String) -> Self {
        Self {
            region_id,
            points: Vec::new(),
            total_records: 0,
        }
    }

    /// Number of records that carry an origin point.
    pub fn qualifying_count(&self) -> usize {
        self.points.len()
    }

    /// Whether this region is active enough to be selected as dominant.
    pub fn is_eligible(&self, min_records: usize) -> bool {
        self.qualifying_count() >= min_records
    }

    /// The first `max` qualifying points, with repeated point ids collapsed.
    ///
    /// Several orders can share one origin address; the first occurrence of
    /// each address id is kept.
    pub fn representatives(&self, max: usize) -> Vec<GeoPoint> {
        let mut seen: Vec<&str> = Vec::with_capacity(max);
        let mut result = Vec::with_capacity(max);

        for point in self.points.iter().take(max) {
            if seen.contains(&point.id()) {
                continue;
            }
            seen.push(point.id());
            result.push(point.clone());
        }

        result
    }
}

/// Region buckets in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RegionAggregate {
    buckets: Vec<RegionBucket>,
}

impl RegionAggregate {
    /// Buckets in iteration order.
    pub fn buckets(&self) -> &[RegionBucket] {
        &self.buckets
    }

    pub fn get(&self, region_id: &str) -> Option<&RegionBucket> {
        self.buckets.iter().find(|b| b.region_id == region_id)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Select the region with the most qualifying records.
    ///
    /// Regions with fewer than `min_records` qualifying records are skipped.
    /// On equal counts the region encountered first wins. Returns `None` when
    /// no region is eligible.
    pub fn dominant(&self, min_records: usize) -> Option<&RegionBucket> {
        let mut best: Option<&RegionBucket> = None;

        for bucket in &self.buckets {
            if !bucket.is_eligible(min_records) {
                debug!(
                    "[RegionAggregator] Skipping region {} ({} qualifying < {})",
                    bucket.region_id,
                    bucket.qualifying_count(),
                    min_records
                );
                continue;
            }

            match best {
                Some(current) if bucket.qualifying_count() <= current.qualifying_count() => {}
                _ => best = Some(bucket),
            }
        }

        best
    }
}

/// Partition records into region buckets.
///
/// Records without a region id are dropped. Records without an origin count
/// toward the bucket's population but not toward its qualifying points.
pub fn aggregate_regions<'a, I>(records: I) -> RegionAggregate
where
    I: IntoIterator<Item = &'a RegionRecord>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut buckets: Vec<RegionBucket> = Vec::new();
    let mut dropped = 0usize;

    for record in records {
        let Some(region_id) = record.region_id.as_deref() else {
            dropped += 1;
            continue;
        };

        let slot = *index.entry(region_id).or_insert_with(|| {
            buckets.push(RegionBucket::new(region_id.to_string()));
            buckets.len() - 1
        });

        let bucket = &mut buckets[slot];
        bucket.total_records += 1;
        if let Some(origin) = &record.origin {
            bucket.points.push(origin.clone());
        }
    }

    if dropped > 0 {
        debug!("[RegionAggregator] Dropped {} records without a region", dropped);
    }

    RegionAggregate { buckets }
}

/// Partition `records` and return the id of the dominant region, if any.
pub fn dominant_region(records: &[RegionRecord], min_records: usize) -> Option<String> {
    aggregate_regions(records)
        .dominant(min_records)
        .map(|b| b.region_id.clone())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_MIN_REGION_RECORDS;

    fn point(id: &str, lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(id, lat, lng, "").unwrap()
    }

    fn records_for(region: &str, count: usize) -> Vec<RegionRecord> {
        (0..count)
            .map(|i| {
                RegionRecord::qualifying(
                    region,
                    point(&format!("{region}-{i}"), 51.31 + i as f64 * 0.001, 9.48),
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_input() {
        let aggregate = aggregate_regions(&Vec::<RegionRecord>::new());
        assert!(aggregate.is_empty());
        assert_eq!(dominant_region(&[], DEFAULT_MIN_REGION_RECORDS), None);
    }

    #[test]
    fn test_buckets_follow_first_appearance() {
        let records = vec![
            RegionRecord::qualifying("rb", point("1", 51.0, 9.0)),
            RegionRecord::qualifying("ra", point("2", 51.0, 9.0)),
            RegionRecord::qualifying("rb", point("3", 51.0, 9.0)),
            RegionRecord::qualifying("rc", point("4", 51.0, 9.0)),
        ];
        let aggregate = aggregate_regions(&records);
        let ids: Vec<&str> = aggregate.buckets().iter().map(|b| b.region_id.as_str()).collect();
        assert_eq!(ids, vec!["rb", "ra", "rc"]);

        let rb = aggregate.get("rb").unwrap();
        let point_ids: Vec<&str> = rb.points.iter().map(|p| p.id()).collect();
        assert_eq!(point_ids, vec!["1", "3"]);
    }

    #[test]
    fn test_records_without_region_or_origin() {
        let mut records = records_for("ra", 4);
        records.push(RegionRecord::new(Some("ra".to_string()), None));
        records.push(RegionRecord::new(None, Some(point("x", 51.0, 9.0))));

        let aggregate = aggregate_regions(&records);
        assert_eq!(aggregate.len(), 1);

        let ra = aggregate.get("ra").unwrap();
        assert_eq!(ra.total_records, 5);
        assert_eq!(ra.qualifying_count(), 4);
        // Population is 5 but only 4 records carry an origin
        assert!(aggregate.dominant(5).is_none());
    }

    #[test]
    fn test_threshold_enforcement() {
        let four = records_for("ra", 4);
        assert_eq!(dominant_region(&four, 5), None);

        let five = records_for("ra", 5);
        assert_eq!(dominant_region(&five, 5), Some("ra".to_string()));
    }

    #[test]
    fn test_below_threshold_bucket_still_visible() {
        let mut records = records_for("ra", 6);
        records.extend(records_for("rb", 3));

        let aggregate = aggregate_regions(&records);
        assert_eq!(aggregate.get("rb").unwrap().qualifying_count(), 3);
        assert_eq!(aggregate.dominant(5).unwrap().region_id, "ra");
    }

    #[test]
    fn test_largest_region_wins() {
        let mut records = records_for("ra", 5);
        records.extend(records_for("rb", 8));
        records.extend(records_for("rc", 6));
        assert_eq!(dominant_region(&records, 5), Some("rb".to_string()));
    }

    #[test]
    fn test_small_first_region_never_wins() {
        let mut records = records_for("ra", 2);
        records.extend(records_for("rb", 5));
        assert_eq!(dominant_region(&records, 5), Some("rb".to_string()));
    }

    #[test]
    fn test_tie_goes_to_first_encountered() {
        let mut records = records_for("ra", 7);
        records.extend(records_for("rb", 7));
        assert_eq!(dominant_region(&records, 5), Some("ra".to_string()));

        // Interleaving does not matter, only first appearance
        let mut interleaved = Vec::new();
        for (a, b) in records_for("rb", 7).into_iter().zip(records_for("ra", 7)) {
            interleaved.push(a);
            interleaved.push(b);
        }
        assert_eq!(dominant_region(&interleaved, 5), Some("rb".to_string()));
    }

    #[test]
    fn test_all_regions_below_threshold() {
        let mut records = records_for("ra", 4);
        records.extend(records_for("rb", 3));
        records.extend(records_for("rc", 1));
        assert_eq!(dominant_region(&records, 5), None);
    }

    #[test]
    fn test_representatives_are_capped_and_ordered() {
        let records = records_for("ra", 8);
        let aggregate = aggregate_regions(&records);
        let reps = aggregate.get("ra").unwrap().representatives(5);
        let ids: Vec<&str> = reps.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["ra-0", "ra-1", "ra-2", "ra-3", "ra-4"]);
    }

    #[test]
    fn test_representatives_collapse_shared_origins() {
        let shared = point("addr-1", 51.31, 9.48);
        let records = vec![
            RegionRecord::qualifying("ra", shared.clone()),
            RegionRecord::qualifying("ra", point("addr-2", 51.32, 9.48)),
            RegionRecord::qualifying("ra", shared),
            RegionRecord::qualifying("ra", point("addr-3", 51.33, 9.48)),
        ];
        let aggregate = aggregate_regions(&records);
        let reps = aggregate.get("ra").unwrap().representatives(3);
        let ids: Vec<&str> = reps.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["addr-1", "addr-2"]);
    }
}
