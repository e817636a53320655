//! Record sources and the end-to-end hotspot pipeline.
//!
//! A [`RecordSource`] returns the orders (or events) of one region. The
//! pipeline fetches every requested region concurrently, waits for all of
//! them, validates origins once at this boundary, and then runs region
//! aggregation and the hotspot search.

use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Instant;

use async_trait::async_trait;
use futures::future::try_join_all;
use log::{debug, info, warn};
use regex::Regex;

use crate::error::{HotspotError, Result};
use crate::regions::{aggregate_regions, RegionRecord};
use crate::subsets::find_hotspots;
use crate::{GeoPoint, HotspotCluster, HotspotConfig};

// Region ids are cuid2 tokens: lowercase alphanumerics starting with a letter
static REGION_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9]{1,31}$").expect("valid region id pattern"));

// ============================================================================
// Records
// ============================================================================

/// Unvalidated origin address as delivered by a record source.
///
/// Coordinates stored as SQL decimals usually arrive as strings; with the
/// `serde` feature both numbers and numeric strings are accepted. Strings
/// that do not parse become NaN and are rejected at ingestion.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawOrigin {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(deserialize_with = "deserialize_coordinate"))]
    pub latitude: f64,
    #[cfg_attr(feature = "serde", serde(deserialize_with = "deserialize_coordinate"))]
    pub longitude: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub streetname: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub zipcode: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub country: String,
}

impl RawOrigin {
    /// Address label in the form "street zipcode country".
    pub fn address_label(&self) -> String {
        format!("{} {} {}", self.streetname, self.zipcode, self.country)
            .trim()
            .to_string()
    }
}

impl TryFrom<&RawOrigin> for GeoPoint {
    type Error = HotspotError;

    fn try_from(origin: &RawOrigin) -> Result<Self> {
        GeoPoint::new(
            origin.id.clone(),
            origin.latitude,
            origin.longitude,
            origin.address_label(),
        )
    }
}

#[cfg(feature = "serde")]
fn deserialize_coordinate<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Coordinate {
        Number(f64),
        Text(String),
    }

    Ok(match Coordinate::deserialize(deserializer)? {
        Coordinate::Number(value) => value,
        Coordinate::Text(text) => text.trim().parse().unwrap_or(f64::NAN),
    })
}

/// One order or event as delivered by a record source.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceRecord {
    pub id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub region_id: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub origin: Option<RawOrigin>,
}

// ============================================================================
// Sources
// ============================================================================

/// Provides the records associated with a region.
///
/// Implementations are called once per region id, concurrently.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn records_for_region(&self, region_id: &str) -> Result<Vec<SourceRecord>>;
}

/// A record source backed by an in-memory map.
///
/// Unknown regions have no records.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    regions: HashMap<String, Vec<SourceRecord>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the list returned for `region_id`.
    pub fn insert(&mut self, region_id: impl Into<String>, record: SourceRecord) {
        self.regions.entry(region_id.into()).or_default().push(record);
    }

    /// Append several records to the list returned for `region_id`.
    pub fn extend<I>(&mut self, region_id: impl Into<String>, records: I)
    where
        I: IntoIterator<Item = SourceRecord>,
    {
        self.regions.entry(region_id.into()).or_default().extend(records);
    }
}

#[async_trait]
impl RecordSource for InMemorySource {
    async fn records_for_region(&self, region_id: &str) -> Result<Vec<SourceRecord>> {
        Ok(self.regions.get(region_id).cloned().unwrap_or_default())
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Check that at least one region id is given and that each is well formed.
pub fn validate_region_ids(region_ids: &[String]) -> Result<()> {
    if region_ids.is_empty() {
        return Err(HotspotError::NoRegions);
    }

    if let Some(bad) = region_ids.iter().find(|id| !REGION_ID_PATTERN.is_match(id)) {
        return Err(HotspotError::InvalidRegionId(bad.clone()));
    }

    Ok(())
}

/// Fetch the records of every region concurrently.
///
/// All fetches must succeed; the first failure aborts the whole call so a
/// partial result can never bias region selection. Records are returned in
/// `region_ids` order regardless of which fetch finished first. Repeated
/// region ids are fetched once.
pub async fn fetch_all_regions<S>(source: &S, region_ids: &[String]) -> Result<Vec<SourceRecord>>
where
    S: RecordSource + ?Sized,
{
    let mut unique: Vec<&str> = Vec::with_capacity(region_ids.len());
    for id in region_ids {
        if unique.contains(&id.as_str()) {
            warn!("[HotspotPipeline] Region {} requested more than once", id);
            continue;
        }
        unique.push(id.as_str());
    }

    let start = Instant::now();
    let per_region = try_join_all(unique.iter().map(|id| source.records_for_region(id))).await?;

    let records: Vec<SourceRecord> = per_region.into_iter().flatten().collect();
    debug!(
        "[HotspotPipeline] Fetched {} records from {} regions in {:?}",
        records.len(),
        unique.len(),
        start.elapsed()
    );

    Ok(records)
}

/// Validate origins and convert source records into region records.
///
/// An origin with invalid coordinates is logged and dropped; its record
/// still counts toward the region population.
pub fn ingest_records(records: Vec<SourceRecord>) -> Vec<RegionRecord> {
    records
        .into_iter()
        .map(|record| {
            let SourceRecord {
                id,
                region_id,
                origin,
            } = record;

            let origin = origin.and_then(|raw| match GeoPoint::try_from(&raw) {
                Ok(point) => Some(point),
                Err(e) => {
                    warn!("[HotspotPipeline] Dropping origin of record {}: {}", id, e);
                    None
                }
            });

            RegionRecord::new(region_id, origin)
        })
        .collect()
}

/// Compute hotspots for the busiest of the given regions.
///
/// Fetches every region, selects the dominant one (see
/// [`RegionAggregate::dominant`](crate::RegionAggregate::dominant)), takes
/// its first representative points and returns their maximal clusters.
/// Returns an empty list when no region reaches
/// [`HotspotConfig::min_region_records`].
///
/// # Errors
///
/// - [`HotspotError::InvalidConfig`] if `config` does not validate
/// - [`HotspotError::NoRegions`] / [`HotspotError::InvalidRegionId`] for bad ids
/// - [`HotspotError::Fetch`] (or any other source error) if a fetch fails
pub async fn compute_hotspots<S>(
    source: &S,
    region_ids: &[String],
    config: &HotspotConfig,
) -> Result<Vec<HotspotCluster>>
where
    S: RecordSource + ?Sized,
{
    config.validate()?;
    validate_region_ids(region_ids)?;

    let start = Instant::now();
    let records = ingest_records(fetch_all_regions(source, region_ids).await?);
    let aggregate = aggregate_regions(&records);

    let Some(dominant) = aggregate.dominant(config.min_region_records) else {
        info!(
            "[HotspotPipeline] No region among {} has {} qualifying records",
            aggregate.len(),
            config.min_region_records
        );
        return Ok(Vec::new());
    };

    let representatives = dominant.representatives(config.max_representatives);
    let hotspots = find_hotspots(&representatives, config.radius_km);

    info!(
        "[HotspotPipeline] Region {} ({} qualifying records): {} hotspots from {} points in {:?}",
        dominant.region_id,
        dominant.qualifying_count(),
        hotspots.len(),
        representatives.len(),
        start.elapsed()
    );

    Ok(hotspots)
}

// ============================================================================
// Tests
// ============================================================================
