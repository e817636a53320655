//! # Hotspot Finder
//!
//! Geographic hotspot detection for taxi order origins.
//!
//! This library provides:
//! - Dominant-region selection over geotagged orders from many regions
//! - Exhaustive, exact detection of tight point clusters ("hotspots")
//! - A concurrent, all-or-nothing record fetch pipeline
//!
//! ## Features
//!
//! - **`parallel`** - Evaluate batches of point sets in parallel with rayon
//! - **`serde`** - Serialize results and deserialize records/configuration
//! - **`http`** - Enable the HTTP record source
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use hotspot_finder::{GeoPoint, find_hotspots, DEFAULT_RADIUS_KM};
//!
//! let points = vec![
//!     GeoPoint::new("o1", 51.3127, 9.4797, "Koenigsplatz 34117 DE").unwrap(),
//!     GeoPoint::new("o2", 51.3131, 9.4801, "Koenigsplatz 34117 DE").unwrap(),
//!     GeoPoint::new("o3", 51.3122, 9.4790, "Obere Koenigsstrasse 34117 DE").unwrap(),
//! ];
//!
//! let hotspots = find_hotspots(&points, DEFAULT_RADIUS_KM);
//! assert_eq!(hotspots.len(), 1);
//! assert_eq!(hotspots[0].len(), 3);
//! ```
//!
//! The full pipeline, from region ids to hotspots, runs against any
//! [`RecordSource`]:
//!
//! ```rust
//! use hotspot_finder::{compute_hotspots, HotspotConfig, InMemorySource, SourceRecord, RawOrigin};
//!
//! # futures::executor::block_on(async {
//! let mut source = InMemorySource::new();
//! for i in 0..5 {
//!     source.insert("kassel", SourceRecord {
//!         id: format!("order{i}"),
//!         region_id: Some("kassel".to_string()),
//!         origin: Some(RawOrigin {
//!             id: format!("addr{i}"),
//!             latitude: 51.3127 + i as f64 * 0.0005,
//!             longitude: 9.4797,
//!             streetname: "Koenigsplatz".to_string(),
//!             zipcode: "34117".to_string(),
//!             country: "DE".to_string(),
//!         }),
//!     });
//! }
//!
//! let regions = vec!["kassel".to_string()];
//! let hotspots = compute_hotspots(&source, &regions, &HotspotConfig::default()).await.unwrap();
//! assert_eq!(hotspots.len(), 1);
//! # });
//! ```

pub mod error;
pub use error::{HotspotError, Result};

pub mod geo_utils;

// Region partitioning and dominant-region selection
pub mod regions;
pub use regions::{aggregate_regions, dominant_region, RegionAggregate, RegionBucket, RegionRecord};

// Exhaustive hotspot subset search
pub mod subsets;
pub use subsets::{find_hotspots, find_hotspots_batch, MAX_EXHAUSTIVE_POINTS};

#[cfg(feature = "parallel")]
pub use subsets::find_hotspots_batch_parallel;

// Record sources and the end-to-end pipeline
pub mod source;
pub use source::{
    compute_hotspots, fetch_all_regions, ingest_records, validate_region_ids, InMemorySource,
    RawOrigin, RecordSource, SourceRecord,
};

// HTTP record source
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{compute_hotspots_blocking, HttpRecordSource, HttpSourceConfig};

// ============================================================================
// Core Types
// ============================================================================

/// Default hotspot radius in kilometers.
pub const DEFAULT_RADIUS_KM: f64 = 2.0;

/// Default minimum number of qualifying records for a region to be dominant.
pub const DEFAULT_MIN_REGION_RECORDS: usize = 5;

/// Default number of representative points taken from the dominant region.
pub const DEFAULT_MAX_REPRESENTATIVES: usize = 5;

/// A validated geographic point with an address label.
///
/// Construction is the only place coordinates are checked; once a
/// `GeoPoint` exists its latitude is in [-90, 90] and its longitude in
/// [-180, 180], and neither is NaN.
///
/// # Example
/// ```
/// use hotspot_finder::GeoPoint;
///
/// let point = GeoPoint::new("addr-1", 51.3127, 9.4797, "Koenigsplatz 34117 DE").unwrap();
/// assert_eq!(point.id(), "addr-1");
///
/// assert!(GeoPoint::new("bad", f64::NAN, 9.4797, "").is_err());
/// assert!(GeoPoint::new("bad", 91.0, 0.0, "").is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GeoPoint {
    id: String,
    latitude: f64,
    longitude: f64,
    address: String,
}

impl GeoPoint {
    /// Create a new point, rejecting NaN, infinite or out-of-range coordinates.
    pub fn new(
        id: impl Into<String>,
        latitude: f64,
        longitude: f64,
        address: impl Into<String>,
    ) -> Result<Self> {
        let id = id.into();
        if !is_valid_coordinate(latitude, longitude) {
            return Err(HotspotError::InvalidCoordinate {
                id,
                latitude,
                longitude,
            });
        }

        Ok(Self {
            id,
            latitude,
            longitude,
            address: address.into(),
        })
    }

    /// Identifier of the underlying address record.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Human-readable address label.
    pub fn address(&self) -> &str {
        &self.address
    }
}

/// Check if a latitude/longitude pair is finite and within WGS84 range.
pub fn is_valid_coordinate(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

/// Arithmetic-mean center of a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Centroid {
    pub latitude: f64,
    pub longitude: f64,
}

impl Centroid {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// A maximal group of points that all lie within `radius_km` of their
/// own centroid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HotspotCluster {
    /// Member points, in input order
    pub points: Vec<GeoPoint>,
    /// Mean center of the member points
    pub centroid: Centroid,
    /// Radius the members were validated against
    pub radius_km: f64,
}

impl HotspotCluster {
    /// Number of member points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Whether a point with the given id is a member of this cluster.
    pub fn contains(&self, point_id: &str) -> bool {
        self.points.iter().any(|p| p.id() == point_id)
    }

    /// Largest distance from any member to the centroid, in kilometers.
    pub fn max_member_distance_km(&self) -> f64 {
        self.points
            .iter()
            .map(|p| geo_utils::distance_to_centroid_km(p, &self.centroid))
            .fold(0.0, f64::max)
    }
}

/// Configuration for the hotspot pipeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HotspotConfig {
    /// Maximum distance from a member to its cluster centroid.
    /// Default: 2.0 km
    pub radius_km: f64,

    /// Minimum qualifying records for a region to be selected as dominant.
    /// Regions below this stay visible in the aggregate but never win.
    /// Default: 5
    pub min_region_records: usize,

    /// Number of representative points taken from the dominant region.
    /// Bounds the subset search to 2^n - 1 candidates. Default: 5
    pub max_representatives: usize,
}

impl Default for HotspotConfig {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_RADIUS_KM,
            min_region_records: DEFAULT_MIN_REGION_RECORDS,
            max_representatives: DEFAULT_MAX_REPRESENTATIVES,
        }
    }
}

impl HotspotConfig {
    /// Check that every field is within its allowed range.
    pub fn validate(&self) -> Result<()> {
        if !self.radius_km.is_finite() || self.radius_km <= 0.0 {
            return Err(HotspotError::InvalidConfig(format!(
                "radius_km must be a positive number, got {}",
                self.radius_km
            )));
        }
        if self.min_region_records == 0 {
            return Err(HotspotError::InvalidConfig(
                "min_region_records must be at least 1".to_string(),
            ));
        }
        if self.max_representatives == 0 || self.max_representatives > MAX_EXHAUSTIVE_POINTS {
            return Err(HotspotError::InvalidConfig(format!(
                "max_representatives must be between 1 and {}, got {}",
                MAX_EXHAUSTIVE_POINTS, self.max_representatives
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new("ok", 51.5074, -0.1278, "").is_ok());
        assert!(GeoPoint::new("edge", 90.0, -180.0, "").is_ok());
        assert!(GeoPoint::new("lat", 91.0, 0.0, "").is_err());
        assert!(GeoPoint::new("lng", 0.0, 181.0, "").is_err());
        assert!(GeoPoint::new("nan", f64::NAN, 0.0, "").is_err());
        assert!(GeoPoint::new("inf", 0.0, f64::INFINITY, "").is_err());
    }

    #[test]
    fn test_invalid_coordinate_error_carries_id() {
        let err = GeoPoint::new("addr-9", -95.0, 10.0, "").unwrap_err();
        match err {
            HotspotError::InvalidCoordinate { id, latitude, .. } => {
                assert_eq!(id, "addr-9");
                assert_eq!(latitude, -95.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_default_config() {
        let config = HotspotConfig::default();
        assert_eq!(config.radius_km, 2.0);
        assert_eq!(config.min_region_records, 5);
        assert_eq!(config.max_representatives, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let zero_radius = HotspotConfig {
            radius_km: 0.0,
            ..HotspotConfig::default()
        };
        assert!(matches!(zero_radius.validate(), Err(HotspotError::InvalidConfig(_))));

        let nan_radius = HotspotConfig {
            radius_km: f64::NAN,
            ..HotspotConfig::default()
        };
        assert!(nan_radius.validate().is_err());

        let no_threshold = HotspotConfig {
            min_region_records: 0,
            ..HotspotConfig::default()
        };
        assert!(no_threshold.validate().is_err());

        let too_many = HotspotConfig {
            max_representatives: MAX_EXHAUSTIVE_POINTS + 1,
            ..HotspotConfig::default()
        };
        assert!(too_many.validate().is_err());
    }

    #[test]
    fn test_cluster_helpers() {
        let a = GeoPoint::new("a", 51.3127, 9.4797, "").unwrap();
        let b = GeoPoint::new("b", 51.3137, 9.4797, "").unwrap();
        let centroid = geo_utils::compute_centroid(&[a.clone(), b.clone()]).unwrap();
        let cluster = HotspotCluster {
            points: vec![a, b],
            centroid,
            radius_km: DEFAULT_RADIUS_KM,
        };

        assert_eq!(cluster.len(), 2);
        assert!(!cluster.is_empty());
        assert!(cluster.contains("a"));
        assert!(!cluster.contains("c"));
        // 0.001 degrees of latitude is ~111m, so each member is ~56m out
        let max = cluster.max_member_distance_km();
        assert!(max > 0.05 && max < 0.06);
    }
}
