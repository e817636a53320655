//! # Geographic Utilities
//!
//! Distance and centroid computations used by region aggregation and
//! hotspot detection.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`distance_km`] | Great-circle distance between two points in kilometers |
//! | [`distance_to_centroid_km`] | Great-circle distance from a point to a centroid |
//! | [`compute_centroid`] | Arithmetic-mean center of a set of points |
//!
//! ## Example
//!
//! ```rust
//! use hotspot_finder::{GeoPoint, geo_utils};
//!
//! let a = GeoPoint::new("a", 51.3127, 9.4797, "Koenigsplatz 1 34117 DE").unwrap();
//! let b = GeoPoint::new("b", 51.3180, 9.4900, "Friedrichsplatz 2 34117 DE").unwrap();
//!
//! let dist = geo_utils::distance_km(&a, &b);
//! assert!(dist > 0.5 && dist < 1.5);
//!
//! let center = geo_utils::compute_centroid(&[a, b]).unwrap();
//! assert!((center.latitude - 51.31535).abs() < 1e-9);
//! ```
//!
//! ## Algorithm Notes
//!
//! ### Haversine Formula
//!
//! Distances use the haversine great-circle formula on a spherical earth
//! (mean radius 6,371 km). At the 2 km scale used for hotspots the error
//! against the WGS84 ellipsoid is well under 0.5%.
//!
//! ### Centroid
//!
//! The centroid is a planar mean of latitudes and longitudes with no
//! antimeridian correction. Hotspots are small intra-city clusters, so
//! the approximation holds.

use geo::{Distance, Haversine, Point};

use crate::error::{HotspotError, Result};
use crate::{Centroid, GeoPoint};

const METERS_PER_KM: f64 = 1000.0;

// =============================================================================
// Distance Functions
// =============================================================================

#[inline]
fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let point1 = Point::new(lng1, lat1);
    let point2 = Point::new(lng2, lat2);
    Haversine::distance(point1, point2) / METERS_PER_KM
}

/// Calculate the great-circle distance between two points in kilometers.
///
/// Symmetric, and exactly `0.0` when both points share coordinates.
/// Inputs are validated [`GeoPoint`]s, so there is no error path.
///
/// # Example
///
/// ```rust
/// use hotspot_finder::{GeoPoint, geo_utils};
///
/// let london = GeoPoint::new("london", 51.5074, -0.1278, "").unwrap();
/// let paris = GeoPoint::new("paris", 48.8566, 2.3522, "").unwrap();
///
/// let distance = geo_utils::distance_km(&london, &paris);
/// assert!((distance - 343.5).abs() < 2.0);
/// ```
#[inline]
pub fn distance_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    haversine_km(a.latitude(), a.longitude(), b.latitude(), b.longitude())
}

/// Calculate the great-circle distance from a point to a centroid in kilometers.
#[inline]
pub fn distance_to_centroid_km(point: &GeoPoint, centroid: &Centroid) -> f64 {
    haversine_km(
        point.latitude(),
        point.longitude(),
        centroid.latitude,
        centroid.longitude,
    )
}

// =============================================================================
// Center/Centroid Functions
// =============================================================================

/// Compute the arithmetic-mean center of a set of points.
///
/// Latitude and longitude are averaged independently and unweighted.
///
/// # Errors
///
/// Returns [`HotspotError::EmptyInput`] for an empty slice, since the mean
/// of nothing has no meaningful location.
///
/// # Example
///
/// ```rust
/// use hotspot_finder::{GeoPoint, geo_utils};
///
/// let points = vec![
///     GeoPoint::new("a", 51.50, -0.10, "").unwrap(),
///     GeoPoint::new("b", 51.52, -0.12, "").unwrap(),
/// ];
///
/// let center = geo_utils::compute_centroid(&points).unwrap();
/// assert!((center.latitude - 51.51).abs() < 0.001);
/// assert!((center.longitude - (-0.11)).abs() < 0.001);
///
/// assert!(geo_utils::compute_centroid(&[]).is_err());
/// ```
pub fn compute_centroid(points: &[GeoPoint]) -> Result<Centroid> {
    if points.is_empty() {
        return Err(HotspotError::EmptyInput);
    }

    let sum_lat: f64 = points.iter().map(GeoPoint::latitude).sum();
    let sum_lng: f64 = points.iter().map(GeoPoint::longitude).sum();
    let n = points.len() as f64;

    Ok(Centroid::new(sum_lat / n, sum_lng / n))
}

// =============================================================================
// Unit Tests
// =============================================================================
