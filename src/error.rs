//! Error types for hotspot detection.

use thiserror::Error;

/// Errors produced while validating input or fetching region records.
///
/// "No region is busy enough" is not represented here: it is a normal
/// outcome and surfaces as an empty hotspot list.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HotspotError {
    /// A coordinate pair is NaN, infinite or out of range.
    #[error("invalid coordinate for point {id}: ({latitude}, {longitude})")]
    InvalidCoordinate {
        id: String,
        latitude: f64,
        longitude: f64,
    },

    /// A centroid was requested over zero points.
    #[error("cannot compute a centroid of zero points")]
    EmptyInput,

    /// A configuration value is outside its allowed range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The hotspot computation was called without any region ids.
    #[error("at least one region id is required")]
    NoRegions,

    /// A region id is not a well-formed identifier.
    #[error("invalid region id: {0:?}")]
    InvalidRegionId(String),

    /// A record source failed to deliver the records of a region.
    #[error("failed to fetch records for region {region_id}: {message}")]
    Fetch { region_id: String, message: String },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HotspotError>;
