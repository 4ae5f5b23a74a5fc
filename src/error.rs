//! Error types for geomem.

use thiserror::Error;

/// Errors surfaced by the index.
///
/// The insert and query paths do almost no checking of their own: an
/// inverted time range or bounding box simply matches nothing. Errors come
/// from the geohash primitives rejecting their input and from configuration
/// loading and validation.
#[derive(Debug, Error)]
pub enum GeomemError {
    /// The geohash encoder rejected a coordinate pair.
    #[error("Invalid coordinates (lat: {lat}, lon: {lon}): {reason}")]
    InvalidCoordinates { lat: f64, lon: f64, reason: String },

    /// A geohash prefix could not be decoded into a cell key.
    #[error("Invalid geohash: {0}")]
    InvalidGeohash(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A JSON configuration document could not be parsed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[cfg(feature = "toml")]
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, GeomemError>;
