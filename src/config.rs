//! Store configuration.
//!
//! `Config` is plain serde data so it can be loaded from JSON (or TOML with
//! the `toml` feature) and handed to [`StoreBuilder`](crate::StoreBuilder).
use serde::de::Error;
use serde::{Deserialize, Serialize};

/// Longest geohash the index stores. Cell keys pack `5 * len + 1` bits.
pub const MAX_GEOHASH_PRECISION: usize = 12;

/// Store configuration
///
/// # Example
///
/// ```rust
/// use geomem::Config;
///
/// let json = r#"{
///     "geohash_precision": 9,
///     "max_cover_hashes": 16
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.geohash_precision, 9);
/// assert!(!config.dedupe_results);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Full geohash length of every inserted point (1-12, default: 12).
    /// Each point is written once per prefix length, so this is also the
    /// write amplification per index.
    #[serde(default = "Config::default_geohash_precision")]
    pub geohash_precision: usize,

    /// Upper bound on the number of cells the default coverage may return
    /// for one query. The longest hash length that stays within it wins.
    #[serde(default = "Config::default_max_cover_hashes")]
    pub max_cover_hashes: usize,

    /// Suppress records already yielded by the same query. Only needed with a
    /// custom coverage strategy that can return overlapping cells.
    #[serde(default)]
    pub dedupe_results: bool,
}

impl Config {
    const fn default_geohash_precision() -> usize {
        MAX_GEOHASH_PRECISION
    }

    const fn default_max_cover_hashes() -> usize {
        12
    }

    pub fn with_geohash_precision(mut self, precision: usize) -> Self {
        assert!(
            (1..=MAX_GEOHASH_PRECISION).contains(&precision),
            "Geohash precision must be between 1 and 12"
        );
        self.geohash_precision = precision;
        self
    }

    pub fn with_max_cover_hashes(mut self, max_hashes: usize) -> Self {
        assert!(max_hashes > 0, "Max cover hashes must be greater than zero");

        if max_hashes > 1024 {
            log::warn!(
                "Max cover hashes of {} is very large; every query will probe up to that many cells.",
                max_hashes
            );
        }

        self.max_cover_hashes = max_hashes;
        self
    }

    pub fn with_dedupe_results(mut self, dedupe: bool) -> Self {
        self.dedupe_results = dedupe;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_GEOHASH_PRECISION).contains(&self.geohash_precision) {
            return Err(format!(
                "Geohash precision must be between 1 and {}, got {}",
                MAX_GEOHASH_PRECISION, self.geohash_precision
            ));
        }

        if self.max_cover_hashes == 0 {
            return Err("Max cover hashes must be greater than zero".to_string());
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geohash_precision: Self::default_geohash_precision(),
            max_cover_hashes: Self::default_max_cover_hashes(),
            dedupe_results: false,
        }
    }
}
