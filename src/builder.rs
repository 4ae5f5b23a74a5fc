//! Store builder for flexible configuration
//!
//! Combines a [`Config`] with an optional custom [`Coverage`] strategy.

use crate::config::Config;
use crate::coverage::{Coverage, GeohashCoverage};
use crate::error::{GeomemError, Result};
use crate::store::Store;
use std::fmt;
use std::hash::Hash;

/// Builder for [`Store`].
///
/// ```
/// use geomem::{Config, Store};
///
/// let store: Store<&str> = Store::<&str>::builder()
///     .config(Config::default().with_geohash_precision(8))
///     .build()?;
/// assert_eq!(store.config().geohash_precision, 8);
/// # Ok::<(), geomem::GeomemError>(())
/// ```
pub struct StoreBuilder {
    config: Config,
    coverage: Option<Box<dyn Coverage>>,
}

impl StoreBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            coverage: None,
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Load the configuration from a JSON document.
    ///
    /// ```
    /// use geomem::{Store, StoreBuilder};
    ///
    /// let store: Store<u32> = StoreBuilder::new()
    ///     .config_json(r#"{ "geohash_precision": 6, "dedupe_results": true }"#)?
    ///     .build()?;
    /// assert_eq!(store.config().geohash_precision, 6);
    /// # Ok::<(), geomem::GeomemError>(())
    /// ```
    pub fn config_json(self, json: &str) -> Result<Self> {
        Ok(self.config(Config::from_json(json)?))
    }

    /// Load the configuration from a TOML document.
    #[cfg(feature = "toml")]
    pub fn config_toml(self, toml_str: &str) -> Result<Self> {
        Ok(self.config(Config::from_toml(toml_str)?))
    }

    /// Shorthand for setting `Config::geohash_precision`.
    pub fn geohash_precision(mut self, precision: usize) -> Self {
        self.config = self.config.with_geohash_precision(precision);
        self
    }

    /// Replace the default [`GeohashCoverage`].
    pub fn coverage<C: Coverage + 'static>(mut self, coverage: C) -> Self {
        self.coverage = Some(Box::new(coverage));
        self
    }

    /// Validate the configuration and build the store.
    pub fn build<T, I>(self) -> Result<Store<T, I>>
    where
        T: Send + Sync + 'static,
        I: Eq + Hash + Clone,
    {
        self.config.validate().map_err(GeomemError::InvalidInput)?;

        let coverage = self
            .coverage
            .unwrap_or_else(|| Box::new(GeohashCoverage::new(self.config.max_cover_hashes)));

        log::debug!(
            "Building store: precision {}, max cover hashes {}, dedupe {}",
            self.config.geohash_precision,
            self.config.max_cover_hashes,
            self.config.dedupe_results
        );

        Ok(Store::from_parts(self.config, coverage))
    }
}

impl Default for StoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StoreBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreBuilder")
            .field("config", &self.config)
            .field("custom_coverage", &self.coverage.is_some())
            .finish()
    }
}
