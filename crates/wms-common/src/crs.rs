//! Coordinate Reference System registry.
//!
//! A CRS is known to the server only through a [`GridFactory`] registered
//! under its identifier. Lookups are case-insensitive, so `crs:84` and
//! `CRS:84` select the same factory.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{BoundingBox, Grid, WmsError, WmsResult};

/// Builds the per-pixel sample grid for one CRS.
pub trait GridFactory: Send + Sync {
    /// Canonical identifier, e.g. "CRS:84".
    fn identifier(&self) -> &str;

    /// Create the grid of sample positions for an image of `width` x `height`
    /// pixels covering `bbox`.
    fn create_grid(&self, bbox: &BoundingBox, width: usize, height: usize) -> WmsResult<Grid>;
}

/// Lookup table from CRS identifier to grid factory.
#[derive(Clone, Default)]
pub struct CrsRegistry {
    factories: HashMap<String, Arc<dyn GridFactory>>,
    // Registration order, used when advertising CRSs in capabilities.
    order: Vec<String>,
}

impl CrsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any previous one with the same identifier.
    pub fn register(&mut self, factory: Arc<dyn GridFactory>) {
        let key = factory.identifier().to_uppercase();
        if !self.factories.contains_key(&key) {
            self.order.push(factory.identifier().to_string());
        }
        self.factories.insert(key, factory);
    }

    /// Builder-style variant of [`CrsRegistry::register`].
    pub fn with(mut self, factory: Arc<dyn GridFactory>) -> Self {
        self.register(factory);
        self
    }

    pub fn supports(&self, crs: &str) -> bool {
        self.factories.contains_key(&crs.to_uppercase())
    }

    /// Identifiers in registration order.
    pub fn identifiers(&self) -> &[String] {
        &self.order
    }

    /// Create a grid, failing with `InvalidCRS` for an unknown identifier.
    pub fn create_grid(
        &self,
        crs: &str,
        bbox: &BoundingBox,
        width: usize,
        height: usize,
    ) -> WmsResult<Grid> {
        let factory = self
            .factories
            .get(&crs.to_uppercase())
            .ok_or_else(|| WmsError::InvalidCrs(crs.to_string()))?;
        factory.create_grid(bbox, width, height)
    }
}

impl fmt::Debug for CrsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrsRegistry")
            .field("identifiers", &self.order)
            .finish()
    }
}
