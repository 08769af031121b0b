//! Map projections behind the WMS `CRS` parameter.
//!
//! Each supported CRS is a [`GridFactory`] that turns a bounding box and an
//! image size into per-pixel sample positions.

pub mod geographic;
pub mod mercator;

use std::sync::Arc;

use wms_common::CrsRegistry;

pub use geographic::PlateCarree;
pub use mercator::Mercator;
pub use wms_common::GridFactory;

/// Registry with every CRS this server supports, in advertising order.
pub fn standard_registry() -> CrsRegistry {
    CrsRegistry::new()
        .with(Arc::new(PlateCarree))
        .with(Arc::new(Mercator))
}

/// Pixel-centre positions along one linear axis, `count` samples between
/// `start` and `end`.
pub(crate) fn pixel_centres(start: f64, end: f64, count: usize) -> Vec<f64> {
    let step = (end - start) / count as f64;
    (0..count).map(|i| start + (i as f64 + 0.5) * step).collect()
}
