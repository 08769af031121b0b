//! Spherical Mercator (EPSG:41001) grids.
//!
//! The bounding box is given in degrees. Longitude is linear in pixel
//! position; latitude is linear in Mercator `y` and converted back with the
//! inverse projection, so rows get closer together in latitude towards the
//! poles.

use std::f64::consts::FRAC_PI_4;

use wms_common::{BoundingBox, Grid, GridFactory, WmsResult};

use crate::pixel_centres;

/// Latitudes are clamped to this before projecting; the poles map to infinity.
pub const MAX_LATITUDE: f64 = 89.9999;

/// Spherical Mercator on the unit sphere.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mercator;

impl Mercator {
    /// Forward projection of a latitude in degrees to Mercator `y`.
    pub fn lat_to_y(lat_deg: f64) -> f64 {
        let lat = lat_deg.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        (FRAC_PI_4 + lat / 2.0).tan().ln()
    }

    /// Inverse projection of Mercator `y` to latitude in degrees.
    pub fn y_to_lat(y: f64) -> f64 {
        y.sinh().atan().to_degrees()
    }
}

impl GridFactory for Mercator {
    fn identifier(&self) -> &str {
        "EPSG:41001"
    }

    fn create_grid(&self, bbox: &BoundingBox, width: usize, height: usize) -> WmsResult<Grid> {
        let lon = pixel_centres(bbox.min_x, bbox.max_x, width);
        let lat = pixel_centres(
            Self::lat_to_y(bbox.max_y),
            Self::lat_to_y(bbox.min_y),
            height,
        )
        .into_iter()
        .map(Self::y_to_lat)
        .collect();
        Ok(Grid::new(self.identifier(), *bbox, lon, lat, true))
    }
}
