//! Per-request sample grids.

use crate::{BoundingBox, WmsError, WmsResult};

/// The sample positions of one requested image.
///
/// `lon` holds one value per pixel column (west to east) and `lat` one value
/// per pixel row, stored top to bottom so that row 0 is the northernmost.
#[derive(Debug, Clone)]
pub struct Grid {
    crs: String,
    bbox: BoundingBox,
    lon: Vec<f64>,
    lat: Vec<f64>,
    /// True when pixel (i, j) samples exactly (lon[i], lat[j]).
    lon_lat_native: bool,
}

impl Grid {
    pub fn new(
        crs: impl Into<String>,
        bbox: BoundingBox,
        lon: Vec<f64>,
        lat: Vec<f64>,
        lon_lat_native: bool,
    ) -> Self {
        Self {
            crs: crs.into(),
            bbox,
            lon,
            lat,
            lon_lat_native,
        }
    }

    pub fn crs(&self) -> &str {
        &self.crs
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn width(&self) -> usize {
        self.lon.len()
    }

    pub fn height(&self) -> usize {
        self.lat.len()
    }

    pub fn lon_values(&self) -> &[f64] {
        &self.lon
    }

    pub fn lat_values(&self) -> &[f64] {
        &self.lat
    }

    pub fn is_lon_lat_native(&self) -> bool {
        self.lon_lat_native
    }

    /// Longitude and latitude at the centre of pixel (i, j).
    pub fn lon_lat_at(&self, i: usize, j: usize) -> WmsResult<(f64, f64)> {
        if !self.lon_lat_native {
            return Err(WmsError::Internal(format!(
                "grid for {} does not map pixels to lon/lat directly",
                self.crs
            )));
        }
        match (self.lon.get(i), self.lat.get(j)) {
            (Some(&lon), Some(&lat)) => Ok((lon, lat)),
            _ => Err(WmsError::Internal(format!(
                "pixel ({}, {}) is outside a {}x{} grid",
                i,
                j,
                self.width(),
                self.height()
            ))),
        }
    }

    /// Nearest pixel to a lon/lat position, or `None` when the position is
    /// outside the grid's bounding box.
    pub fn nearest_pixel(&self, lon: f64, lat: f64) -> Option<(usize, usize)> {
        if !self.lon_lat_native || !self.bbox.contains_point(lon, lat) {
            return None;
        }
        Some((nearest_index(&self.lon, lon)?, nearest_index(&self.lat, lat)?))
    }
}

fn nearest_index(values: &[f64], target: f64) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .min_by(|a, b| {
            (a.1 - target)
                .abs()
                .partial_cmp(&(b.1 - target).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Grid {
        Grid::new(
            "CRS:84",
            BoundingBox::new(0.0, 0.0, 4.0, 2.0),
            vec![0.5, 1.5, 2.5, 3.5],
            vec![1.5, 0.5],
            true,
        )
    }

    #[test]
    fn test_lon_lat_at() {
        let grid = sample();
        assert_eq!(grid.lon_lat_at(2, 1).unwrap(), (2.5, 0.5));
        assert!(grid.lon_lat_at(4, 0).is_err());
    }

    #[test]
    fn test_non_native_grid_is_internal_error() {
        let mut grid = sample();
        grid.lon_lat_native = false;
        let err = grid.lon_lat_at(0, 0).unwrap_err();
        assert!(matches!(err, WmsError::Internal(_)));
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_nearest_pixel() {
        let grid = sample();
        assert_eq!(grid.nearest_pixel(3.9, 1.9), Some((3, 0)));
        assert_eq!(grid.nearest_pixel(0.1, 0.1), Some((0, 1)));
        assert_eq!(grid.nearest_pixel(5.0, 1.0), None);
    }
}
