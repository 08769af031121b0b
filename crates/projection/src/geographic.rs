//! Plate-Carrée (CRS:84) grids.
//!
//! Longitude and latitude are both linear in pixel position. Rows run from
//! north to south.

use wms_common::{BoundingBox, Grid, GridFactory, WmsResult};

use crate::pixel_centres;

/// Geographic longitude/latitude in degrees, longitude first.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlateCarree;

impl GridFactory for PlateCarree {
    fn identifier(&self) -> &str {
        "CRS:84"
    }

    fn create_grid(&self, bbox: &BoundingBox, width: usize, height: usize) -> WmsResult<Grid> {
        let lon = pixel_centres(bbox.min_x, bbox.max_x, width);
        // Row 0 is the top of the image.
        let lat = pixel_centres(bbox.max_y, bbox.min_y, height);
        Ok(Grid::new(self.identifier(), *bbox, lon, lat, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_centres() {
        let grid = PlateCarree
            .create_grid(&BoundingBox::global(), 4, 2)
            .unwrap();
        assert_eq!(grid.lon_values(), &[-135.0, -45.0, 45.0, 135.0]);
        assert_eq!(grid.lat_values(), &[45.0, -45.0]);
        assert_eq!(grid.lon_lat_at(3, 0).unwrap(), (135.0, 45.0));
    }

    #[test]
    fn test_monotonic_for_many_boxes() {
        let boxes = [
            BoundingBox::new(-180.0, -90.0, 180.0, 90.0),
            BoundingBox::new(10.0, 20.0, 10.001, 20.001),
            BoundingBox::new(-1.0, -89.0, 359.0, 89.0),
        ];
        for bbox in &boxes {
            for (w, h) in [(1, 1), (2, 3), (256, 256), (1000, 7)] {
                let grid = PlateCarree.create_grid(bbox, w, h).unwrap();
                assert_eq!(grid.width(), w);
                assert_eq!(grid.height(), h);
                assert!(grid.lon_values().windows(2).all(|p| p[0] < p[1]));
                assert!(grid.lat_values().windows(2).all(|p| p[0] > p[1]));
                assert!(grid.lon_values().iter().all(|&x| x > bbox.min_x && x < bbox.max_x));
                assert!(grid.lat_values().iter().all(|&y| y > bbox.min_y && y < bbox.max_y));
            }
        }
    }
}
