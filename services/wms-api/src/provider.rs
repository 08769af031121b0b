//! File-backed dataset provider.
//!
//! A dataset location is a JSON document holding variables on regular
//! lon/lat grids:
//!
//! ```json
//! {
//!   "variables": [{
//!     "id": "sst", "title": "Sea surface temperature", "units": "K",
//!     "valid_min": 270.0, "valid_max": 310.0,
//!     "grid": { "lon0": -180.0, "lat0": -90.0, "dlon": 1.0, "dlat": 1.0, "nx": 360, "ny": 181 },
//!     "z": { "values": [5.0, 10.0], "units": "m", "positive_up": false },
//!     "t": ["2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z"],
//!     "data": [[...], [...], [...], [...]]
//!   }]
//! }
//! ```
//!
//! `data` holds one row-major slice per (t, z) pair, t-major, with row 0 at
//! `lat0`. `null` marks missing values. Parsed documents are cached per
//! location until the cache wiper clears them.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Deserialize;
use tracing::{debug, info};
use wms_common::time::{parse_iso8601, to_seconds};
use wms_common::{
    BoundingBox, DatasetProvider, Dimension, ProviderError, VariableAxis, VariableMetadata,
};

/// Relative tolerance when matching a requested z value to the axis.
const Z_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Deserialize)]
struct GridSpec {
    lon0: f64,
    lat0: f64,
    dlon: f64,
    dlat: f64,
    nx: usize,
    ny: usize,
}

impl GridSpec {
    fn bbox(&self) -> BoundingBox {
        let lon1 = self.lon0 + self.dlon * (self.nx.saturating_sub(1)) as f64;
        let lat1 = self.lat0 + self.dlat * (self.ny.saturating_sub(1)) as f64;
        BoundingBox::new(
            self.lon0.min(lon1),
            self.lat0.min(lat1),
            self.lon0.max(lon1),
            self.lat0.max(lat1),
        )
    }

    /// Whether the grid wraps around the globe in longitude.
    fn is_global(&self) -> bool {
        (self.dlon.abs() * self.nx as f64 - 360.0).abs() < 1e-6
    }

    /// Nearest column for a longitude, if it falls on the grid.
    fn column(&self, lon: f64) -> Option<usize> {
        let mut offset = (lon - self.lon0) / self.dlon;
        if self.is_global() {
            offset = offset.rem_euclid(self.nx as f64);
        }
        let i = offset.round();
        if self.is_global() && i as usize == self.nx {
            return Some(0);
        }
        (i >= 0.0 && i < self.nx as f64).then_some(i as usize)
    }

    fn row(&self, lat: f64) -> Option<usize> {
        let j = ((lat - self.lat0) / self.dlat).round();
        (j >= 0.0 && j < self.ny as f64).then_some(j as usize)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct VariableFile {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "abstract")]
    abstract_text: String,
    #[serde(default)]
    units: String,
    #[serde(default = "f64_nan")]
    valid_min: f64,
    #[serde(default = "f64_nan")]
    valid_max: f64,
    grid: GridSpec,
    #[serde(default)]
    z: Option<VariableAxis>,
    #[serde(default)]
    t: Option<Vec<String>>,
    data: Vec<Vec<Option<f32>>>,
}

fn f64_nan() -> f64 {
    f64::NAN
}

#[derive(Debug, Deserialize)]
struct DatasetFile {
    variables: Vec<VariableFile>,
}

/// A variable ready for sampling.
#[derive(Debug)]
struct GridVariable {
    metadata: VariableMetadata,
    grid: GridSpec,
    /// Number of z levels, at least 1.
    nz: usize,
    slices: Vec<Vec<Option<f32>>>,
}

impl GridVariable {
    fn from_file(file: VariableFile, location: &str) -> Result<Self, ProviderError> {
        let malformed = |msg: String| ProviderError::Format(format!("{}: {}", location, msg));

        let t_axis = match &file.t {
            Some(times) => {
                let values = times
                    .iter()
                    .map(|s| {
                        parse_iso8601(s)
                            .map(|dt| to_seconds(&dt))
                            .map_err(|_| malformed(format!("bad time value \"{}\"", s)))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Some(VariableAxis::new(values, "ISO8601"))
            }
            None => None,
        };

        let nt = t_axis.as_ref().map_or(1, |t| t.len().max(1));
        let nz = file.z.as_ref().map_or(1, |z| z.len().max(1));
        let grid = &file.grid;
        let cells = grid.nx * grid.ny;
        if grid.nx == 0 || grid.ny == 0 || grid.dlon == 0.0 || grid.dlat == 0.0 {
            return Err(malformed(format!("variable {} has an empty grid", file.id)));
        }
        if file.data.len() != nt * nz {
            return Err(malformed(format!(
                "variable {} has {} slices, expected {}",
                file.id,
                file.data.len(),
                nt * nz
            )));
        }
        if let Some(slice) = file.data.iter().find(|s| s.len() != cells) {
            return Err(malformed(format!(
                "variable {} has a slice of {} values, expected {}",
                file.id,
                slice.len(),
                cells
            )));
        }

        let metadata = VariableMetadata {
            title: file.title.clone().unwrap_or_else(|| file.id.clone()),
            id: file.id,
            abstract_text: file.abstract_text,
            units: file.units,
            bbox: file.grid.bbox(),
            z_axis: file.z,
            t_axis,
            valid_min: file.valid_min,
            valid_max: file.valid_max,
        };
        Ok(Self {
            metadata,
            grid: file.grid,
            nz,
            slices: file.data,
        })
    }

    fn z_index(&self, z_value: Option<f64>) -> Result<usize, ProviderError> {
        let (Some(axis), Some(z)) = (self.metadata.z_axis.as_ref(), z_value) else {
            return Ok(0);
        };
        axis.values
            .iter()
            .position(|v| (v - z).abs() <= Z_TOLERANCE * v.abs().max(z.abs()).max(1.0))
            .ok_or_else(|| ProviderError::InvalidAxisValue {
                dimension: Dimension::Elevation,
                value: z.to_string(),
            })
    }

    fn slice(
        &self,
        t_index: Option<usize>,
        z_index: usize,
    ) -> Result<&[Option<f32>], ProviderError> {
        let t = t_index.unwrap_or(0);
        self.slices
            .get(t * self.nz + z_index)
            .map(Vec::as_slice)
            .ok_or_else(|| ProviderError::InvalidAxisValue {
                dimension: Dimension::Time,
                value: t.to_string(),
            })
    }
}

/// All variables of one dataset file, in file order.
#[derive(Debug)]
struct GridDataset {
    variables: Vec<GridVariable>,
}

impl GridDataset {
    fn variable(&self, id: &str) -> Result<&GridVariable, ProviderError> {
        self.variables
            .iter()
            .find(|v| v.metadata.id == id)
            .ok_or_else(|| ProviderError::NotFound(id.to_string()))
    }
}

/// Provider reading JSON grid files with a shared handle cache.
#[derive(Debug, Default)]
pub struct GridFileProvider {
    cache: RwLock<HashMap<String, Arc<GridDataset>>>,
}

impl GridFileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of datasets currently held in the cache.
    pub fn cached_datasets(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }

    /// Drop every cached dataset; they are re-read on next use.
    pub fn clear_cache(&self) -> usize {
        match self.cache.write() {
            Ok(mut cache) => {
                let dropped = cache.len();
                cache.clear();
                dropped
            }
            Err(poisoned) => {
                let mut cache = poisoned.into_inner();
                let dropped = cache.len();
                cache.clear();
                dropped
            }
        }
    }

    fn dataset(&self, location: &str) -> Result<Arc<GridDataset>, ProviderError> {
        if let Some(dataset) = self.cache.read().ok().and_then(|c| c.get(location).cloned()) {
            return Ok(dataset);
        }

        let dataset = Arc::new(Self::read_file(location)?);
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(location.to_string(), dataset.clone());
        }
        Ok(dataset)
    }

    fn read_file(location: &str) -> Result<GridDataset, ProviderError> {
        let contents = std::fs::read_to_string(location).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ProviderError::NotFound(location.to_string()),
            _ => ProviderError::Io(format!("{}: {}", location, e)),
        })?;
        let file: DatasetFile = serde_json::from_str(&contents)
            .map_err(|e| ProviderError::Format(format!("{}: {}", location, e)))?;
        let variables = file
            .variables
            .into_iter()
            .map(|v| GridVariable::from_file(v, location))
            .collect::<Result<Vec<_>, _>>()?;
        info!(location, variables = variables.len(), "Loaded dataset");
        Ok(GridDataset { variables })
    }
}

impl DatasetProvider for GridFileProvider {
    fn variables(&self, location: &str) -> Result<Vec<String>, ProviderError> {
        Ok(self
            .dataset(location)?
            .variables
            .iter()
            .map(|v| v.metadata.id.clone())
            .collect())
    }

    fn variable_metadata(
        &self,
        location: &str,
        variable: &str,
    ) -> Result<VariableMetadata, ProviderError> {
        Ok(self.dataset(location)?.variable(variable)?.metadata.clone())
    }

    #[allow(clippy::too_many_arguments)]
    fn read_samples(
        &self,
        location: &str,
        variable: &str,
        t_index: Option<usize>,
        z_value: Option<f64>,
        lons: &[f64],
        lats: &[f64],
        fill_value: f32,
    ) -> Result<Vec<f32>, ProviderError> {
        let dataset = self.dataset(location)?;
        let var = dataset.variable(variable)?;
        let z_index = var.z_index(z_value)?;
        let slice = var.slice(t_index, z_index)?;
        let grid = &var.grid;

        let columns: Vec<Option<usize>> = lons.iter().map(|&lon| grid.column(lon)).collect();
        let mut samples = Vec::with_capacity(lons.len() * lats.len());
        for &lat in lats {
            let row = grid.row(lat);
            samples.extend(columns.iter().map(|col| match (row, *col) {
                (Some(j), Some(i)) => slice[j * grid.nx + i].unwrap_or(fill_value),
                _ => fill_value,
            }));
        }
        debug!(
            location,
            variable,
            t_index,
            z_index,
            points = samples.len(),
            "Sampled variable"
        );
        Ok(samples)
    }
}
