//! Common types shared by the gridded-data WMS crates.

pub mod bbox;
pub mod crs;
pub mod dimension;
pub mod error;
pub mod grid;
pub mod layer;
pub mod time;

pub use bbox::BoundingBox;
pub use crs::{CrsRegistry, GridFactory};
pub use dimension::{resolve_elevation, resolve_time, DimensionEntry, DimensionSelection};
pub use error::{Dimension, ExceptionCode, FormatKind, WmsError, WmsResult};
pub use grid::Grid;
pub use layer::{
    DatasetInfo, DatasetProvider, DatasetRegistry, LayerName, LayerRef, ProviderError,
    VariableAxis, VariableMetadata,
};

/// The only protocol version this server speaks.
pub const WMS_VERSION: &str = "1.3.0";

/// Sample value marking "no data".
pub const FILL_VALUE: f32 = 1.0e20;
