//! Layer naming and the dataset collaborator contracts.
//!
//! A layer is always `datasetId/variableId`. Everything the engine knows
//! about the data behind a layer comes through a [`DatasetProvider`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{BoundingBox, Dimension, WmsError};

/// Reserved separator between dataset and variable ids.
pub const LAYER_SEPARATOR: char = '/';

/// A parsed `datasetId/variableId` layer name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerName {
    pub dataset_id: String,
    pub variable_id: String,
}

impl LayerName {
    pub fn new(dataset_id: impl Into<String>, variable_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            variable_id: variable_id.into(),
        }
    }

    /// Parse a layer name. Fails with `LayerNotDefined` when the separator is
    /// missing or either part is empty.
    pub fn parse(s: &str) -> Result<Self, WmsError> {
        match s.split_once(LAYER_SEPARATOR) {
            Some((dataset, variable))
                if !dataset.is_empty()
                    && !variable.is_empty()
                    && !variable.contains(LAYER_SEPARATOR) =>
            {
                Ok(Self::new(dataset, variable))
            }
            _ => Err(WmsError::LayerNotDefined(s.to_string())),
        }
    }
}

impl fmt::Display for LayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.dataset_id, LAYER_SEPARATOR, self.variable_id)
    }
}

/// One configured dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub id: String,
    pub title: String,
    /// Opaque locator handed to the provider (a file path for the file provider).
    pub location: String,
    #[serde(default = "default_queryable")]
    pub queryable: bool,
}

fn default_queryable() -> bool {
    true
}

/// A layer resolved against the registry and the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRef {
    pub name: LayerName,
    pub location: String,
    pub queryable: bool,
}

/// Immutable, ordered table of configured datasets.
#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry {
    datasets: Vec<DatasetInfo>,
}

impl DatasetRegistry {
    pub fn new(datasets: Vec<DatasetInfo>) -> Self {
        Self { datasets }
    }

    pub fn datasets(&self) -> &[DatasetInfo] {
        &self.datasets
    }

    pub fn dataset(&self, id: &str) -> Option<&DatasetInfo> {
        self.datasets.iter().find(|d| d.id == id)
    }

    /// Resolve a layer against the registry, then confirm the provider knows
    /// the variable.
    pub fn lookup_layer(
        &self,
        name: &LayerName,
        provider: &dyn DatasetProvider,
    ) -> Result<LayerRef, WmsError> {
        let not_defined = || WmsError::LayerNotDefined(name.to_string());
        let dataset = self.dataset(&name.dataset_id).ok_or_else(not_defined)?;
        let variables = provider.variables(&dataset.location).map_err(|e| match e {
            ProviderError::NotFound(_) => not_defined(),
            other => WmsError::from(other),
        })?;
        if !variables.iter().any(|v| v == &name.variable_id) {
            return Err(not_defined());
        }
        Ok(LayerRef {
            name: name.clone(),
            location: dataset.location.clone(),
            queryable: dataset.queryable,
        })
    }
}

/// An ordered, monotonic coordinate axis of a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableAxis {
    /// z values in native units, or t values in seconds since the epoch.
    pub values: Vec<f64>,
    #[serde(default)]
    pub units: String,
    /// Whether increasing z values point up. Meaningless on a time axis.
    #[serde(default = "default_positive_up")]
    pub positive_up: bool,
}

fn default_positive_up() -> bool {
    true
}

impl VariableAxis {
    pub fn new(values: Vec<f64>, units: impl Into<String>) -> Self {
        Self {
            values,
            units: units.into(),
            positive_up: true,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Everything the engine needs to know about one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableMetadata {
    pub id: String,
    pub title: String,
    pub abstract_text: String,
    pub units: String,
    /// Geographic extent in CRS:84.
    pub bbox: BoundingBox,
    pub z_axis: Option<VariableAxis>,
    pub t_axis: Option<VariableAxis>,
    pub valid_min: f64,
    pub valid_max: f64,
}

impl VariableMetadata {
    /// The declared valid range, when it is a proper range.
    pub fn valid_range(&self) -> Option<(f64, f64)> {
        if self.valid_min.is_finite()
            && self.valid_max.is_finite()
            && self.valid_min < self.valid_max
        {
            Some((self.valid_min, self.valid_max))
        } else {
            None
        }
    }
}

/// Failures raised by a dataset provider.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("value {value} is not on the {dimension} axis")]
    InvalidAxisValue { dimension: Dimension, value: String },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("malformed dataset: {0}")]
    Format(String),
}

impl From<ProviderError> for WmsError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(name) => WmsError::LayerNotDefined(name),
            ProviderError::InvalidAxisValue { dimension, value } => {
                WmsError::InvalidDimensionValue { dimension, value }
            }
            other => WmsError::Internal(other.to_string()),
        }
    }
}

/// Access to the scientific datasets behind the layers.
///
/// Implementations must synchronize any internal caches themselves; the
/// engine calls them from many request threads at once.
pub trait DatasetProvider: Send + Sync {
    /// Ids of the displayable variables at `location`, in display order.
    fn variables(&self, location: &str) -> Result<Vec<String>, ProviderError>;

    fn variable_metadata(
        &self,
        location: &str,
        variable: &str,
    ) -> Result<VariableMetadata, ProviderError>;

    /// Sample a variable on the outer product of `lons` and `lats`.
    ///
    /// The result is row-major with `lats.len()` rows of `lons.len()` values.
    /// Points without data carry `fill_value`.
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
    ) -> Result<Vec<f32>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExceptionCode;

    struct OneVariable;

    impl DatasetProvider for OneVariable {
        fn variables(&self, location: &str) -> Result<Vec<String>, ProviderError> {
            if location == "missing.json" {
                return Err(ProviderError::NotFound(location.to_string()));
            }
            Ok(vec!["sst".to_string()])
        }

        fn variable_metadata(&self, _: &str, v: &str) -> Result<VariableMetadata, ProviderError> {
            Err(ProviderError::NotFound(v.to_string()))
        }

        fn read_samples(
            &self,
            _: &str,
            _: &str,
            _: Option<usize>,
            _: Option<f64>,
            _: &[f64],
            _: &[f64],
            _: f32,
        ) -> Result<Vec<f32>, ProviderError> {
            Ok(Vec::new())
        }
    }

    fn registry() -> DatasetRegistry {
        DatasetRegistry::new(vec![
            DatasetInfo {
                id: "ocean".into(),
                title: "Ocean".into(),
                location: "ocean.json".into(),
                queryable: false,
            },
            DatasetInfo {
                id: "gone".into(),
                title: "Gone".into(),
                location: "missing.json".into(),
                queryable: true,
            },
        ])
    }

    #[test]
    fn test_parse_layer_name() {
        let name = LayerName::parse("ocean/sst").unwrap();
        assert_eq!(name.dataset_id, "ocean");
        assert_eq!(name.variable_id, "sst");
        assert_eq!(name.to_string(), "ocean/sst");

        for bad in ["ocean", "/sst", "ocean/", "a/b/c"] {
            let err = LayerName::parse(bad).unwrap_err();
            assert_eq!(err.code(), Some(ExceptionCode::LayerNotDefined));
        }
    }

    #[test]
    fn test_lookup_layer() {
        let layer = registry()
            .lookup_layer(&LayerName::new("ocean", "sst"), &OneVariable)
            .unwrap();
        assert_eq!(layer.location, "ocean.json");
        assert!(!layer.queryable);

        for name in [
            LayerName::new("ocean", "chl"),
            LayerName::new("land", "sst"),
            LayerName::new("gone", "sst"),
        ] {
            let err = registry().lookup_layer(&name, &OneVariable).unwrap_err();
            assert_eq!(err, WmsError::LayerNotDefined(name.to_string()));
        }
    }

    #[test]
    fn test_provider_error_reclassified() {
        let err: WmsError = ProviderError::InvalidAxisValue {
            dimension: Dimension::Time,
            value: "7".into(),
        }
        .into();
        assert_eq!(err.code(), Some(ExceptionCode::InvalidDimensionValue));

        let err: WmsError = ProviderError::Io("disk".into()).into();
        assert_eq!(err.code(), None);
    }
}
