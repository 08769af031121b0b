//! Server configuration loaded from YAML.
//!
//! ```yaml
//! server:
//!   title: Gridded data WMS
//!   abstract: Maps of model output
//!   url: http://localhost:8080/wms
//!   layer_limit: 1
//!   max_image_width: 1024
//!   max_image_height: 1024
//!   allow_feature_info: true
//! cache:
//!   refresh_minutes: 5
//! datasets:
//!   - id: ocean
//!     title: Ocean model
//!     location: data/ocean.json
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use wms_common::layer::LAYER_SEPARATOR;
use wms_common::DatasetInfo;
use wms_protocol::{ContactInfo, ServiceInfo};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    pub name: String,
    pub organization: String,
    pub telephone: String,
    pub email: String,
}

/// Service identity and request limits.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Public URL of the `/wms` endpoint, used in capabilities and KML links.
    pub url: String,
    pub contact: ContactConfig,
    pub layer_limit: usize,
    pub max_image_width: usize,
    pub max_image_height: usize,
    pub allow_feature_info: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            title: "Gridded data WMS".to_string(),
            abstract_text: String::new(),
            url: "http://localhost:8080/wms".to_string(),
            contact: ContactConfig::default(),
            layer_limit: 1,
            max_image_width: 1024,
            max_image_height: 1024,
            allow_feature_info: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// Minutes between dataset cache wipes.
    pub refresh_minutes: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self { refresh_minutes: 1 }
    }
}

/// Complete, validated server configuration. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub datasets: Vec<DatasetInfo>,
    /// Advertised as the capabilities update sequence. Defaults to load time.
    #[serde(default = "Utc::now")]
    pub last_update: DateTime<Utc>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: ServerSection::default(),
            cache: CacheSection::default(),
            datasets: Vec::new(),
            last_update: Utc::now(),
        }
    }
}

impl ServerConfig {
    /// Load from a file. Relative dataset locations are resolved against the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml_str(&contents)?;

        if let Some(base) = path.parent() {
            for dataset in &mut config.datasets {
                let location = Path::new(&dataset.location);
                if location.is_relative() {
                    dataset.location = base.join(location).to_string_lossy().into_owned();
                }
            }
        }

        info!(
            path = %path.display(),
            datasets = config.datasets.len(),
            "Loaded server configuration"
        );
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let server = &self.server;
        if server.layer_limit < 1 {
            return Err(ConfigError::Invalid("layer_limit must be at least 1".into()));
        }
        if server.max_image_width < 1 || server.max_image_height < 1 {
            return Err(ConfigError::Invalid(
                "max_image_width and max_image_height must be at least 1".into(),
            ));
        }
        if self.cache.refresh_minutes < 1 {
            return Err(ConfigError::Invalid("cache.refresh_minutes must be at least 1".into()));
        }

        let mut seen = HashSet::new();
        for dataset in &self.datasets {
            if dataset.id.is_empty() {
                return Err(ConfigError::Invalid("dataset id must not be empty".into()));
            }
            if dataset.id.contains(LAYER_SEPARATOR) {
                return Err(ConfigError::Invalid(format!(
                    "dataset id \"{}\" must not contain '{}'",
                    dataset.id, LAYER_SEPARATOR
                )));
            }
            if !seen.insert(dataset.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate dataset id \"{}\"",
                    dataset.id
                )));
            }
        }
        Ok(())
    }

    /// Service description for the capabilities document.
    pub fn service_info(&self) -> ServiceInfo {
        let server = &self.server;
        ServiceInfo {
            title: server.title.clone(),
            abstract_text: server.abstract_text.clone(),
            url: server.url.clone(),
            contact: ContactInfo {
                name: server.contact.name.clone(),
                organization: server.contact.organization.clone(),
                telephone: server.contact.telephone.clone(),
                email: server.contact.email.clone(),
            },
            layer_limit: server.layer_limit,
            max_width: server.max_image_width,
            max_height: server.max_image_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const YAML: &str = r#"
server:
  title: Test server
  abstract: Test maps
  url: http://example.org/wms
  layer_limit: 2
  max_image_width: 512
  allow_feature_info: false
cache:
  refresh_minutes: 10
datasets:
  - id: ocean
    title: Ocean model
    location: ocean.json
  - id: ice
    title: Ice
    location: /data/ice.json
    queryable: false
last_update: 2024-03-01T12:00:00Z
"#;

    #[test]
    fn test_parse_full() {
        let config = ServerConfig::from_yaml_str(YAML).unwrap();
        assert_eq!(config.server.title, "Test server");
        assert_eq!(config.server.abstract_text, "Test maps");
        assert_eq!(config.server.layer_limit, 2);
        assert_eq!(config.server.max_image_width, 512);
        assert_eq!(config.server.max_image_height, 1024);
        assert!(!config.server.allow_feature_info);
        assert_eq!(config.cache.refresh_minutes, 10);
        assert_eq!(config.datasets.len(), 2);
        assert!(config.datasets[0].queryable);
        assert!(!config.datasets[1].queryable);
        assert_eq!(config.last_update.to_rfc3339(), "2024-03-01T12:00:00+00:00");
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_yaml_str("datasets: []").unwrap();
        assert_eq!(config.server.layer_limit, 1);
        assert_eq!(config.cache.refresh_minutes, 1);
        assert!(config.server.allow_feature_info);
    }

    #[test]
    fn test_rejects_invalid() {
        let dup = "datasets:\n  - {id: a, title: A, location: a.json}\n  - {id: a, title: B, location: b.json}\n";
        assert!(matches!(
            ServerConfig::from_yaml_str(dup),
            Err(ConfigError::Invalid(_))
        ));

        let slash = "datasets:\n  - {id: a/b, title: A, location: a.json}\n";
        assert!(ServerConfig::from_yaml_str(slash).is_err());

        let limit = "server:\n  layer_limit: 0\n";
        assert!(ServerConfig::from_yaml_str(limit).is_err());

        assert!(matches!(
            ServerConfig::from_yaml_str("server: [1, 2"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_resolves_relative_locations() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(YAML.as_bytes()).unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(
            config.datasets[0].location,
            dir.path().join("ocean.json").to_string_lossy()
        );
        assert_eq!(config.datasets[1].location, "/data/ice.json");

        assert!(matches!(
            ServerConfig::load(&dir.path().join("missing.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
