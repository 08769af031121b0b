//! OGC WMS 1.3.0 protocol layer: request parameters and the documents the
//! server writes back.
//!
//! Everything here is independent of where the data comes from. Builders
//! take plain descriptions and return serialized XML, KML or HTML.

pub mod capabilities;
pub mod exceptions;
pub mod featureinfo;
pub mod kml;
pub mod metadata;
pub mod params;
mod xml;

pub use capabilities::{
    check_update_sequence, CapabilitiesDocument, ContactInfo, DatasetEntry, ElevationDimension,
    LayerEntry, ServiceInfo, DEFAULT_STYLE,
};
pub use exceptions::{fallback_report, service_exception_report, EXCEPTION_CONTENT_TYPE};
pub use featureinfo::{FeatureInfoResponse, FeatureValue, INFO_FORMAT};
pub use kml::{KmlDocument, KmlLayer, KmlRegion, KML_CONTENT_TYPE};
pub use metadata::MetadataItem;
pub use params::{encode_query, KvpParams};
pub use xml::XmlError;
