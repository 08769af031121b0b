//! WMS 1.3.0 GetCapabilities documents.
//!
//! The builder works from plain descriptions of the service and its layers;
//! gathering those from the dataset providers is the caller's job.

use chrono::{DateTime, SecondsFormat, Utc};
use wms_common::time::{format_seconds, parse_iso8601};
use wms_common::{BoundingBox, WmsError, WmsResult, WMS_VERSION};

use crate::xml::{self, text_element, XmlError, XmlResult, XmlWriter};

pub const WMS_NAMESPACE: &str = "http://www.opengis.net/wms";
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const CAPABILITIES_SCHEMA_LOCATION: &str =
    "http://www.opengis.net/wms http://schemas.opengis.net/wms/1.3.0/capabilities_1_3_0.xsd";

/// The single style every layer offers.
pub const DEFAULT_STYLE: &str = "boxfill";

/// Format of GetCapabilities responses and FeatureInfo documents.
pub const XML_FORMAT: &str = "text/xml";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactInfo {
    pub name: String,
    pub organization: String,
    pub telephone: String,
    pub email: String,
}

/// Service-level identity and limits.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceInfo {
    pub title: String,
    pub abstract_text: String,
    /// Public base URL of the WMS endpoint, without a query string.
    pub url: String,
    pub contact: ContactInfo,
    pub layer_limit: usize,
    pub max_width: usize,
    pub max_height: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElevationDimension {
    pub units: String,
    pub values: Vec<f64>,
}

/// One variable, advertised as a leaf layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerEntry {
    pub name: String,
    pub title: String,
    pub abstract_text: String,
    pub bbox: BoundingBox,
    pub queryable: bool,
    pub elevation: Option<ElevationDimension>,
    /// Seconds since the epoch.
    pub times: Vec<f64>,
}

/// One dataset, advertised as an intermediate layer.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetEntry {
    pub title: String,
    pub layers: Vec<LayerEntry>,
}

/// Everything needed to write one capabilities document.
#[derive(Debug, Clone)]
pub struct CapabilitiesDocument<'a> {
    pub service: &'a ServiceInfo,
    pub update_sequence: DateTime<Utc>,
    pub crs_codes: &'a [String],
    pub image_formats: &'a [&'a str],
    pub datasets: &'a [DatasetEntry],
}

/// Compare a client's UPDATESEQUENCE with the server's.
///
/// Absent or empty means "send the document". Both sides are truncated to
/// whole seconds; an equal value raises `CurrentUpdateSequence`, a later one
/// `InvalidUpdateSequence`.
pub fn check_update_sequence(requested: Option<&str>, current: &DateTime<Utc>) -> WmsResult<()> {
    let Some(requested) = requested.filter(|s| !s.is_empty()) else {
        return Ok(());
    };
    let client = parse_iso8601(requested).map_err(|_| {
        WmsError::generic("Invalid format for UPDATESEQUENCE parameter: must be ISO8601")
    })?;
    let server = current.timestamp();
    let client = client.timestamp();
    if client == server {
        Err(WmsError::CurrentUpdateSequence(requested.to_string()))
    } else if client > server {
        Err(WmsError::InvalidUpdateSequence(requested.to_string()))
    } else {
        Ok(())
    }
}

/// The advertised update sequence, at the precision it is compared with.
pub fn format_update_sequence(current: &DateTime<Utc>) -> String {
    current.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl CapabilitiesDocument<'_> {
    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut writer = xml::document()?;
        let update_sequence = format_update_sequence(&self.update_sequence);
        writer
            .create_element("WMS_Capabilities")
            .with_attribute(("version", WMS_VERSION))
            .with_attribute(("updateSequence", update_sequence.as_str()))
            .with_attribute(("xmlns", WMS_NAMESPACE))
            .with_attribute(("xmlns:xlink", XLINK_NAMESPACE))
            .with_attribute(("xmlns:xsi", XSI_NAMESPACE))
            .with_attribute(("xsi:schemaLocation", CAPABILITIES_SCHEMA_LOCATION))
            .write_inner_content::<_, quick_xml::Error>(|w| {
                self.write_service(w)?;
                self.write_capability(w)
            })?;
        xml::finish(writer)
    }

    fn write_service(&self, w: &mut XmlWriter) -> XmlResult {
        let service = self.service;
        w.create_element("Service").write_inner_content::<_, quick_xml::Error>(|w| {
            text_element(w, "Name", "WMS")?;
            text_element(w, "Title", &service.title)?;
            text_element(w, "Abstract", &service.abstract_text)?;
            online_resource(w, &service.url)?;
            w.create_element("ContactInformation").write_inner_content::<_, quick_xml::Error>(|w| {
                w.create_element("ContactPersonPrimary")
                    .write_inner_content::<_, quick_xml::Error>(|w| {
                        text_element(w, "ContactPerson", &service.contact.name)?;
                        text_element(w, "ContactOrganization", &service.contact.organization)
                    })?;
                text_element(w, "ContactVoiceTelephone", &service.contact.telephone)?;
                text_element(w, "ContactElectronicMailAddress", &service.contact.email)
            })?;
            text_element(w, "Fees", "none")?;
            text_element(w, "AccessConstraints", "none")?;
            text_element(w, "LayerLimit", &service.layer_limit.to_string())?;
            text_element(w, "MaxWidth", &service.max_width.to_string())?;
            text_element(w, "MaxHeight", &service.max_height.to_string())
        })?;
        Ok(())
    }

    fn write_capability(&self, w: &mut XmlWriter) -> XmlResult {
        let get_url = format!("{}?", self.service.url);
        w.create_element("Capability").write_inner_content::<_, quick_xml::Error>(|w| {
            w.create_element("Request").write_inner_content::<_, quick_xml::Error>(|w| {
                operation(w, "GetCapabilities", &[XML_FORMAT], &get_url)?;
                operation(w, "GetMap", self.image_formats, &get_url)?;
                operation(w, "GetFeatureInfo", &[XML_FORMAT], &get_url)
            })?;
            w.create_element("Exception").write_inner_content::<_, quick_xml::Error>(|w| {
                text_element(w, "Format", crate::exceptions::EXCEPTION_FORMAT)
            })?;
            w.create_element("Layer").write_inner_content::<_, quick_xml::Error>(|w| {
                text_element(w, "Title", &self.service.title)?;
                for crs in self.crs_codes {
                    text_element(w, "CRS", crs)?;
                }
                for dataset in self.datasets {
                    w.create_element("Layer").write_inner_content::<_, quick_xml::Error>(|w| {
                        text_element(w, "Title", &dataset.title)?;
                        for layer in &dataset.layers {
                            write_layer(w, layer)?;
                        }
                        Ok(())
                    })?;
                }
                Ok(())
            })?;
            Ok(())
        })?;
        Ok(())
    }
}

fn online_resource(w: &mut XmlWriter, href: &str) -> XmlResult {
    w.create_element("OnlineResource")
        .with_attribute(("xlink:type", "simple"))
        .with_attribute(("xlink:href", href))
        .write_empty()?;
    Ok(())
}

fn operation(w: &mut XmlWriter, name: &str, formats: &[&str], url: &str) -> XmlResult {
    w.create_element(name).write_inner_content::<_, quick_xml::Error>(|w| {
        for format in formats {
            text_element(w, "Format", format)?;
        }
        w.create_element("DCPType").write_inner_content::<_, quick_xml::Error>(|w| {
            w.create_element("HTTP").write_inner_content::<_, quick_xml::Error>(|w| {
                w.create_element("Get")
                    .write_inner_content(|w| online_resource(w, url))?;
                Ok(())
            })?;
            Ok(())
        })?;
        Ok(())
    })?;
    Ok(())
}

fn write_layer(w: &mut XmlWriter, layer: &LayerEntry) -> XmlResult {
    let bbox = &layer.bbox;
    w.create_element("Layer")
        .with_attribute(("queryable", if layer.queryable { "1" } else { "0" }))
        .write_inner_content::<_, quick_xml::Error>(|w| {
            text_element(w, "Name", &layer.name)?;
            text_element(w, "Title", &layer.title)?;
            text_element(w, "Abstract", &layer.abstract_text)?;
            w.create_element("EX_GeographicBoundingBox")
                .write_inner_content::<_, quick_xml::Error>(|w| {
                    text_element(w, "westBoundLongitude", &bbox.min_x.to_string())?;
                    text_element(w, "eastBoundLongitude", &bbox.max_x.to_string())?;
                    text_element(w, "southBoundLatitude", &bbox.min_y.to_string())?;
                    text_element(w, "northBoundLatitude", &bbox.max_y.to_string())
                })?;
            w.create_element("BoundingBox")
                .with_attribute(("CRS", "CRS:84"))
                .with_attribute(("minx", bbox.min_x.to_string().as_str()))
                .with_attribute(("maxx", bbox.max_x.to_string().as_str()))
                .with_attribute(("miny", bbox.min_y.to_string().as_str()))
                .with_attribute(("maxy", bbox.max_y.to_string().as_str()))
                .write_empty()?;
            w.create_element("Style").write_inner_content::<_, quick_xml::Error>(|w| {
                text_element(w, "Name", DEFAULT_STYLE)?;
                text_element(w, "Title", DEFAULT_STYLE)
            })?;

            if let Some(elevation) = layer.elevation.as_ref().filter(|e| !e.values.is_empty()) {
                let values: Vec<String> = elevation.values.iter().map(f64::to_string).collect();
                w.create_element("Dimension")
                    .with_attribute(("name", "elevation"))
                    .with_attribute(("units", elevation.units.as_str()))
                    .with_attribute(("multipleValues", "0"))
                    .with_attribute(("nearestValue", "0"))
                    .with_attribute(("default", values[0].as_str()))
                    .write_text_content(xml::text(&values.join(",")))?;
            }

            if let Some(&last) = layer.times.last() {
                let values: Vec<String> = layer.times.iter().map(|&t| format_seconds(t)).collect();
                w.create_element("Dimension")
                    .with_attribute(("name", "time"))
                    .with_attribute(("units", "ISO8601"))
                    .with_attribute(("multipleValues", "1"))
                    .with_attribute(("nearestValue", "0"))
                    .with_attribute(("default", format_seconds(last).as_str()))
                    .write_text_content(xml::text(&values.join(",")))?;
            }
            Ok(())
        })?;
    Ok(())
}
