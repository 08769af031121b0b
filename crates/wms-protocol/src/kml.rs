//! KML super-overlay documents for Google Earth.
//!
//! GetKML returns one folder per layer linking to the whole-layer region.
//! Each GetKMLRegion response draws its region as a 256 pixel ground overlay
//! and links its four quadrants, which the viewer fetches as it zooms in.

use wms_common::{BoundingBox, WMS_VERSION};

use crate::params::encode_query;
use crate::xml::{self, text_element, XmlError, XmlResult, XmlWriter};

pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";
pub const KML_CONTENT_TYPE: &str = "application/vnd.google-earth.kml+xml";

/// Edge length in pixels of the image drawn for each region.
pub const REGION_TILE_SIZE: usize = 256;

/// A region becomes active once it covers this many screen pixels.
pub const MIN_LOD_PIXELS: i32 = 128;

/// A layer to include in a GetKML document.
#[derive(Debug, Clone, PartialEq)]
pub struct KmlLayer {
    pub name: String,
    pub title: String,
    pub abstract_text: String,
    pub bbox: BoundingBox,
}

/// Top-level GetKML document.
#[derive(Debug, Clone)]
pub struct KmlDocument<'a> {
    pub title: &'a str,
    pub description: &'a str,
    /// WMS endpoint URL without a query string.
    pub wms_url: &'a str,
    pub layers: &'a [KmlLayer],
}

impl KmlDocument<'_> {
    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut writer = xml::document()?;
        writer
            .create_element("kml")
            .with_attribute(("xmlns", KML_NAMESPACE))
            .write_inner_content::<_, quick_xml::Error>(|w| {
                w.create_element("Document").write_inner_content::<_, quick_xml::Error>(|w| {
                    text_element(w, "name", self.title)?;
                    text_element(w, "description", self.description)?;
                    for layer in self.layers {
                        w.create_element("Folder").write_inner_content(|w| {
                            text_element(w, "name", &layer.title)?;
                            text_element(w, "description", &layer.abstract_text)?;
                            let href =
                                region_url(self.wms_url, &layer.name, &layer.bbox, None, None);
                            network_link(w, &layer.title, &layer.bbox, &href)
                        })?;
                    }
                    Ok(())
                })?;
                Ok(())
            })?;
        xml::finish(writer)
    }
}

/// One GetKMLRegion response.
#[derive(Debug, Clone)]
pub struct KmlRegion<'a> {
    pub wms_url: &'a str,
    pub layer: &'a str,
    pub dbox: BoundingBox,
    pub elevation: Option<&'a str>,
    pub time: Option<&'a str>,
}

impl KmlRegion<'_> {
    /// The GetMap URL that draws this region.
    pub fn map_url(&self) -> String {
        let size = REGION_TILE_SIZE.to_string();
        let bbox = self.dbox.to_wms_string();
        let mut pairs = vec![
            ("SERVICE", "WMS"),
            ("REQUEST", "GetMap"),
            ("VERSION", WMS_VERSION),
            ("LAYERS", self.layer),
            ("STYLES", ""),
            ("CRS", "CRS:84"),
            ("BBOX", bbox.as_str()),
            ("WIDTH", size.as_str()),
            ("HEIGHT", size.as_str()),
            ("FORMAT", "image/png"),
            ("TRANSPARENT", "true"),
        ];
        push_dimensions(&mut pairs, self.elevation, self.time);
        format!("{}?{}", self.wms_url, encode_query(pairs))
    }

    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut writer = xml::document()?;
        writer
            .create_element("kml")
            .with_attribute(("xmlns", KML_NAMESPACE))
            .write_inner_content::<_, quick_xml::Error>(|w| {
                w.create_element("Document").write_inner_content::<_, quick_xml::Error>(|w| {
                    region(w, &self.dbox)?;
                    w.create_element("GroundOverlay")
                        .write_inner_content::<_, quick_xml::Error>(|w| {
                            text_element(w, "drawOrder", "0")?;
                            w.create_element("Icon")
                                .write_inner_content(|w| text_element(w, "href", &self.map_url()))?;
                            lat_lon_box(w, "LatLonBox", &self.dbox)
                        })?;
                    for quadrant in self.dbox.quadrants() {
                        let href = region_url(
                            self.wms_url,
                            self.layer,
                            &quadrant,
                            self.elevation,
                            self.time,
                        );
                        network_link(w, &quadrant.to_wms_string(), &quadrant, &href)?;
                    }
                    Ok(())
                })?;
                Ok(())
            })?;
        xml::finish(writer)
    }
}

fn push_dimensions<'a>(
    pairs: &mut Vec<(&'a str, &'a str)>,
    elevation: Option<&'a str>,
    time: Option<&'a str>,
) {
    if let Some(elevation) = elevation.filter(|s| !s.is_empty()) {
        pairs.push(("ELEVATION", elevation));
    }
    if let Some(time) = time.filter(|s| !s.is_empty()) {
        pairs.push(("TIME", time));
    }
}

/// URL of the GetKMLRegion request for one region.
pub fn region_url(
    wms_url: &str,
    layer: &str,
    dbox: &BoundingBox,
    elevation: Option<&str>,
    time: Option<&str>,
) -> String {
    let dbox = dbox.to_wms_string();
    let mut pairs = vec![
        ("SERVICE", "WMS"),
        ("REQUEST", "GetKMLRegion"),
        ("LAYER", layer),
        ("DBOX", dbox.as_str()),
    ];
    push_dimensions(&mut pairs, elevation, time);
    format!("{}?{}", wms_url, encode_query(pairs))
}

fn region(w: &mut XmlWriter, bbox: &BoundingBox) -> XmlResult {
    w.create_element("Region").write_inner_content::<_, quick_xml::Error>(|w| {
        lat_lon_box(w, "LatLonAltBox", bbox)?;
        w.create_element("Lod").write_inner_content::<_, quick_xml::Error>(|w| {
            text_element(w, "minLodPixels", &MIN_LOD_PIXELS.to_string())?;
            text_element(w, "maxLodPixels", "-1")
        })?;
        Ok(())
    })?;
    Ok(())
}

fn lat_lon_box(w: &mut XmlWriter, name: &str, bbox: &BoundingBox) -> XmlResult {
    w.create_element(name).write_inner_content::<_, quick_xml::Error>(|w| {
        text_element(w, "north", &bbox.max_y.to_string())?;
        text_element(w, "south", &bbox.min_y.to_string())?;
        text_element(w, "east", &bbox.max_x.to_string())?;
        text_element(w, "west", &bbox.min_x.to_string())
    })?;
    Ok(())
}

fn network_link(w: &mut XmlWriter, name: &str, bbox: &BoundingBox, href: &str) -> XmlResult {
    w.create_element("NetworkLink").write_inner_content::<_, quick_xml::Error>(|w| {
        text_element(w, "name", name)?;
        region(w, bbox)?;
        w.create_element("Link").write_inner_content::<_, quick_xml::Error>(|w| {
            text_element(w, "href", href)?;
            text_element(w, "viewRefreshMode", "onRegion")
        })?;
        Ok(())
    })?;
    Ok(())
}
