//! Integration tests for the capabilities, KML and metadata documents.
//!
//! Every document is read back with quick-xml's `Reader` so that
//! malformed output fails loudly.

use chrono::{TimeZone, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use wms_common::{BoundingBox, VariableAxis, VariableMetadata};
use wms_protocol::capabilities::{
    CapabilitiesDocument, ContactInfo, DatasetEntry, ElevationDimension, LayerEntry, ServiceInfo,
};
use wms_protocol::kml::{KmlRegion, KML_NAMESPACE};
use wms_protocol::metadata::{variable_details_xml, FrontPage, FrontPageDataset, FrontPageVariable};

// ============================================================================
// Helper functions
// ============================================================================

/// Names of every start/empty element, in document order.
fn element_names(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut names = Vec::new();
    loop {
        match reader.read_event().expect("well-formed XML") {
            Event::Start(e) | Event::Empty(e) => {
                names.push(String::from_utf8_lossy(e.name().as_ref()).into_owned())
            }
            Event::Eof => break,
            _ => {}
        }
    }
    names
}

fn service() -> ServiceInfo {
    ServiceInfo {
        title: "Ocean & Ice".to_string(),
        abstract_text: "Gridded model output".to_string(),
        url: "http://maps.example.org/wms".to_string(),
        contact: ContactInfo {
            name: "Data Desk".to_string(),
            organization: "Example Lab".to_string(),
            telephone: "+44 0000".to_string(),
            email: "data@example.org".to_string(),
        },
        layer_limit: 1,
        max_width: 1024,
        max_height: 1024,
    }
}

fn datasets() -> Vec<DatasetEntry> {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().timestamp() as f64;
    vec![DatasetEntry {
        title: "Ocean model".to_string(),
        layers: vec![
            LayerEntry {
                name: "ocean/sst".to_string(),
                title: "Sea surface temperature".to_string(),
                abstract_text: String::new(),
                bbox: BoundingBox::new(-180.0, -80.0, 180.0, 80.0),
                queryable: true,
                elevation: Some(ElevationDimension {
                    units: "m".to_string(),
                    values: vec![5.0, 15.5],
                }),
                times: vec![t0, t0 + 86400.0],
            },
            LayerEntry {
                name: "ocean/mask".to_string(),
                title: "Land mask".to_string(),
                abstract_text: String::new(),
                bbox: BoundingBox::new(-10.0, 40.0, 10.0, 60.0),
                queryable: false,
                elevation: None,
                times: Vec::new(),
            },
        ],
    }]
}

// ============================================================================
// Capabilities
// ============================================================================

#[test]
fn test_capabilities_structure() {
    let service = service();
    let crs = vec!["CRS:84".to_string(), "EPSG:41001".to_string()];
    let datasets = datasets();
    let doc = CapabilitiesDocument {
        service: &service,
        update_sequence: Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        crs_codes: &crs,
        image_formats: &["image/png", "image/gif"],
        datasets: &datasets,
    };
    let xml = doc.to_xml().unwrap();
    let names = element_names(&xml);

    assert_eq!(names[0], "WMS_Capabilities");
    assert!(xml.contains("version=\"1.3.0\""));
    assert!(xml.contains("updateSequence=\"2024-02-01T00:00:00Z\""));
    assert!(xml.contains("<Title>Ocean &amp; Ice</Title>"));
    assert!(xml.contains(
        "<LayerLimit>1</LayerLimit><MaxWidth>1024</MaxWidth><MaxHeight>1024</MaxHeight>"
    ));
    assert!(xml.contains("<CRS>CRS:84</CRS><CRS>EPSG:41001</CRS>"));
    assert!(xml.contains("<Format>image/png</Format><Format>image/gif</Format>"));
    assert!(xml.contains("xlink:href=\"http://maps.example.org/wms?\""));
    assert!(xml.contains("<Exception><Format>XML</Format></Exception>"));

    // Root layer, one dataset layer and two variable layers
    assert_eq!(names.iter().filter(|n| *n == "Layer").count(), 4);
    assert!(xml.contains("<Layer queryable=\"1\"><Name>ocean/sst</Name>"));
    assert!(xml.contains("<Layer queryable=\"0\"><Name>ocean/mask</Name>"));
    assert!(xml.contains(
        "<BoundingBox CRS=\"CRS:84\" minx=\"-180\" maxx=\"180\" miny=\"-80\" maxy=\"80\"/>"
    ));
    assert!(xml.contains("<Style><Name>boxfill</Name><Title>boxfill</Title></Style>"));

    assert!(xml.contains(
        "<Dimension name=\"elevation\" units=\"m\" multipleValues=\"0\" nearestValue=\"0\" default=\"5\">5,15.5</Dimension>"
    ));
    assert!(xml.contains(
        "<Dimension name=\"time\" units=\"ISO8601\" multipleValues=\"1\" nearestValue=\"0\" default=\"2024-01-02T00:00:00.000Z\">2024-01-01T00:00:00.000Z,2024-01-02T00:00:00.000Z</Dimension>"
    ));
    // The mask layer has neither axis
    assert_eq!(names.iter().filter(|n| *n == "Dimension").count(), 2);
}

// ============================================================================
// KML
// ============================================================================

#[test]
fn test_kml_region_well_formed() {
    let region = KmlRegion {
        wms_url: "http://maps.example.org/wms",
        layer: "ocean/sst",
        dbox: BoundingBox::new(0.0, 0.0, 90.0, 45.0),
        elevation: Some("5"),
        time: None,
    };
    let xml = region.to_xml().unwrap();
    assert!(xml.contains(KML_NAMESPACE));

    let names = element_names(&xml);
    assert_eq!(names.iter().filter(|n| *n == "Region").count(), 5);
    assert_eq!(names.iter().filter(|n| *n == "Link").count(), 4);
    assert!(xml.contains("ELEVATION=5"));
    assert!(xml.contains("<viewRefreshMode>onRegion</viewRefreshMode>"));
    assert!(xml.contains(
        "<LatLonBox><north>45</north><south>0</south><east>90</east><west>0</west></LatLonBox>"
    ));
}

// ============================================================================
// Metadata
// ============================================================================

#[test]
fn test_front_page_links() {
    let datasets = vec![
        FrontPageDataset {
            title: "Ocean model".to_string(),
            queryable: true,
            variables: vec![FrontPageVariable {
                layer_name: "ocean/sst".to_string(),
                title: "SST".to_string(),
                bbox: BoundingBox::global(),
                last_time: Some(0.0),
            }],
        },
        FrontPageDataset {
            title: "Private".to_string(),
            queryable: false,
            variables: Vec::new(),
        },
    ];
    let page = FrontPage {
        title: "Maps",
        wms_url: "/wms",
        image_formats: &["image/png", "image/gif"],
        allow_feature_info: true,
        datasets: &datasets,
    };
    let html = page.to_html().unwrap();
    element_names(&html);

    assert!(html.starts_with("<html><head><title>Maps</title></head><body><h1>Maps</h1>"));
    assert!(html.contains("REQUEST=GetCapabilities"));
    assert_eq!(html.matches("REQUEST=GetMap").count(), 2);
    assert_eq!(html.matches("REQUEST=GetFeatureInfo").count(), 1);
    assert!(html.contains("TIME=1970-01-01T00%3A00%3A00.000Z"));
    assert!(html.contains("<td>Dataset not queryable</td>"));
}

#[test]
fn test_variable_details() {
    let mut z = VariableAxis::new(vec![-5.0, -10.0], "m");
    z.positive_up = true;
    let metadata = VariableMetadata {
        id: "temp".to_string(),
        title: "Temperature".to_string(),
        abstract_text: String::new(),
        units: "K".to_string(),
        bbox: BoundingBox::global(),
        z_axis: Some(z),
        t_axis: None,
        valid_min: 270.0,
        valid_max: 310.5,
    };
    let xml = variable_details_xml("ocean", &metadata).unwrap();
    element_names(&xml);
    assert!(xml.contains(
        "<variableDetails dataset=\"ocean\" variable=\"Temperature\" units=\"K\"><axes><axis type=\"z\" units=\"m\" positive=\"1\"><value>5.000000</value><value>10.000000</value></axis></axes><range><min>270.000000</min><max>310.500000</max></range></variableDetails>"
    ));
}
