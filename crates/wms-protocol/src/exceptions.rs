//! WMS 1.3.0 ServiceExceptionReport documents.

use quick_xml::escape::partial_escape;
use wms_common::WmsError;

use crate::xml::{self, XmlError};

pub const EXCEPTION_NAMESPACE: &str = "http://www.opengis.net/ogc";
pub const EXCEPTION_SCHEMA_LOCATION: &str =
    "http://www.opengis.net/ogc http://schemas.opengis.net/wms/1.3.0/exceptions_1_3_0.xsd";

/// The only exception format this server produces.
pub const EXCEPTION_FORMAT: &str = "XML";

/// Content type of an exception report.
pub const EXCEPTION_CONTENT_TYPE: &str = "text/xml";

/// Serialize an error as a ServiceExceptionReport. The `code` attribute is
/// present only when the error carries an OGC code.
pub fn service_exception_report(err: &WmsError) -> Result<String, XmlError> {
    let mut writer = xml::document()?;
    let message = err.to_string();
    writer
        .create_element("ServiceExceptionReport")
        .with_attribute(("version", wms_common::WMS_VERSION))
        .with_attribute(("xmlns", EXCEPTION_NAMESPACE))
        .with_attribute(("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"))
        .with_attribute(("xsi:schemaLocation", EXCEPTION_SCHEMA_LOCATION))
        .write_inner_content::<_, quick_xml::Error>(|w| {
            let element = w.create_element("ServiceException");
            let element = match err.code() {
                Some(code) => element.with_attribute(("code", code.as_str())),
                None => element,
            };
            element.write_text_content(xml::text(&message))?;
            Ok(())
        })?;
    xml::finish(writer)
}

/// Last-resort report used if serializing the real one fails. The message
/// is escaped the same way as in [`service_exception_report`].
pub fn fallback_report(message: &str) -> String {
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
            "<ServiceExceptionReport version=\"{}\" xmlns=\"{}\">",
            "<ServiceException>{}</ServiceException></ServiceExceptionReport>"
        ),
        wms_common::WMS_VERSION,
        EXCEPTION_NAMESPACE,
        partial_escape(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wms_common::{Dimension, FormatKind};

    const HEAD: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?><ServiceExceptionReport version=\"1.3.0\" xmlns=\"http://www.opengis.net/ogc\" xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" xsi:schemaLocation=\"http://www.opengis.net/ogc http://schemas.opengis.net/wms/1.3.0/exceptions_1_3_0.xsd\">";

    #[test]
    fn test_report_with_code() {
        let report = service_exception_report(&WmsError::InvalidCrs("EPSG:1".into())).unwrap();
        assert_eq!(
            report,
            format!(
                "{}<ServiceException code=\"InvalidCRS\">The CRS \"EPSG:1\" is not supported by this server</ServiceException></ServiceExceptionReport>",
                HEAD
            )
        );
    }

    #[test]
    fn test_report_without_code() {
        let report =
            service_exception_report(&WmsError::generic("Invalid bounding box format")).unwrap();
        assert_eq!(
            report,
            format!(
                "{}<ServiceException>Invalid bounding box format</ServiceException></ServiceExceptionReport>",
                HEAD
            )
        );
    }

    #[test]
    fn test_markup_in_message_is_escaped() {
        let err = WmsError::invalid_format(FormatKind::Image, "<b>&");
        let report = service_exception_report(&err).unwrap();
        assert!(report.contains("code=\"InvalidFormat\""));
        assert!(report.contains("The image format \"&lt;b&gt;&amp;\" is not supported"));
    }

    #[test]
    fn test_dimension_codes() {
        let report =
            service_exception_report(&WmsError::MissingDimensionValue(Dimension::Time)).unwrap();
        assert!(report.contains(
            "<ServiceException code=\"MissingDimensionValue\">You must provide a value for the TIME dimension</ServiceException>"
        ));
    }

    #[test]
    fn test_fallback() {
        let report = fallback_report("a<b & \"c\"");
        assert!(report.ends_with(
            "<ServiceException>a&lt;b &amp; \"c\"</ServiceException></ServiceExceptionReport>"
        ));
    }
}
