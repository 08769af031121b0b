//! Small helpers over quick-xml's `Writer` shared by the document builders.

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::Writer;
use wms_common::WmsError;

pub(crate) type XmlWriter = Writer<Vec<u8>>;
pub(crate) type XmlResult = Result<(), quick_xml::Error>;

/// Failure while serializing a document.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("XML write failed: {0}")]
    Write(#[from] quick_xml::Error),

    #[error("XML output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl From<XmlError> for WmsError {
    fn from(err: XmlError) -> Self {
        WmsError::Internal(err.to_string())
    }
}

/// A writer with the `<?xml ...?>` declaration already emitted.
pub(crate) fn document() -> Result<XmlWriter, XmlError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    Ok(writer)
}

pub(crate) fn finish(writer: XmlWriter) -> Result<String, XmlError> {
    Ok(String::from_utf8(writer.into_inner())?)
}

/// Text content with only `<`, `>` and `&` escaped, so quotes in messages
/// reach the client unchanged.
pub(crate) fn text(value: &str) -> BytesText<'_> {
    BytesText::from_escaped(partial_escape(value))
}

/// `<name>value</name>`
pub(crate) fn text_element(writer: &mut XmlWriter, name: &str, value: &str) -> XmlResult {
    writer.create_element(name).write_text_content(text(value))?;
    Ok(())
}

/// A writer for an HTML or XML fragment, without a declaration.
pub(crate) fn fragment() -> XmlWriter {
    Writer::new(Vec::new())
}
