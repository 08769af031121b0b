//! Error types for the WMS engine.
//!
//! Every failure raised while handling a request is a [`WmsError`]. Each
//! variant maps onto at most one OGC exception code, so the set of codes a
//! client can ever see is the closed [`ExceptionCode`] enum.

use std::fmt;
use thiserror::Error;

/// Result type alias using WmsError.
pub type WmsResult<T> = Result<T, WmsError>;

/// OGC WMS 1.3.0 exception codes emitted by this server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionCode {
    OperationNotSupported,
    InvalidCrs,
    StyleNotDefined,
    InvalidFormat,
    LayerNotDefined,
    MissingDimensionValue,
    InvalidDimensionValue,
    InvalidUpdateSequence,
    CurrentUpdateSequence,
    LayerNotQueryable,
    InvalidPoint,
}

impl ExceptionCode {
    /// The code exactly as it appears in a ServiceExceptionReport.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExceptionCode::OperationNotSupported => "OperationNotSupported",
            ExceptionCode::InvalidCrs => "InvalidCRS",
            ExceptionCode::StyleNotDefined => "StyleNotDefined",
            ExceptionCode::InvalidFormat => "InvalidFormat",
            ExceptionCode::LayerNotDefined => "LayerNotDefined",
            ExceptionCode::MissingDimensionValue => "MissingDimensionValue",
            ExceptionCode::InvalidDimensionValue => "InvalidDimensionValue",
            ExceptionCode::InvalidUpdateSequence => "InvalidUpdateSequence",
            ExceptionCode::CurrentUpdateSequence => "CurrentUpdateSequence",
            ExceptionCode::LayerNotQueryable => "LayerNotQueryable",
            ExceptionCode::InvalidPoint => "InvalidPoint",
        }
    }
}

impl fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two dimensions a client can select along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Time,
    Elevation,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Time => f.write_str("TIME"),
            Dimension::Elevation => f.write_str("ELEVATION"),
        }
    }
}

/// What kind of format a client asked for, used in InvalidFormat messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Image,
    Info,
    Exception,
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatKind::Image => f.write_str("image"),
            FormatKind::Info => f.write_str("info"),
            FormatKind::Exception => f.write_str("exception"),
        }
    }
}

/// Primary error type for WMS operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WmsError {
    /// A protocol violation without a dedicated OGC code.
    #[error("{0}")]
    Generic(String),

    #[error("The operation \"{0}\" is not supported by this server")]
    OperationNotSupported(String),

    #[error("The CRS \"{0}\" is not supported by this server")]
    InvalidCrs(String),

    #[error("The style \"{0}\" is not supported by this server")]
    StyleNotDefined(String),

    #[error("The {kind} format \"{format}\" is not supported by this server")]
    InvalidFormat { kind: FormatKind, format: String },

    #[error("The layer \"{0}\" is not provided by this server")]
    LayerNotDefined(String),

    #[error("You must provide a value for the {0} dimension")]
    MissingDimensionValue(Dimension),

    #[error("The value \"{value}\" is not valid for the {dimension} dimension")]
    InvalidDimensionValue { dimension: Dimension, value: String },

    #[error("The update sequence \"{0}\" is later than the current update sequence")]
    InvalidUpdateSequence(String),

    #[error("The update sequence \"{0}\" is the current update sequence")]
    CurrentUpdateSequence(String),

    #[error("The layer \"{0}\" is not queryable")]
    LayerNotQueryable(String),

    #[error("The pixel position {0} is not inside the requested image")]
    InvalidPoint(String),

    /// Failures that are the server's fault rather than the client's.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WmsError {
    /// Construct a generic (code-less) protocol exception.
    pub fn generic(message: impl Into<String>) -> Self {
        WmsError::Generic(message.into())
    }

    /// The exception raised for an absent mandatory parameter.
    pub fn missing_parameter(name: &str) -> Self {
        WmsError::Generic(format!("Must provide a {} argument", name.to_uppercase()))
    }

    pub fn invalid_dimension(dimension: Dimension, value: impl Into<String>) -> Self {
        WmsError::InvalidDimensionValue {
            dimension,
            value: value.into(),
        }
    }

    pub fn invalid_format(kind: FormatKind, format: impl Into<String>) -> Self {
        WmsError::InvalidFormat {
            kind,
            format: format.into(),
        }
    }

    /// Get the OGC WMS exception code for this error, if it has one.
    pub fn code(&self) -> Option<ExceptionCode> {
        match self {
            WmsError::Generic(_) | WmsError::Internal(_) => None,
            WmsError::OperationNotSupported(_) => Some(ExceptionCode::OperationNotSupported),
            WmsError::InvalidCrs(_) => Some(ExceptionCode::InvalidCrs),
            WmsError::StyleNotDefined(_) => Some(ExceptionCode::StyleNotDefined),
            WmsError::InvalidFormat { .. } => Some(ExceptionCode::InvalidFormat),
            WmsError::LayerNotDefined(_) => Some(ExceptionCode::LayerNotDefined),
            WmsError::MissingDimensionValue(_) => Some(ExceptionCode::MissingDimensionValue),
            WmsError::InvalidDimensionValue { .. } => Some(ExceptionCode::InvalidDimensionValue),
            WmsError::InvalidUpdateSequence(_) => Some(ExceptionCode::InvalidUpdateSequence),
            WmsError::CurrentUpdateSequence(_) => Some(ExceptionCode::CurrentUpdateSequence),
            WmsError::LayerNotQueryable(_) => Some(ExceptionCode::LayerNotQueryable),
            WmsError::InvalidPoint(_) => Some(ExceptionCode::InvalidPoint),
        }
    }

    /// True if the client caused this error.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, WmsError::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_wire_text() {
        assert_eq!(
            WmsError::InvalidCrs("EPSG:1".into()).to_string(),
            "The CRS \"EPSG:1\" is not supported by this server"
        );
        assert_eq!(
            WmsError::invalid_format(FormatKind::Image, "image/jpeg").to_string(),
            "The image format \"image/jpeg\" is not supported by this server"
        );
        assert_eq!(
            WmsError::MissingDimensionValue(Dimension::Time).to_string(),
            "You must provide a value for the TIME dimension"
        );
        assert_eq!(
            WmsError::invalid_dimension(Dimension::Elevation, "-3").to_string(),
            "The value \"-3\" is not valid for the ELEVATION dimension"
        );
        assert_eq!(
            WmsError::missing_parameter("bbox").to_string(),
            "Must provide a BBOX argument"
        );
    }

    #[test]
    fn test_codes() {
        assert_eq!(WmsError::generic("x").code(), None);
        assert_eq!(WmsError::Internal("x".into()).code(), None);
        assert_eq!(
            WmsError::LayerNotDefined("a/b".into()).code(),
            Some(ExceptionCode::LayerNotDefined)
        );
        assert_eq!(ExceptionCode::InvalidCrs.as_str(), "InvalidCRS");
        assert!(!WmsError::Internal("x".into()).is_client_error());
    }
}
