use thiserror::Error;

/// Errors produced while reading or writing a COLLADA document.
///
/// Every error aborts the conversion call. Nothing is partially recovered.
#[derive(Debug, Error)]
pub enum DaeError {
    #[error("file I/O failed: {0}")]
    FileIo(#[from] std::io::Error),

    #[error("malformed XML: {0}")]
    MalformedXml(String),

    #[error("malformed source '{id}': {reason}")]
    MalformedSource { id: String, reason: String },

    #[error("source '{0}' is not defined and is not a <vertices> alias of a defined source")]
    UnresolvedSource(String),

    #[error("malformed <{element}>: {reason}")]
    MalformedPrimitives { element: String, reason: String },

    #[error("index {index} is out of range for source '{source_id}' with {count} elements")]
    IndexOutOfRange {
        source_id: String,
        index: usize,
        count: usize,
    },

    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("failed to serialize XML: {0}")]
    SerializeFailed(String),
}

impl DaeError {
    pub(crate) fn malformed_source(id: &str, reason: impl Into<String>) -> Self {
        Self::MalformedSource {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_primitives(element: &str, reason: impl Into<String>) -> Self {
        Self::MalformedPrimitives {
            element: element.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DaeError>;
