use thiserror::Error;

pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// Rendered markup that carries report annotations the reader cannot trust.
///
/// Foreign markup never produces these; only `data-node` elements whose
/// attributes are missing or malformed do.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("{node} node is missing attribute {attribute}")]
    MissingAttribute { node: String, attribute: String },

    #[error("Invalid value {value:?} for {attribute} on {node} node")]
    InvalidAttribute {
        node: String,
        attribute: String,
        value: String,
    },

    #[error("Unknown node kind {0:?}")]
    UnknownNode(String),
}

impl SurfaceError {
    pub fn missing_attribute(node: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            node: node.into(),
            attribute: attribute.into(),
        }
    }

    pub fn invalid_attribute(
        node: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            node: node.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}
