//! Error types for profile, extension and document operations.

use thiserror::Error;

use crate::base::QName;

/// Errors raised by the extension model and the parse/generate drivers.
///
/// All of these are structural: they are reported synchronously and never
/// retried, since the same input would fail the same way.
#[derive(Debug, Error)]
pub enum ModelError {
    /// An element with no matching declaration under a parent that does not
    /// accept arbitrary extensions.
    #[error("Undeclared extension {name} in {parent}")]
    UndeclaredExtension { parent: String, name: QName },

    /// A second, conflicting declaration for the same parent and name.
    #[error("Duplicate declaration of {name} in {parent}: already bound to {existing}, not {requested}")]
    DuplicateDeclaration {
        parent: String,
        name: QName,
        existing: String,
        requested: String,
    },

    /// Singleton/repeatable misuse.
    #[error("Cardinality violation for {extension}: {message}")]
    Cardinality { extension: String, message: String },

    /// Mutation of a locked entity.
    #[error("Cannot modify locked {target}")]
    ImmutableState { target: String },

    /// Two matching adaptors where neither specializes the other.
    #[error("Ambiguous adaptation: {first} and {second} both match and neither is narrower")]
    AmbiguousAdaptation { first: String, second: String },

    /// A mandatory attribute or child is absent at end of element.
    #[error("Missing required {field} in {element}")]
    RequiredFieldMissing { element: QName, field: String },

    /// Malformed attribute value, content or document structure.
    #[error("Invalid {kind}: {message}")]
    Invalid { kind: &'static str, message: String },

    /// Tokenizer or writer failure.
    #[error("XML error: {0}")]
    Xml(String),

    /// The event stream ended inside an open element.
    #[error("Unexpected end of document inside {0}")]
    UnexpectedEof(QName),

    /// Nesting deeper than the configured limit.
    #[error("Element nesting exceeds the limit of {0}")]
    DepthExceeded(usize),
}

impl ModelError {
    /// Create an XML error.
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml(message.into())
    }

    pub fn undeclared(parent: impl Into<String>, name: QName) -> Self {
        Self::UndeclaredExtension {
            parent: parent.into(),
            name,
        }
    }

    pub fn cardinality(extension: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Cardinality {
            extension: extension.into(),
            message: message.into(),
        }
    }

    pub fn immutable(target: impl Into<String>) -> Self {
        Self::ImmutableState {
            target: target.into(),
        }
    }

    /// Create a missing attribute error.
    pub fn missing_attribute(element: QName, attribute: &str) -> Self {
        Self::RequiredFieldMissing {
            element,
            field: format!("attribute '{attribute}'"),
        }
    }

    /// Create a missing child element error.
    pub fn missing_element(element: QName, child: &QName) -> Self {
        Self::RequiredFieldMissing {
            element,
            field: format!("element {child}"),
        }
    }

    /// Create an invalid attribute error.
    pub fn invalid_attribute(message: impl Into<String>) -> Self {
        Self::Invalid {
            kind: "attribute",
            message: message.into(),
        }
    }

    /// Create an invalid content error.
    pub fn invalid_content(message: impl Into<String>) -> Self {
        Self::Invalid {
            kind: "content",
            message: message.into(),
        }
    }

    /// Create an invalid declaration error.
    pub fn invalid_declaration(message: impl Into<String>) -> Self {
        Self::Invalid {
            kind: "declaration",
            message: message.into(),
        }
    }

    /// Create an invalid document error.
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::Invalid {
            kind: "document",
            message: message.into(),
        }
    }
}
