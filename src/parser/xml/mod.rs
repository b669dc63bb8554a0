//! XML handling for decompiled Android resources
//!
//! `document` holds the element tree used for complex resources (animations,
//! interpolators) together with its deterministic serializer. `values` reads
//! `res/values*/` files into raw value and style definitions.

mod document;
mod values;

pub use document::{local_name, parse_document, serialize_document, XmlAttribute, XmlElement, XmlNode};
pub use values::{StyleItem, ValueDefinition, ValueDefinitions, ValuesParser};

use thiserror::Error;

/// XML errors
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Malformed XML: {0}")]
    Syntax(#[from] quick_xml::Error),
    #[error("Document has no root element")]
    MissingRoot,
    #[error("Document has more than one root element")]
    MultipleRoots,
    #[error("Unbalanced start and end tags")]
    UnbalancedTags,
    #[error("Failed to serialize XML: {0}")]
    Write(String),
}
