use crate::parser::xml::XmlError;
use std::path::PathBuf;
use thiserror::Error;

/// Resolution errors
#[derive(Error, Debug)]
pub enum ResolveError {
    /// A binding set ended up empty although every resolution path
    /// substitutes the unknown sentinel. Indicates a resolver defect.
    #[error("Reference {reference} resolved to no value in {file}")]
    EmptyBinding { reference: String, file: String },
    #[error("{file} expands to {count} combinations (limit {limit})")]
    TooManyCombinations { file: String, count: u128, limit: usize },
    #[error("Invalid XML in {file}: {source}")]
    Xml {
        file: String,
        #[source]
        source: XmlError,
    },
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ResolveError {
    /// Whether the error must abort the run instead of skipping one document
    pub fn is_fatal(&self) -> bool {
        matches!(self, ResolveError::EmptyBinding { .. })
    }
}
