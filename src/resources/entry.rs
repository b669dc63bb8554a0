use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of an emitted complex resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Animation,
    Interpolator,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Animation => f.write_str("animation"),
            ResourceKind::Interpolator => f.write_str("interpolator"),
        }
    }
}

/// One fully dereferenced document variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub kind: ResourceKind,
    /// Source file relative to the resource tree root (`res/anim/fade.xml`)
    pub path: String,
    /// Position of this variant among the combinations of its source file
    pub index: usize,
    /// Hex SHA-256 of `content`
    pub hash: String,
    /// Serialized, dereferenced XML
    pub content: String,
    /// At least one reference in this variant could not be resolved
    pub approximate: bool,
}

impl ResourceEntry {
    /// Global ordering key, independent of emission order
    pub fn ordering_key(&self) -> (ResourceKind, &str, usize) {
        (self.kind, self.path.as_str(), self.index)
    }
}
