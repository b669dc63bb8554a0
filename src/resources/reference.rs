//! Resource reference syntax
//!
//! `@[package:]type/name` points at a value or document resource,
//! `?[package:][type/]name` at a theme attribute. `@null` and `@empty` are
//! literals. Values that have already been resolved to a document hash carry
//! the `@@` marker and are never treated as references again.

use regex::Regex;
use std::sync::OnceLock;

/// Package name of the platform resources
pub const FRAMEWORK_PACKAGE: &str = "android";

/// Marker prefix of a resolved document hash
pub const POINTER_MARKER: &str = "@@";

const UNKNOWN_PREFIX: &str = "!!unknown(";

/// A parsed reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    Value {
        package: Option<&'a str>,
        resource_type: &'a str,
        name: &'a str,
    },
    Attribute {
        package: Option<&'a str>,
        name: &'a str,
    },
}

fn value_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^@[*+]?(?:([\w.]+):)?([\w-]+)/([^/\\]+)$").expect("valid value reference pattern")
    })
}

fn attribute_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\?\*?(?:([\w.]+):)?(?:[\w-]+/)?([^/]+)$")
            .expect("valid attribute reference pattern")
    })
}

impl<'a> Reference<'a> {
    /// Parse a reference string, `None` for literals and malformed references
    pub fn parse(value: &'a str) -> Option<Self> {
        if !is_reference(value) {
            return None;
        }

        if value.starts_with('@') {
            let caps = value_pattern().captures(value)?;
            return Some(Reference::Value {
                package: caps.get(1).map(|m| m.as_str()),
                resource_type: caps.get(2)?.as_str(),
                name: caps.get(3)?.as_str(),
            });
        }

        let caps = attribute_pattern().captures(value)?;
        Some(Reference::Attribute {
            package: caps.get(1).map(|m| m.as_str()),
            name: caps.get(2)?.as_str(),
        })
    }

    pub fn package(&self) -> Option<&'a str> {
        match self {
            Reference::Value { package, .. } | Reference::Attribute { package, .. } => *package,
        }
    }

    pub fn is_framework(&self) -> bool {
        self.package() == Some(FRAMEWORK_PACKAGE)
    }
}

/// Whether a value denotes another resource rather than a literal
pub fn is_reference(value: &str) -> bool {
    if value == "@null" || value == "@empty" || is_pointer(value) {
        return false;
    }
    value.starts_with('@') || value.starts_with('?')
}

pub fn is_attribute_reference(value: &str) -> bool {
    value.starts_with('?')
}

/// Sentinel for a reference that could not be resolved
pub fn unknown(origin: &str) -> String {
    format!("{UNKNOWN_PREFIX}{origin})")
}

pub fn is_unknown(value: &str) -> bool {
    value.starts_with(UNKNOWN_PREFIX)
}

/// Mark a content hash as an already resolved document
pub fn pointer(hash: &str) -> String {
    format!("{POINTER_MARKER}{hash}")
}

pub fn is_pointer(value: &str) -> bool {
    value.starts_with(POINTER_MARKER)
}

/// Rewrite an unqualified reference so that it points into `package`.
///
/// Used when framework definitions are cached: a bare `@color/white` inside
/// the framework means `@android:color/white` to every later reader.
pub fn qualify(value: &str, package: &str) -> String {
    if !is_reference(value) || Reference::parse(value).and_then(|r| r.package()).is_some() {
        return value.to_string();
    }
    let (sigil, rest) = value.split_at(1);
    let (private, rest) = match rest.strip_prefix('*') {
        Some(stripped) => ("*", stripped),
        None => ("", rest),
    };
    format!("{sigil}{private}{package}:{rest}")
}
