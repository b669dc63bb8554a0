//! Value Store, Attribute Store and the framework interpolator index
//!
//! All three map a name to every definition found for it. A name defined in
//! several files (per locale, per configuration) keeps all of its values as
//! alternative bindings; nothing overrides anything.

use super::reference::{qualify, FRAMEWORK_PACKAGE};
use crate::parser::xml::ValueDefinitions;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::trace;

/// Simple resource types kept in the Value Store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    String,
    Color,
    Bool,
    Dimen,
    Integer,
}

impl ResourceType {
    pub const ALL: [ResourceType; 5] = [
        ResourceType::String,
        ResourceType::Color,
        ResourceType::Bool,
        ResourceType::Dimen,
        ResourceType::Integer,
    ];

    /// Map a type name to a stored type, `None` for anything else
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(ResourceType::String),
            "color" => Some(ResourceType::Color),
            "bool" => Some(ResourceType::Bool),
            "dimen" => Some(ResourceType::Dimen),
            "integer" => Some(ResourceType::Integer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::String => "string",
            ResourceType::Color => "color",
            ResourceType::Bool => "bool",
            ResourceType::Dimen => "dimen",
            ResourceType::Integer => "integer",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution scope of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Resolving the platform resources themselves
    Framework,
    /// Resolving an application on top of the cached framework
    Application { package: Option<String> },
}

impl Scope {
    /// Whether a package qualifier refers to the resources of this run
    pub fn is_local(&self, package: &str) -> bool {
        match self {
            Scope::Framework => package == FRAMEWORK_PACKAGE,
            Scope::Application { package: own } => own.as_deref() == Some(package),
        }
    }

    /// Store key of a possibly package-qualified name
    pub fn key(&self, package: Option<&str>, name: &str) -> String {
        match package {
            Some(p) if !self.is_local(p) => format!("{p}:{name}"),
            _ => name.to_string(),
        }
    }

    /// Store key of a name as written in a definition (`android:colorAccent`)
    pub fn key_for_written(&self, written: &str) -> String {
        match written.split_once(':') {
            Some((package, name)) => self.key(Some(package), name),
            None => written.to_string(),
        }
    }
}

/// Prefix a key with the framework package unless it already carries one
fn framework_key(key: &str) -> String {
    if key.contains(':') {
        key.to_string()
    } else {
        format!("{FRAMEWORK_PACKAGE}:{key}")
    }
}

fn dedup_values(values: &mut Vec<String>) {
    let unique: BTreeSet<String> = values.drain(..).collect();
    values.extend(unique);
}

/// Simple value definitions by type and name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueStore {
    types: BTreeMap<ResourceType, BTreeMap<String, Vec<String>>>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, resource_type: ResourceType, name: impl Into<String>, value: impl Into<String>) {
        self.types
            .entry(resource_type)
            .or_default()
            .entry(name.into())
            .or_default()
            .push(value.into());
    }

    pub fn get(&self, resource_type: ResourceType, name: &str) -> Option<&[String]> {
        self.types
            .get(&resource_type)
            .and_then(|names| names.get(name))
            .map(|v| v.as_slice())
    }

    pub fn contains(&self, resource_type: ResourceType, name: &str) -> bool {
        self.get(resource_type, name).is_some()
    }

    /// Iterate `(type, name, values)`
    pub fn iter(&self) -> impl Iterator<Item = (ResourceType, &str, &[String])> {
        self.types.iter().flat_map(|(t, names)| {
            names
                .iter()
                .map(move |(name, values)| (*t, name.as_str(), values.as_slice()))
        })
    }

    pub fn len(&self) -> usize {
        self.types.values().map(|names| names.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collapse duplicate definitions of every name
    pub fn dedup(&mut self) {
        for names in self.types.values_mut() {
            names.values_mut().for_each(dedup_values);
        }
    }

    /// Add every definition of `other` as an alternative binding
    pub fn merge(&mut self, other: ValueStore) {
        for (resource_type, names) in other.types {
            let target = self.types.entry(resource_type).or_default();
            for (name, values) in names {
                target.entry(name).or_default().extend(values);
            }
        }
    }

    /// Replace the bindings of every name
    pub fn rewrite<F>(&mut self, mut f: F)
    where
        F: FnMut(ResourceType, &str, &[String]) -> Vec<String>,
    {
        for (resource_type, names) in self.types.iter_mut() {
            for (name, values) in names.iter_mut() {
                *values = f(*resource_type, name, values);
            }
        }
    }

    /// Copy with every key prefixed by the framework package
    pub fn namespaced(&self) -> Self {
        let types = self
            .types
            .iter()
            .map(|(t, names)| {
                let names = names
                    .iter()
                    .map(|(name, values)| {
                        let values = values.iter().map(|v| qualify(v, FRAMEWORK_PACKAGE)).collect();
                        (framework_key(name), values)
                    })
                    .collect();
                (*t, names)
            })
            .collect();
        Self { types }
    }
}

/// Theme attribute bindings harvested from `<style>` items
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeStore {
    attributes: BTreeMap<String, Vec<String>>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.entry(name.into()).or_default().push(value.into());
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.attributes.get(name).map(|v| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.attributes
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn dedup(&mut self) {
        self.attributes.values_mut().for_each(dedup_values);
    }

    pub fn merge(&mut self, other: AttributeStore) {
        for (name, values) in other.attributes {
            self.attributes.entry(name).or_default().extend(values);
        }
    }

    pub fn rewrite<F>(&mut self, mut f: F)
    where
        F: FnMut(&str, &[String]) -> Vec<String>,
    {
        for (name, values) in self.attributes.iter_mut() {
            *values = f(name, values);
        }
    }

    pub fn namespaced(&self) -> Self {
        let attributes = self
            .attributes
            .iter()
            .map(|(name, values)| {
                let values = values.iter().map(|v| qualify(v, FRAMEWORK_PACKAGE)).collect();
                (framework_key(name), values)
            })
            .collect();
        Self { attributes }
    }
}

/// Content hashes of every resolved variant of each framework interpolator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterpolatorIndex {
    interpolators: BTreeMap<String, BTreeSet<String>>,
    /// Hashes of variants that contain an unknown sentinel
    #[serde(default)]
    approximate: BTreeSet<String>,
}

impl InterpolatorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, hash: impl Into<String>) {
        self.interpolators.entry(name.into()).or_default().insert(hash.into());
    }

    pub fn get(&self, name: &str) -> Option<&BTreeSet<String>> {
        self.interpolators.get(name)
    }

    pub fn mark_approximate(&mut self, hash: impl Into<String>) {
        self.approximate.insert(hash.into());
    }

    pub fn is_approximate(&self, hash: &str) -> bool {
        self.approximate.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.interpolators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interpolators.is_empty()
    }

    pub fn namespaced(&self) -> Self {
        let interpolators = self
            .interpolators
            .iter()
            .map(|(name, hashes)| (framework_key(name), hashes.clone()))
            .collect();
        Self {
            interpolators,
            approximate: self.approximate.clone(),
        }
    }
}

/// Add the definitions of one values file to the stores.
///
/// Types outside [`ResourceType`] are skipped without error.
pub fn populate(
    definitions: ValueDefinitions,
    scope: &Scope,
    values: &mut ValueStore,
    attributes: &mut AttributeStore,
) {
    for def in definitions.values {
        match ResourceType::from_name(&def.resource_type) {
            Some(resource_type) => {
                values.insert(resource_type, scope.key_for_written(&def.name), def.value);
            }
            None => trace!("Skipping <{}> {}", def.resource_type, def.name),
        }
    }

    for item in definitions.style_items {
        attributes.insert(scope.key_for_written(&item.attribute), item.value);
    }
}
