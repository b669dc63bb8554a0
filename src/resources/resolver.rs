//! Reference resolution
//!
//! Turns a reference into the finite set of terminal values it can denote,
//! given the Value Store, the Attribute Store and the framework interpolator
//! index. Resolution never fails on bad input: anything that cannot be
//! followed becomes an `!!unknown(...)` sentinel so the surrounding pipeline
//! keeps moving. The only errors are those raised while dereferencing a
//! referenced document.

use super::error::ResolveError;
use super::reference::{
    is_attribute_reference, is_reference, pointer, unknown, Reference, FRAMEWORK_PACKAGE,
};
use super::store::{AttributeStore, InterpolatorIndex, ResourceType, Scope, ValueStore};
use std::collections::BTreeSet;
use tracing::{debug, info, trace, warn};

/// Default recursion ceiling for reference chains
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Value Store keys on the current resolution path
type ValueChain = Vec<(ResourceType, String)>;

/// Source of dereferenced documents for references into complex resources
/// (e.g. `@interpolator/fast_out_slow_in`) of the current resource tree.
pub trait DocumentResolver {
    /// Content hashes of every variant of the document `type/name`
    fn resolve_document(
        &self,
        resource_type: &str,
        name: &str,
        depth: usize,
    ) -> Result<Vec<String>, ResolveError>;
}

/// Resolves references against frozen stores
#[derive(Debug, Clone, Copy)]
pub struct ReferenceResolver<'a> {
    values: &'a ValueStore,
    attributes: &'a AttributeStore,
    interpolators: &'a InterpolatorIndex,
    scope: &'a Scope,
    max_depth: usize,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(
        values: &'a ValueStore,
        attributes: &'a AttributeStore,
        interpolators: &'a InterpolatorIndex,
        scope: &'a Scope,
    ) -> Self {
        Self {
            values,
            attributes,
            interpolators,
            scope,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn interpolators(&self) -> &'a InterpolatorIndex {
        self.interpolators
    }

    /// Chase `?`-indirections only.
    ///
    /// The result may still contain `@` references. An attribute missing from
    /// the store yields an empty set; a chain that loops back onto itself or
    /// exceeds the depth ceiling yields the unknown sentinel.
    pub fn resolve_attribute(&self, reference: &str, depth: usize) -> BTreeSet<String> {
        let mut chain = Vec::new();
        self.chase_attribute(reference, depth, &mut chain)
    }

    fn chase_attribute(&self, reference: &str, depth: usize, chain: &mut Vec<String>) -> BTreeSet<String> {
        if !is_attribute_reference(reference) {
            return BTreeSet::from([reference.to_string()]);
        }
        if depth > self.max_depth {
            warn!("Attribute chain of {} exceeds depth {}", reference, self.max_depth);
            return BTreeSet::from([unknown(reference)]);
        }
        let Some(Reference::Attribute { package, name }) = Reference::parse(reference) else {
            return BTreeSet::from([unknown(reference)]);
        };

        let key = self.scope.key(package, name);
        if chain.contains(&key) {
            debug!("Attribute cycle through {}", key);
            return BTreeSet::from([unknown(reference)]);
        }
        let Some(bound) = self.attributes.get(&key) else {
            trace!("Attribute {} is not defined", key);
            return BTreeSet::new();
        };

        chain.push(key);
        let mut resolved = BTreeSet::new();
        for value in bound {
            if is_attribute_reference(value) {
                resolved.extend(self.chase_attribute(value, depth + 1, chain));
            } else {
                resolved.insert(value.clone());
            }
        }
        chain.pop();
        resolved
    }

    /// Resolve an `@` reference to its terminal values.
    ///
    /// Simple types are looked up in the Value Store and followed further;
    /// anything else names a complex document. Framework documents come from
    /// the interpolator index, local ones from `documents`. Both are returned
    /// as marker-prefixed hashes. A value chain that loops back onto itself
    /// yields the unknown sentinel.
    pub fn resolve_value(
        &self,
        reference: &str,
        documents: Option<&dyn DocumentResolver>,
        depth: usize,
    ) -> Result<BTreeSet<String>, ResolveError> {
        self.follow_value(reference, documents, depth, &mut Vec::new())
    }

    fn follow_value(
        &self,
        reference: &str,
        documents: Option<&dyn DocumentResolver>,
        depth: usize,
        chain: &mut ValueChain,
    ) -> Result<BTreeSet<String>, ResolveError> {
        if !is_reference(reference) {
            return Ok(BTreeSet::from([reference.to_string()]));
        }
        if depth > self.max_depth {
            warn!("Value chain of {} exceeds depth {}", reference, self.max_depth);
            return Ok(BTreeSet::from([unknown(reference)]));
        }

        match Reference::parse(reference) {
            Some(Reference::Value {
                package,
                resource_type,
                name,
            }) => match ResourceType::from_name(resource_type) {
                Some(simple) => {
                    let key = self.scope.key(package, name);
                    self.resolve_simple(reference, simple, key, documents, depth, chain)
                }
                None => self.resolve_document(reference, resource_type, package, name, documents, depth),
            },
            Some(Reference::Attribute { .. }) => self.follow_reference(reference, documents, depth, chain),
            None => Ok(BTreeSet::from([unknown(reference)])),
        }
    }

    fn resolve_simple(
        &self,
        reference: &str,
        resource_type: ResourceType,
        key: String,
        documents: Option<&dyn DocumentResolver>,
        depth: usize,
        chain: &mut ValueChain,
    ) -> Result<BTreeSet<String>, ResolveError> {
        if chain.iter().any(|(t, k)| *t == resource_type && *k == key) {
            debug!("Value cycle through {} {}", resource_type, key);
            return Ok(BTreeSet::from([unknown(reference)]));
        }
        let Some(bound) = self.values.get(resource_type, &key) else {
            trace!("{} {} is not defined", resource_type, key);
            return Ok(BTreeSet::from([unknown(reference)]));
        };

        chain.push((resource_type, key));
        let mut resolved = BTreeSet::new();
        for value in bound {
            if is_reference(value) {
                resolved.extend(self.follow_reference(value, documents, depth + 1, chain)?);
            } else {
                resolved.insert(value.clone());
            }
        }
        chain.pop();
        Ok(resolved)
    }

    fn resolve_document(
        &self,
        reference: &str,
        resource_type: &str,
        package: Option<&str>,
        name: &str,
        documents: Option<&dyn DocumentResolver>,
        depth: usize,
    ) -> Result<BTreeSet<String>, ResolveError> {
        let hashes: Vec<String> = match package {
            Some(p) if !self.scope.is_local(p) => {
                if p != FRAMEWORK_PACKAGE {
                    debug!("No resources available for package {} ({})", p, reference);
                    return Ok(BTreeSet::from([unknown(reference)]));
                }
                let key = self.scope.key(package, name);
                self.interpolators
                    .get(&key)
                    .map(|hashes| hashes.iter().cloned().collect())
                    .unwrap_or_default()
            }
            _ => match documents {
                Some(documents) => documents.resolve_document(resource_type, name, depth + 1)?,
                None => {
                    trace!("No document resolver for {}", reference);
                    Vec::new()
                }
            },
        };

        if hashes.is_empty() {
            return Ok(BTreeSet::from([unknown(reference)]));
        }
        Ok(hashes.iter().map(|h| pointer(h)).collect())
    }

    /// Resolve any reference, attribute or value, to terminal values.
    ///
    /// Never returns an empty set: an attribute that is not bound anywhere
    /// resolves to the unknown sentinel.
    pub fn resolve_reference(
        &self,
        reference: &str,
        documents: Option<&dyn DocumentResolver>,
        depth: usize,
    ) -> Result<BTreeSet<String>, ResolveError> {
        self.follow_reference(reference, documents, depth, &mut Vec::new())
    }

    fn follow_reference(
        &self,
        reference: &str,
        documents: Option<&dyn DocumentResolver>,
        depth: usize,
        chain: &mut ValueChain,
    ) -> Result<BTreeSet<String>, ResolveError> {
        if !is_attribute_reference(reference) {
            return self.follow_value(reference, documents, depth, chain);
        }

        let bound = self.resolve_attribute(reference, depth);
        if bound.is_empty() {
            return Ok(BTreeSet::from([unknown(reference)]));
        }

        let mut resolved = BTreeSet::new();
        for value in bound {
            if is_reference(&value) {
                resolved.extend(self.follow_value(&value, documents, depth + 1, chain)?);
            } else {
                resolved.insert(value);
            }
        }
        Ok(resolved)
    }
}

/// Rewrite both stores so every binding is resolved.
///
/// Attributes are resolved first, chasing `?`-indirections only; values are
/// then resolved through attributes and other values. Afterwards every value
/// binding is terminal and every attribute binding is either terminal or an
/// `@` reference.
pub fn resolve_initial_references(
    values: &mut ValueStore,
    attributes: &mut AttributeStore,
    interpolators: &InterpolatorIndex,
    scope: &Scope,
    max_depth: usize,
) {
    info!("Resolving initial references");

    let raw_attributes = attributes.clone();
    {
        let resolver = ReferenceResolver::new(values, &raw_attributes, interpolators, scope)
            .with_max_depth(max_depth);
        attributes.rewrite(|_, bound| {
            let mut resolved = BTreeSet::new();
            for value in bound {
                if !is_attribute_reference(value) {
                    resolved.insert(value.clone());
                    continue;
                }
                let chased = resolver.resolve_attribute(value, 0);
                if chased.is_empty() {
                    resolved.insert(unknown(value));
                } else {
                    resolved.extend(chased);
                }
            }
            resolved.into_iter().collect()
        });
    }

    let raw_values = values.clone();
    let resolver = ReferenceResolver::new(&raw_values, attributes, interpolators, scope)
        .with_max_depth(max_depth);
    values.rewrite(|resource_type, name, bound| {
        let mut resolved = BTreeSet::new();
        for value in bound {
            match resolver.resolve_reference(value, None, 0) {
                Ok(terminal) => resolved.extend(terminal),
                Err(e) => {
                    warn!("Failed to resolve {} {}: {}", resource_type, name, e);
                    resolved.insert(unknown(value));
                }
            }
        }
        resolved.into_iter().collect()
    });

    debug!(
        "Resolved {} values and {} attributes",
        values.len(),
        attributes.len()
    );
}
