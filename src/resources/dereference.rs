//! Document dereferencing
//!
//! A complex document (animation, interpolator) is expanded into one copy per
//! combination of the values its references can take. Every copy is
//! serialized, hashed and handed to the [`Emitter`].

use super::emitter::{content_hash, Emitter};
use super::entry::{ResourceEntry, ResourceKind};
use super::error::ResolveError;
use super::reference::{is_reference, is_unknown, POINTER_MARKER};
use super::resolver::{DocumentResolver, ReferenceResolver};
use crate::discovery::ResourceTree;
use crate::parser::xml::{local_name, parse_document, serialize_document, XmlElement, XmlError};
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, trace, warn};

/// Default limit of variants generated from a single document
pub const DEFAULT_MAX_COMBINATIONS: usize = 4096;

/// Tags of tween animations
pub const TWEEN_TAGS: &[&str] = &["alpha", "scale", "translate", "rotate", "set"];

/// Attributes of tween animations that take part in the expansion
pub const TWEEN_ATTRIBUTES: &[&str] = &[
    "duration",
    "startOffset",
    "fillEnabled",
    "fillBefore",
    "fillAfter",
    "repeatCount",
    "repeatMode",
    "zAdjustment",
    "backdropColor",
    "detachWallpaper",
    "showWallpaper",
    "hasRoundedCorners",
    "interpolator",
    "shareInterpolator",
    "fromAlpha",
    "toAlpha",
    "fromXScale",
    "toXScale",
    "fromYScale",
    "toYScale",
    "pivotX",
    "pivotY",
    "fromDegrees",
    "toDegrees",
    "fromXDelta",
    "toXDelta",
    "fromYDelta",
    "toYDelta",
];

/// Tags of the platform interpolators
pub const INTERPOLATOR_TAGS: &[&str] = &[
    "accelerateDecelerateInterpolator",
    "accelerateInterpolator",
    "anticipateInterpolator",
    "anticipateOvershootInterpolator",
    "bounceInterpolator",
    "cycleInterpolator",
    "decelerateInterpolator",
    "linearInterpolator",
    "overshootInterpolator",
    "pathInterpolator",
];

/// A parsed complex resource document
#[derive(Debug, Clone)]
pub struct ComplexDocument {
    /// Source path relative to the tree root
    pub path: String,
    pub root: XmlElement,
    /// Every tag used in the document, root included
    pub tag_names: BTreeSet<String>,
    /// `(attribute, value)` pairs whose value is a reference
    pub references: BTreeSet<(String, String)>,
}

impl ComplexDocument {
    pub fn from_xml(path: impl Into<String>, text: &str) -> Result<Self, XmlError> {
        let root = parse_document(text)?;
        Ok(Self::from_root(path, root))
    }

    pub fn from_root(path: impl Into<String>, root: XmlElement) -> Self {
        let tag_names = root.tag_names();
        let mut references = BTreeSet::new();
        root.walk(&mut |element| {
            for attribute in &element.attributes {
                if is_reference(&attribute.value) {
                    references.insert((attribute.name.clone(), attribute.value.clone()));
                }
            }
        });

        Self {
            path: path.into(),
            root,
            tag_names,
            references,
        }
    }
}

/// Restricts which documents are expanded and which attributes take part.
///
/// Names are compared without their namespace prefix. `None` accepts anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub tags: Option<BTreeSet<String>>,
    pub attributes: Option<BTreeSet<String>>,
}

impl DocumentFilter {
    /// Accept every document and every attribute
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new<T, A>(tags: Option<T>, attributes: Option<A>) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        Self {
            tags: tags.map(|t| t.into_iter().map(Into::into).collect()),
            attributes: attributes.map(|a| a.into_iter().map(Into::into).collect()),
        }
    }

    /// Tween animations, expanding only their animation attributes
    pub fn tween() -> Self {
        Self::new(Some(TWEEN_TAGS.iter().copied()), Some(TWEEN_ATTRIBUTES.iter().copied()))
    }

    /// Platform interpolators with all attributes
    pub fn interpolator() -> Self {
        Self::new(Some(INTERPOLATOR_TAGS.iter().copied()), None::<Vec<String>>)
    }

    pub fn accepts_tags(&self, tags: &BTreeSet<String>) -> bool {
        match &self.tags {
            Some(allowed) => tags.iter().all(|t| allowed.contains(local_name(t))),
            None => true,
        }
    }

    pub fn considers(&self, attribute: &str) -> bool {
        match &self.attributes {
            Some(allowed) => allowed.contains(local_name(attribute)),
            None => true,
        }
    }
}

/// Number of combinations a binding set expands to
pub fn combination_count(bindings: &BTreeMap<String, BTreeSet<String>>) -> u128 {
    bindings
        .values()
        .map(|values| values.len() as u128)
        .fold(1u128, |acc, n| acc.saturating_mul(n))
}

/// Cartesian product of a binding set.
///
/// Keys are enumerated in sorted order with the last key varying fastest, so
/// the position of a combination is stable for equal inputs. No keys yield a
/// single empty combination.
pub fn combinations(bindings: &BTreeMap<String, BTreeSet<String>>) -> Vec<BTreeMap<&str, &str>> {
    let mut result = vec![BTreeMap::new()];
    for (key, values) in bindings {
        result = result
            .into_iter()
            .flat_map(|partial| {
                values.iter().map(move |value| {
                    let mut next = partial.clone();
                    next.insert(key.as_str(), value.as_str());
                    next
                })
            })
            .collect();
    }
    result
}

/// `(type, name)` of a complex document, as written in a reference
type DocumentKey = (String, String);

/// Key of the document stored at `path` (`res/interpolator-v21/fast.xml`
/// is `("interpolator", "fast")`)
fn document_key(path: &str) -> Option<DocumentKey> {
    let path = Path::new(path);
    let name = path.file_stem()?.to_str()?;
    let dir = path.parent()?.file_name()?.to_str()?;
    let resource_type = dir.split('-').next()?;
    Some((resource_type.to_string(), name.to_string()))
}

/// Expands documents against frozen stores and emits the variants
pub struct Dereferencer<'a> {
    resolver: ReferenceResolver<'a>,
    tree: &'a ResourceTree,
    emitter: &'a Emitter,
    max_combinations: usize,
    /// Hashes of local documents already dereferenced, by `(type, name)`
    documents: Mutex<HashMap<DocumentKey, Vec<String>>>,
    /// Emitted hashes whose content contains an unknown sentinel
    approximate: Mutex<HashSet<String>>,
}

impl<'a> Dereferencer<'a> {
    pub fn new(resolver: ReferenceResolver<'a>, tree: &'a ResourceTree, emitter: &'a Emitter) -> Self {
        Self {
            resolver,
            tree,
            emitter,
            max_combinations: DEFAULT_MAX_COMBINATIONS,
            documents: Mutex::new(HashMap::new()),
            approximate: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_max_combinations(mut self, max_combinations: usize) -> Self {
        self.max_combinations = max_combinations;
        self
    }

    /// Expand one document into its variants.
    ///
    /// Returns no entries when the document uses a tag outside the filter.
    /// Entries are returned, not emitted.
    pub fn dereference(
        &self,
        kind: ResourceKind,
        document: &ComplexDocument,
        filter: &DocumentFilter,
        depth: usize,
    ) -> Result<Vec<ResourceEntry>, ResolveError> {
        let open = document_key(&document.path).into_iter().collect();
        self.expand(kind, document, filter, depth, open)
            .map(|(entries, _)| entries)
    }

    /// Parse, dereference and emit one file, returning the hashes of its variants
    pub fn process_file(
        &self,
        kind: ResourceKind,
        path: &Path,
        filter: &DocumentFilter,
        depth: usize,
    ) -> Result<Vec<String>, ResolveError> {
        let open = document_key(&self.tree.relative_path(path)).into_iter().collect();
        self.process(kind, path, filter, depth, open)
            .map(|(hashes, _)| hashes)
    }

    /// Parse, expand and emit with `open` documents on the resolution path.
    ///
    /// The flag is set when a reference to an enclosing document was cut,
    /// making the hashes specific to this path.
    fn process(
        &self,
        kind: ResourceKind,
        path: &Path,
        filter: &DocumentFilter,
        depth: usize,
        open: Vec<DocumentKey>,
    ) -> Result<(Vec<String>, bool), ResolveError> {
        let text = fs::read_to_string(path).map_err(|source| ResolveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let relative = self.tree.relative_path(path);
        let document = ComplexDocument::from_xml(relative.as_str(), &text).map_err(|source| ResolveError::Xml {
            file: relative.clone(),
            source,
        })?;

        let (entries, path_specific) = self.expand(kind, &document, filter, depth, open)?;
        let hashes = entries.iter().map(|e| e.hash.clone()).collect();
        for entry in entries {
            if entry.approximate {
                self.lock_approximate().insert(entry.hash.clone());
            }
            self.emitter.emit(entry);
        }
        Ok((hashes, path_specific))
    }

    fn expand(
        &self,
        kind: ResourceKind,
        document: &ComplexDocument,
        filter: &DocumentFilter,
        depth: usize,
        open: Vec<DocumentKey>,
    ) -> Result<(Vec<ResourceEntry>, bool), ResolveError> {
        if !filter.accepts_tags(&document.tag_names) {
            trace!("Skipping {}: unsupported tags", document.path);
            return Ok((Vec::new(), false));
        }

        let resolution = ResolutionPath {
            dereferencer: self,
            open,
            cut: Cell::new(false),
        };
        let mut bindings: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (attribute, value) in &document.references {
            if !filter.considers(attribute) || bindings.contains_key(value) {
                continue;
            }
            let resolved = self
                .resolver
                .resolve_reference(value, Some(&resolution as &dyn DocumentResolver), depth)?;
            if resolved.is_empty() {
                return Err(ResolveError::EmptyBinding {
                    reference: value.clone(),
                    file: document.path.clone(),
                });
            }
            bindings.insert(value.clone(), resolved);
        }

        let count = combination_count(&bindings);
        if count > self.max_combinations as u128 {
            return Err(ResolveError::TooManyCombinations {
                file: document.path.clone(),
                count,
                limit: self.max_combinations,
            });
        }

        let mut entries = Vec::new();
        for (index, combination) in combinations(&bindings).into_iter().enumerate() {
            let mut root = document.root.clone();
            let mut approximate = false;
            root.walk_mut(&mut |element| {
                for attribute in &mut element.attributes {
                    if !filter.considers(&attribute.name) {
                        continue;
                    }
                    if let Some(value) = combination.get(attribute.value.as_str()) {
                        approximate |= is_unknown(value) || self.points_to_approximate(value);
                        attribute.value = value.to_string();
                    }
                }
            });

            let content = serialize_document(&root).map_err(|source| ResolveError::Xml {
                file: document.path.clone(),
                source,
            })?;
            entries.push(ResourceEntry {
                kind,
                path: document.path.clone(),
                index,
                hash: content_hash(&content),
                content,
                approximate,
            });
        }

        debug!(
            "{}: {} references, {} variants",
            document.path,
            bindings.len(),
            entries.len()
        );
        Ok((entries, resolution.cut.get()))
    }

    /// Whether `value` points at a document variant that is itself approximate
    fn points_to_approximate(&self, value: &str) -> bool {
        let Some(hash) = value.strip_prefix(POINTER_MARKER) else {
            return false;
        };
        self.resolver.interpolators().is_approximate(hash) || self.lock_approximate().contains(hash)
    }

    fn lock_documents(&self) -> MutexGuard<'_, HashMap<DocumentKey, Vec<String>>> {
        self.documents.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_approximate(&self) -> MutexGuard<'_, HashSet<String>> {
        self.approximate.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Documents being dereferenced on one resolution path.
///
/// A reference to a document already open on the path resolves to nothing,
/// which the resolver turns into the unknown sentinel.
struct ResolutionPath<'d, 'a> {
    dereferencer: &'d Dereferencer<'a>,
    open: Vec<DocumentKey>,
    /// A reference to an enclosing document was cut below this point
    cut: Cell<bool>,
}

impl DocumentResolver for ResolutionPath<'_, '_> {
    fn resolve_document(&self, resource_type: &str, name: &str, depth: usize) -> Result<Vec<String>, ResolveError> {
        let key = (resource_type.to_string(), name.to_string());
        if self.open.contains(&key) {
            debug!("Document cycle through @{}/{}", resource_type, name);
            if self.open.last() != Some(&key) {
                self.cut.set(true);
            }
            return Ok(Vec::new());
        }

        let dereferencer = self.dereferencer;
        if let Some(hashes) = dereferencer.lock_documents().get(&key) {
            return Ok(hashes.clone());
        }

        let mut open = self.open.clone();
        open.push(key.clone());
        let mut hashes = Vec::new();
        let mut path_specific = false;
        for path in dereferencer.tree.reference_candidates(resource_type, name) {
            match dereferencer.process(ResourceKind::Interpolator, &path, &DocumentFilter::none(), depth, open.clone()) {
                Ok((found, specific)) => {
                    hashes.extend(found);
                    path_specific |= specific;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        if path_specific {
            self.cut.set(true);
        } else {
            dereferencer.lock_documents().insert(key, hashes.clone());
        }
        Ok(hashes)
    }
}
