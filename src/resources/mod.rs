//! Resource reference resolution
//!
//! The pipeline runs in two phases. First the Value and Attribute Stores are
//! populated from the values files and resolved in place. The stores are then
//! frozen and every complex document is expanded by the [`Dereferencer`],
//! possibly from many workers, into the shared [`Emitter`].

mod cycles;
mod dereference;
mod emitter;
mod entry;
mod error;
mod reference;
mod resolver;
mod store;

pub use cycles::{AttributeCycle, AttributeCycleDetector};
pub use dereference::{
    combination_count, combinations, ComplexDocument, Dereferencer, DocumentFilter,
    DEFAULT_MAX_COMBINATIONS, INTERPOLATOR_TAGS, TWEEN_ATTRIBUTES, TWEEN_TAGS,
};
pub use emitter::{content_hash, Emitter};
pub use entry::{ResourceEntry, ResourceKind};
pub use error::ResolveError;
pub use reference::{
    is_attribute_reference, is_pointer, is_reference, is_unknown, pointer, qualify, unknown,
    Reference, FRAMEWORK_PACKAGE, POINTER_MARKER,
};
pub use resolver::{resolve_initial_references, DocumentResolver, ReferenceResolver, DEFAULT_MAX_DEPTH};
pub use store::{populate, AttributeStore, InterpolatorIndex, ResourceType, Scope, ValueStore};
