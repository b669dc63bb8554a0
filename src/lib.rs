//! animextract - Fully dereferenced animations from decompiled Android resources
//!
//! This library resolves the resource references of a decompiled resource
//! tree and expands every tween animation and interpolator into one document
//! per combination of the values its references can take.
//!
//! # Architecture
//!
//! The extraction pipeline consists of:
//! 1. **Discovery** - Locate value files and complex documents under `res/`
//! 2. **Population** - Fill the Value and Attribute Stores from value files
//! 3. **Initial resolution** - Resolve both stores in place, then freeze them
//! 4. **Dereferencing** - Expand each document into its variants
//! 5. **Emission** - Hash and deduplicate the serialized variants
//! 6. **Reporting** - Hand the entries to a sink
//!
//! The platform resources are resolved once and cached; application runs
//! start from that cache.

pub mod cache;
pub mod config;
pub mod discovery;
pub mod extract;
pub mod parser;
pub mod report;
pub mod resources;

pub use cache::{CacheError, FrameworkCache, FrameworkSnapshot};
pub use config::Config;
pub use discovery::ResourceTree;
pub use extract::{Extraction, ExtractionSummary, Extractor};
pub use report::{EntrySink, JsonSink, ReportFormat, Reporter, TerminalReporter};
pub use resources::{ResolveError, ResourceEntry, ResourceKind};
