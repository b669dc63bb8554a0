//! Extraction runs
//!
//! A run populates and resolves the stores, freezes them, and then
//! dereferences every complex document of the tree. Framework runs extract
//! interpolators and write the cache; application runs read the cache and
//! extract animations together with the local interpolators they use.

use crate::cache::{FrameworkCache, FrameworkSnapshot};
use crate::config::Config;
use crate::discovery::ResourceTree;
use crate::parser::xml::ValuesParser;
use crate::resources::{
    populate, resolve_initial_references, AttributeCycleDetector, AttributeStore, Dereferencer,
    DocumentFilter, Emitter, InterpolatorIndex, ReferenceResolver, ResolveError, ResourceEntry,
    ResourceKind, Scope, ValueStore, FRAMEWORK_PACKAGE,
};
use indicatif::{ProgressBar, ProgressStyle};
use miette::{IntoDiagnostic, Result, WrapErr};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Counters of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionSummary {
    pub value_files: usize,
    pub unreadable_value_files: usize,
    pub attribute_cycles: usize,
    pub documents_scanned: usize,
    /// Documents using tags outside the filter
    pub filtered: usize,
    pub unparsable: usize,
    pub too_many_combinations: usize,
    pub animations: usize,
    pub interpolators: usize,
    /// Entries containing at least one unknown sentinel
    pub approximate: usize,
}

impl ExtractionSummary {
    fn count_entries(&mut self, entries: &[ResourceEntry]) {
        for entry in entries {
            match entry.kind {
                ResourceKind::Animation => self.animations += 1,
                ResourceKind::Interpolator => self.interpolators += 1,
            }
            if entry.approximate {
                self.approximate += 1;
            }
        }
    }

    pub fn skipped(&self) -> usize {
        self.filtered + self.unparsable + self.too_many_combinations
    }
}

/// Result of a run
#[derive(Debug)]
pub struct Extraction {
    pub package: String,
    pub entries: Vec<ResourceEntry>,
    pub summary: ExtractionSummary,
}

/// Hashes emitted for each processed file
type FileHashes = Vec<(PathBuf, std::result::Result<Vec<String>, ResolveError>)>;

/// Drives framework and application runs over one resource tree
pub struct Extractor<'a> {
    config: &'a Config,
    tree: ResourceTree,
    show_progress: bool,
}

impl<'a> Extractor<'a> {
    pub fn new(config: &'a Config, root: &Path) -> Result<Self> {
        Ok(Self {
            config,
            tree: ResourceTree::open(root)?,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn tree(&self) -> &ResourceTree {
        &self.tree
    }

    /// Resolve the platform resources, extract its interpolators and write the cache
    pub fn run_framework(&self) -> Result<Extraction> {
        let start = Instant::now();
        let scope = Scope::Framework;
        let mut summary = ExtractionSummary::default();

        let mut values = ValueStore::new();
        let mut attributes = AttributeStore::new();
        self.load_values(&scope, &mut values, &mut attributes, &mut summary)?;
        let empty_index = InterpolatorIndex::new();
        self.resolve_stores(&scope, &mut values, &mut attributes, &empty_index, &mut summary);

        let emitter = Emitter::new();
        let processed = {
            let resolver = self.resolver(&values, &attributes, &empty_index, &scope);
            let dereferencer = Dereferencer::new(resolver, &self.tree, &emitter)
                .with_max_combinations(self.config.resolver.max_combinations);
            self.dereference_all(
                &dereferencer,
                ResourceKind::Interpolator,
                &self.config.filters.interpolator_filter(),
                &mut summary,
            )?
        };

        let entries = emitter.into_entries();
        let mut interpolators = InterpolatorIndex::new();
        for entry in entries.iter().filter(|e| e.approximate) {
            interpolators.mark_approximate(entry.hash.as_str());
        }
        for (path, hashes) in &processed {
            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            for hash in hashes {
                interpolators.insert(name.as_str(), hash.as_str());
            }
        }

        let snapshot = FrameworkSnapshot {
            values,
            attributes,
            interpolators,
        };
        FrameworkCache::new(&self.config.cache_dir)
            .save(&snapshot)
            .into_diagnostic()
            .wrap_err("Failed to write the framework cache")?;

        summary.count_entries(&entries);
        info!(
            "Framework resolved in {:.2}s: {} interpolators",
            start.elapsed().as_secs_f64(),
            summary.interpolators
        );

        Ok(Extraction {
            package: FRAMEWORK_PACKAGE.to_string(),
            entries,
            summary,
        })
    }

    /// Extract the animations of an application on top of the cached framework
    pub fn run_application(&self) -> Result<Extraction> {
        let start = Instant::now();
        let cache = FrameworkCache::new(&self.config.cache_dir);
        let FrameworkSnapshot {
            mut values,
            mut attributes,
            interpolators,
        } = cache
            .load()
            .into_diagnostic()
            .wrap_err("Cannot analyze an application without the framework cache")?;

        let scope = Scope::Application {
            package: self.config.package.clone(),
        };
        let mut summary = ExtractionSummary::default();

        self.load_values(&scope, &mut values, &mut attributes, &mut summary)?;
        self.resolve_stores(&scope, &mut values, &mut attributes, &interpolators, &mut summary);

        let emitter = Emitter::new();
        {
            let resolver = self.resolver(&values, &attributes, &interpolators, &scope);
            let dereferencer = Dereferencer::new(resolver, &self.tree, &emitter)
                .with_max_combinations(self.config.resolver.max_combinations);
            self.dereference_all(
                &dereferencer,
                ResourceKind::Animation,
                &self.config.filters.tween_filter(),
                &mut summary,
            )?;
        }

        let entries = emitter.into_entries();
        summary.count_entries(&entries);
        info!(
            "Application resolved in {:.2}s: {} animations, {} interpolators",
            start.elapsed().as_secs_f64(),
            summary.animations,
            summary.interpolators
        );

        Ok(Extraction {
            package: self.package_name(),
            entries,
            summary,
        })
    }

    fn package_name(&self) -> String {
        self.config.package.clone().unwrap_or_else(|| {
            self.tree
                .root()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }

    fn resolver<'s>(
        &self,
        values: &'s ValueStore,
        attributes: &'s AttributeStore,
        interpolators: &'s InterpolatorIndex,
        scope: &'s Scope,
    ) -> ReferenceResolver<'s> {
        ReferenceResolver::new(values, attributes, interpolators, scope)
            .with_max_depth(self.config.resolver.max_depth)
    }

    /// Populate the stores from every values file of the tree
    fn load_values(
        &self,
        scope: &Scope,
        values: &mut ValueStore,
        attributes: &mut AttributeStore,
        summary: &mut ExtractionSummary,
    ) -> Result<()> {
        info!("Parsing value files...");
        let parser = ValuesParser::new();

        for path in self.tree.value_files()? {
            summary.value_files += 1;
            let parsed = fs::read_to_string(&path)
                .into_diagnostic()
                .and_then(|text| parser.parse(&text).into_diagnostic());
            match parsed {
                Ok(definitions) => populate(definitions, scope, values, attributes),
                Err(e) => {
                    warn!("Skipping value file {}: {}", path.display(), e);
                    summary.unreadable_value_files += 1;
                }
            }
        }

        values.dedup();
        attributes.dedup();
        debug!("{} values and {} attributes defined", values.len(), attributes.len());
        Ok(())
    }

    fn resolve_stores(
        &self,
        scope: &Scope,
        values: &mut ValueStore,
        attributes: &mut AttributeStore,
        interpolators: &InterpolatorIndex,
        summary: &mut ExtractionSummary,
    ) {
        summary.attribute_cycles = AttributeCycleDetector::new().report(attributes, scope);
        resolve_initial_references(values, attributes, interpolators, scope, self.config.resolver.max_depth);
    }

    /// Dereference every complex document, returning the hashes per file.
    ///
    /// Only an empty binding set aborts the run; every other failure skips
    /// the offending document.
    fn dereference_all(
        &self,
        dereferencer: &Dereferencer<'_>,
        kind: ResourceKind,
        filter: &DocumentFilter,
        summary: &mut ExtractionSummary,
    ) -> Result<Vec<(PathBuf, Vec<String>)>> {
        let files = self.tree.xml_files();
        summary.documents_scanned = files.len();
        info!("Dereferencing {} documents...", files.len());

        let process = |path: &PathBuf| {
            let outcome = dereferencer.process_file(kind, path, filter, 0);
            match outcome {
                Err(e) if e.is_fatal() => Err(e),
                outcome => Ok((path.clone(), outcome)),
            }
        };

        let results: std::result::Result<FileHashes, ResolveError> = if self.config.resolver.parallel {
            files.par_iter().map(process).collect()
        } else {
            let pb = self.progress_bar(files.len());
            let results = files
                .iter()
                .map(|path| {
                    let result = process(path);
                    pb.inc(1);
                    result
                })
                .collect();
            pb.finish_and_clear();
            results
        };
        let results = results.into_diagnostic().wrap_err("Resolution failed")?;

        let mut processed = Vec::new();
        for (path, outcome) in results {
            match outcome {
                Ok(hashes) if hashes.is_empty() => summary.filtered += 1,
                Ok(hashes) => processed.push((path, hashes)),
                Err(e @ ResolveError::TooManyCombinations { .. }) => {
                    warn!("Skipping {}", e);
                    summary.too_many_combinations += 1;
                }
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    summary.unparsable += 1;
                }
            }
        }

        debug!(
            "{} documents expanded, {} skipped",
            processed.len(),
            summary.skipped()
        );
        Ok(processed)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb
    }
}
