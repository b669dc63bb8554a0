use super::EntrySink;
use crate::resources::{ResourceEntry, ResourceKind};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

/// JSON sink for the persistence component
pub struct JsonSink {
    output_path: Option<PathBuf>,
}

impl JsonSink {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    /// Render the entries without writing them
    pub fn render(&self, package: &str, entries: &[ResourceEntry]) -> Result<String> {
        let report = JsonReport::new(package, entries);
        serde_json::to_string_pretty(&report).into_diagnostic()
    }
}

impl EntrySink for JsonSink {
    fn write(&self, package: &str, entries: &[ResourceEntry]) -> Result<()> {
        let json = self.render(package, entries)?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json).into_diagnostic()?;
            println!("Entries written to: {}", path.display());
        } else {
            println!("{}", json);
        }

        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    version: &'static str,
    package_name: &'a str,
    total_entries: usize,
    anim: Vec<JsonEntry<'a>>,
    interpolator: Vec<JsonEntry<'a>>,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    hash: &'a str,
    file_name: &'a str,
    index: usize,
    approximate: bool,
    content: &'a str,
}

impl<'a> JsonReport<'a> {
    fn new(package: &'a str, entries: &'a [ResourceEntry]) -> Self {
        let of_kind = |kind: ResourceKind| -> Vec<JsonEntry<'a>> {
            entries
                .iter()
                .filter(|e| e.kind == kind)
                .map(|e| JsonEntry {
                    hash: &e.hash,
                    file_name: &e.path,
                    index: e.index,
                    approximate: e.approximate,
                    content: &e.content,
                })
                .collect()
        };

        Self {
            version: env!("CARGO_PKG_VERSION"),
            package_name: package,
            total_entries: entries.len(),
            anim: of_kind(ResourceKind::Animation),
            interpolator: of_kind(ResourceKind::Interpolator),
        }
    }
}
