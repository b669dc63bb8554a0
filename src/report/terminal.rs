use super::EntrySink;
use crate::extract::{Extraction, ExtractionSummary};
use crate::resources::{ResourceEntry, ResourceKind};
use colored::Colorize;
use miette::Result;
use std::collections::BTreeMap;

/// Terminal reporter with colored output
pub struct TerminalReporter;

impl TerminalReporter {
    pub fn new() -> Self {
        Self
    }

    /// List every entry grouped by file, then the run summary
    pub fn report(&self, extraction: &Extraction) -> Result<()> {
        self.write(&extraction.package, &extraction.entries)?;
        self.print_summary(&extraction.package, &extraction.summary);
        Ok(())
    }

    fn print_entry(&self, entry: &ResourceEntry) {
        let kind = match entry.kind {
            ResourceKind::Animation => "anim".green(),
            ResourceKind::Interpolator => "interpolator".blue(),
        };
        let approximate = if entry.approximate {
            " [APPROXIMATE]".yellow().to_string()
        } else {
            String::new()
        };

        println!(
            "  {} #{} {}{}",
            kind,
            entry.index,
            entry.hash[..entry.hash.len().min(16)].dimmed(),
            approximate
        );
    }

    fn print_summary(&self, package: &str, summary: &ExtractionSummary) {
        println!("{}", "─".repeat(60).dimmed());
        println!("Package: {}", package.white().bold());
        println!(
            "Extracted: {}, {}",
            format!("{} animations", summary.animations).green(),
            format!("{} interpolators", summary.interpolators).blue()
        );
        if summary.approximate > 0 {
            println!(
                "  {}",
                format!("{} entries contain unresolved references", summary.approximate).yellow()
            );
        }

        println!(
            "{}",
            format!(
                "Scanned {} value files and {} documents",
                summary.value_files, summary.documents_scanned
            )
            .dimmed()
        );
        if summary.skipped() > 0 {
            println!(
                "{}",
                format!(
                    "Skipped {} documents ({} filtered, {} unparsable, {} too many combinations)",
                    summary.skipped(),
                    summary.filtered,
                    summary.unparsable,
                    summary.too_many_combinations
                )
                .dimmed()
            );
        }
        if summary.unreadable_value_files > 0 {
            println!(
                "{}",
                format!("{} value files could not be parsed", summary.unreadable_value_files).yellow()
            );
        }
        if summary.attribute_cycles > 0 {
            println!(
                "{}",
                format!("{} attribute cycles resolved to unknown", summary.attribute_cycles).yellow()
            );
        }
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl EntrySink for TerminalReporter {
    fn write(&self, package: &str, entries: &[ResourceEntry]) -> Result<()> {
        if entries.is_empty() {
            println!("{}", format!("No animations found in {}", package).yellow().bold());
            return Ok(());
        }

        let mut by_file: BTreeMap<&str, Vec<&ResourceEntry>> = BTreeMap::new();
        for entry in entries {
            by_file.entry(entry.path.as_str()).or_default().push(entry);
        }

        println!();
        for (file, items) in by_file {
            println!("{}", file.cyan().bold());
            for item in items {
                self.print_entry(item);
            }
        }
        println!();

        Ok(())
    }
}
