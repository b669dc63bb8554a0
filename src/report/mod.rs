mod json;
mod terminal;

pub use json::JsonSink;
pub use terminal::TerminalReporter;

use crate::extract::Extraction;
use crate::resources::ResourceEntry;
use miette::Result;
use std::path::PathBuf;

/// Destination of the emitted entries
pub trait EntrySink {
    /// Hand over the entries of one package, in emission order
    fn write(&self, package: &str, entries: &[ResourceEntry]) -> Result<()>;
}

/// Output format for reports
#[derive(Debug, Clone, Default)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

/// Reporter for outputting extraction results
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self { format, output_path }
    }

    pub fn report(&self, extraction: &Extraction) -> Result<()> {
        match &self.format {
            ReportFormat::Terminal => TerminalReporter::new().report(extraction),
            ReportFormat::Json => {
                JsonSink::new(self.output_path.clone()).write(&extraction.package, &extraction.entries)
            }
        }
    }
}
