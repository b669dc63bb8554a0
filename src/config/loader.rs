use crate::resources::{
    DocumentFilter, DEFAULT_MAX_COMBINATIONS, DEFAULT_MAX_DEPTH, INTERPOLATOR_TAGS, TWEEN_ATTRIBUTES,
    TWEEN_TAGS,
};
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration for an extraction run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the framework cache
    pub cache_dir: PathBuf,

    /// Package name of the analyzed application, if known
    pub package: Option<String>,

    /// Resolver limits
    pub resolver: ResolverConfig,

    /// Document filters
    pub filters: FilterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Recursion ceiling for reference chains
    pub max_depth: usize,

    /// Maximum number of variants generated from one document
    pub max_combinations: usize,

    /// Dereference documents on all cores
    pub parallel: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Tags an animation may use to be extracted
    pub tween_tags: Vec<String>,

    /// Animation attributes whose references are expanded
    pub tween_attributes: Vec<String>,

    /// Tags a framework interpolator may use to be extracted
    pub interpolator_tags: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("framework-cache"),
            package: None,
            resolver: ResolverConfig::default(),
            filters: FilterConfig::default(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_combinations: DEFAULT_MAX_COMBINATIONS,
            parallel: false,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        let owned = |names: &[&str]| -> Vec<String> { names.iter().map(|n| n.to_string()).collect() };
        Self {
            tween_tags: owned(TWEEN_TAGS),
            tween_attributes: owned(TWEEN_ATTRIBUTES),
            interpolator_tags: owned(INTERPOLATOR_TAGS),
        }
    }
}

impl FilterConfig {
    /// Filter for application animations
    pub fn tween_filter(&self) -> DocumentFilter {
        DocumentFilter::new(Some(self.tween_tags.clone()), Some(self.tween_attributes.clone()))
    }

    /// Filter for framework interpolators
    pub fn interpolator_filter(&self) -> DocumentFilter {
        DocumentFilter::new(Some(self.interpolator_tags.clone()), None::<Vec<String>>)
    }
}

impl Config {
    /// Load configuration from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML config"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML config"),
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse config file")
                }
            }
        }
    }

    /// Try to load configuration from default locations
    pub fn from_default_locations(dir: &Path) -> Result<Self> {
        let default_names = [
            ".animextract.yml",
            ".animextract.yaml",
            ".animextract.toml",
            "animextract.toml",
        ];

        for name in &default_names {
            let path = dir.join(name);
            if path.exists() {
                debug!("Using config {}", path.display());
                return Self::from_file(&path);
            }
        }

        // No config file found, use defaults
        Ok(Self::default())
    }
}
