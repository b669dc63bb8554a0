use animextract::config::Config;
use animextract::extract::Extractor;
use animextract::report::{ReportFormat, Reporter};
use clap::Parser;
use miette::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// animextract - Extract fully dereferenced animations from decompiled Android resources
#[derive(Parser, Debug)]
#[command(name = "animextract")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the decompiled resource tree (the directory containing res/)
    path: PathBuf,

    /// Resolve the framework resources and write the cache
    #[arg(long)]
    framework: bool,

    /// Framework cache directory
    #[arg(long, value_name = "DIR")]
    cache: Option<PathBuf>,

    /// Package name of the analyzed application
    #[arg(long, value_name = "NAME")]
    package: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: OutputFormat,

    /// Output file (for json format)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Recursion ceiling for reference chains
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Maximum number of variants generated from one document
    #[arg(long, value_name = "N")]
    max_combinations: Option<usize>,

    /// Dereference documents in parallel
    #[arg(long)]
    parallel: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug, Default)]
enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Terminal => ReportFormat::Terminal,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose, cli.quiet);

    info!("animextract v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;

    let extractor = Extractor::new(&config, &cli.path)?.with_progress(!cli.quiet);
    let extraction = if cli.framework {
        info!("Resolving framework resources in {}", cli.path.display());
        extractor.run_framework()?
    } else {
        info!("Resolving application resources in {}", cli.path.display());
        extractor.run_application()?
    };

    let reporter = Reporter::new(cli.format.clone().into(), cli.output.clone());
    reporter.report(&extraction)?;

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        // Try to load from default locations
        Config::from_default_locations(Path::new("."))?
    };

    // Override with CLI arguments
    if let Some(cache) = &cli.cache {
        config.cache_dir = cache.clone();
    }
    if let Some(package) = &cli.package {
        config.package = Some(package.clone());
    }
    if let Some(max_depth) = cli.max_depth {
        config.resolver.max_depth = max_depth;
    }
    if let Some(max_combinations) = cli.max_combinations {
        config.resolver.max_combinations = max_combinations;
    }
    if cli.parallel {
        config.resolver.parallel = true;
    }

    Ok(config)
}
