//! Command-line interface for ordering catalogs and validating their images

use crate::catalog::item::CatalogItem;
use crate::curation::distribution::FeedDistributor;
use crate::imagery::loader::{FsImageLoader, HttpImageLoader, ImageLoader};
use crate::imagery::resolver::ImageCandidateResolver;
use crate::io::catalog::{load_catalog, write_catalog_lines};
use crate::io::configuration::CurationConfig;
use crate::io::error::{CurationError, Result, invalid_parameter, output_error};
use crate::io::progress::ResolveProgress;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "partcurate")]
#[command(
    author,
    version,
    about = "Order parts catalogs for display and find loadable product images"
)]
/// Command-line arguments for the curation tool
pub struct Cli {
    /// JSON configuration file; omitted sections use defaults
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Show informational log output on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available operations
#[derive(Subcommand)]
pub enum Command {
    /// Print catalog items in category-limited display order, one JSON object per line
    Distribute {
        /// Catalog JSON file
        #[arg(value_name = "CATALOG")]
        catalog: PathBuf,

        /// Maximum same-category items in a row
        #[arg(short = 'k', long)]
        max_consecutive: Option<usize>,

        /// Probability of switching category before the limit
        #[arg(long)]
        switch_probability: Option<f64>,

        /// Random seed for a reproducible ordering
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Find the first loadable image of every catalog item
    Resolve {
        /// Catalog JSON file
        #[arg(value_name = "CATALOG")]
        catalog: PathBuf,

        /// Base URL for site-relative image paths
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,

        /// Serve site-relative image paths from this directory instead of HTTP
        #[arg(long, value_name = "DIR", conflicts_with = "base_url")]
        root: Option<PathBuf>,

        /// Per-image load timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Candidates tried per item
        #[arg(long)]
        max_candidates: Option<usize>,

        /// Print cache statistics after resolving
        #[arg(long)]
        stats: bool,

        /// Suppress the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Report whether references pass the pre-filter
    Filter {
        /// References to check
        #[arg(required = true, value_name = "REFERENCE")]
        references: Vec<String>,
    },
}

/// Executes the parsed command line
pub struct CurationRunner {
    cli: Cli,
}

impl CurationRunner {
    /// Create a runner for the given arguments
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the selected operation
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or catalog loading fails, an argument
    /// is out of range, or the async runtime cannot start
    pub fn run(&self) -> Result<()> {
        let mut config = match &self.cli.config {
            Some(path) => CurationConfig::load(path)?,
            None => CurationConfig::default(),
        };

        match &self.cli.command {
            Command::Distribute {
                catalog,
                max_consecutive,
                switch_probability,
                seed,
            } => {
                if let Some(limit) = *max_consecutive {
                    config.distribution.max_consecutive = limit;
                }
                if let Some(probability) = *switch_probability {
                    config.distribution.switch_probability = probability;
                }
                config.validate()?;
                Self::distribute(&config, catalog, *seed)
            }
            Command::Resolve {
                catalog,
                base_url,
                root,
                timeout_ms,
                max_candidates,
                stats,
                quiet,
            } => {
                if let Some(timeout) = *timeout_ms {
                    config.probe.timeout_ms = timeout;
                }
                if let Some(limit) = *max_candidates {
                    config.probe.max_candidates = limit;
                }
                config.validate()?;
                let loader = Self::build_loader(base_url.as_deref(), root.as_deref())?;
                Self::resolve(&config, catalog, loader, *stats, *quiet)
            }
            Command::Filter { references } => Self::filter(&config, references),
        }
    }

    fn distribute(config: &CurationConfig, catalog: &Path, seed: Option<u64>) -> Result<()> {
        let items = load_catalog(catalog)?;
        let mut distributor = match seed {
            Some(seed) => FeedDistributor::seeded(config.distribution, seed),
            None => FeedDistributor::new(config.distribution),
        };

        let ordered = distributor.distribute(items);
        info!(count = ordered.len(), "catalog distributed");

        write_catalog_lines(&ordered, std::io::stdout().lock())
    }

    fn build_loader(base_url: Option<&str>, root: Option<&Path>) -> Result<Arc<dyn ImageLoader>> {
        if let Some(root) = root {
            return Ok(Arc::new(FsImageLoader::new(root)));
        }

        match base_url {
            Some(base) => HttpImageLoader::with_base_url(base)
                .map(|loader| Arc::new(loader) as Arc<dyn ImageLoader>)
                .map_err(|err| invalid_parameter("base_url", &base, &err)),
            None => Ok(Arc::new(HttpImageLoader::new())),
        }
    }

    // Allow print for resolution results, which are the command's output
    #[allow(clippy::print_stdout)]
    fn resolve(
        config: &CurationConfig,
        catalog: &Path,
        loader: Arc<dyn ImageLoader>,
        show_stats: bool,
        quiet: bool,
    ) -> Result<()> {
        let items = load_catalog(catalog)?;
        let filter = config.filter.compile()?;
        let resolver = ImageCandidateResolver::with_config(loader, filter, config.probe);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|source| CurationError::Runtime { source })?;

        let mut progress = if quiet {
            ResolveProgress::hidden()
        } else {
            ResolveProgress::new(items.len())
        };

        let lines = runtime.block_on(async {
            let mut lines = Vec::with_capacity(items.len());
            for item in &items {
                let image = resolver
                    .resolve_first_valid(item, &config.fields, config.probe.max_candidates)
                    .await;
                progress.record(image.is_some());
                lines.push(resolution_line(item, image.as_ref().map(|found| found.url.as_str())));
            }
            lines
        });
        progress.finish();

        info!(
            found = progress.found(),
            missing = progress.missing(),
            "catalog images resolved"
        );

        for line in &lines {
            println!("{line}");
        }

        if show_stats {
            let stats = serde_json::to_string(&resolver.stats()).map_err(output_error)?;
            println!("{stats}");
        }

        Ok(())
    }

    // Allow print for the verdicts, which are the command's output
    #[allow(clippy::print_stdout)]
    fn filter(config: &CurationConfig, references: &[String]) -> Result<()> {
        let filter = config.filter.compile()?;
        for reference in references {
            let verdict = if filter.accepts(reference) {
                "accept"
            } else {
                "reject"
            };
            println!("{verdict}\t{reference}");
        }
        Ok(())
    }
}

fn resolution_line(item: &CatalogItem, url: Option<&str>) -> serde_json::Value {
    json!({
        "id": item.id(),
        "image": url,
    })
}
