//! Offline checker for item documents.
//!
//! Loads the embedded defaults, the override directory and any files named on
//! the command line into a fresh registry, optionally resolves every item
//! against an asset directory with the dry-run factory, and prints a JSON
//! report. Logs go to stderr and follow `RUST_LOG` (default `warn`).

use anyhow::{Result, anyhow};
use common_items::config::{DocumentSource, IngestConfig};
use common_items::{
    DirectoryAssets, DryRunFactory, IngestSummary, IngestionDriver, Registry, ResolutionPipeline,
    ResolutionSummary,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse()?;

    let registry = Registry::new();
    let driver = IngestionDriver::new(&registry);
    let mut sources = args.config.sources()?;
    sources.extend(args.files.iter().cloned().map(DocumentSource::File));
    let ingest = driver.load_sources(&sources);

    let resolution = match &args.assets {
        Some(dir) => {
            let assets = DirectoryAssets::new(dir)?;
            let factory = DryRunFactory::new().with_baselines(args.baselines.iter().cloned());
            Some(ResolutionPipeline::new(&registry).resolve_registered(&assets, &factory))
        }
        None => None,
    };

    let mut categories: BTreeMap<&'static str, usize> = BTreeMap::new();
    for definition in registry.all() {
        *categories.entry(definition.category.as_str()).or_insert(0) += 1;
    }
    let report = Report {
        items: registry.count(),
        categories,
        ingest,
        resolution,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if args.strict && report.has_problems() {
        std::process::exit(2);
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Serialize)]
struct Report {
    items: usize,
    categories: BTreeMap<&'static str, usize>,
    ingest: IngestSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolution: Option<ResolutionSummary>,
}

impl Report {
    fn has_problems(&self) -> bool {
        let ingest_problems = !self.ingest.failed.is_empty()
            || self
                .ingest
                .documents
                .iter()
                .any(|doc| !doc.skipped.is_empty() || !doc.rejected.is_empty());
        let resolution_problems = self
            .resolution
            .as_ref()
            .is_some_and(|summary| !summary.failures.is_empty());
        ingest_problems || resolution_problems
    }
}

struct CliArgs {
    config: IngestConfig,
    assets: Option<PathBuf>,
    baselines: Vec<String>,
    strict: bool,
    files: Vec<PathBuf>,
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut config = IngestConfig::from_env();
        let mut assets = None;
        let mut baselines = Vec::new();
        let mut strict = false;
        let mut files = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--no-defaults" => config.include_defaults = false,
                "--override-dir" => {
                    config.override_dir = Some(PathBuf::from(next_value(&mut args, "--override-dir")?))
                }
                "--assets" => assets = Some(PathBuf::from(next_value(&mut args, "--assets")?)),
                "--baseline" => baselines.push(next_value(&mut args, "--baseline")?),
                "--strict" => strict = true,
                "--help" | "-h" => usage_and_exit(),
                other if other.starts_with('-') => {
                    eprintln!("Unknown flag: {other}");
                    usage_and_exit();
                }
                file => files.push(PathBuf::from(file)),
            }
        }

        Ok(CliArgs {
            config,
            assets,
            baselines,
            strict,
            files,
        })
    }
}

fn next_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("Missing value for {flag}"))
}

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: item-check [--no-defaults] [--override-dir DIR] [--assets DIR] [--baseline NAME]... [--strict] [FILE...]\n\
         \n\
         Environment:\n\
         \x20 COMMON_ITEMS_OVERRIDE_DIR   override directory (same as --override-dir)\n\
         \x20 COMMON_ITEMS_SKIP_DEFAULTS  skip the embedded item set when set and not 0\n\
         \x20 RUST_LOG                    log filter for stderr (default: warn)\n\
         \n\
         --strict exits with status 2 when any document, entry or item failed."
    );
    std::process::exit(1);
}
