//! Ingest, fetch and aggregate commands.

use anyhow::{Context, Result};
use candela_lib::prelude::*;
use candela_lib::ProgressObserver;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::RunArgs;
use crate::display::{ProgressReporter, load_config, override_path, resolve_range};

/// Which pipeline phases a command runs.
pub(crate) enum Phase {
    /// Base ingestion, then every derived tier.
    All,
    /// Base ingestion only.
    Base,
    /// Fold-up of the given tiers only (every derived tier when empty).
    Fold(Vec<Period>),
}

/// Applies command-line overrides on top of the loaded configuration.
fn configure(config_path: Option<&Path>, args: &RunArgs) -> Result<IngestConfig> {
    let mut config = load_config(config_path)?;

    if !args.symbols.is_empty() {
        config.symbols.clone_from(&args.symbols);
    }
    if !args.price_types.is_empty() {
        config.price_types.clone_from(&args.price_types);
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    override_path(&mut config.data_root, args.data_root.as_ref());
    override_path(&mut config.store_root, args.store_root.as_ref());

    config.normalize();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Runs one or both pipeline phases and prints the report.
///
/// Per-tuple and per-fold failures are reported, not returned; only
/// configuration and invocation problems end in an error.
pub(crate) async fn run(
    config_path: Option<&Path>,
    args: &RunArgs,
    phase: Phase,
    quiet: bool,
) -> Result<()> {
    let config = configure(config_path, args)?;
    let range = resolve_range(args.start, args.end)?;

    let store: Arc<dyn BarStore> = if args.dry_run {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(
            FileStore::open(config.store_root.clone()).with_context(|| {
                format!("Failed to open bar store at {}", config.store_root.display())
            })?,
        )
    };

    let client =
        DownloadClient::new(config.client_config()).context("Failed to build HTTP client")?;
    let source = HttpSource::new(client, config.base_url.clone());

    let progress: Arc<dyn ProgressObserver> = Arc::new(ProgressReporter::new(quiet));
    let orchestrator = IngestionOrchestrator::from_config(&config, source, store)?
        .with_progress(progress);

    info!(
        %range,
        symbols = config.symbols.len(),
        workers = config.workers,
        dry_run = args.dry_run,
        "run started"
    );

    let report = match phase {
        Phase::All => orchestrator.run(range).await?,
        Phase::Base => RunReport {
            tuples: orchestrator.ingest_base(range).await,
            tiers: Vec::new(),
        },
        Phase::Fold(periods) => {
            let tiers = if periods.is_empty() {
                orchestrator.chain().derived().to_vec()
            } else {
                periods
            };
            RunReport {
                tuples: Vec::new(),
                tiers: orchestrator.fold_up(range, &tiers).await?,
            }
        }
    };

    if !quiet || !report.is_clean() {
        print!("{report}");
    }

    Ok(())
}
