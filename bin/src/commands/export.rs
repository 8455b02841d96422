//! Export command implementation.

use anyhow::{Context, Result, bail};
use candela_lib::prelude::*;
use candela_lib::{export_file_name, midnight, write_bars};
use chrono::{NaiveDate, TimeDelta};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::display::{Format, load_config, override_path};

/// One series and date span to export.
pub(crate) struct ExportRequest {
    pub(crate) symbol: String,
    pub(crate) period: Period,
    pub(crate) price_type: PriceType,
    pub(crate) source: Option<String>,
    pub(crate) start: NaiveDate,
    pub(crate) end: NaiveDate,
    pub(crate) format: Format,
    pub(crate) output: Option<PathBuf>,
    pub(crate) all_bars: bool,
    pub(crate) store_root: Option<PathBuf>,
}

/// Writes the stored bars of one series to a file.
pub(crate) fn export(
    config_path: Option<&Path>,
    request: &ExportRequest,
    quiet: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    override_path(&mut config.store_root, request.store_root.as_ref());

    let range = DateRange::new(request.start, request.end)?;
    let source = request
        .source
        .as_ref()
        .map_or_else(|| config.source.clone(), Source::new);
    let instrument = Instrument::forex(&request.symbol, &config.price_scale)
        .with_context(|| format!("Invalid symbol {:?}", request.symbol))?;
    let series = Series::new(instrument.symbol(), request.period, source, request.price_type);

    let store = FileStore::open(config.store_root.clone()).with_context(|| {
        format!("Failed to open bar store at {}", config.store_root.display())
    })?;

    let to = midnight(range.end) + TimeDelta::days(1) - TimeDelta::microseconds(1);
    let mut query = BarQuery::new(series.clone(), midnight(range.start), to);
    if !request.all_bars {
        query = query.trading_only();
    }
    let bars = store.query(&query)?;

    if bars.is_empty() {
        bail!("No {series} bars stored between {} and {}", range.start, range.end);
    }

    let format = OutputFormat::from(request.format);
    let output = request.output.clone().unwrap_or_else(|| {
        PathBuf::from(export_file_name(&series, range.start, range.end, format))
    });

    let file = File::create(&output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    write_bars(format, &bars, BufWriter::new(file))?;

    info!(%series, bars = bars.len(), output = %output.display(), "export written");
    if !quiet {
        println!("Wrote {} bars to {}", bars.len(), output.display());
    }

    Ok(())
}
