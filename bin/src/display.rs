//! Display utilities and shared plumbing for the candela CLI.

use anyhow::{Context, Result};
use candela_lib::prelude::*;
use candela_lib::{ProgressObserver, TupleReport};
use chrono::{Days, NaiveDate, Utc};
use clap::ValueEnum;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Output format for exported bars.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum Format {
    Csv,
    Json,
    Ndjson,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Csv => Self::Csv,
            Format::Json => Self::Json,
            Format::Ndjson => Self::Ndjson,
        }
    }
}

/// Loads the configuration file (or defaults when it does not exist).
pub(crate) fn load_config(path: Option<&Path>) -> Result<IngestConfig> {
    let path = path.map_or_else(IngestConfig::default_path, Path::to_path_buf);
    IngestConfig::load_or_default(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Resolves an optional start and end into an inclusive range.
///
/// The end defaults to yesterday (UTC) and the start to the end.
pub(crate) fn resolve_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<DateRange> {
    let end = match end {
        Some(end) => end,
        None => Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(1))
            .context("No date before today")?,
    };
    let start = start.unwrap_or(end);
    Ok(DateRange::new(start, end)?)
}

/// Default directory overrides, used when the CLI leaves a path unset.
pub(crate) fn override_path(target: &mut PathBuf, value: Option<&PathBuf>) {
    if let Some(value) = value {
        target.clone_from(value);
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-")
}

/// Drives an indicatif bar from orchestrator progress notifications.
///
/// One bar is reused for the base phase and then for each tier.
pub(crate) struct ProgressReporter {
    bar: Mutex<ProgressBar>,
    quiet: bool,
}

impl ProgressReporter {
    pub(crate) fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(ProgressBar::hidden()),
            quiet,
        }
    }

    fn restart(&self, len: usize, message: String) {
        let bar = if self.quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new(len as u64);
            bar.set_style(bar_style());
            bar.set_message(message);
            bar
        };
        if let Ok(mut slot) = self.bar.lock() {
            slot.finish_and_clear();
            *slot = bar;
        }
    }

    fn tick(&self) {
        if let Ok(bar) = self.bar.lock() {
            bar.inc(1);
        }
    }

    fn finish(&self) {
        if let Ok(bar) = self.bar.lock() {
            bar.finish_and_clear();
        }
    }
}

impl std::fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressReporter").field("quiet", &self.quiet).finish_non_exhaustive()
    }
}

impl ProgressObserver for ProgressReporter {
    fn base_started(&self, tuples: usize) {
        self.restart(tuples, "base bars".to_string());
    }

    fn tuple_done(&self, _report: &TupleReport) {
        self.tick();
    }

    fn tier_started(&self, period: Period, folds: usize) {
        self.finish();
        self.restart(folds, format!("{period} buckets"));
    }

    fn fold_done(&self, _period: Period) {
        self.tick();
    }

    fn tier_done(&self, _period: Period) {
        self.finish();
    }
}
