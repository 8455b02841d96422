//! Pipeline configuration.

use candela_fetch::{ClientConfig, Jitter, url::BASE_URL};
use candela_instruments::{FOREX_PAIRS, InstrumentUniverse};
use candela_types::{CandelaError, PeriodChain, PriceScale, PriceType, Source};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config '{path}': {source}")]
    ReadFile {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the configuration file.
    #[error("Failed to parse config '{path}': {source}")]
    Parse {
        /// The path that could not be parsed.
        path: PathBuf,
        /// The underlying TOML error.
        source: Box<toml::de::Error>,
    },

    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(String),

    /// A symbol is not a currency pair.
    #[error(transparent)]
    Instrument(#[from] CandelaError),
}

/// Everything a pipeline run needs to know, loaded from TOML.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    /// Archive cache root.
    pub data_root: PathBuf,
    /// Bar store root.
    pub store_root: PathBuf,
    /// Remote archive endpoint.
    pub base_url: String,
    /// Currency pairs to ingest.
    pub symbols: Vec<String>,
    /// Quote sides to ingest.
    pub price_types: Vec<PriceType>,
    /// Provenance tag written on feed bars.
    pub source: Source,
    /// Bounded worker pool size.
    pub workers: usize,
    /// Lower bound of the pre-request delay.
    pub jitter_min_ms: u64,
    /// Upper bound of the pre-request delay.
    pub jitter_max_ms: u64,
    /// HTTP request timeout.
    pub timeout_secs: u64,
    /// HTTP retry attempts for transient failures.
    pub max_retries: u32,
    /// Base delay for HTTP backoff.
    pub base_delay_ms: u64,
    /// Cap on HTTP backoff.
    pub max_delay_ms: u64,
    /// Retries of a failed store write.
    pub store_retries: u32,
    /// Price descaling divisors.
    pub price_scale: PriceScale,
    /// Period chain, base first.
    pub periods: PeriodChain,
}

impl Default for IngestConfig {
    fn default() -> Self {
        let home = Self::default_home();
        let client = ClientConfig::default();
        Self {
            data_root: home.join("archives"),
            store_root: home.join("bars"),
            base_url: BASE_URL.to_string(),
            symbols: FOREX_PAIRS.iter().map(ToString::to_string).collect(),
            price_types: PriceType::all().to_vec(),
            source: Source::feed(),
            workers: client.concurrency,
            jitter_min_ms: 250,
            jitter_max_ms: 1000,
            timeout_secs: client.timeout.as_secs(),
            max_retries: client.max_retries,
            base_delay_ms: client.base_delay_ms,
            max_delay_ms: client.max_delay_ms,
            store_retries: 3,
            price_scale: PriceScale::default(),
            periods: PeriodChain::default(),
        }
    }
}

impl IngestConfig {
    /// Returns the default data directory.
    ///
    /// Uses the platform data directory (e.g. `~/.local/share/candela/` on
    /// Linux) and falls back to `~/.candela/`.
    #[must_use]
    pub fn default_home() -> PathBuf {
        ProjectDirs::from("", "", "candela")
            .map_or_else(dirs_fallback, |proj_dirs| proj_dirs.data_dir().to_path_buf())
    }

    /// Returns the default configuration file path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("", "", "candela").map_or_else(
            || dirs_fallback().join("config.toml"),
            |proj_dirs| proj_dirs.config_dir().join("config.toml"),
        )
    }

    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this schema or a
    /// value fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source: Box::new(e),
        })?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or fails
    /// validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config: Self = toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Loads the file if it exists, otherwise returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be loaded.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Upper-cases symbols and drops repeated symbols and quote sides,
    /// keeping first occurrences in order.
    ///
    /// A repeated entry would schedule the same tuple twice.
    pub fn normalize(&mut self) {
        let mut symbols: Vec<String> = Vec::with_capacity(self.symbols.len());
        for symbol in self.symbols.drain(..) {
            let symbol = symbol.to_uppercase();
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
        self.symbols = symbols;
        self.price_types = unique_price_types(&self.price_types);
    }

    /// Checks value ranges and that every symbol is a currency pair.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".to_string()));
        }
        if self.jitter_min_ms > self.jitter_max_ms {
            return Err(ConfigError::Invalid(format!(
                "jitter_min_ms ({}) exceeds jitter_max_ms ({})",
                self.jitter_min_ms, self.jitter_max_ms
            )));
        }
        if self.symbols.is_empty() {
            return Err(ConfigError::Invalid("no symbols configured".to_string()));
        }
        if self.price_types.is_empty() {
            return Err(ConfigError::Invalid("no price types configured".to_string()));
        }
        self.universe()?;
        Ok(())
    }

    /// Builds the instrument universe for the configured symbols.
    ///
    /// # Errors
    ///
    /// Returns an error if any symbol is not a currency pair.
    pub fn universe(&self) -> Result<InstrumentUniverse, ConfigError> {
        Ok(InstrumentUniverse::new(&self.symbols, &self.price_scale)?)
    }

    /// Returns the HTTP client settings.
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            concurrency: self.workers,
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            base_delay_ms: self.base_delay_ms,
            max_delay_ms: self.max_delay_ms,
            ..ClientConfig::default()
        }
    }

    /// Returns the pre-request jitter window.
    #[must_use]
    pub fn jitter(&self) -> Jitter {
        Jitter::new(
            Duration::from_millis(self.jitter_min_ms),
            Duration::from_millis(self.jitter_max_ms),
        )
    }
}

/// Drops repeated quote sides, keeping the first occurrence of each.
pub(crate) fn unique_price_types(price_types: &[PriceType]) -> Vec<PriceType> {
    let mut unique = Vec::with_capacity(price_types.len());
    for &price_type in price_types {
        if !unique.contains(&price_type) {
            unique.push(price_type);
        }
    }
    unique
}

fn dirs_fallback() -> PathBuf {
    std::env::var_os("HOME")
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
        .join(".candela")
}
