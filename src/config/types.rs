//! Configuration types and CLI options.
//!
//! `Config` is both the clap command line and the library configuration: the
//! binary parses it, library users build it with `..Default::default()`.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};

use crate::config::constants::{
    API_ENDPOINT, API_KEY_PLACEHOLDER, DEFAULT_CONCURRENCY, DEFAULT_RATE_LIMIT_RPS,
    DEFAULT_SHORTLINK_DOMAINS, MAX_CONCURRENCY,
};
use crate::models::Strategy;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

fn default_shortlink_domains() -> Vec<String> {
    DEFAULT_SHORTLINK_DOMAINS
        .iter()
        .map(|d| d.to_string())
        .collect()
}

/// Scanner configuration.
///
/// # Examples
///
/// ```no_run
/// use pagespeed_scan::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     file: PathBuf::from("routes.csv"),
///     base_url: Some("https://www.example.org".to_string()),
///     api_key: "my-key".to_string(),
///     max_concurrency: 5,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pagespeed_scan",
    version,
    about = "Scan website routes with the Google PageSpeed Insights API and report average performance metrics."
)]
pub struct Config {
    /// CSV file containing URLs or route paths (one per row, header row skipped)
    #[arg(long = "csv", value_parser, default_value = "urls.csv")]
    pub file: PathBuf,

    /// Base domain prepended to route paths (e.g. https://www.example.org)
    #[arg(long, env = "BASE_URL")]
    pub base_url: Option<String>,

    /// PageSpeed Insights API key
    #[arg(long, env = "API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// Path for the exported results CSV
    #[arg(long, value_parser, default_value = "results.csv")]
    pub output: PathBuf,

    /// Number of concurrent workers
    #[arg(long = "workers", default_value_t = DEFAULT_CONCURRENCY)]
    pub max_concurrency: usize,

    /// Aggregate request rate limit in requests per second
    #[arg(long = "rate", default_value_t = DEFAULT_RATE_LIMIT_RPS)]
    pub rate_limit_rps: f64,

    /// Skip URL validation and shortlink resolution (URLs are sent as-is)
    #[arg(long)]
    pub no_validate: bool,

    /// Hostnames treated as URL shorteners (repeatable)
    #[arg(long = "shortlink-domain", default_values_t = default_shortlink_domains())]
    pub shortlink_domains: Vec<String>,

    /// Device strategies to test (repeatable)
    #[arg(long = "strategy", value_enum, default_values_t = [Strategy::Mobile, Strategy::Desktop])]
    pub strategies: Vec<Strategy>,

    /// PageSpeed Insights endpoint
    #[arg(long, default_value = API_ENDPOINT)]
    pub api_endpoint: String,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file: PathBuf::from("urls.csv"),
            base_url: None,
            api_key: String::new(),
            output: PathBuf::from("results.csv"),
            max_concurrency: DEFAULT_CONCURRENCY,
            rate_limit_rps: DEFAULT_RATE_LIMIT_RPS,
            no_validate: false,
            shortlink_domains: default_shortlink_domains(),
            strategies: vec![Strategy::Mobile, Strategy::Desktop],
            api_endpoint: API_ENDPOINT.to_string(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

impl Config {
    /// Checks value ranges that clap cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 || self.max_concurrency > MAX_CONCURRENCY {
            bail!(
                "--workers must be between 1 and {} (got {})",
                MAX_CONCURRENCY,
                self.max_concurrency
            );
        }
        if !self.rate_limit_rps.is_finite() || self.rate_limit_rps <= 0.0 {
            bail!("--rate must be a positive number (got {})", self.rate_limit_rps);
        }
        let key = self.api_key.trim();
        if key.is_empty() || key == API_KEY_PLACEHOLDER {
            bail!("No valid API key configured. Set API_KEY in .env or pass --api-key");
        }
        if self.strategies.is_empty() {
            bail!("At least one --strategy is required");
        }
        Ok(())
    }

    /// Whether URL validation and shortlink resolution run before scanning.
    pub fn validation_enabled(&self) -> bool {
        !self.no_validate
    }
}
