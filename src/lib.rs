//! pagespeed_scan library: batch PageSpeed Insights scanning
//!
//! This library runs Google PageSpeed Insights for many URLs under the mobile
//! and desktop strategies, with bounded concurrency, a shared request-rate
//! limit, retries for transient API failures, and results returned in input
//! order regardless of completion order.
//!
//! # Example
//!
//! ```no_run
//! use pagespeed_scan::{run_scan, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     file: std::path::PathBuf::from("urls.csv"),
//!     api_key: "my-api-key".to_string(),
//!     max_concurrency: 5,
//!     rate_limit_rps: 2.0,
//!     ..Default::default()
//! };
//!
//! let report = run_scan(config).await?;
//! println!("{} of {} jobs succeeded", report.successful, report.total_jobs);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime.

pub mod config;
pub mod error_handling;
pub mod extract;
pub mod fetch;
pub mod initialization;
pub mod input;
pub mod models;
pub mod orchestrator;
pub mod report;
pub mod validation;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use models::{Job, ResultRecord, Strategy};
pub use orchestrator::{Orchestrator, ScanOutcome, ScanSettings, SkippedUrl};
pub use run::{run_scan, ScanReport};

// Driver wiring configuration to the orchestrator and reporter
mod run {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Instant;

    use anyhow::{Context, Result};

    use crate::config::Config;
    use crate::error_handling::ProcessingStats;
    use crate::fetch::ReqwestTransport;
    use crate::initialization::{init_client, init_redirect_client};
    use crate::input::{read_targets, resolve_targets};
    use crate::orchestrator::{Orchestrator, ScanSettings};
    use crate::report::{compute_averages, export_csv, log_summary, success_count};
    use crate::validation::UrlValidator;

    /// Results of a scan run.
    #[derive(Debug, Clone)]
    pub struct ScanReport {
        /// Number of (URL, strategy) jobs run
        pub total_jobs: usize,
        /// Jobs that produced results
        pub successful: usize,
        /// Jobs that ended in a failure record
        pub failed: usize,
        /// Input URLs rejected by validation
        pub skipped: usize,
        /// Path of the exported CSV
        pub output_path: PathBuf,
        /// Elapsed time in seconds
        pub elapsed_seconds: f64,
    }

    /// Runs a scan with the provided configuration.
    ///
    /// Reads targets from `config.file`, scans them, logs a summary and writes
    /// the CSV report to `config.output`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the input cannot be
    /// read, the scan input is structurally invalid, no job succeeded, or the
    /// report cannot be written.
    pub async fn run_scan(config: Config) -> Result<ScanReport> {
        config.validate()?;
        let start = Instant::now();

        let targets = read_targets(&config.file)?;
        let urls = resolve_targets(&targets, config.base_url.as_deref())?;

        let client = init_client().context("Failed to initialize HTTP client")?;
        let transport = Arc::new(ReqwestTransport::new(
            client,
            config.api_endpoint.clone(),
            config.api_key.clone(),
        ));
        let stats = Arc::new(ProcessingStats::new());

        let mut orchestrator = Orchestrator::new(transport).with_stats(Arc::clone(&stats));
        if config.validation_enabled() {
            let redirect_client =
                init_redirect_client().context("Failed to initialize redirect client")?;
            orchestrator = orchestrator
                .with_validator(UrlValidator::new(redirect_client, &config.shortlink_domains));
        } else {
            log::info!("URL validation disabled");
        }

        let settings = ScanSettings {
            concurrency: config.max_concurrency,
            rate_limit_rps: config.rate_limit_rps,
        };
        let outcome = orchestrator
            .scan(&urls, &config.strategies, settings)
            .await
            .context("Scan could not start")?;

        let averages = compute_averages(&outcome.records);
        log_summary(&outcome.records, &averages, &outcome.skipped);
        stats.log_summary();

        let successful = success_count(&outcome.records);
        if successful == 0 {
            anyhow::bail!(
                "No successful results out of {} job(s); check the API key and quota",
                outcome.records.len()
            );
        }

        export_csv(&outcome.records, &averages, &config.output)?;

        Ok(ScanReport {
            total_jobs: outcome.records.len(),
            successful,
            failed: outcome.records.len() - successful,
            skipped: outcome.skipped.len(),
            output_path: config.output,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        })
    }
}
