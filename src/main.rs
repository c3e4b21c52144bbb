//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `pagespeed_scan` library that handles:
//! - Environment variable loading (.env file)
//! - Command-line argument parsing
//! - Logger initialization
//! - User-facing output and exit codes

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use pagespeed_scan::initialization::init_logger_with;
use pagespeed_scan::{run_scan, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // API_KEY and BASE_URL usually live in .env; try the current directory,
    // then next to the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    match run_scan(config).await {
        Ok(report) => {
            println!(
                "✅ Scanned {} job{} ({} succeeded, {} failed, {} URL{} skipped) in {:.1}s",
                report.total_jobs,
                if report.total_jobs == 1 { "" } else { "s" },
                report.successful,
                report.failed,
                report.skipped,
                if report.skipped == 1 { "" } else { "s" },
                report.elapsed_seconds
            );
            println!("Results saved in {}", report.output_path.display());
            Ok(())
        }
        Err(e) => {
            eprintln!("pagespeed_scan error: {:#}", e);
            process::exit(1);
        }
    }
}
