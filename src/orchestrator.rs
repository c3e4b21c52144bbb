//! Scan orchestration.
//!
//! Expands validated URLs into (URL, strategy) jobs and drains them through a
//! fixed pool of worker tasks sharing one rate limiter. Workers hand results
//! to a single collector over a channel; the collector places each record in
//! its output slot by `sequence_index`, so the returned order never depends on
//! completion order.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::config::LOGGING_INTERVAL;
use crate::error_handling::{ErrorType, InfoType, ProcessingStats, ScanError, UrlRejection};
use crate::extract::extract_result;
use crate::fetch::{FetchOutcome, Fetcher, Transport};
use crate::initialization::init_rate_limiter;
use crate::models::{Job, ResultRecord, Strategy};
use crate::validation::UrlValidator;

/// Worker-pool settings for one scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanSettings {
    /// Number of worker tasks (at least 1)
    pub concurrency: usize,
    /// Aggregate request rate across all workers, requests per second
    pub rate_limit_rps: f64,
}

/// An input URL that the validator refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedUrl {
    pub url: String,
    pub reason: UrlRejection,
}

/// Everything a scan produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    /// One record per job, in expansion order
    pub records: Vec<ResultRecord>,
    /// Inputs dropped by validation before any request was made
    pub skipped: Vec<SkippedUrl>,
}

/// Builds jobs URL-major: every strategy of the first URL, then the next URL.
pub fn expand_jobs(urls: &[String], strategies: &[Strategy]) -> Vec<Job> {
    urls.iter()
        .flat_map(|url| strategies.iter().map(move |strategy| (url, *strategy)))
        .enumerate()
        .map(|(sequence_index, (url, strategy))| Job {
            url: url.clone(),
            strategy,
            sequence_index,
        })
        .collect()
}

/// Runs scans against a [`Transport`].
pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    validator: Option<Arc<UrlValidator>>,
    stats: Arc<ProcessingStats>,
}

impl Orchestrator {
    /// Creates an orchestrator with validation disabled.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            validator: None,
            stats: Arc::new(ProcessingStats::new()),
        }
    }

    /// Validates and sanitizes every URL before it becomes a job.
    pub fn with_validator(mut self, validator: UrlValidator) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Shares a statistics collector with the caller.
    pub fn with_stats(mut self, stats: Arc<ProcessingStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> &Arc<ProcessingStats> {
        &self.stats
    }

    /// Scans every URL under every strategy.
    ///
    /// Returns once every job has a record. Individual job failures, including
    /// panics inside a worker, become failure records and never abort the scan.
    ///
    /// # Errors
    ///
    /// Returns a `ScanError` only for structurally invalid input: no URLs, no
    /// strategies, zero concurrency, a non-positive rate, or every URL
    /// rejected by validation.
    pub async fn scan(
        &self,
        urls: &[String],
        strategies: &[Strategy],
        settings: ScanSettings,
    ) -> Result<ScanOutcome, ScanError> {
        if urls.is_empty() {
            return Err(ScanError::NoUrls);
        }
        if strategies.is_empty() {
            return Err(ScanError::NoStrategies);
        }
        if settings.concurrency == 0 {
            return Err(ScanError::InvalidConcurrency);
        }
        if !settings.rate_limit_rps.is_finite() || settings.rate_limit_rps <= 0.0 {
            return Err(ScanError::InvalidRate(settings.rate_limit_rps));
        }

        let (targets, skipped) = self.validate_all(urls).await;
        if targets.is_empty() {
            return Err(ScanError::NoJobs(urls.len()));
        }

        let jobs = expand_jobs(&targets, strategies);
        let records = self.run_jobs(jobs, settings).await;

        Ok(ScanOutcome { records, skipped })
    }

    async fn validate_all(&self, urls: &[String]) -> (Vec<String>, Vec<SkippedUrl>) {
        let Some(validator) = &self.validator else {
            return (urls.to_vec(), Vec::new());
        };

        let mut targets = Vec::with_capacity(urls.len());
        let mut skipped = Vec::new();
        for url in urls {
            match validator.validate(url).await {
                Ok(validated) => {
                    if validated.resolved_from.is_some() {
                        self.stats.increment_info(InfoType::ShortlinkResolved);
                    }
                    targets.push(validated.url);
                }
                Err(reason) => {
                    log::warn!("Skipping {}: {}", url, reason);
                    self.stats.increment_info(InfoType::UrlSkipped);
                    skipped.push(SkippedUrl {
                        url: url.clone(),
                        reason,
                    });
                }
            }
        }
        (targets, skipped)
    }

    async fn run_jobs(&self, jobs: Vec<Job>, settings: ScanSettings) -> Vec<ResultRecord> {
        let total = jobs.len();
        let worker_count = settings.concurrency.min(total);
        let fetcher = Arc::new(Fetcher::new(
            Arc::clone(&self.transport),
            init_rate_limiter(settings.rate_limit_rps),
            Arc::clone(&self.stats),
        ));

        log::info!(
            "Scanning {} job(s) with {} worker(s) at {} request(s)/s",
            total,
            worker_count,
            settings.rate_limit_rps
        );

        // Every job is queued up front; workers drain the queue until it closes
        let (job_tx, job_rx) = mpsc::channel(total);
        let mut pending = Vec::with_capacity(total);
        for job in jobs {
            pending.push((job.url.clone(), job.strategy));
            if job_tx.send(job).await.is_err() {
                break;
            }
        }
        drop(job_tx);
        let queue = Arc::new(Mutex::new(job_rx));

        let (result_tx, mut result_rx) = mpsc::unbounded_channel();
        let completed = Arc::new(AtomicUsize::new(0));
        let workers: Vec<_> = (0..worker_count)
            .map(|worker_id| {
                tokio::spawn(worker(
                    worker_id,
                    Arc::clone(&queue),
                    Arc::clone(&fetcher),
                    Arc::clone(&self.stats),
                    result_tx.clone(),
                ))
            })
            .collect();
        drop(result_tx);

        let cancel = CancellationToken::new();
        let progress = tokio::spawn(log_progress(
            cancel.child_token(),
            Arc::clone(&completed),
            total,
        ));

        let mut slots: Vec<Option<ResultRecord>> = vec![None; total];
        while let Some((sequence_index, record)) = result_rx.recv().await {
            match slots.get_mut(sequence_index) {
                Some(slot) if slot.is_none() => *slot = Some(record),
                Some(_) => log::error!("Duplicate result for job {}", sequence_index),
                None => log::error!("Result for unknown job {}", sequence_index),
            }
            completed.fetch_add(1, Ordering::SeqCst);
        }

        for handle in workers {
            if let Err(join_error) = handle.await {
                log::error!("Worker task ended abnormally: {}", join_error);
            }
        }
        cancel.cancel();
        if let Err(join_error) = progress.await {
            log::debug!("Progress logger ended abnormally: {}", join_error);
        }

        slots
            .into_iter()
            .zip(pending)
            .enumerate()
            .map(|(sequence_index, (slot, (url, strategy)))| {
                slot.unwrap_or_else(|| {
                    log::error!("No result collected for job {}", sequence_index);
                    self.stats.increment_error(ErrorType::InternalFault);
                    ResultRecord::failed(url, strategy, "Internal error: job produced no result")
                })
            })
            .collect()
    }
}

async fn worker(
    worker_id: usize,
    queue: Arc<Mutex<mpsc::Receiver<Job>>>,
    fetcher: Arc<Fetcher>,
    stats: Arc<ProcessingStats>,
    results: mpsc::UnboundedSender<(usize, ResultRecord)>,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };

        log::debug!(
            "Worker {} processing {} ({})",
            worker_id,
            job.url,
            job.strategy
        );
        let record = run_isolated(&fetcher, &stats, &job).await;
        if results.send((job.sequence_index, record)).is_err() {
            break;
        }
    }
}

/// Runs one job, turning a panic anywhere inside it into a failure record.
async fn run_isolated(fetcher: &Fetcher, stats: &ProcessingStats, job: &Job) -> ResultRecord {
    match AssertUnwindSafe(process_job(fetcher, job))
        .catch_unwind()
        .await
    {
        Ok(record) => record,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            log::error!(
                "Internal fault while processing {} ({}): {}",
                job.url,
                job.strategy,
                message
            );
            stats.increment_error(ErrorType::InternalFault);
            ResultRecord::failed(
                job.url.clone(),
                job.strategy,
                format!("Internal error: {message}"),
            )
        }
    }
}

async fn process_job(fetcher: &Fetcher, job: &Job) -> ResultRecord {
    match fetcher.fetch(job).await {
        FetchOutcome::Success { payload, .. } => extract_result(&job.url, job.strategy, &payload),
        FetchOutcome::Failure(failure) => {
            ResultRecord::failed(job.url.clone(), job.strategy, failure.message)
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

async fn log_progress(cancel: CancellationToken, completed: Arc<AtomicUsize>, total: usize) {
    let start = tokio::time::Instant::now();
    let mut interval = tokio::time::interval(Duration::from_secs(LOGGING_INTERVAL));
    // the first tick completes immediately
    interval.tick().await;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let done = completed.load(Ordering::SeqCst);
                log::info!(
                    "Completed {}/{} job(s) in {:.1}s",
                    done,
                    total,
                    start.elapsed().as_secs_f64()
                );
            }
            _ = cancel.cancelled() => break,
        }
    }
}
