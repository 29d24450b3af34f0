use crate::domain::ports::ScrapeJob;
use crate::utils::error::{Result, ScrapeError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const PROGRESS_INTERVAL: usize = 25;

#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Upper bound on in-flight `process` calls.
    pub concurrency: usize,
    /// Pause between task dispatches, the politeness delay toward the site.
    pub delay_ms: u64,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            delay_ms: 80,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSummary {
    pub pending: usize,
    pub processed: usize,
    pub rows_appended: usize,
    pub failed: usize,
    /// True when the stop flag cut the run short of dispatching everything.
    pub stopped: bool,
}

/// Drives a [`ScrapeJob`] through a bounded worker pool. Per-item failures
/// are logged and counted, never fatal. When the stop flag is raised no new
/// items are dispatched; in-flight items finish and their rows persist.
pub struct JobRunner {
    options: RunnerOptions,
    stop: Arc<AtomicBool>,
}

impl JobRunner {
    pub fn new(options: RunnerOptions) -> Self {
        Self {
            options,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub async fn run<J>(&self, job: Arc<J>) -> Result<JobSummary>
    where
        J: ScrapeJob + 'static,
    {
        let items = job.pending().await?;
        let total = items.len();
        tracing::info!(job = job.name(), pending = total, "starting scrape run");

        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));
        let mut tasks: JoinSet<(String, Result<usize>)> = JoinSet::new();
        let mut dispatched = 0usize;

        for item in items {
            if self.stop.load(Ordering::Relaxed) {
                tracing::warn!(job = job.name(), "stop requested, not dispatching further items");
                break;
            }

            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| ScrapeError::ProcessingError {
                    message: "worker pool closed unexpectedly".to_string(),
                })?;
            let job = Arc::clone(&job);
            let label = job.label(&item);
            tasks.spawn(async move {
                let _permit = permit;
                let result = job.process(item).await;
                (label, result)
            });
            dispatched += 1;

            if self.options.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.options.delay_ms)).await;
            }
        }

        let mut summary = JobSummary {
            pending: total,
            stopped: dispatched < total,
            ..JobSummary::default()
        };

        let mut done = 0usize;
        while let Some(joined) = tasks.join_next().await {
            done += 1;
            match joined {
                Ok((_, Ok(rows))) => {
                    summary.processed += 1;
                    summary.rows_appended += rows;
                }
                Ok((label, Err(e))) => {
                    summary.failed += 1;
                    tracing::warn!(job = job.name(), item = %label, error = %e, "item failed, skipping");
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(job = job.name(), error = %e, "worker task aborted");
                }
            }
            if done % PROGRESS_INTERVAL == 0 {
                tracing::info!(job = job.name(), done, dispatched, "progress");
            }
        }

        tracing::info!(
            job = job.name(),
            processed = summary.processed,
            rows = summary.rows_appended,
            failed = summary.failed,
            stopped = summary.stopped,
            "scrape run finished"
        );
        Ok(summary)
    }
}
