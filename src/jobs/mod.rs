//! Background backtest jobs tracked through the result cache.
//!
//! `submit` writes a `running` record before anything is scheduled, so an
//! immediate `poll` never sees a stale state. Each job then waits for a
//! permit from a bounded pool and, on tokio's blocking threads, runs and
//! writes its terminal record (`done` or `error`). Every cache access is
//! blocking I/O, so callers on an async thread go through `spawn_blocking`.

pub mod record;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::domain::backtest::{run_backtest, BacktestParams};
use crate::domain::error::DeskError;
use crate::domain::price_bar::normalize_symbol;
use crate::ports::cache_port::{CacheExt, CachePort};
use crate::ports::price_port::PricePort;

pub use record::{JobId, JobPayload, JobRecord, JobStatus, JobView};

pub fn job_key(id: &str) -> String {
    format!("job:{id}")
}

/// Fetch prices and run the engine. Shared by the job workers and the CLI.
pub fn execute_backtest(
    prices: &dyn PricePort,
    symbol: &str,
    days: usize,
    params: &BacktestParams,
) -> Result<JobPayload, DeskError> {
    let bars = prices.fetch(symbol, days)?;
    if bars.is_empty() {
        warn!("{}: no price data for {symbol}", prices.name());
    }
    let result = run_backtest(&bars, params);
    Ok(JobPayload {
        symbol: symbol.to_string(),
        params: params.clone(),
        bars,
        result,
    })
}

pub struct JobRunner {
    cache: Arc<dyn CachePort>,
    prices: Arc<dyn PricePort>,
    permits: Arc<Semaphore>,
    job_ttl: Option<Duration>,
    days: usize,
}

impl JobRunner {
    pub fn new(
        cache: Arc<dyn CachePort>,
        prices: Arc<dyn PricePort>,
        max_concurrent: usize,
        job_ttl: Option<Duration>,
        days: usize,
    ) -> Self {
        JobRunner {
            cache,
            prices,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            job_ttl,
            days,
        }
    }

    /// Queue a backtest and return its id without waiting for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, symbol: &str, params: BacktestParams) -> Result<JobId, DeskError> {
        self.submit_tracked(symbol, params).map(|(id, _)| id)
    }

    /// Like [`submit`](Self::submit) but also hands back the worker handle so
    /// callers (tests, the CLI) can wait for the terminal write.
    pub fn submit_tracked(
        &self,
        symbol: &str,
        params: BacktestParams,
    ) -> Result<(JobId, JoinHandle<()>), DeskError> {
        let symbol = normalize_symbol(symbol);
        if symbol.is_empty() {
            return Err(DeskError::validation("symbol is required"));
        }
        params.validate()?;
        if self.permits.is_closed() {
            return Err(DeskError::Computation {
                reason: "job runner is shut down".into(),
            });
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| DeskError::Computation {
            reason: format!("no async runtime: {e}"),
        })?;

        let id = uuid::Uuid::new_v4().to_string();
        let key = job_key(&id);
        let running = JobRecord::running(&symbol);
        self.cache.set_json(&key, &running, self.job_ttl)?;
        info!("job {id}: submitted backtest for {symbol}");

        let cache = Arc::clone(&self.cache);
        let prices = Arc::clone(&self.prices);
        let permits = Arc::clone(&self.permits);
        let ttl = self.job_ttl;
        let days = self.days;
        let job_id = id.clone();

        let handle = runtime.spawn(async move {
            let permit = permits.acquire_owned().await;
            let worker_id = job_id.clone();
            let worker = tokio::task::spawn_blocking(move || {
                let record = match permit {
                    Ok(_permit) => {
                        debug!("job {job_id}: started");
                        run_job(prices.as_ref(), &job_id, days, &params, running)
                    }
                    Err(_) => {
                        warn!("job {job_id}: runner shut down before start");
                        running.failed("job runner shut down before the job started")
                    }
                };
                store_terminal(cache.as_ref(), &job_id, &record, ttl);
            });
            if let Err(e) = worker.await {
                error!("job {worker_id}: worker did not finish: {e}");
            }
        });

        Ok((id, handle))
    }

    /// Current state of a job. Unknown and expired ids read as `not_found`.
    pub fn poll(&self, id: &str) -> Result<JobView, DeskError> {
        Ok(match self.cache.get_json::<JobRecord>(&job_key(id))? {
            Some(record) => JobView::from_record(id, record),
            None => JobView::not_found(id),
        })
    }

    /// Stop accepting work. Jobs already running finish normally; jobs still
    /// waiting for a permit are recorded as errors.
    pub fn shutdown(&self) {
        info!("job runner shutting down");
        self.permits.close();
    }

    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }
}

/// Runs on a blocking thread; a panic in the engine or the price source
/// becomes an error record.
fn run_job(
    prices: &dyn PricePort,
    job_id: &str,
    days: usize,
    params: &BacktestParams,
    running: JobRecord,
) -> JobRecord {
    let symbol = running.symbol.clone();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        execute_backtest(prices, &symbol, days, params)
    }));
    match outcome {
        Ok(Ok(payload)) => {
            info!(
                "job {job_id}: done ({} bars, strategy {:.4})",
                payload.bars.len(),
                payload.result.final_strategy()
            );
            running.done(payload)
        }
        Ok(Err(e)) => {
            error!("job {job_id}: {symbol} failed: {e}");
            running.failed(e.to_string())
        }
        Err(panic) => {
            let message = panic_message(panic);
            error!("job {job_id}: {symbol} aborted: {message}");
            running.failed(message)
        }
    }
}

/// Write the terminal record. When that write fails, a bare error record
/// without the payload is tried once so the job does not stay `running`.
fn store_terminal(cache: &dyn CachePort, job_id: &str, record: &JobRecord, ttl: Option<Duration>) {
    let key = job_key(job_id);
    let Err(e) = cache.set_json(&key, record, ttl) else {
        return;
    };
    error!("job {job_id}: could not store result: {e}");
    let fallback = record
        .clone()
        .failed(format!("could not store job result: {e}"));
    if let Err(e) = cache.set_json(&key, &fallback, ttl) {
        error!("job {job_id}: could not store failure record either: {e}");
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("job panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("job panicked: {s}")
    } else {
        "job panicked".to_string()
    }
}
