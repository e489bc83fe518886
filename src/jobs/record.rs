//! Job records as stored in the result cache and the view handed to pollers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::backtest::{BacktestParams, BacktestResult};
use crate::domain::price_bar::PriceBar;

/// Unique job identifier.
pub type JobId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Done,
    Error,
    /// Only ever produced by a poll; never stored.
    NotFound,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

/// Successful job output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    pub symbol: String,
    pub params: BacktestParams,
    pub bars: Vec<PriceBar>,
    pub result: BacktestResult,
}

impl JobPayload {
    /// A job that ran against an empty price series.
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// What the cache holds under `job:<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub status: JobStatus,
    pub symbol: String,
    pub submitted_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub payload: Option<JobPayload>,
    pub error: Option<String>,
}

impl JobRecord {
    pub fn running(symbol: &str) -> Self {
        JobRecord {
            status: JobStatus::Running,
            symbol: symbol.to_string(),
            submitted_at: Utc::now(),
            finished_at: None,
            payload: None,
            error: None,
        }
    }

    pub fn done(self, payload: JobPayload) -> Self {
        JobRecord {
            status: JobStatus::Done,
            finished_at: Some(Utc::now()),
            payload: Some(payload),
            error: None,
            ..self
        }
    }

    pub fn failed(self, message: impl Into<String>) -> Self {
        JobRecord {
            status: JobStatus::Error,
            finished_at: Some(Utc::now()),
            payload: None,
            error: Some(message.into()),
            ..self
        }
    }
}

/// Poll result returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobView {
    pub job_id: JobId,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<JobPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobView {
    pub fn not_found(job_id: &str) -> Self {
        JobView {
            job_id: job_id.to_string(),
            status: JobStatus::NotFound,
            symbol: None,
            submitted_at: None,
            finished_at: None,
            payload: None,
            error: None,
        }
    }

    pub fn from_record(job_id: &str, record: JobRecord) -> Self {
        JobView {
            job_id: job_id.to_string(),
            status: record.status,
            symbol: Some(record.symbol),
            submitted_at: Some(record.submitted_at),
            finished_at: record.finished_at,
            payload: record.payload,
            error: record.error,
        }
    }

    /// Done, but the price source had nothing for the symbol.
    pub fn is_no_data(&self) -> bool {
        self.status == JobStatus::Done && self.payload.as_ref().is_none_or(JobPayload::is_empty)
    }
}
