//! Per-resource outcomes and the per-backend run report.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Why a resource could not be reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FailureReason {
    /// Existence could not be confirmed, so no create was attempted.
    ExistenceCheck(String),
    /// The backend rejected the create for a reason other than "already exists".
    CreateRejected(String),
    /// Effective settings could not be turned into a create request.
    InvalidSettings(String),
    /// Connection retries were exhausted.
    BackendUnavailable(String),
    /// The run was cancelled.
    Cancelled,
}

impl FailureReason {
    /// Failures after which no further resource of the same backend is attempted.
    pub fn is_backend_fatal(&self) -> bool {
        matches!(
            self,
            FailureReason::BackendUnavailable(_) | FailureReason::Cancelled
        )
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::ExistenceCheck(e) => write!(f, "existence check failed: {}", e),
            FailureReason::CreateRejected(e) => write!(f, "create rejected: {}", e),
            FailureReason::InvalidSettings(e) => write!(f, "invalid settings: {}", e),
            FailureReason::BackendUnavailable(e) => write!(f, "backend unavailable: {}", e),
            FailureReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Terminal state of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ReconciliationOutcome {
    AlreadyExists,
    Created,
    Failed(FailureReason),
}

impl ReconciliationOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ReconciliationOutcome::Failed(_))
    }

    pub fn is_backend_fatal(&self) -> bool {
        match self {
            ReconciliationOutcome::Failed(reason) => reason.is_backend_fatal(),
            _ => false,
        }
    }
}

impl fmt::Display for ReconciliationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconciliationOutcome::AlreadyExists => write!(f, "already exists"),
            ReconciliationOutcome::Created => write!(f, "created"),
            ReconciliationOutcome::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Outcome for one resource, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceResult {
    pub name: String,
    pub outcome: ReconciliationOutcome,
}

/// Everything that happened to one backend during a run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub backend: String,
    pub environment: String,
    pub results: Vec<ResourceResult>,
    /// Set when remaining resources were skipped after a backend-fatal failure.
    pub aborted: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    pub fn new(backend: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            environment: environment.into(),
            results: Vec::new(),
            aborted: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn record(&mut self, name: impl Into<String>, outcome: ReconciliationOutcome) {
        self.results.push(ResourceResult {
            name: name.into(),
            outcome,
        });
    }

    pub fn abort(&mut self, reason: impl Into<String>) {
        self.aborted = Some(reason.into());
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn created(&self) -> impl Iterator<Item = &ResourceResult> {
        self.results
            .iter()
            .filter(|r| r.outcome == ReconciliationOutcome::Created)
    }

    pub fn already_existing(&self) -> impl Iterator<Item = &ResourceResult> {
        self.results
            .iter()
            .filter(|r| r.outcome == ReconciliationOutcome::AlreadyExists)
    }

    pub fn failed(&self) -> impl Iterator<Item = &ResourceResult> {
        self.results.iter().filter(|r| r.outcome.is_failed())
    }

    /// True when nothing failed and the batch was not aborted.
    pub fn is_clean(&self) -> bool {
        self.aborted.is_none() && self.failed().next().is_none()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} created, {} already present, {} failed",
            self.backend,
            self.created().count(),
            self.already_existing().count(),
            self.failed().count()
        )?;
        if let Some(reason) = &self.aborted {
            write!(f, " (aborted: {})", reason)?;
        }
        Ok(())
    }
}
