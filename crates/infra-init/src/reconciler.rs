//! Per-resource reconciliation: check existence, create only if absent.

use tracing::{debug, error, info, info_span, Instrument};

use crate::backend::{BackendConnector, CreateStatus, ResourceBackend, ResourceRequest};
use crate::config::EffectiveSettings;
use crate::error::InitError;
use crate::gate::ConnectionGate;
use crate::report::{FailureReason, ReconciliationOutcome};

/// Ensures resources exist on one backend.
///
/// Idempotent: backend state is re-queried on every call, so a second
/// `ensure` for the same resource reports `AlreadyExists` instead of
/// creating it again.
pub struct ResourceReconciler<C: BackendConnector> {
    gate: ConnectionGate<C>,
}

impl<C: BackendConnector> ResourceReconciler<C> {
    pub fn new(gate: ConnectionGate<C>) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &ConnectionGate<C> {
        &self.gate
    }

    /// Reconciles one resource against the backend.
    pub async fn ensure(&mut self, name: &str, settings: &EffectiveSettings) -> ReconciliationOutcome {
        let span = info_span!("resource", backend = %self.gate.name(), name = %name);
        self.ensure_inner(name, settings).instrument(span).await
    }

    async fn ensure_inner(&mut self, name: &str, settings: &EffectiveSettings) -> ReconciliationOutcome {
        let cancel = self.gate.cancel_token().clone();

        let backend = match self.gate.acquire().await {
            Ok(backend) => backend,
            Err(e) => return ReconciliationOutcome::Failed(gate_failure(e)),
        };

        if cancel.is_cancelled() {
            return ReconciliationOutcome::Failed(FailureReason::Cancelled);
        }

        match backend.list_resources().await {
            Ok(existing) if existing.contains(name) => {
                info!("Resource '{}' already exists", name);
                return ReconciliationOutcome::AlreadyExists;
            }
            Ok(_) => {}
            Err(e) => {
                error!("Error checking if resource '{}' exists: {}", name, e);
                return ReconciliationOutcome::Failed(FailureReason::ExistenceCheck(e.to_string()));
            }
        }

        let request = match ResourceRequest::from_settings(name, settings) {
            Ok(request) => request,
            Err(e) => {
                error!("Invalid settings for resource '{}': {}", name, e);
                return ReconciliationOutcome::Failed(FailureReason::InvalidSettings(e.to_string()));
            }
        };

        if cancel.is_cancelled() {
            return ReconciliationOutcome::Failed(FailureReason::Cancelled);
        }

        info!("Creating resource '{}'...", name);
        debug!(
            "partitions={} replication={} config={:?}",
            request.partitions, request.replication, request.config
        );

        match backend.create_resource(&request).await {
            Ok(CreateStatus::Created) => {
                info!("Resource '{}' created successfully", name);
                ReconciliationOutcome::Created
            }
            Ok(CreateStatus::AlreadyExists) => {
                info!("Resource '{}' already exists (created concurrently)", name);
                ReconciliationOutcome::AlreadyExists
            }
            Err(e) => {
                error!("Error creating resource '{}': {}", name, e);
                ReconciliationOutcome::Failed(FailureReason::CreateRejected(e.to_string()))
            }
        }
    }
}

fn gate_failure(err: InitError) -> FailureReason {
    match err {
        InitError::Cancelled => FailureReason::Cancelled,
        other => FailureReason::BackendUnavailable(other.to_string()),
    }
}
