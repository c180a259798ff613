//! Batch runner: reconciles every resource of one backend catalog.

use tracing::{info, info_span, warn, Instrument};

use crate::backend::BackendConnector;
use crate::config::{merge_settings, BackendCatalog};
use crate::gate::ConnectionGate;
use crate::reconciler::ResourceReconciler;
use crate::report::{ReconciliationOutcome, RunReport};

pub struct BatchRunner<C: BackendConnector> {
    reconciler: ResourceReconciler<C>,
}

impl<C: BackendConnector> BatchRunner<C> {
    pub fn new(gate: ConnectionGate<C>) -> Self {
        Self {
            reconciler: ResourceReconciler::new(gate),
        }
    }

    pub fn gate(&self) -> &ConnectionGate<C> {
        self.reconciler.gate()
    }

    /// Reconciles the catalog's resources in document order.
    ///
    /// Per-resource failures are recorded and the batch moves on. A
    /// backend-fatal failure (unreachable backend, cancellation) stops the
    /// batch; the skipped resources get no entry in the report.
    pub async fn run(&mut self, catalog: &BackendCatalog, environment: &str) -> RunReport {
        let span = info_span!("batch", backend = %self.gate().name(), environment = %environment);
        self.run_inner(catalog, environment).instrument(span).await
    }

    async fn run_inner(&mut self, catalog: &BackendCatalog, environment: &str) -> RunReport {
        let mut report = RunReport::new(self.gate().name(), environment);
        let cancel = self.gate().cancel_token().clone();

        info!(
            "Processing {} {} {}...",
            catalog.resources.len(),
            self.gate().name(),
            catalog.service.collection_key()
        );

        for (index, resource) in catalog.resources.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!("Run cancelled, skipping remaining {}", catalog.service.collection_key());
                report.abort(format!(
                    "cancelled before '{}' ({} remaining)",
                    resource.name,
                    catalog.resources.len() - index
                ));
                break;
            }

            info!("Processing {}", resource.name);
            let settings = merge_settings(
                Some(&catalog.defaults),
                Some(&resource.defaults),
                resource.env_overrides(environment),
            );

            let outcome = self.reconciler.ensure(&resource.name, &settings).await;
            let fatal = match &outcome {
                ReconciliationOutcome::Failed(reason) if reason.is_backend_fatal() => {
                    Some(reason.to_string())
                }
                _ => None,
            };
            report.record(&resource.name, outcome);

            if let Some(reason) = fatal {
                let remaining = catalog.resources.len() - index - 1;
                warn!(
                    "Aborting {} batch, {} resource(s) not processed: {}",
                    self.gate().name(),
                    remaining,
                    reason
                );
                report.abort(reason);
                break;
            }
        }

        report.finish();
        info!("{}", report);
        report
    }
}
