//! Run orchestration: environment gate, catalog loading, one batch per backend.

use std::fmt;

use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::backend::BackendConnector;
use crate::cancel::CancelToken;
use crate::config::{BackendCatalog, ConfigLoader, Service};
use crate::environment::validate_environment;
use crate::error::Result;
use crate::gate::{ConnectionGate, RetryPolicy};
use crate::report::RunReport;
use crate::runner::BatchRunner;

/// Validated inputs for a run. Building one never contacts a backend.
#[derive(Debug, Clone)]
pub struct InitPlan {
    pub environment: String,
    /// One catalog per requested service, in run order.
    pub catalogs: Vec<BackendCatalog>,
}

/// Drives one init run.
pub struct InitRunner {
    loader: ConfigLoader,
    environment: String,
    policy: RetryPolicy,
    cancel: CancelToken,
    run_id: Uuid,
}

impl InitRunner {
    pub fn new(loader: ConfigLoader, environment: impl Into<String>) -> Self {
        Self {
            loader,
            environment: environment.into(),
            policy: RetryPolicy::default(),
            cancel: CancelToken::new(),
            run_id: Uuid::new_v4(),
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Validates the environment and loads every requested catalog.
    ///
    /// Fails with `InvalidEnvironment` or `ConfigurationMissing` before any
    /// backend is contacted.
    pub fn prepare(&self, services: &[Service]) -> Result<InitPlan> {
        info!("Environment: {}", self.environment);
        info!(
            "Services: {}",
            services
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );

        let environments = self.loader.load_environments()?;
        validate_environment(&self.environment, &environments)?;

        let catalogs = services
            .iter()
            .map(|service| self.loader.load_catalog(*service))
            .collect::<Result<Vec<_>>>()?;

        Ok(InitPlan {
            environment: self.environment.clone(),
            catalogs,
        })
    }

    /// Reconciles one backend's catalog through `connector`.
    pub async fn run_catalog<C: BackendConnector>(
        &self,
        catalog: &BackendCatalog,
        connector: C,
    ) -> RunReport {
        let gate = ConnectionGate::new(connector, self.policy).with_cancel(self.cancel.clone());
        let mut runner = BatchRunner::new(gate);

        let span = info_span!("init", run_id = %self.run_id);
        runner
            .run(catalog, &self.environment)
            .instrument(span)
            .await
    }
}

/// Aggregated reports of a run; decides the process exit status.
#[derive(Debug, Clone, Default)]
pub struct InitSummary {
    pub reports: Vec<RunReport>,
}

impl InitSummary {
    pub fn push(&mut self, report: RunReport) {
        self.reports.push(report);
    }

    pub fn is_success(&self) -> bool {
        self.reports.iter().all(RunReport::is_clean)
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

impl fmt::Display for InitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, report) in self.reports.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", report)?;
            for failed in report.failed() {
                write!(f, "\n  {}: {}", failed.name, failed.outcome)?;
            }
        }
        Ok(())
    }
}
