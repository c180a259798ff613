//! Startup provisioning of broker topics and datastore buckets.
//!
//! The core is a declarative "ensure this resource exists" engine:
//! settings are merged per environment, a connection gate waits for the
//! backend, and each resource is created only if the backend does not
//! already have it.

pub mod backend;
pub mod cancel;
pub mod config;
pub mod environment;
pub mod error;
pub mod gate;
pub mod init;
pub mod logging;
pub mod reconciler;
pub mod report;
pub mod runner;
pub mod secrets;

pub use backend::{BackendConnector, BackendError, CreateStatus, ResourceBackend, ResourceRequest};
pub use cancel::CancelToken;
pub use config::{
    merge_settings, BackendCatalog, ConfigLoader, EffectiveSettings, EnvironmentCatalog,
    ResourceSpec, Service,
};
pub use environment::{is_valid_environment, validate_environment};
pub use error::{InitError, Result};
pub use gate::{Backoff, ConnectionGate, RetryPolicy};
pub use init::{InitPlan, InitRunner, InitSummary};
pub use reconciler::ResourceReconciler;
pub use report::{FailureReason, ReconciliationOutcome, ResourceResult, RunReport};
pub use runner::BatchRunner;
