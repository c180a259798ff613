//! Resource backends.
//!
//! The reconciliation core only talks to a backend through [`ResourceBackend`]:
//! a readiness probe, a listing of the resources that currently exist, and a
//! create call with a three-way result. Handles are built lazily through a
//! [`BackendConnector`], which lets the connection gate own the handle.

pub mod buckets;
pub mod error;
pub mod request;
pub mod topics;

use std::collections::BTreeSet;

use async_trait::async_trait;

pub use buckets::{CouchbaseBucketBackend, CouchbaseConnector};
pub use error::BackendError;
pub use request::{stringify_value, ResourceRequest};
pub use topics::{KafkaAdminConnector, KafkaTopicBackend};

/// Result of a create call that the backend accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStatus {
    /// The resource was created by this call.
    Created,
    /// The resource already existed (e.g. another initializer won the race).
    AlreadyExists,
}

/// Capability a backend must expose to be reconciled.
#[async_trait]
pub trait ResourceBackend: Send + Sync {
    /// Short backend name used in logs and reports (e.g. `redpanda`).
    fn name(&self) -> &str;

    /// Lightweight readiness check.
    async fn probe(&self) -> error::Result<()>;

    /// Names of all resources currently known to the backend.
    async fn list_resources(&self) -> error::Result<BTreeSet<String>>;

    /// Submits a create for one resource.
    async fn create_resource(&self, request: &ResourceRequest) -> error::Result<CreateStatus>;
}

/// Builds backend handles on demand.
#[async_trait]
pub trait BackendConnector: Send + Sync {
    type Backend: ResourceBackend;

    /// Backend name, available before any handle exists.
    fn name(&self) -> &str;

    /// Constructs a new handle. Does not have to contact the backend.
    async fn connect(&self) -> error::Result<Self::Backend>;
}
