//! Scripted in-memory backend shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use infra_init::backend::error::Result;
use infra_init::{
    BackendConnector, BackendError, CreateStatus, ResourceBackend, ResourceRequest, RetryPolicy,
};

/// What the fake backend answers to a create for a given name.
#[derive(Debug, Clone)]
pub enum CreateScript {
    /// Another initializer created it between our check and our create.
    RaceAlreadyExists,
    /// Rejected with an HTTP-style error.
    Reject(String),
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub existing: BTreeSet<String>,
    /// Probes fail while this is non-zero; each failed probe decrements it.
    pub probe_failures: u32,
    pub probe_always_fails: bool,
    pub list_fails: bool,
    pub scripts: HashMap<String, CreateScript>,

    pub connects: u32,
    pub probes: u32,
    pub lists: u32,
    pub creates: Vec<ResourceRequest>,
}

/// Connector handing out handles over one shared [`FakeState`].
#[derive(Clone)]
pub struct FakeConnector {
    name: String,
    state: Arc<Mutex<FakeState>>,
}

impl FakeConnector {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    pub fn with_existing(self, names: &[&str]) -> Self {
        self.state()
            .existing
            .extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn with_probe_failures(self, failures: u32) -> Self {
        self.state().probe_failures = failures;
        self
    }

    pub fn unreachable(self) -> Self {
        self.state().probe_always_fails = true;
        self
    }

    pub fn with_failing_list(self) -> Self {
        self.state().list_fails = true;
        self
    }

    pub fn with_script(self, name: &str, script: CreateScript) -> Self {
        self.state().scripts.insert(name.to_string(), script);
        self
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn created_names(&self) -> Vec<String> {
        self.state().creates.iter().map(|r| r.name.clone()).collect()
    }
}

#[async_trait]
impl BackendConnector for FakeConnector {
    type Backend = FakeBackend;

    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<FakeBackend> {
        self.state().connects += 1;
        Ok(FakeBackend {
            name: self.name.clone(),
            state: Arc::clone(&self.state),
        })
    }
}

pub struct FakeBackend {
    name: String,
    state: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl ResourceBackend for FakeBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.probes += 1;
        if state.probe_always_fails {
            return Err(BackendError::Connect("connection refused".into()));
        }
        if state.probe_failures > 0 {
            state.probe_failures -= 1;
            return Err(BackendError::Connect("connection refused".into()));
        }
        Ok(())
    }

    async fn list_resources(&self) -> Result<BTreeSet<String>> {
        let mut state = self.state.lock().unwrap();
        state.lists += 1;
        if state.list_fails {
            return Err(BackendError::Http {
                status: 503,
                body: "metadata unavailable".into(),
            });
        }
        Ok(state.existing.clone())
    }

    async fn create_resource(&self, request: &ResourceRequest) -> Result<CreateStatus> {
        let mut state = self.state.lock().unwrap();
        state.creates.push(request.clone());
        match state.scripts.get(&request.name).cloned() {
            Some(CreateScript::RaceAlreadyExists) => {
                state.existing.insert(request.name.clone());
                Ok(CreateStatus::AlreadyExists)
            }
            Some(CreateScript::Reject(message)) => Err(BackendError::Http {
                status: 400,
                body: message,
            }),
            None => {
                if state.existing.insert(request.name.clone()) {
                    Ok(CreateStatus::Created)
                } else {
                    Ok(CreateStatus::AlreadyExists)
                }
            }
        }
    }
}

/// Retry policy with no real waiting.
pub fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries, Duration::from_millis(1))
}

/// Parses an inline YAML mapping.
pub fn mapping(yaml: &str) -> serde_yaml::Mapping {
    serde_yaml::from_str(yaml).unwrap()
}
