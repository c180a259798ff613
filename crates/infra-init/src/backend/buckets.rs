//! Bucket backend using the Couchbase cluster REST API.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::{BackendError, Result};
use super::request::ResourceRequest;
use super::{BackendConnector, CreateStatus, ResourceBackend};

/// Form field carrying the replica count.
const REPLICA_FIELD: &str = "replicaNumber";

/// Connection settings for the Couchbase management API.
#[derive(Debug)]
pub struct CouchbaseSettings {
    /// Base URL, e.g. `http://couchbase:8091`.
    pub base_url: String,
    pub username: String,
    pub password: SecretString,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl CouchbaseSettings {
    pub fn new(host: &str, port: u16, username: impl Into<String>, password: SecretString) -> Self {
        Self {
            base_url: format!("http://{}:{}", host, port),
            username: username.into(),
            password,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Builds [`CouchbaseBucketBackend`] handles.
pub struct CouchbaseConnector {
    settings: CouchbaseSettings,
}

impl CouchbaseConnector {
    pub fn new(settings: CouchbaseSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl BackendConnector for CouchbaseConnector {
    type Backend = CouchbaseBucketBackend;

    fn name(&self) -> &str {
        "couchbase"
    }

    async fn connect(&self) -> Result<Self::Backend> {
        let client = Client::builder()
            .connect_timeout(self.settings.timeout)
            .timeout(self.settings.timeout)
            .build()
            .map_err(|e| BackendError::Connect(format!("Failed to create HTTP client: {}", e)))?;

        Ok(CouchbaseBucketBackend {
            client,
            base_url: self.settings.base_url.trim_end_matches('/').to_string(),
            username: self.settings.username.clone(),
            password: SecretString::from(self.settings.password.expose_secret().to_string()),
        })
    }
}

/// Bucket backend handle.
pub struct CouchbaseBucketBackend {
    client: Client,
    base_url: String,
    username: String,
    password: SecretString,
}

#[derive(Debug, Deserialize)]
struct BucketInfo {
    name: String,
}

impl CouchbaseBucketBackend {
    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.basic_auth(&self.username, Some(self.password.expose_secret()))
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.authed(self.client.get(&url)).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ResourceBackend for CouchbaseBucketBackend {
    fn name(&self) -> &str {
        "couchbase"
    }

    async fn probe(&self) -> Result<()> {
        self.get("/pools/default").await.map(|_| ())
    }

    async fn list_resources(&self) -> Result<BTreeSet<String>> {
        let buckets: Vec<BucketInfo> = self
            .get("/pools/default/buckets")
            .await?
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(buckets.into_iter().map(|b| b.name).collect())
    }

    async fn create_resource(&self, request: &ResourceRequest) -> Result<CreateStatus> {
        let url = format!("{}/pools/default/buckets", self.base_url);
        let form = create_bucket_form(request);
        debug!(
            "Creating bucket '{}' with {} form fields",
            request.name,
            form.len()
        );

        let response = self.authed(self.client.post(&url)).form(&form).send().await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        let outcome = classify_create_response(status, &text)?;
        if outcome == CreateStatus::AlreadyExists {
            info!("Couchbase reports bucket '{}' already exists", request.name);
        }
        Ok(outcome)
    }
}

/// Form fields for a create-bucket call.
///
/// The replication factor counts copies, Couchbase counts extra replicas,
/// hence the `- 1`. An explicit `replicaNumber` in the config map wins.
fn create_bucket_form(request: &ResourceRequest) -> Vec<(String, String)> {
    let mut form = vec![("name".to_string(), request.name.clone())];
    if !request.config.contains_key(REPLICA_FIELD) {
        form.push((
            REPLICA_FIELD.to_string(),
            request.replication.saturating_sub(1).to_string(),
        ));
    }
    form.extend(
        request
            .config
            .iter()
            .filter(|(k, _)| k.as_str() != "name")
            .map(|(k, v)| (k.clone(), v.clone())),
    );
    form
}

fn classify_create_response(status: StatusCode, body: &str) -> Result<CreateStatus> {
    if status.is_success() {
        return Ok(CreateStatus::Created);
    }

    if status == StatusCode::BAD_REQUEST && body.to_lowercase().contains("already exists") {
        return Ok(CreateStatus::AlreadyExists);
    }

    Err(BackendError::Http {
        status: status.as_u16(),
        body: body.to_string(),
    })
}
