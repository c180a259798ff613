//! Topic backend speaking the Kafka protocol to the Redpanda brokers.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication, TopicResult};
use rdkafka::client::DefaultClientContext;
use rdkafka::error::RDKafkaErrorCode;
use rdkafka::util::Timeout;
use rdkafka::ClientConfig;

use super::error::{BackendError, Result};
use super::request::ResourceRequest;
use super::{BackendConnector, CreateStatus, ResourceBackend};

type Admin = AdminClient<DefaultClientContext>;

/// Connection settings for the broker admin client.
#[derive(Debug, Clone)]
pub struct KafkaAdminSettings {
    /// Comma-separated `host:port` list, e.g. `redpanda:9092`.
    pub bootstrap_servers: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl KafkaAdminSettings {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            bootstrap_servers: format!("{}:{}", host, port),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn client_config(&self) -> ClientConfig {
        let timeout_ms = self.timeout.as_millis().to_string();
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &self.bootstrap_servers)
            .set("socket.timeout.ms", &timeout_ms)
            .set("socket.connection.setup.timeout.ms", &timeout_ms);
        config
    }
}

/// Builds [`KafkaTopicBackend`] handles.
pub struct KafkaAdminConnector {
    settings: KafkaAdminSettings,
}

impl KafkaAdminConnector {
    pub fn new(settings: KafkaAdminSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl BackendConnector for KafkaAdminConnector {
    type Backend = KafkaTopicBackend;

    fn name(&self) -> &str {
        "redpanda"
    }

    async fn connect(&self) -> Result<Self::Backend> {
        let admin: Admin = self.settings.client_config().create().map_err(|e| {
            BackendError::Connect(format!("Failed to create admin client: {}", e))
        })?;

        Ok(KafkaTopicBackend {
            admin: Arc::new(admin),
            timeout: self.settings.timeout,
        })
    }
}

/// Topic backend handle wrapping one admin client.
pub struct KafkaTopicBackend {
    admin: Arc<Admin>,
    timeout: Duration,
}

impl KafkaTopicBackend {
    /// Fetches cluster metadata. The call blocks, so it runs off the runtime thread.
    async fn topic_names(&self) -> Result<BTreeSet<String>> {
        let admin = Arc::clone(&self.admin);
        let timeout = self.timeout;

        tokio::task::spawn_blocking(move || -> Result<BTreeSet<String>> {
            let metadata = admin
                .inner()
                .fetch_metadata(None, Timeout::After(timeout))?;
            if metadata.brokers().is_empty() {
                return Err(BackendError::Protocol(
                    "cluster metadata lists no brokers".into(),
                ));
            }
            Ok(metadata
                .topics()
                .iter()
                .map(|t| t.name().to_string())
                .collect())
        })
        .await
        .map_err(|e| BackendError::Protocol(format!("Metadata task failed: {}", e)))?
    }
}

#[async_trait]
impl ResourceBackend for KafkaTopicBackend {
    fn name(&self) -> &str {
        "redpanda"
    }

    async fn probe(&self) -> Result<()> {
        self.topic_names().await.map(|_| ())
    }

    async fn list_resources(&self) -> Result<BTreeSet<String>> {
        self.topic_names().await
    }

    async fn create_resource(&self, request: &ResourceRequest) -> Result<CreateStatus> {
        let topic = new_topic(request)?;
        debug!(
            "Creating topic '{}' ({} partitions, replication {}, {} config entries)",
            request.name,
            topic.num_partitions,
            request.replication,
            topic.config.len()
        );

        let options = AdminOptions::new()
            .request_timeout(Some(Timeout::After(self.timeout)))
            .operation_timeout(Some(Timeout::After(self.timeout)));
        let results = self.admin.create_topics([&topic], &options).await?;

        let outcome = classify_create_results(results, &request.name)?;
        if outcome == CreateStatus::AlreadyExists {
            info!("Broker reports topic '{}' already exists", request.name);
        }
        Ok(outcome)
    }
}

fn new_topic(request: &ResourceRequest) -> Result<NewTopic<'_>> {
    let partitions = i32::try_from(request.partitions).map_err(|_| {
        BackendError::Protocol(format!("partition count {} out of range", request.partitions))
    })?;
    let replication = i32::try_from(request.replication).map_err(|_| {
        BackendError::Protocol(format!(
            "replication factor {} out of range",
            request.replication
        ))
    })?;

    Ok(request.config.iter().fold(
        NewTopic::new(&request.name, partitions, TopicReplication::Fixed(replication)),
        |topic, (key, value)| topic.set(key, value),
    ))
}

/// Maps the per-topic create results onto the three-way outcome.
fn classify_create_results(results: Vec<TopicResult>, name: &str) -> Result<CreateStatus> {
    let result = results
        .into_iter()
        .find(|r| match r {
            Ok(topic) => topic == name,
            Err((topic, _)) => topic == name,
        })
        .ok_or_else(|| {
            BackendError::Protocol(format!("no create result returned for topic '{}'", name))
        })?;

    match result {
        Ok(_) => Ok(CreateStatus::Created),
        Err((_, RDKafkaErrorCode::TopicAlreadyExists)) => Ok(CreateStatus::AlreadyExists),
        Err((_, code)) => Err(BackendError::Kafka(code.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_result() {
        let results = vec![Ok("orders".to_string())];
        assert_eq!(
            classify_create_results(results, "orders").unwrap(),
            CreateStatus::Created
        );
    }

    #[test]
    fn test_already_exists_result() {
        let results = vec![Err((
            "orders".to_string(),
            RDKafkaErrorCode::TopicAlreadyExists,
        ))];
        assert_eq!(
            classify_create_results(results, "orders").unwrap(),
            CreateStatus::AlreadyExists
        );
    }

    #[test]
    fn test_other_codes_are_rejected() {
        let results = vec![Err((
            "orders".to_string(),
            RDKafkaErrorCode::InvalidReplicationFactor,
        ))];
        let err = classify_create_results(results, "orders").unwrap_err();
        assert!(matches!(err, BackendError::Kafka(_)));
    }

    #[test]
    fn test_missing_result_is_protocol_error() {
        let results = vec![Ok("payments".to_string())];
        assert!(matches!(
            classify_create_results(results, "orders"),
            Err(BackendError::Protocol(_))
        ));
    }

    #[test]
    fn test_new_topic_shape() {
        let mut request = ResourceRequest::new("orders");
        request.partitions = 6;
        request.replication = 3;
        request
            .config
            .insert("retention.ms".to_string(), "1000".to_string());

        let topic = new_topic(&request).unwrap();
        assert_eq!(topic.name, "orders");
        assert_eq!(topic.num_partitions, 6);
        assert!(matches!(topic.replication, TopicReplication::Fixed(3)));
        assert_eq!(topic.config, vec![("retention.ms", "1000")]);
    }

    #[test]
    fn test_out_of_range_partitions() {
        let mut request = ResourceRequest::new("orders");
        request.partitions = u32::MAX;
        assert!(matches!(new_topic(&request), Err(BackendError::Protocol(_))));
    }

    #[test]
    fn test_bootstrap_servers() {
        let settings = KafkaAdminSettings::new("redpanda", 9092);
        assert_eq!(settings.bootstrap_servers, "redpanda:9092");
        assert_eq!(
            settings.client_config().get("bootstrap.servers"),
            Some("redpanda:9092")
        );
    }
}
