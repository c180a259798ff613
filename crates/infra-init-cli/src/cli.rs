use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use infra_init::backend::buckets::CouchbaseSettings;
use infra_init::backend::topics::KafkaAdminSettings;
use infra_init::config::DEFAULT_CONFIG_DIR;
use infra_init::logging::LogFormat;
use infra_init::secrets::{resolve_secret, SecretError};
use infra_init::{Backoff, Result, RetryPolicy, Service};

/// Provision broker topics and datastore buckets before the fleet starts.
#[derive(Debug, Parser)]
#[command(name = "infra-init", version, about, long_about = None)]
pub struct Cli {
    /// Target environment; must be listed in env.yaml
    #[arg(long, env = "ENVIRONMENT")]
    pub environment: String,

    /// Comma-separated services to initialize
    #[arg(long, env = "INIT_SERVICES", default_value = "couchbase,redpanda")]
    pub services: String,

    /// Directory holding env.yaml and the per-service catalogs
    #[arg(long, env = "INIT_CONFIG_DIR", default_value = DEFAULT_CONFIG_DIR)]
    pub config_dir: PathBuf,

    /// Connection attempts per backend before giving up
    #[arg(long, env = "INIT_MAX_RETRIES", default_value_t = 30)]
    pub max_retries: u32,

    /// Seconds between connection attempts
    #[arg(long, env = "INIT_RETRY_INTERVAL_SECS", default_value_t = 2)]
    pub retry_interval_secs: u64,

    /// How the delay between connection attempts evolves
    #[arg(long, env = "INIT_RETRY_BACKOFF", value_enum, default_value_t = BackoffKind::Fixed)]
    pub retry_backoff: BackoffKind,

    /// Upper bound for the exponential backoff delay, in seconds
    #[arg(long, env = "INIT_RETRY_MAX_INTERVAL_SECS", default_value_t = 30)]
    pub retry_max_interval_secs: u64,

    /// Per-request timeout for backend calls, in seconds
    #[arg(long, env = "INIT_REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,

    #[arg(long, env = "REDPANDA_HOST", default_value = "redpanda")]
    pub redpanda_host: String,

    /// Kafka protocol port of the brokers
    #[arg(long, env = "REDPANDA_PORT", default_value_t = 9092)]
    pub redpanda_port: u16,

    #[arg(long, env = "COUCHBASE_HOST", default_value = "couchbase")]
    pub couchbase_host: String,

    #[arg(long, env = "COUCHBASE_PORT", default_value_t = 8091)]
    pub couchbase_port: u16,

    #[arg(long, env = "COUCHBASE_USERNAME", default_value = "Administrator")]
    pub couchbase_username: String,

    #[arg(long, env = "COUCHBASE_PASSWORD", hide_env_values = true)]
    pub couchbase_password: Option<String>,

    /// File containing the Couchbase password (used when no password is given)
    #[arg(long, env = "COUCHBASE_PASSWORD_FILE")]
    pub couchbase_password_file: Option<String>,

    /// Log output format: text or json
    #[arg(long, env = "INIT_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,

    /// Default log level when RUST_LOG is unset
    #[arg(long, env = "INIT_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Retry backoff selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackoffKind {
    Fixed,
    Exponential,
}

impl Cli {
    pub fn services(&self) -> Result<Vec<Service>> {
        Service::parse_list(&self.services)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let backoff = match self.retry_backoff {
            BackoffKind::Fixed => Backoff::Fixed,
            BackoffKind::Exponential => Backoff::Exponential {
                max_interval: Duration::from_secs(self.retry_max_interval_secs),
            },
        };
        RetryPolicy::new(
            self.max_retries,
            Duration::from_secs(self.retry_interval_secs),
        )
        .with_backoff(backoff)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn kafka_settings(&self) -> KafkaAdminSettings {
        KafkaAdminSettings::new(&self.redpanda_host, self.redpanda_port)
            .with_timeout(self.request_timeout())
    }

    pub fn couchbase_settings(&self) -> std::result::Result<CouchbaseSettings, SecretError> {
        let password = resolve_secret(
            self.couchbase_password.as_deref(),
            self.couchbase_password_file.as_deref(),
        )?;
        Ok(CouchbaseSettings::new(
            &self.couchbase_host,
            self.couchbase_port,
            self.couchbase_username.clone(),
            password,
        )
        .with_timeout(self.request_timeout()))
    }
}
