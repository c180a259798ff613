//! Connection gate: bounded-retry acquisition of a backend handle.
//!
//! The gate exclusively owns the handle. It is built lazily on the first
//! [`ConnectionGate::acquire`] and reused for every later call, so a run
//! probes each backend once. Every probe failure is retried the same way;
//! the gate only gives up once the attempt budget is spent.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::backend::{BackendConnector, BackendError, ResourceBackend};
use crate::cancel::CancelToken;
use crate::error::{InitError, Result};

/// Default number of connection attempts.
pub const DEFAULT_MAX_RETRIES: u32 = 30;
/// Default delay between connection attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(2);

/// How the delay between attempts evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Wait `retry_interval` between every pair of attempts.
    #[default]
    Fixed,
    /// Double the delay after each failure, capped at `max_interval`.
    Exponential { max_interval: Duration },
}

/// Retry budget for connection establishment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts before giving up. Values below 1 are treated as 1.
    pub max_retries: u32,
    pub retry_interval: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            backoff: Backoff::Fixed,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_interval: Duration) -> Self {
        Self {
            max_retries,
            retry_interval,
            backoff: Backoff::Fixed,
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Delay to wait after the `failed_attempts`-th consecutive failure.
    pub fn delay_after(&self, failed_attempts: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.retry_interval,
            Backoff::Exponential { max_interval } => {
                let shift = failed_attempts.saturating_sub(1).min(16);
                self.retry_interval
                    .saturating_mul(1 << shift)
                    .min(max_interval)
            }
        }
    }
}

/// Owns the lazily established handle to one backend.
pub struct ConnectionGate<C: BackendConnector> {
    connector: C,
    policy: RetryPolicy,
    cancel: CancelToken,
    handle: Option<C::Backend>,
    attempts: u32,
}

impl<C: BackendConnector> ConnectionGate<C> {
    pub fn new(connector: C, policy: RetryPolicy) -> Self {
        Self {
            connector,
            policy,
            cancel: CancelToken::new(),
            handle: None,
            attempts: 0,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn name(&self) -> &str {
        self.connector.name()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Total connection attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Returns the cached handle, establishing it first if needed.
    ///
    /// Fails with [`InitError::BackendUnavailable`] once every attempt has
    /// failed, or [`InitError::Cancelled`] if the run is cancelled meanwhile.
    pub async fn acquire(&mut self) -> Result<&C::Backend> {
        let backend = match self.handle.take() {
            Some(backend) => backend,
            None => self.establish().await?,
        };
        Ok(self.handle.insert(backend))
    }

    async fn establish(&mut self) -> Result<C::Backend> {
        let max_attempts = self.policy.max_attempts();
        let mut client: Option<C::Backend> = None;
        let mut last_error: Option<BackendError> = None;

        for attempt in 1..=max_attempts {
            self.cancel.check()?;
            self.attempts += 1;

            let connected = match client.take() {
                Some(existing) => Ok(existing),
                None => self.connector.connect().await,
            };

            match connected {
                Ok(backend) => match backend.probe().await {
                    Ok(()) => {
                        info!(
                            "Connected to {} (attempt {}/{})",
                            self.name(),
                            attempt,
                            max_attempts
                        );
                        return Ok(backend);
                    }
                    Err(e) => {
                        debug!("Probe of {} failed: {}", self.name(), e);
                        client = Some(backend);
                        last_error = Some(e);
                    }
                },
                Err(e) => {
                    debug!("Could not build {} client: {}", self.name(), e);
                    last_error = Some(e);
                }
            }

            if attempt < max_attempts {
                warn!(
                    "Waiting for connection to {}... (attempt {}/{})",
                    self.name(),
                    attempt,
                    max_attempts
                );
                self.cancel.sleep(self.policy.delay_after(attempt)).await?;
            }
        }

        let source = last_error
            .unwrap_or_else(|| BackendError::Connect("no connection attempt was made".into()));
        error!(
            "Failed to connect to {} after {} attempts: {}",
            self.name(),
            max_attempts,
            source
        );
        Err(InitError::BackendUnavailable {
            backend: self.name().to_string(),
            attempts: max_attempts,
            source,
        })
    }
}
