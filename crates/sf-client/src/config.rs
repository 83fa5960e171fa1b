//! Transport configuration.

use std::time::Duration;

use crate::retry::RetryConfig;

/// Configuration for [`SfHttpClient`](crate::SfHttpClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Retry behaviour for throttled and transient responses. `None` disables retries.
    pub retry: Option<RetryConfig>,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Accept gzip/deflate encoded responses.
    pub accept_compressed: bool,
    /// User-Agent header value.
    pub user_agent: String,
    /// Emit a debug event per request and response.
    pub trace_requests: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            retry: Some(RetryConfig::default()),
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            accept_compressed: true,
            user_agent: crate::USER_AGENT.to_string(),
            trace_requests: true,
        }
    }
}

impl ClientConfig {
    /// Start building a config from the defaults.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Use the given retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = Some(retry);
        self
    }

    /// Never retry; every failure surfaces immediately.
    pub fn without_retry(mut self) -> Self {
        self.config.retry = None;
        self
    }

    /// Whole-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Connection establishment timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Accept gzip/deflate encoded responses.
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.config.accept_compressed = enabled;
        self
    }

    /// User-Agent header value.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Log every request and response at debug level.
    pub fn with_request_tracing(mut self, enabled: bool) -> Self {
        self.config.trace_requests = enabled;
        self
    }

    /// Finish the configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
