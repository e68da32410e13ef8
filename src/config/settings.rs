//! # Configuration Settings
//!
//! Defines the per-listener options accepted by the translator along with the
//! observability settings used by the binary.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::{Validate, ValidationError};

/// Largest `google.protobuf.Duration` Envoy accepts (10000 years)
pub const MAX_DURATION_SECONDS: u64 = 315_576_000_000;

/// Options applied to a single listener build.
///
/// Every field defaults to the most conservative value: no proxy protocol,
/// zero trusted hops, no ALPN, no idle timeout, no host network binding and
/// no keepalive socket options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ListenerOptions {
    /// Expect a PROXY protocol header before any other bytes
    pub proxy_protocol: bool,

    /// Number of trusted hops when deriving the client address from XFF
    pub xff_num_trusted_hops: u32,

    /// ALPN protocols advertised by TLS terminating chains
    #[validate(custom(function = "validate_alpn_protocols"))]
    pub alpn_protocols: Vec<String>,

    /// Idle timeout for HTTP streams in seconds
    #[validate(range(
        min = 1,
        max = MAX_DURATION_SECONDS,
        message = "Stream idle timeout must be between 1 and 315576000000 seconds"
    ))]
    pub stream_idle_timeout_seconds: Option<u64>,

    /// Bind the listener directly on the host network
    #[validate(nested)]
    pub host_network: Option<HostNetworkOptions>,

    /// TCP keepalive settings applied to accepted sockets
    #[validate(nested)]
    pub tcp_keepalive: Option<TcpKeepaliveOptions>,
}

impl ListenerOptions {
    /// Get the stream idle timeout as Duration
    pub fn stream_idle_timeout(&self) -> Option<Duration> {
        self.stream_idle_timeout_seconds.map(Duration::from_secs)
    }
}

/// Host network binding: ports in bind order and the enabled address families
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct HostNetworkOptions {
    #[validate(custom(function = "validate_ports"))]
    pub ports: Vec<u32>,

    #[serde(default = "default_true")]
    pub ipv4_enabled: bool,

    #[serde(default)]
    pub ipv6_enabled: bool,
}

impl Default for HostNetworkOptions {
    fn default() -> Self {
        Self { ports: Vec::new(), ipv4_enabled: true, ipv6_enabled: false }
    }
}

/// TCP keepalive parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct TcpKeepaliveOptions {
    /// Seconds of idle time before the first probe
    #[validate(range(min = 1, message = "Keepalive idle time must be at least 1 second"))]
    pub idle_seconds: u32,

    /// Seconds between probes
    #[validate(range(min = 1, message = "Keepalive interval must be at least 1 second"))]
    pub interval_seconds: u32,

    /// Unanswered probes before the connection is dropped
    #[validate(range(min = 1, message = "Keepalive probe count must be at least 1"))]
    pub probes: u32,
}

impl Default for TcpKeepaliveOptions {
    fn default() -> Self {
        Self { idle_seconds: 10, interval_seconds: 5, probes: 10 }
    }
}

/// Logging configuration for the binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logging: false }
    }
}

fn default_true() -> bool {
    true
}

fn validate_ports(ports: &Vec<u32>) -> Result<(), ValidationError> {
    if ports.iter().any(|port| *port == 0 || *port > 65535) {
        let mut error = ValidationError::new("port_range");
        error.message = Some("Ports must be between 1 and 65535".into());
        return Err(error);
    }
    Ok(())
}

fn validate_alpn_protocols(protocols: &Vec<String>) -> Result<(), ValidationError> {
    if protocols.iter().any(|p| p.trim().is_empty()) {
        let mut error = ValidationError::new("alpn_empty");
        error.message = Some("ALPN protocol names cannot be empty".into());
        return Err(error);
    }
    Ok(())
}
