//! # Configuration Management
//!
//! Environment-driven configuration for the listener translator. Listener
//! options can also be supplied directly by library callers; the environment
//! layer only provides defaults for the binary.

mod settings;

pub use settings::{
    HostNetworkOptions, ListenerOptions, ObservabilityConfig, TcpKeepaliveOptions,
    MAX_DURATION_SECONDS,
};

use crate::{Error, Result};
use std::str::FromStr;
use validator::Validate;

/// Prefix shared by all environment variables read by the translator
pub const ENV_PREFIX: &str = "LISTENER_TRANSLATOR_";

/// Namespace hosting the SDS secrets when none is configured
pub const DEFAULT_SECRETS_NAMESPACE: &str = "envoy-secrets";

/// Top-level translator configuration
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct TranslatorConfig {
    /// Namespace that hosts the secrets referenced over SDS
    #[validate(length(min = 1, message = "Secrets namespace cannot be empty"))]
    pub secrets_namespace: String,

    #[validate(nested)]
    pub listener: ListenerOptions,

    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            secrets_namespace: DEFAULT_SECRETS_NAMESPACE.to_string(),
            listener: ListenerOptions::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl TranslatorConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// Keys are looked up with [`ENV_PREFIX`] included, e.g.
    /// `LISTENER_TRANSLATOR_PROXY_PROTOCOL`. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}")).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        };

        let secrets_namespace =
            get("SECRETS_NAMESPACE").unwrap_or_else(|| DEFAULT_SECRETS_NAMESPACE.to_string());

        let host_network_ports: Vec<u32> = match get("HOST_NETWORK_PORTS") {
            Some(raw) => parse_list(&raw, "HOST_NETWORK_PORTS")?,
            None => Vec::new(),
        };
        let ipv4_enabled = parse_or(get("IPV4_ENABLED"), "IPV4_ENABLED", true)?;
        let ipv6_enabled = parse_or(get("IPV6_ENABLED"), "IPV6_ENABLED", false)?;

        let listener = ListenerOptions {
            proxy_protocol: parse_or(get("PROXY_PROTOCOL"), "PROXY_PROTOCOL", false)?,
            xff_num_trusted_hops: parse_or(get("XFF_NUM_TRUSTED_HOPS"), "XFF_NUM_TRUSTED_HOPS", 0)?,
            alpn_protocols: match get("ALPN_PROTOCOLS") {
                Some(raw) => parse_list(&raw, "ALPN_PROTOCOLS")?,
                None => Vec::new(),
            },
            stream_idle_timeout_seconds: get("STREAM_IDLE_TIMEOUT_SECONDS")
                .map(|raw| parse_value(&raw, "STREAM_IDLE_TIMEOUT_SECONDS"))
                .transpose()?,
            host_network: (!host_network_ports.is_empty()).then(|| HostNetworkOptions {
                ports: host_network_ports,
                ipv4_enabled,
                ipv6_enabled,
            }),
            tcp_keepalive: parse_or(get("TCP_KEEPALIVE"), "TCP_KEEPALIVE", false)?
                .then(TcpKeepaliveOptions::default),
        };

        let observability = ObservabilityConfig {
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            json_logging: parse_or(get("LOG_JSON"), "LOG_JSON", false)?,
        };

        let config = Self { secrets_namespace, listener, observability };
        config.validate_all()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate_all(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)
    }
}

fn parse_value<T>(raw: &str, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e| Error::config(format!("Invalid {ENV_PREFIX}{name} '{raw}': {e}")))
}

fn parse_or<T>(raw: Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map_or(Ok(default), |raw| parse_value(&raw, name))
}

fn parse_list<T>(raw: &str, name: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| parse_value(item, name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (format!("{ENV_PREFIX}{k}"), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = TranslatorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, TranslatorConfig::default());
        assert_eq!(config.secrets_namespace, "envoy-secrets");
    }

    #[test]
    fn test_host_network_from_env() {
        let config = TranslatorConfig::from_lookup(lookup(&[
            ("HOST_NETWORK_PORTS", "8080, 8443"),
            ("IPV6_ENABLED", "true"),
        ]))
        .unwrap();

        let host_network = config.listener.host_network.expect("host network");
        assert_eq!(host_network.ports, vec![8080, 8443]);
        assert!(host_network.ipv4_enabled);
        assert!(host_network.ipv6_enabled);
    }

    #[test]
    fn test_listener_options_from_env() {
        let config = TranslatorConfig::from_lookup(lookup(&[
            ("SECRETS_NAMESPACE", "gateway-secrets"),
            ("PROXY_PROTOCOL", "true"),
            ("XFF_NUM_TRUSTED_HOPS", "2"),
            ("ALPN_PROTOCOLS", "h2,http/1.1"),
            ("STREAM_IDLE_TIMEOUT_SECONDS", "300"),
            ("TCP_KEEPALIVE", "true"),
        ]))
        .unwrap();

        assert_eq!(config.secrets_namespace, "gateway-secrets");
        assert!(config.listener.proxy_protocol);
        assert_eq!(config.listener.xff_num_trusted_hops, 2);
        assert_eq!(config.listener.alpn_protocols, vec!["h2", "http/1.1"]);
        assert_eq!(config.listener.stream_idle_timeout_seconds, Some(300));
        assert_eq!(config.listener.tcp_keepalive, Some(TcpKeepaliveOptions::default()));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let result = TranslatorConfig::from_lookup(lookup(&[("XFF_NUM_TRUSTED_HOPS", "many")]));
        assert!(matches!(result, Err(Error::Config(_))));

        let result = TranslatorConfig::from_lookup(lookup(&[("HOST_NETWORK_PORTS", "80,99999")]));
        assert!(matches!(result, Err(Error::Validation(_))));

        let result = TranslatorConfig::from_lookup(lookup(&[("PROXY_PROTOCOL", "yes")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
