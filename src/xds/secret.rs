//! SDS secret references for TLS terminating filter chains.
//!
//! The translator never reads certificate material. It only derives the name
//! under which the secret discovery service publishes a secret, and points the
//! downstream TLS context at that name.

use envoy_types::pb::envoy::config::core::v3::{
    config_source::ConfigSourceSpecifier, AggregatedConfigSource, ConfigSource,
};
use envoy_types::pb::envoy::extensions::transport_sockets::tls::v3::SdsSecretConfig;
use serde::{Deserialize, Serialize};

/// Namespace/name pair identifying a certificate secret
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TlsSecret {
    pub namespace: String,
    pub name: String,
}

impl TlsSecret {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), name: name.into() }
    }

    /// SDS name of this secret when hosted in `secrets_namespace`
    pub fn sds_name(&self, secrets_namespace: &str) -> String {
        sds_secret_name(secrets_namespace, self)
    }
}

/// Derive the SDS secret name: `<secrets namespace>/<namespace>-<name>`.
pub fn sds_secret_name(secrets_namespace: &str, secret: &TlsSecret) -> String {
    format!("{}/{}-{}", secrets_namespace, secret.namespace, secret.name)
}

/// Build an SDS secret config that uses ADS for secret discovery
pub fn sds_secret_config(name: &str) -> SdsSecretConfig {
    SdsSecretConfig {
        name: name.to_string(),
        sds_config: Some(ConfigSource {
            config_source_specifier: Some(ConfigSourceSpecifier::Ads(
                AggregatedConfigSource::default(),
            )),
            ..Default::default()
        }),
    }
}
