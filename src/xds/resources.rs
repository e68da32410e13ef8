//! Typed envelopes for built xDS resources.
//!
//! Every translated listener leaves the core as a `google.protobuf.Any`
//! tagged with the Listener type URL, so the discovery layer can tell it
//! apart from other resource kinds without decoding it.

use base64::engine::general_purpose::STANDARD as BASE64_ENGINE;
use base64::Engine;
use envoy_types::pb::envoy::config::listener::v3::Listener;
use envoy_types::pb::google::protobuf::Any;
use prost::Message;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const LISTENER_TYPE_URL: &str = "type.googleapis.com/envoy.config.listener.v3.Listener";
pub const HTTP_CONNECTION_MANAGER_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.filters.network.http_connection_manager.v3.HttpConnectionManager";
pub const TCP_PROXY_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.filters.network.tcp_proxy.v3.TcpProxy";
pub const DOWNSTREAM_TLS_CONTEXT_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.transport_sockets.tls.v3.DownstreamTlsContext";
pub const TLS_INSPECTOR_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.filters.listener.tls_inspector.v3.TlsInspector";
pub const PROXY_PROTOCOL_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.filters.listener.proxy_protocol.v3.ProxyProtocol";
pub const ROUTER_TYPE_URL: &str = "type.googleapis.com/envoy.extensions.filters.http.router.v3.Router";
pub const GRPC_WEB_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.filters.http.grpc_web.v3.GrpcWeb";
pub const GRPC_STATS_TYPE_URL: &str =
    "type.googleapis.com/envoy.extensions.filters.http.grpc_stats.v3.FilterConfig";

/// Wrapper for a built Envoy resource along with its name.
#[derive(Clone, Debug, PartialEq)]
pub struct BuiltResource {
    pub name: String,
    pub resource: Any,
}

impl BuiltResource {
    /// Wrap a listener in its typed envelope
    pub fn from_listener(listener: &Listener) -> Self {
        Self { name: listener.name.clone(), resource: any_from_message(LISTENER_TYPE_URL, listener) }
    }

    pub fn type_url(&self) -> &str {
        &self.resource.type_url
    }

    /// Encoded payload bytes
    pub fn value(&self) -> &[u8] {
        &self.resource.value
    }

    /// Decode the payload back into a Listener
    pub fn decode_listener(&self) -> Result<Listener> {
        decode_listener(&self.resource)
    }
}

/// Helper for building Envoy `Any` values from prost messages.
pub fn any_from_message<M: Message>(type_url: impl Into<String>, msg: &M) -> Any {
    Any { type_url: type_url.into(), value: msg.encode_to_vec() }
}

/// Decode a typed envelope into a Listener, checking the type tag first.
pub fn decode_listener(any: &Any) -> Result<Listener> {
    decode_typed(any, LISTENER_TYPE_URL)
}

/// Decode a typed envelope into `M` when its type URL matches `type_url`.
pub fn decode_typed<M: Message + Default>(any: &Any, type_url: &str) -> Result<M> {
    if any.type_url != type_url {
        return Err(Error::TypeMismatch {
            expected: type_url.to_string(),
            found: any.type_url.clone(),
        });
    }
    Ok(M::decode(any.value.as_slice())?)
}

/// Wrapper for binary protobuf payloads serialized as base64 in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Base64Bytes(pub Vec<u8>);

impl Serialize for Base64Bytes {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&BASE64_ENGINE.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Base64Bytes {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        let decoded = BASE64_ENGINE
            .decode(encoded.as_bytes())
            .map_err(|err| serde::de::Error::custom(err.to_string()))?;
        Ok(Base64Bytes(decoded))
    }
}

/// JSON view of a built listener, as printed by the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerResource {
    pub name: String,
    pub type_url: String,
    pub value: Base64Bytes,
}

impl From<&BuiltResource> for ListenerResource {
    fn from(built: &BuiltResource) -> Self {
        Self {
            name: built.name.clone(),
            type_url: built.resource.type_url.clone(),
            value: Base64Bytes(built.resource.value.clone()),
        }
    }
}

impl ListenerResource {
    /// Converts back to the Envoy `Any` envelope
    pub fn to_any(&self) -> Any {
        Any { type_url: self.type_url.clone(), value: self.value.0.clone() }
    }
}
