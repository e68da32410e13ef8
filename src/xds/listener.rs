//! Listener assembly using envoy-types
//!
//! Entry points for the two listener flavours:
//!
//! - [`new_http_listener`] terminates TLS per certificate secret and serves
//!   unencrypted HTTP on a default chain.
//! - [`new_sni_listener`] forwards TLS connections untouched to the backend
//!   selected by SNI.
//!
//! Both are pure: the same input always encodes to the same bytes.

use std::collections::HashMap;

use envoy_types::pb::envoy::config::core::v3::{
    socket_option::{SocketState, Value as SocketOptionValue},
    SocketOption,
};
use envoy_types::pb::envoy::config::listener::v3::{FilterChain, Listener};
use tracing::info;
use validator::Validate;

use crate::config::{ListenerOptions, TcpKeepaliveOptions};
use crate::xds::address::host_network_addresses;
use crate::xds::chain_match::ensure_unambiguous;
use crate::xds::filter_chain::{passthrough_filter_chains, plain_filter_chain, tls_filter_chains};
use crate::xds::listener_filters::listener_filters;
use crate::xds::resources::BuiltResource;
use crate::xds::secret::TlsSecret;
use crate::Result;

// Linux socket option constants
const SOL_SOCKET: i64 = 1;
const SO_KEEPALIVE: i64 = 9;
const IPPROTO_TCP: i64 = 6;
const TCP_KEEPIDLE: i64 = 4;
const TCP_KEEPINTVL: i64 = 5;
const TCP_KEEPCNT: i64 = 6;

/// Build and encode an HTTP listener.
///
/// The listener has one plain chain followed by one TLS chain per entry of
/// `tls`, each terminating with the SDS secret hosted in `secrets_namespace`.
/// A hostname mapped to two secrets is reported as an ambiguous match.
pub fn new_http_listener(
    name: &str,
    secrets_namespace: &str,
    tls: &HashMap<TlsSecret, Vec<String>>,
    options: &ListenerOptions,
) -> Result<BuiltResource> {
    let listener = build_http_listener(name, secrets_namespace, tls, options)?;
    Ok(encode(&listener))
}

/// Build and encode an SNI passthrough listener with one chain per backend.
pub fn new_sni_listener(
    name: &str,
    backends: &HashMap<String, Vec<String>>,
    options: &ListenerOptions,
) -> Result<BuiltResource> {
    let listener = build_sni_listener(name, backends, options)?;
    Ok(encode(&listener))
}

/// HTTP listener before encoding
pub fn build_http_listener(
    name: &str,
    secrets_namespace: &str,
    tls: &HashMap<TlsSecret, Vec<String>>,
    options: &ListenerOptions,
) -> Result<Listener> {
    let span = crate::translation_span!("http", name, tls_secrets = tls.len());
    let _guard = span.enter();

    options.validate()?;

    let mut filter_chains = Vec::with_capacity(tls.len() + 1);
    filter_chains.push(plain_filter_chain(name, options));
    filter_chains.extend(tls_filter_chains(name, secrets_namespace, tls, options)?);

    assemble(name, filter_chains, options)
}

/// SNI passthrough listener before encoding
pub fn build_sni_listener(
    name: &str,
    backends: &HashMap<String, Vec<String>>,
    options: &ListenerOptions,
) -> Result<Listener> {
    let span = crate::translation_span!("sni", name, backends = backends.len());
    let _guard = span.enter();

    options.validate()?;

    assemble(name, passthrough_filter_chains(backends), options)
}

fn assemble(name: &str, filter_chains: Vec<FilterChain>, options: &ListenerOptions) -> Result<Listener> {
    ensure_unambiguous(&filter_chains)?;

    let (address, additional_addresses) = match options.host_network.as_ref() {
        Some(host_network) => host_network_addresses(
            &host_network.ports,
            host_network.ipv4_enabled,
            host_network.ipv6_enabled,
        ),
        None => (None, Vec::new()),
    };

    Ok(Listener {
        name: name.to_string(),
        address,
        additional_addresses,
        listener_filters: listener_filters(options.proxy_protocol),
        filter_chains,
        socket_options: options.tcp_keepalive.as_ref().map(keepalive_socket_options).unwrap_or_default(),
        ..Default::default()
    })
}

fn encode(listener: &Listener) -> BuiltResource {
    let built = BuiltResource::from_listener(listener);
    info!(
        listener = %listener.name,
        filter_chains = listener.filter_chains.len(),
        listener_filters = listener.listener_filters.len(),
        additional_addresses = listener.additional_addresses.len(),
        bytes = built.value().len(),
        "Created listener resource"
    );
    built
}

/// Socket options enabling TCP keepalive on accepted connections
pub fn keepalive_socket_options(keepalive: &TcpKeepaliveOptions) -> Vec<SocketOption> {
    let option = |description: &str, level: i64, name: i64, value: i64| SocketOption {
        description: description.to_string(),
        level,
        name,
        value: Some(SocketOptionValue::IntValue(value)),
        state: SocketState::StateListening as i32,
        ..Default::default()
    };

    vec![
        option("Enable TCP keep-alive", SOL_SOCKET, SO_KEEPALIVE, 1),
        option("TCP keep-alive idle time (in seconds)", IPPROTO_TCP, TCP_KEEPIDLE, keepalive.idle_seconds.into()),
        option(
            "TCP keep-alive probe intervals (in seconds)",
            IPPROTO_TCP,
            TCP_KEEPINTVL,
            keepalive.interval_seconds.into(),
        ),
        option("TCP keep-alive probe max failures", IPPROTO_TCP, TCP_KEEPCNT, keepalive.probes.into()),
    ]
}
