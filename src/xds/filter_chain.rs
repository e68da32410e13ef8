//! Filter chain builders for HTTP and SNI passthrough listeners.
//!
//! HTTP listeners carry one plain chain for unencrypted traffic plus one TLS
//! terminating chain per certificate secret. Passthrough listeners carry one
//! SNI-matched `tcp_proxy` chain per backend. Entries are emitted sorted by
//! SDS secret name or backend key so repeated builds encode identically.

use std::collections::{BTreeSet, HashMap};

use envoy_types::pb::envoy::config::core::v3::{
    config_source::ConfigSourceSpecifier, transport_socket::ConfigType as TransportSocketConfigType,
    AggregatedConfigSource, ConfigSource, TransportSocket,
};
use envoy_types::pb::envoy::config::listener::v3::{
    filter::ConfigType as FilterConfigType, Filter, FilterChain, FilterChainMatch,
};
use envoy_types::pb::envoy::extensions::filters::http::grpc_stats::v3::FilterConfig as GrpcStatsConfig;
use envoy_types::pb::envoy::extensions::filters::http::grpc_web::v3::GrpcWeb;
use envoy_types::pb::envoy::extensions::filters::http::router::v3::Router;
use envoy_types::pb::envoy::extensions::filters::network::http_connection_manager::v3::{
    http_connection_manager::{CodecType, RouteSpecifier, UpgradeConfig},
    http_filter::ConfigType as HttpFilterConfigType,
    HttpConnectionManager, HttpFilter, Rds,
};
use envoy_types::pb::envoy::extensions::filters::network::tcp_proxy::v3::{
    tcp_proxy::ClusterSpecifier, TcpProxy,
};
use envoy_types::pb::envoy::extensions::transport_sockets::tls::v3::{
    CommonTlsContext, DownstreamTlsContext,
};
use envoy_types::pb::google::protobuf::{BoolValue, Duration};
use tracing::debug;

use crate::config::ListenerOptions;
use crate::xds::resources::{
    any_from_message, DOWNSTREAM_TLS_CONTEXT_TYPE_URL, GRPC_STATS_TYPE_URL, GRPC_WEB_TYPE_URL,
    HTTP_CONNECTION_MANAGER_TYPE_URL, ROUTER_TYPE_URL, TCP_PROXY_TYPE_URL,
};
use crate::xds::secret::{sds_secret_config, TlsSecret};
use crate::{Error, Result};

pub const HTTP_CONNECTION_MANAGER_FILTER_NAME: &str =
    "envoy.filters.network.http_connection_manager";
pub const TCP_PROXY_FILTER_NAME: &str = "envoy.filters.network.tcp_proxy";
pub const TLS_TRANSPORT_SOCKET_NAME: &str = "envoy.transport_sockets.tls";
pub const ROUTER_FILTER_NAME: &str = "envoy.filters.http.router";
pub const GRPC_WEB_FILTER_NAME: &str = "envoy.filters.http.grpc_web";
pub const GRPC_STATS_FILTER_NAME: &str = "envoy.filters.http.grpc_stats";

/// Transport protocol reported by the TLS inspector for unencrypted traffic
pub const RAW_BUFFER_TRANSPORT_PROTOCOL: &str = "raw_buffer";
/// Transport protocol reported by the TLS inspector for TLS traffic
pub const TLS_TRANSPORT_PROTOCOL: &str = "tls";

/// RDS route configuration served to the plain chain
pub const INSECURE_ROUTE_CONFIG_NAME: &str = "listener-insecure";
/// RDS route configuration served to TLS terminating chains
pub const SECURE_ROUTE_CONFIG_NAME: &str = "listener-secure";

/// Name of the plain chain
pub const PLAIN_FILTER_CHAIN_NAME: &str = "default";

/// Lowercased, sorted, de-duplicated server names.
///
/// SNI hostnames are DNS names and compare case-insensitively.
pub fn normalize_server_names(hostnames: &[String]) -> Vec<String> {
    hostnames
        .iter()
        .map(|name| name.to_ascii_lowercase())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Default chain for unencrypted HTTP traffic.
pub fn plain_filter_chain(listener_name: &str, options: &ListenerOptions) -> FilterChain {
    FilterChain {
        name: PLAIN_FILTER_CHAIN_NAME.to_string(),
        filter_chain_match: Some(FilterChainMatch {
            transport_protocol: RAW_BUFFER_TRANSPORT_PROTOCOL.to_string(),
            ..Default::default()
        }),
        filters: vec![http_connection_manager_filter(
            listener_name,
            INSECURE_ROUTE_CONFIG_NAME,
            options,
        )],
        ..Default::default()
    }
}

/// One TLS terminating chain per secret, sorted by SDS secret name.
///
/// Fails when two distinct secrets derive the same SDS secret name.
pub fn tls_filter_chains(
    listener_name: &str,
    secrets_namespace: &str,
    tls: &HashMap<TlsSecret, Vec<String>>,
    options: &ListenerOptions,
) -> Result<Vec<FilterChain>> {
    let mut entries: Vec<(String, &TlsSecret, &Vec<String>)> = tls
        .iter()
        .map(|(secret, hostnames)| (secret.sds_name(secrets_namespace), secret, hostnames))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    if let Some(pair) = entries.windows(2).find(|pair| pair[0].0 == pair[1].0) {
        return Err(Error::SecretNameCollision { name: pair[0].0.clone() });
    }

    Ok(entries
        .into_iter()
        .map(|(secret_name, _, hostnames)| {
            tls_filter_chain(listener_name, &secret_name, hostnames, options)
        })
        .collect())
}

fn tls_filter_chain(
    listener_name: &str,
    secret_name: &str,
    hostnames: &[String],
    options: &ListenerOptions,
) -> FilterChain {
    let server_names = normalize_server_names(hostnames);
    debug!(
        listener = %listener_name,
        secret = %secret_name,
        server_names = ?server_names,
        "Built TLS filter chain"
    );

    FilterChain {
        name: secret_name.to_string(),
        filter_chain_match: Some(FilterChainMatch {
            transport_protocol: TLS_TRANSPORT_PROTOCOL.to_string(),
            server_names,
            ..Default::default()
        }),
        filters: vec![http_connection_manager_filter(
            listener_name,
            SECURE_ROUTE_CONFIG_NAME,
            options,
        )],
        transport_socket: Some(downstream_tls_transport_socket(
            secret_name,
            &options.alpn_protocols,
        )),
        ..Default::default()
    }
}

/// One SNI-matched `tcp_proxy` chain per backend, sorted by backend key.
pub fn passthrough_filter_chains(backends: &HashMap<String, Vec<String>>) -> Vec<FilterChain> {
    let mut entries: Vec<(&String, &Vec<String>)> = backends.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    entries
        .into_iter()
        .map(|(backend, hostnames)| passthrough_filter_chain(backend, hostnames))
        .collect()
}

fn passthrough_filter_chain(backend: &str, hostnames: &[String]) -> FilterChain {
    let server_names = normalize_server_names(hostnames);
    debug!(backend = %backend, server_names = ?server_names, "Built passthrough filter chain");

    FilterChain {
        name: backend.to_string(),
        filter_chain_match: Some(FilterChainMatch { server_names, ..Default::default() }),
        filters: vec![tcp_proxy_filter(backend)],
        ..Default::default()
    }
}

/// `tcp_proxy` filter forwarding to the cluster named by `backend`
pub fn tcp_proxy_filter(backend: &str) -> Filter {
    let tcp_proxy = TcpProxy {
        stat_prefix: backend.to_string(),
        cluster_specifier: Some(ClusterSpecifier::Cluster(backend.to_string())),
        ..Default::default()
    };

    Filter {
        name: TCP_PROXY_FILTER_NAME.to_string(),
        config_type: Some(FilterConfigType::TypedConfig(any_from_message(
            TCP_PROXY_TYPE_URL,
            &tcp_proxy,
        ))),
    }
}

/// HTTP connection manager fetching routes over RDS from `route_config_name`
pub fn http_connection_manager_filter(
    listener_name: &str,
    route_config_name: &str,
    options: &ListenerOptions,
) -> Filter {
    let hcm = HttpConnectionManager {
        stat_prefix: listener_name.to_string(),
        codec_type: CodecType::Auto as i32,
        route_specifier: Some(RouteSpecifier::Rds(Rds {
            route_config_name: route_config_name.to_string(),
            config_source: Some(ConfigSource {
                config_source_specifier: Some(ConfigSourceSpecifier::Ads(
                    AggregatedConfigSource::default(),
                )),
                ..Default::default()
            }),
        })),
        use_remote_address: Some(BoolValue { value: true }),
        skip_xff_append: false,
        xff_num_trusted_hops: options.xff_num_trusted_hops,
        upgrade_configs: vec![UpgradeConfig {
            upgrade_type: "websocket".to_string(),
            ..Default::default()
        }],
        stream_idle_timeout: options
            .stream_idle_timeout()
            .map(|timeout| Duration { seconds: timeout.as_secs() as i64, nanos: 0 }),
        http_filters: http_filters(),
        ..Default::default()
    };

    Filter {
        name: HTTP_CONNECTION_MANAGER_FILTER_NAME.to_string(),
        config_type: Some(FilterConfigType::TypedConfig(any_from_message(
            HTTP_CONNECTION_MANAGER_TYPE_URL,
            &hcm,
        ))),
    }
}

/// gRPC-Web, gRPC stats, then the router, which must stay last.
fn http_filters() -> Vec<HttpFilter> {
    let grpc_stats = GrpcStatsConfig { emit_filter_state: true, ..Default::default() };

    vec![
        http_filter(GRPC_WEB_FILTER_NAME, any_from_message(GRPC_WEB_TYPE_URL, &GrpcWeb::default())),
        http_filter(GRPC_STATS_FILTER_NAME, any_from_message(GRPC_STATS_TYPE_URL, &grpc_stats)),
        http_filter(ROUTER_FILTER_NAME, any_from_message(ROUTER_TYPE_URL, &Router::default())),
    ]
}

fn http_filter(name: &str, config: envoy_types::pb::google::protobuf::Any) -> HttpFilter {
    HttpFilter {
        name: name.to_string(),
        config_type: Some(HttpFilterConfigType::TypedConfig(config)),
        ..Default::default()
    }
}

/// TLS transport socket terminating with the certificate published under `secret_name`.
///
/// Only the certificate is configured; client certificates are not verified.
pub fn downstream_tls_transport_socket(secret_name: &str, alpn_protocols: &[String]) -> TransportSocket {
    let downstream = DownstreamTlsContext {
        common_tls_context: Some(CommonTlsContext {
            tls_certificate_sds_secret_configs: vec![sds_secret_config(secret_name)],
            alpn_protocols: alpn_protocols.to_vec(),
            ..Default::default()
        }),
        ..Default::default()
    };

    TransportSocket {
        name: TLS_TRANSPORT_SOCKET_NAME.to_string(),
        config_type: Some(TransportSocketConfigType::TypedConfig(any_from_message(
            DOWNSTREAM_TLS_CONTEXT_TYPE_URL,
            &downstream,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xds::resources::decode_typed;

    fn typed_config(filter: &Filter) -> &envoy_types::pb::google::protobuf::Any {
        match filter.config_type.as_ref() {
            Some(FilterConfigType::TypedConfig(any)) => any,
            other => panic!("unsupported config type in test: {:?}", other),
        }
    }

    fn decode_hcm(chain: &FilterChain) -> HttpConnectionManager {
        decode_typed(typed_config(&chain.filters[0]), HTTP_CONNECTION_MANAGER_TYPE_URL)
            .expect("decode http connection manager")
    }

    fn decode_tls(chain: &FilterChain) -> DownstreamTlsContext {
        match chain.transport_socket.as_ref().and_then(|ts| ts.config_type.as_ref()) {
            Some(TransportSocketConfigType::TypedConfig(any)) => {
                decode_typed(any, DOWNSTREAM_TLS_CONTEXT_TYPE_URL).expect("decode tls context")
            }
            other => panic!("unexpected transport socket config: {:?}", other),
        }
    }

    #[test]
    fn server_names_are_lowercased_sorted_and_unique() {
        let names = normalize_server_names(&[
            "b.example.com".to_string(),
            "a.example.com".to_string(),
            "B.Example.com".to_string(),
        ]);
        assert_eq!(names, vec!["a.example.com", "b.example.com"]);
    }

    #[test]
    fn plain_chain_matches_raw_buffer_without_tls() {
        let chain = plain_filter_chain("listener", &ListenerOptions::default());
        let chain_match = chain.filter_chain_match.as_ref().unwrap();

        assert_eq!(chain_match.transport_protocol, RAW_BUFFER_TRANSPORT_PROTOCOL);
        assert!(chain_match.server_names.is_empty());
        assert!(chain.transport_socket.is_none());
        assert_eq!(chain.filters.len(), 1);
        assert_eq!(chain.filters[0].name, HTTP_CONNECTION_MANAGER_FILTER_NAME);
    }

    #[test]
    fn http_connection_manager_defaults() {
        let chain = plain_filter_chain("listener", &ListenerOptions::default());
        let hcm = decode_hcm(&chain);

        assert_eq!(hcm.stat_prefix, "listener");
        assert_eq!(hcm.xff_num_trusted_hops, 0);
        assert_eq!(hcm.use_remote_address, Some(BoolValue { value: true }));
        assert!(hcm.stream_idle_timeout.is_none());
        assert_eq!(hcm.upgrade_configs[0].upgrade_type, "websocket");
        match hcm.route_specifier {
            Some(RouteSpecifier::Rds(rds)) => {
                assert_eq!(rds.route_config_name, INSECURE_ROUTE_CONFIG_NAME)
            }
            other => panic!("unexpected route specifier: {:?}", other),
        }

        let names: Vec<_> = hcm.http_filters.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec![GRPC_WEB_FILTER_NAME, GRPC_STATS_FILTER_NAME, ROUTER_FILTER_NAME]);
    }

    #[test]
    fn http_connection_manager_honours_options() {
        let options = ListenerOptions {
            xff_num_trusted_hops: 2,
            stream_idle_timeout_seconds: Some(300),
            ..Default::default()
        };
        let hcm = decode_hcm(&plain_filter_chain("listener", &options));

        assert_eq!(hcm.xff_num_trusted_hops, 2);
        assert_eq!(hcm.stream_idle_timeout, Some(Duration { seconds: 300, nanos: 0 }));
    }

    #[test]
    fn tls_chains_reference_sds_secret() {
        let tls = HashMap::from([
            (TlsSecret::new("ns", "cert-b"), vec!["b.example.com".to_string()]),
            (TlsSecret::new("ns", "cert-a"), vec!["a.example.com".to_string()]),
        ]);
        let options =
            ListenerOptions { alpn_protocols: vec!["h2".into(), "http/1.1".into()], ..Default::default() };

        let chains = tls_filter_chains("listener", "hosting", &tls, &options).expect("chains");
        assert_eq!(chains.len(), 2);

        assert_eq!(chains[0].name, "hosting/ns-cert-a");
        assert_eq!(chains[1].name, "hosting/ns-cert-b");

        let chain_match = chains[0].filter_chain_match.as_ref().unwrap();
        assert_eq!(chain_match.transport_protocol, TLS_TRANSPORT_PROTOCOL);
        assert_eq!(chain_match.server_names, vec!["a.example.com"]);

        let common = decode_tls(&chains[0]).common_tls_context.expect("common tls context");
        assert_eq!(common.tls_certificate_sds_secret_configs.len(), 1);
        assert_eq!(common.tls_certificate_sds_secret_configs[0].name, "hosting/ns-cert-a");
        assert_eq!(common.alpn_protocols, vec!["h2", "http/1.1"]);
        assert!(common.validation_context_type.is_none());

        match decode_hcm(&chains[0]).route_specifier {
            Some(RouteSpecifier::Rds(rds)) => {
                assert_eq!(rds.route_config_name, SECURE_ROUTE_CONFIG_NAME)
            }
            other => panic!("unexpected route specifier: {:?}", other),
        }
    }

    #[test]
    fn colliding_secret_names_are_rejected() {
        let tls = HashMap::from([
            (TlsSecret::new("a-b", "c"), vec!["one.example.com".to_string()]),
            (TlsSecret::new("a", "b-c"), vec!["two.example.com".to_string()]),
        ]);

        let err = tls_filter_chains("listener", "hosting", &tls, &ListenerOptions::default())
            .expect_err("collision");
        assert!(matches!(err, Error::SecretNameCollision { name } if name == "hosting/a-b-c"));
    }

    #[test]
    fn passthrough_chains_forward_to_backend() {
        let backends = HashMap::from([
            ("ns/svc-b:443".to_string(), vec!["b.example.com".to_string()]),
            ("ns/svc-a:443".to_string(), vec!["a2.example.com".to_string(), "a1.example.com".to_string()]),
        ]);

        let chains = passthrough_filter_chains(&backends);
        assert_eq!(chains.len(), 2);
        assert_eq!(chains[0].name, "ns/svc-a:443");

        let chain_match = chains[0].filter_chain_match.as_ref().unwrap();
        assert!(chain_match.transport_protocol.is_empty());
        assert_eq!(chain_match.server_names, vec!["a1.example.com", "a2.example.com"]);
        assert!(chains[0].transport_socket.is_none());

        let tcp_proxy: TcpProxy =
            decode_typed(typed_config(&chains[0].filters[0]), TCP_PROXY_TYPE_URL).expect("decode");
        assert_eq!(tcp_proxy.cluster_specifier, Some(ClusterSpecifier::Cluster("ns/svc-a:443".into())));
        assert_eq!(tcp_proxy.stat_prefix, "ns/svc-a:443");
    }

    #[test]
    fn empty_backends_yield_no_chains() {
        assert!(passthrough_filter_chains(&HashMap::new()).is_empty());
    }
}
