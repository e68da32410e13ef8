//! Listener filters run on accepted connections before any filter chain is chosen.

use envoy_types::pb::envoy::config::listener::v3::{
    listener_filter::ConfigType as ListenerFilterConfigType, ListenerFilter,
};
use envoy_types::pb::envoy::extensions::filters::listener::proxy_protocol::v3::ProxyProtocol;
use envoy_types::pb::envoy::extensions::filters::listener::tls_inspector::v3::TlsInspector;

use crate::xds::resources::{any_from_message, PROXY_PROTOCOL_TYPE_URL, TLS_INSPECTOR_TYPE_URL};

pub const TLS_INSPECTOR_FILTER_NAME: &str = "envoy.filters.listener.tls_inspector";
pub const PROXY_PROTOCOL_FILTER_NAME: &str = "envoy.filters.listener.proxy_protocol";

/// Ordered listener filters for a listener.
///
/// The TLS inspector is always present, even without TLS chains, because chain
/// selection on `raw_buffer` versus `tls` depends on it. When proxy protocol is
/// enabled its reader runs first so the inspector sees the bytes after the header.
pub fn listener_filters(proxy_protocol: bool) -> Vec<ListenerFilter> {
    let mut filters = Vec::with_capacity(2);
    if proxy_protocol {
        filters.push(proxy_protocol_filter());
    }
    filters.push(tls_inspector_filter());
    filters
}

fn tls_inspector_filter() -> ListenerFilter {
    ListenerFilter {
        name: TLS_INSPECTOR_FILTER_NAME.to_string(),
        config_type: Some(ListenerFilterConfigType::TypedConfig(any_from_message(
            TLS_INSPECTOR_TYPE_URL,
            &TlsInspector::default(),
        ))),
        ..Default::default()
    }
}

fn proxy_protocol_filter() -> ListenerFilter {
    ListenerFilter {
        name: PROXY_PROTOCOL_FILTER_NAME.to_string(),
        config_type: Some(ListenerFilterConfigType::TypedConfig(any_from_message(
            PROXY_PROTOCOL_TYPE_URL,
            &ProxyProtocol::default(),
        ))),
        ..Default::default()
    }
}
