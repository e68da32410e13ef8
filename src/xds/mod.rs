//! Envoy Listener (LDS) resource translation
//!
//! Turns hostname mappings into Envoy `Listener` resources:
//! - listener filters (PROXY protocol reader, TLS inspector)
//! - filter chains (plain HTTP, TLS terminating, SNI passthrough)
//! - host network bind addresses
//! - SDS secret references
//!
//! The resulting listener is wrapped in a typed `Any` envelope ready for the
//! discovery layer.

pub mod address;
pub mod chain_match;
pub mod filter_chain;
pub mod listener;
pub mod listener_filters;
pub mod resources;
pub mod secret;

pub use address::{host_network_addresses, AddressFamily};
pub use listener::{build_http_listener, build_sni_listener, new_http_listener, new_sni_listener};
pub use resources::{decode_listener, BuiltResource, ListenerResource, LISTENER_TYPE_URL};
pub use secret::{sds_secret_name, TlsSecret};
