//! Ambiguity check for filter chain match predicates.
//!
//! Envoy rejects (or silently shadows) filter chains whose match predicates
//! are identical. Every chain contributes one key per server name, or a single
//! wildcard key when it matches all server names, and keys must be unique
//! across the listener. Server names compare case-insensitively, as DNS names do.

use std::collections::HashMap;

use envoy_types::pb::envoy::config::listener::v3::FilterChain;
use tracing::warn;

use crate::{Error, Result};

/// Placeholder used in errors for chains that match every server name
pub const ANY_SERVER_NAME: &str = "*";

/// Ensure no two chains match the same `(transport protocol, server name)`.
pub fn ensure_unambiguous(chains: &[FilterChain]) -> Result<()> {
    let mut seen: HashMap<(&str, Option<String>), &str> = HashMap::new();

    for chain in chains {
        let (transport_protocol, server_names) = match chain.filter_chain_match.as_ref() {
            Some(chain_match) => {
                (chain_match.transport_protocol.as_str(), chain_match.server_names.as_slice())
            }
            None => ("", &[][..]),
        };

        let keys: Vec<Option<String>> = if server_names.is_empty() {
            vec![None]
        } else {
            server_names.iter().map(|name| Some(name.to_ascii_lowercase())).collect()
        };

        for server_name in keys {
            let key = (transport_protocol, server_name);
            if let Some(first) = seen.get(&key) {
                let server_name = key.1.as_deref().unwrap_or(ANY_SERVER_NAME);
                warn!(
                    transport_protocol = %transport_protocol,
                    server_name = %server_name,
                    first_chain = %first,
                    second_chain = %chain.name,
                    "Filter chains overlap"
                );
                return Err(Error::AmbiguousMatch {
                    transport_protocol: transport_protocol.to_string(),
                    server_name: server_name.to_string(),
                    first: first.to_string(),
                    second: chain.name.clone(),
                });
            }
            seen.insert(key, chain.name.as_str());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use envoy_types::pb::envoy::config::listener::v3::FilterChainMatch;

    fn chain(name: &str, transport: &str, server_names: &[&str]) -> FilterChain {
        FilterChain {
            name: name.to_string(),
            filter_chain_match: Some(FilterChainMatch {
                transport_protocol: transport.to_string(),
                server_names: server_names.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn distinct_server_names_are_accepted() {
        let chains = vec![
            chain("default", "raw_buffer", &[]),
            chain("a", "tls", &["a.example.com"]),
            chain("b", "tls", &["b.example.com", "c.example.com"]),
        ];
        assert!(ensure_unambiguous(&chains).is_ok());
    }

    #[test]
    fn same_name_on_different_transports_is_accepted() {
        let chains = vec![chain("a", "tls", &["a.example.com"]), chain("b", "", &["a.example.com"])];
        assert!(ensure_unambiguous(&chains).is_ok());
    }

    #[test]
    fn wildcard_and_specific_names_do_not_clash() {
        let chains = vec![chain("any", "tls", &[]), chain("a", "tls", &["a.example.com"])];
        assert!(ensure_unambiguous(&chains).is_ok());
    }

    #[test]
    fn shared_server_name_is_rejected() {
        let chains = vec![
            chain("first", "tls", &["a.example.com", "shared.example.com"]),
            chain("second", "tls", &["shared.example.com"]),
        ];

        match ensure_unambiguous(&chains) {
            Err(Error::AmbiguousMatch { transport_protocol, server_name, first, second }) => {
                assert_eq!(transport_protocol, "tls");
                assert_eq!(server_name, "shared.example.com");
                assert_eq!(first, "first");
                assert_eq!(second, "second");
            }
            other => panic!("expected ambiguous match, got {:?}", other),
        }
    }

    #[test]
    fn server_names_differing_in_case_are_rejected() {
        let chains =
            vec![chain("first", "tls", &["Example.com"]), chain("second", "tls", &["example.COM"])];
        assert!(matches!(
            ensure_unambiguous(&chains),
            Err(Error::AmbiguousMatch { server_name, .. }) if server_name == "example.com"
        ));
    }

    #[test]
    fn two_wildcards_are_rejected() {
        let chains = vec![chain("first", "tls", &[]), chain("second", "tls", &[])];
        assert!(matches!(
            ensure_unambiguous(&chains),
            Err(Error::AmbiguousMatch { server_name, .. }) if server_name == ANY_SERVER_NAME
        ));
    }
}
