//! Route files read by the CLI
//!
//! HTTP listeners take a list of certificate secrets with their hostnames,
//! SNI listeners a list of backends with their hostnames:
//!
//! ```yaml
//! # http
//! - secret: { namespace: default, name: example-cert }
//!   hostnames: [example.com, www.example.com]
//! # sni
//! - backend: default/example:443
//!   hostnames: [example.org]
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::xds::TlsSecret;

/// One certificate secret and the hostnames it serves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsRoute {
    pub secret: TlsSecret,
    #[serde(default)]
    pub hostnames: Vec<String>,
}

/// One passthrough backend and the hostnames routed to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendRoute {
    pub backend: String,
    #[serde(default)]
    pub hostnames: Vec<String>,
}

/// Read TLS routes from a YAML (or JSON) file
pub fn load_tls_routes(path: &Path) -> Result<HashMap<TlsSecret, Vec<String>>> {
    let routes: Vec<TlsRoute> = read_routes(path)?;
    tls_route_map(routes)
}

/// Read passthrough routes from a YAML (or JSON) file
pub fn load_backend_routes(path: &Path) -> Result<HashMap<String, Vec<String>>> {
    let routes: Vec<BackendRoute> = read_routes(path)?;
    backend_route_map(routes)
}

fn read_routes<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read routes file: {}", path.display()))?;

    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse routes file: {}", path.display()))
}

/// Collect TLS routes into a map, rejecting a secret listed twice
pub fn tls_route_map(routes: Vec<TlsRoute>) -> Result<HashMap<TlsSecret, Vec<String>>> {
    let mut map = HashMap::with_capacity(routes.len());
    for route in routes {
        if map.contains_key(&route.secret) {
            bail!("Secret '{}/{}' is listed more than once", route.secret.namespace, route.secret.name);
        }
        map.insert(route.secret, route.hostnames);
    }
    Ok(map)
}

/// Collect backend routes into a map, rejecting a backend listed twice
pub fn backend_route_map(routes: Vec<BackendRoute>) -> Result<HashMap<String, Vec<String>>> {
    let mut map = HashMap::with_capacity(routes.len());
    for route in routes {
        if route.backend.trim().is_empty() {
            bail!("Backend name cannot be empty");
        }
        if map.contains_key(&route.backend) {
            bail!("Backend '{}' is listed more than once", route.backend);
        }
        map.insert(route.backend, route.hostnames);
    }
    Ok(map)
}
