//! # Listener Translator
//!
//! Translates a description of how traffic should reach backend services into
//! the Envoy `Listener` resource a data-plane proxy consumes.
//!
//! ## Architecture
//!
//! ```text
//! hostname mappings + ListenerOptions → chain builders → Listener → typed Any
//!                                         ↓
//!                       SDS secret names, host network addresses
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use listener_translator::config::ListenerOptions;
//! use listener_translator::xds::{new_http_listener, TlsSecret};
//!
//! # fn main() -> listener_translator::Result<()> {
//! let tls = HashMap::from([(
//!     TlsSecret::new("default", "example-cert"),
//!     vec!["example.com".to_string()],
//! )]);
//! let resource = new_http_listener("listener", "envoy-secrets", &tls, &ListenerOptions::default())?;
//! assert_eq!(resource.decode_listener()?.filter_chains.len(), 2);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod observability;
pub mod xds;

// Re-export commonly used types and traits
pub use config::{ListenerOptions, TranslatorConfig};
pub use errors::{Error, Result};
pub use observability::init_logging;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
