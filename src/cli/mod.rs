//! # Command Line Interface
//!
//! Translates a routes file into a Listener resource and prints it as JSON or
//! YAML. Flags override the `LISTENER_TRANSLATOR_*` environment configuration.

pub mod output;
pub mod routes;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::{HostNetworkOptions, TcpKeepaliveOptions, TranslatorConfig};
use crate::xds::{new_http_listener, new_sni_listener, BuiltResource, ListenerResource};
use output::{print_output, OutputFormat};

#[derive(Parser)]
#[command(name = "listener-translator")]
#[command(about = "Translate hostname routes into Envoy Listener resources")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub listener: ListenerArgs,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "json")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// HTTP listener: plain HTTP plus TLS termination per certificate secret
    #[command(
        after_help = "EXAMPLES:\n    listener-translator http --name listener --routes tls-routes.yaml\n\n    listener-translator --proxy-protocol http --name listener --routes tls-routes.yaml --output yaml"
    )]
    Http {
        /// Listener name
        #[arg(long)]
        name: String,

        /// Namespace hosting the SDS secrets
        #[arg(long)]
        secrets_namespace: Option<String>,

        /// YAML file listing certificate secrets and their hostnames
        #[arg(long, value_name = "FILE")]
        routes: PathBuf,
    },

    /// SNI passthrough listener: TLS forwarded untouched to backends
    #[command(
        after_help = "EXAMPLES:\n    listener-translator sni --name passthrough --routes backends.yaml"
    )]
    Sni {
        /// Listener name
        #[arg(long)]
        name: String,

        /// YAML file listing backends and their hostnames
        #[arg(long, value_name = "FILE")]
        routes: PathBuf,
    },
}

/// Listener option overrides
#[derive(Args, Debug, Default)]
pub struct ListenerArgs {
    /// Expect a PROXY protocol header on accepted connections
    #[arg(long, global = true)]
    pub proxy_protocol: bool,

    /// Trusted hops when deriving the client address from X-Forwarded-For
    #[arg(long, global = true, value_name = "HOPS")]
    pub xff_num_trusted_hops: Option<u32>,

    /// ALPN protocol advertised by TLS chains (repeatable)
    #[arg(long = "alpn", global = true, value_name = "PROTOCOL")]
    pub alpn_protocols: Vec<String>,

    /// HTTP stream idle timeout in seconds
    #[arg(long, global = true, value_name = "SECONDS")]
    pub stream_idle_timeout: Option<u64>,

    /// Bind on the host network at this port (repeatable, order is kept)
    #[arg(long = "host-network-port", global = true, value_name = "PORT")]
    pub host_network_ports: Vec<u32>,

    /// Do not bind IPv4 wildcard addresses on the host network
    #[arg(long, global = true)]
    pub disable_ipv4: bool,

    /// Bind IPv6 wildcard addresses on the host network
    #[arg(long, global = true)]
    pub enable_ipv6: bool,

    /// Enable TCP keepalive on accepted connections
    #[arg(long, global = true)]
    pub tcp_keepalive: bool,
}

impl ListenerArgs {
    /// Apply the flags on top of the environment configuration
    pub fn apply(&self, config: &mut TranslatorConfig) {
        let listener = &mut config.listener;

        listener.proxy_protocol |= self.proxy_protocol;
        if let Some(hops) = self.xff_num_trusted_hops {
            listener.xff_num_trusted_hops = hops;
        }
        if !self.alpn_protocols.is_empty() {
            listener.alpn_protocols = self.alpn_protocols.clone();
        }
        if let Some(timeout) = self.stream_idle_timeout {
            listener.stream_idle_timeout_seconds = Some(timeout);
        }
        if !self.host_network_ports.is_empty() {
            let current = listener.host_network.take().unwrap_or_default();
            listener.host_network = Some(HostNetworkOptions {
                ports: self.host_network_ports.clone(),
                ..current
            });
        }
        if let Some(host_network) = listener.host_network.as_mut() {
            host_network.ipv4_enabled &= !self.disable_ipv4;
            host_network.ipv6_enabled |= self.enable_ipv6;
        }
        if self.tcp_keepalive && listener.tcp_keepalive.is_none() {
            listener.tcp_keepalive = Some(TcpKeepaliveOptions::default());
        }
    }
}

/// Run CLI commands
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let mut config = TranslatorConfig::from_env().context("Failed to load configuration")?;
    if cli.verbose {
        config.observability.log_level = "debug".to_string();
    }
    crate::init_logging(&config.observability)?;

    cli.listener.apply(&mut config);
    debug!(options = ?config.listener, "Resolved listener options");

    let built = translate(&cli.command, &config)?;
    print_output(&ListenerResource::from(&built), cli.output)
}

/// Build the listener requested by `command`
pub fn translate(command: &Commands, config: &TranslatorConfig) -> Result<BuiltResource> {
    let built = match command {
        Commands::Http { name, secrets_namespace, routes } => {
            let tls = routes::load_tls_routes(routes)?;
            let secrets_namespace =
                secrets_namespace.as_deref().unwrap_or(&config.secrets_namespace);
            new_http_listener(name, secrets_namespace, &tls, &config.listener)
                .with_context(|| format!("Failed to build HTTP listener '{}'", name))?
        }
        Commands::Sni { name, routes } => {
            let backends = routes::load_backend_routes(routes)?;
            new_sni_listener(name, &backends, &config.listener)
                .with_context(|| format!("Failed to build SNI listener '{}'", name))?
        }
    };
    Ok(built)
}
