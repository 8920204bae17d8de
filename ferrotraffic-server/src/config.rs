//! Server configuration: TOML file with command line overrides

use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use ferrotraffic_core::{NetworkConfig, TrafficConfig};
use serde::Deserialize;

#[derive(Debug, Parser)]
#[command(name = "ferrotraffic-server", version, about = "Routing network with live traffic updates")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Address to listen on, e.g. 0.0.0.0:8989
    #[arg(long)]
    pub listen: Option<SocketAddr>,
    /// GeoJSON street network
    #[arg(long)]
    pub network: Option<PathBuf>,
    /// Traffic feed URL
    #[arg(long)]
    pub feed_url: Option<String>,
    /// Do not poll the traffic feed, only accept pushed reports
    #[arg(long)]
    pub no_updates: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub network: NetworkConfig,
    pub traffic: TrafficConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub request_timeout_secs: u64,
    pub max_concurrent_requests: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 8989)),
            request_timeout_secs: 30,
            max_concurrent_requests: 256,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// # Errors
    ///
    /// Returns an error if `raw` is not a valid configuration
    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Reads the configuration file, if any, and applies command line overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load(cli: &Cli) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let mut config = match &cli.config {
            Some(path) => Self::from_toml(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };

        if let Some(listen) = cli.listen {
            config.server.listen = listen;
        }
        if let Some(network) = &cli.network {
            config.network.path.clone_from(network);
        }
        if let Some(feed_url) = &cli.feed_url {
            config.traffic.feed_url.clone_from(feed_url);
        }
        if cli.no_updates {
            config.traffic.enabled = false;
        }

        Ok(config)
    }
}
