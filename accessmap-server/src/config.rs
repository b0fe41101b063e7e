//! Server configuration, read from a TOML file and overridden by CLI flags

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use accessmap_core::prelude::IsochroneConfig;
use clap::Parser;
use serde::Deserialize;

use crate::error::ServerError;

#[derive(Debug, Parser)]
#[command(name = "accessmap-server", version, about = "Transit accessibility map HTTP service")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Address to listen on
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Base URL of the trRouting service
    #[arg(long)]
    pub trrouting_url: Option<String>,
    /// GeoJSON collection of the transit nodes
    #[arg(long)]
    pub nodes: Option<PathBuf>,
    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub request_timeout_secs: u64,
    /// Maximum number of requests handled at once
    pub concurrency_limit: usize,
    pub trrouting_url: String,
    /// Attempts per routing query before the sample is given up
    pub trrouting_attempts: u32,
    pub nodes_path: PathBuf,
    pub isochrone: IsochroneConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            request_timeout_secs: 300,
            concurrency_limit: 8,
            trrouting_url: "http://localhost:4000".to_string(),
            trrouting_attempts: 2,
            nodes_path: PathBuf::from("nodes.geojson"),
            isochrone: IsochroneConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ServerError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ServerError> {
        let content = std::fs::read_to_string(path).map_err(|source| ServerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// File (or defaults) with the CLI flags applied on top
    pub fn load(cli: &Cli) -> Result<Self, ServerError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(bind) = cli.bind {
            config.bind = bind;
        }
        if let Some(url) = &cli.trrouting_url {
            config.trrouting_url.clone_from(url);
        }
        if let Some(nodes) = &cli.nodes {
            config.nodes_path.clone_from(nodes);
        }
        if let Some(timeout) = cli.timeout {
            config.request_timeout_secs = timeout;
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
