use std::path::PathBuf;

use thiserror::Error;

/// Startup failures of the server
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Cannot load transit nodes: {0}")]
    Nodes(#[from] accessmap_core::Error),
    #[error("Cannot build the routing client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("Cannot bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}
