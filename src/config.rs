use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub merged_csv: PathBuf,
    pub oflog_csv: PathBuf,
    /// Static files (logo, stylesheet) served under `/assets`.
    pub assets_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8050".to_string()),
            merged_csv: std::env::var("MERGED_CSV")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("Merged_Local_Authority_Data.csv")),
            oflog_csv: std::env::var("OFLOG_CSV")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("Oflog.csv")),
            assets_dir: std::env::var("ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("assets")),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_addr
            .parse()
            .with_context(|| format!("invalid BIND_ADDR {:?}", self.bind_addr))
    }
}
