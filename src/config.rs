use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;
use std::net::SocketAddr;

fn default_max_file_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub max_file_size: usize,
}

impl Config {
    /// Read configuration from the environment, `.env` included. Missing
    /// variables fall back to defaults; malformed ones are errors.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let bind_addr = match std::env::var("CHART_SUGGESTER_ADDR") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid CHART_SUGGESTER_ADDR '{}': {}", raw, e))?,
            Err(_) => SocketAddr::from(([127, 0, 0, 1], 3000)),
        };

        let max_file_size = match std::env::var("CHART_SUGGESTER_MAX_FILE_SIZE") {
            Ok(raw) => raw.parse().map_err(|e| {
                anyhow::anyhow!("Invalid CHART_SUGGESTER_MAX_FILE_SIZE '{}': {}", raw, e)
            })?,
            Err(_) => default_max_file_size(),
        };

        Ok(Config {
            bind_addr,
            max_file_size,
        })
    }
}
