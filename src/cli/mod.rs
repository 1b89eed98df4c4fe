//! Command-line arguments for the `elpris-server` binary.

use std::path::PathBuf;

use clap::Parser;

use crate::config::ServiceConfig;

/// Electricity price chat service
#[derive(Parser, Debug, Default)]
#[command(name = "elpris-server", version, about = "Chat about Swedish electricity prices")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "ELPRIS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on (overrides HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl Cli {
    /// Command-line flags win over every other configuration layer.
    pub fn apply(&self, config: &mut ServiceConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}
