//! Command-line interface definitions for the tutor backend.
//!
//! Flags override values from the YAML config file. The API key is taken
//! from the environment (or a `.env` file) rather than the config file.

use std::path::PathBuf;

use clap::Parser;

use crate::config::Config;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Defaults: listen on 0.0.0.0:8000, key from OPENAI_API_KEY
/// news_vocab_tutor
///
/// # With a config file and a different port
/// news_vocab_tutor -c ./tutor.yaml --port 9000
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bind address (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// HTTP port (overrides server.port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(key) = &self.openai_api_key {
            config.llm.api_key = Some(key.clone());
        }
    }
}
