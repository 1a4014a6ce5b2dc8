//! Command-line argument parsing

use crate::config::ManagerConfig;
use clap::{Parser, Subcommand};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "docker-registry-manager")]
#[command(about = "Browse Docker Registry v2 endpoints: repositories, tags and image history")]
#[command(version, author)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output
    #[arg(long = "verbose", short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Skip TLS verification
    #[arg(
        long = "skip-tls",
        short = 'k',
        global = true,
        help = "Skip TLS certificate verification"
    )]
    pub skip_tls: bool,

    /// Timeout in seconds for each registry request
    #[arg(
        long = "timeout",
        short = 't',
        global = true,
        help = "Per-request timeout in seconds (unbounded when omitted)"
    )]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Check whether a registry answers on its API root
    Status {
        /// Registry URI with explicit port, e.g. http://localhost:5000
        uri: String,
    },
    /// List the repositories in a registry catalog
    Repos { uri: String },
    /// List tags of a repository with size, layer count and last update
    Tags { uri: String, repository: String },
    /// Show the decoded manifest and layer sizes of one tag
    Image {
        uri: String,
        repository: String,
        tag: String,
    },
    /// Delete a tag by resolving and deleting its manifest digest
    Delete {
        uri: String,
        repository: String,
        tag: String,
    },
    /// Refresh every configured registry on an interval
    Watch {
        /// Additional registry URIs to watch
        #[arg(long = "registry", short = 'r')]
        registries: Vec<String>,

        /// Seconds between refreshes
        #[arg(long = "interval", short = 'i', default_value = "60")]
        interval: u64,
    },
}

impl Args {
    /// Validate arguments
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout == Some(0) {
            return Err("Timeout must be greater than 0".to_string());
        }
        if let Command::Watch { interval: 0, .. } = self.command {
            return Err("Interval must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Layer command-line flags over an environment-derived configuration
    pub fn apply_to(&self, mut config: ManagerConfig) -> ManagerConfig {
        if self.verbose {
            config = config.with_verbose(true);
        }
        if self.skip_tls {
            config = config.with_skip_tls(true);
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Some(Duration::from_secs(secs)));
        }
        if let Command::Watch { registries, .. } = &self.command {
            for uri in registries {
                config = config.with_registry(uri.clone());
            }
        }
        config
    }
}
