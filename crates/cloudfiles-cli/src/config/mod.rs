//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── client: ClientConfig       # Credentials, auth host, servicenet
//! ├── transport: ReqwestConfig   # Timeouts, CA bundle, user agent
//! └── command: Command           # The operation to run
//! ```
//!
//! All configuration can be provided via CLI arguments or environment
//! variables. Use `--help` to see all available options.

use std::process;

use anyhow::Context;
use clap::Parser;
use cloudfiles_client::{ClientConfig, ReqwestConfig};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::commands::Command;
use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "cloudfiles")]
#[command(about = "Cloud Files object storage client")]
#[command(version)]
pub struct Cli {
    /// Account and authentication settings.
    #[clap(flatten)]
    pub client: ClientConfig,

    /// HTTP transport settings.
    #[clap(flatten)]
    pub transport: ReqwestConfig,

    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.client
            .validate()
            .context("invalid client configuration")?;
        self.transport
            .validate()
            .context("invalid transport configuration")?;
        Ok(())
    }

    /// Logs configuration at debug level (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            username = %self.client.username,
            legacy = self.client.legacy_account.is_some(),
            auth_host = ?self.client.auth_host.as_ref().map(|url| url.as_str()),
            servicenet = self.client.use_internal_network(),
            reauthenticate = self.client.reauthenticate,
            connect_timeout_secs = self.transport.connect_timeout,
            request_timeout_secs = ?self.transport.request_timeout,
            ca_bundle = ?self.transport.ca_bundle,
            "Client configuration"
        );
    }

    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
