//! Resolve command-line flags and fleet.toml into one set of settings.
//!
//! Flags win over the file. The file is optional: without `--config`,
//! `./fleet.toml` is read only if it exists.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use fleetscale_group::{DryRunGroupClient, FleetConfig, FleetGroupClient, GroupCapacity, HttpFleetApi};
use tracing::debug;

const DEFAULT_CONFIG: &str = "fleet.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Default, Args)]
pub struct TargetArgs {
    /// Path to fleet.toml (default: ./fleet.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Autoscaling group name
    #[arg(short, long, global = true)]
    pub group: Option<String>,

    /// Fleet service endpoint as host:port
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Simulate capacity operations without contacting the service
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub group: Option<String>,
    pub endpoint: Option<String>,
    pub dry_run: bool,
    pub format: OutputFormat,
}

impl Settings {
    pub fn resolve(args: &TargetArgs) -> Result<Self> {
        let config = load_config(args.config.as_deref())?;
        Ok(Self::merge(args, &config))
    }

    fn merge(args: &TargetArgs, config: &FleetConfig) -> Self {
        Self {
            group: args
                .group
                .clone()
                .or_else(|| config.group_name().map(str::to_string)),
            endpoint: args
                .endpoint
                .clone()
                .or_else(|| config.endpoint().map(str::to_string)),
            dry_run: args.dry_run || config.is_dry_run(),
            format: args.format,
        }
    }

    /// Group name for display; dry runs may leave it unset.
    pub fn group_label(&self) -> &str {
        self.group.as_deref().unwrap_or("(dry run)")
    }

    /// Client for capacity commands: the dry-run client in dry-run mode,
    /// otherwise a live client over HTTP.
    pub fn capacity_client(&self) -> Result<Box<dyn GroupCapacity>> {
        if self.dry_run {
            debug!("using dry-run capacity client");
            return Ok(Box::new(DryRunGroupClient::new()));
        }
        Ok(Box::new(self.live_client()?))
    }

    /// Live client for the configured group.
    pub fn live_client(&self) -> Result<FleetGroupClient> {
        let Some(group) = self.group.as_deref() else {
            bail!("no autoscaling group given. Pass --group or set [group].name in {DEFAULT_CONFIG}.");
        };
        let Some(endpoint) = self.endpoint.as_deref() else {
            bail!("no fleet service endpoint given. Pass --endpoint or set [service].endpoint in {DEFAULT_CONFIG}.");
        };
        debug!(%group, %endpoint, "using live fleet client");
        Ok(FleetGroupClient::new(group, Arc::new(HttpFleetApi::new(endpoint))))
    }
}

fn load_config(explicit: Option<&Path>) -> Result<FleetConfig> {
    match explicit {
        Some(path) => FleetConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => {
            let path = Path::new(DEFAULT_CONFIG);
            if path.is_file() {
                FleetConfig::from_file(path)
                    .with_context(|| format!("failed to load config from {}", path.display()))
            } else {
                Ok(FleetConfig::default())
            }
        }
    }
}
