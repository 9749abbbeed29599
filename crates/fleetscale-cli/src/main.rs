use clap::{Parser, Subcommand};

mod commands;

use commands::settings::{Settings, TargetArgs};

#[derive(Parser)]
#[command(
    name = "fleetctl",
    about = "fleetscale — autoscaling group desired capacity control",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(flatten)]
    target: TargetArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show pending instances and desired/min/max capacity
    Describe,
    /// Set the group's desired capacity, bypassing any cooldown
    SetDesired {
        /// New desired capacity
        count: u32,
    },
    /// Show the most recent operator-driven scale-out and scale-in.
    ///
    /// Not available with --dry-run.
    LastActivities,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fleetctl=info".parse()?)
                .add_directive("fleetscale_group=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::resolve(&cli.target)?;

    match cli.command {
        Commands::Describe => commands::capacity::describe(&settings).await,
        Commands::SetDesired { count } => commands::capacity::set_desired(&settings, count).await,
        Commands::LastActivities => commands::activity::last_activities(&settings).await,
    }
}
