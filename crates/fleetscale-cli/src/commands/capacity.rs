//! `fleetctl describe` and `fleetctl set-desired`.

use anyhow::Result;
use fleetscale_group::GroupStateSnapshot;
use serde_json::json;
use tracing::warn;

use super::settings::{OutputFormat, Settings};

pub async fn describe(settings: &Settings) -> Result<()> {
    let client = settings.capacity_client()?;
    let snapshot = client.describe().await?;

    if !snapshot.within_bounds() {
        warn!(
            desired = snapshot.desired_count,
            min = snapshot.min_size,
            max = snapshot.max_size,
            "service reported desired capacity outside min/max"
        );
    }

    println!("{}", render_snapshot(settings.group_label(), &snapshot, settings.format)?);
    Ok(())
}

pub async fn set_desired(settings: &Settings, count: u32) -> Result<()> {
    let client = settings.capacity_client()?;
    client.set_desired_capacity(count).await?;

    match settings.format {
        OutputFormat::Text => {
            let suffix = if settings.dry_run { " (dry run)" } else { "" };
            println!("Desired capacity of {} set to {count}{suffix}", settings.group_label());
        }
        OutputFormat::Json => {
            let out = json!({
                "group": settings.group,
                "desired_count": count,
                "dry_run": settings.dry_run,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}

fn render_snapshot(group: &str, snapshot: &GroupStateSnapshot, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => format!(
            "Group:    {group}\nPending:  {}\nDesired:  {}\nMin size: {}\nMax size: {}",
            snapshot.pending, snapshot.desired_count, snapshot.min_size, snapshot.max_size
        ),
        OutputFormat::Json => serde_json::to_string_pretty(snapshot)?,
    })
}
