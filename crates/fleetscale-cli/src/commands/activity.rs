//! `fleetctl last-activities` — latest operator scale-out and scale-in.

use anyhow::{Result, bail};
use fleetscale_group::{ActivityReconciliation, ScalingActivity};
use serde_json::json;

use super::settings::{OutputFormat, Settings};

pub async fn last_activities(settings: &Settings) -> Result<()> {
    if settings.dry_run {
        bail!("last-activities reads the live activity history and is not available with --dry-run");
    }

    let client = settings.live_client()?;
    let result = client.last_scaling_activities().await?;
    println!("{}", render(client.name(), &result, settings.format)?);
    Ok(())
}

fn render(group: &str, result: &ActivityReconciliation, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => format!(
            "Group: {group}\nLast scale-out: {}\nLast scale-in:  {}\n(scanned {} activities over {} pages)",
            describe_slot(result.last_scale_out.as_ref()),
            describe_slot(result.last_scale_in.as_ref()),
            result.scan.activities_examined,
            result.scan.pages_fetched,
        ),
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "group": group,
            "last_scale_out": result.last_scale_out,
            "last_scale_in": result.last_scale_in,
            "scan": result.scan,
        }))?,
    })
}

fn describe_slot(activity: Option<&ScalingActivity>) -> String {
    match activity {
        None => "none found".to_string(),
        Some(a) => {
            let when = a.start_time.as_deref().unwrap_or("unknown time");
            let what = a.description.as_deref().unwrap_or(a.cause.as_str());
            format!("{} at {when}: {what}", a.activity_id)
        }
    }
}
