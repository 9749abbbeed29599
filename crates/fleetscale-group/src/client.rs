//! Group clients — the real one backed by a [`FleetApi`] session and a
//! dry-run stand-in for simulated runs.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::api::FleetApi;
use crate::error::{FleetResult, UpstreamError};
use crate::reconcile::ActivityReconciler;
use crate::types::*;

/// Read and write a group's desired capacity.
///
/// Implemented by [`FleetGroupClient`] and [`DryRunGroupClient`]; callers
/// pick the variant and use it through this trait.
#[async_trait]
pub trait GroupCapacity: Send + Sync {
    async fn describe(&self) -> FleetResult<GroupStateSnapshot>;

    async fn set_desired_capacity(&self, count: u32) -> FleetResult<()>;
}

/// Paged access to a group's activity history, newest first.
#[async_trait]
pub trait ActivityFeed: Send + Sync {
    async fn activities_page(&self, next_token: Option<&str>) -> FleetResult<ActivityPage>;
}

/// Client for one named autoscaling group.
#[derive(Clone)]
pub struct FleetGroupClient {
    name: String,
    api: Arc<dyn FleetApi>,
}

impl std::fmt::Debug for FleetGroupClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetGroupClient")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl FleetGroupClient {
    pub fn new(name: impl Into<String>, api: Arc<dyn FleetApi>) -> Self {
        Self {
            name: name.into(),
            api,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Find the most recent operator-driven scale-out and scale-in.
    pub async fn last_scaling_activities(&self) -> FleetResult<ActivityReconciliation> {
        ActivityReconciler::new(self).reconcile().await
    }
}

#[async_trait]
impl GroupCapacity for FleetGroupClient {
    async fn describe(&self) -> FleetResult<GroupStateSnapshot> {
        info!(group = %self.name, "collecting autoscaling group details");

        let started = Instant::now();
        let group = self
            .api
            .describe_group(&self.name)
            .await?
            .ok_or_else(|| UpstreamError::GroupNotFound(self.name.clone()))?;
        let elapsed = started.elapsed();

        let snapshot = GroupStateSnapshot::from_description(&group);
        info!(
            group = %self.name,
            pending = snapshot.pending,
            desired = snapshot.desired_count,
            min = snapshot.min_size,
            max = snapshot.max_size,
            took_ms = elapsed.as_millis() as u64,
            "autoscaling group described"
        );
        Ok(snapshot)
    }

    async fn set_desired_capacity(&self, count: u32) -> FleetResult<()> {
        // A requested change must take effect now, not wait out a cooldown.
        let request = SetDesiredCapacityRequest {
            auto_scaling_group_name: self.name.clone(),
            desired_capacity: count,
            honor_cooldown: false,
        };
        self.api.set_desired_capacity(&request).await?;
        info!(group = %self.name, desired = count, "desired capacity set");
        Ok(())
    }
}

#[async_trait]
impl ActivityFeed for FleetGroupClient {
    async fn activities_page(&self, next_token: Option<&str>) -> FleetResult<ActivityPage> {
        let page = self.api.describe_activities(&self.name, next_token).await?;
        debug!(
            group = %self.name,
            activities = page.activities.len(),
            has_more = page.next_token.is_some(),
            "fetched activity page"
        );
        Ok(page)
    }
}

/// Capacity client that never contacts the service.
///
/// `describe` always reports a zero-valued snapshot and
/// `set_desired_capacity` always succeeds. Activity history is not
/// available in dry-run mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunGroupClient;

impl DryRunGroupClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GroupCapacity for DryRunGroupClient {
    async fn describe(&self) -> FleetResult<GroupStateSnapshot> {
        Ok(GroupStateSnapshot::default())
    }

    async fn set_desired_capacity(&self, count: u32) -> FleetResult<()> {
        info!(desired = count, "dry run: skipping desired capacity change");
        Ok(())
    }
}
