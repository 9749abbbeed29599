//! Transport seam to the fleet-management service.
//!
//! A `FleetApi` is the session a client talks through. It is injected at
//! construction (`Arc<dyn FleetApi>`) and shared freely between clients;
//! implementations hold no per-call state.

use async_trait::async_trait;

use crate::error::FleetResult;
use crate::types::{ActivityPage, GroupDescription, SetDesiredCapacityRequest};

#[async_trait]
pub trait FleetApi: Send + Sync {
    /// Describe a group by name. `Ok(None)` when the service knows no such
    /// group.
    async fn describe_group(&self, group: &str) -> FleetResult<Option<GroupDescription>>;

    /// Set a group's desired capacity.
    async fn set_desired_capacity(&self, request: &SetDesiredCapacityRequest) -> FleetResult<()>;

    /// Fetch one page of a group's activity history, newest first, starting
    /// after `next_token` (or at the newest activity when `None`).
    async fn describe_activities(
        &self,
        group: &str,
        next_token: Option<&str>,
    ) -> FleetResult<ActivityPage>;
}
