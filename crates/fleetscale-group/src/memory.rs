//! In-memory fleet-management service.
//!
//! Behaves like the real service closely enough for tests: groups are
//! keyed by name, activity history is kept newest first and paginated with
//! opaque offset tokens, out-of-range capacity requests are rejected, and
//! accepted capacity changes append an operator activity.
//! Every request is recorded so callers can assert on what was sent.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::api::FleetApi;
use crate::error::{FleetResult, UpstreamError};
use crate::types::*;

/// Page size used by the service when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Kind of request received by an [`InMemoryFleet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    DescribeGroup,
    SetDesiredCapacity,
    DescribeActivities,
}

/// A request as received by an [`InMemoryFleet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    DescribeGroup {
        group: String,
    },
    SetDesiredCapacity(SetDesiredCapacityRequest),
    DescribeActivities {
        group: String,
        next_token: Option<String>,
    },
}

impl RecordedCall {
    pub fn kind(&self) -> CallKind {
        match self {
            Self::DescribeGroup { .. } => CallKind::DescribeGroup,
            Self::SetDesiredCapacity(_) => CallKind::SetDesiredCapacity,
            Self::DescribeActivities { .. } => CallKind::DescribeActivities,
        }
    }
}

struct FleetGroup {
    description: GroupDescription,
    /// Newest first.
    activities: Vec<ScalingActivity>,
}

/// A failure armed for the `call_index`-th request of `kind` (zero-based,
/// counted over the fleet's lifetime).
struct ArmedFailure {
    kind: CallKind,
    call_index: usize,
    error: UpstreamError,
}

#[derive(Default)]
struct FleetState {
    groups: HashMap<String, FleetGroup>,
    calls: Vec<RecordedCall>,
    failures: Vec<ArmedFailure>,
    activity_seq: u64,
}

impl FleetState {
    /// Record the call, then hand back any failure armed for it.
    fn record(&mut self, call: RecordedCall) -> FleetResult<()> {
        let kind = call.kind();
        let index = self.calls.iter().filter(|c| c.kind() == kind).count();
        self.calls.push(call);

        match self
            .failures
            .iter()
            .position(|f| f.kind == kind && f.call_index == index)
        {
            Some(pos) => Err(self.failures.remove(pos).error),
            None => Ok(()),
        }
    }

    fn group_mut(&mut self, name: &str) -> FleetResult<&mut FleetGroup> {
        self.groups.get_mut(name).ok_or_else(|| UpstreamError::Service {
            status: 400,
            message: format!("ValidationError: AutoScalingGroup name not found - {name}"),
        })
    }
}

/// Simulated fleet-management service. Cheap to share behind an `Arc`.
pub struct InMemoryFleet {
    page_size: usize,
    state: Mutex<FleetState>,
}

impl InMemoryFleet {
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            state: Mutex::new(FleetState::default()),
        }
    }

    /// Set how many activities each history page holds (minimum 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn state(&self) -> MutexGuard<'_, FleetState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Seeding ────────────────────────────────────────────────────

    /// Insert or replace a group. Existing activity history is kept.
    pub fn put_group(&self, description: GroupDescription) {
        let mut state = self.state();
        let name = description.auto_scaling_group_name.clone();
        if let Some(group) = state.groups.get_mut(&name) {
            group.description = description;
            return;
        }
        state.groups.insert(
            name,
            FleetGroup {
                description,
                activities: Vec::new(),
            },
        );
    }

    /// Replace a group's history. `activities` must be newest first.
    /// Ignored for unknown groups.
    pub fn set_activities(&self, group: &str, activities: Vec<ScalingActivity>) {
        if let Some(g) = self.state().groups.get_mut(group) {
            g.activities = activities;
        }
    }

    /// Record `activity` as the newest entry in a group's history.
    /// Ignored for unknown groups.
    pub fn push_activity(&self, group: &str, activity: ScalingActivity) {
        if let Some(g) = self.state().groups.get_mut(group) {
            g.activities.insert(0, activity);
        }
    }

    /// Fail the `call_index`-th request of `kind` (zero-based) with `error`.
    pub fn fail_call(&self, kind: CallKind, call_index: usize, error: UpstreamError) {
        self.state().failures.push(ArmedFailure {
            kind,
            call_index,
            error,
        });
    }

    // ── Inspection ─────────────────────────────────────────────────

    /// Every request received so far, in arrival order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }

    pub fn call_count(&self, kind: CallKind) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| c.kind() == kind)
            .count()
    }

    /// Current description of a group, if it exists.
    pub fn group(&self, name: &str) -> Option<GroupDescription> {
        self.state()
            .groups
            .get(name)
            .map(|g| g.description.clone())
    }
}

impl Default for InMemoryFleet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FleetApi for InMemoryFleet {
    async fn describe_group(&self, group: &str) -> FleetResult<Option<GroupDescription>> {
        let mut state = self.state();
        state.record(RecordedCall::DescribeGroup {
            group: group.to_string(),
        })?;
        Ok(state.groups.get(group).map(|g| g.description.clone()))
    }

    async fn set_desired_capacity(&self, request: &SetDesiredCapacityRequest) -> FleetResult<()> {
        let mut state = self.state();
        state.record(RecordedCall::SetDesiredCapacity(request.clone()))?;

        state.activity_seq += 1;
        let seq = state.activity_seq;
        let group = state.group_mut(&request.auto_scaling_group_name)?;
        let desired = request.desired_capacity;
        let (min, max) = (group.description.min_size, group.description.max_size);

        if desired > max {
            return Err(UpstreamError::Service {
                status: 400,
                message: format!(
                    "ValidationError: New SetDesiredCapacity value {desired} is above max value {max} for the AutoScalingGroup."
                ),
            });
        }
        if desired < min {
            return Err(UpstreamError::Service {
                status: 400,
                message: format!(
                    "ValidationError: New SetDesiredCapacity value {desired} is below min value {min} for the AutoScalingGroup."
                ),
            });
        }

        let previous = group.description.desired_capacity;
        group.description.desired_capacity = desired;
        if desired != previous {
            group
                .activities
                .insert(0, operator_activity(seq, previous, desired));
        }

        debug!(
            group = %request.auto_scaling_group_name,
            from = previous,
            to = desired,
            "in-memory desired capacity updated"
        );
        Ok(())
    }

    async fn describe_activities(
        &self,
        group: &str,
        next_token: Option<&str>,
    ) -> FleetResult<ActivityPage> {
        let mut state = self.state();
        state.record(RecordedCall::DescribeActivities {
            group: group.to_string(),
            next_token: next_token.map(str::to_string),
        })?;

        let page_size = self.page_size;
        let history = &state.group_mut(group)?.activities;

        let start = match next_token {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .ok()
                .filter(|offset| *offset <= history.len())
                .ok_or_else(|| UpstreamError::Service {
                    status: 400,
                    message: format!("InvalidNextToken: {token}"),
                })?,
        };
        let end = start.saturating_add(page_size).min(history.len());

        Ok(ActivityPage {
            activities: history[start..end].to_vec(),
            next_token: (end < history.len()).then(|| end.to_string()),
        })
    }
}

/// The activity the service records for an accepted operator change.
fn operator_activity(seq: u64, from: u32, to: u32) -> ScalingActivity {
    let (action, marker) = if to > from {
        ("an instance was started", SCALE_OUT_MARKER)
    } else {
        ("an instance was taken out of service", SCALE_IN_MARKER)
    };
    let cause = format!(
        "At sequence {seq} {USER_REQUEST_MARKER} from {from} to {to}. \
         At sequence {seq} {action} in response to a difference between desired and actual capacity, \
         {marker} from {from} to {to}."
    );
    let mut activity = ScalingActivity::new(format!("act-{seq}"), ActivityStatus::Successful, cause);
    activity.description = Some(format!("Desired capacity changed from {from} to {to}"));
    activity
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str, desired: u32) -> GroupDescription {
        GroupDescription {
            auto_scaling_group_name: name.to_string(),
            desired_capacity: desired,
            min_size: 1,
            max_size: 10,
            instances: vec![],
        }
    }

    fn numbered(n: usize) -> Vec<ScalingActivity> {
        (0..n)
            .map(|i| ScalingActivity::new(format!("a{i}"), ActivityStatus::Failed, ""))
            .collect()
    }

    #[tokio::test]
    async fn describe_unknown_group_returns_none() {
        let fleet = InMemoryFleet::new();
        assert_eq!(fleet.describe_group("missing").await.unwrap(), None);
        assert_eq!(fleet.call_count(CallKind::DescribeGroup), 1);
    }

    #[tokio::test]
    async fn activities_paginate_with_tokens() {
        let fleet = InMemoryFleet::new().with_page_size(2);
        fleet.put_group(group("web", 2));
        fleet.set_activities("web", numbered(5));

        let p1 = fleet.describe_activities("web", None).await.unwrap();
        assert_eq!(p1.activities.len(), 2);
        assert_eq!(p1.activities[0].activity_id, "a0");
        let p2 = fleet
            .describe_activities("web", p1.next_token.as_deref())
            .await
            .unwrap();
        assert_eq!(p2.activities[0].activity_id, "a2");
        let p3 = fleet
            .describe_activities("web", p2.next_token.as_deref())
            .await
            .unwrap();
        assert_eq!(p3.activities.len(), 1);
        assert_eq!(p3.next_token, None);
    }

    #[tokio::test]
    async fn empty_history_is_one_empty_page() {
        let fleet = InMemoryFleet::new();
        fleet.put_group(group("web", 2));
        let page = fleet.describe_activities("web", None).await.unwrap();
        assert!(page.activities.is_empty());
        assert_eq!(page.next_token, None);
    }

    #[tokio::test]
    async fn unbounded_page_size_with_token_returns_rest() {
        let fleet = InMemoryFleet::new().with_page_size(usize::MAX);
        fleet.put_group(group("web", 2));
        fleet.set_activities("web", numbered(3));

        let page = fleet.describe_activities("web", Some("1")).await.unwrap();
        assert_eq!(page.activities.len(), 2);
        assert_eq!(page.activities[0].activity_id, "a1");
        assert_eq!(page.next_token, None);
    }

    #[tokio::test]
    async fn bad_token_is_rejected() {
        let fleet = InMemoryFleet::new();
        fleet.put_group(group("web", 2));
        let err = fleet
            .describe_activities("web", Some("not-a-token"))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Service { status: 400, .. }));
    }

    #[tokio::test]
    async fn set_desired_validates_against_bounds() {
        let fleet = InMemoryFleet::new();
        fleet.put_group(group("web", 2));

        let request = SetDesiredCapacityRequest {
            auto_scaling_group_name: "web".to_string(),
            desired_capacity: 11,
            honor_cooldown: false,
        };
        let err = fleet.set_desired_capacity(&request).await.unwrap_err();
        assert!(err.to_string().contains("above max value 10"));
        assert_eq!(fleet.group("web").unwrap().desired_capacity, 2);
    }

    #[tokio::test]
    async fn accepted_change_records_operator_activity() {
        let fleet = InMemoryFleet::new();
        fleet.put_group(group("web", 2));

        let request = SetDesiredCapacityRequest {
            auto_scaling_group_name: "web".to_string(),
            desired_capacity: 5,
            honor_cooldown: false,
        };
        fleet.set_desired_capacity(&request).await.unwrap();

        let page = fleet.describe_activities("web", None).await.unwrap();
        assert_eq!(page.activities.len(), 1);
        assert_eq!(page.activities[0].direction(), ScalingDirection::Out);
        assert_eq!(fleet.group("web").unwrap().desired_capacity, 5);
    }

    #[tokio::test]
    async fn unchanged_capacity_records_nothing() {
        let fleet = InMemoryFleet::new();
        fleet.put_group(group("web", 2));
        let request = SetDesiredCapacityRequest {
            auto_scaling_group_name: "web".to_string(),
            desired_capacity: 2,
            honor_cooldown: false,
        };
        fleet.set_desired_capacity(&request).await.unwrap();
        let page = fleet.describe_activities("web", None).await.unwrap();
        assert!(page.activities.is_empty());
    }

    #[tokio::test]
    async fn armed_failure_fires_once_on_matching_call() {
        let fleet = InMemoryFleet::new();
        fleet.put_group(group("web", 2));
        fleet.fail_call(
            CallKind::DescribeGroup,
            1,
            UpstreamError::Transport("connection reset".to_string()),
        );

        assert!(fleet.describe_group("web").await.is_ok());
        assert!(fleet.describe_group("web").await.is_err());
        assert!(fleet.describe_group("web").await.is_ok());
        assert_eq!(fleet.calls().len(), 3);
    }
}
