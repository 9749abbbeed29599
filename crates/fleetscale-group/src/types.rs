//! Domain and wire types for autoscaling groups.
//!
//! Wire types use the fleet-management service's PascalCase field names
//! so they serialize straight into request and response bodies.
//! [`GroupStateSnapshot`] and [`ActivityReconciliation`] are the
//! normalized views handed back to callers.

use serde::{Deserialize, Serialize};

/// Lifecycle states beginning with this prefix count as pending
/// (`"Pending"`, `"Pending:Wait"`, `"Pending:Proceed"`).
pub const PENDING_STATE_PREFIX: &str = "Pending";

/// Cause phrase the service writes when an operator explicitly changed the
/// desired capacity, as opposed to a scaling policy or health replacement.
pub const USER_REQUEST_MARKER: &str =
    "a user request explicitly set group desired capacity changing the desired capacity";

/// Cause phrase for activities that added capacity.
pub const SCALE_OUT_MARKER: &str = "increasing the capacity";

/// Cause phrase for activities that removed capacity.
pub const SCALE_IN_MARKER: &str = "shrinking the capacity";

// ── Group description ─────────────────────────────────────────────

/// A group as returned by the describe call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct GroupDescription {
    pub auto_scaling_group_name: String,
    pub desired_capacity: u32,
    pub min_size: u32,
    pub max_size: u32,
    #[serde(default)]
    pub instances: Vec<InstanceSummary>,
}

/// A member instance and its lifecycle state label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceSummary {
    pub instance_id: String,
    pub lifecycle_state: String,
}

impl InstanceSummary {
    pub fn new(instance_id: impl Into<String>, lifecycle_state: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            lifecycle_state: lifecycle_state.into(),
        }
    }
}

/// Body of a set-desired-capacity request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct SetDesiredCapacityRequest {
    pub auto_scaling_group_name: String,
    pub desired_capacity: u32,
    /// Always `false` when sent by [`crate::FleetGroupClient`].
    pub honor_cooldown: bool,
}

// ── Snapshot ──────────────────────────────────────────────────────

/// Normalized capacity view of a group, built fresh on every describe.
///
/// `min_size <= desired_count <= max_size` is expected of the service but
/// not enforced here.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupStateSnapshot {
    /// Instances whose lifecycle state starts with `"Pending"`.
    pub pending: u32,
    pub desired_count: u32,
    pub min_size: u32,
    pub max_size: u32,
}

impl GroupStateSnapshot {
    /// Normalize a service description into a snapshot.
    pub fn from_description(group: &GroupDescription) -> Self {
        Self {
            pending: pending_count(group.instances.iter().map(|i| i.lifecycle_state.as_str())),
            desired_count: group.desired_capacity,
            min_size: group.min_size,
            max_size: group.max_size,
        }
    }

    /// Whether the reported sizes satisfy `min <= desired <= max`.
    pub fn within_bounds(&self) -> bool {
        self.min_size <= self.desired_count && self.desired_count <= self.max_size
    }
}

/// Count lifecycle states carrying the `"Pending"` prefix.
pub fn pending_count<'a>(states: impl IntoIterator<Item = &'a str>) -> u32 {
    states
        .into_iter()
        .filter(|s| s.starts_with(PENDING_STATE_PREFIX))
        .count() as u32
}

// ── Activities ────────────────────────────────────────────────────

/// Outcome of a scaling activity.
///
/// Only `Successful` matters for reconciliation; the rest are kept so a
/// page decodes without loss of meaning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActivityStatus {
    PreInService,
    InProgress,
    MidLifecycleAction,
    WaitingForInstanceId,
    WaitingForInstanceWarmup,
    Successful,
    Failed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// Direction of a capacity change, derived from an activity's cause.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScalingDirection {
    Out,
    In,
    /// Not operator-driven, or neither marker present.
    Irrelevant,
}

/// One entry in a group's activity history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ScalingActivity {
    pub activity_id: String,
    pub status_code: ActivityStatus,
    pub cause: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl ScalingActivity {
    pub fn new(
        activity_id: impl Into<String>,
        status_code: ActivityStatus,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            activity_id: activity_id.into(),
            status_code,
            cause: cause.into(),
            description: None,
            status_message: None,
            start_time: None,
            end_time: None,
        }
    }

    pub fn is_successful(&self) -> bool {
        self.status_code == ActivityStatus::Successful
    }

    /// Whether the cause records an explicit operator capacity change.
    pub fn is_user_requested(&self) -> bool {
        self.cause.contains(USER_REQUEST_MARKER)
    }

    pub fn mentions_scale_out(&self) -> bool {
        self.cause.contains(SCALE_OUT_MARKER)
    }

    pub fn mentions_scale_in(&self) -> bool {
        self.cause.contains(SCALE_IN_MARKER)
    }

    /// Classify the activity from its cause text. Scale-out wins when both
    /// markers appear. Status is not considered.
    pub fn direction(&self) -> ScalingDirection {
        if !self.is_user_requested() {
            ScalingDirection::Irrelevant
        } else if self.mentions_scale_out() {
            ScalingDirection::Out
        } else if self.mentions_scale_in() {
            ScalingDirection::In
        } else {
            ScalingDirection::Irrelevant
        }
    }
}

/// One page of activity history, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ActivityPage {
    #[serde(default)]
    pub activities: Vec<ScalingActivity>,
    /// Absent when no older activities remain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

// ── Reconciliation ────────────────────────────────────────────────

/// How much history a reconciliation read.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanStats {
    pub pages_fetched: u32,
    pub activities_examined: u32,
}

/// Most recent operator-driven scale-out and scale-in. Either may be absent
/// if the whole history holds no such event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityReconciliation {
    pub last_scale_out: Option<ScalingActivity>,
    pub last_scale_in: Option<ScalingActivity>,
    pub scan: ScanStats,
}

impl ActivityReconciliation {
    /// Both slots filled.
    pub fn is_complete(&self) -> bool {
        self.last_scale_out.is_some() && self.last_scale_in.is_some()
    }
}
