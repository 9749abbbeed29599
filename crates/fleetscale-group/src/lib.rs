//! fleetscale-group — desired capacity control for an autoscaling group.
//!
//! Wraps an external fleet-management service behind the [`FleetApi`]
//! transport seam and exposes three things on top of it:
//!
//! - [`FleetGroupClient`]: describe a group, set its desired capacity,
//!   page through its scaling activity history
//! - [`DryRunGroupClient`]: a no-op stand-in for simulated runs
//! - [`ActivityReconciler`]: finds the most recent operator-driven
//!   scale-out and scale-in in one bounded scan of the history
//!
//! # Architecture
//!
//! ```text
//! FleetGroupClient (group name)
//!   └── Arc<dyn FleetApi>
//!       ├── InMemoryFleet  (simulated service for tests)
//!       └── HttpFleetApi   (JSON over HTTP/1.1)
//!
//! ActivityReconciler
//!   └── ActivityPager ── ActivityFeed::activities_page(token)
//! ```
//!
//! Capacity operations go through the [`GroupCapacity`] trait so callers can
//! swap the real client for the dry-run one. Activity history is only
//! available through [`ActivityFeed`], which the dry-run client does not
//! implement.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http_api;
pub mod memory;
pub mod reconcile;
pub mod types;

pub use api::FleetApi;
pub use client::{ActivityFeed, DryRunGroupClient, FleetGroupClient, GroupCapacity};
pub use config::FleetConfig;
pub use error::{FleetResult, UpstreamError};
pub use http_api::HttpFleetApi;
pub use memory::{CallKind, InMemoryFleet, RecordedCall};
pub use reconcile::{ActivityPager, ActivityReconciler};
pub use types::*;
