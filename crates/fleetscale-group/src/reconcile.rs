//! Activity reconciliation — find the latest operator scale-out and scale-in.
//!
//! # Algorithm
//!
//! ```text
//! last_out, last_in = none
//! for page in history (newest first, one page at a time):
//!     for activity in page:
//!         skip unless status == Successful
//!         skip unless cause contains USER_REQUEST_MARKER
//!         if last_out is none and cause contains SCALE_OUT_MARKER:
//!             last_out = activity
//!         else if last_in is none and cause contains SCALE_IN_MARKER:
//!             last_in = activity
//!         if both found: stop (no more activities, no more pages)
//! ```
//!
//! History is newest first across and within pages, so the first match of
//! each kind is the most recent one no matter where page boundaries fall.
//! A page fetch failure aborts the scan and nothing found so far is
//! returned.

use tracing::debug;

use crate::client::ActivityFeed;
use crate::error::FleetResult;
use crate::types::{ActivityReconciliation, ScalingActivity, ScanStats};

/// Cursor over an activity feed. Pages are fetched one at a time, on
/// demand, each request using the token from the previous response.
pub struct ActivityPager<'a, F: ActivityFeed + ?Sized> {
    feed: &'a F,
    cursor: Option<String>,
    exhausted: bool,
    pages_fetched: u32,
}

impl<'a, F: ActivityFeed + ?Sized> ActivityPager<'a, F> {
    pub fn new(feed: &'a F) -> Self {
        Self {
            feed,
            cursor: None,
            exhausted: false,
            pages_fetched: 0,
        }
    }

    /// Fetch the next page. `Ok(None)` once the previous page came back
    /// without a continuation token.
    pub async fn next_page(&mut self) -> FleetResult<Option<Vec<ScalingActivity>>> {
        if self.exhausted {
            return Ok(None);
        }

        let page = self.feed.activities_page(self.cursor.as_deref()).await?;
        self.pages_fetched += 1;
        self.cursor = page.next_token;
        self.exhausted = self.cursor.is_none();
        Ok(Some(page.activities))
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// Scans a group's activity history for the most recent successful,
/// operator-requested scale-out and scale-in.
pub struct ActivityReconciler<'a, F: ActivityFeed + ?Sized> {
    feed: &'a F,
}

impl<'a, F: ActivityFeed + ?Sized> ActivityReconciler<'a, F> {
    pub fn new(feed: &'a F) -> Self {
        Self { feed }
    }

    /// Run one scan. Either slot of the result may be empty if the whole
    /// history was read without a match.
    pub async fn reconcile(&self) -> FleetResult<ActivityReconciliation> {
        let mut pager = ActivityPager::new(self.feed);
        let mut result = ActivityReconciliation::default();
        let mut examined = 0u32;

        'scan: while let Some(activities) = pager.next_page().await? {
            for activity in activities {
                examined += 1;
                absorb(&mut result, activity);
                if result.is_complete() {
                    break 'scan;
                }
            }
        }

        result.scan = ScanStats {
            pages_fetched: pager.pages_fetched(),
            activities_examined: examined,
        };
        debug!(
            pages = result.scan.pages_fetched,
            examined,
            found_out = result.last_scale_out.is_some(),
            found_in = result.last_scale_in.is_some(),
            exhausted = pager.is_exhausted(),
            "activity reconciliation finished"
        );
        Ok(result)
    }
}

/// Fill at most one empty slot with `activity`. Scale-out is checked first.
fn absorb(result: &mut ActivityReconciliation, activity: ScalingActivity) {
    if !activity.is_successful() || !activity.is_user_requested() {
        return;
    }

    if result.last_scale_out.is_none() && activity.mentions_scale_out() {
        debug!(activity = %activity.activity_id, "last scale-out found");
        result.last_scale_out = Some(activity);
    } else if result.last_scale_in.is_none() && activity.mentions_scale_in() {
        debug!(activity = %activity.activity_id, "last scale-in found");
        result.last_scale_in = Some(activity);
    }
}
