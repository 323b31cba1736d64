use serde::Serialize;

use super::detection::AggregateCounts;
use super::session::SiteIdentity;

/// Browser tab identifier as handed to us by the host browser.
pub type TabId = i64;

/// Snapshot of a monitored tab, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabSnapshot {
    pub tab_id: TabId,
    pub site: SiteIdentity,
    pub hostname: String,
    pub counts: AggregateCounts,
    /// Last total shown on the badge, from either the local or the remote path.
    pub displayed_total: u64,
    pub monitoring: bool,
}
