//! Tab table for Privacy Guard.
//!
//! One [`TabContext`] per monitored tab: its site, its counters, the total
//! currently on its badge, and its poll timer. Entries are created on
//! navigation and torn down on close.

use std::collections::HashMap;

use reqwest::Url;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::services::detection_aggregator::{AlertPolicy, DetectionAggregator};
use crate::types::errors::TabError;
use crate::types::session::SiteIdentity;
use crate::types::tab::{TabId, TabSnapshot};

/// Per-tab monitoring state.
pub struct TabContext {
    pub tab_id: TabId,
    pub url: String,
    pub hostname: String,
    pub site: SiteIdentity,
    pub aggregator: DetectionAggregator,
    pub displayed_total: u64,
    poll: Option<JoinHandle<()>>,
}

impl TabContext {
    fn new(tab_id: TabId, url: &Url, hostname: &str, policy: AlertPolicy) -> Self {
        Self {
            tab_id,
            url: url.to_string(),
            hostname: hostname.to_string(),
            site: SiteIdentity::from_hostname(hostname),
            aggregator: DetectionAggregator::new(policy),
            displayed_total: 0,
            poll: None,
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poll.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn cancel_poll(&mut self) {
        if let Some(handle) = self.poll.take() {
            handle.abort();
        }
    }

    pub fn snapshot(&self) -> TabSnapshot {
        TabSnapshot {
            tab_id: self.tab_id,
            site: self.site.clone(),
            hostname: self.hostname.clone(),
            counts: self.aggregator.counts(),
            displayed_total: self.displayed_total,
            monitoring: self.is_polling(),
        }
    }
}

// Polling never outlives its tab.
impl Drop for TabContext {
    fn drop(&mut self) {
        self.cancel_poll();
    }
}

/// Parse a tab URL and return it with its host, if it can be monitored.
pub fn monitorable_host(url: &str) -> Result<(Url, String), TabError> {
    let parsed = Url::parse(url).map_err(|_| TabError::NotMonitorable(url.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(TabError::NotMonitorable(url.to_string()));
    }
    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
        .ok_or_else(|| TabError::NotMonitorable(url.to_string()))?;
    Ok((parsed, host))
}

/// Trait defining the tab table operations.
pub trait TabManagerTrait {
    /// Start monitoring `tab_id` at `url`. A tab that was already monitored
    /// starts over with zeroed counters and no poll timer.
    fn navigate(&mut self, tab_id: TabId, url: &str) -> Result<&mut TabContext, TabError>;
    /// Stop monitoring and cancel the poll timer.
    fn close_tab(&mut self, tab_id: TabId) -> Result<TabSnapshot, TabError>;
    fn get_tab(&self, tab_id: TabId) -> Option<&TabContext>;
    fn get_tab_mut(&mut self, tab_id: TabId) -> Option<&mut TabContext>;
    fn tabs_for_site(&self, site: &SiteIdentity) -> Vec<TabId>;
    /// Install a new poll timer, cancelling any previous one.
    fn set_poll(&mut self, tab_id: TabId, handle: JoinHandle<()>) -> Result<(), TabError>;
    fn cancel_poll(&mut self, tab_id: TabId) -> Result<(), TabError>;
    fn tab_count(&self) -> usize;
}

pub struct TabManager {
    tabs: HashMap<TabId, TabContext>,
    policy: AlertPolicy,
}

impl TabManager {
    pub fn new(policy: AlertPolicy) -> Self {
        Self {
            tabs: HashMap::new(),
            policy,
        }
    }
}

impl Default for TabManager {
    fn default() -> Self {
        Self::new(AlertPolicy::default())
    }
}

impl TabManagerTrait for TabManager {
    fn navigate(&mut self, tab_id: TabId, url: &str) -> Result<&mut TabContext, TabError> {
        let (parsed, host) = monitorable_host(url)?;
        let context = TabContext::new(tab_id, &parsed, &host, self.policy);
        // Replacing the entry drops the old context, which aborts its timer.
        self.tabs.insert(tab_id, context);
        debug!(tab_id, host = %host, "tab monitored");
        self.tabs
            .get_mut(&tab_id)
            .ok_or(TabError::NotFound(tab_id))
    }

    fn close_tab(&mut self, tab_id: TabId) -> Result<TabSnapshot, TabError> {
        let mut context = self.tabs.remove(&tab_id).ok_or(TabError::NotFound(tab_id))?;
        context.cancel_poll();
        debug!(tab_id, "tab closed");
        Ok(context.snapshot())
    }

    fn get_tab(&self, tab_id: TabId) -> Option<&TabContext> {
        self.tabs.get(&tab_id)
    }

    fn get_tab_mut(&mut self, tab_id: TabId) -> Option<&mut TabContext> {
        self.tabs.get_mut(&tab_id)
    }

    fn tabs_for_site(&self, site: &SiteIdentity) -> Vec<TabId> {
        let mut ids: Vec<TabId> = self
            .tabs
            .values()
            .filter(|t| &t.site == site)
            .map(|t| t.tab_id)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn set_poll(&mut self, tab_id: TabId, handle: JoinHandle<()>) -> Result<(), TabError> {
        match self.tabs.get_mut(&tab_id) {
            Some(context) => {
                context.cancel_poll();
                context.poll = Some(handle);
                Ok(())
            }
            None => {
                handle.abort();
                Err(TabError::NotFound(tab_id))
            }
        }
    }

    fn cancel_poll(&mut self, tab_id: TabId) -> Result<(), TabError> {
        let context = self.tabs.get_mut(&tab_id).ok_or(TabError::NotFound(tab_id))?;
        context.cancel_poll();
        Ok(())
    }

    fn tab_count(&self) -> usize {
        self.tabs.len()
    }
}
