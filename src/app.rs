//! Collector core for Privacy Guard.
//!
//! Central struct holding every manager and service. All browser events,
//! page detections and UI queries enter through here.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use reqwest::Url;
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::managers::session_manager::{SessionManager, SessionManagerTrait};
use crate::managers::tab_manager::{monitorable_host, TabManager, TabManagerTrait};
use crate::services::badge_presenter::{BadgePresenter, BadgeSurface, MemoryBadgeSurface};
use crate::services::context_bridge::{self, BridgeListener};
use crate::services::data_proxy::DataProxy;
use crate::services::detection_aggregator::{
    AlertPolicy, AlertSink, LogAlertSink, RecordOutcome, ThreatAlert,
};
use crate::services::event_reporter::EventReporter;
use crate::services::hook_installer::{HookInstaller, InstallReport, PageSurfaces};
use crate::services::tracker_list::TrackerList;
use crate::types::badge::BadgeState;
use crate::types::detection::RawDetection;
use crate::types::errors::{ProxyError, TabError};
use crate::types::privacy::{Envelope, SiteReport};
use crate::types::session::{Session, SiteIdentity};
use crate::types::settings::GuardSettings;
use crate::types::tab::{TabId, TabSnapshot};

/// What to do with an outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestVerdict {
    Allow,
    Block,
}

/// Answer to `GET_TAB_STATS`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabStats {
    pub count: u64,
    pub session_id: Option<String>,
}

/// The privileged collector.
pub struct Collector {
    settings: GuardSettings,
    sessions: SessionManager,
    tabs: Mutex<TabManager>,
    badges: BadgePresenter,
    alerts: Box<dyn AlertSink>,
    proxy: Arc<DataProxy>,
    reporter: EventReporter,
    trackers: TrackerList,
}

impl Collector {
    /// Creates a collector with an in-memory badge surface and log alerts.
    pub fn new(settings: GuardSettings) -> Result<Self, ProxyError> {
        Self::with_surfaces(
            settings,
            Box::new(MemoryBadgeSurface::new()),
            Box::new(LogAlertSink),
        )
    }

    pub fn with_surfaces(
        settings: GuardSettings,
        badge_surface: Box<dyn BadgeSurface>,
        alerts: Box<dyn AlertSink>,
    ) -> Result<Self, ProxyError> {
        let proxy = Arc::new(DataProxy::new(
            &settings.api_base_url,
            Duration::from_secs(settings.request_timeout_secs.max(1)),
        )?);
        let reporter = EventReporter::new(Arc::clone(&proxy));
        let trackers = TrackerList::new(&settings.extra_tracker_domains);
        let tabs = TabManager::new(AlertPolicy::new(settings.alert_step));

        info!(api = %settings.api_base_url, trackers = trackers.len(), "collector initialized");

        Ok(Self {
            settings,
            sessions: SessionManager::new(),
            tabs: Mutex::new(tabs),
            badges: BadgePresenter::new(badge_surface),
            alerts,
            proxy,
            reporter,
            trackers,
        })
    }

    fn tabs(&self) -> MutexGuard<'_, TabManager> {
        self.tabs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ─── Sessions ───

    pub fn ensure_session(&self, hostname: &str) -> Session {
        self.sessions.ensure_session(hostname)
    }

    pub fn lookup_session(&self, hostname: &str) -> Option<Session> {
        self.sessions.lookup_session(hostname)
    }

    pub fn get_session_id(&self, hostname: &str) -> Option<String> {
        self.proxy.get_session_id(&self.sessions, hostname)
    }

    /// Drop the site's session and zero every tab showing that site.
    pub fn clear_session(&self, hostname: &str) -> Option<Session> {
        let cleared = self.sessions.clear_session(hostname);
        let site = SiteIdentity::from_hostname(hostname);

        let reset: Vec<TabId> = {
            let mut tabs = self.tabs();
            let ids = tabs.tabs_for_site(&site);
            for id in &ids {
                if let Some(tab) = tabs.get_tab_mut(*id) {
                    tab.aggregator.reset();
                    tab.displayed_total = 0;
                }
            }
            ids
        };
        for id in &reset {
            self.badges.present(*id, 0);
        }

        info!(site = %site, tabs = reset.len(), "session data cleared");
        cleared
    }

    /// Request header carrying the session token, for sites that have one.
    pub fn session_header_for(&self, url: &str) -> Option<(String, String)> {
        let (_, host) = monitorable_host(url).ok()?;
        let session = self.sessions.lookup_session(&host)?;
        Some((self.settings.session_header.clone(), session.id))
    }

    // ─── Tab lifecycle ───

    /// A tab finished (or started) loading. Only `complete` loads start a
    /// fresh monitoring cycle; navigating away from http(s) stops monitoring.
    pub fn on_tab_updated(
        self: &Arc<Self>,
        tab_id: TabId,
        url: &str,
        status: &str,
    ) -> Result<Option<TabSnapshot>, TabError> {
        if status != "complete" {
            return Ok(None);
        }

        let host = match monitorable_host(url) {
            Ok((_, host)) => host,
            Err(e) => {
                if self.tabs().close_tab(tab_id).is_ok() {
                    self.badges.forget(tab_id);
                }
                return Err(e);
            }
        };

        self.sessions.ensure_session(&host);
        self.tabs().navigate(tab_id, url)?;
        self.badges.present(tab_id, 0);
        self.start_monitoring(tab_id)?;
        self.snapshot(tab_id).map(Some)
    }

    pub fn on_tab_activated(self: &Arc<Self>, tab_id: TabId, url: &str) -> Result<TabSnapshot, TabError> {
        let (_, host) = monitorable_host(url)?;
        let site = SiteIdentity::from_hostname(&host);

        let known = self
            .tabs()
            .get_tab(tab_id)
            .is_some_and(|tab| tab.site == site);
        if !known {
            self.sessions.ensure_session(&host);
            self.tabs().navigate(tab_id, url)?;
        }

        let displayed = self.tabs().get_tab(tab_id).map(|t| t.displayed_total).unwrap_or(0);
        self.badges.present(tab_id, displayed);
        self.start_monitoring(tab_id)?;
        self.snapshot(tab_id)
    }

    pub fn on_tab_removed(&self, tab_id: TabId) -> Result<TabSnapshot, TabError> {
        let snapshot = self.tabs().close_tab(tab_id)?;
        self.badges.forget(tab_id);
        Ok(snapshot)
    }

    pub fn snapshot(&self, tab_id: TabId) -> Result<TabSnapshot, TabError> {
        self.tabs()
            .get_tab(tab_id)
            .map(|t| t.snapshot())
            .ok_or(TabError::NotFound(tab_id))
    }

    pub fn tab_stats(&self, tab_id: Option<TabId>) -> TabStats {
        let tab = tab_id.and_then(|id| {
            self.tabs()
                .get_tab(id)
                .map(|t| (t.displayed_total, t.hostname.clone()))
        });
        match tab {
            Some((count, hostname)) => TabStats {
                count,
                session_id: self.sessions.lookup_session(&hostname).map(|s| s.id),
            },
            None => TabStats {
                count: 0,
                session_id: None,
            },
        }
    }

    pub fn badge(&self, tab_id: TabId) -> Option<BadgeState> {
        self.badges.current(tab_id)
    }

    // ─── Push path ───

    /// Attribute, count, present and report one page detection.
    ///
    /// Returns `None` when the detection was dropped: unknown tab or no live
    /// session for the tab's site.
    pub fn ingest(&self, tab_id: TabId, raw: RawDetection) -> Option<RecordOutcome> {
        let Some((site, url)) = self
            .tabs()
            .get_tab(tab_id)
            .map(|t| (t.site.clone(), t.url.clone()))
        else {
            debug!(tab_id, category = %raw.category, "detection for unmonitored tab dropped");
            return None;
        };

        let session = self.sessions.lookup_session(site.as_str());
        let event = context_bridge::attribute(raw, &site, session.as_ref())?;

        let outcome = {
            let mut tabs = self.tabs();
            let tab = tabs.get_tab_mut(tab_id)?;
            let outcome = tab.aggregator.record_event(event.category());
            tab.displayed_total = outcome.total;
            outcome
        };

        self.badges.present(tab_id, outcome.total);
        if outcome.alert {
            self.alerts.notify(&ThreatAlert {
                tab_id,
                site: site.clone(),
                total: outcome.total,
            });
        }
        self.reporter.report(&event, &url);
        Some(outcome)
    }

    /// `UPDATE_BADGE`: present a total without touching counters or alerts.
    pub fn update_badge(&self, tab_id: TabId, count: u64) -> BadgeState {
        if let Some(tab) = self.tabs().get_tab_mut(tab_id) {
            tab.displayed_total = count;
        }
        self.badges.present(tab_id, count)
    }

    /// Forward everything arriving on `listener` into [`Collector::ingest`]
    /// until the page side goes away. `None` outside a tokio runtime.
    pub fn attach_bridge(
        self: &Arc<Self>,
        tab_id: TabId,
        mut listener: BridgeListener,
    ) -> Option<JoinHandle<()>> {
        let handle = Handle::try_current().ok()?;
        let collector = Arc::downgrade(self);
        Some(handle.spawn(async move {
            while let Some(raw) = listener.recv().await {
                let Some(collector) = collector.upgrade() else {
                    break;
                };
                collector.ingest(tab_id, raw);
            }
            debug!(tab_id, "bridge closed");
        }))
    }

    /// Instrument a freshly loaded page and wire its bridge to this tab.
    pub fn instrument_page(
        self: &Arc<Self>,
        tab_id: TabId,
        page: PageSurfaces,
    ) -> (PageSurfaces, InstallReport) {
        let (emitter, listener) = context_bridge::channel();
        let installed = HookInstaller::new(emitter).install(page);
        if self.attach_bridge(tab_id, listener).is_none() {
            warn!(tab_id, "no runtime for bridge listener, page detections will be dropped");
        }
        installed
    }

    // ─── Pull path ───

    /// `GET_PRIVACY_DATA`.
    pub async fn get_privacy_data(&self, hostname: &str) -> Envelope<SiteReport> {
        self.proxy.get_privacy_data(hostname).await
    }

    /// Re-derive the badge from the remote aggregate. A failed pull leaves
    /// the badge as it is.
    pub async fn refresh_tab(&self, tab_id: TabId) -> Option<BadgeState> {
        let hostname = self.tabs().get_tab(tab_id).map(|t| t.hostname.clone())?;

        let report = match self.proxy.fetch_site_report(&hostname).await {
            Ok(report) => report,
            Err(e) => {
                debug!(tab_id, hostname = %hostname, error = %e, "badge refresh failed");
                return None;
            }
        };

        let total = report.threat_total();
        {
            let mut tabs = self.tabs();
            // The tab may have closed or moved on while the request was out.
            let tab = tabs.get_tab_mut(tab_id).filter(|t| t.hostname == hostname)?;
            tab.displayed_total = total;
        }
        Some(self.badges.present(tab_id, total))
    }

    /// Start (or restart) the poll timer for a tab. The first refresh runs
    /// immediately.
    pub fn start_monitoring(self: &Arc<Self>, tab_id: TabId) -> Result<(), TabError> {
        let Ok(handle) = Handle::try_current() else {
            warn!(tab_id, "no runtime, tab polling disabled");
            return Ok(());
        };

        let period = Duration::from_secs(self.settings.poll_interval_secs.max(1));
        let collector: Weak<Collector> = Arc::downgrade(self);
        let task = handle.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let Some(collector) = collector.upgrade() else {
                    break;
                };
                collector.refresh_tab(tab_id).await;
            }
        });

        self.tabs().set_poll(tab_id, task)?;
        debug!(tab_id, period_secs = period.as_secs(), "tab polling started");
        Ok(())
    }

    pub fn stop_monitoring(&self, tab_id: TabId) -> Result<(), TabError> {
        self.tabs().cancel_poll(tab_id)
    }

    // ─── Requests ───

    /// Tracker blocking for an outgoing request made by `tab_id`.
    pub fn on_before_request(self: &Arc<Self>, tab_id: Option<TabId>, url: &str) -> RequestVerdict {
        let Ok(parsed) = Url::parse(url) else {
            return RequestVerdict::Allow;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return RequestVerdict::Allow;
        }
        let host = parsed.host_str().unwrap_or_default();
        if !self.settings.block_trackers || !self.trackers.is_tracker(host) {
            return RequestVerdict::Allow;
        }

        info!(host, "blocked tracking request");
        if let (Some(tab_id), Ok(handle)) = (tab_id, Handle::try_current()) {
            let collector = Arc::clone(self);
            handle.spawn(async move {
                collector.refresh_tab(tab_id).await;
            });
        }
        RequestVerdict::Block
    }
}
