//! Session Registry for Privacy Guard.
//!
//! Maps a canonical site identity to the opaque session token that correlates
//! detections across tabs and execution contexts. Tokens live for the life of
//! the process; nothing is persisted.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::session::{Session, SiteIdentity};

/// Trait defining session registry operations.
pub trait SessionManagerTrait {
    /// Return the live session for the host's site, creating it if needed.
    fn ensure_session(&self, raw_hostname: &str) -> Session;
    /// Non-creating read.
    fn lookup_session(&self, raw_hostname: &str) -> Option<Session>;
    /// Remove the site's session. Returns the removed session, if any.
    fn clear_session(&self, raw_hostname: &str) -> Option<Session>;
    fn session_count(&self) -> usize;
}

/// In-memory session registry.
///
/// Check-and-create happens under one lock, so concurrent callers for the same
/// site all observe the first caller's token.
pub struct SessionManager {
    sessions: Mutex<HashMap<SiteIdentity, Session>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn table(&self) -> MutexGuard<'_, HashMap<SiteIdentity, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn generate_token() -> String {
        Uuid::new_v4().simple().to_string()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManagerTrait for SessionManager {
    fn ensure_session(&self, raw_hostname: &str) -> Session {
        let site = SiteIdentity::from_hostname(raw_hostname);
        let mut table = self.table();
        table
            .entry(site.clone())
            .or_insert_with(|| {
                let session = Session {
                    id: Self::generate_token(),
                    site,
                    created_at: Utc::now().timestamp(),
                };
                info!(site = %session.site, session = %session.id, "new session");
                session
            })
            .clone()
    }

    fn lookup_session(&self, raw_hostname: &str) -> Option<Session> {
        let site = SiteIdentity::from_hostname(raw_hostname);
        self.table().get(&site).cloned()
    }

    fn clear_session(&self, raw_hostname: &str) -> Option<Session> {
        let site = SiteIdentity::from_hostname(raw_hostname);
        let removed = self.table().remove(&site);
        match &removed {
            Some(session) => info!(site = %site, session = %session.id, "session cleared"),
            None => debug!(site = %site, "clear requested for site without session"),
        }
        removed
    }

    fn session_count(&self) -> usize {
        self.table().len()
    }
}
