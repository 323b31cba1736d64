//! Badge/Status Presenter for Privacy Guard.
//!
//! Derives the visible indicator from a total and hands it to the host's badge
//! surface. Presenting never raises alerts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::types::badge::{BadgeLevel, BadgeState};
use crate::types::tab::TabId;

/// Derive the badge for a total. Pure.
pub fn derive_badge(total: u64) -> BadgeState {
    let level = match total {
        0 => BadgeLevel::Clear,
        1..=10 => BadgeLevel::Warning,
        _ => BadgeLevel::Critical,
    };
    let text = if total > 0 { total.to_string() } else { String::new() };
    let title = if total > 0 {
        format!("Privacy Guard - {} threats detected", total)
    } else {
        "Privacy Guard - No threats detected".to_string()
    };

    BadgeState {
        total,
        level,
        text,
        color: level.color().to_string(),
        title,
    }
}

/// Where badge state ends up (browser action, tray icon, test double).
pub trait BadgeSurface: Send + Sync {
    fn render(&self, tab_id: TabId, state: &BadgeState);
    fn clear(&self, tab_id: TabId);
}

impl<T: BadgeSurface + ?Sized> BadgeSurface for Arc<T> {
    fn render(&self, tab_id: TabId, state: &BadgeState) {
        (**self).render(tab_id, state)
    }

    fn clear(&self, tab_id: TabId) {
        (**self).clear(tab_id)
    }
}

/// Surface that only keeps the last rendered state per tab.
#[derive(Default)]
pub struct MemoryBadgeSurface {
    rendered: Mutex<HashMap<TabId, BadgeState>>,
}

impl MemoryBadgeSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tab_id: TabId) -> Option<BadgeState> {
        self.rendered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&tab_id)
            .cloned()
    }
}

impl BadgeSurface for MemoryBadgeSurface {
    fn render(&self, tab_id: TabId, state: &BadgeState) {
        self.rendered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tab_id, state.clone());
    }

    fn clear(&self, tab_id: TabId) {
        self.rendered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&tab_id);
    }
}

/// Presents derived badges, skipping renders that would not change anything.
pub struct BadgePresenter {
    surface: Box<dyn BadgeSurface>,
    shown: Mutex<HashMap<TabId, BadgeState>>,
}

impl BadgePresenter {
    pub fn new(surface: Box<dyn BadgeSurface>) -> Self {
        Self {
            surface,
            shown: Mutex::new(HashMap::new()),
        }
    }

    /// Present `total` for a tab. Returns the state now visible.
    pub fn present(&self, tab_id: TabId, total: u64) -> BadgeState {
        let state = derive_badge(total);
        let mut shown = self.shown.lock().unwrap_or_else(PoisonError::into_inner);
        if shown.get(&tab_id) != Some(&state) {
            self.surface.render(tab_id, &state);
            shown.insert(tab_id, state.clone());
        }
        state
    }

    pub fn current(&self, tab_id: TabId) -> Option<BadgeState> {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&tab_id)
            .cloned()
    }

    pub fn forget(&self, tab_id: TabId) {
        let removed = self
            .shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&tab_id);
        if removed.is_some() {
            self.surface.clear(tab_id);
        }
    }
}
