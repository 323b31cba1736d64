//! Unit tests for the Badge/Status Presenter.

use std::sync::{Arc, Mutex};

use privacy_guard::services::badge_presenter::{
    derive_badge, BadgePresenter, BadgeSurface, MemoryBadgeSurface,
};
use privacy_guard::types::badge::{BadgeLevel, BadgeState};
use privacy_guard::types::tab::TabId;
use rstest::rstest;

/// Surface that counts every render and clear.
#[derive(Default)]
struct CountingSurface {
    renders: Mutex<Vec<(TabId, BadgeState)>>,
    clears: Mutex<Vec<TabId>>,
}

impl BadgeSurface for CountingSurface {
    fn render(&self, tab_id: TabId, state: &BadgeState) {
        self.renders.lock().unwrap().push((tab_id, state.clone()));
    }

    fn clear(&self, tab_id: TabId) {
        self.clears.lock().unwrap().push(tab_id);
    }
}

fn setup() -> (BadgePresenter, Arc<CountingSurface>) {
    let surface = Arc::new(CountingSurface::default());
    (BadgePresenter::new(Box::new(Arc::clone(&surface))), surface)
}

// ─── Derivation ───

#[rstest]
#[case(0, BadgeLevel::Clear, "", "#4caf50")]
#[case(1, BadgeLevel::Warning, "1", "#ff9800")]
#[case(5, BadgeLevel::Warning, "5", "#ff9800")]
#[case(10, BadgeLevel::Warning, "10", "#ff9800")]
#[case(11, BadgeLevel::Critical, "11", "#d32f2f")]
#[case(250, BadgeLevel::Critical, "250", "#d32f2f")]
fn test_derive_badge(
    #[case] total: u64,
    #[case] level: BadgeLevel,
    #[case] text: &str,
    #[case] color: &str,
) {
    let state = derive_badge(total);
    assert_eq!(state.level, level);
    assert_eq!(state.text, text);
    assert_eq!(state.color, color);
    assert_eq!(state.total, total);
}

#[test]
fn test_titles() {
    assert_eq!(derive_badge(0).title, "Privacy Guard - No threats detected");
    assert_eq!(derive_badge(7).title, "Privacy Guard - 7 threats detected");
}

#[test]
fn test_level_names() {
    assert_eq!(derive_badge(0).level.as_str(), "clear");
    assert_eq!(derive_badge(5).level.as_str(), "warning");
    assert_eq!(derive_badge(11).level.as_str(), "critical");
}

// ─── Presentation ───

#[test]
fn test_present_same_total_twice_is_idempotent() {
    let (presenter, surface) = setup();
    let first = presenter.present(1, 5);
    let second = presenter.present(1, 5);

    assert_eq!(first, second);
    assert_eq!(surface.renders.lock().unwrap().len(), 1);
    assert_eq!(presenter.current(1), Some(first));
}

#[test]
fn test_present_change_renders() {
    let (presenter, surface) = setup();
    presenter.present(1, 5);
    presenter.present(1, 6);
    presenter.present(2, 6);

    let renders = surface.renders.lock().unwrap();
    assert_eq!(renders.len(), 3);
    assert_eq!(renders[1].1.text, "6");
    assert_eq!(renders[2].0, 2);
}

#[test]
fn test_forget_clears_surface_once() {
    let (presenter, surface) = setup();
    presenter.present(4, 12);
    presenter.forget(4);
    presenter.forget(4);

    assert_eq!(*surface.clears.lock().unwrap(), vec![4]);
    assert!(presenter.current(4).is_none());
}

#[test]
fn test_memory_surface_keeps_last_state() {
    let surface = Arc::new(MemoryBadgeSurface::new());
    let presenter = BadgePresenter::new(Box::new(Arc::clone(&surface)));

    presenter.present(1, 3);
    presenter.present(1, 12);
    assert_eq!(surface.get(1).unwrap().level, BadgeLevel::Critical);

    presenter.forget(1);
    assert!(surface.get(1).is_none());
}
