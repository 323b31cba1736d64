// Privacy Guard services
// Services provide the detection pipeline: hooks, bridge, counting, badges, the remote client and settings.

pub mod badge_presenter;
pub mod context_bridge;
pub mod data_proxy;
pub mod detection_aggregator;
pub mod event_reporter;
pub mod hook_installer;
pub mod pii_detector;
pub mod settings_engine;
pub mod tracker_list;
