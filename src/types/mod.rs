// Privacy Guard shared type definitions
// Each submodule defines types used across the collector, page hooks and protocol.

pub mod badge;
pub mod detection;
pub mod errors;
pub mod messages;
pub mod privacy;
pub mod session;
pub mod settings;
pub mod tab;
