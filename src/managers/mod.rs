// Privacy Guard state managers
// Managers own the shared tables: sessions per site, monitoring state per tab.

pub mod session_manager;
pub mod tab_manager;
