pub mod capture_session;
pub mod context_manager;
pub mod controller;
pub mod elapsed_ticker;
pub mod level_monitor;
pub mod permission_prober;
