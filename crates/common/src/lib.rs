pub mod config;
pub mod db;
pub mod error;
pub mod types;

/// Tracing target for the plain-text activity log (startup, new notifications,
/// forward outcomes, acknowledgements, shutdown).
pub const ACTIVITY_TARGET: &str = "relay::activity";
