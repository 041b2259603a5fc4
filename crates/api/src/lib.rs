//! Notification relay HTTP service.
//!
//! Endpoints:
//! - POST /notify: Store a notification and forward it to the agent
//! - POST /done/{id}: Acknowledge a notification
//! - GET  /: Status summary with pending count and the last 10 notifications
//! - GET  /pending: Pending notifications, oldest first
//! - GET  /history: Recent notifications, newest first

pub mod routes;
pub mod state;
pub mod telemetry;
