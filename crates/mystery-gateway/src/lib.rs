//! Realtime side of the server: per-session channel membership and the
//! WebSocket connection loop that feeds it.

pub mod connection;
pub mod dispatcher;
