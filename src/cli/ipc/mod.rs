//! IPC module for bridge sessions
//!
//! Newline-delimited JSON over a Unix Domain Socket.

pub mod protocol;
mod unix_socket;

pub use protocol::{OutboundMessage, ReplyStatus};
pub use unix_socket::{BridgeClient, BridgeSocketServer, SocketPath};
