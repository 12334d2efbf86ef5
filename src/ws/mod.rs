//! WebSocket transport modules

pub mod handler;
pub mod protocol;
