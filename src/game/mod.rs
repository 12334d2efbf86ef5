//! Match coordination modules

pub mod r#match;
pub mod text;

pub use r#match::{CoordinatorHandle, MatchCoordinator, MatchStats, MAX_PLAYERS};

use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::ws::protocol::{ClientMsg, ServerMsg};

/// Event delivered to the match coordinator task
#[derive(Debug)]
pub enum ConnectionEvent {
    /// A WebSocket connection opened; `tx` is its outbound message channel
    Connect {
        conn_id: Uuid,
        tx: mpsc::UnboundedSender<ServerMsg>,
    },

    /// A connected client sent a message
    Message { conn_id: Uuid, msg: ClientMsg },

    /// A connection closed (transport notification, not a client event)
    Disconnect { conn_id: Uuid },

    /// Request coordinator statistics for the health endpoint
    GetStats { reply: oneshot::Sender<MatchStats> },
}

/// Coordinator channel errors
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("match coordinator is not running")]
    Closed,
}
