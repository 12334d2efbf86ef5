//! WebSocket protocol message definitions
//! These are the wire types for client-server communication
//!
//! Tag values and field names are camelCase to stay wire-compatible with
//! the browser clients (`joinGame`, `playerProgress`, `targetText`, ...).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Request to join the match as a named player
    JoinGame {
        /// Display name, supplied by the client
        name: String,
    },

    /// Toggle the sender's ready flag (alternate ready-up start flow)
    PlayerReady { ready: bool },

    /// Start a round immediately
    StartGame,

    /// Report typing progress as a percentage of the target text
    UpdateProgress {
        /// Percentage in [0, 100]; the server clamps out-of-range values
        progress: f64,
    },

    /// Report the target text fully typed
    FinishRace,

    /// Reset the round, keeping the player roster
    ResetGame,
}

/// Messages sent from server to client(s)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Acknowledgment of a successful join (sender only)
    JoinedGame,

    /// Request rejected (sender only)
    Error { message: String },

    /// Full match snapshot (all clients)
    #[serde(rename_all = "camelCase")]
    GameState {
        players: Vec<PlayerSnapshot>,
        target_text: String,
        is_started: bool,
        winner: Option<PlayerSnapshot>,
    },

    /// A round just started; same shape as `GameState` but distinguished
    /// so clients can reset per-round UI (all clients)
    #[serde(rename_all = "camelCase")]
    GameStarted {
        players: Vec<PlayerSnapshot>,
        target_text: String,
        is_started: bool,
        winner: Option<PlayerSnapshot>,
    },

    /// Targeted progress delta; fires per keystroke, so no full snapshot
    #[serde(rename_all = "camelCase")]
    PlayerProgress { player_id: Uuid, progress: f64 },

    /// A player crossed the finish line (all clients)
    #[serde(rename_all = "camelCase")]
    PlayerFinished { player_id: Uuid },

    /// First finisher of the round (all clients)
    GameWon { winner: PlayerSnapshot },
}

/// A player as serialized to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    /// Connection id assigned by the server at connect time
    pub id: Uuid,
    pub name: String,
    /// Typing progress percentage in [0, 100]
    pub progress: f64,
    pub finished: bool,
    /// Cosmetic 0-based slot in join order, re-packed on disconnect
    pub car_index: usize,
    /// Broadcast for observational parity even though clients do not
    /// currently render it
    pub ready: bool,
}
