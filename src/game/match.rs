//! Match state and the coordinator that serializes all mutations to it

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ws::protocol::{ClientMsg, PlayerSnapshot, ServerMsg};

use super::text::pick_target_text;
use super::{ConnectionEvent, CoordinatorError};

/// Maximum number of players in the match
pub const MAX_PLAYERS: usize = 3;

/// A player in the match (authoritative)
#[derive(Debug, Clone)]
pub struct Player {
    /// Connection id, assigned by the transport at connect time
    pub id: Uuid,
    pub name: String,
    /// Typing progress percentage, clamped to [0, 100]
    pub progress: f64,
    pub finished: bool,
    /// Cosmetic slot equal to join order, re-packed on disconnect
    pub car_index: usize,
    pub ready: bool,
}

impl Player {
    fn new(id: Uuid, name: String, car_index: usize) -> Self {
        Self {
            id,
            name,
            progress: 0.0,
            finished: false,
            car_index,
            ready: false,
        }
    }

    fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            id: self.id,
            name: self.name.clone(),
            progress: self.progress,
            finished: self.finished,
            car_index: self.car_index,
            ready: self.ready,
        }
    }
}

/// The single shared match record
///
/// `is_started` and a non-empty `target_text` are set together on every
/// start and cleared together on every reset. The winner is a snapshot
/// taken at finish time; it deliberately survives the winner's own
/// disconnect until the next round or reset.
#[derive(Debug, Default)]
pub struct MatchState {
    /// Players in join order; `car_index` is always `0..players.len()`
    pub players: Vec<Player>,
    pub target_text: String,
    pub is_started: bool,
    pub winner: Option<PlayerSnapshot>,
}

/// Coordinator statistics for the health endpoint
#[derive(Debug, Clone)]
pub struct MatchStats {
    pub player_count: usize,
    pub round_active: bool,
}

/// Owns the match record and the outbound channel of every connected
/// client. All mutations run to completion inside `handle_event`, so a
/// round has exactly one winner and ready-up auto-starts exactly once
/// without any locking.
pub struct MatchCoordinator {
    state: MatchState,
    /// Outbound senders for every open connection, joined or not
    clients: HashMap<Uuid, mpsc::UnboundedSender<ServerMsg>>,
}

impl MatchCoordinator {
    pub fn new() -> Self {
        Self {
            state: MatchState::default(),
            clients: HashMap::new(),
        }
    }

    /// Run the coordinator loop, processing events strictly in order
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<ConnectionEvent>) {
        info!("Match coordinator started");

        while let Some(event) = rx.recv().await {
            self.handle_event(event);
        }

        info!("Match coordinator stopped");
    }

    /// Process a single event to completion
    pub fn handle_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Connect { conn_id, tx } => {
                self.clients.insert(conn_id, tx);
                info!(conn_id = %conn_id, "Client connected");
            }
            ConnectionEvent::Message { conn_id, msg } => self.handle_message(conn_id, msg),
            ConnectionEvent::Disconnect { conn_id } => self.handle_disconnect(conn_id),
            ConnectionEvent::GetStats { reply } => {
                let _ = reply.send(self.stats());
            }
        }
    }

    fn handle_message(&mut self, conn_id: Uuid, msg: ClientMsg) {
        match msg {
            ClientMsg::JoinGame { name } => self.handle_join(conn_id, name),
            ClientMsg::PlayerReady { ready } => self.handle_ready(conn_id, ready),
            ClientMsg::StartGame => self.handle_start(),
            ClientMsg::UpdateProgress { progress } => self.handle_progress(conn_id, progress),
            ClientMsg::FinishRace => self.handle_finish(conn_id),
            ClientMsg::ResetGame => self.handle_reset(),
        }
    }

    /// Handle a join request
    fn handle_join(&mut self, conn_id: Uuid, name: String) {
        if self.state.players.len() >= MAX_PLAYERS {
            self.send_to(
                conn_id,
                ServerMsg::Error {
                    message: "Game is full".to_string(),
                },
            );
            return;
        }

        if self.state.is_started {
            self.send_to(
                conn_id,
                ServerMsg::Error {
                    message: "Game already started".to_string(),
                },
            );
            return;
        }

        let car_index = self.state.players.len();
        self.state
            .players
            .push(Player::new(conn_id, name.clone(), car_index));

        self.send_to(conn_id, ServerMsg::JoinedGame);
        let snapshot = self.state_snapshot();
        self.broadcast(snapshot);

        info!(
            name = %name,
            player_count = self.state.players.len(),
            max_players = MAX_PLAYERS,
            "Player joined the game"
        );
    }

    /// Handle a ready flag change; auto-starts when 2+ players are all ready
    fn handle_ready(&mut self, conn_id: Uuid, ready: bool) {
        if self.state.is_started {
            return;
        }

        let Some(player) = self.state.players.iter_mut().find(|p| p.id == conn_id) else {
            debug!(conn_id = %conn_id, "Ready from non-participant, ignoring");
            return;
        };

        player.ready = ready;
        let name = player.name.clone();

        let snapshot = self.state_snapshot();
        self.broadcast(snapshot);
        info!(name = %name, ready, "Player ready state changed");

        if self.state.players.len() > 1 && self.state.players.iter().all(|p| p.ready) {
            self.start_round();
        }
    }

    /// Handle an explicit start request; double-starts are silently ignored
    fn handle_start(&mut self) {
        if self.state.is_started {
            return;
        }

        self.start_round();
    }

    /// Begin a new round: fresh target text, all per-round fields cleared
    fn start_round(&mut self) {
        self.state.target_text = pick_target_text().to_string();
        self.state.is_started = true;
        self.state.winner = None;

        for player in &mut self.state.players {
            player.progress = 0.0;
            player.finished = false;
            player.ready = false;
        }

        let snapshot = self.started_snapshot();
        self.broadcast(snapshot);

        info!(
            player_count = self.state.players.len(),
            "Game started"
        );
    }

    /// Handle a progress report; no-op unless a round is open
    fn handle_progress(&mut self, conn_id: Uuid, progress: f64) {
        if !self.state.is_started || self.state.winner.is_some() {
            return;
        }

        let Some(player) = self.state.players.iter_mut().find(|p| p.id == conn_id) else {
            return;
        };

        player.progress = progress.clamp(0.0, 100.0);
        let progress = player.progress;

        // Targeted delta, not a full snapshot: this fires per keystroke
        self.broadcast(ServerMsg::PlayerProgress {
            player_id: conn_id,
            progress,
        });
    }

    /// Handle a finish report; the first finisher of the round wins
    fn handle_finish(&mut self, conn_id: Uuid) {
        if !self.state.is_started || self.state.winner.is_some() {
            return;
        }

        let Some(player) = self.state.players.iter_mut().find(|p| p.id == conn_id) else {
            return;
        };

        if player.finished {
            return;
        }

        player.finished = true;
        player.progress = 100.0;
        let snapshot = player.snapshot();
        let name = player.name.clone();

        self.broadcast(ServerMsg::PlayerFinished { player_id: conn_id });

        // Events run to completion, so no second finish can slip in
        // between setting `finished` and recording the winner.
        if self.state.winner.is_none() {
            self.state.winner = Some(snapshot.clone());
            self.broadcast(ServerMsg::GameWon { winner: snapshot });
            info!(name = %name, "Player won the race");
        }
    }

    /// Handle a reset request: clear the round, keep the roster
    fn handle_reset(&mut self) {
        for player in &mut self.state.players {
            player.progress = 0.0;
            player.finished = false;
            player.ready = false;
        }

        self.state.target_text.clear();
        self.state.is_started = false;
        self.state.winner = None;

        let snapshot = self.state_snapshot();
        self.broadcast(snapshot);
        info!("Game reset");
    }

    /// Handle a connection closing
    fn handle_disconnect(&mut self, conn_id: Uuid) {
        self.clients.remove(&conn_id);

        let Some(index) = self.state.players.iter().position(|p| p.id == conn_id) else {
            // Connection never joined as a player
            debug!(conn_id = %conn_id, "Client disconnected");
            return;
        };

        let player = self.state.players.remove(index);
        info!(name = %player.name, "Player disconnected");

        // Re-pack cosmetic slots so they stay contiguous from 0
        for (i, p) in self.state.players.iter_mut().enumerate() {
            p.car_index = i;
        }

        if self.state.players.is_empty() {
            // Last player gone: drop any mid-flight round state too
            self.state = MatchState::default();
        }

        let snapshot = self.state_snapshot();
        self.broadcast(snapshot);
    }

    pub fn stats(&self) -> MatchStats {
        MatchStats {
            player_count: self.state.players.len(),
            round_active: self.state.is_started,
        }
    }

    fn player_snapshots(&self) -> Vec<PlayerSnapshot> {
        self.state.players.iter().map(Player::snapshot).collect()
    }

    fn state_snapshot(&self) -> ServerMsg {
        ServerMsg::GameState {
            players: self.player_snapshots(),
            target_text: self.state.target_text.clone(),
            is_started: self.state.is_started,
            winner: self.state.winner.clone(),
        }
    }

    fn started_snapshot(&self) -> ServerMsg {
        ServerMsg::GameStarted {
            players: self.player_snapshots(),
            target_text: self.state.target_text.clone(),
            is_started: self.state.is_started,
            winner: self.state.winner.clone(),
        }
    }

    /// Send to one connection, all others unaffected
    fn send_to(&mut self, conn_id: Uuid, msg: ServerMsg) {
        if let Some(tx) = self.clients.get(&conn_id) {
            if tx.send(msg).is_err() {
                warn!(conn_id = %conn_id, "Dropping dead client channel");
                self.clients.remove(&conn_id);
            }
        }
    }

    /// Send to every connected client, pruning dead channels
    fn broadcast(&mut self, msg: ServerMsg) {
        self.clients.retain(|_, tx| tx.send(msg.clone()).is_ok());
    }
}

impl Default for MatchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to the running coordinator task
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::UnboundedSender<ConnectionEvent>,
}

impl CoordinatorHandle {
    /// Spawn a fresh coordinator task and return its handle
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(MatchCoordinator::new().run(rx));
        Self { tx }
    }

    /// Register a new connection's outbound channel
    pub fn connect(
        &self,
        conn_id: Uuid,
        tx: mpsc::UnboundedSender<ServerMsg>,
    ) -> Result<(), CoordinatorError> {
        self.tx
            .send(ConnectionEvent::Connect { conn_id, tx })
            .map_err(|_| CoordinatorError::Closed)
    }

    /// Forward a client message
    pub fn message(&self, conn_id: Uuid, msg: ClientMsg) -> Result<(), CoordinatorError> {
        self.tx
            .send(ConnectionEvent::Message { conn_id, msg })
            .map_err(|_| CoordinatorError::Closed)
    }

    /// Notify the coordinator that a connection closed
    pub fn disconnect(&self, conn_id: Uuid) -> Result<(), CoordinatorError> {
        self.tx
            .send(ConnectionEvent::Disconnect { conn_id })
            .map_err(|_| CoordinatorError::Closed)
    }

    /// Fetch coordinator statistics
    pub async fn stats(&self) -> Result<MatchStats, CoordinatorError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(ConnectionEvent::GetStats { reply })
            .map_err(|_| CoordinatorError::Closed)?;
        rx.await.map_err(|_| CoordinatorError::Closed)
    }
}
