//! End-to-end match flow against a running coordinator task.
//!
//! Drives the coordinator over real channels the way the WebSocket
//! handler does: one outbound channel per connection, events processed
//! strictly in order by the coordinator task.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

use typing_race_server::game::CoordinatorHandle;
use typing_race_server::ws::protocol::{ClientMsg, ServerMsg};

/// Receive the next message for a connection, failing fast on silence.
async fn next_msg(rx: &mut mpsc::UnboundedReceiver<ServerMsg>) -> ServerMsg {
    timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for server message")
        .expect("outbound channel closed")
}

fn connect(coordinator: &CoordinatorHandle) -> (Uuid, mpsc::UnboundedReceiver<ServerMsg>) {
    let conn_id = Uuid::new_v4();
    let (tx, rx) = mpsc::unbounded_channel();
    coordinator.connect(conn_id, tx).unwrap();
    (conn_id, rx)
}

#[tokio::test]
async fn full_race_between_two_players() {
    let coordinator = CoordinatorHandle::spawn();

    // Alice joins and is acknowledged before the state broadcast.
    let (alice, mut alice_rx) = connect(&coordinator);
    coordinator
        .message(
            alice,
            ClientMsg::JoinGame {
                name: "Alice".to_string(),
            },
        )
        .unwrap();

    assert_eq!(next_msg(&mut alice_rx).await, ServerMsg::JoinedGame);
    match next_msg(&mut alice_rx).await {
        ServerMsg::GameState { players, .. } => {
            assert_eq!(players.len(), 1);
            assert_eq!(players[0].name, "Alice");
            assert_eq!(players[0].car_index, 0);
            assert_eq!(players[0].progress, 0.0);
        }
        other => panic!("expected GameState, got {:?}", other),
    }

    // Bob joins; both clients see the two-player roster.
    let (bob, mut bob_rx) = connect(&coordinator);
    coordinator
        .message(
            bob,
            ClientMsg::JoinGame {
                name: "Bob".to_string(),
            },
        )
        .unwrap();

    assert_eq!(next_msg(&mut bob_rx).await, ServerMsg::JoinedGame);
    match next_msg(&mut alice_rx).await {
        ServerMsg::GameState { players, .. } => {
            assert_eq!(players.len(), 2);
            assert_eq!(players[1].name, "Bob");
            assert_eq!(players[1].car_index, 1);
        }
        other => panic!("expected GameState, got {:?}", other),
    }
    match next_msg(&mut bob_rx).await {
        ServerMsg::GameState { players, .. } => assert_eq!(players.len(), 2),
        other => panic!("expected GameState, got {:?}", other),
    }

    // Alice starts the round.
    coordinator.message(alice, ClientMsg::StartGame).unwrap();
    for rx in [&mut alice_rx, &mut bob_rx] {
        match next_msg(rx).await {
            ServerMsg::GameStarted {
                target_text,
                is_started,
                winner,
                ..
            } => {
                assert!(!target_text.is_empty());
                assert!(is_started);
                assert!(winner.is_none());
            }
            other => panic!("expected GameStarted, got {:?}", other),
        }
    }

    let stats = coordinator.stats().await.unwrap();
    assert_eq!(stats.player_count, 2);
    assert!(stats.round_active);

    // Alice types the whole text and finishes first.
    coordinator
        .message(alice, ClientMsg::UpdateProgress { progress: 100.0 })
        .unwrap();
    assert_eq!(
        next_msg(&mut bob_rx).await,
        ServerMsg::PlayerProgress {
            player_id: alice,
            progress: 100.0
        }
    );
    assert_eq!(
        next_msg(&mut alice_rx).await,
        ServerMsg::PlayerProgress {
            player_id: alice,
            progress: 100.0
        }
    );

    coordinator.message(alice, ClientMsg::FinishRace).unwrap();
    assert_eq!(
        next_msg(&mut bob_rx).await,
        ServerMsg::PlayerFinished { player_id: alice }
    );
    match next_msg(&mut bob_rx).await {
        ServerMsg::GameWon { winner } => {
            assert_eq!(winner.id, alice);
            assert_eq!(winner.name, "Alice");
            assert!(winner.finished);
            assert_eq!(winner.progress, 100.0);
        }
        other => panic!("expected GameWon, got {:?}", other),
    }
    // Alice sees the same pair.
    assert_eq!(
        next_msg(&mut alice_rx).await,
        ServerMsg::PlayerFinished { player_id: alice }
    );
    assert!(matches!(
        next_msg(&mut alice_rx).await,
        ServerMsg::GameWon { .. }
    ));

    // Bob's finish after the winner is recorded is swallowed entirely;
    // the next thing either client hears is Alice's disconnect.
    coordinator.message(bob, ClientMsg::FinishRace).unwrap();
    coordinator.disconnect(alice).unwrap();

    match next_msg(&mut bob_rx).await {
        ServerMsg::GameState {
            players, winner, ..
        } => {
            assert_eq!(players.len(), 1);
            assert_eq!(players[0].name, "Bob");
            assert_eq!(players[0].car_index, 0);
            // The winner snapshot outlives the winner's connection.
            assert_eq!(winner.map(|w| w.id), Some(alice));
        }
        other => panic!("expected GameState, got {:?}", other),
    }

    let stats = coordinator.stats().await.unwrap();
    assert_eq!(stats.player_count, 1);
}

#[tokio::test]
async fn ready_up_flow_starts_round_once() {
    let coordinator = CoordinatorHandle::spawn();

    let (alice, mut alice_rx) = connect(&coordinator);
    let (bob, mut bob_rx) = connect(&coordinator);
    for (id, name) in [(alice, "Alice"), (bob, "Bob")] {
        coordinator
            .message(
                id,
                ClientMsg::JoinGame {
                    name: name.to_string(),
                },
            )
            .unwrap();
    }

    coordinator
        .message(alice, ClientMsg::PlayerReady { ready: true })
        .unwrap();
    coordinator
        .message(bob, ClientMsg::PlayerReady { ready: true })
        .unwrap();

    // Drain Bob's stream up to the round start and make sure exactly one
    // gameStarted arrives.
    let mut started = 0;
    loop {
        match next_msg(&mut bob_rx).await {
            ServerMsg::GameStarted { players, .. } => {
                started += 1;
                assert!(players.iter().all(|p| !p.ready));
                break;
            }
            ServerMsg::JoinedGame | ServerMsg::GameState { .. } => continue,
            other => panic!("unexpected message {:?}", other),
        }
    }
    assert_eq!(started, 1);

    // A reset right afterwards proves no second gameStarted was queued.
    coordinator.message(bob, ClientMsg::ResetGame).unwrap();
    loop {
        match next_msg(&mut bob_rx).await {
            ServerMsg::GameState {
                is_started, winner, ..
            } => {
                assert!(!is_started);
                assert!(winner.is_none());
                break;
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    // Alice's stream also carries exactly one gameStarted.
    let mut alice_started = 0;
    loop {
        match next_msg(&mut alice_rx).await {
            ServerMsg::GameStarted { .. } => alice_started += 1,
            ServerMsg::GameState { is_started, .. } if !is_started && alice_started > 0 => break,
            ServerMsg::JoinedGame | ServerMsg::GameState { .. } => continue,
            other => panic!("unexpected message {:?}", other),
        }
    }
    assert_eq!(alice_started, 1);
}
