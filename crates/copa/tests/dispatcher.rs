//! Tests that drive the per-connection state machine directly, without
//! any live transport: a dispatcher is just a registry, a codec, and a
//! seat channel.

use std::sync::Arc;

use copa::prelude::*;
use serde_json::json;
use tokio::sync::mpsc;

// =========================================================================
// Stub rules
// =========================================================================

struct FlipRules;

impl Rules for FlipRules {
    fn initial_payload() -> OpaquePayload {
        let mut payload = OpaquePayload::new();
        payload.insert("board".into(), json!([null, null, null]));
        payload
    }

    fn apply_move(
        state: &GameState,
        seat: SeatId,
        _payload: &OpaquePayload,
    ) -> GameState {
        let mut next = state.clone();
        next.current_turn = seat.other();
        next
    }
}

// =========================================================================
// Helpers
// =========================================================================

struct TestConn {
    dispatcher: Dispatcher<FlipRules, JsonCodec>,
    rx: mpsc::UnboundedReceiver<ServerMessage>,
}

fn connect(registry: &Arc<RoomRegistry<FlipRules>>) -> TestConn {
    let (tx, rx) = mpsc::unbounded_channel();
    TestConn {
        dispatcher: Dispatcher::new(Arc::clone(registry), JsonCodec, tx),
        rx,
    }
}

fn registry() -> Arc<RoomRegistry<FlipRules>> {
    Arc::new(RoomRegistry::new(RegistryConfig::default()))
}

fn drain(conn: &mut TestConn) -> Vec<ServerMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = conn.rx.try_recv() {
        out.push(msg);
    }
    out
}

/// Round-trips the room's command channel so fire-and-forget moves have
/// been processed before we assert on broadcasts.
async fn settle(registry: &Arc<RoomRegistry<FlipRules>>, code: &RoomCode) {
    if let Some(handle) = registry.handle(code).await {
        let _ = handle.info().await;
    }
}

// =========================================================================
// Unidentified phase
// =========================================================================

#[tokio::test]
async fn test_create_room_seats_the_connection() {
    let registry = registry();
    let mut conn = connect(&registry);

    conn.dispatcher.dispatch(r#"{"type":"create_room"}"#).await;

    let msgs = drain(&mut conn);
    assert_eq!(msgs.len(), 1);
    let ServerMessage::RoomCreated { room_id, player_id } = &msgs[0] else {
        panic!("expected RoomCreated, got {:?}", msgs[0]);
    };
    assert_eq!(*player_id, SeatId::One);
    assert_eq!(room_id.as_str().len(), 6);

    assert_eq!(conn.dispatcher.phase().seat(), Some(SeatId::One));
    assert_eq!(registry.room_count().await, 1);
}

#[tokio::test]
async fn test_malformed_frame_yields_error_and_no_state_change() {
    let registry = registry();
    let mut conn = connect(&registry);

    conn.dispatcher.dispatch("{ not json").await;
    conn.dispatcher.dispatch(r#"{"type":"fly_to_moon"}"#).await;
    conn.dispatcher.dispatch(r#"{"type":"join_room"}"#).await;

    let msgs = drain(&mut conn);
    assert_eq!(msgs.len(), 3);
    for msg in msgs {
        assert!(matches!(msg, ServerMessage::Error { .. }));
    }
    assert!(conn.dispatcher.phase().seat().is_none());
    assert_eq!(registry.room_count().await, 0);
}

#[tokio::test]
async fn test_join_unknown_code_keeps_connection_unidentified() {
    let registry = registry();
    let mut conn = connect(&registry);

    conn.dispatcher
        .dispatch(r#"{"type":"join_room","roomId":"nosuch"}"#)
        .await;

    let msgs = drain(&mut conn);
    assert_eq!(
        msgs,
        vec![ServerMessage::Error {
            message: "Room not found".into()
        }]
    );

    // The failed join didn't consume the connection; it can still create.
    conn.dispatcher.dispatch(r#"{"type":"create_room"}"#).await;
    let msgs = drain(&mut conn);
    assert!(matches!(msgs[0], ServerMessage::RoomCreated { .. }));
}

#[tokio::test]
async fn test_move_before_seating_yields_error() {
    let registry = registry();
    let mut conn = connect(&registry);

    conn.dispatcher
        .dispatch(r#"{"type":"make_move","pit":0}"#)
        .await;

    let msgs = drain(&mut conn);
    assert_eq!(
        msgs,
        vec![ServerMessage::Error {
            message: "Not in a room".into()
        }]
    );
}

#[tokio::test]
async fn test_capacity_exceeded_surfaces_to_the_creator() {
    let registry: Arc<RoomRegistry<FlipRules>> =
        Arc::new(RoomRegistry::new(RegistryConfig {
            max_rooms: 0,
            ..RegistryConfig::default()
        }));
    let mut conn = connect(&registry);

    conn.dispatcher.dispatch(r#"{"type":"create_room"}"#).await;

    let msgs = drain(&mut conn);
    assert_eq!(
        msgs,
        vec![ServerMessage::Error {
            message: "Server is at capacity".into()
        }]
    );
    assert!(conn.dispatcher.phase().seat().is_none());
}

// =========================================================================
// Seated phase
// =========================================================================

#[tokio::test]
async fn test_seated_connection_cannot_create_or_join_again() {
    let registry = registry();
    let mut host = connect(&registry);
    host.dispatcher.dispatch(r#"{"type":"create_room"}"#).await;
    let code = host.dispatcher.phase().room_code().unwrap().clone();
    drain(&mut host);

    host.dispatcher.dispatch(r#"{"type":"create_room"}"#).await;
    host.dispatcher
        .dispatch(&format!(
            r#"{{"type":"join_room","roomId":"{code}"}}"#
        ))
        .await;

    let msgs = drain(&mut host);
    assert_eq!(msgs.len(), 2);
    for msg in msgs {
        assert_eq!(
            msg,
            ServerMessage::Error {
                message: "Already in a room".into()
            }
        );
    }
    assert_eq!(registry.room_count().await, 1);
}

#[tokio::test]
async fn test_full_two_player_exchange() {
    let registry = registry();

    // A creates.
    let mut a = connect(&registry);
    a.dispatcher.dispatch(r#"{"type":"create_room"}"#).await;
    let code = a.dispatcher.phase().room_code().unwrap().clone();
    drain(&mut a);

    // B joins; A is notified, B gets the snapshot.
    let mut b = connect(&registry);
    b.dispatcher
        .dispatch(&format!(r#"{{"type":"join_room","roomId":"{code}"}}"#))
        .await;

    let b_msgs = drain(&mut b);
    let ServerMessage::RoomJoined { player_id, game_state: b_state } =
        &b_msgs[0]
    else {
        panic!("expected RoomJoined, got {:?}", b_msgs[0]);
    };
    assert_eq!(*player_id, SeatId::Two);
    assert_eq!(b_state.current_turn, SeatId::One);

    let a_msgs = drain(&mut a);
    let ServerMessage::PlayerJoined { game_state: a_state } = &a_msgs[0]
    else {
        panic!("expected PlayerJoined, got {:?}", a_msgs[0]);
    };
    assert_eq!(a_state, b_state);

    // B moves out of turn: silence.
    b.dispatcher
        .dispatch(r#"{"type":"make_move","pit":2}"#)
        .await;
    settle(&registry, &code).await;
    assert!(drain(&mut a).is_empty());
    assert!(drain(&mut b).is_empty());

    // A moves: both sides get the identical update, turn advanced.
    a.dispatcher
        .dispatch(r#"{"type":"make_move","pit":2}"#)
        .await;
    settle(&registry, &code).await;

    let a_update = drain(&mut a);
    let b_update = drain(&mut b);
    assert_eq!(a_update.len(), 1);
    assert_eq!(a_update, b_update);
    let ServerMessage::GameUpdate { game_state } = &a_update[0] else {
        panic!("expected GameUpdate");
    };
    assert_eq!(game_state.current_turn, SeatId::Two);
}

// =========================================================================
// Disconnect
// =========================================================================

#[tokio::test]
async fn test_disconnect_notifies_peer_and_last_leave_reaps_room() {
    let registry = registry();

    let mut a = connect(&registry);
    a.dispatcher.dispatch(r#"{"type":"create_room"}"#).await;
    let code = a.dispatcher.phase().room_code().unwrap().clone();
    drain(&mut a);

    let mut b = connect(&registry);
    b.dispatcher
        .dispatch(&format!(r#"{{"type":"join_room","roomId":"{code}"}}"#))
        .await;
    drain(&mut a);
    drain(&mut b);

    // B drops.
    b.dispatcher.close().await;
    assert!(b.dispatcher.phase().is_closed());
    assert_eq!(drain(&mut a), vec![ServerMessage::PlayerDisconnected]);
    assert_eq!(registry.room_count().await, 1);

    // Frames after close are ignored.
    b.dispatcher.dispatch(r#"{"type":"create_room"}"#).await;
    assert!(drain(&mut b).is_empty());

    // A drops too; the room is gone.
    a.dispatcher.close().await;
    assert_eq!(registry.room_count().await, 0);
}
