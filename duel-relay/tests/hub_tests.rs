
use duel_relay::error::RelayError;
use duel_types::{BroadcastEvent, GuessUpdatePayload, Player, ServerFrame};
use test_helpers::*;

#[tokio::test]
async fn test_capacity_is_enforced_under_concurrent_joins() {
    let setup = TestRelaySetup::new();

    let mut connections = Vec::new();
    for _ in 0..5 {
        connections.push(setup.create_connection().await);
    }

    let joins = connections.iter().enumerate().map(|(i, (id, _))| {
        let hub = setup.hub.clone();
        let id = *id;
        async move {
            hub.join(
                id,
                ROOM_ID.to_string(),
                presence(&format!("player-{}", i), &format!("P{}", i), i as i64),
            )
            .await
        }
    });
    let results = futures::future::join_all(joins).await;

    let joined = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(RelayError::RoomFull { .. })))
        .count();
    assert_eq!(joined, 2);
    assert_eq!(refused, 3);
    assert_eq!(setup.hub.summary(ROOM_ID).unwrap().player_count, 2);
}

#[tokio::test]
async fn test_rejoin_with_same_player_takes_over_seat() {
    let setup = TestRelaySetup::new();
    let (first, mut first_rx) = setup.create_connection().await;
    let (other, _other_rx) = setup.create_connection().await;
    let (second, mut second_rx) = setup.create_connection().await;

    setup
        .hub
        .join(first, ROOM_ID.to_string(), presence("player-a", "Alice", 1))
        .await
        .unwrap();
    setup
        .hub
        .join(other, ROOM_ID.to_string(), presence("player-b", "Bob", 2))
        .await
        .unwrap();
    drain(&mut first_rx);

    // Room is full, but this is Alice again
    setup
        .hub
        .join(second, ROOM_ID.to_string(), presence("player-a", "Alice", 1))
        .await
        .unwrap();

    assert_eq!(setup.hub.room_of(first), None);
    assert_eq!(setup.hub.room_of(second).as_deref(), Some(ROOM_ID));
    assert_eq!(setup.hub.summary(ROOM_ID).unwrap().player_count, 2);
    assert!(matches!(
        drain(&mut second_rx).first(),
        Some(ServerFrame::Subscribed { .. })
    ));
    assert_eq!(
        setup.hub.broadcast(first, BroadcastEvent::RoundStart(Default::default())).await,
        Err(RelayError::NotInRoom)
    );
}

#[tokio::test]
async fn test_broadcast_carries_sender_identity() {
    let setup = TestRelaySetup::new();
    let (a, mut a_rx) = setup.create_connection().await;
    let (b, mut b_rx) = setup.create_connection().await;

    setup
        .hub
        .join(a, ROOM_ID.to_string(), presence("player-a", "Alice", 1))
        .await
        .unwrap();
    setup
        .hub
        .join(b, ROOM_ID.to_string(), presence("player-b", "Bob", 2))
        .await
        .unwrap();
    drain(&mut a_rx);
    drain(&mut b_rx);

    let update = GuessUpdatePayload::from_player(&Player::new("player-b", "Bob"));
    let delivered = setup
        .hub
        .broadcast(b, BroadcastEvent::GuessUpdate(update.clone()))
        .await
        .unwrap();
    assert_eq!(delivered, 1);

    let frames = drain(&mut a_rx);
    assert_eq!(
        frames,
        vec![ServerFrame::Broadcast {
            from: "player-b".to_string(),
            event: BroadcastEvent::GuessUpdate(update),
        }]
    );
    assert!(drain(&mut b_rx).is_empty());
}

#[tokio::test]
async fn test_leaving_last_member_removes_room() {
    let setup = TestRelaySetup::new();
    let (a, mut a_rx) = setup.create_connection().await;
    let (b, _b_rx) = setup.create_connection().await;

    setup
        .hub
        .join(a, ROOM_ID.to_string(), presence("player-a", "Alice", 1))
        .await
        .unwrap();
    setup
        .hub
        .join(b, ROOM_ID.to_string(), presence("player-b", "Bob", 2))
        .await
        .unwrap();
    drain(&mut a_rx);

    setup.hub.leave(b).await;
    let frames = drain(&mut a_rx);
    assert_eq!(inbound_count(&frames), 1);
    assert_eq!(setup.hub.summary(ROOM_ID).unwrap().players, vec!["Alice"]);

    setup.hub.leave(a).await;
    assert_eq!(setup.hub.room_count(), 0);
    assert!(setup.hub.summary(ROOM_ID).is_none());
}

#[tokio::test]
async fn test_cleanup_drops_idle_members() {
    let setup = TestRelaySetup::new();
    let (a, _a_rx) = setup.create_connection().await;
    setup
        .hub
        .join(a, ROOM_ID.to_string(), presence("player-a", "Alice", 1))
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    let removed = setup
        .connection_manager
        .cleanup_inactive_connections(std::time::Duration::from_millis(10))
        .await;
    for id in removed {
        setup.hub.leave(id).await;
    }

    assert_eq!(setup.hub.room_count(), 0);
}
