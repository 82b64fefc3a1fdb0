//! End-to-end tests driving a live node over its real socket.

use crate::cluster::{CacheManager, CacheType, ClusterCacheExt, InMemoryCacheManager, WorldChannel};
use crate::config::WorldConfig;
use crate::database::StaticDatabase;
use crate::packets::{
    attack_flags, decode_frame, encode_frame, JoinPacket, MagicAttackPacket, PacketFrame,
    PacketKind, SfxHitPacket, SfxIdPacket,
};
use crate::server::WorldServer;
use orvane_event_system::messages::PlayerMessengerMessage;
use orvane_event_system::{CharacterId, PlayerId};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

async fn start_node() -> (WorldServer, Arc<InMemoryCacheManager>) {
    let cache_manager = Arc::new(InMemoryCacheManager::new());
    let config = WorldConfig {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        // Keep the sweep out of the way; TTL behavior has its own tests.
        projectile_sweep_interval: Duration::ZERO,
        ..WorldConfig::default()
    };
    let server = WorldServer::new(
        config,
        Arc::new(StaticDatabase::reachable()),
        cache_manager.clone(),
    );
    server.start().await.expect("startup failed");
    (server, cache_manager)
}

async fn connect(addr: SocketAddr) -> TcpStream {
    TcpStream::connect(addr).await.expect("connect failed")
}

async fn send<T: Serialize>(stream: &mut TcpStream, kind: PacketKind, body: &T) {
    let bytes = encode_frame(kind, body).expect("encode failed");
    stream.write_all(&bytes).await.expect("write failed");
}

async fn read_frame(stream: &mut TcpStream) -> PacketFrame {
    let mut length_buf = [0u8; 4];
    stream
        .read_exact(&mut length_buf)
        .await
        .expect("read length failed");
    let mut payload = vec![0u8; u32::from_le_bytes(length_buf) as usize];
    stream
        .read_exact(&mut payload)
        .await
        .expect("read payload failed");
    decode_frame(&payload).expect("decode failed")
}

async fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    for _ in 0..250 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for: {what}");
}

async fn join(server: &WorldServer, stream: &mut TcpStream, name: &str) -> PlayerId {
    send(
        stream,
        PacketKind::Join,
        &JoinPacket {
            user_id: 1,
            character_id: CharacterId(7),
            name: name.to_string(),
        },
    )
    .await;

    let sessions = server.sessions().clone();
    let owned_name = name.to_string();
    wait_until("join to authenticate", move || {
        sessions.get_by_name(&owned_name).is_some()
    })
    .await;

    server
        .sessions()
        .get_by_name(name)
        .and_then(|session| session.player_id())
        .expect("player id missing after join")
}

#[tokio::test(flavor = "multi_thread")]
async fn valid_magic_projectile_resolves_end_to_end() {
    let (server, _cache) = start_node().await;
    let mut stream = connect(server.local_addr().unwrap()).await;
    let player = join(&server, &mut stream, "Riven").await;

    send(
        &mut stream,
        PacketKind::MagicAttack,
        &MagicAttackPacket {
            object_id: 7,
            target_id: 1200,
            magic_power: 50,
        },
    )
    .await;
    let projectiles = server.projectiles().clone();
    wait_until("projectile to be tracked", move || {
        projectiles.contains(player, 7)
    })
    .await;

    send(
        &mut stream,
        PacketKind::SfxId,
        &SfxIdPacket {
            object_id: 7,
            target_id: 1200,
            flags: attack_flags::MAGIC,
        },
    )
    .await;
    // A matching echo keeps the projectile in flight.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(server.projectiles().contains(player, 7));

    send(
        &mut stream,
        PacketKind::SfxHit,
        &SfxHitPacket {
            object_id: 7,
            attacker_id: player.0,
            magic_power: 50,
            skill_id: 0,
            damage_power: 0,
        },
    )
    .await;
    let projectiles = server.projectiles().clone();
    wait_until("projectile to resolve", move || {
        !projectiles.contains(player, 7)
    })
    .await;

    server.stop().await.expect("stop failed");
}

#[tokio::test(flavor = "multi_thread")]
async fn forged_arrival_power_removes_the_projectile() {
    let (server, _cache) = start_node().await;
    let mut stream = connect(server.local_addr().unwrap()).await;
    let player = join(&server, &mut stream, "Riven").await;

    send(
        &mut stream,
        PacketKind::MagicAttack,
        &MagicAttackPacket {
            object_id: 7,
            target_id: 1200,
            magic_power: 50,
        },
    )
    .await;
    let projectiles = server.projectiles().clone();
    wait_until("projectile to be tracked", move || {
        projectiles.contains(player, 7)
    })
    .await;

    // Arrival claims a different power than the fire request recorded.
    send(
        &mut stream,
        PacketKind::SfxHit,
        &SfxHitPacket {
            object_id: 7,
            attacker_id: player.0,
            magic_power: 40,
            skill_id: 0,
            damage_power: 0,
        },
    )
    .await;
    let projectiles = server.projectiles().clone();
    wait_until("forged projectile to be dropped", move || {
        !projectiles.contains(player, 7)
    })
    .await;

    server.stop().await.expect("stop failed");
}

#[tokio::test(flavor = "multi_thread")]
async fn arrival_for_an_unknown_object_changes_nothing() {
    let (server, _cache) = start_node().await;
    let mut stream = connect(server.local_addr().unwrap()).await;
    let player = join(&server, &mut stream, "Riven").await;

    send(
        &mut stream,
        PacketKind::MagicAttack,
        &MagicAttackPacket {
            object_id: 7,
            target_id: 1200,
            magic_power: 50,
        },
    )
    .await;
    let projectiles = server.projectiles().clone();
    wait_until("projectile to be tracked", move || {
        projectiles.contains(player, 7)
    })
    .await;

    send(
        &mut stream,
        PacketKind::SfxHit,
        &SfxHitPacket {
            object_id: 99,
            attacker_id: player.0,
            magic_power: 50,
            skill_id: 0,
            damage_power: 0,
        },
    )
    .await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    // The stale arrival left the real projectile alone.
    assert!(server.projectiles().contains(player, 7));
    assert_eq!(server.projectiles().len(), 1);

    server.stop().await.expect("stop failed");
}

#[tokio::test(flavor = "multi_thread")]
async fn channel_record_lives_exactly_as_long_as_the_node() {
    let (server, cache_manager) = start_node().await;
    let cache = cache_manager.get_cache(CacheType::ClusterWorldChannels);

    let key = server.config().id.to_string();
    let record: WorldChannel = cache.get_record(&key).expect("record missing after start");
    assert_eq!(record.cluster_id, server.config().cluster_id);
    assert_eq!(record.host, server.config().host);
    assert_eq!(record.port, server.config().port);
    assert_eq!(record.id, server.config().id);
    assert_eq!(record.name, server.config().name);

    server.stop().await.expect("stop failed");
    assert!(cache.get_record::<WorldChannel>(&key).is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn client_disconnect_retires_the_session_and_its_projectiles() {
    let (server, _cache) = start_node().await;
    let mut stream = connect(server.local_addr().unwrap()).await;
    let player = join(&server, &mut stream, "Riven").await;

    send(
        &mut stream,
        PacketKind::MagicAttack,
        &MagicAttackPacket {
            object_id: 7,
            target_id: 1200,
            magic_power: 50,
        },
    )
    .await;
    let projectiles = server.projectiles().clone();
    wait_until("projectile to be tracked", move || {
        projectiles.contains(player, 7)
    })
    .await;

    drop(stream);
    let sessions = server.sessions().clone();
    wait_until("session to retire", move || sessions.count() == 0).await;
    assert!(server.projectiles().is_empty());

    server.stop().await.expect("stop failed");
}

#[tokio::test(flavor = "multi_thread")]
async fn messenger_chat_reaches_the_local_recipient() {
    let (server, _cache) = start_node().await;
    let mut stream = connect(server.local_addr().unwrap()).await;
    join(&server, &mut stream, "Riven").await;

    // A chat line published on the bus, as if from another node.
    let chat = PlayerMessengerMessage::new(CharacterId(9), CharacterId(7), "hello".to_string());
    server
        .bus()
        .publish(PlayerMessengerMessage::NAME, &chat)
        .await
        .expect("publish failed");

    let frame = tokio::time::timeout(Duration::from_secs(5), read_frame(&mut stream))
        .await
        .expect("chat was never delivered");
    assert_eq!(frame.kind, PacketKind::MessengerChat);
    let delivered: PlayerMessengerMessage = frame.decode_body().expect("body decode failed");
    assert_eq!(delivered.from_id, CharacterId(9));
    assert_eq!(delivered.message, "hello");

    server.stop().await.expect("stop failed");
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_packet_tags_are_dropped_without_killing_the_session() {
    let (server, _cache) = start_node().await;
    let mut stream = connect(server.local_addr().unwrap()).await;
    join(&server, &mut stream, "Riven").await;

    // A tag this node has no handler for.
    send(
        &mut stream,
        PacketKind::Unknown,
        &serde_json::json!({"anything": true}),
    )
    .await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.sessions().count(), 1);

    server.stop().await.expect("stop failed");
}
