// Copyright (c) 2022-2023 The MobileCoin Foundation

use std::net::SocketAddr;

use futures::{SinkExt, StreamExt};
use portpicker::pick_unused_port;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

use incognito_ledger::{
    ring::{RingSession, SessionOutcome, WsChannel},
    DaemonConfig, DeviceConfig, DeviceHandle,
};

mod helpers;
use helpers::*;

/// Relay a generate-alpha round over a loopback websocket
#[tokio::test]
async fn websocket_session() {
    setup_logging();

    let port = pick_unused_port().unwrap();
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await.unwrap();

    // Peer: read initial payload, issue genalpha, read reply, deliver result
    let peer = tokio::spawn(async move {
        let (s, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(s).await.unwrap();

        let mut frames = vec![];

        let m = ws.next().await.unwrap().unwrap();
        frames.push(m);

        ws.send(Message::Text(peer_msg("genalpha", br#"{"AlphaLength":1}"#)))
            .await
            .unwrap();

        let m = ws.next().await.unwrap().unwrap();
        frames.push(m);

        ws.send(Message::Text(peer_msg("result", b"txid")))
            .await
            .unwrap();

        // Await close handshake
        while let Some(Ok(m)) = ws.next().await {
            if m.is_close() {
                break;
            }
        }

        frames
    });

    let (t, log) = MockTransport::new(|_| Ok(vec![0xa1; 32]));

    let cfg = DaemonConfig {
        addr: addr.to_string(),
    };
    let channel = WsChannel::connect(&cfg).await.unwrap();

    let s = RingSession::new(DeviceHandle::from(t), channel, &DeviceConfig::default());
    let r = s
        .run(br#"{"tx":1}"#.to_vec(), std::future::pending())
        .await
        .unwrap();

    assert_eq!(r, SessionOutcome::Completed(b"txid".to_vec()));
    assert_eq!(log.len(), 1);

    let frames = peer.await.unwrap();
    assert_eq!(frames[0], Message::Text(r#"{"tx":1}"#.to_string()));
    assert_eq!(frames[1], Message::Text("success".to_string()));
}

/// Non UTF-8 replies are sent as binary frames
#[tokio::test]
async fn websocket_binary_reply() {
    setup_logging();

    let port = pick_unused_port().unwrap();
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await.unwrap();

    let peer = tokio::spawn(async move {
        let (s, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(s).await.unwrap();

        let _initial = ws.next().await.unwrap().unwrap();

        ws.send(Message::Text(peer_msg(
            "signschnorr",
            br#"{"PedPrivate":"AQ==","Message":"Ag=="}"#,
        )))
        .await
        .unwrap();

        let reply = ws.next().await.unwrap().unwrap();

        ws.send(Message::Text(peer_msg("result", b""))).await.unwrap();

        reply
    });

    let (t, _log) = MockTransport::new(|_| Ok(vec![0xff, 0xfe]));

    let cfg = DaemonConfig {
        addr: addr.to_string(),
    };
    let channel = WsChannel::connect(&cfg).await.unwrap();
    let s = RingSession::new(DeviceHandle::from(t), channel, &DeviceConfig::default());
    s.run(b"{}".to_vec(), std::future::pending()).await.unwrap();

    assert_eq!(peer.await.unwrap(), Message::Binary(vec![0xff, 0xfe]));
}
