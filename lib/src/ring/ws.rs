// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Websocket [PeerChannel] implementation

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use log::{debug, trace};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::{
    tungstenite::{
        protocol::{frame::coding::CloseCode, CloseFrame},
        Message,
    },
    MaybeTlsStream, WebSocketStream,
};

use super::PeerChannel;
use crate::{config::DaemonConfig, Error};

/// Websocket peer channel
pub struct WsChannel<S> {
    ws: WebSocketStream<S>,
}

impl WsChannel<MaybeTlsStream<tokio::net::TcpStream>> {
    /// Connect to the transaction creation endpoint of the configured daemon
    pub async fn connect(cfg: &DaemonConfig) -> Result<Self, Error> {
        let url = cfg.createtx_url();

        debug!("Connecting to peer: {}", url);

        let (ws, _resp) = tokio_tungstenite::connect_async(url.as_str()).await?;

        Ok(Self { ws })
    }
}

impl<S> From<WebSocketStream<S>> for WsChannel<S> {
    fn from(ws: WebSocketStream<S>) -> Self {
        Self { ws }
    }
}

#[async_trait]
impl<S: AsyncRead + AsyncWrite + Unpin + Send> PeerChannel for WsChannel<S> {
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), Error> {
        // Text where possible, binary otherwise
        let m = match String::from_utf8(frame) {
            Ok(s) => Message::Text(s),
            Err(e) => Message::Binary(e.into_bytes()),
        };

        trace!("Peer write: {:?}", m);

        self.ws.send(m).await?;

        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<Vec<u8>>, Error> {
        while let Some(m) = self.ws.next().await {
            match m? {
                Message::Text(s) => return Ok(Some(s.into_bytes())),
                Message::Binary(b) => return Ok(Some(b)),
                Message::Close(f) => {
                    debug!("Peer closed: {:?}", f);
                    return Ok(None);
                }
                // Pings are answered on the next flush
                _ => continue,
            }
        }

        Ok(None)
    }

    async fn close(&mut self) -> Result<(), Error> {
        let f = CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        };

        self.ws.send(Message::Close(Some(f))).await?;

        Ok(())
    }
}
