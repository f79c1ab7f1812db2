// Copyright (c) 2022-2023 The MobileCoin Foundation

//! TCP transport for Speculos-style emulated devices
//!
//! Each APDU is prefixed with a 4-byte big-endian length, responses carry a
//! 4-byte length of the payload followed by the payload and status word.

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    ops::Deref,
};

use async_trait::async_trait;
use log::{debug, trace};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
    sync::Mutex,
};

use super::{answer, APDUAnswer, APDUCommand, Exchange};
use crate::Error;

/// Upper bound on response payload length
const MAX_RESPONSE_LEN: usize = 4096;

/// TCP transport options
#[derive(Clone, Debug, PartialEq, clap::Args)]
pub struct TcpOptions {
    /// Emulator APDU address
    #[clap(long = "tcp-addr", default_value = "127.0.0.1")]
    pub addr: IpAddr,

    /// Emulator APDU port
    #[clap(long = "tcp-port", default_value = "9999")]
    pub port: u16,
}

impl Default for TcpOptions {
    fn default() -> Self {
        Self {
            addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 9999,
        }
    }
}

impl TcpOptions {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }
}

/// TCP transport, generic over the underlying stream
pub struct TcpTransportInner<S> {
    s: Mutex<S>,
}

/// TCP transport over a [TcpStream]
pub type TransportTcp = TcpTransportInner<TcpStream>;

impl TransportTcp {
    /// Connect to a TCP device
    pub async fn new(opts: TcpOptions) -> Result<Self, Error> {
        debug!("Connecting to TCP device: {}", opts.socket_addr());

        let s = TcpStream::connect(opts.socket_addr()).await?;

        Ok(Self::from(s))
    }
}

impl<S> From<S> for TcpTransportInner<S> {
    fn from(s: S) -> Self {
        Self { s: Mutex::new(s) }
    }
}

/// Write an encoded APDU and read the raw response (payload and status)
async fn exchange_raw<S: AsyncRead + AsyncWrite + Unpin>(
    s: &mut S,
    apdu: &[u8],
) -> Result<Vec<u8>, Error> {
    let mut req = Vec::with_capacity(apdu.len() + 4);
    req.extend_from_slice(&(apdu.len() as u32).to_be_bytes());
    req.extend_from_slice(apdu);

    trace!("TCP write: {:02x?}", req);

    s.write_all(&req).await?;

    // Read payload length (excluding status)
    let mut len = [0u8; 4];
    s.read_exact(&mut len).await?;
    let n = u32::from_be_bytes(len) as usize;

    if n > MAX_RESPONSE_LEN {
        return Err(Error::MalformedResponse("response length exceeds limit"));
    }

    // Read payload and status
    let mut raw = vec![0u8; n + 2];
    let mut received = 0;
    while received < raw.len() {
        match s.read(&mut raw[received..]).await? {
            0 => return Err(Error::MalformedResponse("truncated response")),
            r => received += r,
        }
    }

    trace!("TCP read: {:02x?}", raw);

    Ok(raw)
}

#[async_trait]
impl<S: AsyncRead + AsyncWrite + Unpin + Send> Exchange for TcpTransportInner<S> {
    type Error = Error;
    type AnswerType = Vec<u8>;

    async fn exchange<I>(
        &self,
        command: &APDUCommand<I>,
    ) -> Result<APDUAnswer<Self::AnswerType>, Self::Error>
    where
        I: Deref<Target = [u8]> + Send + Sync,
    {
        let mut s = self.s.lock().await;

        let raw = exchange_raw(&mut *s, &command.serialize()).await?;

        answer(raw)
    }
}
