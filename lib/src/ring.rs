// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Ring-signature relay session
//!
//! A [RingSession] binds one remote [PeerChannel] to one [DeviceHandle].
//! The peer supplies ring data and sequencing, the device performs all
//! secret-dependent computation. The initial transaction payload is written
//! unprompted, then each inbound command is dispatched to exactly one device
//! operation and its result written back before the next command is read,
//! until the peer delivers a `result`.

use std::{collections::VecDeque, future::Future, time::Duration};

use async_trait::async_trait;
use log::{debug, error, info, warn};

use crate::{config::DeviceConfig, transport::Transport, DeviceHandle, Error};

mod messages;
pub use messages::*;

mod ws;
pub use ws::WsChannel;

/// Reply for commands with no device output
const SUCCESS: &[u8] = b"success";

/// Bidirectional message channel to the remote peer
#[async_trait]
pub trait PeerChannel: Send {
    /// Write a single outbound frame
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), Error>;

    /// Read the next inbound frame, `None` once the peer has closed the channel
    async fn recv(&mut self) -> Result<Option<Vec<u8>>, Error>;

    /// Start the close handshake
    async fn close(&mut self) -> Result<(), Error>;
}

/// Session result
#[derive(Clone, PartialEq, Debug)]
pub enum SessionOutcome {
    /// Peer delivered the final payload
    Completed(Vec<u8>),
    /// Session was cancelled prior to completion
    Cancelled,
}

/// Ring-signature relay session
pub struct RingSession<T: Transport, P: PeerChannel> {
    device: DeviceHandle<T>,
    peer: P,
    close_timeout: Duration,
}

/// Loop wake-up source
enum Event<T> {
    Cancel,
    Ready(T),
}

impl<T: Transport, P: PeerChannel> RingSession<T, P> {
    /// Create a session over the provided device and peer channel
    pub fn new(device: DeviceHandle<T>, peer: P, cfg: &DeviceConfig) -> Self {
        Self {
            device,
            peer,
            close_timeout: cfg.close_timeout(),
        }
    }

    /// Run the session to completion, resolving `cancel` triggers the close
    /// handshake unless the session has already reached its terminal state
    ///
    /// Device and channel failures abort the session, partial ring state is
    /// never resumed.
    pub async fn run(
        mut self,
        initial: Vec<u8>,
        cancel: impl Future<Output = ()>,
    ) -> Result<SessionOutcome, Error> {
        tokio::pin!(cancel);

        let mut outbound = VecDeque::from([initial]);

        info!("Starting ring session");

        loop {
            // Flush pending replies in order
            while let Some(frame) = outbound.pop_front() {
                let e = tokio::select! {
                    biased;
                    _ = &mut cancel => Event::Cancel,
                    r = self.peer.send(frame) => Event::Ready(r),
                };

                match e {
                    Event::Cancel => return self.cancel().await,
                    Event::Ready(Err(e)) => {
                        error!("Peer write failed: {}", e);
                        return Err(e);
                    }
                    Event::Ready(Ok(())) => (),
                }
            }

            // Await the next command
            let e = tokio::select! {
                biased;
                _ = &mut cancel => Event::Cancel,
                r = self.peer.recv() => Event::Ready(r),
            };

            let frame = match e {
                Event::Cancel => return self.cancel().await,
                Event::Ready(Ok(Some(f))) => f,
                Event::Ready(Ok(None)) => {
                    error!("Peer closed channel before result");
                    return Err(Error::Channel("peer closed channel".to_string()));
                }
                Event::Ready(Err(e)) => {
                    error!("Peer read failed: {}", e);
                    return Err(e);
                }
            };

            let msg: PeerMessage = serde_json::from_slice(&frame)?;

            match msg.command() {
                PeerCommand::Result => {
                    info!("Ring session complete");

                    if let Err(e) = self.peer.close().await {
                        debug!("Close after result failed: {}", e);
                    }

                    return Ok(SessionOutcome::Completed(msg.data));
                }
                PeerCommand::Unknown(c) => {
                    warn!("Discarding unrecognised command: '{}'", c);
                }
                c => {
                    // Dropping an in-progress device call leaves the handle desynchronised
                    let e = tokio::select! {
                        biased;
                        _ = &mut cancel => Event::Cancel,
                        r = self.dispatch(&c, &msg.data) => Event::Ready(r),
                    };

                    match e {
                        Event::Cancel => {
                            warn!("Cancelled during {:?}, abandoning device call", c);
                            return self.cancel().await;
                        }
                        Event::Ready(Ok(r)) => outbound.push_back(r),
                        Event::Ready(Err(e)) => {
                            error!("Ring session aborted, {:?} failed: {}", c, e);
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    /// Execute a single peer command against the device, returning the serialized reply
    async fn dispatch(&self, cmd: &PeerCommand, data: &[u8]) -> Result<Vec<u8>, Error> {
        debug!("Dispatching {:?}", cmd);

        let reply = match cmd {
            PeerCommand::SignSchnorr => {
                let d: SignSchnorrData = serde_json::from_slice(data)?;

                self.device
                    .sign_schnorr(
                        d.ped_random.as_deref(),
                        &d.ped_private,
                        d.randomness.as_deref(),
                        &d.message,
                    )
                    .await?
            }
            PeerCommand::GenerateAlpha => {
                let d: GenerateAlphaData = serde_json::from_slice(data)?;

                // Scalars are retained on the device
                let _alpha = self.device.generate_alpha(d.alpha_length).await?;

                SUCCESS.to_vec()
            }
            PeerCommand::DeriveCoinSecrets => {
                let d: DeriveCoinSecretsData = serde_json::from_slice(data)?;

                self.device.derive_coin_secrets(&d.coin_hashes).await?;

                SUCCESS.to_vec()
            }
            PeerCommand::CalculateChallenge => {
                let d: CalculateChallengeData = serde_json::from_slice(data)?;

                self.device
                    .calculate_challenge(&d.rpi, &d.ped_com_g)
                    .await?
            }
            PeerCommand::CalculateResponses => {
                let d: CalculateResponsesData = serde_json::from_slice(data)?;

                let r = self
                    .device
                    .calculate_responses(d.coin_length, &d.cpi)
                    .await?;

                serde_json::to_vec(&ResponsesReply(r))?
            }
            PeerCommand::Result | PeerCommand::Unknown(_) => {
                return Err(Error::ProtocolViolation("command has no device operation"))
            }
        };

        Ok(reply)
    }

    /// Send the close handshake and wait a bounded interval for acknowledgement
    async fn cancel(mut self) -> Result<SessionOutcome, Error> {
        info!("Cancelling ring session");

        self.peer.close().await?;

        // Drain until the peer acknowledges (closes) or errors
        let drain = async {
            while let Ok(Some(_)) = self.peer.recv().await {}
        };

        if tokio::time::timeout(self.close_timeout, drain).await.is_err() {
            warn!("Peer did not acknowledge close within {:?}", self.close_timeout);
        }

        Ok(SessionOutcome::Cancelled)
    }
}
