// Copyright (c) 2022-2023 The MobileCoin Foundation

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    ops::Deref,
    str::FromStr,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use log::{debug, LevelFilter};
use simplelog::SimpleLogger;

use incognito_ledger::{
    ring::PeerChannel,
    transport::{APDUAnswer, APDUCommand, Exchange},
    DeviceHandle, Error,
};

/// Setup test logging, level from the `LOG_LEVEL` environment variable
pub fn setup_logging() {
    let log_level = match std::env::var("LOG_LEVEL").map(|v| LevelFilter::from_str(&v)) {
        Ok(Ok(l)) => l,
        _ => LevelFilter::Debug,
    };

    let log_cfg = simplelog::ConfigBuilder::new()
        .add_filter_ignore_str("tungstenite")
        .add_filter_ignore_str("tokio_tungstenite")
        .build();

    let _ = SimpleLogger::init(log_level, log_cfg);
}

/// Command as observed by the mock device
#[derive(Clone, PartialEq, Debug)]
pub struct Recorded {
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub payload: Vec<u8>,
}

type Responder = Box<dyn FnMut(&Recorded) -> Result<Vec<u8>, Error> + Send>;

/// Mock transport recording issued commands and answering via a responder
///
/// Status errors from the responder are returned as status words, other
/// errors are reported as transport failures.
pub struct MockTransport {
    log: Arc<Mutex<Vec<Recorded>>>,
    responder: Mutex<Responder>,
    /// Per-exchange response delays, consumed in order
    delays: Mutex<VecDeque<Duration>>,
}

/// Shared view of the commands issued to a [MockTransport]
#[derive(Clone)]
pub struct CommandLog(Arc<Mutex<Vec<Recorded>>>);

impl CommandLog {
    pub fn commands(&self) -> Vec<Recorded> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

impl MockTransport {
    /// Create a mock device with the provided responder
    pub fn new(
        responder: impl FnMut(&Recorded) -> Result<Vec<u8>, Error> + Send + 'static,
    ) -> (Self, CommandLog) {
        let log = Arc::new(Mutex::new(vec![]));

        let t = Self {
            log: log.clone(),
            responder: Mutex::new(Box::new(responder)),
            delays: Mutex::new(VecDeque::new()),
        };

        (t, CommandLog(log))
    }

    /// Delay the responses to the first exchanges
    pub fn with_delays(self, delays: Vec<Duration>) -> Self {
        *self.delays.lock().unwrap() = delays.into();
        self
    }

    /// Create a device handle over a mock device with the provided responder
    pub fn handle(
        responder: impl FnMut(&Recorded) -> Result<Vec<u8>, Error> + Send + 'static,
    ) -> (DeviceHandle<MockTransport>, CommandLog) {
        let (t, log) = Self::new(responder);
        (DeviceHandle::from(t), log)
    }
}

#[async_trait]
impl Exchange for MockTransport {
    type Error = Error;
    type AnswerType = Vec<u8>;

    async fn exchange<I>(
        &self,
        command: &APDUCommand<I>,
    ) -> Result<APDUAnswer<Self::AnswerType>, Self::Error>
    where
        I: Deref<Target = [u8]> + Send + Sync,
    {
        let r = Recorded {
            ins: command.ins,
            p1: command.p1,
            p2: command.p2,
            payload: command.data.to_vec(),
        };

        debug!("Mock exchange: {:02x?}", r);

        self.log.lock().unwrap().push(r.clone());

        let delay = self.delays.lock().unwrap().pop_front();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }

        let resp = {
            let mut f = self.responder.lock().unwrap();
            (*f)(&r)
        };

        let raw = match resp {
            Ok(mut d) => {
                d.extend_from_slice(&[0x90, 0x00]);
                d
            }
            Err(Error::Status(s)) => s.code().to_be_bytes().to_vec(),
            Err(e) => return Err(e),
        };

        Ok(APDUAnswer::from_answer(raw).unwrap())
    }
}

/// Scripted peer, replays inbound frames and records outbound ones
///
/// Once the script is exhausted `recv` either reports a closed channel or
/// never resolves (a silent peer).
pub struct ScriptedPeer {
    inbound: VecDeque<Vec<u8>>,
    silent: bool,
    state: Arc<Mutex<PeerState>>,
}

#[derive(Clone, Default, Debug)]
pub struct PeerState {
    pub sent: Vec<Vec<u8>>,
    pub closed: bool,
}

impl ScriptedPeer {
    pub fn new(inbound: Vec<String>) -> (Self, Arc<Mutex<PeerState>>) {
        let state = Arc::new(Mutex::new(PeerState::default()));

        let p = Self {
            inbound: inbound.into_iter().map(String::into_bytes).collect(),
            silent: false,
            state: state.clone(),
        };

        (p, state)
    }

    /// Peer that never sends or acknowledges anything after its script
    pub fn silent(inbound: Vec<String>) -> (Self, Arc<Mutex<PeerState>>) {
        let (mut p, s) = Self::new(inbound);
        p.silent = true;
        (p, s)
    }
}

#[async_trait]
impl PeerChannel for ScriptedPeer {
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), Error> {
        self.state.lock().unwrap().sent.push(frame);
        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<Vec<u8>>, Error> {
        match self.inbound.pop_front() {
            Some(f) => Ok(Some(f)),
            None if self.silent => std::future::pending::<Result<Option<Vec<u8>>, Error>>().await,
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<(), Error> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}

/// Build a peer message frame with base64 encoded data
pub fn peer_msg(cmd: &str, data: &[u8]) -> String {
    use base64::{engine::general_purpose::STANDARD, Engine};

    serde_json::json!({ "Cmd": cmd, "Data": STANDARD.encode(data) }).to_string()
}

/// Fixed length response filled with a marker byte
pub fn marker(v: u8, n: usize) -> Vec<u8> {
    vec![v; n]
}
