// Copyright (c) 2022-2023 The MobileCoin Foundation

use incognito_ledger_apdu::{ApduError, StatusCode};

/// Ledger Incognito API Error Type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No matching device discoverable
    #[error("No ledger device found")]
    NoDevice,

    /// Physical link failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HID error
    #[cfg(feature = "transport_hid")]
    #[error("HID error: {0}")]
    Hid(#[from] hidapi::HidError),

    /// Response framing or reassembly failed
    #[error("Malformed response: {0}")]
    MalformedResponse(&'static str),

    /// Device returned a failing status word
    #[error("Device returned status {0}")]
    Status(Status),

    /// Response shape does not match the protocol (eg. firmware mismatch)
    #[error("Protocol violation: {0}")]
    ProtocolViolation(&'static str),

    /// Caller-supplied argument out of range for the wire protocol
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Command encoding failed
    #[error("APDU encoding failed: {0}")]
    Apdu(#[from] ApduError),

    /// Malformed caller-supplied hex
    #[error("Invalid hex: {0}")]
    Decode(#[from] hex::FromHexError),

    /// Malformed peer payload
    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Remote peer connection failure
    #[error("Channel error: {0}")]
    Channel(String),

    /// Balance service request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Timeout waiting for device response
    #[error("Timeout waiting for device response")]
    RequestTimeout,

    /// A previous exchange was abandoned before completion, responses on
    /// this link may belong to an earlier request
    #[error("Device link desynchronised by an abandoned request, reconnect to continue")]
    Desynchronised,

    /// Session cancelled before completion
    #[error("Session cancelled")]
    Cancelled,
}

/// Failing status word, known codes are decoded
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Status {
    Known(StatusCode),
    Unknown(u16),
}

impl From<u16> for Status {
    fn from(v: u16) -> Self {
        match StatusCode::try_from(v) {
            Ok(c) => Status::Known(c),
            Err(_) => Status::Unknown(v),
        }
    }
}

impl Status {
    /// Raw status word
    pub fn code(&self) -> u16 {
        match self {
            Status::Known(c) => *c as u16,
            Status::Unknown(v) => *v,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Known(c) => write!(f, "{} ({:#06x})", c, *c as u16),
            Status::Unknown(v) => write!(f, "{v:#06x}"),
        }
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::RequestTimeout
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::Channel(e.to_string())
    }
}
