// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Generic transport abstraction for hiding underlying transport types
//!
//! Transports implement [ledger_transport::Exchange], issuing a single
//! [APDUCommand] and returning the raw [APDUAnswer] (payload and status word).
//! Status words are checked by the [DeviceHandle](crate::DeviceHandle).

use std::ops::Deref;

use async_trait::async_trait;
use strum::Display;

pub use ledger_transport::{APDUAnswer, APDUCommand, Exchange};

#[cfg(feature = "transport_hid")]
mod hid;
#[cfg(feature = "transport_hid")]
pub use hid::TransportHid;
#[cfg(feature = "transport_hid")]
pub use ledger_transport_hid::{LedgerHIDError, TransportNativeHID};

#[cfg(feature = "transport_tcp")]
mod tcp;
#[cfg(feature = "transport_tcp")]
pub use tcp::{TcpOptions, TcpTransportInner, TransportTcp};

use crate::Error;

/// [Exchange] implementations usable by a [DeviceHandle](crate::DeviceHandle),
/// with transport errors mapped into [Error]
pub trait Transport: Exchange<Error = Error> + Send + Sync {}

impl<T: Exchange<Error = Error> + Send + Sync> Transport for T {}

/// Generic ledger device (abstract over transport types)
#[derive(Display)]
#[non_exhaustive]
pub enum GenericTransport {
    #[cfg(feature = "transport_hid")]
    Hid(TransportHid),
    #[cfg(feature = "transport_tcp")]
    Tcp(TransportTcp),
}

/// Convert a HID transport into a generic transport
#[cfg(feature = "transport_hid")]
impl From<TransportHid> for GenericTransport {
    fn from(t: TransportHid) -> Self {
        Self::Hid(t)
    }
}

/// Convert a TCP transport into a generic transport
#[cfg(feature = "transport_tcp")]
impl From<TransportTcp> for GenericTransport {
    fn from(t: TransportTcp) -> Self {
        Self::Tcp(t)
    }
}

/// Implementation of [Exchange] for [GenericTransport]
#[async_trait]
impl Exchange for GenericTransport {
    type Error = Error;
    type AnswerType = Vec<u8>;

    async fn exchange<I>(
        &self,
        command: &APDUCommand<I>,
    ) -> Result<APDUAnswer<Self::AnswerType>, Self::Error>
    where
        I: Deref<Target = [u8]> + Send + Sync,
    {
        match self {
            #[cfg(feature = "transport_hid")]
            Self::Hid(t) => t.exchange(command).await,
            #[cfg(feature = "transport_tcp")]
            Self::Tcp(t) => t.exchange(command).await,
            #[cfg(not(any(feature = "transport_hid", feature = "transport_tcp")))]
            _ => Err(Error::NoDevice),
        }
    }
}

/// Reported by [TransportNativeHID] when a read returns no (or too few) bytes
#[cfg(feature = "transport_hid")]
const HID_SHORT_READ: &str = "Read error. Incomplete header";

#[cfg(feature = "transport_hid")]
impl From<LedgerHIDError> for Error {
    fn from(e: LedgerHIDError) -> Self {
        match e {
            LedgerHIDError::DeviceNotFound => Error::NoDevice,
            // hidapi returns zero bytes when a read times out
            LedgerHIDError::Comm(HID_SHORT_READ) => Error::RequestTimeout,
            LedgerHIDError::Comm(s) => Error::MalformedResponse(s),
            LedgerHIDError::Io(e) => Error::Io(e),
            LedgerHIDError::Hid(e) => Error::Hid(e),
            LedgerHIDError::UTF8(_) => Error::ProtocolViolation("invalid UTF-8 in HID response"),
        }
    }
}

/// Split a raw response into an [APDUAnswer]
pub(crate) fn answer(raw: Vec<u8>) -> Result<APDUAnswer<Vec<u8>>, Error> {
    APDUAnswer::from_answer(raw).map_err(|_| Error::MalformedResponse("missing status word"))
}
