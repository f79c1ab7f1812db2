// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Protocol / APDU definitions for Incognito hardware wallet communication
//!
//! This module provides the wire format for commands issued to the
//! Incognito ledger application. Every command is a single APDU: class byte,
//! instruction code, two 1-byte parameters and at most 255 bytes of payload.
//!
//! Payloads are opaque blobs computed either by the device or by the remote
//! transaction builder, the host never inspects or re-derives key material.
//! Multi-byte integers are little-endian.
//!
//! Requests are encoded to [APDUCommand] objects for use with `ledger-transport`
//! implementations. Responses carry a variable length payload followed by a
//! 2-byte big-endian [StatusCode], the status is checked and stripped from the
//! [APDUAnswer] before response objects are decoded.

#![no_std]

#[cfg(feature = "thiserror")]
extern crate std;

use core::fmt::Debug;

use num_enum::TryFromPrimitive;
use strum::Display;

pub use ledger_apdu::{APDUAnswer, APDUCommand, APDUErrorCode};

pub mod keys;
pub mod key_image;
pub mod prelude;
pub mod ring;
pub mod schnorr;
pub mod version;

mod helpers;

/// Incognito APDU Class
pub const INC_APDU_CLA: u8 = 0xe0;

/// Maximum APDU payload length
pub const MAX_PAYLOAD_LEN: usize = 255;

/// Length of scalars / compressed points exchanged with the device
pub const SCALAR_LEN: usize = 32;

/// Incognito APDU instruction codes
#[derive(Copy, Clone, Debug, PartialEq, Display, TryFromPrimitive)]
#[repr(u8)]
pub enum Instruction {
    /// Fetch application version
    GetVersion = 0x01,

    /// Fetch payment address
    GetAddress = 0x02,

    /// Export view key
    GetViewKey = 0x03,

    /// Export private key
    GetPrivateKey = 0x04,

    /// Import (switch to) a private key
    ImportKey = 0x05,

    /// Export one-time-address key
    GetOtaKey = 0x06,

    /// Export validator key
    GetValidatorKey = 0x07,

    /// Decrypt a coin key image
    KeyImage = 0x10,

    /// Generate blinding scalars for ring signing
    GenAlpha = 0x21,

    /// Compute a partial ring challenge
    CalculateChallenge = 0x22,

    /// Compute a ring response scalar
    CalculateResponse = 0x23,

    /// Derive a per-coin secret
    DeriveCoinSecret = 0x24,

    /// Schnorr sign a message digest
    SignSchnorr = 0x40,

    /// Mark the host as trusted for this session
    TrustHost = 0x60,
}

/// APDU status words
#[derive(Copy, Clone, Debug, PartialEq, Display, TryFromPrimitive)]
#[repr(u16)]
pub enum StatusCode {
    /// Command executed successfully
    Ok = 0x9000,

    /// Operation rejected by the user
    UserRejected = 0x6985,

    /// Invalid command parameter
    InvalidParam = 0x6b01,

    /// Invalid command data
    InvalidData = 0x6a80,

    /// Wrong payload length
    WrongLength = 0x6700,

    /// Instruction not supported by the application
    InsNotSupported = 0x6d00,

    /// Class not supported by the application
    ClaNotSupported = 0x6e00,
}

/// APDU encode / decode errors
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
pub enum ApduError {
    /// Buffer too short for encode / decode
    #[cfg_attr(feature = "thiserror", error("invalid length"))]
    InvalidLength,

    /// Object encoding invalid
    #[cfg_attr(feature = "thiserror", error("invalid encoding"))]
    InvalidEncoding,

    /// Encoded payload exceeds [MAX_PAYLOAD_LEN]
    #[cfg_attr(feature = "thiserror", error("payload too long ({0} bytes)"))]
    PayloadTooLong(usize),
}

impl From<encdec::Error> for ApduError {
    fn from(e: encdec::Error) -> Self {
        match e {
            encdec::Error::Length => ApduError::InvalidLength,
            _ => ApduError::InvalidEncoding,
        }
    }
}

/// Static APDU information, implemented for each request object
pub trait ApduStatic {
    /// Class byte
    const CLA: u8;

    /// Instruction code
    const INS: u8;

    /// First parameter, defaults to zero
    fn p1(&self) -> u8 {
        0
    }

    /// Second parameter, defaults to zero
    fn p2(&self) -> u8 {
        0
    }
}

/// Request APDU, an encodable object with static header information
pub trait ApduReq: ApduStatic + encdec::Encode<Error = ApduError> + Debug {
    /// Encode this request into `buff`, returning an [APDUCommand] over the
    /// encoded payload. Payloads are limited to [MAX_PAYLOAD_LEN] bytes.
    fn command<'a>(&self, buff: &'a mut [u8]) -> Result<APDUCommand<&'a [u8]>, ApduError> {
        let n = self.encode_len()?;
        if n > MAX_PAYLOAD_LEN {
            return Err(ApduError::PayloadTooLong(n));
        }
        if buff.len() < n {
            return Err(ApduError::InvalidLength);
        }

        let n = self.encode(&mut buff[..n])?;

        Ok(APDUCommand {
            cla: Self::CLA,
            ins: Self::INS,
            p1: self.p1(),
            p2: self.p2(),
            data: &buff[..n],
        })
    }
}

impl<T: ApduStatic + encdec::Encode<Error = ApduError> + Debug> ApduReq for T {}

/// Variable length response payload (signatures, keys, partial challenges)
///
/// Decoding consumes the full buffer and rejects empty payloads.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DataResp<'a> {
    pub data: &'a [u8],
}

impl<'a> encdec::Decode<'a> for DataResp<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self::Output, usize), Self::Error> {
        let data = helpers::non_empty(buff)?;
        Ok((Self { data }, data.len()))
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// Helper for APDU encode tests, returns the encoded payload length
    pub fn encode_apdu<R: ApduReq>(buff: &mut [u8], apdu: &R) -> usize {
        let expected_n = apdu.encode_len().expect("get length failed");

        // Encode APDU
        let c = apdu.command(buff).expect("encode failed");
        assert_eq!(c.cla, INC_APDU_CLA);

        // Check encoded length matches expected length
        assert_eq!(c.data.len(), expected_n, "encode length mismatch");

        c.data.len()
    }

    /// Helper for APDU header tests, returns `(CLA, INS, P1, P2)`
    pub fn header<R: ApduReq>(apdu: &R) -> (u8, u8, u8, u8) {
        let mut buff = [0u8; MAX_PAYLOAD_LEN];
        let c = apdu.command(&mut buff).expect("encode failed");

        (c.cla, c.ins, c.p1, c.p2)
    }

    #[test]
    fn request_command() {
        use crate::keys::PrivateKeyReq;

        let mut buff = [0u8; 8];
        let c = PrivateKeyReq::new(7).command(&mut buff).unwrap();

        assert_eq!((c.cla, c.ins, c.p1, c.p2), (0xe0, 0x04, 0, 0));
        assert_eq!(c.data, &[7, 0, 0, 0]);

        // Short buffers are rejected prior to encoding
        let mut buff = [0u8; 2];
        assert!(matches!(
            PrivateKeyReq::new(7).command(&mut buff),
            Err(ApduError::InvalidLength)
        ));
    }

    #[test]
    fn instruction_codes() {
        assert_eq!(
            Instruction::try_from(0x22).ok(),
            Some(Instruction::CalculateChallenge)
        );
        assert_eq!(Instruction::TrustHost as u8, 0x60);
        assert!(Instruction::try_from(0x99).is_err());
    }

    #[test]
    fn status_codes() {
        assert_eq!(StatusCode::try_from(0x9000).ok(), Some(StatusCode::Ok));
        assert_eq!(
            StatusCode::try_from(0x6985).ok(),
            Some(StatusCode::UserRejected)
        );
        assert!(StatusCode::try_from(0x1234).is_err());
    }
}
