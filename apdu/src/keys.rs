// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Key export / import and host trust APDUs
//!
//! Export responses are returned as [DataResp][crate::DataResp] objects.

use encdec::Encode;

use crate::{
    helpers::{empty_req, write_slices},
    ApduError, ApduStatic, Instruction, INC_APDU_CLA,
};

empty_req!(
    /// Fetch payment address APDU
    AddressReq,
    Instruction::GetAddress
);

empty_req!(
    /// Export view key APDU
    ViewKeyReq,
    Instruction::GetViewKey
);

empty_req!(
    /// Export one-time-address key APDU
    OtaKeyReq,
    Instruction::GetOtaKey
);

empty_req!(
    /// Export validator key APDU
    ValidatorKeyReq,
    Instruction::GetValidatorKey
);

empty_req!(
    /// Establish host trust APDU, must precede any operation on secret-derived material
    TrustHostReq,
    Instruction::TrustHost
);

/// Export private key APDU
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         ACCOUNT_INDEX                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct PrivateKeyReq {
    pub account_index: u32,
}

impl PrivateKeyReq {
    pub fn new(account_index: u32) -> Self {
        Self { account_index }
    }
}

impl ApduStatic for PrivateKeyReq {
    const CLA: u8 = INC_APDU_CLA;
    const INS: u8 = Instruction::GetPrivateKey as u8;
}

impl Encode for PrivateKeyReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(4)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        write_slices(buff, &[&self.account_index.to_le_bytes()])
    }
}

/// Import private key APDU, the payload is the serialized key as-is
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct ImportKeyReq<'a> {
    pub key: &'a [u8],
}

impl<'a> ImportKeyReq<'a> {
    pub fn new(key: &'a [u8]) -> Self {
        Self { key }
    }
}

impl<'a> ApduStatic for ImportKeyReq<'a> {
    const CLA: u8 = INC_APDU_CLA;
    const INS: u8 = Instruction::ImportKey as u8;
}

impl<'a> Encode for ImportKeyReq<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(self.key.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        write_slices(buff, &[self.key])
    }
}
