// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Ring signing APDUs
//!
//! Ring signatures are built cooperatively with the remote transaction
//! builder, the device supplies all secret-dependent values:
//!
//! 1. [GenAlphaReq] generates per-input blinding scalars
//! 2. [CoinSecretReq] is issued per input coin, the last with `last` set
//!    to fold in the accumulated randomness secret
//! 3. [ChallengeReq] is issued per ring position, the last position with
//!    `last` set and the closing base point as payload
//! 4. [ResponseReq] is issued per coin position to fetch response scalars
//!
//! The `last` flag is a protocol marker, positions are carried in `P2`.

use encdec::{Decode, Encode};

use crate::{
    helpers::write_slices, ApduError, ApduStatic, Instruction, INC_APDU_CLA, SCALAR_LEN,
};

/// Generate blinding scalars, `count` is carried in `P1`
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct GenAlphaReq {
    pub count: u8,
}

impl GenAlphaReq {
    pub fn new(count: u8) -> Self {
        Self { count }
    }
}

impl ApduStatic for GenAlphaReq {
    const CLA: u8 = INC_APDU_CLA;
    const INS: u8 = Instruction::GenAlpha as u8;

    fn p1(&self) -> u8 {
        self.count
    }
}

impl Encode for GenAlphaReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(0)
    }

    fn encode(&self, _buff: &mut [u8]) -> Result<usize, Self::Error> {
        Ok(0)
    }
}

/// Blinding scalar response, a whole number of [SCALAR_LEN] chunks
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct AlphaResp<'a> {
    data: &'a [u8],
}

impl<'a> AlphaResp<'a> {
    /// Number of scalars in the response
    pub fn len(&self) -> usize {
        self.data.len() / SCALAR_LEN
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterate over scalars in the response
    pub fn scalars(&self) -> impl Iterator<Item = [u8; SCALAR_LEN]> + 'a {
        self.data.chunks_exact(SCALAR_LEN).map(|c| {
            let mut s = [0u8; SCALAR_LEN];
            s.copy_from_slice(c);
            s
        })
    }
}

impl<'a> Decode<'a> for AlphaResp<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self::Output, usize), Self::Error> {
        if buff.len() % SCALAR_LEN != 0 {
            return Err(ApduError::InvalidLength);
        }

        Ok((Self { data: buff }, buff.len()))
    }
}

/// Compute a partial ring challenge for the ring position `index`
///
/// For all but the last position the payload is the partial commitment
/// `Rpi[index]`, the last position carries the closing base point.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct ChallengeReq<'a> {
    /// Ring position (`P2`)
    pub index: u8,
    /// Last ring position marker (`P1`)
    pub last: bool,
    /// Partial commitment or closing base point
    pub point: &'a [u8],
}

impl<'a> ChallengeReq<'a> {
    pub fn new(index: u8, last: bool, point: &'a [u8]) -> Self {
        Self { index, last, point }
    }
}

impl<'a> ApduStatic for ChallengeReq<'a> {
    const CLA: u8 = INC_APDU_CLA;
    const INS: u8 = Instruction::CalculateChallenge as u8;

    fn p1(&self) -> u8 {
        self.last as u8
    }

    fn p2(&self) -> u8 {
        self.index
    }
}

impl<'a> Encode for ChallengeReq<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(self.point.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        write_slices(buff, &[self.point])
    }
}

/// Compute the response scalar for coin position `index`
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct ResponseReq<'a> {
    /// Coin position (`P2`)
    pub index: u8,
    /// Ring challenge
    pub challenge: &'a [u8],
}

impl<'a> ResponseReq<'a> {
    pub fn new(index: u8, challenge: &'a [u8]) -> Self {
        Self { index, challenge }
    }
}

impl<'a> ApduStatic for ResponseReq<'a> {
    const CLA: u8 = INC_APDU_CLA;
    const INS: u8 = Instruction::CalculateResponse as u8;

    fn p2(&self) -> u8 {
        self.index
    }
}

impl<'a> Encode for ResponseReq<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(self.challenge.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        write_slices(buff, &[self.challenge])
    }
}

/// Derive the secret for coin position `index`
///
/// The last coin sets `last` so the device folds in the accumulated
/// randomness secret.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct CoinSecretReq<'a> {
    /// Coin position (`P2`)
    pub index: u8,
    /// Terminal coin marker (`P1`)
    pub last: bool,
    /// Coin hash
    pub coin_hash: &'a [u8],
}

impl<'a> CoinSecretReq<'a> {
    pub fn new(index: u8, last: bool, coin_hash: &'a [u8]) -> Self {
        Self {
            index,
            last,
            coin_hash,
        }
    }
}

impl<'a> ApduStatic for CoinSecretReq<'a> {
    const CLA: u8 = INC_APDU_CLA;
    const INS: u8 = Instruction::DeriveCoinSecret as u8;

    fn p1(&self) -> u8 {
        self.last as u8
    }

    fn p2(&self) -> u8 {
        self.index
    }
}

impl<'a> Encode for CoinSecretReq<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(self.coin_hash.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        write_slices(buff, &[self.coin_hash])
    }
}
