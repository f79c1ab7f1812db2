// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Schnorr signing APDU, responses are [DataResp][crate::DataResp] signatures

use encdec::Encode;

use crate::{helpers::write_slices, ApduError, ApduStatic, Instruction, INC_APDU_CLA};

/// Schnorr sign a message digest
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                      PEDERSEN_RANDOMNESS                      /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                        PEDERSEN_PRIVATE                       /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                             NONCE                             /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                         MESSAGE_DIGEST                        /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SchnorrSignReq<'a> {
    pub ped_random: &'a [u8],
    pub ped_private: &'a [u8],
    pub nonce: &'a [u8],
    pub message: &'a [u8],
}

impl<'a> ApduStatic for SchnorrSignReq<'a> {
    const CLA: u8 = INC_APDU_CLA;
    const INS: u8 = Instruction::SignSchnorr as u8;
}

impl<'a> Encode for SchnorrSignReq<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(self.ped_random.len() + self.ped_private.len() + self.nonce.len() + self.message.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        write_slices(
            buff,
            &[self.ped_random, self.ped_private, self.nonce, self.message],
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{test::encode_apdu, ApduReq};

    #[test]
    fn schnorr_sign_req_order() {
        let req = SchnorrSignReq {
            ped_random: &[1; 32],
            ped_private: &[2; 32],
            nonce: &[3; 32],
            message: &[4; 32],
        };

        let mut buff = [0u8; 256];
        let n = encode_apdu(&mut buff, &req);

        assert_eq!(n, 128);
        for (i, c) in buff[..n].chunks(32).enumerate() {
            assert!(c.iter().all(|b| *b == i as u8 + 1), "chunk {i} out of order");
        }
    }

    #[test]
    fn schnorr_sign_req_too_long() {
        let m = [0u8; 200];
        let req = SchnorrSignReq {
            ped_random: &[0; 32],
            ped_private: &[0; 32],
            nonce: &[0; 32],
            message: &m,
        };

        let mut buff = [0u8; 512];
        assert!(matches!(
            req.command(&mut buff),
            Err(ApduError::PayloadTooLong(296))
        ));
    }
}
