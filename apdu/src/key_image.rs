// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Key image decryption APDUs
//!
//! The balance service holds key images encrypted to the device, these are
//! decrypted on-device per coin and returned as [KeyImageResp] objects.

use encdec::{Decode, Encode};

use crate::{
    helpers::{non_empty, write_slices},
    ApduError, ApduStatic, Instruction, INC_APDU_CLA,
};

/// Decrypt a key image for a specific coin
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                      ENCRYPTED_KEY_IMAGE                      /
/// /                                                               /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// /                        COIN_PUBLIC_KEY                        /
/// /                                                               /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct KeyImageReq<'a> {
    /// Key image as encrypted by the balance service
    pub encrypted_key_image: &'a [u8],
    /// Coin public key
    pub coin_public_key: &'a [u8],
}

impl<'a> KeyImageReq<'a> {
    pub fn new(encrypted_key_image: &'a [u8], coin_public_key: &'a [u8]) -> Self {
        Self {
            encrypted_key_image,
            coin_public_key,
        }
    }
}

impl<'a> ApduStatic for KeyImageReq<'a> {
    const CLA: u8 = INC_APDU_CLA;
    const INS: u8 = Instruction::KeyImage as u8;
}

impl<'a> Encode for KeyImageReq<'a> {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, Self::Error> {
        Ok(self.encrypted_key_image.len() + self.coin_public_key.len())
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
        write_slices(buff, &[self.encrypted_key_image, self.coin_public_key])
    }
}

/// Decrypted key image response APDU
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct KeyImageResp<'a> {
    pub key_image: &'a [u8],
}

impl<'a> Decode<'a> for KeyImageResp<'a> {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self::Output, usize), Self::Error> {
        let key_image = non_empty(buff)?;
        Ok((Self { key_image }, key_image.len()))
    }
}

#[cfg(test)]
mod test {
    use rand::random;

    use super::*;
    use crate::test::encode_apdu;

    #[test]
    fn key_image_req_apdu() {
        let (encrypted, coin): ([u8; 32], [u8; 32]) = (random(), random());

        let mut buff = [0u8; 128];
        let n = encode_apdu(&mut buff, &KeyImageReq::new(&encrypted, &coin));

        // Encrypted key image precedes the coin public key
        assert_eq!(n, 64);
        assert_eq!(&buff[..32], &encrypted);
        assert_eq!(&buff[32..64], &coin);
    }

    #[test]
    fn key_image_resp_apdu() {
        let ki: [u8; 32] = random();

        let (r, n) = KeyImageResp::decode(&ki).unwrap();
        assert_eq!(r.key_image, &ki);
        assert_eq!(n, 32);

        assert_eq!(KeyImageResp::decode(&[]), Err(ApduError::InvalidLength));
    }
}
