// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Application version APDUs

use encdec::Decode;

use crate::{helpers::empty_req, ApduError, Instruction};

empty_req!(
    /// Fetch application version APDU
    VersionReq,
    Instruction::GetVersion
);

/// Application version response APDU
///
/// ## Encoding
///
/// ```text
///  0                   1                   2
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     MAJOR     |     MINOR     |     PATCH     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// Responses of any other length are rejected.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct VersionResp {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl VersionResp {
    /// Create a new application version APDU
    pub fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl<'a> Decode<'a> for VersionResp {
    type Output = Self;
    type Error = ApduError;

    fn decode(buff: &'a [u8]) -> Result<(Self::Output, usize), Self::Error> {
        match buff {
            [major, minor, patch] => Ok((Self::new(*major, *minor, *patch), 3)),
            _ => Err(ApduError::InvalidLength),
        }
    }
}

impl core::fmt::Display for VersionResp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::encode_apdu;

    #[test]
    fn version_req_apdu() {
        let mut buff = [0u8; 16];
        assert_eq!(encode_apdu(&mut buff, &VersionReq), 0);
    }

    #[test]
    fn version_resp_decode() {
        let (v, n) = VersionResp::decode(&[0, 5, 5]).unwrap();

        assert_eq!(n, 3);
        assert_eq!(v, VersionResp::new(0, 5, 5));
    }

    #[test]
    fn version_resp_rejects_other_lengths() {
        let buff = [1u8; 8];

        for n in 0..buff.len() {
            if n == 3 {
                continue;
            }

            assert_eq!(
                VersionResp::decode(&buff[..n]),
                Err(ApduError::InvalidLength),
                "length {n} accepted"
            );
        }
    }
}
