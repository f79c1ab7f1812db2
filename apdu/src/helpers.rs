// Copyright (c) 2022-2023 The MobileCoin Foundation

use crate::ApduError;

/// Write a sequence of byte slices to the provided buffer, returning the encoded length
pub(crate) fn write_slices(buff: &mut [u8], parts: &[&[u8]]) -> Result<usize, ApduError> {
    let n = parts.iter().map(|p| p.len()).sum::<usize>();
    if buff.len() < n {
        return Err(ApduError::InvalidLength);
    }

    let mut index = 0;
    for p in parts {
        buff[index..][..p.len()].copy_from_slice(p);
        index += p.len();
    }

    Ok(index)
}

/// Reject empty response payloads
pub(crate) fn non_empty(buff: &[u8]) -> Result<&[u8], ApduError> {
    match buff.is_empty() {
        true => Err(ApduError::InvalidLength),
        false => Ok(buff),
    }
}

/// Declare a zero-length request APDU for the provided instruction
macro_rules! empty_req {
    ($(#[$meta:meta])* $name:ident, $ins:expr) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Debug, Default)]
        pub struct $name;

        impl $crate::ApduStatic for $name {
            const CLA: u8 = $crate::INC_APDU_CLA;
            const INS: u8 = $ins as u8;
        }

        impl encdec::Encode for $name {
            type Error = $crate::ApduError;

            fn encode_len(&self) -> Result<usize, Self::Error> {
                Ok(0)
            }

            fn encode(&self, _buff: &mut [u8]) -> Result<usize, Self::Error> {
                Ok(0)
            }
        }
    };
}

pub(crate) use empty_req;
