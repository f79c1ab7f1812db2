//! Prelude to simplify downstream use of APDU objects
//!

pub use crate::{
    key_image::{KeyImageReq, KeyImageResp},
    keys::{
        AddressReq, ImportKeyReq, OtaKeyReq, PrivateKeyReq, TrustHostReq, ValidatorKeyReq,
        ViewKeyReq,
    },
    ring::{AlphaResp, ChallengeReq, CoinSecretReq, GenAlphaReq, ResponseReq},
    schnorr::SchnorrSignReq,
    version::{VersionReq, VersionResp},
    ApduError, ApduReq, ApduStatic, DataResp, Instruction, StatusCode, APDUAnswer, APDUCommand,
};
