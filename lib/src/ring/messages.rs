// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Peer message types
//!
//! Frames are JSON objects `{"Cmd": string, "Data": base64}`, where `Data`
//! is itself a JSON document for commands carrying ring data.

use serde::{Deserialize, Serialize};
use strum::EnumString;

/// Peer message envelope
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct PeerMessage {
    #[serde(rename = "Cmd")]
    pub cmd: String,

    #[serde(rename = "Data", default, with = "b64")]
    pub data: Vec<u8>,
}

impl PeerMessage {
    /// Resolve the message command
    pub fn command(&self) -> PeerCommand {
        self.cmd
            .parse()
            .unwrap_or_else(|_| PeerCommand::Unknown(self.cmd.clone()))
    }
}

/// Commands issued by the remote peer
///
/// Short names are used on the wire, descriptive names are accepted as aliases.
#[derive(Clone, PartialEq, Debug, EnumString)]
pub enum PeerCommand {
    #[strum(serialize = "signschnorr", serialize = "sign-schnorr")]
    SignSchnorr,

    #[strum(serialize = "genalpha", serialize = "generate-alpha")]
    GenerateAlpha,

    #[strum(serialize = "gencoinprivate", serialize = "derive-coin-secrets")]
    DeriveCoinSecrets,

    #[strum(serialize = "calculatec", serialize = "calculate-challenge")]
    CalculateChallenge,

    #[strum(serialize = "calculater", serialize = "calculate-responses")]
    CalculateResponses,

    #[strum(serialize = "result")]
    Result,

    /// Unrecognised command, logged and discarded
    #[strum(default)]
    Unknown(String),
}

/// `signschnorr` request data
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SignSchnorrData {
    #[serde(default, with = "b64_opt")]
    pub ped_random: Option<Vec<u8>>,

    #[serde(with = "b64")]
    pub ped_private: Vec<u8>,

    #[serde(default, with = "b64_opt")]
    pub randomness: Option<Vec<u8>>,

    #[serde(with = "b64")]
    pub message: Vec<u8>,
}

/// `genalpha` request data
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GenerateAlphaData {
    pub alpha_length: usize,
}

/// `gencoinprivate` request data
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct DeriveCoinSecretsData {
    #[serde(rename = "CoinsH", with = "b64_vec")]
    pub coin_hashes: Vec<Vec<u8>>,
}

/// `calculatec` request data
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct CalculateChallengeData {
    #[serde(rename = "Rpi", with = "b64_vec")]
    pub rpi: Vec<Vec<u8>>,

    #[serde(rename = "PedComG", with = "b64")]
    pub ped_com_g: Vec<u8>,
}

/// `calculater` request data
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct CalculateResponsesData {
    #[serde(rename = "CoinLength")]
    pub coin_length: usize,

    #[serde(rename = "Cpi", with = "b64")]
    pub cpi: Vec<u8>,
}

/// `calculater` reply, response scalars in position order
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(transparent)]
pub struct ResponsesReply(#[serde(with = "b64_vec")] pub Vec<Vec<u8>>);

/// Base64 (standard alphabet) byte fields, `null` decodes as empty
pub(crate) mod b64 {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(v))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(s) => STANDARD.decode(s).map_err(D::Error::custom),
            None => Ok(vec![]),
        }
    }
}

/// Optional base64 fields, `null` or empty values are absent
mod b64_opt {
    use serde::Deserializer;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let v = super::b64::deserialize(d)?;
        Ok((!v.is_empty()).then_some(v))
    }
}

/// Base64 byte lists
mod b64_vec {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{de::Error, ser::SerializeSeq, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &[Vec<u8>], s: S) -> Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(v.len()))?;
        for b in v {
            seq.serialize_element(&STANDARD.encode(b))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<u8>>, D::Error> {
        Option::<Vec<String>>::deserialize(d)?
            .unwrap_or_default()
            .iter()
            .map(|s| STANDARD.decode(s).map_err(D::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn command_names() {
        let tests = [
            ("signschnorr", PeerCommand::SignSchnorr),
            ("sign-schnorr", PeerCommand::SignSchnorr),
            ("genalpha", PeerCommand::GenerateAlpha),
            ("generate-alpha", PeerCommand::GenerateAlpha),
            ("gencoinprivate", PeerCommand::DeriveCoinSecrets),
            ("derive-coin-secrets", PeerCommand::DeriveCoinSecrets),
            ("calculatec", PeerCommand::CalculateChallenge),
            ("calculate-challenge", PeerCommand::CalculateChallenge),
            ("calculater", PeerCommand::CalculateResponses),
            ("calculate-responses", PeerCommand::CalculateResponses),
            ("result", PeerCommand::Result),
            ("reticulate", PeerCommand::Unknown("reticulate".to_string())),
        ];

        for (name, cmd) in tests {
            let m = PeerMessage {
                cmd: name.to_string(),
                data: vec![],
            };
            assert_eq!(m.command(), cmd, "command: {name}");
        }
    }

    #[test]
    fn decode_envelope() {
        let m: PeerMessage = serde_json::from_str(r#"{"Cmd":"result","Data":"AQID"}"#).unwrap();
        assert_eq!(m.command(), PeerCommand::Result);
        assert_eq!(m.data, vec![1, 2, 3]);

        let m: PeerMessage = serde_json::from_str(r#"{"Cmd":"genalpha","Data":null}"#).unwrap();
        assert!(m.data.is_empty());
    }

    #[test]
    fn decode_sign_schnorr() {
        let d: SignSchnorrData = serde_json::from_str(
            r#"{"PedRandom":null,"PedPrivate":"AQ==","Randomness":"AgI=","Message":"Aw=="}"#,
        )
        .unwrap();

        assert_eq!(d.ped_random, None);
        assert_eq!(d.ped_private, vec![1]);
        assert_eq!(d.randomness, Some(vec![2, 2]));
        assert_eq!(d.message, vec![3]);
    }

    #[test]
    fn decode_calculate_challenge() {
        let d: CalculateChallengeData =
            serde_json::from_str(r#"{"Rpi":["QUE=","QkI="],"PedComG":"R0c="}"#).unwrap();

        assert_eq!(d.rpi, vec![b"AA".to_vec(), b"BB".to_vec()]);
        assert_eq!(d.ped_com_g, b"GG".to_vec());
    }

    #[test]
    fn encode_responses() {
        let r = ResponsesReply(vec![vec![1, 2, 3], vec![0xff]]);

        assert_eq!(serde_json::to_string(&r).unwrap(), r#"["AQID","/w=="]"#);
    }
}
