// Copyright (c) 2022-2023 The MobileCoin Foundation

use std::path::Path;

use log::debug;
use zeroize::Zeroize;

/// Variable length hex argument, cleared on drop
#[derive(Clone, PartialEq, Debug)]
pub struct HexBytes(pub Vec<u8>);

impl std::str::FromStr for HexBytes {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        hex::decode(s.trim_start_matches("0x")).map(HexBytes)
    }
}

impl AsRef<[u8]> for HexBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Drop for HexBytes {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Read the initial transaction payload, `.json` inputs are validated before use
pub async fn read_input(file_name: &str) -> anyhow::Result<Vec<u8>> {
    debug!("Reading input from '{}'", file_name);

    let b = tokio::fs::read(file_name).await?;

    if let Some("json") = Path::new(file_name).extension().and_then(|e| e.to_str()) {
        let _: serde_json::Value = serde_json::from_slice(&b)?;
    }

    Ok(b)
}
