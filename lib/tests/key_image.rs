// Copyright (c) 2022-2023 The MobileCoin Foundation

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use incognito_ledger::{
    apdu::Instruction,
    key_image::{sync_key_images, BalanceService, KeyImageMap},
    Error, Status,
};

mod helpers;
use helpers::*;

/// Balance service mock recording submissions
#[derive(Default)]
struct MockService {
    pending: KeyImageMap,
    submitted: Arc<Mutex<Vec<(String, String, BTreeMap<String, String>)>>>,
}

impl MockService {
    fn new(entries: &[(&str, &str, &str)]) -> Self {
        let mut pending = KeyImageMap::new();
        for (asset, coin, encrypted) in entries {
            pending
                .entry(asset.to_string())
                .or_default()
                .insert(coin.to_string(), encrypted.to_string());
        }

        Self {
            pending,
            ..Default::default()
        }
    }
}

#[async_trait]
impl BalanceService for MockService {
    async fn encrypted_key_images(&self, _account: &str) -> Result<KeyImageMap, Error> {
        Ok(self.pending.clone())
    }

    async fn submit_key_images(
        &self,
        account: &str,
        asset_id: &str,
        key_images: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        self.submitted.lock().unwrap().push((
            account.to_string(),
            asset_id.to_string(),
            key_images.clone(),
        ));
        Ok(())
    }
}

#[tokio::test]
async fn sync_two_assets() {
    setup_logging();

    // Decrypted image is the encrypted image with the high bit set
    let (d, log) = MockTransport::handle(|r| match r.ins {
        i if i == Instruction::KeyImage as u8 => Ok(vec![r.payload[0] | 0x80]),
        _ => Ok(vec![]),
    });

    let s = MockService::new(&[("asset-a", "aa", "01"), ("asset-b", "bb", "02")]);

    let n = sync_key_images(&d, &s, "alice").await.unwrap();
    assert_eq!(n, 2);

    // Trust once, then one decrypt per entry
    let c = log.commands();
    assert_eq!(c.len(), 3);
    assert_eq!(c[0].ins, Instruction::TrustHost as u8);
    assert_eq!(c[1].ins, Instruction::KeyImage as u8);
    assert_eq!(c[2].ins, Instruction::KeyImage as u8);

    let submitted = s.submitted.lock().unwrap();
    assert_eq!(
        *submitted,
        vec![
            (
                "alice".to_string(),
                "asset-a".to_string(),
                BTreeMap::from([("aa".to_string(), "81".to_string())])
            ),
            (
                "alice".to_string(),
                "asset-b".to_string(),
                BTreeMap::from([("bb".to_string(), "82".to_string())])
            ),
        ]
    );
}

#[tokio::test]
async fn decrypt_failure_aborts_before_submission() {
    setup_logging();

    // Fail decryption of the second asset's coin
    let (d, _log) = MockTransport::handle(|r| match r.ins {
        i if i == Instruction::KeyImage as u8 && r.payload[0] == 0x02 => {
            Err(Error::Status(Status::from(0x6a80)))
        }
        i if i == Instruction::KeyImage as u8 => Ok(vec![0xff]),
        _ => Ok(vec![]),
    });

    let s = MockService::new(&[("asset-a", "aa", "01"), ("asset-b", "bb", "02")]);

    let r = sync_key_images(&d, &s, "alice").await;

    assert!(matches!(r, Err(Error::Status(_))));
    assert!(s.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn trust_failure_is_fatal() {
    setup_logging();

    let (d, log) = MockTransport::handle(|_| Err(Error::Status(Status::from(0x6985))));
    let s = MockService::new(&[("asset-a", "aa", "01")]);

    assert!(sync_key_images(&d, &s, "alice").await.is_err());

    assert_eq!(log.len(), 1);
    assert!(s.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn nothing_pending() {
    setup_logging();

    let (d, log) = MockTransport::handle(|_| Ok(vec![]));
    let s = MockService::new(&[]);

    assert_eq!(sync_key_images(&d, &s, "alice").await.unwrap(), 0);
    assert_eq!(log.len(), 0);
}
