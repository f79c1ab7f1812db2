// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Key-image decryption batch
//!
//! Encrypted key images are fetched from the balance service grouped by asset
//! then coin public key, decrypted one at a time on the device, and submitted
//! back as complete per-asset sets. Iteration order within the set carries no
//! meaning.

use std::collections::BTreeMap;

use async_trait::async_trait;
use log::{debug, info};

use crate::{transport::Transport, DeviceHandle, Error};

/// Hex-encoded key images keyed by asset id then coin public key
pub type KeyImageMap = BTreeMap<String, BTreeMap<String, String>>;

/// Balance service operations used by the batch
#[async_trait]
pub trait BalanceService: Send + Sync {
    /// Fetch encrypted key images for the provided account
    async fn encrypted_key_images(&self, account: &str) -> Result<KeyImageMap, Error>;

    /// Submit decrypted key images for a single asset
    async fn submit_key_images(
        &self,
        account: &str,
        asset_id: &str,
        key_images: &BTreeMap<String, String>,
    ) -> Result<(), Error>;
}

/// Key image for a single coin
#[derive(Clone, PartialEq, Debug)]
pub struct KeyImageEntry {
    pub asset_id: String,
    pub coin_public_key: String,
    pub encrypted_key_image: String,
    pub decrypted_key_image: Option<String>,
}

/// Key images grouped by asset id then coin public key
#[derive(Clone, PartialEq, Debug, Default)]
pub struct KeyImageSet {
    assets: BTreeMap<String, BTreeMap<String, KeyImageEntry>>,
}

impl KeyImageSet {
    /// Build a set of pending entries from encrypted key images
    pub fn from_encrypted(encrypted: KeyImageMap) -> Self {
        let assets = encrypted
            .into_iter()
            .map(|(asset_id, coins)| {
                let entries = coins
                    .into_iter()
                    .map(|(coin_public_key, encrypted_key_image)| {
                        let e = KeyImageEntry {
                            asset_id: asset_id.clone(),
                            coin_public_key: coin_public_key.clone(),
                            encrypted_key_image,
                            decrypted_key_image: None,
                        };
                        (coin_public_key, e)
                    })
                    .collect();
                (asset_id, entries)
            })
            .collect();

        Self { assets }
    }

    /// Total number of entries across assets
    pub fn len(&self) -> usize {
        self.assets.values().map(|c| c.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Asset ids in the set
    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.assets.keys().map(|a| a.as_str())
    }

    /// Mutable iterator over all entries
    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut KeyImageEntry> {
        self.assets.values_mut().flat_map(|c| c.values_mut())
    }

    /// Decrypted key images for an asset, `None` unless every entry is decrypted
    pub fn decrypted(&self, asset_id: &str) -> Option<BTreeMap<String, String>> {
        self.assets.get(asset_id)?
            .values()
            .map(|e| {
                e.decrypted_key_image
                    .clone()
                    .map(|k| (e.coin_public_key.clone(), k))
            })
            .collect()
    }
}

/// Decrypt and resubmit all pending key images for an account, returning the
/// number of coins submitted
///
/// Host trust is established once before decryption. Any decryption failure
/// aborts the batch before submission so no partial asset sets are sent.
pub async fn sync_key_images<T: Transport, B: BalanceService>(
    device: &DeviceHandle<T>,
    service: &B,
    account: &str,
) -> Result<usize, Error> {
    let mut set = KeyImageSet::from_encrypted(service.encrypted_key_images(account).await?);

    if set.is_empty() {
        info!("No key images pending for account '{}'", account);
        return Ok(0);
    }

    info!(
        "Decrypting {} key images for account '{}'",
        set.len(),
        account
    );

    device.trust_host().await?;

    for e in set.entries_mut() {
        let k = device
            .decrypt_key_image(&e.coin_public_key, &e.encrypted_key_image)
            .await?;

        debug!("Decrypted key image for {}:{}", e.asset_id, e.coin_public_key);

        e.decrypted_key_image = Some(k);
    }

    let mut submitted = 0;
    for asset_id in set.assets() {
        let key_images = set
            .decrypted(asset_id)
            .ok_or(Error::ProtocolViolation("incomplete key image set"))?;

        service
            .submit_key_images(account, asset_id, &key_images)
            .await?;

        submitted += key_images.len();
    }

    info!("Submitted {} key images", submitted);

    Ok(submitted)
}
