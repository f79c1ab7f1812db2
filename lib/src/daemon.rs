// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Balance daemon HTTP client

use std::collections::BTreeMap;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    config::DaemonConfig,
    key_image::{BalanceService, KeyImageMap},
    Error,
};

/// Account balance by asset id
#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountBalance {
    pub address: String,
    #[serde(default)]
    pub balance: BTreeMap<String, u64>,
}

/// Account import request
#[derive(Clone, PartialEq, Debug, Serialize)]
pub struct ImportAccount {
    #[serde(rename = "AccountName")]
    pub account_name: String,
    #[serde(rename = "PaymentAddress")]
    pub payment_address: String,
    #[serde(rename = "OTAKey")]
    pub ota_key: String,
    #[serde(rename = "Viewkey")]
    pub view_key: String,
    #[serde(rename = "BeaconHeight")]
    pub beacon_height: u64,
}

/// Key image submission request
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SubmitKeyImages<'a> {
    account: &'a str,
    keyimages: BTreeMap<&'a str, &'a BTreeMap<String, String>>,
}

/// Balance daemon client
#[derive(Clone, Debug)]
pub struct DaemonClient {
    client: Client,
    base: String,
}

impl DaemonClient {
    pub fn new(cfg: &DaemonConfig) -> Self {
        Self {
            client: Client::new(),
            base: cfg.http_url(),
        }
    }

    /// List known accounts (name to payment address)
    pub async fn account_list(&self) -> Result<BTreeMap<String, String>, Error> {
        self.get("getaccountlist", &[]).await
    }

    /// Fetch balances for an account
    pub async fn balance(&self, account: &str) -> Result<AccountBalance, Error> {
        self.get("getbalance", &[("account", account)]).await
    }

    /// Import a view-only account
    pub async fn import_account(&self, req: &ImportAccount) -> Result<(), Error> {
        self.post("importaccount", req).await
    }

    async fn get<R: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<R, Error> {
        let url = format!("{}/{}", self.base, path);

        debug!("GET {} {:?}", url, query);

        let r = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(r)
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), Error> {
        let url = format!("{}/{}", self.base, path);

        debug!("POST {}", url);

        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;

        debug!("POST {} status: {}", url, resp.status());

        Ok(())
    }
}

#[async_trait]
impl BalanceService for DaemonClient {
    async fn encrypted_key_images(&self, account: &str) -> Result<KeyImageMap, Error> {
        self.get("getcoinstodecrypt", &[("account", account)]).await
    }

    async fn submit_key_images(
        &self,
        account: &str,
        asset_id: &str,
        key_images: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        let req = SubmitKeyImages {
            account,
            keyimages: BTreeMap::from([(asset_id, key_images)]),
        };

        self.post("submitkeyimages", &req).await
    }
}
