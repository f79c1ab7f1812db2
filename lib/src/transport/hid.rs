// Copyright (c) 2022-2023 The MobileCoin Foundation

//! USB HID transport
//!
//! Wraps [TransportNativeHID], running the blocking hidapi exchange on the
//! blocking thread pool so request timeouts and session cancellation are
//! not held up by a device awaiting user interaction.

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use hidapi::{DeviceInfo, HidApi};
use ledger_transport_hid::TransportNativeHID;
use log::debug;
use zeroize::Zeroize;

use super::{APDUAnswer, APDUCommand, Exchange};
use crate::Error;

/// Native HID transport for Ledger devices
#[derive(Clone)]
pub struct TransportHid {
    t: Arc<TransportNativeHID>,
}

impl TransportHid {
    /// List available ledger devices
    pub fn list_ledgers(api: &HidApi) -> impl Iterator<Item = &DeviceInfo> {
        TransportNativeHID::list_ledgers(api)
    }

    /// Open the provided device
    pub fn open_device(api: &HidApi, info: &DeviceInfo) -> Result<Self, Error> {
        debug!(
            "Opening HID device {:04x}:{:04x} ({:?})",
            info.vendor_id(),
            info.product_id(),
            info.path()
        );

        let t = TransportNativeHID::open_device(api, info)?;

        Ok(Self { t: Arc::new(t) })
    }
}

#[async_trait]
impl Exchange for TransportHid {
    type Error = Error;
    type AnswerType = Vec<u8>;

    async fn exchange<I>(
        &self,
        command: &APDUCommand<I>,
    ) -> Result<APDUAnswer<Self::AnswerType>, Self::Error>
    where
        I: Deref<Target = [u8]> + Send + Sync,
    {
        let t = self.t.clone();
        let mut cmd = APDUCommand {
            cla: command.cla,
            ins: command.ins,
            p1: command.p1,
            p2: command.p2,
            data: command.data.to_vec(),
        };

        let r = tokio::task::spawn_blocking(move || {
            let r = TransportNativeHID::exchange(&t, &cmd);
            cmd.data.zeroize();
            r
        })
        .await
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

        Ok(r?)
    }
}
