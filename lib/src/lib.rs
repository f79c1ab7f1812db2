// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Ledger Incognito API Library (and CLI)
//!
//! Provides device discovery and connection ([LedgerProvider], [Connect]),
//! typed device operations ([DeviceHandle]), the remote ring-signature relay
//! ([ring::RingSession]) and the key-image decryption batch
//! ([key_image::sync_key_images]).

use std::fmt::Debug;

use async_trait::async_trait;

#[cfg(feature = "transport_hid")]
use hidapi::HidApi;

/// Re-export transports for consumer use
pub mod transport;
use transport::*;

/// Re-export `incognito-ledger-apdu` for consumers
pub use incognito_ledger_apdu::{self as apdu};

mod handle;
pub use handle::DeviceHandle;

mod error;
pub use error::{Error, Status};

pub mod config;
pub use config::{Config, DaemonConfig, DeviceConfig};

pub mod daemon;
pub mod key_image;
pub mod ring;

/// Ledger provider manages ledger devices and connections
pub struct LedgerProvider {
    #[cfg(feature = "transport_hid")]
    hid_api: HidApi,
    device_config: DeviceConfig,
}

/// Device discovery filter
#[derive(Copy, Clone, Debug, PartialEq, clap::ValueEnum, strum::Display)]
#[non_exhaustive]
pub enum Filter {
    /// List all devices available using supported transport
    Any,
    /// List only HID devices
    Hid,
    /// List only TCP devices
    Tcp,
}

/// Ledger device information for listing, used by connect
#[derive(Clone, Debug)]
pub enum LedgerInfo {
    #[cfg(feature = "transport_hid")]
    Hid(hidapi::DeviceInfo),
    #[cfg(feature = "transport_tcp")]
    Tcp(TcpOptions),
}

impl LedgerProvider {
    /// Create a new ledger provider, handles are created with the provided device configuration
    /// NOTE: only one provider may exist at a time (workaround for global HID context errors on macos/m1)
    pub fn new(device_config: DeviceConfig) -> Result<Self, Error> {
        Ok(Self {
            #[cfg(feature = "transport_hid")]
            hid_api: HidApi::new()?,
            device_config,
        })
    }

    /// List available ledger devices, failing with [Error::NoDevice] where none are found
    pub async fn list_devices(&self, filter: Filter) -> Result<Vec<LedgerInfo>, Error> {
        let mut devices = vec![];

        #[cfg(feature = "transport_hid")]
        if filter == Filter::Any || filter == Filter::Hid {
            TransportHid::list_ledgers(&self.hid_api)
                .cloned()
                .for_each(|d| {
                    devices.push(LedgerInfo::Hid(d));
                });
        }

        #[cfg(feature = "transport_tcp")]
        if filter == Filter::Any || filter == Filter::Tcp {
            // Try connecting to default speculos port
            let o = TcpOptions::default();
            if let Ok(_t) = tokio::net::TcpStream::connect(o.socket_addr()).await {
                // Return default port if connection succeeded
                devices.push(LedgerInfo::Tcp(o));
            };
        }

        log::debug!("Found {} devices: {:?}", devices.len(), devices);

        if devices.is_empty() {
            return Err(Error::NoDevice);
        }

        Ok(devices)
    }
}

/// Generic ledger device handle (abstract over transport types)
pub type GenericHandle = DeviceHandle<GenericTransport>;

impl std::fmt::Display for LedgerInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "transport_hid")]
            LedgerInfo::Hid(hid_info) => {
                write!(
                    f,
                    "{:16} (USB, {:04x}:{:04x}, {})",
                    hid_info.product_string().unwrap_or("UNKNOWN"),
                    hid_info.vendor_id(),
                    hid_info.product_id(),
                    hid_info.serial_number().unwrap_or("UNKNOWN"),
                )
            }
            #[cfg(feature = "transport_tcp")]
            LedgerInfo::Tcp(tcp_info) => {
                write!(
                    f,
                    "{:16} (TCP, {}:{})",
                    "Speculos", tcp_info.addr, tcp_info.port
                )
            }
        }
    }
}

/// Connect trait for supported transports
#[async_trait]
pub trait Connect<T: Transport> {
    type Options: Debug;

    /// Connect to the specified device
    async fn connect(&self, opts: &Self::Options) -> Result<DeviceHandle<T>, Error>;
}

/// Generic connect implementation
#[cfg(any(feature = "transport_hid", feature = "transport_tcp"))]
#[async_trait]
impl Connect<GenericTransport> for LedgerProvider {
    type Options = LedgerInfo;

    async fn connect(&self, opts: &Self::Options) -> Result<DeviceHandle<GenericTransport>, Error> {
        let t = match opts {
            #[cfg(feature = "transport_hid")]
            LedgerInfo::Hid(hid_info) => {
                let t = TransportHid::open_device(&self.hid_api, hid_info)?;
                GenericTransport::Hid(t)
            }
            #[cfg(feature = "transport_tcp")]
            LedgerInfo::Tcp(tcp_info) => {
                let t = TransportTcp::new(tcp_info.clone()).await?;
                GenericTransport::Tcp(t)
            }
        };

        Ok(DeviceHandle::new(t, &self.device_config))
    }
}

/// Connect implementation for HID devices
#[cfg(feature = "transport_hid")]
#[async_trait]
impl Connect<TransportHid> for LedgerProvider {
    type Options = hidapi::DeviceInfo;

    async fn connect(&self, opts: &Self::Options) -> Result<DeviceHandle<TransportHid>, Error> {
        let t = TransportHid::open_device(&self.hid_api, opts)?;

        Ok(DeviceHandle::new(t, &self.device_config))
    }
}

/// Connect implementation for TCP devices
#[cfg(feature = "transport_tcp")]
#[async_trait]
impl Connect<TransportTcp> for LedgerProvider {
    type Options = TcpOptions;

    async fn connect(&self, opts: &Self::Options) -> Result<DeviceHandle<TransportTcp>, Error> {
        let t = TransportTcp::new(opts.clone()).await?;

        Ok(DeviceHandle::new(t, &self.device_config))
    }
}
