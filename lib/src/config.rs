// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Runtime configuration, passed explicitly into sessions and clients

use std::time::Duration;

/// Host library configuration
#[derive(Clone, Debug, PartialEq, Default, clap::Args)]
pub struct Config {
    #[clap(flatten)]
    pub daemon: DaemonConfig,

    #[clap(flatten)]
    pub device: DeviceConfig,
}

/// Balance daemon connection configuration
#[derive(Clone, Debug, PartialEq, clap::Args)]
pub struct DaemonConfig {
    /// Balance daemon `host:port` (HTTP API and transaction websocket)
    #[clap(long = "daemon-addr", env = "INCOGNITO_DAEMON_ADDR", default_value = "127.0.0.1:9000")]
    pub addr: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9000".to_string(),
        }
    }
}

impl DaemonConfig {
    /// Base URL for HTTP requests
    pub fn http_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Websocket URL for transaction creation sessions
    pub fn createtx_url(&self) -> String {
        format!("ws://{}/createtx", self.addr)
    }
}

/// Device session configuration
#[derive(Clone, Debug, PartialEq, clap::Args)]
pub struct DeviceConfig {
    /// Device request timeout in seconds, operations may await user confirmation
    #[clap(long = "request-timeout", default_value = "30")]
    pub request_timeout_s: u64,

    /// Close handshake wait in milliseconds when cancelling a session
    #[clap(long = "close-timeout", default_value = "1000")]
    pub close_timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            request_timeout_s: 30,
            close_timeout_ms: 1000,
        }
    }
}

impl DeviceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_s)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }
}
