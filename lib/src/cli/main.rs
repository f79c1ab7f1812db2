// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Command line utility for interacting with the Ledger Incognito app
//! and the local balance daemon

use anyhow::Context;
use clap::Parser;
use log::{debug, info, LevelFilter};

use incognito_ledger::{
    daemon::{DaemonClient, ImportAccount},
    key_image::sync_key_images,
    ring::{RingSession, SessionOutcome, WsChannel},
    transport::{GenericTransport, Transport},
    Config, Connect, DeviceHandle, Filter, LedgerProvider,
};

mod helpers;
use helpers::*;

/// Ledger command line utility
#[derive(Clone, PartialEq, Debug, Parser)]
struct Options {
    /// Supported transports for ledger discovery
    #[clap(long, value_enum, default_value = "any")]
    target: Filter,

    /// Device index (where more than one device is available)
    #[clap(long, default_value = "0")]
    device_index: usize,

    #[clap(flatten)]
    config: Config,

    /// Subcommand to execute
    #[clap(subcommand)]
    cmd: Actions,

    /// Enable verbose logging
    #[clap(long, default_value = "info")]
    log_level: LevelFilter,
}

#[derive(Clone, PartialEq, Debug, Parser)]
#[non_exhaustive]
enum Actions {
    /// List available devices
    List,

    /// Fetch application version
    Version,

    /// Fetch payment address
    Address,

    /// Export private key, written to stdout rather than the log
    PrivateKey {
        /// Account index
        #[clap(long, default_value = "0")]
        index: u32,
    },

    /// Export view key
    ViewKey,

    /// Export one-time-address key
    OtaKey,

    /// Export validator key
    ValidatorKey,

    /// Import a hex encoded private key
    ImportKey {
        #[clap(long)]
        key: HexBytes,
    },

    /// Establish host trust
    Trust,

    /// Decrypt a single key image
    KeyImage {
        /// Hex encoded coin public key
        #[clap(long)]
        coin_public_key: String,

        /// Hex encoded encrypted key image
        #[clap(long)]
        encrypted: String,
    },

    /// List daemon accounts
    Accounts,

    /// Fetch account balance
    Balance {
        #[clap(long)]
        account: String,
    },

    /// Import a view-only account to the daemon
    ImportAccount {
        #[clap(long)]
        name: String,

        #[clap(long)]
        payment_address: String,

        #[clap(long)]
        ota_key: String,

        #[clap(long)]
        view_key: String,

        #[clap(long, default_value = "0")]
        beacon_height: u64,
    },

    /// Decrypt and submit pending key images for an account
    SyncKeyImages {
        #[clap(long)]
        account: String,
    },

    /// Relay a transaction signing session between the daemon and the device
    CreateTx {
        /// Transaction request file
        #[clap(long)]
        input: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Options::parse();

    // Setup logging
    let log_cfg = simplelog::ConfigBuilder::new()
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .add_filter_ignore_str("rustls")
        .add_filter_ignore_str("tungstenite")
        .add_filter_ignore_str("tokio_tungstenite")
        .build();
    let _ = simplelog::SimpleLogger::init(args.log_level, log_cfg);

    // Errors are reported once, by the returned result
    run(args).await
}

async fn run(args: Options) -> anyhow::Result<()> {
    let daemon = DaemonClient::new(&args.config.daemon);

    // Handle daemon-only commands
    match &args.cmd {
        Actions::Accounts => {
            let accounts = daemon.account_list().await?;

            info!("Accounts:");
            for (name, addr) in accounts {
                info!("  {}: {}", name, addr);
            }

            return Ok(());
        }
        Actions::Balance { account } => {
            let b = daemon.balance(account).await?;

            info!("address: {}", b.address);
            for (asset, v) in b.balance {
                info!("  {}: {}", asset, v);
            }

            return Ok(());
        }
        Actions::ImportAccount {
            name,
            payment_address,
            ota_key,
            view_key,
            beacon_height,
        } => {
            let req = ImportAccount {
                account_name: name.clone(),
                payment_address: payment_address.clone(),
                ota_key: ota_key.clone(),
                view_key: view_key.clone(),
                beacon_height: *beacon_height,
            };

            daemon.import_account(&req).await?;

            info!("Imported account '{}'", name);

            return Ok(());
        }
        _ => (),
    }

    // Connect to ledger device
    let p = LedgerProvider::new(args.config.device.clone())?;

    debug!("Using transport: {:?}", args.target);

    // List available devices
    let devices = p.list_devices(args.target).await?;

    // Handle list command
    if args.cmd == Actions::List {
        info!("Devices:");
        for (i, d) in devices.iter().enumerate() {
            info!("  {}: {}", i, d);
        }

        return Ok(());
    }

    // Select device by index
    let d = devices.get(args.device_index).ok_or_else(|| {
        anyhow::anyhow!(
            "Invalid device index: {} (max: {})",
            args.device_index,
            devices.len() - 1
        )
    })?;

    debug!("Using device {}: {}", args.device_index, d);

    // Connect to device
    let t = Connect::<GenericTransport>::connect(&p, d)
        .await
        .with_context(|| format!("Failed to connect to device: {d}"))?;

    // Execute command
    execute(t, &daemon, &args.config, args.cmd).await
}

/// Execute a device command with the provided handle
async fn execute<T: Transport>(
    t: DeviceHandle<T>,
    daemon: &DaemonClient,
    config: &Config,
    cmd: Actions,
) -> anyhow::Result<()> {
    debug!("Executing command: {:?}", cmd);

    match cmd {
        Actions::Version => {
            let v = t.version().await?;
            info!("app version: {}", v);
        }
        Actions::Address => {
            let a = t.address().await?;
            info!("payment address: {}", a);
        }
        Actions::PrivateKey { index } => {
            // Secret material goes to stdout only, never to the log
            let k = t.private_key(index).await?;
            println!("{}", k.as_str());
        }
        Actions::ViewKey => {
            let k = t.view_key().await?;
            info!("view key: {}", hex::encode(k));
        }
        Actions::OtaKey => {
            let k = t.ota_key().await?;
            info!("OTA key: {}", hex::encode(k));
        }
        Actions::ValidatorKey => {
            let k = t.validator_key().await?;
            info!("validator key: {}", hex::encode(k));
        }
        Actions::ImportKey { key } => {
            t.import_key(key.as_ref()).await?;
            info!("key imported");
        }
        Actions::Trust => {
            t.trust_host().await?;
            info!("host trusted");
        }
        Actions::KeyImage {
            coin_public_key,
            encrypted,
        } => {
            t.trust_host().await?;

            let k = t.decrypt_key_image(&coin_public_key, &encrypted).await?;
            info!("key image: {}", k);
        }
        Actions::SyncKeyImages { account } => {
            let n = sync_key_images(&t, daemon, &account).await?;
            info!("synced {} key images for account '{}'", n, account);
        }
        Actions::CreateTx { input } => {
            let tx = read_input(&input).await?;

            let peer = WsChannel::connect(&config.daemon).await?;
            let session = RingSession::new(t, peer, &config.device);

            // Cancel on interrupt
            let cancel = async {
                if tokio::signal::ctrl_c().await.is_err() {
                    std::future::pending::<()>().await
                }
            };

            match session.run(tx, cancel).await? {
                SessionOutcome::Completed(r) => {
                    info!("result: {}", String::from_utf8_lossy(&r));
                    debug!("result (hex): {}", hex::encode(&r));
                }
                SessionOutcome::Cancelled => info!("transaction cancelled"),
            }
        }
        _ => unreachable!(),
    }

    Ok(())
}
