// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Handle for connected ledger devices
//!
//! This provides one method per device operation and is generic over
//! [Transport] implementations. Transport access is serialised via an internal
//! mutex, multi-exchange operations hold the lock for their full sequence.
//!
//! An exchange that is abandoned before the transport returns (request
//! timeout, or the calling future being dropped) leaves a late response
//! pending on the link. The handle is then unusable and every subsequent
//! request fails with [Error::Desynchronised].

use std::{sync::Arc, time::Duration};

use encdec::Decode;
use log::{debug, error};
use tokio::sync::Mutex;
use zeroize::Zeroizing;

use incognito_ledger_apdu::{prelude::*, MAX_PAYLOAD_LEN, SCALAR_LEN};

use crate::{
    config::DeviceConfig,
    error::Status,
    transport::{Exchange, Transport},
    Error,
};

/// Incognito handle for a connected ledger device.
///
/// This is generic over [Transport] types to support different
/// underlying transports
pub struct DeviceHandle<T: Transport> {
    /// Transport link, one command in flight at a time
    link: Arc<Mutex<Link<T>>>,
    /// Timeout for APDU requests
    request_timeout: Duration,
}

/// Transport with exchange tracking
struct Link<T> {
    t: T,
    /// Set while an exchange is outstanding, remains set if abandoned
    in_flight: bool,
}

impl<T: Transport> Clone for DeviceHandle<T> {
    fn clone(&self) -> Self {
        Self {
            link: self.link.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

/// Create a [DeviceHandle] wrapper from a type implementing [Transport]
impl<T: Transport> From<T> for DeviceHandle<T> {
    fn from(t: T) -> Self {
        Self::new(t, &DeviceConfig::default())
    }
}

impl<T: Transport> DeviceHandle<T> {
    /// Create a device handle with the provided configuration
    pub fn new(t: T, cfg: &DeviceConfig) -> Self {
        Self {
            link: Arc::new(Mutex::new(Link {
                t,
                in_flight: false,
            })),
            request_timeout: cfg.request_timeout(),
        }
    }

    /// Fetch application version
    pub async fn version(&self) -> Result<VersionResp, Error> {
        debug!("Requesting app version");

        let mut l = self.link.lock().await;
        let resp = self.request(&mut l, &VersionReq).await?;

        decode::<VersionResp>(&resp, "version must be 3 bytes")
    }

    /// Fetch payment address
    pub async fn address(&self) -> Result<String, Error> {
        debug!("Requesting payment address");

        let mut l = self.link.lock().await;
        let resp = self.request(&mut l, &AddressReq).await?;
        let r = decode::<DataResp>(&resp, "empty address")?;

        String::from_utf8(r.data.to_vec())
            .map_err(|_| Error::ProtocolViolation("address is not valid UTF-8"))
    }

    /// Export the private key for the provided account index
    pub async fn private_key(&self, account_index: u32) -> Result<Zeroizing<String>, Error> {
        debug!("Requesting private key for account: {}", account_index);

        let mut l = self.link.lock().await;
        let resp = Zeroizing::new(
            self.request(&mut l, &PrivateKeyReq::new(account_index))
                .await?,
        );
        let r = decode::<DataResp>(&resp, "empty private key")?;

        let k = std::str::from_utf8(r.data)
            .map_err(|_| Error::ProtocolViolation("private key is not valid UTF-8"))?;

        Ok(Zeroizing::new(k.to_string()))
    }

    /// Export the view key
    pub async fn view_key(&self) -> Result<Vec<u8>, Error> {
        debug!("Requesting view key");
        self.export(&ViewKeyReq, "empty view key").await
    }

    /// Export the one-time-address key
    pub async fn ota_key(&self) -> Result<Vec<u8>, Error> {
        debug!("Requesting OTA key");
        self.export(&OtaKeyReq, "empty OTA key").await
    }

    /// Export the validator key
    pub async fn validator_key(&self) -> Result<Vec<u8>, Error> {
        debug!("Requesting validator key");
        self.export(&ValidatorKeyReq, "empty validator key").await
    }

    /// Import a serialized private key
    pub async fn import_key(&self, key: &[u8]) -> Result<(), Error> {
        debug!("Importing private key ({} bytes)", key.len());

        let mut l = self.link.lock().await;
        self.request(&mut l, &ImportKeyReq::new(key)).await?;

        Ok(())
    }

    /// Establish host trust, required before operations on secret-derived material
    pub async fn trust_host(&self) -> Result<(), Error> {
        debug!("Requesting host trust");

        let mut l = self.link.lock().await;
        self.request(&mut l, &TrustHostReq).await?;

        Ok(())
    }

    /// Decrypt a key image for the provided coin, arguments and result are hex encoded
    pub async fn decrypt_key_image(
        &self,
        coin_public_key: &str,
        encrypted_key_image: &str,
    ) -> Result<String, Error> {
        let encrypted = hex::decode(encrypted_key_image)?;
        let coin = hex::decode(coin_public_key)?;

        debug!("Decrypting key image for coin: {}", coin_public_key);

        let mut l = self.link.lock().await;
        let resp = self
            .request(&mut l, &KeyImageReq::new(&encrypted, &coin))
            .await?;
        let r = decode::<KeyImageResp>(&resp, "empty key image")?;

        Ok(hex::encode(r.key_image))
    }

    /// Generate `count` blinding scalars
    pub async fn generate_alpha(&self, count: usize) -> Result<Vec<[u8; SCALAR_LEN]>, Error> {
        let n = u8::try_from(count).map_err(|_| Error::InvalidArgument("alpha count > 255"))?;

        debug!("Generating {} alpha values", count);

        let mut l = self.link.lock().await;
        let resp = self.request(&mut l, &GenAlphaReq::new(n)).await?;
        let r = decode::<AlphaResp>(&resp, "alpha length not a multiple of 32")?;

        if r.len() != count {
            return Err(Error::ProtocolViolation("alpha count mismatch"));
        }

        Ok(r.scalars().collect())
    }

    /// Compute the first ring challenge
    ///
    /// Positions `0..n-1` are issued with their partial commitments, the
    /// final position `n-1` is flagged as last and carries the closing base
    /// point in place of its commitment. Returns the concatenated partial
    /// challenges in position order.
    pub async fn calculate_challenge<R: AsRef<[u8]>>(
        &self,
        rpi: &[R],
        closing_base: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let last = match rpi.len() {
            0 => return Err(Error::InvalidArgument("empty ring")),
            n if n > 256 => return Err(Error::InvalidArgument("ring size > 256")),
            n => n - 1,
        };

        debug!("Calculating challenge for ring of {}", rpi.len());

        let mut l = self.link.lock().await;
        let mut challenge = vec![];

        for (i, r) in rpi[..last].iter().enumerate() {
            let resp = self
                .request(&mut l, &ChallengeReq::new(i as u8, false, r.as_ref()))
                .await?;
            let r = decode::<DataResp>(&resp, "empty challenge")?;

            debug!("Challenge position {} complete", i);

            challenge.extend_from_slice(r.data);
        }

        // Close the ring
        let resp = self
            .request(&mut l, &ChallengeReq::new(last as u8, true, closing_base))
            .await?;
        let r = decode::<DataResp>(&resp, "empty challenge")?;
        challenge.extend_from_slice(r.data);

        Ok(challenge)
    }

    /// Compute response scalars for `count` coin positions, index aligned with position
    pub async fn calculate_responses(
        &self,
        count: usize,
        challenge: &[u8],
    ) -> Result<Vec<Vec<u8>>, Error> {
        if count > 256 {
            return Err(Error::InvalidArgument("coin count > 256"));
        }

        debug!("Calculating {} responses", count);

        let mut l = self.link.lock().await;
        let mut responses = Vec::with_capacity(count);

        for i in 0..count {
            let resp = self
                .request(&mut l, &ResponseReq::new(i as u8, challenge))
                .await?;
            let r = decode::<DataResp>(&resp, "empty response")?;

            responses.push(r.data.to_vec());
        }

        Ok(responses)
    }

    /// Derive per-coin secrets, the final hash is flagged to fold in the
    /// accumulated randomness secret
    pub async fn derive_coin_secrets<H: AsRef<[u8]>>(&self, coin_hashes: &[H]) -> Result<(), Error> {
        let last = match coin_hashes.len() {
            0 => return Err(Error::InvalidArgument("no coins")),
            n if n > 256 => return Err(Error::InvalidArgument("coin count > 256")),
            n => n - 1,
        };

        debug!("Deriving {} coin secrets", coin_hashes.len());

        let mut l = self.link.lock().await;

        for (i, h) in coin_hashes.iter().enumerate() {
            let req = CoinSecretReq::new(i as u8, i == last, h.as_ref());
            self.request(&mut l, &req).await?;
        }

        Ok(())
    }

    /// Schnorr sign a message digest
    ///
    /// Absent pedersen randomness or nonce values are replaced with 32 zero bytes.
    pub async fn sign_schnorr(
        &self,
        ped_random: Option<&[u8]>,
        ped_private: &[u8],
        nonce: Option<&[u8]>,
        message: &[u8],
    ) -> Result<Vec<u8>, Error> {
        let zero = [0u8; SCALAR_LEN];

        let req = SchnorrSignReq {
            ped_random: ped_random.unwrap_or(&zero),
            ped_private,
            nonce: nonce.unwrap_or(&zero),
            message,
        };

        debug!("Requesting schnorr signature");

        let mut l = self.link.lock().await;
        let resp = self.request(&mut l, &req).await?;
        let r = decode::<DataResp>(&resp, "empty signature")?;

        Ok(r.data.to_vec())
    }

    /// Helper for single-exchange key exports
    async fn export(&self, req: &impl ApduReq, what: &'static str) -> Result<Vec<u8>, Error> {
        let mut l = self.link.lock().await;
        let resp = self.request(&mut l, req).await?;

        decode::<DataResp>(&resp, what).map(|r| r.data.to_vec())
    }

    /// Issue a request with the configured timeout, the caller holds the link lock
    ///
    /// Returns the response payload once the status word is checked.
    async fn request(&self, l: &mut Link<T>, req: &impl ApduReq) -> Result<Vec<u8>, Error> {
        if l.in_flight {
            return Err(Error::Desynchronised);
        }

        let mut buff = Zeroizing::new([0u8; MAX_PAYLOAD_LEN]);
        let cmd = req.command(&mut buff[..])?;

        debug!(
            "Exchange ins: {:#04x} p1: {} p2: {} len: {}",
            cmd.ins,
            cmd.p1,
            cmd.p2,
            cmd.data.len()
        );

        l.in_flight = true;

        let a = match tokio::time::timeout(self.request_timeout, l.t.exchange(&cmd)).await {
            Ok(Ok(a)) => a,
            Ok(Err(e)) => {
                error!("Exchange failed, device link unusable: {}", e);
                return Err(e);
            }
            Err(_) => {
                error!("Exchange timed out, device link unusable");
                return Err(Error::RequestTimeout);
            }
        };

        l.in_flight = false;

        match a.retcode() {
            c if c == StatusCode::Ok as u16 => Ok(a.apdu_data().to_vec()),
            c => Err(Error::Status(Status::from(c))),
        }
    }
}

/// Decode a response object, mapping shape failures to [Error::ProtocolViolation]
fn decode<'a, R>(buff: &'a [u8], what: &'static str) -> Result<R, Error>
where
    R: Decode<'a, Output = R, Error = ApduError>,
{
    R::decode(buff)
        .map(|(r, _n)| r)
        .map_err(|_| Error::ProtocolViolation(what))
}
