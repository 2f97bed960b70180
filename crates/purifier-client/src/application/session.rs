//! Secure session establishment with one appliance.
//!
//! # How does the handshake work? (for beginners)
//!
//! ```text
//! client                                         appliance
//!   │  PUT /di/v1/products/0/security              │
//!   │  {"diffie": "<g^a mod p, hex>"}  ─────────►  │
//!   │                                              │
//!   │  ◄─────────  {"hellman": "<g^b mod p, hex>", │
//!   │               "key": "<wrapped key, hex>"}   │
//! ```
//!
//! 1. The client picks a random 1024-bit exponent `a` and sends `g^a mod p`.
//! 2. The appliance answers with its own public value and with the real
//!    session key, AES-CBC encrypted under a *temporary* key.
//! 3. Both sides compute the shared secret `(g^b)^a = (g^a)^b mod p`; its
//!    first 16 bytes are the temporary key.
//! 4. The client decrypts the wrapped key with the temporary key.  The first
//!    16 bytes of the result are the session key.
//!
//! The two session states are separate types: a [`PendingSession`] can only
//! be turned into a [`SecureSession`] by completing the handshake, and only a
//! `SecureSession` can encrypt or decrypt payloads.

use purifier_core::crypto::cipher::{cbc_decrypt, SessionCipher};
use purifier_core::{
    open_envelope, seal_envelope, ApplianceEndpoint, KeyExchangeParams, KeyExchangeState,
    ProtocolError, SessionKey,
};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::application::transport::{Transport, TransportError};

/// Error type for the handshake.
#[derive(Debug, Error)]
pub enum SessionEstablishError {
    /// The `PUT` to the security endpoint failed.
    #[error("key exchange request failed: {0}")]
    Transport(#[from] TransportError),

    /// The appliance's answer is not JSON or lacks `hellman` / `key`.
    #[error("malformed key exchange response: {0}")]
    MalformedResponse(String),

    /// The peer public value or the wrapped key could not be processed.
    #[error("key exchange failed: {0}")]
    Protocol(#[from] ProtocolError),

    /// The wrapped key is not valid hexadecimal.
    #[error("wrapped session key is not valid hex: {0}")]
    KeyMaterial(String),
}

/// Body of the appliance's key-exchange response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HandshakeResponse {
    /// The appliance's public value, hex.
    pub hellman: String,
    /// The session key encrypted under the temporary key, hex.
    pub key: String,
}

impl HandshakeResponse {
    /// Parses the raw response body.
    pub fn parse(body: &str) -> Result<Self, SessionEstablishError> {
        serde_json::from_str(body)
            .map_err(|e| SessionEstablishError::MalformedResponse(e.to_string()))
    }
}

// ── PendingSession ────────────────────────────────────────────────────────────

/// A session whose handshake has not completed yet.
///
/// Holds the private exponent for exactly one handshake; it is consumed by
/// [`PendingSession::establish`] or [`PendingSession::complete`].
#[derive(Debug)]
pub struct PendingSession {
    exchange: KeyExchangeState,
}

impl PendingSession {
    /// Starts a handshake with a fresh private exponent drawn from `rng`.
    pub fn new<R: RngCore + CryptoRng>(params: KeyExchangeParams, rng: &mut R) -> Self {
        Self {
            exchange: KeyExchangeState::new(params, rng),
        }
    }

    /// Starts a handshake from an existing key-exchange state.
    pub fn from_exchange(exchange: KeyExchangeState) -> Self {
        Self { exchange }
    }

    /// The public value that goes into the `diffie` field.
    pub fn public_value(&self) -> String {
        self.exchange.public_value()
    }

    /// JSON body of the key-exchange request.
    pub fn request_body(&self) -> String {
        serde_json::json!({ "diffie": self.public_value() }).to_string()
    }

    /// Finishes the handshake from an already received response.
    pub fn complete(self, response: &HandshakeResponse) -> Result<SecureSession, SessionEstablishError> {
        let temp_key = self.exchange.shared_secret(&response.hellman)?;

        let wrapped = hex::decode(response.key.trim())
            .map_err(|e| SessionEstablishError::KeyMaterial(e.to_string()))?;
        let material = cbc_decrypt(&temp_key, &wrapped)?;
        let key = SessionKey::from_key_material(&material)?;

        Ok(SecureSession::from_key(key))
    }

    /// Runs the full handshake against `host` over `transport`.
    pub async fn establish(
        self,
        transport: &dyn Transport,
        host: &str,
    ) -> Result<SecureSession, SessionEstablishError> {
        let url = ApplianceEndpoint::Security.url(host);
        debug!("sending key exchange to {url}");

        let body = transport.put(&url, self.request_body()).await?;
        let response = HandshakeResponse::parse(&body)?;
        let session = self.complete(&response)?;

        info!("secure session established with {host}");
        Ok(session)
    }
}

// ── SecureSession ─────────────────────────────────────────────────────────────

/// An established session: owns the session key and the cipher built from it.
pub struct SecureSession {
    key: SessionKey,
    cipher: SessionCipher,
}

impl std::fmt::Debug for SecureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureSession")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl SecureSession {
    /// Runs a handshake with the appliance's fixed group and an OS-seeded
    /// private exponent.
    pub async fn establish(
        transport: &dyn Transport,
        host: &str,
    ) -> Result<Self, SessionEstablishError> {
        PendingSession::new(KeyExchangeParams::philips(), &mut OsRng)
            .establish(transport, host)
            .await
    }

    /// Wraps an already known session key.
    pub fn from_key(key: SessionKey) -> Self {
        let cipher = SessionCipher::new(key.as_bytes());
        Self { key, cipher }
    }

    /// The session key.
    pub fn session_key(&self) -> &SessionKey {
        &self.key
    }

    /// Encrypts a JSON document into the base64 wire envelope.
    pub fn encrypt(&self, payload: &Value) -> Result<String, ProtocolError> {
        seal_envelope(&self.cipher, payload)
    }

    /// Decrypts a base64 wire envelope into a JSON document.
    pub fn decrypt(&self, envelope: &str) -> Result<Value, ProtocolError> {
        open_envelope(&self.cipher, envelope)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
