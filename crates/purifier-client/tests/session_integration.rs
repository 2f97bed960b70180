//! End-to-end handshake and control against an in-memory appliance.
//!
//! `FakeAppliance` plays the appliance side of the protocol with the real
//! 1024-bit group: it answers the key exchange with its own public value and
//! a session key wrapped under the shared temporary key, then serves and
//! accepts encrypted `air` documents.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use purifier_client::application::control::{ApplianceClient, ClientError};
use purifier_client::application::session::{SecureSession, SessionEstablishError};
use purifier_client::application::transport::{Transport, TransportError};
use purifier_core::crypto::cipher::cbc_encrypt;
use purifier_core::{ApplianceEndpoint, KeyExchangeParams, KeyExchangeState, ProtocolError, SessionKey};
use rand::rngs::OsRng;
use serde_json::{json, Value};

const HOST: &str = "192.168.1.20";
const SESSION_KEY: [u8; 16] = *b"appliance-secret";

struct FakeAppliance {
    exchange: KeyExchangeState,
    session: SecureSession,
    air: Mutex<Value>,
    /// Appended to the wrapped key so the client must truncate the material.
    key_padding: Vec<u8>,
}

impl FakeAppliance {
    fn new() -> Self {
        Self {
            exchange: KeyExchangeState::new(KeyExchangeParams::philips(), &mut OsRng),
            session: SecureSession::from_key(SessionKey::new(SESSION_KEY)),
            air: Mutex::new(json!({ "pwr": "1", "om": "1", "pm25": 7, "err": 0 })),
            key_padding: b"0123456789abcdef".to_vec(),
        }
    }

    fn handle_key_exchange(&self, body: &str) -> Result<String, TransportError> {
        let request: Value = serde_json::from_str(body).map_err(|e| bad_request(&e.to_string()))?;
        let client_public = request["diffie"]
            .as_str()
            .ok_or_else(|| bad_request("missing diffie"))?;

        let temp_key = self
            .exchange
            .shared_secret(client_public)
            .map_err(|e| bad_request(&e.to_string()))?;
        let mut material = SESSION_KEY.to_vec();
        material.extend_from_slice(&self.key_padding);
        let wrapped = cbc_encrypt(&temp_key, &material);

        Ok(json!({
            "hellman": self.exchange.public_value(),
            "key": hex::encode(wrapped),
        })
        .to_string())
    }
}

fn bad_request(reason: &str) -> TransportError {
    TransportError::Request {
        url: "fake".to_string(),
        reason: reason.to_string(),
    }
}

#[async_trait]
impl Transport for FakeAppliance {
    async fn get(&self, url: &str) -> Result<String, TransportError> {
        if url == ApplianceEndpoint::Air.url(HOST) {
            let air = self.air.lock().unwrap().clone();
            self.session.encrypt(&air).map_err(|e| bad_request(&e.to_string()))
        } else {
            Err(TransportError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    async fn put(&self, url: &str, body: String) -> Result<String, TransportError> {
        if url == ApplianceEndpoint::Security.url(HOST) {
            return self.handle_key_exchange(&body);
        }
        if url != ApplianceEndpoint::Air.url(HOST) {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: 404,
            });
        }

        let update = self
            .session
            .decrypt(&body)
            .map_err(|e| bad_request(&e.to_string()))?;
        let mut air = self.air.lock().unwrap();
        if let (Some(state), Some(changes)) = (air.as_object_mut(), update.as_object()) {
            for (key, value) in changes {
                state.insert(key.clone(), value.clone());
            }
        }
        self.session.encrypt(&air).map_err(|e| bad_request(&e.to_string()))
    }
}

#[tokio::test]
async fn test_handshake_with_real_group_recovers_session_key() {
    // Arrange
    let appliance = FakeAppliance::new();

    // Act
    let session = SecureSession::establish(&appliance, HOST).await.unwrap();

    // Assert
    assert_eq!(session.session_key().as_bytes(), &SESSION_KEY);
}

#[tokio::test]
async fn test_client_reads_status_through_established_session() {
    // Arrange
    let appliance = Arc::new(FakeAppliance::new());

    // Act
    let client = ApplianceClient::connect(appliance, HOST).await.unwrap();
    let status = client.status().await.unwrap();

    // Assert
    assert_eq!(status.power, Some(true));
    assert_eq!(status.pm25, Some(7));
    assert_eq!(status.error_code, Some(0));
}

#[tokio::test]
async fn test_client_write_is_applied_and_acknowledged() {
    // Arrange
    let appliance = Arc::new(FakeAppliance::new());
    let client = ApplianceClient::connect(appliance.clone(), HOST).await.unwrap();

    // Act
    let reply = client
        .write(ApplianceEndpoint::Air, &json!({ "om": "t" }))
        .await
        .unwrap();

    // Assert
    assert_eq!(reply["om"], json!("t"));
    assert_eq!(appliance.air.lock().unwrap()["om"], json!("t"));
    assert_eq!(client.status().await.unwrap().fan_speed.as_deref(), Some("t"));
}

#[tokio::test]
async fn test_session_with_wrong_key_cannot_read_status() {
    // Arrange: skip the handshake and guess a key
    let appliance = Arc::new(FakeAppliance::new());
    let wrong = SecureSession::from_key(SessionKey::new(*b"wrong-key-000000"));
    let client = ApplianceClient::with_session(appliance, HOST, wrong);

    // Act
    let result = client.status().await;

    // Assert
    assert!(matches!(
        result,
        Err(ClientError::Protocol(
            ProtocolError::DecryptFailure(_) | ProtocolError::DecodeFailure(_)
        ))
    ));
}

#[tokio::test]
async fn test_handshake_against_unreachable_endpoint_fails() {
    let appliance = FakeAppliance::new();

    let result = SecureSession::establish(&appliance, "10.9.9.9").await;

    assert!(matches!(
        result,
        Err(SessionEstablishError::Transport(TransportError::Status { status: 404, .. }))
    ));
}
