//! Reading and controlling an appliance through an established session.
//!
//! [`ApplianceClient`] pairs a [`SecureSession`] with the transport and the
//! appliance's address.  Reads `GET` an endpoint and decrypt the body; writes
//! encrypt a JSON document, `PUT` it, and decrypt the appliance's answer.

use std::fmt;
use std::sync::Arc;

use purifier_core::protocol::describe_error_code;
use purifier_core::{ApplianceEndpoint, ProtocolError};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::application::session::{SecureSession, SessionEstablishError};
use crate::application::transport::{Transport, TransportError};

/// Error type for reads and writes on an established session.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The security endpoint carries the handshake, not encrypted payloads.
    #[error("endpoint {0} does not carry encrypted payloads")]
    NotEncrypted(ApplianceEndpoint),
}

/// Handle to one appliance with an established secure session.
pub struct ApplianceClient {
    transport: Arc<dyn Transport>,
    host: String,
    session: SecureSession,
}

impl fmt::Debug for ApplianceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplianceClient")
            .field("host", &self.host)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl ApplianceClient {
    /// Performs the handshake with `host` and returns a ready client.
    pub async fn connect(
        transport: Arc<dyn Transport>,
        host: impl Into<String>,
    ) -> Result<Self, SessionEstablishError> {
        let host = host.into();
        let session = SecureSession::establish(transport.as_ref(), &host).await?;
        Ok(Self::with_session(transport, host, session))
    }

    /// Builds a client around a session established elsewhere.
    pub fn with_session(
        transport: Arc<dyn Transport>,
        host: impl Into<String>,
        session: SecureSession,
    ) -> Self {
        Self {
            transport,
            host: host.into(),
            session,
        }
    }

    /// The appliance address this client talks to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The underlying session.
    pub fn session(&self) -> &SecureSession {
        &self.session
    }

    /// Reads and decrypts one status endpoint.
    pub async fn read(&self, endpoint: ApplianceEndpoint) -> Result<Value, ClientError> {
        Self::require_encrypted(endpoint)?;
        let url = endpoint.url(&self.host);
        debug!("reading {endpoint} from {url}");

        let body = self.transport.get(&url).await?;
        Ok(self.session.decrypt(&body)?)
    }

    /// Encrypts `payload`, writes it to `endpoint`, and decrypts the reply.
    ///
    /// An empty reply body yields `Value::Null`.
    pub async fn write(
        &self,
        endpoint: ApplianceEndpoint,
        payload: &Value,
    ) -> Result<Value, ClientError> {
        Self::require_encrypted(endpoint)?;
        let url = endpoint.url(&self.host);
        info!("writing {payload} to {endpoint} on {}", self.host);

        let body = self.session.encrypt(payload)?;
        let reply = self.transport.put(&url, body).await?;
        if reply.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(self.session.decrypt(&reply)?)
    }

    /// Reads the `air` endpoint and returns its typed view.
    pub async fn status(&self) -> Result<AirStatus, ClientError> {
        let raw = self.read(ApplianceEndpoint::Air).await?;
        Ok(AirStatus::from_value(raw))
    }

    fn require_encrypted(endpoint: ApplianceEndpoint) -> Result<(), ClientError> {
        if endpoint.is_encrypted() {
            Ok(())
        } else {
            Err(ClientError::NotEncrypted(endpoint))
        }
    }
}

// ── AirStatus ─────────────────────────────────────────────────────────────────

/// Typed view of the `air` status document.
///
/// Every field is optional: firmware versions differ in which keys they
/// report, and numeric values arrive either as JSON numbers or as strings.
/// The full document stays available in [`AirStatus::raw`].
#[derive(Debug, Clone, PartialEq)]
pub struct AirStatus {
    /// `pwr`: `"1"` is on.
    pub power: Option<bool>,
    /// `mode`, e.g. `"P"` (auto), `"A"` (allergen), `"S"` (sleep).
    pub mode: Option<String>,
    /// `om`: fan speed, `"1"`–`"3"`, `"s"` (silent) or `"t"` (turbo).
    pub fan_speed: Option<String>,
    /// `pm25` in µg/m³.
    pub pm25: Option<u64>,
    /// `iaql`: indoor allergen index.
    pub allergen_index: Option<u64>,
    /// `rh`: relative humidity in percent.
    pub humidity: Option<u64>,
    /// `temp` in °C.
    pub temperature: Option<i64>,
    /// `err`: appliance error code, 0 when healthy.
    pub error_code: Option<u64>,
    /// The decrypted document as received.
    pub raw: Value,
}

impl AirStatus {
    pub fn from_value(raw: Value) -> Self {
        Self {
            power: string_field(&raw, "pwr").map(|p| p == "1"),
            mode: string_field(&raw, "mode"),
            fan_speed: string_field(&raw, "om"),
            pm25: u64_field(&raw, "pm25"),
            allergen_index: u64_field(&raw, "iaql"),
            humidity: u64_field(&raw, "rh"),
            temperature: raw.get("temp").and_then(|v| match v {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }),
            error_code: u64_field(&raw, "err"),
            raw,
        }
    }

    /// Human-readable meaning of a non-zero error code, if it is a known one.
    pub fn error_description(&self) -> Option<&'static str> {
        self.error_code.and_then(describe_error_code)
    }
}

impl fmt::Display for AirStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn show<T: fmt::Display>(value: &Option<T>) -> String {
            value
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string)
        }

        let power = match self.power {
            Some(true) => "on",
            Some(false) => "off",
            None => "-",
        };
        writeln!(f, "Power:          {power}")?;
        writeln!(f, "Mode:           {}", show(&self.mode))?;
        writeln!(f, "Fan speed:      {}", show(&self.fan_speed))?;
        writeln!(f, "PM2.5:          {}", show(&self.pm25))?;
        writeln!(f, "Allergen index: {}", show(&self.allergen_index))?;
        writeln!(f, "Humidity:       {}", show(&self.humidity))?;
        writeln!(f, "Temperature:    {}", show(&self.temperature))?;
        match (self.error_code, self.error_description()) {
            (Some(code), Some(text)) => write!(f, "Error:          {code} ({text})"),
            (Some(code), None) => write!(f, "Error:          {code}"),
            (None, _) => write!(f, "Error:          -"),
        }
    }
}

// ── Air commands ──────────────────────────────────────────────────────────────

/// `air` keys the firmware expects as a JSON boolean.
const BOOL_FIELDS: [&str; 1] = ["cl"];

/// `air` keys the firmware expects as a JSON integer: target humidity,
/// display brightness, and the off-timer in hours.
const INT_FIELDS: [&str; 3] = ["rhset", "aqil", "dt"];

/// Converts command-line text into the JSON value the firmware expects for
/// `key` on the `air` endpoint.
///
/// `cl` takes `true`/`false` (or `1`/`0`); `rhset`, `aqil` and `dt` take
/// unsigned integers.  Every other key, including `pwr`, `om`, `mode`,
/// `uil`, `func` and `ddp`, is sent as a string.
///
/// # Errors
///
/// Returns a message when a typed key gets text of the wrong shape.
pub fn air_field_value(key: &str, raw: &str) -> Result<Value, String> {
    let text = raw.trim();
    if BOOL_FIELDS.contains(&key) {
        return match text {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(format!("{key} expects true or false, got {raw:?}")),
        };
    }
    if INT_FIELDS.contains(&key) {
        return text
            .parse::<u64>()
            .map(Value::from)
            .map_err(|_| format!("{key} expects an unsigned integer, got {raw:?}"));
    }
    Ok(Value::String(raw.to_string()))
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}

fn u64_field(raw: &Value, key: &str) -> Option<u64> {
    match raw.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
