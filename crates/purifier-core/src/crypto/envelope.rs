//! The encrypted payload envelope used after the handshake.
//!
//! Wire format:
//! ```text
//! base64( AES-128-CBC( "\n\n" || JSON-text || PKCS#7 padding ) )
//! ```
//! The two leading newline bytes are a fixed prefix the firmware adds and
//! expects.  On the way in they are dropped without being checked.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;

use crate::crypto::cipher::SessionCipher;
use crate::crypto::ProtocolError;

/// Prefix placed in front of every JSON payload.
pub const PAYLOAD_PREFIX: &[u8; 2] = b"\n\n";

/// Serializes `payload`, prepends the prefix, encrypts, and base64-encodes.
///
/// # Errors
///
/// Returns [`ProtocolError::DecodeFailure`] if `payload` cannot be serialized
/// (only possible for maps with non-string keys built by hand).
pub fn seal_envelope(cipher: &SessionCipher, payload: &Value) -> Result<String, ProtocolError> {
    let json = serde_json::to_vec(payload)
        .map_err(|e| ProtocolError::DecodeFailure(format!("json encode: {e}")))?;

    let mut plaintext = Vec::with_capacity(PAYLOAD_PREFIX.len() + json.len());
    plaintext.extend_from_slice(PAYLOAD_PREFIX);
    plaintext.extend_from_slice(&json);

    Ok(STANDARD.encode(cipher.encrypt(&plaintext)))
}

/// Reverses [`seal_envelope`].
///
/// Surrounding whitespace in `envelope` (for example a trailing newline in an
/// HTTP body) is ignored.
///
/// # Errors
///
/// - [`ProtocolError::DecodeFailure`] for invalid base64, a plaintext shorter
///   than the prefix, invalid UTF-8, or invalid JSON.
/// - [`ProtocolError::DecryptFailure`] if the ciphertext is misaligned or the
///   padding does not check out.
pub fn open_envelope(cipher: &SessionCipher, envelope: &str) -> Result<Value, ProtocolError> {
    let ciphertext = STANDARD
        .decode(envelope.trim())
        .map_err(|e| ProtocolError::DecodeFailure(format!("base64: {e}")))?;

    let plaintext = cipher
        .decrypt(&ciphertext)
        .map_err(|e| ProtocolError::DecryptFailure(e.to_string()))?;

    let body = plaintext.get(PAYLOAD_PREFIX.len()..).ok_or_else(|| {
        ProtocolError::DecodeFailure(format!(
            "plaintext is {} bytes, shorter than the payload prefix",
            plaintext.len()
        ))
    })?;

    let text = std::str::from_utf8(body)
        .map_err(|e| ProtocolError::DecodeFailure(format!("utf-8: {e}")))?;

    serde_json::from_str(text).map_err(|e| ProtocolError::DecodeFailure(format!("json: {e}")))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
