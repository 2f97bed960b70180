//! Cryptographic building blocks of the appliance protocol.
//!
//! # Layers
//!
//! ```text
//! envelope      "\n\n" + JSON  <->  base64 text
//!    │
//! cipher        AES-128-CBC, zero IV, PKCS#7 padding
//!    │
//! key_exchange  Diffie-Hellman over a fixed 128-byte group
//!    │
//! field         modular exponentiation over big unsigned integers
//! ```
//!
//! None of this adds authentication.  The appliance firmware fixes the IV,
//! the padding scheme, and the two-byte prefix, so they are reproduced
//! exactly as the firmware expects them.

pub mod cipher;
pub mod envelope;
pub mod field;
pub mod key_exchange;
pub mod session_key;

use thiserror::Error;

/// Errors raised by the key exchange, the cipher, and the payload envelope.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The peer's public value is not parseable as a hexadecimal integer.
    #[error("malformed peer public key: {0:?}")]
    MalformedPeerKey(String),

    /// The key-exchange constants violate `1 < generator < modulus`.
    #[error("invalid key exchange parameters: {0}")]
    InvalidParameters(String),

    /// The decrypted plaintext does not end in valid PKCS#7 padding.
    #[error("invalid PKCS#7 padding")]
    PaddingInvalid,

    /// The ciphertext is empty or not a whole number of 16-byte blocks.
    #[error("ciphertext length {0} is not a positive multiple of the block size")]
    BlockAlignment(usize),

    /// base64, UTF-8, or JSON decoding of a payload failed.
    #[error("payload decode failure: {0}")]
    DecodeFailure(String),

    /// The payload could not be decrypted with the session key.
    #[error("payload decrypt failure: {0}")]
    DecryptFailure(String),
}
