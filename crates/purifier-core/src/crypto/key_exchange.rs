//! Diffie-Hellman key exchange with the appliance.
//!
//! # How the exchange works (for beginners)
//!
//! Both sides share two public constants: a large prime `p` (the modulus) and
//! a generator `g`.  Each side picks a secret exponent (`a` for us, `b` for
//! the appliance) and publishes `g^a mod p` / `g^b mod p`.  Raising the
//! other side's public value to your own secret gives both sides the same
//! number, `g^(ab) mod p`, without that number ever crossing the network.
//!
//! The appliance only uses the first 16 bytes of that shared number (after
//! zero-padding it to the 128-byte width of the group) as a temporary AES key.
//!
//! # Wire encoding
//!
//! Public values travel as lowercase hex with no leading zeros, exactly what
//! the firmware produces and consumes.

use num_bigint::{BigUint, RandBigInt};
use rand::{CryptoRng, RngCore};

use crate::crypto::field::{mod_pow, parse_hex, to_be_padded, to_hex, Modulus};
use crate::crypto::ProtocolError;

/// Generator shared by every Philips appliance (hex).
pub const PHILIPS_GENERATOR_HEX: &str = concat!(
    "a4d1cbd5c3fd34126765a442efb99905f8104dd258ac507fd6406cff14266d31",
    "266fea1e5c41564b777e690f5504f213160217b4b01b886a5e91547f9e2749f4",
    "d7fbd7d3b9a92ee1909d0d2263f80a76a6a24c087a091f531dbf0a0169b6a28a",
    "d662a4d18e73afa32d779d5918d08bc8858f4dcef97c2a24855e6eeb22b3b2e5",
);

/// Prime modulus shared by every Philips appliance (hex).
pub const PHILIPS_MODULUS_HEX: &str = concat!(
    "b10b8f96a080e01dde92de5eae5d54ec52c99fbcfb06a3c69a6a9dca52d23b61",
    "6073e28675a23d189838ef1e2ee652c013ecb4aea906112324975c3cd49b83bf",
    "accbdd7d90c4bd7098488e9c219a73724effd6fae5644738faa31a4ff55bccc0",
    "a151af5f0dc8b4bd45bf37df365c1a65e68cfda76d4da708df1fb2bc2e4a4371",
);

/// Bit length of the secret exponent.
pub const PRIVATE_EXPONENT_BITS: u64 = 1024;

/// Width, in bytes, the shared secret is padded to before truncation.
pub const SHARED_SECRET_WIDTH: usize = 128;

/// Number of leading shared-secret bytes used as the temporary key.
pub const TEMP_KEY_LEN: usize = 16;

/// The public constants of one Diffie-Hellman group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyExchangeParams {
    generator: BigUint,
    modulus: Modulus,
}

impl KeyExchangeParams {
    /// Builds parameters from integers.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidParameters`] unless
    /// `1 < generator < modulus` and the modulus fits the 128-byte shared
    /// secret.
    pub fn new(generator: BigUint, modulus: BigUint) -> Result<Self, ProtocolError> {
        if generator <= BigUint::from(1u8) || generator >= modulus {
            return Err(ProtocolError::InvalidParameters(
                "generator must satisfy 1 < g < p".to_string(),
            ));
        }
        if modulus.bits() > (SHARED_SECRET_WIDTH * 8) as u64 {
            return Err(ProtocolError::InvalidParameters(format!(
                "modulus is {} bits, wider than the {SHARED_SECRET_WIDTH}-byte shared secret",
                modulus.bits()
            )));
        }
        let modulus = Modulus::new(modulus).ok_or_else(|| {
            ProtocolError::InvalidParameters("modulus must be non-zero".to_string())
        })?;
        Ok(Self { generator, modulus })
    }

    /// Builds parameters from hex text, the form the constants are published in.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidParameters`] if either value is not
    /// hex or the pair is rejected by [`KeyExchangeParams::new`].
    pub fn from_hex(generator: &str, modulus: &str) -> Result<Self, ProtocolError> {
        let g = parse_hex(generator).ok_or_else(|| {
            ProtocolError::InvalidParameters(format!("generator is not hex: {generator:?}"))
        })?;
        let p = parse_hex(modulus).ok_or_else(|| {
            ProtocolError::InvalidParameters(format!("modulus is not hex: {modulus:?}"))
        })?;
        Self::new(g, p)
    }

    /// The fixed 1024-bit (128-byte) group used by Philips appliances.
    pub fn philips() -> Self {
        // The constants are compile-time literals that satisfy 1 < g < p.
        Self::from_hex(PHILIPS_GENERATOR_HEX, PHILIPS_MODULUS_HEX)
            .unwrap_or_else(|e| unreachable!("built-in key exchange constants are valid: {e}"))
    }

    /// The group generator `g`.
    pub fn generator(&self) -> &BigUint {
        &self.generator
    }

    /// The group modulus `p`.
    pub fn modulus(&self) -> &BigUint {
        self.modulus.value()
    }
}

impl Default for KeyExchangeParams {
    fn default() -> Self {
        Self::philips()
    }
}

/// One side of a single key exchange.
///
/// Holds the secret exponent for the lifetime of one handshake.  The exponent
/// never leaves this struct: it is not serializable and `Debug` redacts it.
#[derive(Clone)]
pub struct KeyExchangeState {
    params: KeyExchangeParams,
    private_exponent: BigUint,
}

impl std::fmt::Debug for KeyExchangeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyExchangeState")
            .field("params", &self.params)
            .field("private_exponent", &"<redacted>")
            .finish()
    }
}

impl KeyExchangeState {
    /// Draws a fresh secret exponent uniformly from `[0, 2^1024)`.
    ///
    /// Production callers pass `rand::rngs::OsRng`.
    pub fn new<R: RngCore + CryptoRng>(params: KeyExchangeParams, rng: &mut R) -> Self {
        let private_exponent = rng.gen_biguint(PRIVATE_EXPONENT_BITS);
        Self {
            params,
            private_exponent,
        }
    }

    /// Builds a state with a fixed exponent, for reproducible test vectors.
    ///
    /// Never use this for a real handshake.
    pub fn with_exponent(params: KeyExchangeParams, private_exponent: BigUint) -> Self {
        Self {
            params,
            private_exponent,
        }
    }

    /// The parameters this exchange runs over.
    pub fn params(&self) -> &KeyExchangeParams {
        &self.params
    }

    /// Returns `g^a mod p` as lowercase hex without leading zeros.
    pub fn public_value(&self) -> String {
        let public = mod_pow(
            &self.params.generator,
            &self.private_exponent,
            &self.params.modulus,
        );
        to_hex(&public)
    }

    /// Derives the 16-byte temporary key from the peer's public value.
    ///
    /// Computes `peer^a mod p`, pads it big-endian to 128 bytes, and returns
    /// the first 16 bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedPeerKey`] if `peer_public_hex` is not
    /// a hexadecimal integer.
    pub fn shared_secret(&self, peer_public_hex: &str) -> Result<[u8; TEMP_KEY_LEN], ProtocolError> {
        let peer = parse_hex(peer_public_hex)
            .ok_or_else(|| ProtocolError::MalformedPeerKey(peer_public_hex.to_string()))?;

        let shared = mod_pow(&peer, &self.private_exponent, &self.params.modulus);
        let padded = to_be_padded(&shared, SHARED_SECRET_WIDTH).ok_or_else(|| {
            ProtocolError::InvalidParameters("shared secret exceeds its fixed width".to_string())
        })?;

        let mut key = [0u8; TEMP_KEY_LEN];
        key.copy_from_slice(&padded[..TEMP_KEY_LEN]);
        Ok(key)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
