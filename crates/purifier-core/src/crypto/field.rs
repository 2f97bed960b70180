//! Modular arithmetic over arbitrary-precision unsigned integers.
//!
//! The key exchange works in a 1024-bit group with a 1024-bit secret exponent,
//! far beyond any machine integer.  [`num_bigint::BigUint`] provides the
//! storage and the exponentiation; this module wraps it with the handful of
//! conversions the protocol needs (hex text in and out, fixed-width
//! big-endian bytes).

use num_bigint::BigUint;

/// A non-zero modulus.
///
/// `BigUint::modpow` panics on a zero modulus, so the check happens once here
/// and [`mod_pow`] itself cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modulus(BigUint);

impl Modulus {
    /// Wraps `value`, returning `None` when it is zero.
    pub fn new(value: BigUint) -> Option<Self> {
        if value == BigUint::from(0u8) {
            None
        } else {
            Some(Self(value))
        }
    }

    /// The underlying integer.
    pub fn value(&self) -> &BigUint {
        &self.0
    }
}

/// Computes `base ^ exponent mod modulus`.
///
/// `BigUint::modpow` is not constant-time: its running time varies with the
/// exponent's bits.  Timing side channels on the private exponent are out of
/// scope for this LAN handshake.
///
/// # Examples
///
/// ```rust
/// use num_bigint::BigUint;
/// use purifier_core::crypto::field::{mod_pow, Modulus};
///
/// let m = Modulus::new(BigUint::from(23u8)).unwrap();
/// let r = mod_pow(&BigUint::from(5u8), &BigUint::from(15u8), &m);
/// assert_eq!(r, BigUint::from(19u8));
/// ```
pub fn mod_pow(base: &BigUint, exponent: &BigUint, modulus: &Modulus) -> BigUint {
    base.modpow(exponent, modulus.value())
}

/// Parses hexadecimal text (either case, optional `0x`/`0X` prefix) into an
/// integer.
///
/// Surrounding whitespace is ignored.  Returns `None` for empty input or any
/// non-hex character, including the `_` separators `BigUint::parse_bytes`
/// would otherwise skip.
pub fn parse_hex(text: &str) -> Option<BigUint> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    BigUint::parse_bytes(digits.as_bytes(), 16)
}

/// Renders `value` as lowercase hexadecimal without leading zeros.
///
/// Zero renders as `"0"`.
pub fn to_hex(value: &BigUint) -> String {
    value.to_str_radix(16)
}

/// Serializes `value` big-endian, left-padded with zeros to `width` bytes.
///
/// Returns `None` when `value` needs more than `width` bytes.
pub fn to_be_padded(value: &BigUint, width: usize) -> Option<Vec<u8>> {
    let bytes = value.to_bytes_be();
    if bytes.len() > width {
        return None;
    }
    let mut padded = vec![0u8; width - bytes.len()];
    padded.extend_from_slice(&bytes);
    Some(padded)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
