//! AES-128-CBC with a fixed all-zero IV and PKCS#7 padding.
//!
//! # CBC in one paragraph (for beginners)
//!
//! A block cipher only encrypts exactly 16 bytes at a time.  CBC (Cipher Block
//! Chaining) handles longer messages by XOR-ing each plaintext block with the
//! previous *ciphertext* block before encrypting it.  The very first block is
//! XOR-ed with an initialization vector (IV).  The appliance firmware always
//! uses an IV of 16 zero bytes and never transmits one, so neither do we.
//!
//! Plaintext that is not a multiple of 16 bytes is extended with PKCS#7
//! padding: `n` copies of the byte `n`, where `1 <= n <= 16`.  A message that
//! is already block-aligned gets a full extra block of `0x10` bytes.

use aes::cipher::{Block, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;

use crate::crypto::session_key::SESSION_KEY_LEN;
use crate::crypto::ProtocolError;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// The IV the firmware uses for every message.
const ZERO_IV: [u8; BLOCK_SIZE] = [0u8; BLOCK_SIZE];

/// An AES-128-CBC cipher bound to one key.
///
/// Build one per key and reuse it for every payload under that key.
#[derive(Clone)]
pub struct SessionCipher {
    cipher: Aes128,
}

impl SessionCipher {
    /// Expands `key` into an AES-128 key schedule.
    pub fn new(key: &[u8; SESSION_KEY_LEN]) -> Self {
        Self {
            cipher: Aes128::new(key.into()),
        }
    }

    /// Pads `plaintext` with PKCS#7 and encrypts it.
    ///
    /// The output is always a non-empty multiple of [`BLOCK_SIZE`].
    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        let padding_len = BLOCK_SIZE - (plaintext.len() % BLOCK_SIZE);
        let mut buf = Vec::with_capacity(plaintext.len() + padding_len);
        buf.extend_from_slice(plaintext);
        buf.resize(plaintext.len() + padding_len, padding_len as u8);

        let mut chain = ZERO_IV;
        for chunk in buf.chunks_exact_mut(BLOCK_SIZE) {
            xor_in_place(chunk, &chain);
            let block = Block::<Aes128>::from_mut_slice(chunk);
            self.cipher.encrypt_block(block);
            chain.copy_from_slice(chunk);
        }
        buf
    }

    /// Decrypts `ciphertext` and strips the PKCS#7 padding.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::BlockAlignment`] if `ciphertext` is empty or not a
    ///   multiple of [`BLOCK_SIZE`].
    /// - [`ProtocolError::PaddingInvalid`] if the decrypted tail is not valid
    ///   PKCS#7 padding (usually a wrong key or corrupted data).
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(ProtocolError::BlockAlignment(ciphertext.len()));
        }

        let mut buf = ciphertext.to_vec();
        let mut chain = ZERO_IV;
        for chunk in buf.chunks_exact_mut(BLOCK_SIZE) {
            let mut next_chain = [0u8; BLOCK_SIZE];
            next_chain.copy_from_slice(chunk);

            let block = Block::<Aes128>::from_mut_slice(chunk);
            self.cipher.decrypt_block(block);
            xor_in_place(chunk, &chain);

            chain = next_chain;
        }

        let plain_len = unpadded_len(&buf)?;
        buf.truncate(plain_len);
        Ok(buf)
    }
}

/// Encrypts `plaintext` under `key` (one-shot form of [`SessionCipher::encrypt`]).
pub fn cbc_encrypt(key: &[u8; SESSION_KEY_LEN], plaintext: &[u8]) -> Vec<u8> {
    SessionCipher::new(key).encrypt(plaintext)
}

/// Decrypts `ciphertext` under `key` (one-shot form of [`SessionCipher::decrypt`]).
///
/// # Errors
///
/// See [`SessionCipher::decrypt`].
pub fn cbc_decrypt(key: &[u8; SESSION_KEY_LEN], ciphertext: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    SessionCipher::new(key).decrypt(ciphertext)
}

fn xor_in_place(block: &mut [u8], mask: &[u8; BLOCK_SIZE]) {
    for (b, m) in block.iter_mut().zip(mask.iter()) {
        *b ^= m;
    }
}

/// Returns the plaintext length once PKCS#7 padding is removed.
fn unpadded_len(decrypted: &[u8]) -> Result<usize, ProtocolError> {
    let padding_len = *decrypted.last().ok_or(ProtocolError::PaddingInvalid)? as usize;
    if padding_len == 0 || padding_len > BLOCK_SIZE || padding_len > decrypted.len() {
        return Err(ProtocolError::PaddingInvalid);
    }
    let start = decrypted.len() - padding_len;
    let mut mismatched: u8 = 0;
    for &byte in &decrypted[start..] {
        mismatched |= byte ^ padding_len as u8;
    }
    if mismatched != 0 {
        return Err(ProtocolError::PaddingInvalid);
    }
    Ok(start)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 16] = *b"0123456789abcdef";

    #[test]
    fn test_encrypt_matches_aes128_single_block_vector() {
        // Arrange – FIPS-197 appendix C.1 key/plaintext.  With a zero IV the
        // first CBC block equals the raw AES block.
        let key: [u8; 16] = [
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c,
            0x0d, 0x0e, 0x0f,
        ];
        let plaintext: [u8; 16] = [
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc,
            0xdd, 0xee, 0xff,
        ];
        let expected: [u8; 16] = [
            0x69, 0xc4, 0xe0, 0xd8, 0x6a, 0x7b, 0x04, 0x30, 0xd8, 0xcd, 0xb7, 0x80, 0x70,
            0xb4, 0xc5, 0x5a,
        ];

        // Act
        let ciphertext = cbc_encrypt(&key, &plaintext);

        // Assert – one data block plus one full padding block
        assert_eq!(ciphertext.len(), 32);
        assert_eq!(&ciphertext[..16], &expected);
    }

    #[test]
    fn test_encrypt_output_is_block_aligned() {
        let cipher = SessionCipher::new(&KEY);
        for len in [0usize, 1, 15, 16, 17, 31, 32, 100] {
            let ct = cipher.encrypt(&vec![0x42; len]);
            assert_eq!(ct.len() % BLOCK_SIZE, 0, "len {len}");
            assert!(ct.len() > len, "padding must always be added (len {len})");
        }
    }

    #[test]
    fn test_decrypt_inverts_encrypt_across_block_boundaries() {
        let cipher = SessionCipher::new(&KEY);
        for len in [0usize, 1, 15, 16, 17, 47] {
            let plaintext: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let decrypted = cipher.decrypt(&cipher.encrypt(&plaintext)).unwrap();
            assert_eq!(decrypted, plaintext, "len {len}");
        }
    }

    #[test]
    fn test_identical_blocks_encrypt_differently_under_chaining() {
        // Arrange
        let cipher = SessionCipher::new(&KEY);

        // Act
        let ct = cipher.encrypt(&[0u8; 32]);

        // Assert – CBC chaining, not ECB
        assert_ne!(&ct[0..16], &ct[16..32]);
    }

    #[test]
    fn test_decrypt_rejects_empty_input() {
        let result = cbc_decrypt(&KEY, &[]);
        assert_eq!(result, Err(ProtocolError::BlockAlignment(0)));
    }

    #[test]
    fn test_decrypt_rejects_misaligned_input() {
        let result = cbc_decrypt(&KEY, &[0u8; 17]);
        assert_eq!(result, Err(ProtocolError::BlockAlignment(17)));
    }

    #[test]
    fn test_decrypt_with_wrong_key_reports_padding_error() {
        // Arrange – plaintext chosen so the correct padding is a single 0x01
        let ciphertext = cbc_encrypt(&KEY, &[0x55; 15]);
        let wrong_key = [0xEE; 16];

        // Act
        let result = cbc_decrypt(&wrong_key, &ciphertext);

        // Assert – a random final block almost never forms valid padding,
        // and when it does the plaintext must differ from the original.
        match result {
            Err(e) => assert_eq!(e, ProtocolError::PaddingInvalid),
            Ok(plain) => assert_ne!(plain, vec![0x55; 15]),
        }
    }

    #[test]
    fn test_unpadded_len_rejects_zero_pad_byte() {
        let mut block = [0x10u8; 16];
        block[15] = 0;
        assert_eq!(unpadded_len(&block), Err(ProtocolError::PaddingInvalid));
    }

    #[test]
    fn test_unpadded_len_rejects_inconsistent_pad_bytes() {
        let mut block = [0x00u8; 16];
        block[15] = 0x03;
        block[14] = 0x03;
        block[13] = 0x02;
        assert_eq!(unpadded_len(&block), Err(ProtocolError::PaddingInvalid));
    }

    #[test]
    fn test_unpadded_len_accepts_full_padding_block() {
        let block = [0x10u8; 16];
        assert_eq!(unpadded_len(&block), Ok(0));
    }
}
