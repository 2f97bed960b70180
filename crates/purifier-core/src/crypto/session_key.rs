//! The 16-byte symmetric key shared with one appliance.

use crate::crypto::ProtocolError;

/// AES-128 key length in bytes.
pub const SESSION_KEY_LEN: usize = 16;

/// The long-lived key for one appliance session.
///
/// Created once per handshake and never changed afterwards.  `Debug` does not
/// print the key bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKey([u8; SESSION_KEY_LEN]);

impl SessionKey {
    /// Wraps exactly 16 key bytes.
    pub fn new(bytes: [u8; SESSION_KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Takes the first 16 bytes of unwrapped key material.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::DecryptFailure`] if fewer than 16 bytes are
    /// available.
    pub fn from_key_material(material: &[u8]) -> Result<Self, ProtocolError> {
        let head = material.get(..SESSION_KEY_LEN).ok_or_else(|| {
            ProtocolError::DecryptFailure(format!(
                "session key material is {} bytes, need {SESSION_KEY_LEN}",
                material.len()
            ))
        })?;
        let mut key = [0u8; SESSION_KEY_LEN];
        key.copy_from_slice(head);
        Ok(Self(key))
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; SESSION_KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_key_material_truncates_to_16_bytes() {
        // Arrange
        let material: Vec<u8> = (0u8..20).collect();

        // Act
        let key = SessionKey::from_key_material(&material).unwrap();

        // Assert
        assert_eq!(key.as_bytes(), &material[..16]);
    }

    #[test]
    fn test_from_key_material_rejects_short_input() {
        let result = SessionKey::from_key_material(&[1, 2, 3]);
        assert!(matches!(result, Err(ProtocolError::DecryptFailure(_))));
    }

    #[test]
    fn test_debug_hides_key_bytes() {
        let key = SessionKey::new([0xAB; 16]);
        assert_eq!(format!("{key:?}"), "SessionKey(<redacted>)");
    }
}
