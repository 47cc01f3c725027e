//! Authenticated encryption using `XChaCha20-Poly1305`
//!
//! [`encrypt_with_nonce`] is pure: the nonce is supplied by the caller, which
//! keeps tests deterministic. [`encrypt`] draws the nonce from the OS RNG and
//! is what production code calls.

use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit, Payload},
};

use crate::{derivation::EncryptionKey, error::CryptoError};

/// Nonce size in bytes (`XChaCha20`)
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag size in bytes
pub const TAG_SIZE: usize = 16;

/// Ciphertext and the nonce it was sealed under.
///
/// Associated data is not carried here: callers transmit it alongside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    /// Ciphertext including the 16-byte Poly1305 tag
    pub ciphertext: Vec<u8>,
    /// The 24-byte `XChaCha20` nonce
    pub nonce: [u8; NONCE_SIZE],
}

impl Sealed {
    /// Plaintext length (ciphertext length minus authentication tag).
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len().saturating_sub(TAG_SIZE)
    }
}

/// Encrypt under a fresh random nonce.
///
/// # Errors
///
/// - `EntropyUnavailable`: the OS RNG failed
pub fn encrypt(
    plaintext: &[u8],
    key: &EncryptionKey,
    associated_data: Option<&[u8]>,
) -> Result<Sealed, CryptoError> {
    let mut nonce = [0u8; NONCE_SIZE];
    getrandom::fill(&mut nonce).map_err(|_| CryptoError::EntropyUnavailable)?;
    Ok(encrypt_with_nonce(plaintext, key, associated_data, nonce))
}

/// Encrypt under a caller-supplied nonce.
///
/// # Security
///
/// - The nonce MUST be unique per message under the same key
/// - Caller MUST provide cryptographically secure random bytes in production
/// - Output length is `plaintext.len() + TAG_SIZE`
pub fn encrypt_with_nonce(
    plaintext: &[u8],
    key: &EncryptionKey,
    associated_data: Option<&[u8]>,
    nonce: [u8; NONCE_SIZE],
) -> Sealed {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let payload = Payload { msg: plaintext, aad: associated_data.unwrap_or_default() };

    let Ok(ciphertext) = cipher.encrypt(XNonce::from_slice(&nonce), payload) else {
        unreachable!("XChaCha20-Poly1305 encryption cannot fail with valid inputs");
    };

    debug_assert_eq!(ciphertext.len(), plaintext.len() + TAG_SIZE);

    Sealed { ciphertext, nonce }
}

/// Verify and decrypt.
///
/// Fail-closed: the tag is checked before any byte is released. On failure
/// nothing derived from the ciphertext is returned or kept.
///
/// # Errors
///
/// - `InvalidNonceLength`: nonce is not 24 bytes
/// - `AuthenticationFailed`: tag mismatch (tampered ciphertext, nonce or
///   associated data, or wrong key), or ciphertext shorter than a tag
pub fn decrypt(
    ciphertext: &[u8],
    nonce: &[u8],
    key: &EncryptionKey,
    associated_data: Option<&[u8]>,
) -> Result<Vec<u8>, CryptoError> {
    if nonce.len() != NONCE_SIZE {
        return Err(CryptoError::InvalidNonceLength { expected: NONCE_SIZE, actual: nonce.len() });
    }

    if ciphertext.len() < TAG_SIZE {
        return Err(CryptoError::AuthenticationFailed);
    }

    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let payload = Payload { msg: ciphertext, aad: associated_data.unwrap_or_default() };

    cipher
        .decrypt(XNonce::from_slice(nonce), payload)
        .map_err(|_| CryptoError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key(fill: u8) -> EncryptionKey {
        EncryptionKey::from_bytes([fill; 32])
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let key = test_key(1);
        let plaintext = b"Hello, World!";

        let sealed = encrypt_with_nonce(plaintext, &key, None, [0xAB; NONCE_SIZE]);
        let decrypted = decrypt(&sealed.ciphertext, &sealed.nonce, &key, None).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn encrypt_decrypt_empty_message() {
        let key = test_key(2);

        let sealed = encrypt(b"", &key, None).unwrap();
        let decrypted = decrypt(&sealed.ciphertext, &sealed.nonce, &key, None).unwrap();

        assert!(decrypted.is_empty());
        assert_eq!(sealed.ciphertext.len(), TAG_SIZE);
    }

    #[test]
    fn encrypt_decrypt_large_message() {
        let key = test_key(3);
        let plaintext = vec![0x42u8; 64 * 1024]; // 64KB

        let sealed = encrypt(&plaintext, &key, Some(b"aad")).unwrap();
        let decrypted = decrypt(&sealed.ciphertext, &sealed.nonce, &key, Some(b"aad")).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn ciphertext_is_plaintext_plus_tag() {
        let key = test_key(4);
        let plaintext = b"test message";

        let sealed = encrypt(plaintext, &key, None).unwrap();

        assert_eq!(sealed.ciphertext.len(), plaintext.len() + TAG_SIZE);
        assert_eq!(sealed.plaintext_len(), plaintext.len());
    }

    #[test]
    fn fresh_nonce_per_call() {
        let key = test_key(5);
        let plaintext = b"same plaintext";

        let first = encrypt(plaintext, &key, None).unwrap();
        let second = encrypt(plaintext, &key, None).unwrap();

        assert_ne!(first.nonce, second.nonce);
        assert_ne!(first.ciphertext, second.ciphertext);
    }

    #[test]
    fn wrong_key_fails_decryption() {
        let sealed = encrypt(b"secret message", &test_key(6), None).unwrap();

        let result = decrypt(&sealed.ciphertext, &sealed.nonce, &test_key(7), None);
        assert_eq!(result, Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn tampered_ciphertext_fails_decryption() {
        let key = test_key(8);
        let mut sealed = encrypt(b"original message", &key, None).unwrap();
        sealed.ciphertext[0] ^= 0x01;

        let result = decrypt(&sealed.ciphertext, &sealed.nonce, &key, None);
        assert_eq!(result, Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn tampered_tag_fails_decryption() {
        let key = test_key(8);
        let mut sealed = encrypt(b"original message", &key, None).unwrap();
        let last = sealed.ciphertext.len() - 1;
        sealed.ciphertext[last] ^= 0x80;

        let result = decrypt(&sealed.ciphertext, &sealed.nonce, &key, None);
        assert_eq!(result, Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn tampered_nonce_fails_decryption() {
        let key = test_key(9);
        let mut sealed = encrypt(b"original message", &key, None).unwrap();
        sealed.nonce[23] ^= 0x01;

        let result = decrypt(&sealed.ciphertext, &sealed.nonce, &key, None);
        assert_eq!(result, Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn tampered_associated_data_fails_decryption() {
        let key = test_key(10);
        let mut aad = [0x11u8; 32];
        let sealed = encrypt(b"report", &key, Some(&aad)).unwrap();
        aad[0] ^= 0x01;

        let result = decrypt(&sealed.ciphertext, &sealed.nonce, &key, Some(&aad));
        assert_eq!(result, Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn missing_associated_data_fails_decryption() {
        let key = test_key(11);
        let sealed = encrypt(b"report", &key, Some(b"context")).unwrap();

        let result = decrypt(&sealed.ciphertext, &sealed.nonce, &key, None);
        assert_eq!(result, Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn rejects_wrong_nonce_length() {
        let key = test_key(12);
        let sealed = encrypt(b"report", &key, None).unwrap();

        let result = decrypt(&sealed.ciphertext, &sealed.nonce[..12], &key, None);
        assert_eq!(result, Err(CryptoError::InvalidNonceLength { expected: 24, actual: 12 }));
    }

    #[test]
    fn rejects_truncated_ciphertext() {
        let key = test_key(13);
        let result = decrypt(&[0u8; TAG_SIZE - 1], &[0u8; NONCE_SIZE], &key, None);
        assert_eq!(result, Err(CryptoError::AuthenticationFailed));
    }

    #[test]
    fn fixed_nonce_is_deterministic() {
        let key = test_key(14);
        let a = encrypt_with_nonce(b"same", &key, Some(b"aad"), [0x00; NONCE_SIZE]);
        let b = encrypt_with_nonce(b"same", &key, Some(b"aad"), [0x00; NONCE_SIZE]);
        assert_eq!(a, b);
    }
}
