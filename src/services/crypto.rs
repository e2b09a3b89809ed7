use base64::{engine::general_purpose, Engine as _};
use ring::{aead, pbkdf2, rand::{SecureRandom, SystemRandom}};
use std::num::NonZeroU32;

use crate::error::CryptoError;

const APP_SECRET: &[u8] = b"smart-ledger-secret-v1";
const PBKDF2_ITERATIONS: u32 = 100_000;
const NONCE_LEN: usize = 12;
const SALT_LEN: usize = 16;
const ENCRYPTED_TAG: &str = "enc:";

/// At-rest protection for the auth token kept in the key-value store.
pub struct CryptoService;

impl CryptoService {
    pub fn is_encrypted(stored: &str) -> bool {
        stored.starts_with(ENCRYPTED_TAG)
    }

    pub fn encrypt_token(token: &str) -> Result<String, CryptoError> {
        let rng = SystemRandom::new();
        let mut salt = [0u8; SALT_LEN];
        rng.fill(&mut salt).map_err(|_| CryptoError::Encryption)?;

        let key = derive_key(&salt)?;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rng.fill(&mut nonce_bytes)
            .map_err(|_| CryptoError::Encryption)?;

        let nonce = aead::Nonce::assume_unique_for_key(nonce_bytes);
        let mut in_out = token.as_bytes().to_vec();
        key.seal_in_place_append_tag(nonce, aead::Aad::empty(), &mut in_out)
            .map_err(|_| CryptoError::Encryption)?;

        Ok(format!(
            "{}{}:{}:{}",
            ENCRYPTED_TAG,
            general_purpose::STANDARD.encode(salt),
            general_purpose::STANDARD.encode(nonce_bytes),
            general_purpose::STANDARD.encode(in_out)
        ))
    }

    /// Decrypts `enc:` payloads. Plain tokens are returned unchanged.
    pub fn decrypt_token(stored: &str) -> Result<String, CryptoError> {
        if !Self::is_encrypted(stored) {
            return Ok(stored.to_string());
        }

        let parts: Vec<&str> = stored[ENCRYPTED_TAG.len()..].split(':').collect();
        if parts.len() != 3 {
            return Err(CryptoError::InvalidPayload(format!(
                "expected 3 segments, got {}",
                parts.len()
            )));
        }
        let salt = decode_part("salt", parts[0])?;
        let nonce_bytes: [u8; NONCE_LEN] = decode_part("nonce", parts[1])?
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::InvalidPayload("nonce length".to_string()))?;
        let mut data = decode_part("ciphertext", parts[2])?;

        let key = derive_key(&salt)?;
        let nonce = aead::Nonce::assume_unique_for_key(nonce_bytes);
        let decrypted = key
            .open_in_place(nonce, aead::Aad::empty(), &mut data)
            .map_err(|_| CryptoError::Decryption)?;
        String::from_utf8(decrypted.to_vec()).map_err(|_| CryptoError::Decryption)
    }
}

fn decode_part(name: &str, value: &str) -> Result<Vec<u8>, CryptoError> {
    general_purpose::STANDARD
        .decode(value)
        .map_err(|e| CryptoError::InvalidPayload(format!("decode {}: {}", name, e)))
}

fn derive_key(salt: &[u8]) -> Result<aead::LessSafeKey, CryptoError> {
    let mut key_bytes = [0u8; 32];
    let iterations = NonZeroU32::new(PBKDF2_ITERATIONS).ok_or(CryptoError::Encryption)?;
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        salt,
        APP_SECRET,
        &mut key_bytes,
    );
    let unbound =
        aead::UnboundKey::new(&aead::AES_256_GCM, &key_bytes).map_err(|_| CryptoError::Encryption)?;
    Ok(aead::LessSafeKey::new(unbound))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypted_token_decrypts() {
        let stored = CryptoService::encrypt_token("eyJhbGciOi.token").unwrap();
        assert!(CryptoService::is_encrypted(&stored));
        assert!(!stored.contains("eyJhbGciOi"));
        assert_eq!(CryptoService::decrypt_token(&stored).unwrap(), "eyJhbGciOi.token");
    }

    #[test]
    fn plain_token_passes_through() {
        assert_eq!(CryptoService::decrypt_token("plain-token").unwrap(), "plain-token");
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let stored = CryptoService::encrypt_token("secret").unwrap();
        let mut parts: Vec<String> = stored.split(':').map(str::to_string).collect();
        parts[3] = general_purpose::STANDARD.encode(b"not the ciphertext at all");
        let tampered = parts.join(":");
        assert!(matches!(
            CryptoService::decrypt_token(&tampered),
            Err(CryptoError::Decryption)
        ));
        assert!(matches!(
            CryptoService::decrypt_token("enc:only-one"),
            Err(CryptoError::InvalidPayload(_))
        ));
    }
}
