//! Access tokens as JWE compact serialization (`alg=dir`, `enc=A256GCM`).
//!
//! The shared symmetric key is used directly as the content-encryption key, so
//! the token is both opaque to the client and tamper-evident: the protected
//! header is authenticated together with the ciphertext by the GCM tag.

use chrono::{Duration, Utc};
use josekit::jwe::{
    self, Dir, JweHeader,
    alg::direct::{DirectJweDecrypter, DirectJweEncrypter},
};
use tracing::debug;
use uuid::Uuid;

use super::maker::{TokenError, TokenMaker};
use super::payload::Payload;

/// A256GCM key size in bytes.
pub const KEY_SIZE: usize = 32;

const CONTENT_ENCRYPTION: &str = "A256GCM";

pub struct JweTokenMaker {
    encrypter: DirectJweEncrypter,
    decrypter: DirectJweDecrypter,
}

impl std::fmt::Debug for JweTokenMaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("JweTokenMaker")
            .field("alg", &"dir")
            .field("enc", &CONTENT_ENCRYPTION)
            .finish()
    }
}

impl JweTokenMaker {
    /// Build a maker bound to `key`, which must be exactly [`KEY_SIZE`] bytes.
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, TokenError> {
        let key = key.as_ref();
        if key.len() != KEY_SIZE {
            return Err(TokenError::InvalidKeySize {
                expected: KEY_SIZE,
                actual: key.len(),
            });
        }

        let encrypter = Dir
            .encrypter_from_bytes(key)
            .map_err(|e| TokenError::Encrypt(e.to_string()))?;
        let decrypter = Dir
            .decrypter_from_bytes(key)
            .map_err(|e| TokenError::Encrypt(e.to_string()))?;

        Ok(Self {
            encrypter,
            decrypter,
        })
    }

    fn decrypt(&self, token: &str) -> Result<Payload, TokenError> {
        let (bytes, header) = jwe::deserialize_compact(token, &self.decrypter).map_err(|e| {
            debug!(error = %e, "token decryption failed");
            TokenError::Invalid
        })?;

        if header.content_encryption() != Some(CONTENT_ENCRYPTION) {
            debug!(enc = ?header.content_encryption(), "unexpected token content encryption");
            return Err(TokenError::Invalid);
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            debug!(error = %e, "token payload is not a valid claims object");
            TokenError::Invalid
        })
    }
}

impl TokenMaker for JweTokenMaker {
    fn create_token(&self, user_id: Uuid, duration: Duration) -> Result<String, TokenError> {
        let token_id = random_token_id()?;
        let payload = Payload::new(token_id, user_id, Utc::now(), duration)
            .ok_or(TokenError::DurationOutOfRange)?;

        let bytes =
            serde_json::to_vec(&payload).map_err(|e| TokenError::Encrypt(e.to_string()))?;

        let mut header = JweHeader::new();
        header.set_content_encryption(CONTENT_ENCRYPTION);

        jwe::serialize_compact(&bytes, &header, &self.encrypter)
            .map_err(|e| TokenError::Encrypt(e.to_string()))
    }

    fn verify_token(&self, token: &str) -> Result<Payload, TokenError> {
        let payload = self.decrypt(token)?;
        payload.check_expired()?;
        Ok(payload)
    }
}

// 128 bits straight from the OS; not a v4 UUID, which would fix 6 of the bits.
fn random_token_id() -> Result<Uuid, TokenError> {
    let mut bytes = [0u8; 16];
    getrandom::fill(&mut bytes).map_err(|e| TokenError::Random(e.to_string()))?;
    Ok(Uuid::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    use super::*;

    const KEY: &[u8; 32] = b"0123456789abcdef0123456789abcdef";
    const OTHER_KEY: &[u8; 32] = b"fedcba9876543210fedcba9876543210";
    const B64URL: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

    fn maker() -> JweTokenMaker {
        JweTokenMaker::new(KEY).unwrap()
    }

    // Flip the high bit of the 6-bit value so the change is never absorbed by
    // unused trailing bits; separators become a base64 character.
    fn corrupt(token: &str, i: usize) -> String {
        let mut bytes = token.as_bytes().to_vec();
        bytes[i] = match B64URL.iter().position(|&c| c == bytes[i]) {
            Some(v) => B64URL[v ^ 32],
            None => b'A',
        };
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn rejects_wrong_key_sizes() {
        for len in [0, 16, 31, 33, 64] {
            let key = vec![7u8; len];
            match JweTokenMaker::new(&key) {
                Err(TokenError::InvalidKeySize { expected, actual }) => {
                    assert_eq!(expected, KEY_SIZE);
                    assert_eq!(actual, len);
                }
                other => panic!("len {len}: expected InvalidKeySize, got {other:?}"),
            }
        }
    }

    #[test]
    fn round_trip_preserves_claims() {
        let maker = maker();
        let user_id = Uuid::new_v4();
        let before = Utc::now();

        let token = maker.create_token(user_id, Duration::minutes(15)).unwrap();
        let payload = maker.verify_token(&token).unwrap();

        let after = Utc::now();
        assert_eq!(payload.user_id(), user_id);
        assert!(payload.issued_at() >= before && payload.issued_at() <= after);
        assert_eq!(
            payload.expired_at(),
            payload.issued_at() + Duration::minutes(15)
        );
    }

    #[test]
    fn token_ids_are_unique_per_token() {
        let maker = maker();
        let user_id = Uuid::new_v4();

        let a = maker.create_token(user_id, Duration::minutes(1)).unwrap();
        let b = maker.create_token(user_id, Duration::minutes(1)).unwrap();

        assert_ne!(a, b);
        let a = maker.verify_token(&a).unwrap();
        let b = maker.verify_token(&b).unwrap();
        assert_ne!(a.token_id(), b.token_id());
        assert_eq!(a.user_id(), b.user_id());
    }

    #[test]
    fn any_single_byte_corruption_is_rejected() {
        let maker = maker();
        let token = maker
            .create_token(Uuid::new_v4(), Duration::minutes(5))
            .unwrap();

        for i in 0..token.len() {
            let tampered = corrupt(&token, i);
            assert_ne!(tampered, token);
            assert!(
                matches!(maker.verify_token(&tampered), Err(TokenError::Invalid)),
                "corruption at byte {i} was accepted"
            );
        }
    }

    #[test]
    fn truncated_or_garbage_tokens_are_invalid() {
        let maker = maker();
        let token = maker
            .create_token(Uuid::new_v4(), Duration::minutes(5))
            .unwrap();

        for bad in [
            "",
            "not-a-token",
            "a.b.c.d.e",
            &token[..token.len() - 1],
            &token[..token.len() / 2],
        ] {
            assert!(matches!(maker.verify_token(bad), Err(TokenError::Invalid)));
        }
    }

    #[test]
    fn token_from_another_key_is_invalid() {
        let other = JweTokenMaker::new(OTHER_KEY).unwrap();
        let token = other
            .create_token(Uuid::new_v4(), Duration::minutes(5))
            .unwrap();

        assert!(matches!(maker().verify_token(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn expired_token_decrypts_but_fails_verification() {
        let maker = maker();
        let token = maker
            .create_token(Uuid::new_v4(), Duration::seconds(-1))
            .unwrap();

        assert!(maker.decrypt(&token).is_ok());
        assert!(matches!(maker.verify_token(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn other_content_encryption_under_the_same_key_is_invalid() {
        // A128CBC-HS256 also takes a 32-byte key, so `dir` accepts it.
        let encrypter = Dir.encrypter_from_bytes(KEY).unwrap();
        let payload = Payload::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Utc::now(),
            Duration::minutes(5),
        )
        .unwrap();
        let bytes = serde_json::to_vec(&payload).unwrap();

        let mut header = JweHeader::new();
        header.set_content_encryption("A128CBC-HS256");
        let token = jwe::serialize_compact(&bytes, &header, &encrypter).unwrap();

        assert!(matches!(maker().verify_token(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn token_is_opaque_jwe_compact() {
        let user_id = Uuid::new_v4();
        let token = maker().create_token(user_id, Duration::minutes(5)).unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 5);
        // `dir` carries no encrypted key
        assert!(parts[1].is_empty());

        let header: serde_json::Value =
            serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[0]).unwrap()).unwrap();
        assert_eq!(header["alg"], "dir");
        assert_eq!(header["enc"], CONTENT_ENCRYPTION);

        let ciphertext = URL_SAFE_NO_PAD.decode(parts[3]).unwrap();
        assert!(!String::from_utf8_lossy(&ciphertext).contains("user_id"));
        assert!(!token.contains(&user_id.to_string()));
    }

    #[test]
    fn debug_does_not_leak_key() {
        let printed = format!("{:?}", maker());
        assert!(!printed.contains("0123456789abcdef"));
    }
}
