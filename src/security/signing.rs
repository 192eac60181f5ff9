use crate::error::TokenError;
use crate::security::encoding::encode_url_safe;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Holds the process-wide HMAC-SHA256 signing key.
///
/// Built once from configuration at startup and shared by the token issuer
/// and verifier.
#[derive(Clone)]
pub struct TokenSigner {
    mac: HmacSha256,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").field("key", &"(redacted)").finish()
    }
}

impl TokenSigner {
    pub fn new(secret: &str) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::ConfigurationError("signing secret is empty".to_string()));
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| TokenError::ConfigurationError(format!("Failed to create HMAC: {}", e)))?;
        Ok(Self { mac })
    }

    /// Computes the URL-safe base64 HMAC-SHA256 of `message`.
    pub fn sign(&self, message: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(message.as_bytes());
        encode_url_safe(mac.finalize().into_bytes())
    }

    /// Checks an encoded signature against `message` in constant time.
    pub fn verify(&self, message: &str, encoded_signature: &str) -> bool {
        constant_time_equal(&self.sign(message), encoded_signature)
    }
}

/// Compares two strings in constant time to prevent timing attacks
///
/// # Arguments
/// * `a` - First string to compare
/// * `b` - Second string to compare
///
/// # Returns
/// * `bool` - True if strings are equal, false otherwise
pub fn constant_time_equal(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
