use crate::config::settings::SigningConfig;
use crate::error::TokenError;
use crate::security::encoding::{decode_url_safe, encode_url_safe};
use crate::security::signing::TokenSigner;
use crate::utils::clock::Clock;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// Signing scheme identifiers carried in every token header
pub const TOKEN_ALGORITHM: &str = "HS256";
pub const TOKEN_TYPE: &str = "token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub alg: String,
    pub typ: String,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            alg: TOKEN_ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
        }
    }
}

/// Claims carried by a confirmation token.
///
/// Field order is the serialized key order. `exp` is required: a token
/// without an expiry does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    #[serde(rename = "email")]
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Seconds since the Unix epoch.
    #[serde(rename = "exp")]
    pub expiry: i64,
}

/// Identity recovered from a valid, unexpired token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedSubject {
    pub subject_id: String,
    pub display_name: Option<String>,
}

/// Builds the issuer/verifier pair sharing one signing key.
pub fn confirmation_tokens(
    config: &SigningConfig,
    clock: Arc<dyn Clock>,
) -> Result<(TokenIssuer, TokenVerifier), TokenError> {
    let signer = Arc::new(TokenSigner::new(&config.secret)?);
    let issuer = TokenIssuer::new(signer.clone(), clock.clone(), config.token_ttl_seconds);
    let verifier = TokenVerifier::new(signer, clock);
    Ok((issuer, verifier))
}

/// Produces compact, URL-safe, signed, expiring tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    signer: Arc<TokenSigner>,
    clock: Arc<dyn Clock>,
    default_ttl_seconds: i64,
}

impl TokenIssuer {
    pub fn new(signer: Arc<TokenSigner>, clock: Arc<dyn Clock>, default_ttl_seconds: i64) -> Self {
        Self {
            signer,
            clock,
            default_ttl_seconds,
        }
    }

    pub fn default_ttl_seconds(&self) -> i64 {
        self.default_ttl_seconds
    }

    /// Issue a token for `subject_id`, valid for `ttl_seconds` (or the
    /// configured default). Email syntax is the caller's concern.
    pub fn issue(
        &self,
        subject_id: &str,
        display_name: Option<&str>,
        ttl_seconds: Option<i64>,
    ) -> Result<String, TokenError> {
        if subject_id.trim().is_empty() {
            return Err(TokenError::InvalidSubject("subject must not be empty".to_string()));
        }

        let ttl = ttl_seconds.unwrap_or(self.default_ttl_seconds);
        let expiry = self.clock.now().timestamp().saturating_add(ttl);

        let payload = TokenPayload {
            subject: subject_id.to_string(),
            name: display_name.map(|name| name.to_string()),
            expiry,
        };

        let encoded_header = encode_json(&TokenHeader::default())?;
        let encoded_payload = encode_json(&payload)?;
        let signing_input = format!("{}.{}", encoded_header, encoded_payload);
        let signature = self.signer.sign(&signing_input);

        debug!("Issued confirmation token (exp: {})", expiry);
        Ok(format!("{}.{}", signing_input, signature))
    }
}

/// Recovers the subject from a token if the signature matches and the
/// expiry has not passed. Tokens are not tracked, so a valid token verifies
/// any number of times until it expires.
#[derive(Clone)]
pub struct TokenVerifier {
    signer: Arc<TokenSigner>,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    pub fn new(signer: Arc<TokenSigner>, clock: Arc<dyn Clock>) -> Self {
        Self { signer, clock }
    }

    pub fn verify(&self, raw_token: &str) -> Result<VerifiedSubject, TokenError> {
        trace!("Verifying confirmation token");

        let token = strip_whitespace(raw_token);
        let (signing_input, encoded_payload, signature) = split_token(&token)?;

        if !self.signer.verify(signing_input, signature) {
            return Err(TokenError::BadSignature);
        }

        let payload_bytes = decode_url_safe(encoded_payload).map_err(|_| TokenError::MalformedToken)?;
        let payload: TokenPayload =
            serde_json::from_slice(&payload_bytes).map_err(|_| TokenError::MalformedToken)?;

        if self.clock.now().timestamp() > payload.expiry {
            return Err(TokenError::Expired);
        }

        Ok(VerifiedSubject {
            subject_id: payload.subject,
            display_name: payload.name,
        })
    }
}

/// Email clients wrap long links and copy-paste adds stray blanks; none of
/// the token's characters are whitespace, so all of it can go.
fn strip_whitespace(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Splits into (`header.payload`, `payload`, `signature`).
fn split_token(token: &str) -> Result<(&str, &str, &str), TokenError> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None)
            if !header.is_empty() && !payload.is_empty() && !signature.is_empty() =>
        {
            let signing_input = &token[..header.len() + 1 + payload.len()];
            Ok((signing_input, payload, signature))
        }
        _ => Err(TokenError::MalformedToken),
    }
}

fn encode_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let json = serde_json::to_vec(value).map_err(|e| TokenError::Encoding(e.to_string()))?;
    Ok(encode_url_safe(json))
}
