/// JWT Token Codec
///
/// Encodes and decodes signed claim sets with one shared secret and one
/// HMAC algorithm. Decoding checks, in order:
/// 1. the token has three segments and a readable header
/// 2. the header declares exactly the configured HMAC algorithm
///    (`none` and asymmetric schemes are refused before any signature work)
/// 3. the signature
/// 4. the claim payload shape
/// 5. the validity window against the caller's `now`

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

use crate::auth::claims::ValidityWindow;
use crate::error::{ConfigError, TokenError};

/// Parse a configured algorithm name, accepting only the HMAC family.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    match Algorithm::from_str(name) {
        Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
        _ => Err(ConfigError::InvalidValue(format!(
            "jwt.algorithm must be HS256, HS384 or HS512 (got '{}')",
            name
        ))),
    }
}

pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec for `secret`.
    ///
    /// # Errors
    /// Returns error if the secret is empty or the algorithm is not HMAC
    pub fn new(secret: &str, algorithm: Algorithm) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt.secret".to_string()));
        }
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(ConfigError::InvalidValue(format!(
                "unsupported signing algorithm {:?}",
                algorithm
            )));
        }

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Sign a claim set.
    pub fn encode<C: Serialize>(&self, claims: &C) -> Result<String, TokenError> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Verify `token` and recover its claims as of unix time `now`.
    pub fn decode<C>(&self, token: &str, now: i64) -> Result<C, TokenError>
    where
        C: DeserializeOwned + ValidityWindow,
    {
        let declared = declared_algorithm(token)?;
        match Algorithm::from_str(&declared) {
            Ok(alg) if alg == self.algorithm => {}
            _ => return Err(TokenError::SignatureInvalid),
        }

        let claims = decode::<C>(token, &self.decoding_key, &self.validation())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::SignatureInvalid
                }
                ErrorKind::ExpiredSignature => TokenError::TokenExpired,
                ErrorKind::ImmatureSignature => TokenError::TokenNotYetValid,
                _ => TokenError::Malformed,
            })?;

        check_window(&claims, now)?;
        Ok(claims)
    }

    /// Signature and algorithm only; time checks use the injected clock in
    /// `check_window` instead of jsonwebtoken's system time.
    fn validation(&self) -> Validation {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::new();
        validation
    }
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Read the `alg` a token declares without trusting anything else in it.
fn declared_algorithm(token: &str) -> Result<String, TokenError> {
    let mut segments = token.split('.');
    let (Some(header), Some(_), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed);
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_| TokenError::Malformed)?;
    let header: RawHeader = serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)?;
    Ok(header.alg)
}

fn check_window<C: ValidityWindow>(claims: &C, now: i64) -> Result<(), TokenError> {
    if claims.token_use() != C::TOKEN_USE {
        return Err(TokenError::Malformed);
    }
    if claims.subject() != claims.user_id().to_string() {
        return Err(TokenError::Malformed);
    }
    if claims.expires_at() <= claims.issued_at() {
        return Err(TokenError::Malformed);
    }
    if now < claims.not_before() {
        return Err(TokenError::TokenNotYetValid);
    }
    if now > claims.expires_at() {
        return Err(TokenError::TokenExpired);
    }
    Ok(())
}
