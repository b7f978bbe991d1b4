// crates/server/src/auth.rs
//! Password hashing (Argon2id) and session tokens (HS256 JWT).

use std::time::Duration;

use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::Argon2;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use watchtower_core::UserType;

pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

const SALT_LEN: usize = 16;
const GENERATED_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Argon2id hasher producing PHC strings.
#[derive(Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let mut salt = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut salt);
        let salt = SaltString::encode_b64(&salt).map_err(|e| AuthError::Hash(e.to_string()))?;

        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hash(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// False on a wrong password; `Err` only when `phc` is not a valid hash.
    pub fn verify(&self, password: &str, phc: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(phc).map_err(|e| AuthError::Hash(e.to_string()))?;
        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: String,
    pub role: UserType,
    pub exp: i64,
    pub iat: i64,
}

/// Issues and verifies signed session tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// A service keyed with fresh random bytes. Tokens do not survive a restart.
    pub fn with_random_secret(ttl: Duration) -> Self {
        let mut secret = [0u8; GENERATED_SECRET_LEN];
        OsRng.fill_bytes(&mut secret);
        Self::new(&secret, ttl)
    }

    pub fn issue(&self, subject: &str, role: UserType) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            role,
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };
        self.sign(&claims)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new();
        let phc = hasher.hash("hunter2").unwrap();

        assert!(phc.starts_with("$argon2id$"));
        assert!(hasher.verify("hunter2", &phc).unwrap());
        assert!(!hasher.verify("hunter3", &phc).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = PasswordHasher::new();
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        let hasher = PasswordHasher::new();
        assert!(hasher.verify("pw", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_issue_then_verify() {
        let tokens = TokenService::new(b"test-secret", DEFAULT_TOKEN_TTL);
        let token = tokens.issue("acct-1", UserType::Admin).unwrap();

        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "acct-1");
        assert_eq!(claims.role, UserType::Admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_token_from_other_key_rejected() {
        let issuer = TokenService::new(b"key-one", DEFAULT_TOKEN_TTL);
        let verifier = TokenService::new(b"key-two", DEFAULT_TOKEN_TTL);
        let token = issuer.issue("acct-1", UserType::User).unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = TokenService::new(b"test-secret", DEFAULT_TOKEN_TTL);
        let past = Utc::now().timestamp() - 7200;
        let token = tokens
            .sign(&Claims {
                sub: "acct-1".into(),
                role: UserType::User,
                iat: past - 3600,
                exp: past,
            })
            .unwrap();
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let tokens = TokenService::with_random_secret(DEFAULT_TOKEN_TTL);
        assert!(tokens.verify("not.a.jwt").is_err());
    }
}
