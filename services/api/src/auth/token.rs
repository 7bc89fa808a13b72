//! services/api/src/auth/token.rs
//!
//! Signed, time-limited tokens: the activation token that carries a pending
//! registration plus its one-time code, and the access/refresh session tokens.
//! Each kind has its own HMAC secret.

use chrono::Utc;
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::config::TokenConfig;

/// Activation tokens are valid for five minutes.
pub const ACTIVATION_TTL_SECS: u64 = 300;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("token has expired")]
    Expired,
    #[error("activation code does not match")]
    CodeMismatch,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Claims carried by access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// A registration waiting for its email address to be confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivationClaims {
    user: CandidateUser,
    activation_code: String,
    exp: i64,
}

#[derive(Debug, Clone)]
pub struct ActivationToken {
    pub token: String,
    pub activation_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Issues and verifies every token the platform hands out.
pub struct TokenService {
    activation: SigningKeys,
    access: SigningKeys,
    refresh: SigningKeys,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);
    validation
}

fn map_decode_error(e: jsonwebtoken::errors::Error) -> TokenError {
    match e.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid(e.to_string()),
    }
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            activation: SigningKeys::from_secret(&config.activation_secret),
            access: SigningKeys::from_secret(&config.access_secret),
            refresh: SigningKeys::from_secret(&config.refresh_secret),
            access_ttl_secs: config.access_ttl_secs,
            refresh_ttl_secs: config.refresh_ttl_secs,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }

    fn keys(&self, kind: TokenKind) -> (&SigningKeys, u64) {
        match kind {
            TokenKind::Access => (&self.access, self.access_ttl_secs),
            TokenKind::Refresh => (&self.refresh, self.refresh_ttl_secs),
        }
    }

    /// Signs a pending registration together with a fresh random 4-digit code.
    pub fn issue_activation_token(&self, user: CandidateUser) -> Result<ActivationToken, TokenError> {
        let activation_code = rand::thread_rng().gen_range(1000..=9999).to_string();
        let claims = ActivationClaims {
            user,
            activation_code: activation_code.clone(),
            exp: Utc::now().timestamp() + ACTIVATION_TTL_SECS as i64,
        };
        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.activation.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok(ActivationToken {
            token,
            activation_code,
        })
    }

    /// Returns the pending registration if the token is authentic, unexpired, and
    /// `supplied_code` is exactly the embedded code.
    pub fn verify_activation_token(
        &self,
        token: &str,
        supplied_code: &str,
    ) -> Result<CandidateUser, TokenError> {
        let claims = jsonwebtoken::decode::<ActivationClaims>(
            token,
            &self.activation.decoding,
            &validation(),
        )
        .map_err(map_decode_error)?
        .claims;

        if claims.activation_code != supplied_code {
            return Err(TokenError::CodeMismatch);
        }
        Ok(claims.user)
    }

    pub fn issue(&self, kind: TokenKind, user_id: Uuid) -> Result<String, TokenError> {
        let (keys, ttl) = self.keys(kind);
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            id: user_id,
            iat: now,
            exp: now + ttl as i64,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &keys.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn issue_access_token(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue(TokenKind::Access, user_id)
    }

    pub fn issue_refresh_token(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue(TokenKind::Refresh, user_id)
    }

    /// Checks signature and expiry against the secret of `kind`.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<SessionClaims, TokenError> {
        let (keys, _) = self.keys(kind);
        jsonwebtoken::decode::<SessionClaims>(token, &keys.decoding, &validation())
            .map(|data| data.claims)
            .map_err(map_decode_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TokenConfig {
        TokenConfig {
            activation_secret: "activation-test-secret".into(),
            access_secret: "access-test-secret".into(),
            refresh_secret: "refresh-test-secret".into(),
            access_ttl_secs: 300,
            refresh_ttl_secs: 259_200,
        }
    }

    fn candidate() -> CandidateUser {
        CandidateUser {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "secret123".into(),
        }
    }

    #[test]
    fn access_and_refresh_tokens_carry_the_user_id() {
        let tokens = TokenService::new(&config());
        let user_id = Uuid::new_v4();

        let access = tokens.issue_access_token(user_id).unwrap();
        let refresh = tokens.issue_refresh_token(user_id).unwrap();

        let a = tokens.verify(&access, TokenKind::Access).unwrap();
        let r = tokens.verify(&refresh, TokenKind::Refresh).unwrap();
        assert_eq!(a.id, user_id);
        assert_eq!(r.id, user_id);
        assert_eq!(a.exp - a.iat, 300);
        assert_eq!(r.exp - r.iat, 259_200);
    }

    #[test]
    fn secrets_are_not_interchangeable() {
        let tokens = TokenService::new(&config());
        let access = tokens.issue_access_token(Uuid::new_v4()).unwrap();
        assert!(matches!(
            tokens.verify(&access, TokenKind::Refresh),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let tokens = TokenService::new(&config());
        let mut access = tokens.issue_access_token(Uuid::new_v4()).unwrap();
        access.push('x');
        assert!(matches!(
            tokens.verify(&access, TokenKind::Access),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = TokenService::new(&config());
        let now = Utc::now().timestamp();
        let stale = jsonwebtoken::encode(
            &Header::default(),
            &SessionClaims {
                id: Uuid::new_v4(),
                iat: now - 600,
                exp: now - 300,
            },
            &EncodingKey::from_secret(b"refresh-test-secret"),
        )
        .unwrap();
        assert!(matches!(
            tokens.verify(&stale, TokenKind::Refresh),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn activation_code_is_four_digits_and_must_match_exactly() {
        let tokens = TokenService::new(&config());
        let issued = tokens.issue_activation_token(candidate()).unwrap();

        assert_eq!(issued.activation_code.len(), 4);
        assert!(issued.activation_code.chars().all(|c| c.is_ascii_digit()));

        let wrong = if issued.activation_code == "1234" { "4321" } else { "1234" };
        assert!(matches!(
            tokens.verify_activation_token(&issued.token, wrong),
            Err(TokenError::CodeMismatch)
        ));
        assert!(matches!(
            tokens.verify_activation_token(&issued.token, &format!(" {}", issued.activation_code)),
            Err(TokenError::CodeMismatch)
        ));

        let user = tokens
            .verify_activation_token(&issued.token, &issued.activation_code)
            .unwrap();
        assert_eq!(user, candidate());
    }

    #[test]
    fn activation_token_needs_the_activation_secret() {
        let tokens = TokenService::new(&config());
        let session_token = tokens.issue_access_token(Uuid::new_v4()).unwrap();
        assert!(matches!(
            tokens.verify_activation_token(&session_token, "1234"),
            Err(TokenError::Invalid(_))
        ));
    }
}
