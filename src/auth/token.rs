use crate::app_config::PLACEHOLDER_JWT_SECRET;
use crate::error::{CmsError, CmsResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

/// Session token payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// The secret tokens are signed with. Production refuses an empty or
/// placeholder secret; development warns, and replaces an empty one with a
/// random key that lasts until restart.
pub fn resolve_secret(secret: &str, production: bool) -> CmsResult<String> {
    let unusable = secret.is_empty() || secret == PLACEHOLDER_JWT_SECRET;
    if unusable && production {
        return Err(CmsError::Configuration(
            "auth.jwt_secret must be set to a unique value in production".to_string(),
        ));
    }
    if secret.is_empty() {
        log::warn!("auth.jwt_secret is empty; sessions will not survive a restart");
        return Ok(rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(64)
            .map(char::from)
            .collect());
    }
    if unusable {
        log::warn!("Using the default JWT secret; set auth.jwt_secret before deploying");
    }
    Ok(secret.to_owned())
}

/// Issues and verifies HS256 session tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn issue(&self, user_id: &str, username: &str, role: &str) -> CmsResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_owned(),
            username: username.to_owned(),
            role: role.to_owned(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        self.encode(&claims)
    }

    fn encode(&self, claims: &Claims) -> CmsResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| CmsError::Internal(format!("token signing failed: {}", e)))
    }

    /// Claims of a well-signed, unexpired token; `None` otherwise.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                log::debug!("Rejected session token: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let tokens = TokenService::new("unit-test-secret", Duration::days(7));
        let token = tokens.issue("u1", "ed", "editor").unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.role, "editor");
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = TokenService::new("one", Duration::days(7))
            .issue("u1", "ed", "editor")
            .unwrap();
        assert!(TokenService::new("two", Duration::days(7)).verify(&token).is_none());
        assert!(TokenService::new("one", Duration::days(7)).verify("garbage").is_none());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = TokenService::new("unit-test-secret", Duration::days(7));
        let past = Utc::now() - Duration::days(30);
        let token = tokens
            .encode(&Claims {
                sub: "u1".into(),
                username: "ed".into(),
                role: "editor".into(),
                iat: past.timestamp(),
                exp: (past + Duration::days(7)).timestamp(),
            })
            .unwrap();
        assert!(tokens.verify(&token).is_none());
    }

    #[test]
    fn test_placeholder_secret() {
        assert_eq!(
            resolve_secret(PLACEHOLDER_JWT_SECRET, false).unwrap(),
            PLACEHOLDER_JWT_SECRET
        );
        assert!(matches!(
            resolve_secret(PLACEHOLDER_JWT_SECRET, true),
            Err(CmsError::Configuration(_))
        ));
        assert!(matches!(resolve_secret("", true), Err(CmsError::Configuration(_))));
        assert_eq!(resolve_secret("a-real-secret", true).unwrap(), "a-real-secret");
    }

    #[test]
    fn test_empty_secret_is_random_in_development() {
        let first = resolve_secret("", false).unwrap();
        let second = resolve_secret("", false).unwrap();
        assert_eq!(first.len(), 64);
        assert_ne!(first, second);
    }
}
