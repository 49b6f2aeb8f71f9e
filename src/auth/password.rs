use crate::error::{CmsError, CmsResult};
use crate::fields::ValidationErrors;
use actix_web::web;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use once_cell::sync::Lazy;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Argon2id with 19 MiB memory and two passes, comparable in cost to bcrypt
/// at 12 rounds.
fn argon2() -> CmsResult<Argon2<'static>> {
    let params = Params::new(19 * 1024, 2, 1, None)
        .map_err(|e| CmsError::Internal(format!("argon2 params: {}", e)))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn hash_blocking(password: &str) -> CmsResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CmsError::Internal(format!("password hashing failed: {}", e)))
}

fn verify_blocking(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("Stored password hash is unreadable: {}", e);
            return false;
        }
    };
    // Parameters come from the PHC string, so older hashes keep verifying.
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Hash checked when a login names no usable account, so every failed
/// login pays for one Argon2 verification.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| hash_blocking("cairn-no-such-user").ok());

/// Hashes on the blocking pool.
pub async fn hash_password(password: String) -> CmsResult<String> {
    web::block(move || hash_blocking(&password)).await?
}

/// Verifies on the blocking pool. Malformed hashes never match.
pub async fn verify_password(password: String, hash: String) -> CmsResult<bool> {
    Ok(web::block(move || verify_blocking(&password, &hash)).await?)
}

/// Runs a verification that can never succeed, matching the cost of
/// checking a real account.
pub async fn verify_dummy(password: String) -> CmsResult<()> {
    web::block(move || {
        if let Some(hash) = DUMMY_HASH.as_deref() {
            verify_blocking(&password, hash);
        }
    })
    .await?;
    Ok(())
}

/// Checks the password policy: at least eight characters with an uppercase
/// letter, a lowercase letter and a digit. Every failed rule is reported.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.add(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
        );
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        errors.add("password", "Password must contain an uppercase letter");
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        errors.add("password", "Password must contain a lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.add("password", "Password must contain a number");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reasons(password: &str) -> Vec<String> {
        validate_password_strength(password)
            .err()
            .and_then(|e| e.field("password").map(|r| r.to_vec()))
            .unwrap_or_default()
    }

    #[test]
    fn test_policy() {
        let short = reasons("short1");
        assert!(short.iter().any(|r| r.contains("at least 8")));

        let lower = reasons("alllowercase1");
        assert_eq!(lower, vec!["Password must contain an uppercase letter"]);

        assert!(validate_password_strength("Password1").is_ok());
        assert!(reasons("PASSWORD1").iter().any(|r| r.contains("lowercase")));
        assert!(reasons("Passwords").iter().any(|r| r.contains("number")));
    }

    #[actix_rt::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("Password1".to_string()).await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Password1".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("Password2".to_string(), hash).await.unwrap());
    }

    #[actix_rt::test]
    async fn test_malformed_hash_never_matches() {
        assert!(!verify_password("Password1".into(), "$2b$12$bcrypt".into()).await.unwrap());
        assert!(!verify_password("".into(), "".into()).await.unwrap());
    }

    #[actix_rt::test]
    async fn test_dummy_hash_costs_as_much_as_a_real_one() {
        verify_dummy("anything".into()).await.unwrap();

        let dummy = DUMMY_HASH.as_deref().unwrap();
        let real = hash_password("Password1".to_string()).await.unwrap();
        let dummy = PasswordHash::new(dummy).unwrap();
        let real = PasswordHash::new(&real).unwrap();
        assert_eq!(dummy.algorithm, real.algorithm);
        assert_eq!(dummy.params, real.params);
        assert!(!verify_blocking("cairn-no-such-user-2", &dummy.to_string()));
    }
}
