use crate::infrastructure::http::middleware::error::{ApiError, ApiResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder,
};

pub const MIN_PASSWORD_LEN: usize = 8;
/// Argon2 inputs past 72 bytes add nothing but cost.
pub const MAX_PASSWORD_LEN: usize = 72;

/// 8-72 characters with at least one letter and one digit.
pub fn validate_password_complexity(password: &str) -> ApiResult<()> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(ApiError::BadRequest(format!(
            "Password must be {}-{} characters long",
            MIN_PASSWORD_LEN, MAX_PASSWORD_LEN
        )));
    }

    if !password.chars().any(char::is_alphabetic) {
        return Err(ApiError::BadRequest(
            "Password must contain at least one letter".to_string(),
        ));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ApiError::BadRequest(
            "Password must contain at least one digit".to_string(),
        ));
    }

    Ok(())
}

/// Hash password using Argon2id with parameters:
/// - m_cost = 19456 KiB (19 MiB)
/// - t_cost = 2 iterations
/// - p_cost = 1
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(19456)
        .t_cost(2)
        .p_cost(1)
        .build()
        .map_err(|_| ApiError::Internal("Failed to build Argon2 params".to_string()))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify password against a stored PHC hash; parameters are read from the hash.
pub fn verify_password(password: &str, hash: &str) -> ApiResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| ApiError::Internal("Invalid password hash format".to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_length_bounds() {
        assert!(validate_password_complexity("abc1234").is_err());
        assert!(validate_password_complexity("abcd1234").is_ok());
        let long = "a".repeat(72) + "1";
        assert!(validate_password_complexity(&long).is_err());
    }

    #[test]
    fn test_password_needs_letter_and_digit() {
        assert!(validate_password_complexity("12345678").is_err());
        assert!(validate_password_complexity("abcdefgh").is_err());
        assert!(validate_password_complexity("passw0rd").is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse 1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse 1", &hash).unwrap());
        assert!(!verify_password("wrong horse 1", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(verify_password("anything1", "not-a-hash").is_err());
    }
}
