use crate::infrastructure::http::middleware::error::{ApiError, ApiResult};

/// Validate an address and return its canonical (trimmed, lower-cased) form.
///
/// Tickets are matched to customers by this canonical form, so every write path
/// that stores an email must go through here.
pub fn validate_and_normalize_email(email: &str) -> ApiResult<String> {
    let trimmed = email.trim();

    if !email_address::EmailAddress::is_valid(trimmed) {
        return Err(ApiError::BadRequest(
            "Invalid email format. Must be in format user@domain.tld".to_string(),
        ));
    }

    // email_address accepts dotless domains; customer addresses need a TLD
    let has_tld = trimmed
        .rsplit_once('@')
        .map(|(_, domain)| domain.contains('.'))
        .unwrap_or(false);
    if !has_tld {
        return Err(ApiError::BadRequest(
            "Invalid email format. Domain must include a TLD (e.g., .com, .org)".to_string(),
        ));
    }

    Ok(trimmed.to_lowercase())
}

/// Display name fallback for accounts created without one.
pub fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_case_and_whitespace() {
        assert_eq!(
            validate_and_normalize_email("  Jane.Doe@Example.COM ").unwrap(),
            "jane.doe@example.com"
        );
    }

    #[test]
    fn test_rejects_missing_parts() {
        assert!(validate_and_normalize_email("janeexample.com").is_err());
        assert!(validate_and_normalize_email("jane@").is_err());
        assert!(validate_and_normalize_email("").is_err());
    }

    #[test]
    fn test_rejects_domain_without_tld() {
        assert!(validate_and_normalize_email("jane@localhost").is_err());
    }

    #[test]
    fn test_local_part() {
        assert_eq!(email_local_part("jane@example.com"), "jane");
        assert_eq!(email_local_part("nobody"), "nobody");
    }
}
