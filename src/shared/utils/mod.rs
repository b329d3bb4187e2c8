/// Utility modules
pub mod email_validator;

use chrono::SecondsFormat;
use rand::Rng;

/// Current UTC time as fixed-width RFC 3339 (microseconds, `Z` suffix).
///
/// Fixed width keeps lexicographic order equal to chronological order in the
/// text timestamp columns.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Generate secure random token for sessions (32 bytes = 64 hex characters)
pub fn generate_session_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}
