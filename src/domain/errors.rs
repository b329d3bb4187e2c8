use thiserror::Error;

/// Store failure wrapped with the name of the operation that issued it.
#[derive(Error, Debug)]
#[error("{operation} failed: {message}")]
pub struct DatabaseError {
    pub operation: &'static str,
    pub message: String,
    #[source]
    pub source: sqlx::Error,
}

impl DatabaseError {
    pub fn new(operation: &'static str, source: sqlx::Error) -> Self {
        let message = match &source {
            sqlx::Error::Database(db_err) => db_err.message().to_string(),
            other => other.to_string(),
        };

        Self {
            operation,
            message,
            source,
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        match &self.source {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                message.contains("UNIQUE") || message.contains("unique")
            }
            _ => false,
        }
    }
}

/// Attach an operation label to a raw sqlx result.
pub trait DatabaseResultExt<T> {
    fn op(self, operation: &'static str) -> Result<T, DatabaseError>;
}

impl<T> DatabaseResultExt<T> for Result<T, sqlx::Error> {
    fn op(self, operation: &'static str) -> Result<T, DatabaseError> {
        self.map_err(|e| DatabaseError::new(operation, e))
    }
}

#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI provider is not configured")]
    NotConfigured,
    #[error("AI provider request failed: {0}")]
    Provider(String),
    #[error("AI model returned an invalid response")]
    InvalidResponse(String),
    #[error("AI request timed out after {0}s")]
    Timeout(u64),
}

/// Decode error for values read back from a text column.
pub(crate) fn decode_error(message: impl Into<String>) -> sqlx::Error {
    sqlx::Error::Decode(message.into().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_label_in_message() {
        let result: Result<(), sqlx::Error> = Err(sqlx::Error::RowNotFound);
        let err = result.op("get_ticket").unwrap_err();
        assert_eq!(err.operation, "get_ticket");
        assert!(err.to_string().starts_with("get_ticket failed"));
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn test_ai_error_display_hides_detail() {
        let err = AiError::InvalidResponse("expected value at line 1".to_string());
        assert_eq!(err.to_string(), "AI model returned an invalid response");
    }
}
