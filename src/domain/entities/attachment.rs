use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_ATTACHMENT_BYTES: i64 = 25 * 1024 * 1024;

/// Metadata for a file attached to a message. Bytes live in external storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub message_id: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_path: String,
    pub created_at: String,
}

impl Attachment {
    pub fn new(message_id: String, req: CreateAttachmentRequest) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            message_id,
            file_name: req.file_name.trim().to_string(),
            content_type: req.content_type.trim().to_lowercase(),
            size_bytes: req.size_bytes,
            storage_path: req.storage_path,
            created_at: crate::shared::utils::now_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAttachmentRequest {
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_path: String,
}

impl CreateAttachmentRequest {
    pub fn validate(&self) -> Result<(), String> {
        let name = self.file_name.trim();
        if name.is_empty() || name.len() > 255 {
            return Err("File name must be 1-255 characters".to_string());
        }
        if name.contains('/') || name.contains('\\') {
            return Err("File name cannot contain path separators".to_string());
        }
        if !self.content_type.contains('/') {
            return Err("Content type must look like type/subtype".to_string());
        }
        if self.size_bytes < 0 || self.size_bytes > MAX_ATTACHMENT_BYTES {
            return Err(format!(
                "Attachment size must be between 0 and {} bytes",
                MAX_ATTACHMENT_BYTES
            ));
        }
        if self.storage_path.trim().is_empty() {
            return Err("Storage path cannot be empty".to_string());
        }
        Ok(())
    }
}
