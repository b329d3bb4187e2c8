use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MAX_FIELD_KEY_LEN: usize = 64;
pub const MAX_FIELDS: usize = 50;

/// Value stored under a custom-field or metadata key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

/// Key-typed extension map used for ticket custom fields and user/message metadata.
pub type FieldMap = BTreeMap<String, FieldValue>;

pub fn validate_field_map(fields: &FieldMap) -> Result<(), String> {
    if fields.len() > MAX_FIELDS {
        return Err(format!("At most {} custom fields are allowed", MAX_FIELDS));
    }

    for key in fields.keys() {
        if key.is_empty() || key.len() > MAX_FIELD_KEY_LEN {
            return Err(format!(
                "Field key must be 1-{} characters long",
                MAX_FIELD_KEY_LEN
            ));
        }
        if !key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(format!(
                "Field key '{}' may only contain lowercase letters, digits and underscores",
                key
            ));
        }
    }

    Ok(())
}

pub(crate) fn field_map_to_json(fields: &FieldMap) -> String {
    serde_json::to_string(fields).unwrap_or_else(|_| "{}".to_string())
}

pub(crate) fn field_map_from_json(raw: &str) -> Result<FieldMap, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(FieldMap::new());
    }
    serde_json::from_str(raw)
}
