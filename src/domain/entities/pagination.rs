use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Offset/limit window, clamped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(offset: Option<i64>, limit: Option<i64>) -> Self {
        let offset = offset.unwrap_or(0).max(0);
        let limit = match limit {
            Some(l) if l < 1 => DEFAULT_PAGE_LIMIT,
            Some(l) => l.min(MAX_PAGE_LIMIT),
            None => DEFAULT_PAGE_LIMIT,
        };

        Self { offset, limit }
    }

    pub fn metadata(&self, total: i64) -> PaginationMetadata {
        PaginationMetadata {
            offset: self.offset,
            limit: self.limit,
            total,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMetadata {
    pub offset: i64,
    pub limit: i64,
    pub total: i64,
}
