//! Category entity: a named, colored grouping for tasks.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// One category row.
///
/// Tasks point at a category through `Task::category_id`. The reference is
/// soft: deleting a category leaves referencing tasks untouched, and it is
/// up to the caller to reassign them or show a fallback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    /// Unique identifier, assigned by the store on insert
    pub id: i64,
    /// Human-readable label, non-empty
    pub name: String,
    /// Packed ARGB color, usable by renderers directly
    pub color: u32,
    /// Last-modification timestamp (epoch ms)
    pub updated: i64,
}

impl Category {
    /// Create a category with the given name and color.
    ///
    /// The id is left at zero; the store assigns the real one on insert.
    pub fn new(name: impl Into<String>, color: u32) -> Self {
        Category {
            id: 0,
            name: name.into(),
            color,
            updated: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Validate the category.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] if the name is empty or whitespace.
    pub fn normalized(self) -> Result<Self, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName { entity: "category" });
        }
        Ok(self)
    }
}
