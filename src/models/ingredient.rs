use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use crate::errors::ApiError;

pub const MAX_NAME_LEN: usize = 255;

/// An ingredient as stored and as serialized: exactly `{id, name}`.
/// The owner is implied by the query that produced it.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct IngredientModel {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct IngredientPayload {
    pub name: String,
}

/// Body of `PATCH /ingredients/{id}`. An absent `name` leaves the row as is.
#[derive(Debug, Default, Deserialize)]
pub struct IngredientPatch {
    pub name: Option<String>,
}

/// Query string of `GET /ingredients/`. Any non-zero integer enables the filter.
#[derive(Debug, Default, Deserialize)]
pub struct IngredientFilter {
    #[serde(default)]
    pub assigned_only: Option<i64>,
}

impl IngredientFilter {
    pub fn assigned_only(&self) -> bool {
        self.assigned_only.unwrap_or(0) != 0
    }
}

/// Trimmed, non-blank, at most [`MAX_NAME_LEN`] characters.
pub fn validate_name(field: &str, value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::validation(format!("{field} may not be blank")));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(value.to_string())
}
