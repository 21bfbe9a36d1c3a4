use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use itertools::Itertools;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type AppResult<T> = Result<T, AppError>;

/// Field name for complaints that belong to the payload as a whole.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// A single client-facing complaint about one input field.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_owned(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {}", .0.iter().map(|e| format!("{}: {}", e.field, e.message)).join("; "))]
    Validation(Vec<FieldError>),

    #[error("{field} references missing objects: {ids:?}")]
    Reference { field: String, ids: Vec<i32> },

    #[error("{field}: {message}")]
    Conflict { field: String, message: String },

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(DieselError),

    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn conflict(field: &str, message: impl Into<String>) -> Self {
        AppError::Conflict {
            field: field.to_owned(),
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Reference { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Pool(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<DieselError> for AppError {
    fn from(error: DieselError) -> Self {
        match error {
            DieselError::NotFound => AppError::NotFound("Record"),
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, ref info) => {
                AppError::Reference {
                    field: reference_field(info.table_name()).to_owned(),
                    ids: Vec::new(),
                }
            }
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) => {
                AppError::Conflict {
                    field: info.column_name().unwrap_or(NON_FIELD_ERRORS).to_owned(),
                    message: info.message().to_owned(),
                }
            }
            error => AppError::Database(error),
        }
    }
}

// Join tables name the payload field the client used to reference the rows.
fn reference_field(table: Option<&str>) -> &str {
    match table {
        Some("ingredient_recipes") => "ingredients",
        Some("tag_recipes") => "tags",
        Some("favorites") | Some("shopping_carts") => "recipe",
        Some("follows") => "author",
        Some(other) => other,
        None => NON_FIELD_ERRORS,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::Validation(errors) => {
                let mut fields: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
                errors.iter().for_each(|error| {
                    fields
                        .entry(error.field.as_str())
                        .or_default()
                        .push(error.message.as_str());
                });
                json!({ "errors": fields })
            }
            AppError::Reference { field, ids } => json!({
                "errors": { field.as_str(): [self.to_string()] },
                "missing_ids": ids,
            }),
            AppError::Conflict { field, message } => json!({
                "errors": { field.as_str(): [message] },
            }),
            AppError::NotFound(_) | AppError::Unauthorized => json!({ "detail": self.to_string() }),
            AppError::Database(_) | AppError::Pool(_) | AppError::Internal(_) => {
                error!("{self}");
                json!({ "detail": "Internal server error" })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_requests() {
        let error = AppError::validation("cooking_time", "must be at least 1");
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.to_string(), "Invalid input: cooking_time: must be at least 1");
    }

    #[test]
    fn conflicts_and_missing_rows_have_their_own_status() {
        assert_eq!(
            AppError::conflict("recipe", "already in favorites").status(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::NotFound("Recipe").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::from(DieselError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn join_tables_map_to_payload_fields() {
        assert_eq!(reference_field(Some("ingredient_recipes")), "ingredients");
        assert_eq!(reference_field(Some("tag_recipes")), "tags");
        assert_eq!(reference_field(None), "non_field_errors");
    }
}
