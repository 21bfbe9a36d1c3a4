use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, HeaderMap},
};
use serde::de::DeserializeOwned;
use serde_path_to_error::Segment;

use crate::error::{AppError, AppResult, FieldError, NON_FIELD_ERRORS};

/// JSON request body whose decoding failures are reported like validation errors, against
/// the top-level field the bad value sits under.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !has_json_content_type(request.headers()) {
            return Err(AppError::validation(
                NON_FIELD_ERRORS,
                "Expected request with `Content-Type: application/json`.",
            ));
        }

        let bytes = Bytes::from_request(request, state)
            .await
            .map_err(|rejection| AppError::validation(NON_FIELD_ERRORS, rejection.body_text()))?;

        decode(&bytes).map(JsonBody)
    }
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|essence| {
            let essence = essence.trim();
            essence.eq_ignore_ascii_case("application/json") || essence.ends_with("+json")
        })
        .unwrap_or(false)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> AppResult<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);

    let value = serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let field = match error.path().iter().next() {
            Some(Segment::Map { key }) => key.as_str(),
            _ => NON_FIELD_ERRORS,
        };
        AppError::Validation(vec![FieldError::new(field, error.to_string())])
    })?;

    deserializer
        .end()
        .map_err(|error| AppError::validation(NON_FIELD_ERRORS, error.to_string()))?;

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::RecipeInput;

    fn failing_field(json: &str) -> String {
        match decode::<RecipeInput>(json.as_bytes()) {
            Err(AppError::Validation(errors)) => errors[0].field.clone(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn wrong_scalar_type_names_the_field() {
        assert_eq!(failing_field(r#"{"cooking_time": "ten"}"#), "cooking_time");
    }

    #[test]
    fn nested_errors_belong_to_the_list_field() {
        assert_eq!(
            failing_field(r#"{"ingredients": [{"id": "abc", "amount": 1}]}"#),
            "ingredients"
        );
        assert_eq!(failing_field(r#"{"ingredients": [{"id": 1}]}"#), "ingredients");
        assert_eq!(failing_field(r#"{"tags": ["breakfast"]}"#), "tags");
    }

    #[test]
    fn message_keeps_the_nested_path() {
        match decode::<RecipeInput>(br#"{"ingredients": [{"id": 1, "amount": 2}, {"id": "x", "amount": 1}]}"#) {
            Err(AppError::Validation(errors)) => {
                assert!(errors[0].message.starts_with("ingredients[1].id:"), "{}", errors[0].message);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn broken_documents_are_non_field_errors() {
        assert_eq!(failing_field("42"), NON_FIELD_ERRORS);
        assert_eq!(failing_field(r#"{"name": "Soup"} trailing"#), NON_FIELD_ERRORS);
    }

    #[test]
    fn well_formed_body_decodes() {
        let input: RecipeInput =
            decode(br#"{"name": "Soup", "cooking_time": 5, "ingredients": [{"id": 3, "amount": 2}]}"#)
                .unwrap();

        assert_eq!(input.name, "Soup");
        assert_eq!(input.ingredients[0].amount, 2);
        assert!(input.tags.is_empty());
    }

    #[test]
    fn content_type_must_be_json() {
        let mut headers = HeaderMap::new();
        assert!(!has_json_content_type(&headers));

        headers.insert(CONTENT_TYPE, "application/json; charset=utf-8".parse().unwrap());
        assert!(has_json_content_type(&headers));

        headers.insert(CONTENT_TYPE, "text/plain".parse().unwrap());
        assert!(!has_json_content_type(&headers));
    }
}
