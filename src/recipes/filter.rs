use serde::Deserialize;

use crate::error::{AppError, FieldError};

/// Raw recipe list query string. `tags` may repeat.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct RecipeQuery {
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub is_favorited: Option<String>,
    pub is_in_shopping_cart: Option<String>,
}

/// Which recipes a list request wants.
///
/// Tag slugs are alternatives: a recipe matches when it carries any of them. Unknown slugs
/// match nothing. The two membership flags only narrow the list for an identified viewer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author: Option<i32>,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl TryFrom<RecipeQuery> for RecipeFilter {
    type Error = AppError;

    fn try_from(query: RecipeQuery) -> Result<Self, Self::Error> {
        let mut errors = Vec::new();

        let author = match query.author.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(author) => match author.parse() {
                Ok(author) => Some(author),
                Err(_) => {
                    errors.push(FieldError::new("author", "Enter a whole number."));
                    None
                }
            },
        };

        let is_favorited = parse_flag("is_favorited", query.is_favorited.as_deref(), &mut errors);
        let is_in_shopping_cart = parse_flag(
            "is_in_shopping_cart",
            query.is_in_shopping_cart.as_deref(),
            &mut errors,
        );

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let tags = query
            .tags
            .into_iter()
            .map(|slug| slug.trim().to_owned())
            .filter(|slug| !slug.is_empty())
            .collect();

        Ok(RecipeFilter {
            author,
            tags,
            is_favorited,
            is_in_shopping_cart,
        })
    }
}

fn parse_flag(field: &str, value: Option<&str>, errors: &mut Vec<FieldError>) -> bool {
    match value.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("0") | Some("false") => false,
        Some("1") | Some("true") => true,
        Some(_) => {
            errors.push(FieldError::new(field, "Expected 0, 1, true or false."));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(author: Option<&str>, tags: &[&str], favorited: Option<&str>) -> RecipeQuery {
        RecipeQuery {
            author: author.map(str::to_owned),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            is_favorited: favorited.map(str::to_owned),
            is_in_shopping_cart: None,
        }
    }

    #[test]
    fn empty_query_filters_nothing() {
        assert_eq!(RecipeFilter::try_from(RecipeQuery::default()).unwrap(), RecipeFilter::default());
    }

    #[test]
    fn parses_author_tags_and_flags() {
        let filter =
            RecipeFilter::try_from(query(Some("7"), &["breakfast", " ", "lunch"], Some("1"))).unwrap();

        assert_eq!(filter.author, Some(7));
        assert_eq!(filter.tags, vec!["breakfast", "lunch"]);
        assert!(filter.is_favorited);
        assert!(!filter.is_in_shopping_cart);

        let filter = RecipeFilter::try_from(query(None, &[], Some("False"))).unwrap();
        assert!(!filter.is_favorited);
    }

    #[test]
    fn malformed_values_are_field_errors() {
        match RecipeFilter::try_from(query(Some("chef"), &[], Some("maybe"))) {
            Err(AppError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["author", "is_favorited"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
