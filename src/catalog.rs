use std::{fs, path::Path};

use diesel::{insert_into, Connection, PgConnection, RunQueryDsl};
use serde::de::DeserializeOwned;
use serde_json::from_str;
use thiserror::Error;
use tracing::info;

use crate::{
    database::models::{
        ingredient::{Ingredient, NewIngredient},
        tag::{NewTag, Tag},
    },
    error::{AppError, AppResult},
    store::Store,
};

pub const INGREDIENTS_FILE: &str = "ingredients.json";
pub const TAGS_FILE: &str = "tags.json";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Can't read {file}: {source}")]
    Io {
        file: String,
        source: std::io::Error,
    },

    #[error("Can't parse {file}: {source}")]
    Json {
        file: String,
        source: serde_json::Error,
    },

    #[error("Invalid tag {slug:?}: {reason}")]
    InvalidTag { slug: String, reason: &'static str },

    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub ingredients: usize,
    pub tags: usize,
}

pub fn parse_table<T: DeserializeOwned>(file: &str, json: &str) -> Result<Vec<T>, CatalogError> {
    from_str(json).map_err(|source| CatalogError::Json {
        file: file.to_owned(),
        source,
    })
}

pub fn check_tag(tag: &NewTag) -> Result<(), CatalogError> {
    let invalid = |reason| CatalogError::InvalidTag {
        slug: tag.slug.clone(),
        reason,
    };

    if tag.name.trim().is_empty() {
        return Err(invalid("name is blank"));
    }
    if tag.slug.is_empty()
        || !tag
            .slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(invalid("slug must be letters, digits, '-' or '_'"));
    }

    let hex = tag.color.strip_prefix('#').unwrap_or_default();
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid("color must look like #RRGGBB"));
    }

    Ok(())
}

fn read_table<T: DeserializeOwned>(data_dir: &Path, file: &str) -> Result<Vec<T>, CatalogError> {
    let json = fs::read_to_string(data_dir.join(file)).map_err(|source| CatalogError::Io {
        file: file.to_owned(),
        source,
    })?;

    parse_table(file, &json)
}

/// Loads the reference catalog in one transaction. Rows that already exist are skipped.
pub fn import_catalog(
    connection: &mut PgConnection,
    data_dir: &Path,
) -> Result<ImportReport, CatalogError> {
    use crate::database::schema::{ingredients, tags};

    let new_ingredients: Vec<NewIngredient> = read_table(data_dir, INGREDIENTS_FILE)?;
    let new_tags: Vec<NewTag> = read_table(data_dir, TAGS_FILE)?;
    new_tags.iter().try_for_each(check_tag)?;

    connection.transaction(|connection| {
        info!("Starting fill_ingredients");
        let ingredients = insert_into(ingredients::table)
            .values(&new_ingredients)
            .on_conflict_do_nothing()
            .execute(connection)?;
        info!(inserted = ingredients, "End fill_ingredients");

        info!("Starting fill_tags");
        let tags = insert_into(tags::table)
            .values(&new_tags)
            .on_conflict_do_nothing()
            .execute(connection)?;
        info!(inserted = tags, "End fill_tags");

        Ok(ImportReport { ingredients, tags })
    })
}

pub fn list_tags<S: Store + ?Sized>(store: &S) -> AppResult<Vec<Tag>> {
    store.list_tags()
}

pub fn get_tag<S: Store + ?Sized>(store: &S, tag_id: i32) -> AppResult<Tag> {
    store.find_tag(tag_id)?.ok_or(AppError::NotFound("Tag"))
}

/// All ingredients, or those whose name starts with `name` in any case. A blank name
/// filters nothing.
pub fn search_ingredients<S: Store + ?Sized>(
    store: &S,
    name: Option<&str>,
) -> AppResult<Vec<Ingredient>> {
    let prefix = name.map(str::trim).filter(|name| !name.is_empty());

    store.list_ingredients(prefix)
}

pub fn get_ingredient<S: Store + ?Sized>(store: &S, ingredient_id: i32) -> AppResult<Ingredient> {
    store
        .find_ingredient(ingredient_id)?
        .ok_or(AppError::NotFound("Ingredient"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn reads_tags_and_ingredients_by_id() {
        let store = MemoryStore::new();
        let lunch = store.add_tag("Lunch", "lunch", "#0000FF");
        let salt = store.add_ingredient("salt", "g");

        assert_eq!(list_tags(&store).unwrap(), vec![lunch.clone()]);
        assert_eq!(get_tag(&store, lunch.id).unwrap(), lunch);
        assert_eq!(get_ingredient(&store, salt.id).unwrap().name, "salt");

        assert!(matches!(get_tag(&store, 404), Err(AppError::NotFound("Tag"))));
        assert!(matches!(
            get_ingredient(&store, 404),
            Err(AppError::NotFound("Ingredient"))
        ));
    }

    #[test]
    fn blank_search_lists_everything() {
        let store = MemoryStore::new();
        store.add_ingredient("salt", "g");
        store.add_ingredient("sugar", "g");
        store.add_ingredient("butter", "g");

        let names = |name| -> Vec<String> {
            search_ingredients(&store, name)
                .unwrap()
                .into_iter()
                .map(|ingredient| ingredient.name)
                .collect()
        };

        assert_eq!(names(None).len(), 3);
        assert_eq!(names(Some("  ")).len(), 3);
        assert_eq!(names(Some(" Su")), vec!["sugar"]);
    }

    #[test]
    fn parses_ingredient_rows() {
        let rows: Vec<NewIngredient> = parse_table(
            INGREDIENTS_FILE,
            r#"[{"name": "flour", "measurement_unit": "g"}, {"name": "egg", "measurement_unit": "pcs"}]"#,
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].name, "egg");
        assert_eq!(rows[1].measurement_unit, "pcs");
    }

    #[test]
    fn malformed_file_names_itself() {
        let result: Result<Vec<NewTag>, _> = parse_table(TAGS_FILE, r#"[{"name": "x"}]"#);

        match result {
            Err(CatalogError::Json { file, .. }) => assert_eq!(file, TAGS_FILE),
            other => panic!("expected json error, got {other:?}"),
        }
    }

    #[test]
    fn tag_colors_must_be_hex() {
        let good = NewTag::new("Breakfast".into(), "breakfast".into(), "#E26C2D".into());
        assert!(check_tag(&good).is_ok());

        let bad = NewTag::new("Lunch".into(), "lunch".into(), "green".into());
        assert!(matches!(check_tag(&bad), Err(CatalogError::InvalidTag { .. })));

        let bad_slug = NewTag::new("Dinner".into(), "din ner".into(), "#000000".into());
        assert!(check_tag(&bad_slug).is_err());
    }

    #[test]
    fn bundled_data_is_valid() {
        let ingredients: Vec<NewIngredient> =
            parse_table(INGREDIENTS_FILE, include_str!("../data/ingredients.json")).unwrap();
        let tags: Vec<NewTag> = parse_table(TAGS_FILE, include_str!("../data/tags.json")).unwrap();

        assert!(!ingredients.is_empty());
        assert!(tags.iter().all(|tag| check_tag(tag).is_ok()));
    }
}
