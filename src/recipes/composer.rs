use tracing::{info, trace_span};

use crate::{
    database::models::recipe::{NewRecipe, RecipeChanges},
    error::{AppError, AppResult, FieldError},
    store::Store,
};

use super::{
    detail::RecipeDetail,
    filter::RecipeFilter,
    input::RecipeInput,
    validation::{validate_recipe, DUPLICATE_NAME},
};

/// Maps recipe documents onto the recipe row and its ingredient/tag join rows.
pub struct RecipeComposer<'a, S: Store + ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> RecipeComposer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn create_recipe(&self, author_id: i32, input: RecipeInput) -> AppResult<RecipeDetail> {
        let span = trace_span!("create_recipe", author_id);
        let _guard = span.enter();

        let mut errors = validate_recipe(&input);
        let name = input.name.trim().to_owned();

        if !name.is_empty() && self.store.author_has_recipe_named(author_id, &name)? {
            errors.push(FieldError::new("name", DUPLICATE_NAME));
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        self.check_references(&input)?;

        let recipe = NewRecipe::new(
            author_id,
            name,
            input.image.trim().to_owned(),
            input.text.trim().to_owned(),
            input.cooking_time,
        );
        let recipe_id = self
            .store
            .insert_recipe(recipe, &input.ingredients, &input.tags)?;
        info!(recipe_id, author_id, "recipe created");

        self.get_recipe(recipe_id, Some(author_id))
    }

    /// Full-document update: scalar fields are overwritten and both association sets are
    /// replaced wholesale, even when unchanged.
    pub fn update_recipe(
        &self,
        recipe_id: i32,
        viewer: Option<i32>,
        input: RecipeInput,
    ) -> AppResult<RecipeDetail> {
        let span = trace_span!("update_recipe", recipe_id);
        let _guard = span.enter();

        let errors = validate_recipe(&input);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        if self.store.recipe_summary(recipe_id)?.is_none() {
            return Err(AppError::NotFound("Recipe"));
        }

        self.check_references(&input)?;

        let changes = RecipeChanges::new(
            input.name.trim().to_owned(),
            input.image.trim().to_owned(),
            input.text.trim().to_owned(),
            input.cooking_time,
        );
        self.store
            .replace_recipe(recipe_id, changes, &input.ingredients, &input.tags)?;
        info!(recipe_id, "recipe updated");

        self.get_recipe(recipe_id, viewer)
    }

    pub fn get_recipe(&self, recipe_id: i32, viewer: Option<i32>) -> AppResult<RecipeDetail> {
        self.store
            .load_recipe(recipe_id, viewer)?
            .ok_or(AppError::NotFound("Recipe"))
    }

    /// Recipes matching `filter`, newest first, as seen by `viewer`.
    pub fn list_recipes(
        &self,
        filter: &RecipeFilter,
        viewer: Option<i32>,
    ) -> AppResult<Vec<RecipeDetail>> {
        let span = trace_span!("list_recipes", ?viewer);
        let _guard = span.enter();

        self.store.list_recipes(filter, viewer)
    }

    pub fn delete_recipe(&self, recipe_id: i32) -> AppResult<()> {
        if !self.store.delete_recipe(recipe_id)? {
            return Err(AppError::NotFound("Recipe"));
        }
        info!(recipe_id, "recipe deleted");

        Ok(())
    }

    fn check_references(&self, input: &RecipeInput) -> AppResult<()> {
        let missing = self.store.missing_ingredient_ids(&input.ingredient_ids())?;
        if !missing.is_empty() {
            return Err(AppError::Reference {
                field: "ingredients".to_owned(),
                ids: missing,
            });
        }

        let missing = self.store.missing_tag_ids(&input.tags)?;
        if !missing.is_empty() {
            return Err(AppError::Reference {
                field: "tags".to_owned(),
                ids: missing,
            });
        }

        Ok(())
    }
}
