use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use chrono::Utc;
use itertools::Itertools;
use tracing::debug;

use crate::{
    database::models::{
        favorite::Favorite,
        follow::Follow,
        ingredient::Ingredient,
        ingredient_recipe::IngredientRecipe,
        recipe::{NewRecipe, Recipe, RecipeChanges},
        shopping_cart::ShoppingCart,
        tag::Tag,
        tag_recipe::TagRecipe,
        user::User,
    },
    error::{AppError, AppResult},
    recipes::{
        Author, AuthorDetail, IngredientAmount, RecipeDetail, RecipeFilter, RecipeIngredient,
        RecipeSummary, DUPLICATE_NAME,
    },
};

use super::{CartIngredientRow, Membership, Store};

#[derive(Default)]
struct Tables {
    next_id: i32,
    users: BTreeMap<i32, User>,
    ingredients: BTreeMap<i32, Ingredient>,
    tags: BTreeMap<i32, Tag>,
    recipes: BTreeMap<i32, Recipe>,
    ingredient_recipes: Vec<IngredientRecipe>,
    tag_recipes: Vec<TagRecipe>,
    favorites: Vec<Favorite>,
    shopping_carts: Vec<ShoppingCart>,
    follows: Vec<Follow>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    // Mirrors the foreign keys and unique constraints of the join tables, so a failing write
    // is rejected before anything is touched.
    fn check_join_rows(&self, ingredients: &[IngredientAmount], tag_ids: &[i32]) -> AppResult<()> {
        let missing_ingredients: Vec<i32> = ingredients
            .iter()
            .map(|ingredient| ingredient.id)
            .filter(|id| !self.ingredients.contains_key(id))
            .unique()
            .collect();
        if !missing_ingredients.is_empty() {
            return Err(AppError::Reference {
                field: "ingredients".to_owned(),
                ids: missing_ingredients,
            });
        }

        let missing_tags: Vec<i32> = tag_ids
            .iter()
            .copied()
            .filter(|id| !self.tags.contains_key(id))
            .unique()
            .collect();
        if !missing_tags.is_empty() {
            return Err(AppError::Reference {
                field: "tags".to_owned(),
                ids: missing_tags,
            });
        }

        if !ingredients.iter().map(|ingredient| ingredient.id).all_unique() {
            return Err(AppError::conflict(
                "ingredients",
                "duplicate key value violates unique constraint on (recipe_id, ingredient_id)",
            ));
        }
        if !tag_ids.iter().all_unique() {
            return Err(AppError::conflict(
                "tags",
                "duplicate key value violates unique constraint on (recipe_id, tag_id)",
            ));
        }

        Ok(())
    }

    fn insert_join_rows(&mut self, recipe_id: i32, ingredients: &[IngredientAmount], tag_ids: &[i32]) {
        for ingredient in ingredients {
            let id = self.next_id();
            self.ingredient_recipes.push(IngredientRecipe::new(
                id,
                ingredient.id,
                recipe_id,
                ingredient.amount,
            ));
        }

        for &tag_id in tag_ids {
            let id = self.next_id();
            self.tag_recipes.push(TagRecipe::new(id, tag_id, recipe_id));
        }
    }

    fn membership_exists(&self, kind: Membership, user_id: i32, target_id: i32) -> bool {
        match kind {
            Membership::Favorite => self
                .favorites
                .iter()
                .any(|row| row.user_id == user_id && row.recipe_id == target_id),
            Membership::ShoppingCart => self
                .shopping_carts
                .iter()
                .any(|row| row.user_id == user_id && row.recipe_id == target_id),
            Membership::Follow => self
                .follows
                .iter()
                .any(|row| row.user_id == user_id && row.author_id == target_id),
        }
    }

    fn summary(recipe: &Recipe) -> RecipeSummary {
        RecipeSummary {
            id: recipe.id,
            name: recipe.name.clone(),
            image: recipe.image.clone(),
            cooking_time: recipe.cooking_time,
        }
    }

    fn author(&self, viewer: Option<i32>, user_id: i32) -> Option<Author> {
        let user = self.users.get(&user_id)?.clone();
        let is_subscribed = viewer
            .is_some_and(|viewer| self.membership_exists(Membership::Follow, viewer, user_id));

        Some(Author {
            user,
            is_subscribed,
        })
    }

    fn detail(&self, recipe: &Recipe, viewer: Option<i32>) -> AppResult<RecipeDetail> {
        let author = self
            .author(viewer, recipe.author_id)
            .ok_or(AppError::NotFound("User"))?;

        let ingredients = self
            .ingredient_recipes
            .iter()
            .filter(|row| row.recipe_id == recipe.id)
            .filter_map(|row| {
                self.ingredients
                    .get(&row.ingredient_id)
                    .map(|ingredient| RecipeIngredient {
                        id: ingredient.id,
                        name: ingredient.name.clone(),
                        measurement_unit: ingredient.measurement_unit.clone(),
                        amount: row.amount,
                    })
            })
            .collect();

        let tags = self
            .tag_recipes
            .iter()
            .filter(|row| row.recipe_id == recipe.id)
            .filter_map(|row| self.tags.get(&row.tag_id).cloned())
            .collect();

        let (is_favorited, is_in_shopping_cart) = match viewer {
            Some(viewer) => (
                self.membership_exists(Membership::Favorite, viewer, recipe.id),
                self.membership_exists(Membership::ShoppingCart, viewer, recipe.id),
            ),
            None => (false, false),
        };

        Ok(RecipeDetail {
            id: recipe.id,
            author,
            name: recipe.name.clone(),
            image: recipe.image.clone(),
            text: recipe.text.clone(),
            cooking_time: recipe.cooking_time,
            pub_date: recipe.pub_date,
            ingredients,
            tags,
            is_favorited,
            is_in_shopping_cart,
        })
    }

    fn newest_first(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes
            .values()
            .sorted_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)))
    }

    fn matches(&self, recipe: &Recipe, filter: &RecipeFilter, viewer: Option<i32>) -> bool {
        if filter.author.is_some_and(|author| author != recipe.author_id) {
            return false;
        }

        if !filter.tags.is_empty()
            && !self.tag_recipes.iter().any(|row| {
                row.recipe_id == recipe.id
                    && self
                        .tags
                        .get(&row.tag_id)
                        .is_some_and(|tag| filter.tags.contains(&tag.slug))
            })
        {
            return false;
        }

        match viewer {
            Some(viewer) => {
                (!filter.is_favorited
                    || self.membership_exists(Membership::Favorite, viewer, recipe.id))
                    && (!filter.is_in_shopping_cart
                        || self.membership_exists(Membership::ShoppingCart, viewer, recipe.id))
            }
            None => true,
        }
    }

    fn author_detail(
        &self,
        viewer: i32,
        author_id: i32,
        recipes_limit: Option<usize>,
    ) -> Option<AuthorDetail> {
        let user = self.users.get(&author_id)?.clone();

        let authored: Vec<&Recipe> = self
            .newest_first()
            .filter(|recipe| recipe.author_id == author_id)
            .collect();

        let recipes = authored
            .iter()
            .take(recipes_limit.unwrap_or(usize::MAX))
            .map(|recipe| Tables::summary(recipe))
            .collect();

        Some(AuthorDetail {
            user,
            is_subscribed: self.membership_exists(Membership::Follow, viewer, author_id),
            recipes,
            recipes_count: authored.len() as i64,
        })
    }
}

/// Store kept entirely in process memory.
///
/// Every operation runs under one lock and validates before mutating, so writes are all or
/// nothing just like the database transactions.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_user(&self, username: &str) -> User {
        let mut tables = self.tables();
        let id = tables.next_id();
        let user = User::new(
            id,
            format!("{username}@foodgram.local"),
            username.to_owned(),
            username.to_owned(),
            String::new(),
        );
        tables.users.insert(id, user.clone());
        user
    }

    pub fn add_ingredient(&self, name: &str, measurement_unit: &str) -> Ingredient {
        let mut tables = self.tables();
        let id = tables.next_id();
        let ingredient = Ingredient::new(id, name.to_owned(), measurement_unit.to_owned());
        tables.ingredients.insert(id, ingredient.clone());
        ingredient
    }

    pub fn add_tag(&self, name: &str, slug: &str, color: &str) -> Tag {
        let mut tables = self.tables();
        let id = tables.next_id();
        let tag = Tag::new(id, name.to_owned(), slug.to_owned(), color.to_owned());
        tables.tags.insert(id, tag.clone());
        tag
    }
}

impl Store for MemoryStore {
    fn find_user(&self, user_id: i32) -> AppResult<Option<User>> {
        Ok(self.tables().users.get(&user_id).cloned())
    }

    fn user_profile(&self, viewer: i32, user_id: i32) -> AppResult<Option<Author>> {
        Ok(self.tables().author(Some(viewer), user_id))
    }

    fn list_tags(&self) -> AppResult<Vec<Tag>> {
        Ok(self.tables().tags.values().cloned().collect())
    }

    fn find_tag(&self, tag_id: i32) -> AppResult<Option<Tag>> {
        Ok(self.tables().tags.get(&tag_id).cloned())
    }

    fn list_ingredients(&self, name_prefix: Option<&str>) -> AppResult<Vec<Ingredient>> {
        let prefix = name_prefix.map(str::to_lowercase);

        Ok(self
            .tables()
            .ingredients
            .values()
            .filter(|ingredient| {
                prefix
                    .as_deref()
                    .map_or(true, |prefix| ingredient.name.to_lowercase().starts_with(prefix))
            })
            .cloned()
            .collect())
    }

    fn find_ingredient(&self, ingredient_id: i32) -> AppResult<Option<Ingredient>> {
        Ok(self.tables().ingredients.get(&ingredient_id).cloned())
    }

    fn missing_ingredient_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>> {
        let tables = self.tables();

        Ok(ids
            .iter()
            .copied()
            .filter(|id| !tables.ingredients.contains_key(id))
            .unique()
            .collect())
    }

    fn missing_tag_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>> {
        let tables = self.tables();

        Ok(ids
            .iter()
            .copied()
            .filter(|id| !tables.tags.contains_key(id))
            .unique()
            .collect())
    }

    fn author_has_recipe_named(&self, author_id: i32, name: &str) -> AppResult<bool> {
        Ok(self
            .tables()
            .recipes
            .values()
            .any(|recipe| recipe.author_id == author_id && recipe.name == name))
    }

    fn insert_recipe(
        &self,
        recipe: NewRecipe,
        ingredients: &[IngredientAmount],
        tag_ids: &[i32],
    ) -> AppResult<i32> {
        let mut tables = self.tables();

        if !tables.users.contains_key(&recipe.author_id) {
            return Err(AppError::Reference {
                field: "author".to_owned(),
                ids: vec![recipe.author_id],
            });
        }
        if tables
            .recipes
            .values()
            .any(|existing| existing.author_id == recipe.author_id && existing.name == recipe.name)
        {
            return Err(AppError::validation("name", DUPLICATE_NAME));
        }
        tables.check_join_rows(ingredients, tag_ids)?;

        let id = tables.next_id();
        tables.recipes.insert(
            id,
            Recipe::new(
                id,
                recipe.author_id,
                recipe.name,
                recipe.image,
                recipe.text,
                recipe.cooking_time,
                Utc::now(),
            ),
        );
        tables.insert_join_rows(id, ingredients, tag_ids);
        debug!(recipe_id = id, "recipe inserted");

        Ok(id)
    }

    fn replace_recipe(
        &self,
        recipe_id: i32,
        changes: RecipeChanges,
        ingredients: &[IngredientAmount],
        tag_ids: &[i32],
    ) -> AppResult<()> {
        let mut tables = self.tables();

        if !tables.recipes.contains_key(&recipe_id) {
            return Err(AppError::NotFound("Recipe"));
        }
        tables.check_join_rows(ingredients, tag_ids)?;

        if let Some(recipe) = tables.recipes.get_mut(&recipe_id) {
            recipe.name = changes.name;
            recipe.image = changes.image;
            recipe.text = changes.text;
            recipe.cooking_time = changes.cooking_time;
        }

        tables.ingredient_recipes.retain(|row| row.recipe_id != recipe_id);
        tables.tag_recipes.retain(|row| row.recipe_id != recipe_id);
        tables.insert_join_rows(recipe_id, ingredients, tag_ids);

        Ok(())
    }

    fn delete_recipe(&self, recipe_id: i32) -> AppResult<bool> {
        let mut tables = self.tables();

        if tables.recipes.remove(&recipe_id).is_none() {
            return Ok(false);
        }

        tables.ingredient_recipes.retain(|row| row.recipe_id != recipe_id);
        tables.tag_recipes.retain(|row| row.recipe_id != recipe_id);
        tables.favorites.retain(|row| row.recipe_id != recipe_id);
        tables.shopping_carts.retain(|row| row.recipe_id != recipe_id);

        Ok(true)
    }

    fn load_recipe(&self, recipe_id: i32, viewer: Option<i32>) -> AppResult<Option<RecipeDetail>> {
        let tables = self.tables();

        tables
            .recipes
            .get(&recipe_id)
            .map(|recipe| tables.detail(recipe, viewer))
            .transpose()
    }

    fn list_recipes(
        &self,
        filter: &RecipeFilter,
        viewer: Option<i32>,
    ) -> AppResult<Vec<RecipeDetail>> {
        let tables = self.tables();

        tables
            .newest_first()
            .filter(|recipe| tables.matches(recipe, filter, viewer))
            .map(|recipe| tables.detail(recipe, viewer))
            .collect()
    }

    fn recipe_summary(&self, recipe_id: i32) -> AppResult<Option<RecipeSummary>> {
        Ok(self.tables().recipes.get(&recipe_id).map(Tables::summary))
    }

    fn cart_ingredient_rows(&self, user_id: i32) -> AppResult<Vec<CartIngredientRow>> {
        let tables = self.tables();

        Ok(tables
            .shopping_carts
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .flat_map(|entry| {
                tables
                    .ingredient_recipes
                    .iter()
                    .filter(move |row| row.recipe_id == entry.recipe_id)
            })
            .filter_map(|row| {
                tables
                    .ingredients
                    .get(&row.ingredient_id)
                    .map(|ingredient| CartIngredientRow {
                        recipe_id: row.recipe_id,
                        ingredient_id: ingredient.id,
                        name: ingredient.name.clone(),
                        measurement_unit: ingredient.measurement_unit.clone(),
                        amount: row.amount,
                    })
            })
            .collect())
    }

    fn insert_membership(&self, kind: Membership, user_id: i32, target_id: i32) -> AppResult<()> {
        let mut tables = self.tables();

        let target_exists = match kind {
            Membership::Favorite | Membership::ShoppingCart => {
                tables.recipes.contains_key(&target_id)
            }
            Membership::Follow => tables.users.contains_key(&target_id),
        };
        if !target_exists || !tables.users.contains_key(&user_id) {
            return Err(AppError::Reference {
                field: kind.field().to_owned(),
                ids: vec![target_id],
            });
        }

        if kind == Membership::Follow && user_id == target_id {
            return Err(AppError::validation(
                kind.field(),
                "You cannot subscribe to yourself.",
            ));
        }

        if tables.membership_exists(kind, user_id, target_id) {
            return Err(AppError::conflict(kind.field(), kind.duplicate_message()));
        }

        let id = tables.next_id();
        match kind {
            Membership::Favorite => tables.favorites.push(Favorite::new(id, user_id, target_id)),
            Membership::ShoppingCart => tables
                .shopping_carts
                .push(ShoppingCart::new(id, user_id, target_id)),
            Membership::Follow => tables.follows.push(Follow::new(id, user_id, target_id)),
        }

        Ok(())
    }

    fn delete_membership(
        &self,
        kind: Membership,
        user_id: i32,
        target_id: i32,
    ) -> AppResult<bool> {
        let mut tables = self.tables();

        let before = match kind {
            Membership::Favorite => tables.favorites.len(),
            Membership::ShoppingCart => tables.shopping_carts.len(),
            Membership::Follow => tables.follows.len(),
        };

        let after = match kind {
            Membership::Favorite => {
                tables
                    .favorites
                    .retain(|row| !(row.user_id == user_id && row.recipe_id == target_id));
                tables.favorites.len()
            }
            Membership::ShoppingCart => {
                tables
                    .shopping_carts
                    .retain(|row| !(row.user_id == user_id && row.recipe_id == target_id));
                tables.shopping_carts.len()
            }
            Membership::Follow => {
                tables
                    .follows
                    .retain(|row| !(row.user_id == user_id && row.author_id == target_id));
                tables.follows.len()
            }
        };

        Ok(after < before)
    }

    fn author_detail(
        &self,
        viewer: i32,
        author_id: i32,
        recipes_limit: Option<usize>,
    ) -> AppResult<Option<AuthorDetail>> {
        Ok(self.tables().author_detail(viewer, author_id, recipes_limit))
    }

    fn subscriptions(
        &self,
        user_id: i32,
        recipes_limit: Option<usize>,
    ) -> AppResult<Vec<AuthorDetail>> {
        let tables = self.tables();

        Ok(tables
            .follows
            .iter()
            .filter(|row| row.user_id == user_id)
            .filter_map(|row| tables.author_detail(user_id, row.author_id, recipes_limit))
            .collect())
    }
}
