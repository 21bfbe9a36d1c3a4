pub mod database_store;
pub mod memory_store;

pub use database_store::DatabaseStore;
pub use memory_store::MemoryStore;

use crate::{
    database::models::{
        ingredient::Ingredient,
        recipe::{NewRecipe, RecipeChanges},
        tag::Tag,
        user::User,
    },
    error::AppResult,
    recipes::{Author, AuthorDetail, IngredientAmount, RecipeDetail, RecipeFilter, RecipeSummary},
};

/// One ingredient row of one recipe currently in a user's shopping cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartIngredientRow {
    pub recipe_id: i32,
    pub ingredient_id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// The (user, target) pair tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Membership {
    Favorite,
    ShoppingCart,
    Follow,
}

impl Membership {
    /// Payload field the target id is reported under.
    pub fn field(&self) -> &'static str {
        match self {
            Membership::Favorite | Membership::ShoppingCart => "recipe",
            Membership::Follow => "author",
        }
    }

    pub fn duplicate_message(&self) -> &'static str {
        match self {
            Membership::Favorite => "This recipe is already in your favorites.",
            Membership::ShoppingCart => "This recipe is already in your shopping cart.",
            Membership::Follow => "You are already subscribed to this author.",
        }
    }

    pub fn missing(&self) -> &'static str {
        match self {
            Membership::Favorite => "Favorite",
            Membership::ShoppingCart => "Shopping cart entry",
            Membership::Follow => "Subscription",
        }
    }
}

/// The persistence collaborator.
///
/// Writes that touch a recipe and its join rows are atomic: implementations either apply all
/// of them or none.
pub trait Store: Send + Sync {
    fn find_user(&self, user_id: i32) -> AppResult<Option<User>>;

    /// The user with `is_subscribed` relative to `viewer`.
    fn user_profile(&self, viewer: i32, user_id: i32) -> AppResult<Option<Author>>;

    fn list_tags(&self) -> AppResult<Vec<Tag>>;

    fn find_tag(&self, tag_id: i32) -> AppResult<Option<Tag>>;

    /// Ingredients by id; with a prefix, only those whose name starts with it, ignoring case.
    fn list_ingredients(&self, name_prefix: Option<&str>) -> AppResult<Vec<Ingredient>>;

    fn find_ingredient(&self, ingredient_id: i32) -> AppResult<Option<Ingredient>>;

    /// Ids from `ids` that have no ingredient in the catalog, in input order.
    fn missing_ingredient_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>>;

    /// Ids from `ids` that have no tag in the catalog, in input order.
    fn missing_tag_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>>;

    fn author_has_recipe_named(&self, author_id: i32, name: &str) -> AppResult<bool>;

    /// Inserts the recipe row and all its join rows, returning the new recipe id.
    ///
    /// Rejects a name the author already uses with a validation error on `name`. The check
    /// and the insert are atomic with respect to other inserts by the same author.
    fn insert_recipe(
        &self,
        recipe: NewRecipe,
        ingredients: &[IngredientAmount],
        tag_ids: &[i32],
    ) -> AppResult<i32>;

    /// Updates scalar fields, then deletes and recreates every join row of the recipe.
    fn replace_recipe(
        &self,
        recipe_id: i32,
        changes: RecipeChanges,
        ingredients: &[IngredientAmount],
        tag_ids: &[i32],
    ) -> AppResult<()>;

    /// Returns false when there was no such recipe.
    fn delete_recipe(&self, recipe_id: i32) -> AppResult<bool>;

    fn load_recipe(&self, recipe_id: i32, viewer: Option<i32>) -> AppResult<Option<RecipeDetail>>;

    /// Recipes matching `filter`, newest first. The membership flags are ignored without a
    /// viewer.
    fn list_recipes(&self, filter: &RecipeFilter, viewer: Option<i32>)
        -> AppResult<Vec<RecipeDetail>>;

    fn recipe_summary(&self, recipe_id: i32) -> AppResult<Option<RecipeSummary>>;

    /// Ingredient rows of every recipe in the user's cart, ordered by cart entry and then by
    /// join row.
    fn cart_ingredient_rows(&self, user_id: i32) -> AppResult<Vec<CartIngredientRow>>;

    /// Fails with a conflict when the pair already exists.
    fn insert_membership(&self, kind: Membership, user_id: i32, target_id: i32) -> AppResult<()>;

    /// Returns false when the pair did not exist.
    fn delete_membership(&self, kind: Membership, user_id: i32, target_id: i32)
        -> AppResult<bool>;

    /// `recipes_limit` caps the embedded recipe list, newest first.
    fn author_detail(
        &self,
        viewer: i32,
        author_id: i32,
        recipes_limit: Option<usize>,
    ) -> AppResult<Option<AuthorDetail>>;

    /// Every author `user_id` follows, in subscription order.
    fn subscriptions(
        &self,
        user_id: i32,
        recipes_limit: Option<usize>,
    ) -> AppResult<Vec<AuthorDetail>>;
}
