use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::database::models::{tag::Tag, user::User};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RecipeIngredient {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// A user as seen by a viewer: recipe authors and user profiles.
#[derive(Serialize, Debug, Clone)]
pub struct Author {
    #[serde(flatten)]
    pub user: User,
    pub is_subscribed: bool,
}

#[derive(Serialize, Debug, Clone)]
pub struct RecipeDetail {
    pub id: i32,
    pub author: Author,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,
    pub ingredients: Vec<RecipeIngredient>,
    pub tags: Vec<Tag>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeDetail {
    pub fn ingredient_amounts(&self) -> Vec<(i32, i32)> {
        self.ingredients
            .iter()
            .map(|ingredient| (ingredient.id, ingredient.amount))
            .collect()
    }

    pub fn tag_ids(&self) -> Vec<i32> {
        self.tags.iter().map(|tag| tag.id).collect()
    }
}

/// Short form returned when a recipe is added to favorites or the cart.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RecipeSummary {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

#[derive(Serialize, Debug, Clone)]
pub struct AuthorDetail {
    #[serde(flatten)]
    pub user: User,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: i64,
}
