pub mod favorite;
pub mod follow;
pub mod ingredient;
pub mod ingredient_recipe;
pub mod recipe;
pub mod shopping_cart;
pub mod tag;
pub mod tag_recipe;
pub mod user;
