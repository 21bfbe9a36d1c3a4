//! Recipes as composite documents: scalar fields plus an ingredient-amount list and a tag set,
//! written and replaced as one unit.

pub mod composer;
pub mod detail;
pub mod filter;
pub mod input;
pub mod validation;

pub use composer::RecipeComposer;
pub use detail::{Author, AuthorDetail, RecipeDetail, RecipeIngredient, RecipeSummary};
pub use filter::RecipeFilter;
pub use input::{IngredientAmount, RecipeInput};
pub use validation::{validate_recipe, DUPLICATE_NAME};
