use serde::Deserialize;

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    pub id: i32,
    pub amount: i32,
}

/// Client payload for both create and update.
///
/// Every field defaults so that a missing key is reported by validation against the
/// field it belongs to rather than as an undecodable body.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct RecipeInput {
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<i32>,
}

impl RecipeInput {
    pub fn ingredient_ids(&self) -> Vec<i32> {
        self.ingredients.iter().map(|ingredient| ingredient.id).collect()
    }
}
