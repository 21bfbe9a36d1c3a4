use diesel::prelude::*;
use lombok::AllArgsConstructor;

use super::recipe::Recipe;

#[derive(Queryable, Selectable, Identifiable, Associations, AllArgsConstructor, Debug, Clone)]
#[diesel(belongs_to(Recipe))]
#[diesel(table_name = crate::database::schema::ingredient_recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct IngredientRecipe {
    pub id: i32,
    pub ingredient_id: i32,
    pub recipe_id: i32,
    pub amount: i32,
}

#[derive(Insertable, AllArgsConstructor, Debug)]
#[diesel(table_name = crate::database::schema::ingredient_recipes)]
pub struct NewIngredientRecipe {
    pub ingredient_id: i32,
    pub recipe_id: i32,
    pub amount: i32,
}
