use diesel::prelude::*;
use lombok::AllArgsConstructor;

use super::recipe::Recipe;

#[derive(Queryable, Selectable, Identifiable, Associations, AllArgsConstructor, Debug)]
#[diesel(belongs_to(Recipe))]
#[diesel(table_name = crate::database::schema::tag_recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TagRecipe {
    pub id: i32,
    pub tag_id: i32,
    pub recipe_id: i32,
}

#[derive(Insertable, AllArgsConstructor, Debug)]
#[diesel(table_name = crate::database::schema::tag_recipes)]
pub struct NewTagRecipe {
    pub tag_id: i32,
    pub recipe_id: i32,
}
