use chrono::{DateTime, Utc};
use diesel::prelude::*;
use lombok::AllArgsConstructor;

#[derive(Queryable, Selectable, Identifiable, AllArgsConstructor, Debug, Clone)]
#[diesel(table_name = crate::database::schema::recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Recipe {
    pub id: i32,
    pub author_id: i32,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
    pub pub_date: DateTime<Utc>,
}

#[derive(Insertable, AllArgsConstructor, Debug, Clone)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct NewRecipe {
    pub author_id: i32,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

// Scalar fields replaced in place on update
#[derive(AsChangeset, AllArgsConstructor, Debug, Clone)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct RecipeChanges {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}
