use diesel::prelude::*;
use lombok::AllArgsConstructor;
use serde::{Deserialize, Serialize};

#[derive(Queryable, Selectable, Identifiable, AllArgsConstructor, Serialize, Debug, Clone)]
#[diesel(table_name = crate::database::schema::ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Ingredient {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Insertable, AllArgsConstructor, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::database::schema::ingredients)]
pub struct NewIngredient {
    pub name: String,
    pub measurement_unit: String,
}
