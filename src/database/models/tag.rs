use diesel::prelude::*;
use lombok::AllArgsConstructor;
use serde::{Deserialize, Serialize};

#[derive(
    Queryable,
    Selectable,
    Identifiable,
    AllArgsConstructor,
    Serialize,
    Debug,
    Clone,
    PartialEq,
    Eq,
)]
#[diesel(table_name = crate::database::schema::tags)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Tag {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub color: String,
}

#[derive(Insertable, AllArgsConstructor, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::database::schema::tags)]
pub struct NewTag {
    pub name: String,
    pub slug: String,
    pub color: String,
}
