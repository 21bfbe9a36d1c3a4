use diesel::prelude::*;
use lombok::AllArgsConstructor;
use serde::Serialize;

#[derive(Queryable, Selectable, Identifiable, AllArgsConstructor, Serialize, Debug, Clone)]
#[diesel(table_name = crate::database::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}
