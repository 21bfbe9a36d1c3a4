use diesel::prelude::*;
use lombok::AllArgsConstructor;

#[derive(Queryable, Selectable, Identifiable, AllArgsConstructor, Debug)]
#[diesel(table_name = crate::database::schema::follows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Follow {
    pub id: i32,
    pub user_id: i32,
    pub author_id: i32,
}

#[derive(Insertable, AllArgsConstructor, Debug)]
#[diesel(table_name = crate::database::schema::follows)]
pub struct NewFollow {
    pub user_id: i32,
    pub author_id: i32,
}
