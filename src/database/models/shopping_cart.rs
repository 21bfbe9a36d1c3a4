use diesel::prelude::*;
use lombok::AllArgsConstructor;

#[derive(Queryable, Selectable, Identifiable, AllArgsConstructor, Debug)]
#[diesel(table_name = crate::database::schema::shopping_carts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShoppingCart {
    pub id: i32,
    pub user_id: i32,
    pub recipe_id: i32,
}

#[derive(Insertable, AllArgsConstructor, Debug)]
#[diesel(table_name = crate::database::schema::shopping_carts)]
pub struct NewShoppingCart {
    pub user_id: i32,
    pub recipe_id: i32,
}
