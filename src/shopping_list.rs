use std::{fmt, ops::Deref};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, trace_span};

use crate::{
    error::AppResult,
    store::{CartIngredientRow, Store},
};

pub const HEADER: &str = "Shopping list:";
pub const FILE_NAME: &str = "shopping_list.txt";

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListEntry {
    pub ingredient_id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// Ingredient totals keyed by ingredient id, kept in first-encounter order.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ShoppingList {
    inner: IndexMap<i32, ShoppingListEntry>,
}

impl ShoppingList {
    pub fn new() -> Self {
        Self {
            inner: IndexMap::new(),
        }
    }

    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = CartIngredientRow>,
    {
        let mut list = Self::new();
        rows.into_iter().for_each(|row| list.add_row(row));
        list
    }

    pub fn add_row(&mut self, row: CartIngredientRow) {
        self.inner
            .entry(row.ingredient_id)
            .and_modify(|entry| {
                entry.total_amount += i64::from(row.amount);
            })
            .or_insert_with(|| ShoppingListEntry {
                ingredient_id: row.ingredient_id,
                name: row.name,
                measurement_unit: row.measurement_unit,
                total_amount: i64::from(row.amount),
            });
    }

    pub fn entries(&self) -> impl Iterator<Item = &ShoppingListEntry> {
        self.inner.values()
    }
}

impl Deref for ShoppingList {
    type Target = IndexMap<i32, ShoppingListEntry>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl fmt::Debug for ShoppingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

/// Plain-text attachment body: the header, a blank line, then one line per ingredient.
impl fmt::Display for ShoppingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{HEADER}")?;
        writeln!(f)?;
        for entry in self.entries() {
            writeln!(
                f,
                "{} ({}) - {}",
                entry.name, entry.measurement_unit, entry.total_amount
            )?;
        }
        Ok(())
    }
}

pub fn build_shopping_list<S: Store + ?Sized>(store: &S, user_id: i32) -> AppResult<ShoppingList> {
    let span = trace_span!("build_shopping_list", user_id);
    let _guard = span.enter();

    let rows = store.cart_ingredient_rows(user_id)?;
    let row_count = rows.len();
    let list = ShoppingList::from_rows(rows);
    debug!(row_count, entries = list.len(), "shopping list aggregated");

    Ok(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        recipes::{IngredientAmount, RecipeComposer, RecipeInput},
        store::{Membership, MemoryStore},
    };

    fn row(recipe_id: i32, ingredient_id: i32, name: &str, unit: &str, amount: i32) -> CartIngredientRow {
        CartIngredientRow {
            recipe_id,
            ingredient_id,
            name: name.to_owned(),
            measurement_unit: unit.to_owned(),
            amount,
        }
    }

    fn totals(list: &ShoppingList) -> Vec<(String, i64)> {
        let mut totals: Vec<_> = list
            .entries()
            .map(|entry| (entry.name.clone(), entry.total_amount))
            .collect();
        totals.sort();
        totals
    }

    #[test]
    fn sums_amounts_across_recipes() {
        let list = ShoppingList::from_rows(vec![
            row(1, 10, "flour", "g", 200),
            row(1, 11, "egg", "pcs", 2),
            row(2, 10, "flour", "g", 300),
            row(2, 12, "milk", "ml", 100),
        ]);

        assert_eq!(
            totals(&list),
            vec![
                ("egg".to_owned(), 2),
                ("flour".to_owned(), 500),
                ("milk".to_owned(), 100),
            ]
        );
    }

    #[test]
    fn keeps_first_encounter_order() {
        let list = ShoppingList::from_rows(vec![
            row(1, 12, "milk", "ml", 100),
            row(1, 10, "flour", "g", 200),
            row(2, 11, "egg", "pcs", 2),
            row(2, 12, "milk", "ml", 50),
        ]);

        let names: Vec<_> = list.entries().map(|entry| entry.name.as_str()).collect();
        assert_eq!(names, vec!["milk", "flour", "egg"]);
    }

    #[test]
    fn same_name_different_id_stays_distinct() {
        let list = ShoppingList::from_rows(vec![
            row(1, 10, "salt", "g", 5),
            row(2, 20, "salt", "tsp", 1),
        ]);

        assert_eq!(list.len(), 2);
        assert_eq!(list[&10].total_amount, 5);
        assert_eq!(list[&20].total_amount, 1);
    }

    #[test]
    fn keys_always_match_entry_ids() {
        let list = ShoppingList::from_rows(vec![
            row(1, 10, "flour", "g", 200),
            row(1, 12, "milk", "ml", 100),
            row(2, 10, "flour", "g", 300),
        ]);

        // Read-only access through Deref cannot desynchronise a key from its entry.
        assert!(list.iter().all(|(id, entry)| *id == entry.ingredient_id));
        assert_eq!(list.get(&10).map(|entry| entry.total_amount), Some(500));
    }

    #[test]
    fn order_of_recipes_does_not_change_totals() {
        let a = vec![row(1, 10, "flour", "g", 200), row(1, 11, "egg", "pcs", 2)];
        let b = vec![row(2, 10, "flour", "g", 300), row(2, 12, "milk", "ml", 100)];

        let ab = ShoppingList::from_rows(a.iter().chain(b.iter()).cloned());
        let ba = ShoppingList::from_rows(b.iter().chain(a.iter()).cloned());

        assert_eq!(totals(&ab), totals(&ba));
    }

    #[test]
    fn empty_cart_renders_only_the_header() {
        let list = ShoppingList::from_rows(Vec::new());

        assert!(list.is_empty());
        assert_eq!(list.to_string(), format!("{HEADER}\n\n"));
    }

    #[test]
    fn renders_one_line_per_ingredient() {
        let list = ShoppingList::from_rows(vec![
            row(1, 10, "flour", "g", 200),
            row(2, 10, "flour", "g", 300),
            row(2, 12, "milk", "ml", 100),
        ]);

        assert_eq!(
            list.to_string(),
            "Shopping list:\n\nflour (g) - 500\nmilk (ml) - 100\n"
        );
    }

    #[test]
    fn builds_from_the_users_cart() {
        let store = MemoryStore::new();
        let author = store.add_user("chef").id;
        let shopper = store.add_user("shopper").id;
        let flour = store.add_ingredient("flour", "g").id;
        let egg = store.add_ingredient("egg", "pcs").id;
        let milk = store.add_ingredient("milk", "ml").id;
        let tag = store.add_tag("Breakfast", "breakfast", "#E26C2D").id;

        let composer = RecipeComposer::new(&store);
        let recipe = |name: &str, ingredients: &[(i32, i32)]| {
            composer
                .create_recipe(
                    author,
                    RecipeInput {
                        name: name.to_owned(),
                        text: "Cook it.".to_owned(),
                        image: "dish.png".to_owned(),
                        cooking_time: 10,
                        ingredients: ingredients
                            .iter()
                            .map(|&(id, amount)| IngredientAmount { id, amount })
                            .collect(),
                        tags: vec![tag],
                    },
                )
                .unwrap()
                .id
        };
        let a = recipe("A", &[(flour, 200), (egg, 2)]);
        let b = recipe("B", &[(flour, 300), (milk, 100)]);
        recipe("Not in cart", &[(milk, 999)]);

        assert!(build_shopping_list(&store, shopper).unwrap().is_empty());

        store
            .insert_membership(Membership::ShoppingCart, shopper, b)
            .unwrap();
        store
            .insert_membership(Membership::ShoppingCart, shopper, a)
            .unwrap();

        let list = build_shopping_list(&store, shopper).unwrap();
        assert_eq!(
            totals(&list),
            vec![
                ("egg".to_owned(), 2),
                ("flour".to_owned(), 500),
                ("milk".to_owned(), 100),
            ]
        );

        // The author's own cart is untouched by the shopper's.
        assert!(build_shopping_list(&store, author).unwrap().is_empty());
    }
}
