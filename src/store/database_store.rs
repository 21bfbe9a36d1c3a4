use std::collections::HashSet;

use diesel::{
    delete,
    dsl::exists,
    insert_into,
    pg::PgConnection,
    prelude::*,
    r2d2::{ConnectionManager, PooledConnection},
    result::{DatabaseErrorKind, Error as DieselError},
    select, update,
};
use itertools::Itertools;
use lombok::AllArgsConstructor;
use tracing::{debug, trace_span};

use crate::{
    database::{
        connection::DbPool,
        models::{
            favorite::NewFavorite,
            follow::NewFollow,
            ingredient::Ingredient,
            ingredient_recipe::{IngredientRecipe, NewIngredientRecipe},
            recipe::{NewRecipe, Recipe, RecipeChanges},
            shopping_cart::NewShoppingCart,
            tag::Tag,
            tag_recipe::{NewTagRecipe, TagRecipe},
            user::User,
        },
        schema::{
            favorites, follows, ingredient_recipes, ingredients, recipes, shopping_carts,
            tag_recipes, tags, users,
        },
    },
    error::{AppError, AppResult},
    recipes::{
        Author, AuthorDetail, IngredientAmount, RecipeDetail, RecipeFilter, RecipeIngredient,
        RecipeSummary, DUPLICATE_NAME,
    },
};

use super::{CartIngredientRow, Membership, Store};

type PooledPg = PooledConnection<ConnectionManager<PgConnection>>;

/// PostgreSQL-backed store.
#[derive(AllArgsConstructor, Clone)]
pub struct DatabaseStore {
    pool: DbPool,
}

impl DatabaseStore {
    fn connection(&self) -> AppResult<PooledPg> {
        Ok(self.pool.get()?)
    }
}

// LIMIT takes a bigint; anything larger means "no limit".
fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

// ILIKE pattern for names starting with `prefix` taken literally.
fn prefix_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn insert_join_rows(
    connection: &mut PgConnection,
    recipe_id: i32,
    ingredients: &[IngredientAmount],
    tag_ids: &[i32],
) -> QueryResult<()> {
    let ingredient_rows: Vec<_> = ingredients
        .iter()
        .map(|ingredient| NewIngredientRecipe::new(ingredient.id, recipe_id, ingredient.amount))
        .collect();

    insert_into(ingredient_recipes::table)
        .values(&ingredient_rows)
        .execute(connection)?;

    let tag_rows: Vec<_> = tag_ids
        .iter()
        .map(|&tag_id| NewTagRecipe::new(tag_id, recipe_id))
        .collect();

    insert_into(tag_recipes::table)
        .values(&tag_rows)
        .execute(connection)?;

    Ok(())
}

fn membership_exists(
    connection: &mut PgConnection,
    kind: Membership,
    user_id: i32,
    target_id: i32,
) -> QueryResult<bool> {
    match kind {
        Membership::Favorite => select(exists(
            favorites::table
                .filter(favorites::user_id.eq(user_id))
                .filter(favorites::recipe_id.eq(target_id)),
        ))
        .get_result(connection),
        Membership::ShoppingCart => select(exists(
            shopping_carts::table
                .filter(shopping_carts::user_id.eq(user_id))
                .filter(shopping_carts::recipe_id.eq(target_id)),
        ))
        .get_result(connection),
        Membership::Follow => select(exists(
            follows::table
                .filter(follows::user_id.eq(user_id))
                .filter(follows::author_id.eq(target_id)),
        ))
        .get_result(connection),
    }
}

fn missing_ids(ids: &[i32], found: Vec<i32>) -> Vec<i32> {
    let found: HashSet<i32> = found.into_iter().collect();

    ids.iter()
        .copied()
        .filter(|id| !found.contains(id))
        .unique()
        .collect()
}

fn load_author(
    connection: &mut PgConnection,
    viewer: Option<i32>,
    user_id: i32,
) -> AppResult<Option<Author>> {
    let Some(user) = users::table
        .find(user_id)
        .select(User::as_select())
        .first(connection)
        .optional()?
    else {
        return Ok(None);
    };

    let is_subscribed = match viewer {
        Some(viewer) => membership_exists(connection, Membership::Follow, viewer, user_id)?,
        None => false,
    };

    Ok(Some(Author {
        user,
        is_subscribed,
    }))
}

fn recipe_detail(
    connection: &mut PgConnection,
    recipe: Recipe,
    viewer: Option<i32>,
) -> AppResult<RecipeDetail> {
    let author = load_author(connection, viewer, recipe.author_id)?
        .ok_or(AppError::NotFound("User"))?;

    let ingredients = IngredientRecipe::belonging_to(&recipe)
        .inner_join(ingredients::table)
        .order(ingredient_recipes::id.asc())
        .select((IngredientRecipe::as_select(), Ingredient::as_select()))
        .load::<(IngredientRecipe, Ingredient)>(connection)?
        .into_iter()
        .map(|(row, ingredient)| RecipeIngredient {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
            amount: row.amount,
        })
        .collect();

    let tags = TagRecipe::belonging_to(&recipe)
        .inner_join(tags::table)
        .order(tag_recipes::id.asc())
        .select(Tag::as_select())
        .load(connection)?;

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer) => (
            membership_exists(connection, Membership::Favorite, viewer, recipe.id)?,
            membership_exists(connection, Membership::ShoppingCart, viewer, recipe.id)?,
        ),
        None => (false, false),
    };

    Ok(RecipeDetail {
        id: recipe.id,
        author,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        pub_date: recipe.pub_date,
        ingredients,
        tags,
        is_favorited,
        is_in_shopping_cart,
    })
}

fn load_author_detail(
    connection: &mut PgConnection,
    viewer: i32,
    author_id: i32,
    recipes_limit: Option<usize>,
) -> AppResult<Option<AuthorDetail>> {
    let Some(Author {
        user,
        is_subscribed,
    }) = load_author(connection, Some(viewer), author_id)?
    else {
        return Ok(None);
    };

    let recipes_count: i64 = recipes::table
        .filter(recipes::author_id.eq(author_id))
        .count()
        .get_result(connection)?;

    let mut query = recipes::table
        .filter(recipes::author_id.eq(author_id))
        .order((recipes::pub_date.desc(), recipes::id.desc()))
        .select((
            recipes::id,
            recipes::name,
            recipes::image,
            recipes::cooking_time,
        ))
        .into_boxed();

    if let Some(limit) = recipes_limit {
        query = query.limit(sql_limit(limit));
    }

    let recipes = query
        .load::<(i32, String, String, i32)>(connection)?
        .into_iter()
        .map(|(id, name, image, cooking_time)| RecipeSummary {
            id,
            name,
            image,
            cooking_time,
        })
        .collect();

    Ok(Some(AuthorDetail {
        user,
        is_subscribed,
        recipes,
        recipes_count,
    }))
}

impl Store for DatabaseStore {
    fn find_user(&self, user_id: i32) -> AppResult<Option<User>> {
        let mut connection = self.connection()?;

        Ok(users::table
            .find(user_id)
            .select(User::as_select())
            .first(&mut connection)
            .optional()?)
    }

    fn user_profile(&self, viewer: i32, user_id: i32) -> AppResult<Option<Author>> {
        let mut connection = self.connection()?;

        load_author(&mut connection, Some(viewer), user_id)
    }

    fn list_tags(&self) -> AppResult<Vec<Tag>> {
        let mut connection = self.connection()?;

        Ok(tags::table
            .order(tags::id.asc())
            .select(Tag::as_select())
            .load(&mut connection)?)
    }

    fn find_tag(&self, tag_id: i32) -> AppResult<Option<Tag>> {
        let mut connection = self.connection()?;

        Ok(tags::table
            .find(tag_id)
            .select(Tag::as_select())
            .first(&mut connection)
            .optional()?)
    }

    fn list_ingredients(&self, name_prefix: Option<&str>) -> AppResult<Vec<Ingredient>> {
        let mut connection = self.connection()?;

        let mut query = ingredients::table
            .order(ingredients::id.asc())
            .select(Ingredient::as_select())
            .into_boxed();

        if let Some(prefix) = name_prefix {
            query = query.filter(ingredients::name.ilike(prefix_pattern(prefix)));
        }

        Ok(query.load(&mut connection)?)
    }

    fn find_ingredient(&self, ingredient_id: i32) -> AppResult<Option<Ingredient>> {
        let mut connection = self.connection()?;

        Ok(ingredients::table
            .find(ingredient_id)
            .select(Ingredient::as_select())
            .first(&mut connection)
            .optional()?)
    }

    fn missing_ingredient_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>> {
        let mut connection = self.connection()?;

        let found: Vec<i32> = ingredients::table
            .filter(ingredients::id.eq_any(ids.to_vec()))
            .select(ingredients::id)
            .load(&mut connection)?;

        Ok(missing_ids(ids, found))
    }

    fn missing_tag_ids(&self, ids: &[i32]) -> AppResult<Vec<i32>> {
        let mut connection = self.connection()?;

        let found: Vec<i32> = tags::table
            .filter(tags::id.eq_any(ids.to_vec()))
            .select(tags::id)
            .load(&mut connection)?;

        Ok(missing_ids(ids, found))
    }

    fn author_has_recipe_named(&self, author_id: i32, name: &str) -> AppResult<bool> {
        let mut connection = self.connection()?;

        Ok(select(exists(
            recipes::table
                .filter(recipes::author_id.eq(author_id))
                .filter(recipes::name.eq(name)),
        ))
        .get_result(&mut connection)?)
    }

    fn insert_recipe(
        &self,
        recipe: NewRecipe,
        ingredients: &[IngredientAmount],
        tag_ids: &[i32],
    ) -> AppResult<i32> {
        let span = trace_span!("insert_recipe");
        let _guard = span.enter();

        let mut connection = self.connection()?;

        connection.transaction(|connection| {
            // Concurrent creates by one author queue here until this transaction ends.
            users::table
                .find(recipe.author_id)
                .select(users::id)
                .for_update()
                .first::<i32>(connection)
                .optional()?
                .ok_or_else(|| AppError::Reference {
                    field: "author".to_owned(),
                    ids: vec![recipe.author_id],
                })?;

            let name_taken: bool = select(exists(
                recipes::table
                    .filter(recipes::author_id.eq(recipe.author_id))
                    .filter(recipes::name.eq(&recipe.name)),
            ))
            .get_result(connection)?;

            if name_taken {
                return Err(AppError::validation("name", DUPLICATE_NAME));
            }

            let recipe_id: i32 = insert_into(recipes::table)
                .values(&recipe)
                .returning(recipes::id)
                .get_result(connection)?;

            insert_join_rows(connection, recipe_id, ingredients, tag_ids)?;
            debug!(recipe_id, "recipe inserted");

            Ok(recipe_id)
        })
    }

    fn replace_recipe(
        &self,
        recipe_id: i32,
        changes: RecipeChanges,
        ingredients: &[IngredientAmount],
        tag_ids: &[i32],
    ) -> AppResult<()> {
        let span = trace_span!("replace_recipe", recipe_id);
        let _guard = span.enter();

        let mut connection = self.connection()?;

        connection.transaction(|connection| {
            let updated = update(recipes::table.find(recipe_id))
                .set(&changes)
                .execute(connection)?;

            if updated == 0 {
                return Err(AppError::NotFound("Recipe"));
            }

            delete(ingredient_recipes::table.filter(ingredient_recipes::recipe_id.eq(recipe_id)))
                .execute(connection)?;
            delete(tag_recipes::table.filter(tag_recipes::recipe_id.eq(recipe_id)))
                .execute(connection)?;

            insert_join_rows(connection, recipe_id, ingredients, tag_ids)?;

            Ok(())
        })
    }

    fn delete_recipe(&self, recipe_id: i32) -> AppResult<bool> {
        let mut connection = self.connection()?;

        let deleted = delete(recipes::table.find(recipe_id)).execute(&mut connection)?;

        Ok(deleted > 0)
    }

    fn load_recipe(&self, recipe_id: i32, viewer: Option<i32>) -> AppResult<Option<RecipeDetail>> {
        let span = trace_span!("load_recipe", recipe_id);
        let _guard = span.enter();

        let mut connection = self.connection()?;

        let Some(recipe) = recipes::table
            .find(recipe_id)
            .select(Recipe::as_select())
            .first(&mut connection)
            .optional()?
        else {
            return Ok(None);
        };

        recipe_detail(&mut connection, recipe, viewer).map(Some)
    }

    fn list_recipes(
        &self,
        filter: &RecipeFilter,
        viewer: Option<i32>,
    ) -> AppResult<Vec<RecipeDetail>> {
        let span = trace_span!("list_recipes", ?viewer);
        let _guard = span.enter();

        let mut connection = self.connection()?;

        let mut query = recipes::table
            .order((recipes::pub_date.desc(), recipes::id.desc()))
            .select(Recipe::as_select())
            .into_boxed();

        if let Some(author_id) = filter.author {
            query = query.filter(recipes::author_id.eq(author_id));
        }

        if !filter.tags.is_empty() {
            let tag_ids: Vec<i32> = tags::table
                .filter(tags::slug.eq_any(filter.tags.clone()))
                .select(tags::id)
                .load(&mut connection)?;

            query = query.filter(
                recipes::id.eq_any(
                    tag_recipes::table
                        .filter(tag_recipes::tag_id.eq_any(tag_ids))
                        .select(tag_recipes::recipe_id),
                ),
            );
        }

        if let Some(viewer) = viewer {
            if filter.is_favorited {
                query = query.filter(
                    recipes::id.eq_any(
                        favorites::table
                            .filter(favorites::user_id.eq(viewer))
                            .select(favorites::recipe_id),
                    ),
                );
            }
            if filter.is_in_shopping_cart {
                query = query.filter(
                    recipes::id.eq_any(
                        shopping_carts::table
                            .filter(shopping_carts::user_id.eq(viewer))
                            .select(shopping_carts::recipe_id),
                    ),
                );
            }
        }

        let recipes: Vec<Recipe> = query.load(&mut connection)?;
        debug!(count = recipes.len(), "recipes listed");

        recipes
            .into_iter()
            .map(|recipe| recipe_detail(&mut connection, recipe, viewer))
            .collect()
    }

    fn recipe_summary(&self, recipe_id: i32) -> AppResult<Option<RecipeSummary>> {
        let mut connection = self.connection()?;

        let summary = recipes::table
            .find(recipe_id)
            .select((
                recipes::id,
                recipes::name,
                recipes::image,
                recipes::cooking_time,
            ))
            .first::<(i32, String, String, i32)>(&mut connection)
            .optional()?;

        Ok(summary.map(|(id, name, image, cooking_time)| RecipeSummary {
            id,
            name,
            image,
            cooking_time,
        }))
    }

    fn cart_ingredient_rows(&self, user_id: i32) -> AppResult<Vec<CartIngredientRow>> {
        let span = trace_span!("cart_ingredient_rows", user_id);
        let _guard = span.enter();

        let mut connection = self.connection()?;

        let rows = ingredient_recipes::table
            .inner_join(ingredients::table)
            .inner_join(
                shopping_carts::table
                    .on(shopping_carts::recipe_id.eq(ingredient_recipes::recipe_id)),
            )
            .filter(shopping_carts::user_id.eq(user_id))
            .order((shopping_carts::id.asc(), ingredient_recipes::id.asc()))
            .select((
                ingredient_recipes::recipe_id,
                ingredients::id,
                ingredients::name,
                ingredients::measurement_unit,
                ingredient_recipes::amount,
            ))
            .load::<(i32, i32, String, String, i32)>(&mut connection)?;

        Ok(rows
            .into_iter()
            .map(
                |(recipe_id, ingredient_id, name, measurement_unit, amount)| CartIngredientRow {
                    recipe_id,
                    ingredient_id,
                    name,
                    measurement_unit,
                    amount,
                },
            )
            .collect())
    }

    fn insert_membership(&self, kind: Membership, user_id: i32, target_id: i32) -> AppResult<()> {
        let mut connection = self.connection()?;

        // A failed insert rolls back only its own savepoint when the caller holds a transaction.
        let result = connection.transaction(|connection| match kind {
            Membership::Favorite => insert_into(favorites::table)
                .values(NewFavorite::new(user_id, target_id))
                .execute(connection),
            Membership::ShoppingCart => insert_into(shopping_carts::table)
                .values(NewShoppingCart::new(user_id, target_id))
                .execute(connection),
            Membership::Follow => insert_into(follows::table)
                .values(NewFollow::new(user_id, target_id))
                .execute(connection),
        });

        match result {
            Ok(_) => Ok(()),
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(AppError::conflict(kind.field(), kind.duplicate_message()))
            }
            Err(DieselError::DatabaseError(DatabaseErrorKind::CheckViolation, _)) => Err(
                AppError::validation(kind.field(), "You cannot subscribe to yourself."),
            ),
            Err(e) => Err(e.into()),
        }
    }

    fn delete_membership(
        &self,
        kind: Membership,
        user_id: i32,
        target_id: i32,
    ) -> AppResult<bool> {
        let mut connection = self.connection()?;

        let deleted = match kind {
            Membership::Favorite => delete(
                favorites::table
                    .filter(favorites::user_id.eq(user_id))
                    .filter(favorites::recipe_id.eq(target_id)),
            )
            .execute(&mut connection)?,
            Membership::ShoppingCart => delete(
                shopping_carts::table
                    .filter(shopping_carts::user_id.eq(user_id))
                    .filter(shopping_carts::recipe_id.eq(target_id)),
            )
            .execute(&mut connection)?,
            Membership::Follow => delete(
                follows::table
                    .filter(follows::user_id.eq(user_id))
                    .filter(follows::author_id.eq(target_id)),
            )
            .execute(&mut connection)?,
        };

        Ok(deleted > 0)
    }

    fn author_detail(
        &self,
        viewer: i32,
        author_id: i32,
        recipes_limit: Option<usize>,
    ) -> AppResult<Option<AuthorDetail>> {
        let mut connection = self.connection()?;

        load_author_detail(&mut connection, viewer, author_id, recipes_limit)
    }

    fn subscriptions(
        &self,
        user_id: i32,
        recipes_limit: Option<usize>,
    ) -> AppResult<Vec<AuthorDetail>> {
        let mut connection = self.connection()?;

        let author_ids: Vec<i32> = follows::table
            .filter(follows::user_id.eq(user_id))
            .order(follows::id.asc())
            .select(follows::author_id)
            .load(&mut connection)?;

        author_ids
            .into_iter()
            .filter_map(|author_id| {
                load_author_detail(&mut connection, user_id, author_id, recipes_limit).transpose()
            })
            .collect()
    }
}
