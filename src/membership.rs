//! Favorites, shopping-cart entries and subscriptions: unique (user, target) pairs.

use tracing::info;

use crate::{
    error::{AppError, AppResult},
    recipes::{Author, AuthorDetail, RecipeSummary},
    store::{Membership, Store},
};

pub fn add_favorite<S: Store + ?Sized>(store: &S, user_id: i32, recipe_id: i32) -> AppResult<RecipeSummary> {
    add_recipe_membership(store, Membership::Favorite, user_id, recipe_id)
}

pub fn remove_favorite<S: Store + ?Sized>(store: &S, user_id: i32, recipe_id: i32) -> AppResult<()> {
    remove_membership(store, Membership::Favorite, user_id, recipe_id)
}

pub fn add_to_cart<S: Store + ?Sized>(store: &S, user_id: i32, recipe_id: i32) -> AppResult<RecipeSummary> {
    add_recipe_membership(store, Membership::ShoppingCart, user_id, recipe_id)
}

pub fn remove_from_cart<S: Store + ?Sized>(store: &S, user_id: i32, recipe_id: i32) -> AppResult<()> {
    remove_membership(store, Membership::ShoppingCart, user_id, recipe_id)
}

pub fn follow<S: Store + ?Sized>(
    store: &S,
    user_id: i32,
    author_id: i32,
    recipes_limit: Option<usize>,
) -> AppResult<AuthorDetail> {
    if user_id == author_id {
        return Err(AppError::validation(
            Membership::Follow.field(),
            "You cannot subscribe to yourself.",
        ));
    }

    // Read before writing so nothing after the insert can fail.
    let mut detail = store
        .author_detail(user_id, author_id, recipes_limit)?
        .ok_or(AppError::NotFound("User"))?;

    store.insert_membership(Membership::Follow, user_id, author_id)?;
    info!(user_id, author_id, "subscribed");

    detail.is_subscribed = true;
    Ok(detail)
}

/// Every author the user follows, each with up to `recipes_limit` of their newest recipes.
pub fn subscriptions<S: Store + ?Sized>(
    store: &S,
    user_id: i32,
    recipes_limit: Option<usize>,
) -> AppResult<Vec<AuthorDetail>> {
    store.subscriptions(user_id, recipes_limit)
}

pub fn user_profile<S: Store + ?Sized>(store: &S, viewer: i32, user_id: i32) -> AppResult<Author> {
    store
        .user_profile(viewer, user_id)?
        .ok_or(AppError::NotFound("User"))
}

pub fn unfollow<S: Store + ?Sized>(store: &S, user_id: i32, author_id: i32) -> AppResult<()> {
    if store.find_user(author_id)?.is_none() {
        return Err(AppError::NotFound("User"));
    }

    remove_membership(store, Membership::Follow, user_id, author_id)
}

fn add_recipe_membership<S: Store + ?Sized>(
    store: &S,
    kind: Membership,
    user_id: i32,
    recipe_id: i32,
) -> AppResult<RecipeSummary> {
    let summary = store
        .recipe_summary(recipe_id)?
        .ok_or(AppError::NotFound("Recipe"))?;

    store.insert_membership(kind, user_id, recipe_id)?;
    info!(?kind, user_id, recipe_id, "membership added");

    Ok(summary)
}

fn remove_membership<S: Store + ?Sized>(
    store: &S,
    kind: Membership,
    user_id: i32,
    target_id: i32,
) -> AppResult<()> {
    if !store.delete_membership(kind, user_id, target_id)? {
        return Err(AppError::NotFound(kind.missing()));
    }
    info!(?kind, user_id, target_id, "membership removed");

    Ok(())
}
