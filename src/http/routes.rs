use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    },
    response::IntoResponse,
    Json,
};
use axum_extra::extract::{Query as MultiQuery, QueryRejection};
use serde::Deserialize;

use crate::{
    catalog,
    error::{AppError, AppResult, NON_FIELD_ERRORS},
    membership,
    recipes::{filter::RecipeQuery, RecipeComposer, RecipeFilter, RecipeInput},
    shopping_list::{build_shopping_list, FILE_NAME},
    store::Store,
};

use super::{identity::CurrentUser, payload::JsonBody};

// Store calls are synchronous; keep them off the async workers.
async fn blocking<S, T, F>(store: Arc<S>, f: F) -> AppResult<T>
where
    S: Store + 'static,
    T: Send + 'static,
    F: FnOnce(&S) -> AppResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
}

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn create_recipe<S: Store + 'static>(
    State(store): State<Arc<S>>,
    CurrentUser(user_id): CurrentUser,
    JsonBody(input): JsonBody<RecipeInput>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = blocking(store, move |store| {
        RecipeComposer::new(store).create_recipe(user_id, input)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(recipe)))
}

// `tags` may repeat, so the query string goes through the form decoder.
pub async fn list_recipes<S: Store + 'static>(
    State(store): State<Arc<S>>,
    viewer: Option<CurrentUser>,
    query: Result<MultiQuery<RecipeQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let MultiQuery(query) =
        query.map_err(|rejection| AppError::validation(NON_FIELD_ERRORS, format!("Failed to deserialize query string: {rejection}")))?;
    let filter = RecipeFilter::try_from(query)?;
    let viewer = viewer.map(|CurrentUser(id)| id);

    let recipes = blocking(store, move |store| {
        RecipeComposer::new(store).list_recipes(&filter, viewer)
    })
    .await?;

    Ok(Json(recipes))
}

pub async fn get_recipe<S: Store + 'static>(
    State(store): State<Arc<S>>,
    Path(recipe_id): Path<i32>,
    viewer: Option<CurrentUser>,
) -> Result<impl IntoResponse, AppError> {
    let viewer = viewer.map(|CurrentUser(id)| id);
    let recipe = blocking(store, move |store| {
        RecipeComposer::new(store).get_recipe(recipe_id, viewer)
    })
    .await?;

    Ok(Json(recipe))
}

pub async fn update_recipe<S: Store + 'static>(
    State(store): State<Arc<S>>,
    Path(recipe_id): Path<i32>,
    CurrentUser(user_id): CurrentUser,
    JsonBody(input): JsonBody<RecipeInput>,
) -> Result<impl IntoResponse, AppError> {
    let recipe = blocking(store, move |store| {
        RecipeComposer::new(store).update_recipe(recipe_id, Some(user_id), input)
    })
    .await?;

    Ok(Json(recipe))
}

pub async fn delete_recipe<S: Store + 'static>(
    State(store): State<Arc<S>>,
    Path(recipe_id): Path<i32>,
    CurrentUser(_): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    blocking(store, move |store| RecipeComposer::new(store).delete_recipe(recipe_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_favorite<S: Store + 'static>(
    State(store): State<Arc<S>>,
    Path(recipe_id): Path<i32>,
    CurrentUser(user_id): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let summary = blocking(store, move |store| {
        membership::add_favorite(store, user_id, recipe_id)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn remove_favorite<S: Store + 'static>(
    State(store): State<Arc<S>>,
    Path(recipe_id): Path<i32>,
    CurrentUser(user_id): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    blocking(store, move |store| {
        membership::remove_favorite(store, user_id, recipe_id)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_to_cart<S: Store + 'static>(
    State(store): State<Arc<S>>,
    Path(recipe_id): Path<i32>,
    CurrentUser(user_id): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let summary = blocking(store, move |store| {
        membership::add_to_cart(store, user_id, recipe_id)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn remove_from_cart<S: Store + 'static>(
    State(store): State<Arc<S>>,
    Path(recipe_id): Path<i32>,
    CurrentUser(user_id): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    blocking(store, move |store| {
        membership::remove_from_cart(store, user_id, recipe_id)
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn download_shopping_cart<S: Store + 'static>(
    State(store): State<Arc<S>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let list = blocking(store, move |store| build_shopping_list(store, user_id)).await?;

    let headers = [
        (CONTENT_TYPE, "text/plain; charset=utf-8".to_owned()),
        (
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{FILE_NAME}\""),
        ),
    ];

    Ok((headers, list.to_string()))
}

pub async fn list_tags<S: Store + 'static>(
    State(store): State<Arc<S>>,
) -> Result<impl IntoResponse, AppError> {
    let tags = blocking(store, |store| catalog::list_tags(store)).await?;

    Ok(Json(tags))
}

pub async fn get_tag<S: Store + 'static>(
    State(store): State<Arc<S>>,
    Path(tag_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let tag = blocking(store, move |store| catalog::get_tag(store, tag_id)).await?;

    Ok(Json(tag))
}

#[derive(Deserialize, Debug, Default)]
pub struct IngredientParams {
    name: Option<String>,
}

pub async fn list_ingredients<S: Store + 'static>(
    State(store): State<Arc<S>>,
    Query(params): Query<IngredientParams>,
) -> Result<impl IntoResponse, AppError> {
    let ingredients = blocking(store, move |store| {
        catalog::search_ingredients(store, params.name.as_deref())
    })
    .await?;

    Ok(Json(ingredients))
}

pub async fn get_ingredient<S: Store + 'static>(
    State(store): State<Arc<S>>,
    Path(ingredient_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let ingredient =
        blocking(store, move |store| catalog::get_ingredient(store, ingredient_id)).await?;

    Ok(Json(ingredient))
}

pub async fn get_current_user<S: Store + 'static>(
    State(store): State<Arc<S>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let user = blocking(store, move |store| {
        membership::user_profile(store, user_id, user_id)
    })
    .await?;

    Ok(Json(user))
}

pub async fn get_user<S: Store + 'static>(
    State(store): State<Arc<S>>,
    Path(user_id): Path<i32>,
    CurrentUser(viewer): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let user = blocking(store, move |store| {
        membership::user_profile(store, viewer, user_id)
    })
    .await?;

    Ok(Json(user))
}

#[derive(Deserialize, Debug, Default)]
pub struct RecipesLimitParams {
    recipes_limit: Option<String>,
}

impl RecipesLimitParams {
    // Unparseable limits are ignored rather than rejected.
    fn recipes_limit(&self) -> Option<usize> {
        self.recipes_limit
            .as_deref()
            .and_then(|limit| limit.trim().parse().ok())
    }
}

pub async fn subscribe<S: Store + 'static>(
    State(store): State<Arc<S>>,
    Path(author_id): Path<i32>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<RecipesLimitParams>,
) -> Result<impl IntoResponse, AppError> {
    let recipes_limit = params.recipes_limit();
    let author = blocking(store, move |store| {
        membership::follow(store, user_id, author_id, recipes_limit)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(author)))
}

pub async fn list_subscriptions<S: Store + 'static>(
    State(store): State<Arc<S>>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<RecipesLimitParams>,
) -> Result<impl IntoResponse, AppError> {
    let recipes_limit = params.recipes_limit();
    let authors = blocking(store, move |store| {
        membership::subscriptions(store, user_id, recipes_limit)
    })
    .await?;

    Ok(Json(authors))
}

pub async fn unsubscribe<S: Store + 'static>(
    State(store): State<Arc<S>>,
    Path(author_id): Path<i32>,
    CurrentUser(user_id): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    blocking(store, move |store| membership::unfollow(store, user_id, author_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}
