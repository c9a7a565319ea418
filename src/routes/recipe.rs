use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use tracing::instrument;

use crate::{
    errors::ApiError,
    models::recipe::{RecipeDetail, RecipeFilter, RecipePatch, RecipePayload, RecipeSummary},
    routes::auth::Claims,
    startup::AppState,
};

#[instrument(name = "HTTP: List recipes", skip(state, claims, filter), fields(user_id = %claims.sub))]
pub async fn list_recipes(
    State(state): State<AppState>,
    claims: Claims,
    filter: Result<Query<RecipeFilter>, QueryRejection>,
) -> Result<Json<Vec<RecipeSummary>>, ApiError> {
    let owner = claims.user_id()?;
    let Query(filter) = filter?;
    let ingredient_ids = filter.ingredient_ids()?;

    let recipes = state
        .recipe_service
        .list(owner, ingredient_ids.as_deref())
        .await?;
    Ok(Json(recipes))
}

#[instrument(name = "HTTP: Create recipe", skip(state, claims, payload), fields(user_id = %claims.sub))]
pub async fn create_recipe(
    State(state): State<AppState>,
    claims: Claims,
    payload: Result<Json<RecipePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<RecipeDetail>), ApiError> {
    let owner = claims.user_id()?;
    let Json(payload) = payload?;

    let recipe = state.recipe_service.create(owner, payload).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

#[instrument(name = "HTTP: Get recipe", skip(state, claims, id), fields(user_id = %claims.sub))]
pub async fn get_recipe(
    State(state): State<AppState>,
    claims: Claims,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<RecipeDetail>, ApiError> {
    let Path(id) = id?;
    let recipe = state.recipe_service.get(claims.user_id()?, id).await?;
    Ok(Json(recipe))
}

#[instrument(name = "HTTP: Replace recipe", skip(state, claims, id, payload), fields(user_id = %claims.sub))]
pub async fn replace_recipe(
    State(state): State<AppState>,
    claims: Claims,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<RecipePayload>, JsonRejection>,
) -> Result<Json<RecipeDetail>, ApiError> {
    let owner = claims.user_id()?;
    let Path(id) = id?;
    let Json(payload) = payload?;

    let recipe = state.recipe_service.replace(owner, id, payload).await?;
    Ok(Json(recipe))
}

#[instrument(name = "HTTP: Patch recipe", skip(state, claims, id, payload), fields(user_id = %claims.sub))]
pub async fn patch_recipe(
    State(state): State<AppState>,
    claims: Claims,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<RecipePatch>, JsonRejection>,
) -> Result<Json<RecipeDetail>, ApiError> {
    let owner = claims.user_id()?;
    let Path(id) = id?;
    let Json(patch) = payload?;

    let recipe = state.recipe_service.patch(owner, id, patch).await?;
    Ok(Json(recipe))
}

#[instrument(name = "HTTP: Delete recipe", skip(state, claims, id), fields(user_id = %claims.sub))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    claims: Claims,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.recipe_service.delete(claims.user_id()?, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
