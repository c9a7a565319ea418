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
    models::ingredient::{IngredientFilter, IngredientModel, IngredientPatch, IngredientPayload},
    routes::auth::Claims,
    startup::AppState,
};

/// `GET /ingredients/?assigned_only={0|1}`
#[instrument(
    name = "HTTP: List ingredients",
    skip(state, claims, filter),
    fields(user_id = %claims.sub)
)]
pub async fn list_ingredients(
    State(state): State<AppState>,
    claims: Claims,
    filter: Result<Query<IngredientFilter>, QueryRejection>,
) -> Result<Json<Vec<IngredientModel>>, ApiError> {
    let owner = claims.user_id()?;
    let Query(filter) = filter?;

    let ingredients = state
        .ingredient_service
        .list(owner, filter.assigned_only())
        .await?;
    Ok(Json(ingredients))
}

/// `PATCH /ingredients/{id}`
#[instrument(
    name = "HTTP: Patch ingredient",
    skip(state, claims, id, payload),
    fields(user_id = %claims.sub)
)]
pub async fn patch_ingredient(
    State(state): State<AppState>,
    claims: Claims,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<IngredientPatch>, JsonRejection>,
) -> Result<Json<IngredientModel>, ApiError> {
    let owner = claims.user_id()?;
    let Path(id) = id?;
    let Json(patch) = payload?;

    let ingredient = state
        .ingredient_service
        .patch(owner, id, patch.name.as_deref())
        .await?;
    Ok(Json(ingredient))
}

/// `PUT /ingredients/{id}`
#[instrument(
    name = "HTTP: Update ingredient",
    skip(state, claims, id, payload),
    fields(user_id = %claims.sub)
)]
pub async fn update_ingredient(
    State(state): State<AppState>,
    claims: Claims,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<IngredientPayload>, JsonRejection>,
) -> Result<Json<IngredientModel>, ApiError> {
    let owner = claims.user_id()?;
    let Path(id) = id?;
    let Json(payload) = payload?;

    let ingredient = state
        .ingredient_service
        .rename(owner, id, &payload.name)
        .await?;
    Ok(Json(ingredient))
}

/// `DELETE /ingredients/{id}`
#[instrument(name = "HTTP: Delete ingredient", skip(state, claims, id), fields(user_id = %claims.sub))]
pub async fn delete_ingredient(
    State(state): State<AppState>,
    claims: Claims,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state
        .ingredient_service
        .delete(claims.user_id()?, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
