use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, patch, post},
};
use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::trace::TraceLayer;

use crate::configuration::{AuthSettings, DatabaseSettings, Settings};
use crate::routes::auth::{Keys, authorize_handler, me_handler, register_handler, update_me_handler};
use crate::routes::ingredient::{
    delete_ingredient, list_ingredients, patch_ingredient, update_ingredient,
};
use crate::routes::recipe::{
    create_recipe, delete_recipe, get_recipe, list_recipes, patch_recipe, replace_recipe,
};
use crate::services::auth::AuthService;
use crate::services::ingredient::IngredientService;
use crate::services::recipe::RecipeService;
use crate::store::{IngredientRepository, RecipeRepository, UserRepository};

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth_service: AuthService,
    pub ingredient_service: IngredientService,
    pub recipe_service: RecipeService,
    pub keys: Arc<Keys>,
    pub token_ttl_hours: i64,
}

impl AppState {
    pub fn new(pool: SqlitePool, auth: &AuthSettings) -> Self {
        Self {
            auth_service: AuthService::new(UserRepository::new(pool.clone())),
            ingredient_service: IngredientService::new(IngredientRepository::new(pool.clone())),
            recipe_service: RecipeService::new(RecipeRepository::new(pool)),
            keys: Arc::new(Keys::new(auth.jwt_secret.expose_secret().as_bytes())),
            token_ttl_hours: auth.token_ttl_hours,
        }
    }
}

/// Open the pool. Connections never expire so an in-memory database survives.
pub async fn get_connection_pool(settings: &DatabaseSettings) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(settings.pool_size())
        .acquire_timeout(Duration::from_secs(2))
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(settings.with_db()?)
        .await
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/users/", post(register_handler))
        .route("/users/token", post(authorize_handler))
        .route("/users/me", get(me_handler).patch(update_me_handler))
        .route("/ingredients/", get(list_ingredients))
        .route(
            "/ingredients/{id}",
            patch(patch_ingredient)
                .put(update_ingredient)
                .delete(delete_ingredient),
        )
        .route("/recipes/", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/{id}",
            get(get_recipe)
                .put(replace_recipe)
                .patch(patch_recipe)
                .delete(delete_recipe),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {:?}", e);
    }
    tracing::info!("Shutdown signal received");
}

pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let pool = get_connection_pool(&settings.database).await?;
    migrate(&pool).await?;

    let app = router(AppState::new(pool, &settings.auth));

    let address = format!("{}:{}", settings.application.host, settings.application.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("Listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
