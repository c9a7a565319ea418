//! Shared helpers: an in-memory app driven in-process through the router.
#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use recipe_api::{
    configuration::{AuthSettings, DatabaseSettings},
    models::{
        ingredient::{IngredientModel, IngredientPayload},
        recipe::{Price, RecipeDetail, RecipePayload},
    },
    startup::{AppState, get_connection_pool, migrate, router},
};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let pool = get_connection_pool(&DatabaseSettings::in_memory())
            .await
            .expect("Failed to open in-memory database");
        migrate(&pool).await.expect("Failed to run migrations");

        let auth = AuthSettings {
            jwt_secret: SecretString::from("integration-test-secret".to_string()),
            token_ttl_hours: 1,
        };
        let state = AppState::new(pool, &auth);
        let router = router(state.clone());
        Self { state, router }
    }

    /// Register a user directly through the service and mint a token for it.
    pub async fn create_user(&self, email: &str) -> TestUser {
        let id = self
            .state
            .auth_service
            .register(email, "testpass123", "Test User")
            .await
            .expect("Failed to register user");
        let token = self
            .state
            .keys
            .issue(id, chrono::Duration::hours(1))
            .expect("Failed to issue token");
        TestUser { id, token }
    }

    pub async fn create_ingredient(&self, user: &TestUser, name: &str) -> IngredientModel {
        self.state
            .ingredient_service
            .create(user.id, name)
            .await
            .expect("Failed to create ingredient")
    }

    pub async fn create_recipe(
        &self,
        user: &TestUser,
        title: &str,
        price: &str,
        ingredients: &[&str],
    ) -> RecipeDetail {
        let payload = RecipePayload {
            title: title.to_string(),
            time_minutes: 10,
            price: price.parse::<Price>().expect("Invalid test price"),
            link: String::new(),
            description: String::new(),
            ingredients: ingredients
                .iter()
                .map(|name| IngredientPayload {
                    name: (*name).to_string(),
                })
                .collect(),
        };
        self.state
            .recipe_service
            .create(user.id, payload)
            .await
            .expect("Failed to create recipe")
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let request = builder.body(body).expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response body is not JSON")
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }
}

/// Names in response order from a JSON array of `{id, name}` objects.
pub fn names(list: &Value) -> Vec<String> {
    list.as_array()
        .expect("Expected a JSON array")
        .iter()
        .map(|item| item["name"].as_str().expect("Missing name").to_string())
        .collect()
}
