mod common;

use axum::http::StatusCode;
use common::{TestApp, names};
use serde_json::json;

const INGREDIENTS_URL: &str = "/ingredients/";

fn detail_url(id: i64) -> String {
    format!("/ingredients/{id}")
}

#[tokio::test]
async fn auth_is_required_to_list_ingredients() {
    let app = TestApp::spawn().await;
    let user = app.create_user("user@example.com").await;
    app.create_ingredient(&user, "Salt").await;

    let (status, body) = app.get(INGREDIENTS_URL, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body.get("error").is_some());
    assert!(!body.to_string().contains("Salt"));
}

#[tokio::test]
async fn invalid_token_is_rejected() {
    let app = TestApp::spawn().await;

    let (status, _) = app.get(INGREDIENTS_URL, Some("not-a-jwt")).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn retrieve_ingredients_ordered_by_name_descending() {
    let app = TestApp::spawn().await;
    let user = app.create_user("user@example.com").await;
    let salt = app.create_ingredient(&user, "Salt").await;
    let pepper = app.create_ingredient(&user, "Pepper").await;

    let (status, body) = app.get(INGREDIENTS_URL, Some(&user.token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"id": pepper.id, "name": "Pepper"},
            {"id": salt.id, "name": "Salt"},
        ])
    );
}

#[tokio::test]
async fn listing_order_is_strictly_descending() {
    let app = TestApp::spawn().await;
    let user = app.create_user("user@example.com").await;
    for name in ["Basil", "Thyme", "Anise", "Oregano", "Cumin"] {
        app.create_ingredient(&user, name).await;
    }

    let (_, body) = app.get(INGREDIENTS_URL, Some(&user.token)).await;

    assert_eq!(names(&body), ["Thyme", "Oregano", "Cumin", "Basil", "Anise"]);
}

#[tokio::test]
async fn identical_names_are_ordered_by_id() {
    let app = TestApp::spawn().await;
    let user = app.create_user("user@example.com").await;
    let first = app.create_ingredient(&user, "Salt").await;
    let second = app.create_ingredient(&user, "Salt").await;

    let (_, body) = app.get(INGREDIENTS_URL, Some(&user.token)).await;

    assert_eq!(body[0]["id"], json!(first.id));
    assert_eq!(body[1]["id"], json!(second.id));
}

#[tokio::test]
async fn ingredients_limited_to_user() {
    let app = TestApp::spawn().await;
    let user = app.create_user("user@example.com").await;
    let other = app.create_user("other@example.com").await;
    app.create_ingredient(&other, "Salt").await;
    let ingredient = app.create_ingredient(&user, "Pepper").await;

    let (status, body) = app.get(INGREDIENTS_URL, Some(&user.token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], json!(ingredient.name));
    assert_eq!(body[0]["id"], json!(ingredient.id));
}

#[tokio::test]
async fn update_ingredient() {
    let app = TestApp::spawn().await;
    let user = app.create_user("user@example.com").await;
    let ingredient = app.create_ingredient(&user, "Salt").await;

    let (status, body) = app
        .patch(&detail_url(ingredient.id), &user.token, json!({"name": "Pepper"}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": ingredient.id, "name": "Pepper"}));

    let (_, list) = app.get(INGREDIENTS_URL, Some(&user.token)).await;
    assert_eq!(names(&list), ["Pepper"]);
}

#[tokio::test]
async fn put_replaces_the_name() {
    let app = TestApp::spawn().await;
    let user = app.create_user("user@example.com").await;
    let ingredient = app.create_ingredient(&user, "Salt").await;

    let (status, body) = app
        .put(&detail_url(ingredient.id), &user.token, json!({"name": "Sea salt"}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], json!("Sea salt"));
}

#[tokio::test]
async fn patch_without_name_leaves_ingredient_unchanged() {
    let app = TestApp::spawn().await;
    let user = app.create_user("user@example.com").await;
    let other = app.create_user("other@example.com").await;
    let ingredient = app.create_ingredient(&user, "Salt").await;

    let (status, body) = app
        .patch(&detail_url(ingredient.id), &user.token, json!({}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": ingredient.id, "name": "Salt"}));

    let (status, _) = app
        .patch(&detail_url(ingredient.id), &other.token, json!({}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn put_requires_a_name() {
    let app = TestApp::spawn().await;
    let user = app.create_user("user@example.com").await;
    let ingredient = app.create_ingredient(&user, "Salt").await;

    let (status, body) = app
        .put(&detail_url(ingredient.id), &user.token, json!({}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn blank_name_is_rejected() {
    let app = TestApp::spawn().await;
    let user = app.create_user("user@example.com").await;
    let ingredient = app.create_ingredient(&user, "Salt").await;

    let (status, _) = app
        .patch(&detail_url(ingredient.id), &user.token, json!({"name": "   "}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, list) = app.get(INGREDIENTS_URL, Some(&user.token)).await;
    assert_eq!(names(&list), ["Salt"]);
}

#[tokio::test]
async fn updating_another_users_ingredient_is_not_found() {
    let app = TestApp::spawn().await;
    let user = app.create_user("user@example.com").await;
    let other = app.create_user("other@example.com").await;
    let theirs = app.create_ingredient(&other, "Salt").await;

    let (status, _) = app
        .patch(&detail_url(theirs.id), &user.token, json!({"name": "Pepper"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .patch(&detail_url(9999), &user.token, json!({"name": "Pepper"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = app.get(INGREDIENTS_URL, Some(&other.token)).await;
    assert_eq!(names(&list), ["Salt"]);
}

#[tokio::test]
async fn delete_ingredient() {
    let app = TestApp::spawn().await;
    let user = app.create_user("user@example.com").await;
    let ingredient = app.create_ingredient(&user, "Pepper").await;

    let (status, body) = app.delete(&detail_url(ingredient.id), &user.token).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());
    let remaining = app
        .state
        .ingredient_service
        .list(user.id, false)
        .await
        .unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn deleting_another_users_ingredient_is_not_found() {
    let app = TestApp::spawn().await;
    let user = app.create_user("user@example.com").await;
    let other = app.create_user("other@example.com").await;
    let theirs = app.create_ingredient(&other, "Pepper").await;

    let (status, _) = app.delete(&detail_url(theirs.id), &user.token).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, list) = app.get(INGREDIENTS_URL, Some(&other.token)).await;
    assert_eq!(names(&list), ["Pepper"]);
}

#[tokio::test]
async fn deleting_an_ingredient_unlinks_it_from_recipes() {
    let app = TestApp::spawn().await;
    let user = app.create_user("user@example.com").await;
    let recipe = app.create_recipe(&user, "Soup", "3.00", &["Leek"]).await;
    let leek = recipe.summary.ingredients[0].clone();

    let (status, _) = app.delete(&detail_url(leek.id), &user.token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, detail) = app
        .get(&format!("/recipes/{}", recipe.summary.id), Some(&user.token))
        .await;
    assert_eq!(detail["ingredients"], json!([]));
}

#[tokio::test]
async fn filter_ingredients_assigned_to_recipes() {
    let app = TestApp::spawn().await;
    let user = app.create_user("user@example.com").await;
    let recipe = app.create_recipe(&user, "test", "4.50", &["test1"]).await;
    let test1 = recipe.summary.ingredients[0].clone();
    let test2 = app.create_ingredient(&user, "test2").await;

    let (status, body) = app
        .get(&format!("{INGREDIENTS_URL}?assigned_only=1"), Some(&user.token))
        .await;

    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert!(items.contains(&json!({"id": test1.id, "name": "test1"})));
    assert!(!items.contains(&json!({"id": test2.id, "name": "test2"})));
}

#[tokio::test]
async fn filtered_ingredients_are_unique() {
    let app = TestApp::spawn().await;
    let user = app.create_user("user@example.com").await;
    app.create_recipe(&user, "test recipe 1", "6.00", &["test"]).await;
    app.create_recipe(&user, "test recipe 2", "3.00", &["test"]).await;
    app.create_ingredient(&user, "test2").await;

    let (_, body) = app
        .get(&format!("{INGREDIENTS_URL}?assigned_only=1"), Some(&user.token))
        .await;

    assert_eq!(names(&body), ["test"]);
}

#[tokio::test]
async fn assigned_only_zero_returns_everything() {
    let app = TestApp::spawn().await;
    let user = app.create_user("user@example.com").await;
    app.create_recipe(&user, "Toast", "1.00", &["Bread"]).await;
    app.create_ingredient(&user, "Jam").await;

    let (_, body) = app
        .get(&format!("{INGREDIENTS_URL}?assigned_only=0"), Some(&user.token))
        .await;

    assert_eq!(names(&body), ["Jam", "Bread"]);
}

#[tokio::test]
async fn assigned_filter_never_leaks_other_users_rows() {
    let app = TestApp::spawn().await;
    let user = app.create_user("user@example.com").await;
    let other = app.create_user("other@example.com").await;
    app.create_recipe(&other, "Their stew", "5.00", &["Carrot"]).await;
    app.create_recipe(&user, "My stew", "5.00", &["Potato"]).await;

    for query in ["", "?assigned_only=0", "?assigned_only=1"] {
        let (_, body) = app
            .get(&format!("{INGREDIENTS_URL}{query}"), Some(&user.token))
            .await;
        assert_eq!(names(&body), ["Potato"], "query {query:?}");
    }
}

#[tokio::test]
async fn non_integer_assigned_only_is_a_bad_request() {
    let app = TestApp::spawn().await;
    let user = app.create_user("user@example.com").await;

    let (status, _) = app
        .get(&format!("{INGREDIENTS_URL}?assigned_only=yes"), Some(&user.token))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_integer_id_is_a_bad_request() {
    let app = TestApp::spawn().await;
    let user = app.create_user("user@example.com").await;

    let (status, body) = app.delete("/ingredients/abc", &user.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app
        .patch("/ingredients/abc", &user.token, json!({"name": "Salt"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
