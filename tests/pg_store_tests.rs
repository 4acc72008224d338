//! Runs against a throwaway Postgres database. Skipped unless
//! `DATABASE_URL` points at a server the tests may create databases on.

mod common;

use reqwest::StatusCode;
use serde_json::json;

macro_rules! pg_app {
    () => {
        match common::spawn_pg_app().await {
            Some(app) => app,
            None => {
                eprintln!("DATABASE_URL not set; skipping");
                return;
            }
        }
    };
}

#[tokio::test]
async fn pg_register_login_and_duplicate() {
    let app = pg_app!();

    let (body, status) = app.register("Ana", "Ana@Tours.test", "password123").await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["email"], "ana@tours.test");

    let (body, status) = app.register("Ana", "ana@tours.test", "password123").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "DUPLICATE_EMAIL");

    let (body, status) = app.login("ana@tours.test", "password123").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());

    let (_, status) = app.login("ana@tours.test", "nope-nope").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}

#[tokio::test]
async fn pg_role_delete_sets_user_role_null_and_cascades() {
    let app = pg_app!();
    let admin = app.token().await;

    let (role, status) = app
        .post_auth("/api/roles", &admin, &json!({ "name": "guide" }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{role}");
    let (perm, _) = app
        .post_auth("/api/permissions", &admin, &json!({ "name": "tours.lead" }))
        .await;
    let (_, status) = app
        .post_auth(
            "/api/roles-permissions",
            &admin,
            &json!({ "roleId": role["id"], "permissionId": perm["id"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (luis, status) = app
        .register_with(json!({
            "name": "Luis",
            "email": "luis@tours.test",
            "password": "password123",
            "roleId": role["id"],
        }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let role_path = format!("/api/roles/{}", role["id"].as_str().unwrap());
    let (_, status) = app.delete_auth(&role_path, &admin).await;
    assert_eq!(status, StatusCode::OK);

    let (user, _) = app
        .get_auth(
            &format!("/api/users/{}", luis["id"].as_str().unwrap()),
            &admin,
        )
        .await;
    assert!(user["roleId"].is_null());

    let (assignments, _) = app.get_auth("/api/roles-permissions", &admin).await;
    assert!(assignments.as_array().unwrap().is_empty());

    common::cleanup(app).await;
}

#[tokio::test]
async fn pg_partial_user_update() {
    let app = pg_app!();
    let admin = app.token().await;

    let (created, status) = app
        .post_auth(
            "/api/users",
            &admin,
            &json!({
                "name": "Marta",
                "email": "marta@tours.test",
                "password": "password123",
                "phone": "3001234567",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    let path = format!("/api/users/{}", created["id"].as_str().unwrap());

    let (updated, status) = app
        .put_auth(&path, &admin, &json!({ "status": "inactive" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "inactive");
    assert_eq!(updated["phone"], "3001234567");

    let (updated, _) = app.put_auth(&path, &admin, &json!({ "phone": null })).await;
    assert!(updated["phone"].is_null());
    assert_eq!(updated["name"], "Marta");

    let (_, status) = app.login("marta@tours.test", "password123").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    common::cleanup(app).await;
}
