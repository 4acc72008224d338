#![allow(dead_code)]

use std::sync::Arc;

use chrono::Duration;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use tourbook::auth::password::HashCost;
use tourbook::config::Config;
use tourbook::db::{MemoryStore, PgStore, Store};
use tourbook::state::{AppState, SharedState};

pub const SECRET: &str = "integration-secret-that-is-long-enough";

/// A running server bound to a random local port.
pub struct TestApp {
    pub addr: std::net::SocketAddr,
    pub client: Client,
    pub state: SharedState,
    /// Set when backed by a throwaway Postgres database.
    pub pg: Option<(PgPool, String)>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> (Value, StatusCode) {
        self.register_with(json!({ "name": name, "email": email, "password": password }))
            .await
    }

    pub async fn register_with(&self, body: Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/auth/register"))
            .json(&body)
            .send()
            .await
            .expect("register request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Registers a throwaway account and returns its token.
    pub async fn token(&self) -> String {
        let email = format!("staff-{}@tours.test", Uuid::now_v7().simple());
        let (body, status) = self.register("Staff", &email, "password123").await;
        assert_eq!(status, StatusCode::CREATED, "token register failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn put_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn delete_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("delete request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: SECRET.to_string(),
        token_lifetime: Duration::hours(1),
        hash_cost: HashCost {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        },
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        max_body_size: 64 * 1024,
        log_level: "warn".to_string(),
    }
}

async fn serve(config: Config, store: Arc<dyn Store>, pg: Option<(PgPool, String)>) -> TestApp {
    let state: SharedState = Arc::new(AppState::new(config, store).unwrap());
    let app = tourbook::build_app(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
        state,
        pg,
    }
}

/// Server backed by an in-memory store.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_store(Arc::new(MemoryStore::new())).await
}

/// Server backed by the given store.
pub async fn spawn_app_with_store(store: Arc<dyn Store>) -> TestApp {
    serve(test_config(), store, None).await
}

/// Server backed by a fresh Postgres database, or `None` when
/// `DATABASE_URL` is not set.
pub async fn spawn_pg_app() -> Option<TestApp> {
    let _ = dotenvy::dotenv();
    let base_url = std::env::var("DATABASE_URL").ok()?;

    let db_name = format!("tourbook_test_{}", Uuid::now_v7().simple());
    let admin_url = with_database(&base_url, "postgres");

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");
    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");
    admin_pool.close().await;

    let test_url = with_database(&base_url, &db_name);
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = Config {
        database_url: test_url,
        ..test_config()
    };
    let store = Arc::new(PgStore::new(pool.clone()));
    Some(serve(config, store, Some((pool, db_name))).await)
}

/// Drops the throwaway database, if any.
pub async fn cleanup(app: TestApp) {
    let Some((pool, db_name)) = app.pg else {
        return;
    };
    pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for cleanup");
    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&with_database(&base_url, "postgres"))
        .await
        .expect("Failed to connect for cleanup");
    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;
    admin_pool.close().await;
}

fn with_database(url: &str, db_name: &str) -> String {
    url.rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| url.to_string())
}
