//! Shared helpers for the integration tests: a real server on a random port, backed by
//! the in-memory store.
#![allow(dead_code)]

use std::net::TcpListener;
use std::sync::Arc;

use gohost::configuration::{
    ApplicationSettings, DatabaseSettings, JwtSettings, Platform, Settings, WebhookSettings,
};
use gohost::startup::run;
use gohost::store::InMemoryStore;
use secrecy::Secret;
use serde_json::{json, Value};

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-characters";
pub const JWT_ISSUER: &str = "gohost-test";
pub const WEBHOOK_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryStore>,
    pub client: reqwest::Client,
}

pub fn test_settings(platform: Platform) -> Settings {
    Settings {
        database: DatabaseSettings {
            username: "postgres".to_string(),
            password: Secret::new("password".to_string()),
            port: 5432,
            host: "localhost".to_string(),
            database_name: "gohost".to_string(),
            in_memory: true,
        },
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            platform,
            static_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/public").to_string(),
        },
        jwt: JwtSettings {
            secret: Secret::new(JWT_SECRET.to_string()),
            issuer: JWT_ISSUER.to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry_days: 60,
        },
        webhook: WebhookSettings {
            api_key: Secret::new(WEBHOOK_KEY.to_string()),
        },
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_on(Platform::Production).await
}

pub async fn spawn_app_on(platform: Platform) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let store = Arc::new(InMemoryStore::new());
    let server = run(listener, store.clone(), &test_settings(platform))
        .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        store,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/users"))
            .json(&json!({"email": email, "password": password}))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/login"))
            .json(&json!({"email": email, "password": password}))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Register and log in; returns the login response body
    pub async fn signed_in_user(&self, email: &str, password: &str) -> Value {
        let response = self.register(email, password).await;
        assert_eq!(201, response.status().as_u16());

        let response = self.login(email, password).await;
        assert_eq!(200, response.status().as_u16());
        response.json().await.expect("Failed to parse response")
    }

    pub async fn create_gobit(&self, token: &str, body: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/gobits"))
            .bearer_auth(token)
            .json(&json!({ "body": body }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_with_bearer(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}
