mod common;

use common::{build_client, test_config};
use mockito::{Matcher, Server};
use salessync_client::auth::Registration;
use salessync_client::config::{FileStorageConfig, StorageBackend};
use salessync_client::models::credential::Credential;
use salessync_client::storage::keys;
use serde_json::json;

#[tokio::test]
async fn test_login_stores_tokens_for_later_requests() {
    let mut server = Server::new_async().await;
    let login = server
        .mock("POST", "/auth/login")
        .match_header("x-tenant-code", "DEMO")
        .match_body(Matcher::Json(json!({
            "email": "agent@demo.salessync.com",
            "password": "secret"
        })))
        .with_status(200)
        .with_body(
            r#"{
                "user": {"id": "u-1", "email": "agent@demo.salessync.com", "role": "agent"},
                "tokens": {"accessToken": "a-1", "refreshToken": "r-1"}
            }"#,
        )
        .create_async()
        .await;
    let dashboard = server
        .mock("GET", "/dashboard")
        .match_header("authorization", "Bearer a-1")
        .with_status(200)
        .with_body(r#"{"totals": {}}"#)
        .create_async()
        .await;

    let (app, _) = build_client(test_config(&server.url()), "/login");
    assert!(!app.session.is_authenticated());

    let result = app
        .session
        .login("agent@demo.salessync.com", "secret")
        .await
        .unwrap();

    login.assert_async().await;
    assert_eq!(result.user["role"], "agent");
    assert_eq!(result.redirect_to, None);
    assert!(app.session.is_authenticated());

    app.dashboard().overview().await.unwrap();
    dashboard.assert_async().await;

    app.session.logout();
    assert!(!app.session.is_authenticated());
}

#[tokio::test]
async fn test_bad_password_is_not_refreshed() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/auth/login")
        .with_status(401)
        .with_body(r#"{"error": "Invalid credentials"}"#)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/auth/refresh")
        .expect(0)
        .create_async()
        .await;

    let (app, navigator) = build_client(test_config(&server.url()), "/login");

    let err = app.session.login("a@b.c", "wrong").await.unwrap_err();

    refresh.assert_async().await;
    assert_eq!(err.status, 401);
    assert_eq!(err.message, "Invalid credentials");
    assert!(navigator.redirects().is_empty());
}

#[tokio::test]
async fn test_login_returns_remembered_page() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/auth/login")
        .with_status(200)
        .with_body(r#"{"user": {"id": "u-1"}, "tokens": {"accessToken": "a-1"}}"#)
        .create_async()
        .await;

    let (app, _) = build_client(test_config(&server.url()), "/login");
    let storage = app.client.state().storage.clone();
    storage.set(keys::REDIRECT_AFTER_LOGIN, "/orders/7").unwrap();

    let result = app.session.login("a@b.c", "pw").await.unwrap();

    assert_eq!(result.redirect_to.as_deref(), Some("/orders/7"));
    assert_eq!(storage.get(keys::REDIRECT_AFTER_LOGIN).unwrap(), None);
}

#[tokio::test]
async fn test_session_survives_restart_with_file_storage() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/auth/login")
        .with_status(200)
        .with_body(r#"{"user": {}, "tokens": {"accessToken": "a-1", "refreshToken": "r-1"}}"#)
        .create_async()
        .await;
    let customers = server
        .mock("GET", "/customers")
        .match_header("authorization", "Bearer a-1")
        .with_status(200)
        .with_body(r#"{"customers": []}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&server.url());
    config.storage.enabled = true;
    config.storage.backend = Some(StorageBackend::File(FileStorageConfig {
        path: dir.path().join("session.json").to_string_lossy().into_owned(),
    }));

    let (first, _) = build_client(config.clone(), "/login");
    first.session.login("a@b.c", "pw").await.unwrap();
    drop(first);

    let (second, _) = build_client(config, "/customers");
    assert!(second.session.is_authenticated());
    second
        .resource("customers".parse().unwrap())
        .list(&Default::default())
        .await
        .unwrap();
    customers.assert_async().await;
}

#[tokio::test]
async fn test_register_posts_camel_case_fields() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("POST", "/auth/register")
        .match_body(Matcher::Json(json!({
            "email": "new@demo.salessync.com",
            "password": "secret",
            "firstName": "Thandi",
            "lastName": "Nkosi",
            "role": "agent"
        })))
        .with_status(201)
        .with_body(r#"{"user": {"id": "u-9", "role": "agent"}}"#)
        .create_async()
        .await;

    let (app, _) = build_client(test_config(&server.url()), "/register");

    let user = app
        .session
        .register(&Registration {
            email: "new@demo.salessync.com".to_string(),
            password: "secret".to_string(),
            first_name: "Thandi".to_string(),
            last_name: "Nkosi".to_string(),
            role: "agent".to_string(),
        })
        .await
        .unwrap();

    m.assert_async().await;
    assert_eq!(user["id"], "u-9");
    assert!(!app.session.is_authenticated());
}

#[tokio::test]
async fn test_change_password() {
    let mut server = Server::new_async().await;
    let m = server
        .mock("POST", "/users/u-1/change-password")
        .match_header("authorization", "Bearer a-1")
        .match_body(Matcher::Json(json!({
            "currentPassword": "old",
            "newPassword": "new"
        })))
        .with_status(200)
        .with_body(r#"{"success": true}"#)
        .create_async()
        .await;

    let (app, _) = build_client(test_config(&server.url()), "/profile");
    app.client
        .state()
        .credentials
        .set(Credential::new("a-1", Some("r-1".to_string())));

    let body = app.session.change_password("u-1", "old", "new").await.unwrap();

    m.assert_async().await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_wrong_current_password_is_reported() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/users/u-1/change-password")
        .with_status(400)
        .with_body(r#"{"message": "Current password is incorrect"}"#)
        .create_async()
        .await;

    let (app, _) = build_client(test_config(&server.url()), "/profile");

    let err = app
        .session
        .change_password("u-1", "guess", "new")
        .await
        .unwrap_err();

    assert_eq!(err.status, 400);
    assert_eq!(err.message, "Current password is incorrect");
}
