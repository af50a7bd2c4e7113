mod common;

use serde_json::json;

#[tokio::test]
async fn profile_update_and_email_uniqueness() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();
    let ada = env.sign_up(&server, "ada@example.com", "pass-ada-1").await;
    env.sign_up(&server, "grace@example.com", "pass-grace-1").await;

    let body: serde_json::Value = server
        .put("/api/users/me")
        .authorization_bearer(&ada)
        .json(&json!({ "first_name": "Augusta" }))
        .await
        .json();
    assert_eq!(body["updated"], true);

    let me: serde_json::Value = server.get("/api/users/me").authorization_bearer(&ada).await.json();
    assert_eq!(me["first_name"], "Augusta");

    let response = server
        .put("/api/users/me")
        .authorization_bearer(&ada)
        .json(&json!({ "email": "grace@example.com" }))
        .await;
    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Email already in use");
}

#[tokio::test]
async fn preferences_default_then_persist() {
    let env = common::TestEnv::start().await;
    let server = env.server();
    let token = env.sign_up(&server, "prefs@example.com", "pass-prefs").await;

    let prefs: serde_json::Value = server
        .get("/api/users/me/preferences")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(
        prefs,
        json!({
            "language": "English",
            "theme": "Light",
            "ai_model": "GPT-4 (Recommended)",
            "auto_generate_tags": true
        })
    );

    server
        .put("/api/users/me/preferences")
        .authorization_bearer(&token)
        .json(&json!({ "theme": "Dark" }))
        .await;
    let prefs: serde_json::Value = server
        .get("/api/users/me/preferences")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(prefs["theme"], "Dark");
    assert_eq!(prefs["language"], "English");
}

#[tokio::test]
async fn api_key_lifecycle() {
    let env = common::TestEnv::start().await;
    let server = env.server();
    let token = env.sign_up(&server, "keys@example.com", "pass-keys").await;

    let key: serde_json::Value = server
        .post("/api/users/me/api-keys")
        .authorization_bearer(&token)
        .await
        .json();
    assert!(key["key"].as_str().unwrap().starts_with("ib_"));
    assert_eq!(key["label"], "default");

    let keys: serde_json::Value = server
        .get("/api/users/me/api-keys")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(keys.as_array().unwrap().len(), 1);

    let id = key["id"].as_str().unwrap();
    let deleted: serde_json::Value = server
        .delete(&format!("/api/users/me/api-keys/{id}"))
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(deleted["deleted"], true);
}

#[tokio::test]
async fn webhooks_can_be_added_and_edited() {
    let env = common::TestEnv::start().await;
    let server = env.server();
    let token = env.sign_up(&server, "hooks@example.com", "pass-hooks").await;

    let hook: serde_json::Value = server
        .post("/api/users/me/webhooks")
        .authorization_bearer(&token)
        .json(&json!({ "url": "https://hooks.example.com/in", "events": ["document.processed"] }))
        .await
        .json();
    assert_eq!(hook["enabled"], true);
    let id = hook["id"].as_str().unwrap();

    server
        .put(&format!("/api/users/me/webhooks/{id}"))
        .authorization_bearer(&token)
        .json(&json!({ "enabled": false }))
        .await;

    let hooks: serde_json::Value = server
        .get("/api/users/me/webhooks")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(hooks[0]["enabled"], false);
    assert_eq!(hooks[0]["url"], "https://hooks.example.com/in");
}

#[tokio::test]
async fn password_change_requires_current_password() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();
    let token = env.sign_up(&server, "pw@example.com", "old-password").await;

    let response = server
        .post("/api/users/me/change-password")
        .authorization_bearer(&token)
        .json(&json!({ "current_password": "nope", "new_password": "new-password" }))
        .await;
    response.assert_status_bad_request();

    server
        .post("/api/users/me/change-password")
        .authorization_bearer(&token)
        .json(&json!({ "current_password": "old-password", "new_password": "new-password" }))
        .await
        .assert_status_ok();

    server
        .post("/api/auth/login")
        .json(&json!({ "email": "pw@example.com", "password": "new-password" }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn security_and_notification_settings() {
    let env = common::TestEnv::start().await;
    let server = env.server();
    let token = env.sign_up(&server, "settings@example.com", "pass-settings").await;

    let tfa: serde_json::Value = server
        .post("/api/users/me/2fa")
        .add_query_param("enabled", true)
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(tfa["enabled"], true);
    let tfa: serde_json::Value = server.get("/api/users/me/2fa").authorization_bearer(&token).await.json();
    assert_eq!(tfa["enabled"], true);

    server
        .put("/api/users/me/notifications")
        .authorization_bearer(&token)
        .json(&json!({ "push": false, "types": { "feature_updates": true } }))
        .await;
    let notif: serde_json::Value = server
        .get("/api/users/me/notifications")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(notif["email"], true);
    assert_eq!(notif["push"], false);
    assert_eq!(notif["types"]["feature_updates"], true);
    assert_eq!(notif["types"]["weekly_report"], true);

    server
        .put("/api/users/me/integrations/slack/toggle")
        .authorization_bearer(&token)
        .json(&json!({ "enabled": true }))
        .await;
    let ints: serde_json::Value = server
        .get("/api/users/me/integrations")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(ints["slack"]["enabled"], true);
    assert_eq!(ints["dropbox"]["enabled"], false);
}

#[tokio::test]
async fn deleting_account_removes_owned_articles() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();
    let token = env.sign_up(&server, "leaving@example.com", "pass-leaving").await;

    let article: serde_json::Value = server
        .post("/api/articles")
        .authorization_bearer(&token)
        .json(&json!({ "title": "Farewell", "content": "Goodbye and thanks." }))
        .await
        .json();

    let body: serde_json::Value = server
        .delete("/api/users/me")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(body["deleted"], true);

    let id = article["id"].as_str().unwrap();
    server.get(&format!("/api/articles/{id}")).await.assert_status_not_found();
    server
        .get("/api/users/me")
        .authorization_bearer(&token)
        .await
        .assert_status_unauthorized();
}
