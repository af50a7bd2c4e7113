mod common;

use serde_json::json;

#[tokio::test]
async fn article_crud_for_owner() {
    let env = common::TestEnv::start().await;
    let server = env.server();
    let token = env.sign_up(&server, "writer@example.com", "ink-and-paper").await;

    let created: serde_json::Value = server
        .post("/api/articles")
        .authorization_bearer(&token)
        .json(&json!({
            "title": "Backups",
            "content": "Nightly backups protect the database from accidental deletion.",
            "tags": ["ops"]
        }))
        .await
        .json();
    let id = created["id"].as_str().unwrap().to_string();

    let fetched: serde_json::Value = server.get(&format!("/api/articles/{id}")).await.json();
    assert_eq!(fetched["title"], "Backups");
    assert_eq!(fetched["tags"], json!(["ops"]));

    let updated: serde_json::Value = server
        .put(&format!("/api/articles/{id}"))
        .authorization_bearer(&token)
        .json(&json!({ "title": "Backups, revisited", "content": "Test the restores too.", "tags": ["ops"] }))
        .await
        .json();
    assert_eq!(updated["title"], "Backups, revisited");

    let mine: serde_json::Value = server
        .get("/api/users/me/articles")
        .authorization_bearer(&token)
        .await
        .json();
    assert_eq!(mine.as_array().unwrap().len(), 1);

    server
        .delete(&format!("/api/articles/{id}"))
        .authorization_bearer(&token)
        .await;
    let gone = env
        .server_permissive()
        .get(&format!("/api/articles/{id}"))
        .await;
    gone.assert_status_not_found();
}

#[tokio::test]
async fn other_users_cannot_modify() {
    let env = common::TestEnv::start().await;
    let server = env.server_permissive();
    let owner = env.sign_up(&server, "owner@example.com", "owner-pass").await;
    let intruder = env.sign_up(&server, "intruder@example.com", "intruder-pass").await;

    let created: serde_json::Value = server
        .post("/api/articles")
        .authorization_bearer(&owner)
        .json(&json!({ "title": "Mine", "content": "Hands off." }))
        .await
        .json();
    let id = created["id"].as_str().unwrap();

    let response = server
        .delete(&format!("/api/articles/{id}"))
        .authorization_bearer(&intruder)
        .await;
    response.assert_status_forbidden();

    let response = server
        .post("/api/articles")
        .json(&json!({ "title": "Anonymous", "content": "No token." }))
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn list_filters_by_tag_and_counts_tags() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    for (title, tags) in [
        ("Indexes", json!(["databases", "performance"])),
        ("Caching", json!(["performance"])),
        ("Onboarding", json!(["people"])),
    ] {
        server
            .post("/api/articles")
            .authorization_bearer(common::DEV_TOKEN)
            .json(&json!({ "title": title, "content": format!("{title} explained."), "tags": tags }))
            .await;
    }

    let performance: serde_json::Value = server
        .get("/api/articles")
        .add_query_param("tag", "performance")
        .await
        .json();
    assert_eq!(performance.as_array().unwrap().len(), 2);

    let tags: serde_json::Value = server.get("/api/tags").await.json();
    assert_eq!(tags[0], json!({ "tag": "performance", "count": 2 }));
    assert_eq!(tags.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn text_search_finds_matching_articles() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    for (title, content) in [
        ("Kubernetes", "Pods are scheduled onto nodes by the scheduler."),
        ("Payroll", "Salaries are paid on the last working day."),
    ] {
        server
            .post("/api/articles")
            .authorization_bearer(common::DEV_TOKEN)
            .json(&json!({ "title": title, "content": content }))
            .await;
    }

    let found: serde_json::Value = server
        .get("/api/articles")
        .add_query_param("q", "scheduler")
        .await
        .json();
    let found = found.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["title"], "Kubernetes");
}
