use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use grudge_api::auth::{AppState, AppStateInner};
use grudge_db::Database;

fn test_app() -> (Router, AppState) {
    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().expect("in-memory db"),
        jwt_secret: "router-test-secret".to_string(),
    });
    (grudge_api::router(state.clone()), state)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.expect("request");
    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

fn get_authed(uri: &str, token: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request")
}

async fn register(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        post_json(
            "/auth/register",
            None,
            json!({"email": email, "password": "hunter2hunter2"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn health_is_public() {
    let (app, _) = test_app();
    let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn register_login_and_duplicate_email() {
    let (app, _) = test_app();
    register(&app, "first@example.com").await;

    let (status, body) = send(
        &app,
        post_json(
            "/auth/register",
            None,
            json!({"email": "first@example.com", "password": "hunter2hunter2"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");

    let (status, body) = send(
        &app,
        post_json(
            "/auth/login",
            None,
            json!({"email": "first@example.com", "password": "hunter2hunter2"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());

    let (status, body) = send(
        &app,
        post_json(
            "/auth/login",
            None,
            json!({"email": "first@example.com", "password": "wrong-password"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn sync_without_a_session_performs_no_writes() {
    let (app, state) = test_app();

    let (status, body) = send(
        &app,
        post_json(
            "/sync",
            None,
            json!({"enemies": [{"id": "L1", "name": "nope", "nickname": null,
                    "twitter_handle": null, "tweet_url": null,
                    "created_at": "2024-01-01T00:00:00+00:00",
                    "position_x": null, "position_y": null}],
                   "grievances": []}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    // Nothing landed in the server-of-record.
    let count: i64 = state
        .db
        .with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM enemies", [], |r| r.get(0))?))
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn sync_rejects_missing_or_non_array_enemies() {
    let (app, _) = test_app();
    let token = register(&app, "sync@example.com").await;

    for bad in [json!({"grievances": []}), json!({"enemies": "not-a-list"})] {
        let (status, body) = send(&app, post_json("/sync", Some(&token), bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid data format");
    }
}

#[tokio::test]
async fn sync_skips_malformed_records_without_failing_the_batch() {
    let (app, _) = test_app();
    let token = register(&app, "sync@example.com").await;

    // One decodable enemy, one with a null name. The batch goes through;
    // only the bad record and its grievance are dropped.
    let (status, body) = send(
        &app,
        post_json(
            "/sync",
            Some(&token),
            json!({
                "enemies": [
                    {"id": "L1", "name": "good", "nickname": null,
                     "twitter_handle": null, "tweet_url": null,
                     "created_at": "2024-01-01T00:00:00+00:00",
                     "position_x": null, "position_y": null},
                    {"id": "L2", "name": null, "nickname": null,
                     "twitter_handle": null, "tweet_url": null,
                     "created_at": "2024-01-02T00:00:00+00:00",
                     "position_x": null, "position_y": null}
                ],
                "grievances": [
                    {"id": "LG1", "enemy_id": "L1", "reason": "kept",
                     "tweet_url": null, "created_at": "2024-01-03T00:00:00+00:00"},
                    {"id": "LG2", "enemy_id": "L2", "reason": "parent dropped",
                     "tweet_url": null, "created_at": "2024-01-03T00:00:00+00:00"},
                    {"id": "LG3", "enemy_id": "L1", "reason": null,
                     "tweet_url": null, "created_at": "2024-01-03T00:00:00+00:00"}
                ]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["syncedEnemies"], 1);
    assert_eq!(body["syncedGrievances"], 1);

    let (_, listed) = send(&app, get_authed("/enemies", &token)).await;
    let enemies = listed.as_array().unwrap();
    assert_eq!(enemies.len(), 1);
    assert_eq!(enemies[0]["name"], "good");
    assert_eq!(enemies[0]["grievance_count"], 1);
    assert_eq!(enemies[0]["grievances"][0]["reason"], "kept");
}

#[tokio::test]
async fn sync_remaps_and_reports_counts() {
    let (app, _) = test_app();
    let token = register(&app, "sync@example.com").await;

    let (status, body) = send(
        &app,
        post_json(
            "/sync",
            Some(&token),
            json!({
                "enemies": [{"id": "L1", "name": "Karl", "nickname": null,
                    "twitter_handle": "karl99", "tweet_url": null,
                    "created_at": "2024-01-01T00:00:00+00:00",
                    "position_x": 10.0, "position_y": 20.0}],
                "grievances": [{"id": "LG1", "enemy_id": "L1",
                    "reason": "ladder", "tweet_url": null,
                    "created_at": "2024-01-02T00:00:00+00:00"}]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["syncedEnemies"], 1);
    assert_eq!(body["syncedGrievances"], 1);

    let (status, body) = send(&app, get_authed("/enemies", &token)).await;
    assert_eq!(status, StatusCode::OK);
    let enemies = body.as_array().unwrap();
    assert_eq!(enemies.len(), 1);
    assert_ne!(enemies[0]["id"], "L1");
    assert_eq!(enemies[0]["created_at"], "2024-01-01T00:00:00+00:00");
    assert_eq!(enemies[0]["grievance_count"], 1);
    assert_eq!(enemies[0]["grievances"][0]["enemy_id"], enemies[0]["id"]);
}

#[tokio::test]
async fn sync_with_a_missing_grievances_field_is_accepted() {
    let (app, _) = test_app();
    let token = register(&app, "sync@example.com").await;

    let (status, body) =
        send(&app, post_json("/sync", Some(&token), json!({"enemies": []}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["syncedEnemies"], 0);
    assert_eq!(body["syncedGrievances"], 0);
}

#[tokio::test]
async fn position_updates_own_record_only() {
    let (app, _) = test_app();
    let alice = register(&app, "alice@example.com").await;
    let bob = register(&app, "bob@example.com").await;

    let (status, created) = send(
        &app,
        post_json("/enemies", Some(&alice), json!({"name": "movable"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let enemy_id = created["id"].as_str().unwrap().to_string();

    // Bob aims at Alice's enemy: a no-op 200, never a cross-user mutation.
    let (status, body) = send(
        &app,
        post_json(
            "/position",
            Some(&bob),
            json!({"enemyId": enemy_id, "x": 999.0, "y": 999.0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, listed) = send(&app, get_authed("/enemies", &alice)).await;
    assert_eq!(listed[0]["position_x"], Value::Null);
    assert_eq!(listed[0]["position_y"], Value::Null);

    // Alice moves her own.
    let (status, _) = send(
        &app,
        post_json(
            "/position",
            Some(&alice),
            json!({"enemyId": enemy_id, "x": 42.5, "y": -7.0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, listed) = send(&app, get_authed("/enemies", &alice)).await;
    assert_eq!(listed[0]["position_x"], 42.5);
    assert_eq!(listed[0]["position_y"], -7.0);
}

#[tokio::test]
async fn position_rejects_malformed_bodies() {
    let (app, _) = test_app();
    let token = register(&app, "pos@example.com").await;

    for bad in [
        json!({"x": 1.0, "y": 2.0}),
        json!({"enemyId": "e", "x": "left", "y": 2.0}),
        json!({"enemyId": "", "x": 1.0, "y": 2.0}),
    ] {
        let (status, body) = send(&app, post_json("/position", Some(&token), bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid data");
    }
}

#[tokio::test]
async fn enemy_crud_is_ownership_scoped() {
    let (app, _) = test_app();
    let alice = register(&app, "alice@example.com").await;
    let bob = register(&app, "bob@example.com").await;

    let (status, body) = send(
        &app,
        post_json("/enemies", Some(&alice), json!({"name": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name is required");

    let (_, created) = send(
        &app,
        post_json(
            "/enemies",
            Some(&alice),
            json!({"name": "Karl", "twitter_handle": "@karl99"}),
        ),
    )
    .await;
    let enemy_id = created["id"].as_str().unwrap().to_string();
    // Handle stored without the leading @.
    assert_eq!(created["twitter_handle"], "karl99");

    // Bob cannot attach a grievance to, or delete, Alice's enemy.
    let (status, _) = send(
        &app,
        post_json(
            &format!("/enemies/{enemy_id}/grievances"),
            Some(&bob),
            json!({"reason": "not his to log"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Request::delete(format!("/enemies/{enemy_id}"))
            .header(header::AUTHORIZATION, format!("Bearer {bob}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Alice's grievance and cascade delete.
    let (status, grievance) = send(
        &app,
        post_json(
            &format!("/enemies/{enemy_id}/grievances"),
            Some(&alice),
            json!({"reason": "took my parking spot"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(grievance["enemy_id"], enemy_id.as_str());

    let (status, _) = send(
        &app,
        Request::delete(format!("/enemies/{enemy_id}"))
            .header(header::AUTHORIZATION, format!("Bearer {alice}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, listed) = send(&app, get_authed("/enemies", &alice)).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn garbage_bearer_token_is_unauthorized() {
    let (app, _) = test_app();
    let (status, body) = send(&app, get_authed("/enemies", "not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");
}
