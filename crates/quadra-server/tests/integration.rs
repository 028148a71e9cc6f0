use axum::http::StatusCode;
use http_body_util::BodyExt;
use quadra_core::config::Config;
use quadra_server::{build_router, AppState};
use serde_json::json;
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Bootstrap a club directory and open its state.
fn init_club(dir: &TempDir) -> AppState {
    Config::new("Tigres FC").save(dir.path()).unwrap();
    AppState::open(dir.path().to_path_buf()).unwrap()
}

/// Send a GET request via `oneshot` and return (status, parsed JSON body).
async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Send a POST request with a JSON body via `oneshot` and return (status, parsed JSON body).
async fn post_json(
    app: axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn invite_coach(state: &AppState) {
    let (status, _) = post_json(
        build_router(state.clone()),
        "/api/invitations",
        json!({
            "id": "inv1",
            "team_id": "teamA",
            "team_name": "Tigres",
            "email": "u1@x.com",
            "role": "coach",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

fn u1_decision(decision: &str) -> serde_json::Value {
    json!({
        "decision": decision,
        "actor": { "uid": "u1", "email": "u1@x.com", "name": "U1" },
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_then_list_pending() {
    let dir = TempDir::new().unwrap();
    let state = init_club(&dir);
    invite_coach(&state).await;

    let (status, json) = get(build_router(state), "/api/invitations?email=U1@x.com").await;
    assert_eq!(status, StatusCode::OK);
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], "inv1");
    assert_eq!(list[0]["status"], "pending");
    assert_eq!(list[0]["invited_user_email"], "u1@x.com");
}

#[tokio::test]
async fn accept_creates_membership() {
    let dir = TempDir::new().unwrap();
    let state = init_club(&dir);
    invite_coach(&state).await;

    let (status, json) = post_json(
        build_router(state.clone()),
        "/api/invitations/inv1/decision",
        u1_decision("accept"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "accepted");
    assert_eq!(json["membership"]["team_id"], "teamA");
    assert_eq!(json["membership"]["user_id"], "u1");
    assert_eq!(json["membership"]["role"], "coach");

    let (status, members) = get(build_router(state.clone()), "/api/teams/teamA/members").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(members.as_array().unwrap().len(), 1);
    assert_eq!(members[0]["email"], "u1@x.com");
    assert_eq!(members[0]["name"], "U1");

    let (_, pending) = get(build_router(state), "/api/invitations?email=u1@x.com").await;
    assert!(pending.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn decline_leaves_roster_empty() {
    let dir = TempDir::new().unwrap();
    let state = init_club(&dir);
    invite_coach(&state).await;

    let (status, json) = post_json(
        build_router(state.clone()),
        "/api/invitations/inv1/decision",
        u1_decision("decline"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "declined");
    assert!(json.get("membership").is_none());

    let (_, invitation) = get(build_router(state.clone()), "/api/invitations/inv1").await;
    assert_eq!(invitation["status"], "declined");

    let (_, members) = get(build_router(state), "/api/teams/teamA/members").await;
    assert!(members.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn second_decision_conflicts() {
    let dir = TempDir::new().unwrap();
    let state = init_club(&dir);
    invite_coach(&state).await;

    post_json(
        build_router(state.clone()),
        "/api/invitations/inv1/decision",
        u1_decision("accept"),
    )
    .await;
    let (status, json) = post_json(
        build_router(state.clone()),
        "/api/invitations/inv1/decision",
        u1_decision("accept"),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "invitation_not_pending");

    let (_, members) = get(build_router(state), "/api/teams/teamA/members").await;
    assert_eq!(members.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn decision_in_flight_for_same_uid_conflicts() {
    let dir = TempDir::new().unwrap();
    let state = init_club(&dir);
    invite_coach(&state).await;

    let _held = state.begin_decision("u1").unwrap();
    let (status, json) = post_json(
        build_router(state.clone()),
        "/api/invitations/inv1/decision",
        u1_decision("accept"),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "decision_in_flight");
}

#[tokio::test]
async fn unknown_invitation_is_404() {
    let dir = TempDir::new().unwrap();
    let state = init_club(&dir);

    let (status, json) = post_json(
        build_router(state.clone()),
        "/api/invitations/missing/decision",
        u1_decision("accept"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "invitation_not_found");

    let (status, _) = get(build_router(state), "/api/invitations/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_actor_is_forbidden() {
    let dir = TempDir::new().unwrap();
    let state = init_club(&dir);
    invite_coach(&state).await;

    let (status, json) = post_json(
        build_router(state),
        "/api/invitations/inv1/decision",
        json!({
            "decision": "accept",
            "actor": { "uid": "u2", "email": "u2@x.com", "name": "U2" },
        }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["code"], "identity_mismatch");
}

#[tokio::test]
async fn duplicate_pending_invite_conflicts() {
    let dir = TempDir::new().unwrap();
    let state = init_club(&dir);
    invite_coach(&state).await;

    let (status, json) = post_json(
        build_router(state),
        "/api/invitations",
        json!({
            "team_id": "teamA",
            "team_name": "Tigres",
            "email": "u1@x.com",
            "role": "player",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["code"], "invitation_exists");
}

#[tokio::test]
async fn invalid_email_is_400() {
    let dir = TempDir::new().unwrap();
    let state = init_club(&dir);

    let (status, json) = get(build_router(state), "/api/invitations?email=nobody").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "invalid_input");
}

#[tokio::test]
async fn team_invitations_lists_all_statuses() {
    let dir = TempDir::new().unwrap();
    let state = init_club(&dir);
    invite_coach(&state).await;
    post_json(
        build_router(state.clone()),
        "/api/invitations/inv1/decision",
        u1_decision("decline"),
    )
    .await;
    post_json(
        build_router(state.clone()),
        "/api/invitations",
        json!({
            "team_id": "teamA",
            "team_name": "Tigres",
            "email": "u2@x.com",
            "role": "player",
        }),
    )
    .await;

    let (status, json) = get(build_router(state), "/api/teams/teamA/invitations").await;
    assert_eq!(status, StatusCode::OK);
    let statuses: Vec<_> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["status"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(statuses.len(), 2);
    assert!(statuses.contains(&"declined".to_string()));
    assert!(statuses.contains(&"pending".to_string()));
}

#[tokio::test]
async fn event_streams_are_sse() {
    let dir = TempDir::new().unwrap();
    let state = init_club(&dir);

    for uri in ["/api/events", "/api/invitations/live?email=u1@x.com"] {
        let req = axum::http::Request::builder()
            .uri(uri)
            .body(axum::body::Body::empty())
            .unwrap();
        let response = build_router(state.clone()).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let ct = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(ct.starts_with("text/event-stream"), "{uri}: {ct}");
    }
}

#[tokio::test]
async fn live_stream_rejects_bad_email() {
    let dir = TempDir::new().unwrap();
    let state = init_club(&dir);

    let (status, _) = get(build_router(state), "/api/invitations/live?email=nope").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
