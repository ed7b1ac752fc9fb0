//! Tests for the HTTP binding, driven through the router without a socket.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use stakes_server::GameService;
use stakes_server::server::router;
use stakes_tictactoe::{Address, Contract, MemoryContract};

const ALICE: &str = "ST1PQHQKV0RJXZFY1DGX8MNSNYVE3VGZJSRTPGZGM";
const BOB: &str = "ST1SJ3DTE5DN7X54YDH5D64R3BCB6A2AG2ZQ8YPD5";

fn app(faucet: bool) -> Router {
    let mut contract = MemoryContract::new();
    contract.fund(&Address::new(ALICE), 10_000).unwrap();
    contract.fund(&Address::new(BOB), 10_000).unwrap();
    router(GameService::new(contract, faucet))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn post(uri: &str, caller: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(caller) = caller {
        builder = builder.header("x-caller", caller);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(false), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_create_game_returns_id_and_events() {
    let app = app(false);
    let (status, body) = send(
        &app,
        post("/games", Some(ALICE), json!({"bet_amount": 100, "move_index": 0, "move": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], json!({"ok": 0}));
    assert_eq!(body["events"].as_array().unwrap().len(), 2);
    assert_eq!(body["events"][0]["type"], "transfer");
    assert_eq!(body["events"][1]["type"], "print");
    assert_eq!(body["events"][1]["action"], "create-game");
}

#[tokio::test]
async fn test_rejected_call_is_bad_request() {
    let app = app(false);
    let (status, body) = send(
        &app,
        post("/games", Some(ALICE), json!({"bet_amount": 0, "move_index": 0, "move": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"result": {"err": 100}, "events": []}));
}

#[tokio::test]
async fn test_missing_caller_unauthorized() {
    let (status, _) = send(
        &app(false),
        post("/games", None, json!({"bet_amount": 100, "move_index": 0, "move": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_full_game_over_http() {
    let app = app(false);
    let moves = [
        ("/games", ALICE, json!({"bet_amount": 100, "move_index": 0, "move": 1})),
        ("/games/0/join", BOB, json!({"move_index": 3, "move": 2})),
        ("/games/0/play", ALICE, json!({"move_index": 1, "move": 1})),
        ("/games/0/play", BOB, json!({"move_index": 4, "move": 2})),
        ("/games/0/play", ALICE, json!({"move_index": 2, "move": 1})),
    ];
    for (uri, caller, body) in moves {
        let (status, response) = send(&app, post(uri, Some(caller), body)).await;
        assert_eq!(status, StatusCode::OK, "{} by {}: {}", uri, caller, response);
    }

    let (status, game) = send(&app, get("/games/0")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["player-one"], ALICE);
    assert_eq!(game["player-two"], BOB);
    assert_eq!(game["is-player-one-turn"], false);
    assert_eq!(game["board"], json!([1, 1, 1, 2, 2, 0, 0, 0, 0]));
    assert_eq!(game["winner"], ALICE);

    let (_, balance) = send(&app, get(&format!("/accounts/{}/balance", ALICE))).await;
    assert_eq!(balance["balance"], 10_100);

    let (status, body) = send(
        &app,
        post("/games/0/play", Some(BOB), json!({"move_index": 5, "move": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["result"], json!({"err": 106}));
}

#[tokio::test]
async fn test_unknown_game_not_found() {
    let (status, _) = send(&app(false), get("/games/42")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_games_ascending() {
    let app = app(false);
    for index in [0, 4] {
        send(
            &app,
            post("/games", Some(ALICE), json!({"bet_amount": 100, "move_index": index, "move": 1})),
        )
        .await;
    }
    let (status, games) = send(&app, get("/games")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<u64> = games
        .as_array()
        .unwrap()
        .iter()
        .map(|game| game["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![0, 1]);
}

#[tokio::test]
async fn test_fund_requires_faucet() {
    let uri = "/accounts/carol/fund";
    let (status, _) = send(&app(false), post(uri, None, json!({"amount": 500}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let app = app(true);
    let (status, body) = send(&app, post(uri, None, json!({"amount": 500}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], json!({"ok": 500}));

    let (status, body) = send(&app, post(uri, None, json!({"amount": 0}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["result"], json!({"err": 3}));
}
