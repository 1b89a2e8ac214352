//! Boundary behaviors called out directly: single-player rooms can't start,
//! out-of-range ratings are rejected, malformed versions and launch
//! commands are rejected at upload time.

mod support;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::json;
use support::{error_code, is_ok, spawn_server, Client};

async fn register_and_login(client: &mut Client, name: &str, password: &str) {
    let resp = client.call("register", json!({ "name": name, "password": password })).await;
    assert!(is_ok(&resp), "{resp:?}");
    let resp = client.call("login", json!({ "name": name, "password": password })).await;
    assert!(is_ok(&resp), "{resp:?}");
}

#[tokio::test]
async fn single_player_room_cannot_start() {
    let server = spawn_server().await;

    let mut dev = Client::developer(server.dev_port).await;
    register_and_login(&mut dev, "alice", "pw").await;
    let resp = dev
        .call(
            "upload_game",
            json!({
                "name": "solo",
                "kind": "cli",
                "description": "",
                "max_players": 1,
                "version": "1.0.0",
                "bundle_base64": BASE64.encode(b"bytes"),
                "config": { "start_command": "py game.py {host} {port}" },
            }),
        )
        .await;
    assert!(is_ok(&resp), "{resp:?}");

    let mut alice = Client::player(server.lobby_port).await;
    register_and_login(&mut alice, "alice", "pw").await;
    let created = alice.call("create_room", json!({ "game_name": "solo", "version": "1.0.0" })).await;
    assert!(is_ok(&created), "{created:?}");

    let started = alice.call("start_game", json!({})).await;
    assert!(!is_ok(&started));
    assert_eq!(error_code(&started), "INSUFFICIENT_PLAYERS");
}

#[tokio::test]
async fn rating_out_of_range_is_rejected() {
    let server = spawn_server().await;

    let mut dev = Client::developer(server.dev_port).await;
    register_and_login(&mut dev, "alice", "pw").await;
    dev.call(
        "upload_game",
        json!({
            "name": "tic",
            "kind": "multiplayer",
            "description": "",
            "max_players": 4,
            "version": "1.0.0",
            "bundle_base64": BASE64.encode(b"bytes"),
            "config": { "start_command": "py game.py {host} {port}" },
        }),
    )
    .await;

    let mut bob = Client::player(server.lobby_port).await;
    register_and_login(&mut bob, "bob", "pw").await;
    bob.call("download_game", json!({ "name": "tic" })).await;

    let too_high = bob.call("submit_review", json!({ "name": "tic", "rating": 6, "comment": "" })).await;
    assert!(!is_ok(&too_high));
    assert_eq!(error_code(&too_high), "RATING_OUT_OF_RANGE");

    let too_low = bob.call("submit_review", json!({ "name": "tic", "rating": 0, "comment": "" })).await;
    assert!(!is_ok(&too_low));
    assert_eq!(error_code(&too_low), "RATING_OUT_OF_RANGE");
}

#[tokio::test]
async fn malformed_version_is_rejected_at_upload() {
    let server = spawn_server().await;

    let mut dev = Client::developer(server.dev_port).await;
    register_and_login(&mut dev, "alice", "pw").await;
    let resp = dev
        .call(
            "upload_game",
            json!({
                "name": "tic",
                "kind": "cli",
                "description": "",
                "max_players": 2,
                "version": "not-a-version",
                "bundle_base64": BASE64.encode(b"bytes"),
                "config": { "start_command": "py game.py {host} {port}" },
            }),
        )
        .await;
    assert!(!is_ok(&resp));
    assert_eq!(error_code(&resp), "CONFIG_INVALID");
}

#[tokio::test]
async fn start_command_missing_placeholders_is_rejected_at_upload() {
    let server = spawn_server().await;

    let mut dev = Client::developer(server.dev_port).await;
    register_and_login(&mut dev, "alice", "pw").await;

    let missing_host = dev
        .call(
            "upload_game",
            json!({
                "name": "tic",
                "kind": "cli",
                "description": "",
                "max_players": 2,
                "version": "1.0.0",
                "bundle_base64": BASE64.encode(b"bytes"),
                "config": { "start_command": "py game.py {port}" },
            }),
        )
        .await;
    assert!(!is_ok(&missing_host));
    assert_eq!(error_code(&missing_host), "CONFIG_INVALID");

    let missing_port = dev
        .call(
            "upload_game",
            json!({
                "name": "tic2",
                "kind": "cli",
                "description": "",
                "max_players": 2,
                "version": "1.0.0",
                "bundle_base64": BASE64.encode(b"bytes"),
                "config": { "start_command": "py game.py {host}" },
            }),
        )
        .await;
    assert!(!is_ok(&missing_port));
    assert_eq!(error_code(&missing_port), "CONFIG_INVALID");
}
