//! Player connection role: register/login/presence, catalog browsing, and
//! the room lifecycle (create/join/leave/start/reset/status).

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;

use crate::credential::{CredentialError, PrincipalKind};
use crate::protocol::{is_developer_action, ClientType, ErrorCode, PlayerAction, ResponseFrame, Version};
use crate::room::RoomRegistry;

use super::{Core, EndpointRole, Session};

pub struct PlayerRole;

#[async_trait::async_trait]
impl EndpointRole for PlayerRole {
    type Action = PlayerAction;

    fn client_type() -> ClientType {
        ClientType::Player
    }

    fn parse_action(name: &str) -> Option<Self::Action> {
        name.parse().ok()
    }

    fn is_foreign_action(name: &str) -> bool {
        is_developer_action(name)
    }

    fn read_deadline(core: &Core) -> Option<Duration> {
        Some(core.player_read_deadline)
    }

    async fn dispatch(core: &Arc<Core>, session: &mut Session, action: Self::Action, data: Value) -> ResponseFrame {
        match action {
            PlayerAction::Register => register(core, data).await,
            PlayerAction::Login => login(core, session, data).await,
            PlayerAction::ListGames => list_games(core).await,
            PlayerAction::GetGameInfo => get_game_info(core, data).await,
            PlayerAction::DownloadGame => download_game(core, session, data).await,
            PlayerAction::SubmitReview => submit_review(core, session, data).await,
            PlayerAction::GetReviews => get_reviews(core, data).await,
            PlayerAction::CreateRoom => create_room(core, session, data).await,
            PlayerAction::ListRooms => list_rooms(core).await,
            PlayerAction::JoinRoom => join_room(core, session, data).await,
            PlayerAction::LeaveRoom => leave_room(core, session).await,
            PlayerAction::GetRoomStatus => get_room_status(core, session, data).await,
            PlayerAction::StartGame => start_game(core, session).await,
            PlayerAction::ResetRoom => reset_room(core, session).await,
            PlayerAction::ListOnlinePlayers => list_online_players(core).await,
        }
    }

    async fn teardown(core: &Arc<Core>, session: &Session) {
        if let Some(player) = &session.principal {
            if let Some(room_id) = &session.room_id {
                let _ = core.rooms.leave(room_id, player).await;
            }
            core.presence.logout(player);
        }
    }
}

#[derive(Deserialize)]
struct Credentials {
    name: String,
    password: String,
}

async fn register(core: &Arc<Core>, data: Value) -> ResponseFrame {
    let Ok(creds) = serde_json::from_value::<Credentials>(data) else {
        return ResponseFrame::error(ErrorCode::MissingCredentials);
    };
    match core.credentials.create_principal(PrincipalKind::Player, &creds.name, &creds.password).await {
        Ok(()) => ResponseFrame::ok(),
        Err(e) => credential_error_response(e),
    }
}

async fn login(core: &Arc<Core>, session: &mut Session, data: Value) -> ResponseFrame {
    let Ok(creds) = serde_json::from_value::<Credentials>(data) else {
        return ResponseFrame::error(ErrorCode::MissingCredentials);
    };
    if let Err(e) = core.credentials.verify_credentials(PrincipalKind::Player, &creds.name, &creds.password).await {
        return credential_error_response(e);
    }
    if let Err(e) = core.presence.login(&creds.name, &creds.name) {
        return ResponseFrame::error(e.code());
    }
    session.principal = Some(creds.name);
    ResponseFrame::ok()
}

fn credential_error_response(err: CredentialError) -> ResponseFrame {
    ResponseFrame::error_with_message(err.code(), err.to_string())
}

async fn list_games(core: &Arc<Core>) -> ResponseFrame {
    ResponseFrame::ok_with(core.catalog.list_active().await)
}

#[derive(Deserialize)]
struct GameNameRequest {
    name: String,
}

async fn get_game_info(core: &Arc<Core>, data: Value) -> ResponseFrame {
    let Ok(req) = serde_json::from_value::<GameNameRequest>(data) else {
        return ResponseFrame::error(ErrorCode::GameNotFound);
    };
    match core.catalog.get_info(&req.name).await {
        Ok((game, reviews)) => ResponseFrame::ok_with(serde_json::json!({ "game": game, "reviews": reviews })),
        Err(e) => ResponseFrame::error_with_message(e.code(), e.to_string()),
    }
}

async fn download_game(core: &Arc<Core>, session: &Session, data: Value) -> ResponseFrame {
    let player = match session.require_login() {
        Ok(name) => name.to_string(),
        Err(code) => return ResponseFrame::error(code),
    };
    let Ok(req) = serde_json::from_value::<GameNameRequest>(data) else {
        return ResponseFrame::error(ErrorCode::GameNotFound);
    };
    match core.catalog.package_bundle(&player, &req.name).await {
        Ok((bundle, config)) => {
            core.metrics.increment_bundles_downloaded();
            ResponseFrame::ok_with(serde_json::json!({
                "bundle_base64": BASE64.encode(bundle),
                "config": config,
            }))
        }
        Err(e) => ResponseFrame::error_with_message(e.code(), e.to_string()),
    }
}

#[derive(Deserialize)]
struct SubmitReviewRequest {
    name: String,
    rating: u8,
    comment: String,
}

async fn submit_review(core: &Arc<Core>, session: &Session, data: Value) -> ResponseFrame {
    let player = match session.require_login() {
        Ok(name) => name.to_string(),
        Err(code) => return ResponseFrame::error(code),
    };
    let Ok(req) = serde_json::from_value::<SubmitReviewRequest>(data) else {
        return ResponseFrame::error(ErrorCode::RatingOutOfRange);
    };
    match core.catalog.submit_review(&player, &req.name, req.rating, req.comment).await {
        Ok(()) => ResponseFrame::ok(),
        Err(e) => ResponseFrame::error_with_message(e.code(), e.to_string()),
    }
}

async fn get_reviews(core: &Arc<Core>, data: Value) -> ResponseFrame {
    let Ok(req) = serde_json::from_value::<GameNameRequest>(data) else {
        return ResponseFrame::error(ErrorCode::GameNotFound);
    };
    match core.catalog.get_reviews(&req.name).await {
        Ok((reviews, average_rating, review_count)) => ResponseFrame::ok_with(serde_json::json!({
            "reviews": reviews,
            "average_rating": average_rating,
            "review_count": review_count,
        })),
        Err(e) => ResponseFrame::error_with_message(e.code(), e.to_string()),
    }
}

#[derive(Deserialize)]
struct CreateRoomRequest {
    game_name: String,
    version: String,
}

async fn create_room(core: &Arc<Core>, session: &mut Session, data: Value) -> ResponseFrame {
    let player = match session.require_login() {
        Ok(name) => name.to_string(),
        Err(code) => return ResponseFrame::error(code),
    };
    let Ok(req) = serde_json::from_value::<CreateRoomRequest>(data) else {
        return ResponseFrame::error(ErrorCode::GameNotFound);
    };
    let Ok(version) = req.version.parse::<Version>() else {
        return ResponseFrame::error(ErrorCode::VersionMismatch);
    };
    match core.rooms.create(&player, &req.game_name, version).await {
        Ok(summary) => {
            core.metrics.increment_rooms_created();
            session.room_id = Some(summary.id.clone());
            core.presence.set_room(&player, Some(summary.id.clone()));
            ResponseFrame::ok_with(summary)
        }
        Err(e) => ResponseFrame::error_with_message(e.code(), e.to_string()),
    }
}

async fn list_rooms(core: &Arc<Core>) -> ResponseFrame {
    ResponseFrame::ok_with(core.rooms.list().await)
}

#[derive(Deserialize)]
struct JoinRoomRequest {
    room_id: String,
    version: String,
}

async fn join_room(core: &Arc<Core>, session: &mut Session, data: Value) -> ResponseFrame {
    let player = match session.require_login() {
        Ok(name) => name.to_string(),
        Err(code) => return ResponseFrame::error(code),
    };
    let Ok(req) = serde_json::from_value::<JoinRoomRequest>(data) else {
        return ResponseFrame::error(ErrorCode::RoomNotFound);
    };
    let Ok(version) = req.version.parse::<Version>() else {
        return ResponseFrame::error(ErrorCode::VersionMismatch);
    };
    match core.rooms.join(&req.room_id, &player, version).await {
        Ok(summary) => {
            session.room_id = Some(summary.id.clone());
            core.presence.set_room(&player, Some(summary.id.clone()));
            ResponseFrame::ok_with(summary)
        }
        Err(e) => ResponseFrame::error_with_message(e.code(), e.to_string()),
    }
}

async fn leave_room(core: &Arc<Core>, session: &mut Session) -> ResponseFrame {
    let player = match session.require_login() {
        Ok(name) => name.to_string(),
        Err(code) => return ResponseFrame::error(code),
    };
    let Some(room_id) = session.room_id.take() else {
        return ResponseFrame::error(ErrorCode::NotMember);
    };
    match core.rooms.leave(&room_id, &player).await {
        Ok(()) => {
            core.presence.set_room(&player, None);
            ResponseFrame::ok()
        }
        Err(e) => {
            session.room_id = Some(room_id);
            ResponseFrame::error_with_message(e.code(), e.to_string())
        }
    }
}

async fn get_room_status(core: &Arc<Core>, session: &Session, data: Value) -> ResponseFrame {
    let player = match session.require_login() {
        Ok(name) => name.to_string(),
        Err(code) => return ResponseFrame::error(code),
    };
    let room_id = match resolve_room_id(session, data) {
        Ok(id) => id,
        Err(code) => return ResponseFrame::error(code),
    };
    match core.rooms.get(&room_id, &player).await {
        Ok(status) => ResponseFrame::ok_with(status),
        Err(e) => ResponseFrame::error_with_message(e.code(), e.to_string()),
    }
}

#[derive(Deserialize)]
struct RoomIdRequest {
    #[serde(default)]
    room_id: Option<String>,
}

fn resolve_room_id(session: &Session, data: Value) -> Result<String, ErrorCode> {
    if let Ok(req) = serde_json::from_value::<RoomIdRequest>(data) {
        if let Some(room_id) = req.room_id {
            return Ok(room_id);
        }
    }
    session.room_id.clone().ok_or(ErrorCode::NotMember)
}

async fn start_game(core: &Arc<Core>, session: &Session) -> ResponseFrame {
    let player = match session.require_login() {
        Ok(name) => name.to_string(),
        Err(code) => return ResponseFrame::error(code),
    };
    let Some(room_id) = session.room_id.clone() else {
        return ResponseFrame::error(ErrorCode::NotMember);
    };
    match RoomRegistry::start_game(&core.rooms, &room_id, &player).await {
        Ok(summary) => {
            if let Ok(status) = core.rooms.get(&room_id, &player).await {
                if status.server_port.is_some() {
                    core.metrics.increment_game_servers_spawned();
                }
            }
            ResponseFrame::ok_with(summary)
        }
        Err(e) => {
            if matches!(e, crate::room::RoomError::SpawnFailed(_)) {
                core.metrics.increment_game_servers_spawn_failures();
            }
            ResponseFrame::error_with_message(e.code(), e.to_string())
        }
    }
}

async fn reset_room(core: &Arc<Core>, session: &Session) -> ResponseFrame {
    let player = match session.require_login() {
        Ok(name) => name.to_string(),
        Err(code) => return ResponseFrame::error(code),
    };
    let Some(room_id) = session.room_id.clone() else {
        return ResponseFrame::error(ErrorCode::NotMember);
    };
    match core.rooms.reset(&room_id, &player).await {
        Ok(summary) => ResponseFrame::ok_with(summary),
        Err(e) => ResponseFrame::error_with_message(e.code(), e.to_string()),
    }
}

async fn list_online_players(core: &Arc<Core>) -> ResponseFrame {
    ResponseFrame::ok_with(core.presence.list(&core.rooms).await)
}
