//! Developer connection role: register/login, game publishing lifecycle.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;

use crate::catalog::{GameConfig, GameKind};
use crate::credential::{CredentialError, PrincipalKind};
use crate::protocol::{
    is_player_action, ClientType, DeveloperAction, ErrorCode, ResponseFrame, Version,
};

use super::{Core, EndpointRole, Session};

pub struct DeveloperRole;

#[async_trait::async_trait]
impl EndpointRole for DeveloperRole {
    type Action = DeveloperAction;

    fn client_type() -> ClientType {
        ClientType::Developer
    }

    fn parse_action(name: &str) -> Option<Self::Action> {
        name.parse().ok()
    }

    fn is_foreign_action(name: &str) -> bool {
        is_player_action(name)
    }

    fn read_deadline(_core: &Core) -> Option<std::time::Duration> {
        None
    }

    async fn dispatch(core: &Arc<Core>, session: &mut Session, action: Self::Action, data: Value) -> ResponseFrame {
        match action {
            DeveloperAction::Register => register(core, data).await,
            DeveloperAction::Login => login(core, session, data).await,
            DeveloperAction::UploadGame => upload_game(core, session, data).await,
            DeveloperAction::UpdateGame => update_game(core, session, data).await,
            DeveloperAction::RemoveGame => remove_game(core, session, data).await,
            DeveloperAction::ListMyGames => list_my_games(core, session).await,
        }
    }

    async fn teardown(_core: &Arc<Core>, _session: &Session) {
        // Developer sessions own no room membership or presence entry.
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
    match core.credentials.create_principal(PrincipalKind::Developer, &creds.name, &creds.password).await {
        Ok(()) => ResponseFrame::ok(),
        Err(e) => credential_error_response(e),
    }
}

async fn login(core: &Arc<Core>, session: &mut Session, data: Value) -> ResponseFrame {
    let Ok(creds) = serde_json::from_value::<Credentials>(data) else {
        return ResponseFrame::error(ErrorCode::MissingCredentials);
    };
    match core.credentials.verify_credentials(PrincipalKind::Developer, &creds.name, &creds.password).await {
        Ok(()) => {
            session.principal = Some(creds.name);
            ResponseFrame::ok()
        }
        Err(e) => credential_error_response(e),
    }
}

fn credential_error_response(err: CredentialError) -> ResponseFrame {
    ResponseFrame::error_with_message(err.code(), err.to_string())
}

#[derive(Deserialize)]
struct UploadGameRequest {
    name: String,
    kind: GameKind,
    description: String,
    max_players: u8,
    version: String,
    bundle_base64: String,
    config: GameConfig,
}

async fn upload_game(core: &Arc<Core>, session: &Session, data: Value) -> ResponseFrame {
    let developer = match session.require_login() {
        Ok(name) => name.to_string(),
        Err(code) => return ResponseFrame::error(code),
    };
    let Ok(req) = serde_json::from_value::<UploadGameRequest>(data) else {
        return ResponseFrame::error(ErrorCode::ConfigInvalid);
    };
    let Ok(version) = req.version.parse::<Version>() else {
        return ResponseFrame::error(ErrorCode::ConfigInvalid);
    };
    let Ok(bundle) = BASE64.decode(&req.bundle_base64) else {
        return ResponseFrame::error(ErrorCode::ConfigInvalid);
    };

    match core
        .catalog
        .upload(&developer, &req.name, req.kind, req.description, req.max_players, version, bundle, req.config)
        .await
    {
        Ok(()) => {
            core.metrics.increment_games_uploaded();
            ResponseFrame::ok()
        }
        Err(e) => ResponseFrame::error_with_message(e.code(), e.to_string()),
    }
}

#[derive(Deserialize)]
struct UpdateGameRequest {
    name: String,
    version: String,
    bundle_base64: String,
    #[serde(default)]
    notes: Option<String>,
}

async fn update_game(core: &Arc<Core>, session: &Session, data: Value) -> ResponseFrame {
    let developer = match session.require_login() {
        Ok(name) => name.to_string(),
        Err(code) => return ResponseFrame::error(code),
    };
    let Ok(req) = serde_json::from_value::<UpdateGameRequest>(data) else {
        return ResponseFrame::error(ErrorCode::ConfigInvalid);
    };
    let Ok(version) = req.version.parse::<Version>() else {
        return ResponseFrame::error(ErrorCode::ConfigInvalid);
    };
    let Ok(bundle) = BASE64.decode(&req.bundle_base64) else {
        return ResponseFrame::error(ErrorCode::ConfigInvalid);
    };

    match core.catalog.update(&developer, &req.name, version, bundle, req.notes).await {
        Ok(()) => {
            let destroyed = core.rooms.cascade_drop_by_game(&req.name).await;
            ResponseFrame::ok_with(serde_json::json!({ "destroyed_rooms": destroyed }))
        }
        Err(e) => ResponseFrame::error_with_message(e.code(), e.to_string()),
    }
}

#[derive(Deserialize)]
struct RemoveGameRequest {
    name: String,
}

async fn remove_game(core: &Arc<Core>, session: &Session, data: Value) -> ResponseFrame {
    let developer = match session.require_login() {
        Ok(name) => name.to_string(),
        Err(code) => return ResponseFrame::error(code),
    };
    let Ok(req) = serde_json::from_value::<RemoveGameRequest>(data) else {
        return ResponseFrame::error(ErrorCode::ConfigInvalid);
    };

    match core.catalog.remove(&developer, &req.name).await {
        Ok(()) => {
            let destroyed = core.rooms.cascade_drop_by_game(&req.name).await;
            ResponseFrame::ok_with(serde_json::json!({ "destroyed_rooms": destroyed }))
        }
        Err(e) => ResponseFrame::error_with_message(e.code(), e.to_string()),
    }
}

async fn list_my_games(core: &Arc<Core>, session: &Session) -> ResponseFrame {
    let developer = match session.require_login() {
        Ok(name) => name.to_string(),
        Err(code) => return ResponseFrame::error(code),
    };
    let games = core.catalog.list_by_developer(&developer).await;
    ResponseFrame::ok_with(games)
}
