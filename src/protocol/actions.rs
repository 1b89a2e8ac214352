use std::str::FromStr;

/// Closed set of actions a developer connection may invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeveloperAction {
    Register,
    Login,
    UploadGame,
    UpdateGame,
    RemoveGame,
    ListMyGames,
}

impl FromStr for DeveloperAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "register" => Self::Register,
            "login" => Self::Login,
            "upload_game" => Self::UploadGame,
            "update_game" => Self::UpdateGame,
            "remove_game" => Self::RemoveGame,
            "list_my_games" => Self::ListMyGames,
            _ => return Err(()),
        })
    }
}

/// Closed set of actions a player connection may invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerAction {
    Register,
    Login,
    ListGames,
    GetGameInfo,
    DownloadGame,
    SubmitReview,
    GetReviews,
    CreateRoom,
    ListRooms,
    JoinRoom,
    LeaveRoom,
    GetRoomStatus,
    StartGame,
    ResetRoom,
    ListOnlinePlayers,
}

impl FromStr for PlayerAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "register" => Self::Register,
            "login" => Self::Login,
            "list_games" => Self::ListGames,
            "get_game_info" => Self::GetGameInfo,
            "download_game" => Self::DownloadGame,
            "submit_review" => Self::SubmitReview,
            "get_reviews" => Self::GetReviews,
            "create_room" => Self::CreateRoom,
            "list_rooms" => Self::ListRooms,
            "join_room" => Self::JoinRoom,
            "leave_room" => Self::LeaveRoom,
            "get_room_status" => Self::GetRoomStatus,
            "start_game" => Self::StartGame,
            "reset_room" => Self::ResetRoom,
            "list_online_players" => Self::ListOnlinePlayers,
            _ => return Err(()),
        })
    }
}

/// True if `action` names a developer action (used by the player endpoint's
/// defense-in-depth "wrong port" guard, and vice versa).
pub fn is_developer_action(action: &str) -> bool {
    DeveloperAction::from_str(action).is_ok()
}

pub fn is_player_action(action: &str) -> bool {
    PlayerAction::from_str(action).is_ok()
}
