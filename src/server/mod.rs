//! Shared application state and per-connection endpoint drivers.
//!
//! Both `DeveloperEndpoint` and `PlayerEndpoint` are thin routers over the
//! same [`Core`]: a handshake, a request loop, and cascading cleanup on
//! disconnect. They never hold a lock across the other's suspension points
//! (spec §5's lock order is enforced entirely inside Catalog/RoomRegistry/
//! PresenceTable themselves).

pub mod bootstrap;
pub mod developer;
pub mod player;

pub use bootstrap::{bootstrap, BootstrapHandles};

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::timeout;
use tracing::debug;

use crate::catalog::Catalog;
use crate::credential::CredentialClient;
use crate::metrics::ServerMetrics;
use crate::presence::PresenceTable;
use crate::protocol::{ClientType, ErrorCode, HandshakeRequest, HandshakeResponse, RequestFrame, ResponseFrame, ServerType};
use crate::room::RoomRegistry;
use crate::supervisor::Supervisor;
use crate::transport::{FrameError, FramedTransport};

/// Everything a connection handler needs, bundled once at startup and
/// shared via `Arc<Core>` — per spec §9 "Global mutable state" there is no
/// ambient global, only this one handed-down reference.
pub struct Core {
    pub catalog: Arc<Catalog>,
    pub rooms: Arc<RoomRegistry>,
    pub presence: Arc<PresenceTable>,
    pub supervisor: Arc<Supervisor>,
    pub credentials: Arc<CredentialClient>,
    pub metrics: Arc<ServerMetrics>,
    pub player_read_deadline: Duration,
}

impl Core {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<Catalog>,
        rooms: Arc<RoomRegistry>,
        presence: Arc<PresenceTable>,
        supervisor: Arc<Supervisor>,
        credentials: Arc<CredentialClient>,
        metrics: Arc<ServerMetrics>,
        player_read_deadline: Duration,
    ) -> Self {
        Self { catalog, rooms, presence, supervisor, credentials, metrics, player_read_deadline }
    }
}

/// Per-connection state threaded through one endpoint's request loop.
#[derive(Default)]
pub struct Session {
    /// Name bound at `login`, for whichever principal kind this role serves.
    pub principal: Option<String>,
    /// Room the player currently belongs to, if any. Unused by the
    /// developer role.
    pub room_id: Option<String>,
}

impl Session {
    pub fn require_login(&self) -> Result<&str, ErrorCode> {
        self.principal.as_deref().ok_or(ErrorCode::NotLoggedIn)
    }
}

/// Parameterises the shared connection driver over the role-specific action
/// enumeration, so the handshake/loop/teardown machinery below is written
/// once (spec §9 "Dynamic action dispatch").
#[async_trait::async_trait]
pub trait EndpointRole {
    type Action: Copy + Send;

    fn client_type() -> ClientType;
    fn server_type() -> ServerType {
        ServerType::from(Self::client_type())
    }
    fn parse_action(name: &str) -> Option<Self::Action>;
    fn is_foreign_action(name: &str) -> bool;
    fn read_deadline(core: &Core) -> Option<Duration>;

    async fn dispatch(core: &Arc<Core>, session: &mut Session, action: Self::Action, data: Value) -> ResponseFrame;

    /// Cascading cleanup on disconnect: leave any room, drop presence.
    async fn teardown(core: &Arc<Core>, session: &Session);
}

/// Handshake, request loop, and teardown for one accepted connection,
/// shared between `DeveloperEndpoint` and `PlayerEndpoint`.
pub async fn run_connection<R: EndpointRole>(mut transport: FramedTransport, core: Arc<Core>, peer: String) {
    let handshake: HandshakeRequest = match transport.reader.read_json().await {
        Ok(h) => h,
        Err(e) => {
            debug!(%peer, error = %e, "handshake read failed");
            return;
        }
    };

    if handshake.client_type != R::client_type() {
        let _ = transport
            .writer
            .write_json(&HandshakeResponse::Error {
                message: "this connection's role does not match the requested client type".into(),
            })
            .await;
        return;
    }

    if transport
        .writer
        .write_json(&HandshakeResponse::Success { server_type: R::server_type() })
        .await
        .is_err()
    {
        return;
    }

    let mut session = Session::default();

    loop {
        let read_result = match R::read_deadline(&core) {
            Some(deadline) => match timeout(deadline, transport.reader.read_json::<RequestFrame>()).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(%peer, "read deadline elapsed");
                    break;
                }
            },
            None => transport.reader.read_json::<RequestFrame>().await,
        };

        let request = match read_result {
            Ok(req) => req,
            Err(FrameError::Closed) => break,
            Err(e) => {
                debug!(%peer, error = %e, "connection closed on frame error");
                break;
            }
        };

        let response = if R::is_foreign_action(&request.action) {
            ResponseFrame::error(ErrorCode::WrongRole)
        } else {
            match R::parse_action(&request.action) {
                Some(action) => {
                    core.metrics.increment_rpc_requests();
                    let response = R::dispatch(&core, &mut session, action, request.data).await;
                    if matches!(response, ResponseFrame::Error { .. }) {
                        core.metrics.increment_rpc_errors();
                    }
                    response
                }
                None => ResponseFrame::error(ErrorCode::UnknownAction),
            }
        };

        if transport.writer.write_json(&response).await.is_err() {
            break;
        }
    }

    R::teardown(&core, &session).await;
}
