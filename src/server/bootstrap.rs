//! Process entry: construct the shared [`Core`], bind the two listeners,
//! and accept connections until shutdown.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::credential::CredentialClient;
use crate::metrics::ServerMetrics;
use crate::presence::PresenceTable;
use crate::room::RoomRegistry;
use crate::supervisor::Supervisor;

use super::{developer::DeveloperRole, player::PlayerRole, run_connection, Core};

/// 1 s accept poll so listeners can observe shutdown promptly (spec §5).
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct BootstrapHandles {
    pub dev_port: u16,
    pub lobby_port: u16,
    pub core: Arc<Core>,
}

/// Starts both listeners against `config`/`credential_port`, returning once
/// both are bound and their port-discovery files are written. The returned
/// future resolves only on a fatal accept error; callers typically
/// `tokio::spawn` it and hold the `BootstrapHandles` for introspection.
pub async fn bootstrap(
    config: &Config,
    credential_port: u16,
) -> anyhow::Result<(BootstrapHandles, impl std::future::Future<Output = ()>)> {
    let data_dir = PathBuf::from(&config.data_dir);
    tokio::fs::create_dir_all(&data_dir).await.ok();

    let catalog = Arc::new(Catalog::load(&data_dir).await);
    catalog.reconcile_aggregates().await.ok();

    let supervisor = Arc::new(Supervisor::new(data_dir.join("game_server_logs")));
    let metrics = Arc::new(ServerMetrics::new());
    let rooms = Arc::new(RoomRegistry::new(Arc::clone(&catalog), Arc::clone(&supervisor), Arc::clone(&metrics)));
    let presence = Arc::new(PresenceTable::new());

    let credentials = Arc::new(CredentialClient::with_metrics(
        credential_port,
        Duration::from_millis(config.credential.connect_timeout_ms),
        config.credential.max_attempts,
        Arc::clone(&metrics),
    ));

    let core = Arc::new(Core::new(
        catalog,
        rooms,
        presence,
        supervisor,
        credentials,
        metrics,
        Duration::from_secs(config.player_read_deadline_secs),
    ));

    let dev_listener = TcpListener::bind("127.0.0.1:0").await?;
    let lobby_listener = TcpListener::bind("127.0.0.1:0").await?;
    let dev_port = dev_listener.local_addr()?.port();
    let lobby_port = lobby_listener.local_addr()?.port();

    write_port_file(&data_dir.join(".dev_port"), dev_port).await?;
    write_port_file(&data_dir.join(".lobby_port"), lobby_port).await?;

    info!(dev_port, lobby_port, credential_port, "listening");
    println!("dev_port={dev_port}");
    println!("lobby_port={lobby_port}");

    let dev_core = Arc::clone(&core);
    let lobby_core = Arc::clone(&core);

    let accept_loop = async move {
        tokio::join!(
            accept_forever::<DeveloperRole>(dev_listener, dev_core, "developer"),
            accept_forever::<PlayerRole>(lobby_listener, lobby_core, "player"),
        );
    };

    Ok((BootstrapHandles { dev_port, lobby_port, core }, accept_loop))
}

async fn accept_forever<R>(listener: TcpListener, core: Arc<Core>, role_name: &'static str)
where
    R: super::EndpointRole + Send + Sync + 'static,
{
    loop {
        match tokio::time::timeout(ACCEPT_POLL_INTERVAL, listener.accept()).await {
            Ok(Ok((stream, addr))) => {
                if role_name == "developer" {
                    core.metrics.increment_developer_connections();
                } else {
                    core.metrics.increment_player_connections();
                }
                let core = Arc::clone(&core);
                let transport = crate::transport::FramedTransport::new(stream);
                tokio::spawn(run_connection::<R>(transport, core, addr.to_string()));
            }
            Ok(Err(e)) => {
                warn!(role = role_name, error = %e, "accept failed");
            }
            Err(_) => {
                // Poll elapsed with nothing to accept; loop to re-check
                // for shutdown (there is none yet, but this keeps the
                // listener from blocking indefinitely).
            }
        }
    }
}

async fn write_port_file(path: &Path, port: u16) -> std::io::Result<()> {
    crate::catalog::persistence::write_atomic(path, port.to_string().as_bytes()).await
}
