//! Shared test harness: an in-process fake credential store and a thin wire
//! client used to drive the real developer/player listeners end to end.

use std::collections::HashMap;
use std::sync::Arc;

use game_store_server::config::Config;
use game_store_server::protocol::{ClientType, HandshakeResponse};
use game_store_server::server::BootstrapHandles;
use game_store_server::transport::FramedTransport;
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

/// Starts a fake credential store backed by an in-memory map, returning the
/// port it's listening on. Understands the same `createPrincipal` /
/// `verifyCredentials` request shapes `CredentialClient` sends.
pub async fn spawn_fake_credential_store() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let principals: Arc<Mutex<HashMap<(String, String), String>>> =
        Arc::new(Mutex::new(HashMap::new()));

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else { return };
            let principals = Arc::clone(&principals);
            tokio::spawn(async move {
                let mut transport = FramedTransport::new(stream);
                loop {
                    let request: Value = match transport.reader.read_json().await {
                        Ok(v) => v,
                        Err(_) => return,
                    };
                    let response = handle_credential_request(&principals, request).await;
                    if transport.writer.write_json(&response).await.is_err() {
                        return;
                    }
                }
            });
        }
    });

    port
}

async fn handle_credential_request(
    principals: &Arc<Mutex<HashMap<(String, String), String>>>,
    request: Value,
) -> Value {
    let op = request["op"].as_str().unwrap_or_default();
    let kind = request["kind"].as_str().unwrap_or_default().to_string();
    let name = request["name"].as_str().unwrap_or_default().to_string();
    let password = request["password"].as_str().unwrap_or_default().to_string();
    let key = (kind, name);

    let mut store = principals.lock().await;
    match op {
        "createPrincipal" => {
            if store.contains_key(&key) {
                json!({ "status": "exists" })
            } else {
                store.insert(key, password);
                json!({ "status": "ok" })
            }
        }
        "verifyCredentials" => match store.get(&key) {
            None => json!({ "status": "not_found" }),
            Some(stored) if *stored == password => json!({ "status": "ok" }),
            Some(_) => json!({ "status": "wrong_password" }),
        },
        other => panic!("fake credential store received unknown op {other:?}"),
    }
}

pub struct TestServer {
    pub dev_port: u16,
    pub lobby_port: u16,
    // Keeps the tempdir alive for the server's data root for the test's duration.
    _data_dir: tempfile::TempDir,
}

/// Boots a real server instance (both listeners) against a fresh temp data
/// directory and a fake credential store, returning once both ports are bound.
pub async fn spawn_server() -> TestServer {
    spawn_server_with(|_| {}).await
}

/// Like [`spawn_server`] but lets the caller tweak the config before boot
/// (e.g. to shorten the player read deadline for a timeout test).
pub async fn spawn_server_with(configure: impl FnOnce(&mut Config)) -> TestServer {
    let data_dir = tempfile::tempdir().unwrap();
    let credential_port = spawn_fake_credential_store().await;

    let mut cfg = Config::default();
    cfg.data_dir = data_dir.path().to_string_lossy().into_owned();
    cfg.credential.connect_timeout_ms = 500;
    cfg.credential.max_attempts = 2;
    configure(&mut cfg);

    let (BootstrapHandles { dev_port, lobby_port, .. }, accept_loop) =
        game_store_server::server::bootstrap(&cfg, credential_port).await.unwrap();
    tokio::spawn(accept_loop);

    TestServer { dev_port, lobby_port, _data_dir: data_dir }
}

/// A connected, handshaken client over one role's listener.
pub struct Client {
    transport: FramedTransport,
}

impl Client {
    pub async fn connect(port: u16, client_type: ClientType) -> Self {
        let stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let transport = FramedTransport::new(stream);
        transport.writer.write_json(&json!({ "client_type": client_type })).await.unwrap();
        let mut client = Self { transport };
        let handshake: HandshakeResponse = client.transport.reader.read_json().await.unwrap();
        assert!(matches!(handshake, HandshakeResponse::Success { .. }), "{handshake:?}");
        client
    }

    pub async fn developer(port: u16) -> Self {
        Self::connect(port, ClientType::Developer).await
    }

    pub async fn player(port: u16) -> Self {
        Self::connect(port, ClientType::Player).await
    }

    pub async fn call(&mut self, action: &str, data: Value) -> Value {
        self.transport
            .writer
            .write_json(&json!({ "action": action, "data": data }))
            .await
            .unwrap();
        self.transport.reader.read_json().await.unwrap()
    }

    pub fn into_transport(self) -> FramedTransport {
        self.transport
    }
}

pub fn is_ok(response: &Value) -> bool {
    response["status"] == "success"
}

pub fn error_code(response: &Value) -> &str {
    response["code"].as_str().unwrap_or("")
}
