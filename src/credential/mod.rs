//! Stub client to the external credential store. Connects lazily per call
//! (no persistent connection is held between RPCs, mirroring the source
//! system's plain `socket.create_connection` per request) and never retains
//! a password past the single RPC that carries it.

pub mod error;

pub use error::CredentialError;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::metrics::ServerMetrics;
use crate::retry::{RetryConfig, RetryExecutor};
use crate::transport::{FrameError, FramedTransport};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    Developer,
    Player,
}

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
enum CredentialRequest<'a> {
    CreatePrincipal { kind: PrincipalKind, name: &'a str, password: &'a str },
    VerifyCredentials { kind: PrincipalKind, name: &'a str, password: &'a str },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum CredentialResponse {
    Ok,
    Exists,
    NotFound,
    WrongPassword,
}

pub struct CredentialClient {
    addr: SocketAddr,
    connect_timeout: Duration,
    retry: RetryExecutor,
}

impl CredentialClient {
    pub fn new(credential_port: u16, connect_timeout: Duration, max_attempts: u32) -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], credential_port)),
            connect_timeout,
            retry: RetryExecutor::new(RetryConfig::for_credential_client(max_attempts, connect_timeout)),
        }
    }

    pub fn with_metrics(
        credential_port: u16,
        connect_timeout: Duration,
        max_attempts: u32,
        metrics: Arc<ServerMetrics>,
    ) -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], credential_port)),
            connect_timeout,
            retry: RetryExecutor::with_metrics(
                RetryConfig::for_credential_client(max_attempts, connect_timeout),
                metrics,
            ),
        }
    }

    pub async fn create_principal(
        &self,
        kind: PrincipalKind,
        name: &str,
        password: &str,
    ) -> Result<(), CredentialError> {
        let request = CredentialRequest::CreatePrincipal { kind, name, password };
        match self.call(&request).await? {
            CredentialResponse::Ok => Ok(()),
            CredentialResponse::Exists => Err(CredentialError::Exists),
            other => Err(CredentialError::Transport(format!(
                "unexpected response to createPrincipal: {other:?}"
            ))),
        }
    }

    pub async fn verify_credentials(
        &self,
        kind: PrincipalKind,
        name: &str,
        password: &str,
    ) -> Result<(), CredentialError> {
        let request = CredentialRequest::VerifyCredentials { kind, name, password };
        match self.call(&request).await? {
            CredentialResponse::Ok => Ok(()),
            CredentialResponse::NotFound => Err(CredentialError::NotFound),
            CredentialResponse::WrongPassword => Err(CredentialError::WrongPassword),
            other => Err(CredentialError::Transport(format!(
                "unexpected response to verifyCredentials: {other:?}"
            ))),
        }
    }

    async fn call(&self, request: &CredentialRequest<'_>) -> Result<CredentialResponse, CredentialError> {
        let addr = self.addr;
        let connect_timeout = self.connect_timeout;

        self.retry
            .execute(
                "credential_store_rpc",
                || async {
                    let stream = timeout(connect_timeout, TcpStream::connect(addr))
                        .await
                        .map_err(|_| CredentialError::Transport("connect timed out".into()))?
                        .map_err(|e| CredentialError::Transport(e.to_string()))?;

                    let mut transport = FramedTransport::new(stream);
                    transport
                        .writer
                        .write_json(request)
                        .await
                        .map_err(frame_error_to_credential_error)?;
                    transport
                        .reader
                        .read_json::<CredentialResponse>()
                        .await
                        .map_err(frame_error_to_credential_error)
                },
                is_retryable,
            )
            .await
    }
}

fn frame_error_to_credential_error(err: FrameError) -> CredentialError {
    CredentialError::Transport(err.to_string())
}

fn is_retryable(err: &CredentialError) -> bool {
    matches!(err, CredentialError::Transport(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn fake_store(expected_ok: bool) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut len_buf = [0u8; 4];
                if stream.read_exact(&mut len_buf).await.is_err() {
                    return;
                }
                let len = u32::from_be_bytes(len_buf) as usize;
                let mut payload = vec![0u8; len];
                let _ = stream.read_exact(&mut payload).await;

                let body = if expected_ok {
                    br#"{"status":"ok"}"#.to_vec()
                } else {
                    br#"{"status":"wrong_password"}"#.to_vec()
                };
                let mut out = (body.len() as u32).to_be_bytes().to_vec();
                out.extend_from_slice(&body);
                let _ = stream.write_all(&out).await;
            }
        });
        port
    }

    #[tokio::test]
    async fn verify_credentials_ok_round_trips() {
        let port = fake_store(true).await;
        let client = CredentialClient::new(port, Duration::from_millis(500), 3);
        let result = client.verify_credentials(PrincipalKind::Player, "bob", "hunter2").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn verify_credentials_wrong_password_is_not_retried_as_transport_error() {
        let port = fake_store(false).await;
        let client = CredentialClient::new(port, Duration::from_millis(500), 3);
        let result = client.verify_credentials(PrincipalKind::Player, "bob", "wrong").await;
        assert!(matches!(result, Err(CredentialError::WrongPassword)));
    }

    #[tokio::test]
    async fn connect_failure_surfaces_as_transport_error() {
        let client = CredentialClient::new(1, Duration::from_millis(100), 2);
        let result = client.create_principal(PrincipalKind::Developer, "alice", "pw").await;
        assert!(matches!(result, Err(CredentialError::Transport(_))));
    }
}
