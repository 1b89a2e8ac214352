//! Launches, tracks, and reaps per-room game-server subprocesses.
//!
//! Ownership is deliberately one-directional: the supervisor never holds a
//! reference back to `RoomRegistry`. Each spawn hands the caller a
//! [`tokio::sync::oneshot::Receiver`] that fires once, with the process's
//! exit code, when the supervision task observes the child exit. The
//! registry is responsible for awaiting that receiver and reconciling its
//! own state — a message-passing handoff rather than a back-pointer
//! (spec §9).

pub mod error;

pub use error::SupervisorError;

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rand::RngExt;
use tokio::process::Command;
use tokio::sync::oneshot;

const PORT_RANGE: std::ops::RangeInclusive<u16> = 20000..=30000;
const SPAWN_GRACE_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct SpawnedHandle {
    pub handle_id: u64,
    pub pid: Option<u32>,
    pub port: u16,
}

/// Reported by the supervision task once the child process exits, for any
/// reason (normal, signal, crash).
#[derive(Debug, Clone, Copy)]
pub struct ExitReport {
    pub exit_code: Option<i32>,
}

pub struct Supervisor {
    log_dir: PathBuf,
    next_handle: AtomicU64,
}

impl Supervisor {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
            next_handle: AtomicU64::new(1),
        }
    }

    /// Substitutes `{port}` into `command_template` (appending ` <port>` if
    /// the literal isn't present), appends ` --players N`, execs it in a new
    /// process group with stdout/stderr redirected to a log file keyed by
    /// port, and waits out a short grace window to catch immediate exits.
    pub async fn spawn(
        &self,
        command_template: &str,
        work_dir: Option<&Path>,
        player_count: usize,
    ) -> Result<(SpawnedHandle, oneshot::Receiver<ExitReport>), SupervisorError> {
        let port = self.pick_port();
        let command_line = Self::build_command_line(command_template, port, player_count);

        tokio::fs::create_dir_all(&self.log_dir)
            .await
            .map_err(|e| SupervisorError::Spawn(e.to_string()))?;
        let log_path = self.log_dir.join(format!("{port}.log"));
        let stdout_log = std::fs::File::create(&log_path)
            .map_err(|e| SupervisorError::Spawn(e.to_string()))?;
        let stderr_log = stdout_log
            .try_clone()
            .map_err(|e| SupervisorError::Spawn(e.to_string()))?;

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&command_line)
            .stdout(Stdio::from(stdout_log))
            .stderr(Stdio::from(stderr_log))
            .kill_on_drop(false);
        if let Some(dir) = work_dir {
            cmd.current_dir(dir);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // New process group so `stop()` can terminate every child the
            // game server itself spawns.
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(|e| SupervisorError::Spawn(e.to_string()))?;
        let pid = child.id();

        match tokio::time::timeout(SPAWN_GRACE_WINDOW, child.wait()).await {
            Ok(Ok(_status)) => return Err(SupervisorError::ImmediateExit),
            Ok(Err(e)) => return Err(SupervisorError::Spawn(e.to_string())),
            Err(_elapsed) => {
                // Still running past the grace window; hand off to supervision.
            }
        }

        let handle_id = self.next_handle.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let status = child.wait().await;
            let exit_code = status.ok().and_then(|s| s.code());
            let _ = tx.send(ExitReport { exit_code });
        });

        Ok((SpawnedHandle { handle_id, pid, port }, rx))
    }

    /// Fire-and-forget: signal the process group to terminate. Reap happens
    /// asynchronously in the supervision task started by `spawn`.
    pub async fn stop(&self, pid: u32) {
        let _ = Command::new("kill")
            .arg("-TERM")
            .arg(format!("-{pid}"))
            .kill_on_drop(false)
            .status()
            .await;
    }

    fn pick_port(&self) -> u16 {
        rand::rng().random_range(PORT_RANGE)
    }

    fn build_command_line(template: &str, port: u16, player_count: usize) -> String {
        let with_port = if template.contains("{port}") {
            template.replace("{port}", &port.to_string())
        } else {
            format!("{template} {port}")
        };
        format!("{with_port} --players {player_count}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_port_when_placeholder_absent() {
        let line = Supervisor::build_command_line("py server.py", 20123, 3);
        assert_eq!(line, "py server.py 20123 --players 3");
    }

    #[test]
    fn substitutes_port_placeholder() {
        let line = Supervisor::build_command_line("py server.py --port {port}", 20123, 2);
        assert_eq!(line, "py server.py --port 20123 --players 2");
    }

    #[tokio::test]
    async fn immediate_exit_is_reported_as_spawn_failure() {
        let dir = tempfile::tempdir().unwrap();
        let supervisor = Supervisor::new(dir.path());
        let err = supervisor.spawn("true", None, 2).await.unwrap_err();
        assert!(matches!(err, SupervisorError::ImmediateExit));
    }

    #[tokio::test]
    async fn long_running_process_is_handed_to_supervision() {
        let dir = tempfile::tempdir().unwrap();
        let supervisor = Supervisor::new(dir.path());
        let (handle, rx) = supervisor.spawn("sleep 1", None, 2).await.unwrap();
        assert!(handle.pid.is_some());
        assert!(PORT_RANGE.contains(&handle.port));
        supervisor.stop(handle.pid.unwrap()).await;
        let report = rx.await.unwrap();
        assert!(report.exit_code.is_some() || report.exit_code.is_none());
    }
}
