use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::Pronouncer;

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("player command is empty")]
    EmptyCommand,

    #[error("cannot start player '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("player '{program}' exited with {status}")]
    Failed { program: String, status: ExitStatus },

    #[error("playback cancelled")]
    Cancelled,

    #[error("player error: {0}")]
    Io(#[from] std::io::Error),
}

/// How long a cancelled player gets to exit after SIGTERM before it is killed.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Runs an external command such as `mpg123 -q` with the target appended.
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
    cancel: CancellationToken,
    shutdown_timeout: Duration,
}

impl CommandPlayer {
    /// `command` is split on whitespace into program and leading arguments.
    pub fn new(command: &str, cancel: CancellationToken) -> Result<Self, PlayerError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(PlayerError::EmptyCommand)?;
        Ok(Self {
            program,
            args: parts.collect(),
            cancel,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        })
    }

    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// True if the command's program resolves on `PATH`.
    pub fn is_available(command: &str) -> bool {
        command
            .split_whitespace()
            .next()
            .is_some_and(|program| which::which(program).is_ok())
    }
}

impl CommandPlayer {
    /// Sends SIGTERM and waits up to the shutdown timeout, then kills.
    async fn stop(&self, child: &mut Child) -> Result<(), PlayerError> {
        if !terminate(child) {
            return Ok(child.kill().await?);
        }
        match tokio::time::timeout(self.shutdown_timeout, child.wait()).await {
            Ok(status) => {
                let status = status?;
                debug!(program = %self.program, %status, "player stopped");
                Ok(())
            }
            Err(_) => {
                warn!(
                    program = %self.program,
                    timeout = %humantime::format_duration(self.shutdown_timeout),
                    "player ignored SIGTERM, killing"
                );
                Ok(child.kill().await?)
            }
        }
    }
}

/// Asks the child to exit. False if no signal was sent.
#[cfg(unix)]
fn terminate(child: &Child) -> bool {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) else {
        return false;
    };
    match kill(Pid::from_raw(pid), Signal::SIGTERM) {
        Ok(()) => true,
        Err(err) => {
            debug!(pid, %err, "SIGTERM failed");
            false
        }
    }
}

#[cfg(not(unix))]
fn terminate(_child: &Child) -> bool {
    false
}

#[async_trait]
impl Pronouncer for CommandPlayer {
    /// Stops the player and returns [`PlayerError::Cancelled`] if the run is
    /// cancelled before playback finishes. See [`CommandPlayer::stop`].
    async fn play(&self, target: &str) -> Result<(), PlayerError> {
        if self.cancel.is_cancelled() {
            return Err(PlayerError::Cancelled);
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PlayerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        debug!(program = %self.program, target, "playing");

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                self.stop(&mut child).await?;
                Err(PlayerError::Cancelled)
            }
            status = child.wait() => {
                let status = status?;
                if status.success() {
                    Ok(())
                } else {
                    Err(PlayerError::Failed {
                        program: self.program.clone(),
                        status,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_splits_command() {
        let player = CommandPlayer::new("mpg123  -q --no-control", CancellationToken::new()).unwrap();
        assert_eq!(player.program(), "mpg123");
        assert_eq!(player.args, vec!["-q", "--no-control"]);
    }

    #[test]
    fn test_new_rejects_empty_command() {
        let err = CommandPlayer::new("   ", CancellationToken::new()).unwrap_err();
        assert!(matches!(err, PlayerError::EmptyCommand));
    }

    #[cfg(unix)]
    #[test]
    fn test_is_available() {
        assert!(CommandPlayer::is_available("sh -c true"));
        assert!(!CommandPlayer::is_available("leo-player-that-does-not-exist"));
        assert!(!CommandPlayer::is_available(""));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_play_success() {
        let player = CommandPlayer::new("true", CancellationToken::new()).unwrap();
        player.play("/tmp/whatever.mp3").await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_play_passes_target_as_last_argument() {
        let player = CommandPlayer::new("test -n", CancellationToken::new()).unwrap();
        player.play("target").await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_play_failure_reports_status() {
        let player = CommandPlayer::new("false", CancellationToken::new()).unwrap();
        let err = player.play("x").await.unwrap_err();
        assert!(matches!(err, PlayerError::Failed { ref program, .. } if program == "false"));
    }

    #[tokio::test]
    async fn test_play_missing_program() {
        let player =
            CommandPlayer::new("leo-player-that-does-not-exist", CancellationToken::new()).unwrap();
        let err = player.play("x").await.unwrap_err();
        assert!(matches!(err, PlayerError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_kills_player() {
        let cancel = CancellationToken::new();
        let player = CommandPlayer::new("sleep", cancel.clone()).unwrap();

        let task = tokio::spawn(async move { player.play("30").await });
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(PlayerError::Cancelled)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_lets_player_handle_sigterm() {
        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("terminated");
        let script = dir.path().join("player.sh");
        std::fs::write(
            &script,
            format!(
                "trap 'touch {}; exit 0' TERM\nsleep 30 &\nwait\n",
                marker.display()
            ),
        )
        .unwrap();

        let cancel = CancellationToken::new();
        let player = CommandPlayer::new(&format!("sh {}", script.display()), cancel.clone())
            .unwrap()
            .with_shutdown_timeout(Duration::from_secs(5));

        let task = tokio::spawn(async move { player.play("sound.mp3").await });
        tokio::time::sleep(Duration::from_millis(300)).await;
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(10), task)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(PlayerError::Cancelled)));
        assert!(marker.exists(), "player did not get SIGTERM");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_kills_player_ignoring_sigterm() {
        let cancel = CancellationToken::new();
        let player = CommandPlayer::new("sh -c", cancel.clone())
            .unwrap()
            .with_shutdown_timeout(Duration::from_millis(200));

        let task = tokio::spawn(async move {
            player
                .play("trap '' TERM; while true; do sleep 1; done")
                .await
        });
        tokio::time::sleep(Duration::from_millis(300)).await;
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(PlayerError::Cancelled)));
    }

    #[test]
    fn test_default_shutdown_timeout() {
        let player = CommandPlayer::new("mpg123", CancellationToken::new()).unwrap();
        assert_eq!(player.shutdown_timeout, DEFAULT_SHUTDOWN_TIMEOUT);
        let player = player.with_shutdown_timeout(Duration::from_millis(1));
        assert_eq!(player.shutdown_timeout, Duration::from_millis(1));
    }

    #[tokio::test]
    async fn test_play_after_cancel_does_not_spawn() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let player = CommandPlayer::new("leo-player-that-does-not-exist", cancel).unwrap();
        let err = player.play("x").await.unwrap_err();
        assert!(matches!(err, PlayerError::Cancelled));
    }
}
