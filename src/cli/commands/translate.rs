use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::audio::{CommandPlayer, FileDownloader, Pronouncer, Silent};
use crate::config::Settings;
use crate::output::TerminalOutputer;
use crate::pipeline::{Pipeline, PipelineOptions};
use crate::translation::{ClientConfig, Endpoints, LeoClient};
use crate::ui::Spinner;

/// Signs in, then translates every word in `settings`, printing results
/// as they arrive.
///
/// Cancellation ends the run early but is not an error.
pub async fn run_translate(settings: Settings, cancel: CancellationToken) -> Result<()> {
    let client = connect(&settings, &cancel).await?;
    let player = player_command(&settings);

    let pronouncer: Arc<dyn Pronouncer> = match &player {
        Some(command) => Arc::new(
            CommandPlayer::new(command, cancel.clone())?
                .with_shutdown_timeout(settings.player_shutdown_timeout),
        ),
        None => Arc::new(Silent),
    };
    let downloader = FileDownloader::new().context("Failed to create audio downloader")?;

    let options = PipelineOptions {
        sound: player.is_some(),
        download: settings.download,
        add: settings.add,
        custom_translations: settings.translations.clone(),
        workers: settings.workers,
        reverse_translate: settings.reverse_translate,
    };
    debug!(?options, "starting pipeline");

    let pipeline = Pipeline::new(
        Arc::new(client),
        Arc::new(downloader),
        pronouncer,
        Arc::new(TerminalOutputer::stdout()),
        options,
    );
    pipeline.run(settings.words, &cancel).await;

    if cancel.is_cancelled() {
        debug!("run interrupted");
    }
    Ok(())
}

async fn connect(settings: &Settings, cancel: &CancellationToken) -> Result<LeoClient> {
    let mut config = ClientConfig::new(&settings.email, &settings.password);
    config.retry = settings.retry;
    config.request_timeout = settings.request_timeout;
    config.max_redirects = settings.max_redirects;
    if let Some(base) = &settings.api_url {
        config.endpoints = Endpoints::with_base(base);
    }

    let spinner = Spinner::new("Signing in...");
    let client = LeoClient::connect(config, cancel.clone()).await;
    spinner.stop();

    client.with_context(|| format!("Failed to sign in as {}", settings.email))
}

/// The player command to use, or `None` when sound is off or cannot work.
fn player_command(settings: &Settings) -> Option<String> {
    if !settings.sound {
        return None;
    }
    let Some(command) = settings.player.as_deref().filter(|p| !p.trim().is_empty()) else {
        warn!("player parameter not set, sound disabled");
        return None;
    };
    if !CommandPlayer::is_available(command) {
        warn!(player = %command, "player executable not available, sound disabled");
        return None;
    }
    Some(command.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::request::RetryPolicy;
    use std::time::Duration;

    fn settings() -> Settings {
        Settings {
            email: "user@example.com".into(),
            password: "secret".into(),
            player: None,
            log_level: "info".into(),
            api_url: None,
            sound: false,
            download: false,
            add: false,
            debug: false,
            reverse_translate: false,
            workers: 0,
            max_redirects: 10,
            request_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            player_shutdown_timeout: Duration::from_secs(2),
            words: vec!["house".into()],
            translations: Vec::new(),
        }
    }

    #[test]
    fn test_player_disabled_without_sound() {
        let settings = Settings {
            player: Some("sh".into()),
            ..settings()
        };
        assert_eq!(player_command(&settings), None);
    }

    #[test]
    fn test_player_missing_disables_sound() {
        let settings = Settings {
            sound: true,
            player: Some("  ".into()),
            ..settings()
        };
        assert_eq!(player_command(&settings), None);
    }

    #[test]
    fn test_player_unavailable_disables_sound() {
        let settings = Settings {
            sound: true,
            player: Some("leo-no-such-player-xyz --quiet".into()),
            ..settings()
        };
        assert_eq!(player_command(&settings), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_player_available() {
        let settings = Settings {
            sound: true,
            player: Some("sh -c".into()),
            ..settings()
        };
        assert_eq!(player_command(&settings).as_deref(), Some("sh -c"));
    }
}
