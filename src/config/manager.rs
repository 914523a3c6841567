use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::filter::LevelFilter;

use crate::audio::DEFAULT_SHUTDOWN_TIMEOUT;
use crate::paths;
use crate::request::{
    DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_INITIAL_WAIT, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_REDIRECTS,
    DEFAULT_MAX_WAIT, RetryPolicy,
};

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Contents of `config.toml`. Every key is optional.
///
/// ```toml
/// email = "user@example.com"
/// password = "secret"
/// sound = true
/// player = "mpg123 -q"
/// request_timeout = "10s"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub email: Option<String>,
    pub password: Option<String>,
    pub player: Option<String>,
    pub log_level: Option<String>,
    /// Base URL for all API endpoints.
    pub api_url: Option<String>,
    pub sound: bool,
    pub download: bool,
    pub add: bool,
    pub debug: bool,
    pub reverse_translate: bool,
    pub workers: Option<i64>,
    pub max_redirects: Option<usize>,
    pub retry_max_attempts: Option<u32>,
    /// Durations are humantime strings such as `500ms` or `10s`.
    pub request_timeout: Option<String>,
    pub retry_initial_wait: Option<String>,
    pub retry_max_wait: Option<String>,
    /// Grace period between SIGTERM and SIGKILL for a cancelled player.
    pub player_shutdown_timeout: Option<String>,
}

/// CLI-side values, taking precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub email: Option<String>,
    pub password: Option<String>,
    pub player: Option<String>,
    pub log_level: Option<String>,
    pub api_url: Option<String>,
    pub sound: bool,
    pub download: bool,
    pub add: bool,
    pub debug: bool,
    pub reverse_translate: bool,
    pub workers: Option<i64>,
    pub max_redirects: Option<usize>,
    pub retry_max_attempts: Option<u32>,
    pub request_timeout: Option<Duration>,
    pub retry_initial_wait: Option<Duration>,
    pub retry_max_wait: Option<Duration>,
    pub player_shutdown_timeout: Option<Duration>,
    pub words: Vec<String>,
    pub translations: Vec<String>,
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub email: String,
    pub password: String,
    pub player: Option<String>,
    pub log_level: String,
    pub api_url: Option<String>,
    pub sound: bool,
    pub download: bool,
    pub add: bool,
    pub debug: bool,
    pub reverse_translate: bool,
    /// Non-positive means the default.
    pub workers: i64,
    pub max_redirects: usize,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub player_shutdown_timeout: Duration,
    pub words: Vec<String>,
    pub translations: Vec<String>,
}

/// Merges CLI options over the config file and validates the result.
///
/// Strings and numbers from the CLI win when set; flags are enabled if
/// either side enables them; anything still unset takes the built-in
/// default. `debug` forces the `debug` log level.
pub fn resolve_settings(options: &ResolveOptions, file: &ConfigFile) -> Result<Settings> {
    let email = pick(&options.email, &file.email).ok_or_else(|| {
        anyhow::anyhow!(
            "Missing required configuration: 'email'\n\n\
             Please provide it via:\n  \
             - CLI option: leo --email <address>\n  \
             - Config file: ~/.config/leo/config.toml"
        )
    })?;
    validate_email(&email)?;

    let password = pick(&options.password, &file.password).ok_or_else(|| {
        anyhow::anyhow!(
            "Missing required configuration: 'password'\n\n\
             Please provide it via:\n  \
             - CLI option: leo --password <password>\n  \
             - Config file: ~/.config/leo/config.toml"
        )
    })?;

    if options.words.is_empty() {
        bail!("There are no words to translate");
    }
    if !options.translations.is_empty() && options.words.len() != 1 {
        bail!("Custom translation requires exactly one word");
    }

    let debug = options.debug || file.debug;
    let log_level = if debug {
        "debug".to_string()
    } else {
        pick(&options.log_level, &file.log_level).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
    };
    log_level
        .parse::<LevelFilter>()
        .map_err(|_| anyhow::anyhow!("Unknown log level: '{log_level}'"))?;

    let request_timeout = duration(
        options.request_timeout,
        file.request_timeout.as_deref(),
        "request_timeout",
        DEFAULT_ATTEMPT_TIMEOUT,
    )?;
    let retry = RetryPolicy {
        max_attempts: options
            .retry_max_attempts
            .or(file.retry_max_attempts)
            .unwrap_or(DEFAULT_MAX_ATTEMPTS),
        initial_wait: duration(
            options.retry_initial_wait,
            file.retry_initial_wait.as_deref(),
            "retry_initial_wait",
            DEFAULT_INITIAL_WAIT,
        )?,
        max_wait: duration(
            options.retry_max_wait,
            file.retry_max_wait.as_deref(),
            "retry_max_wait",
            DEFAULT_MAX_WAIT,
        )?,
    }
    .normalized();
    let player_shutdown_timeout = duration(
        options.player_shutdown_timeout,
        file.player_shutdown_timeout.as_deref(),
        "player_shutdown_timeout",
        DEFAULT_SHUTDOWN_TIMEOUT,
    )?;

    Ok(Settings {
        email,
        password,
        player: pick(&options.player, &file.player),
        log_level,
        api_url: pick(&options.api_url, &file.api_url),
        sound: options.sound || file.sound,
        download: options.download || file.download,
        add: options.add || file.add,
        debug,
        reverse_translate: options.reverse_translate || file.reverse_translate,
        workers: options.workers.or(file.workers).unwrap_or(0),
        max_redirects: options
            .max_redirects
            .or(file.max_redirects)
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_MAX_REDIRECTS),
        request_timeout,
        retry,
        player_shutdown_timeout,
        words: options.words.clone(),
        translations: options.translations.clone(),
    })
}

/// CLI value if set and non-empty, else the file value if non-empty.
fn pick(cli: &Option<String>, file: &Option<String>) -> Option<String> {
    cli.as_ref()
        .filter(|v| !v.is_empty())
        .or_else(|| file.as_ref().filter(|v| !v.is_empty()))
        .cloned()
}

fn duration(
    cli: Option<Duration>,
    file: Option<&str>,
    key: &str,
    default: Duration,
) -> Result<Duration> {
    if let Some(value) = cli.filter(|d| !d.is_zero()) {
        return Ok(value);
    }
    match file {
        Some(raw) => {
            let parsed = humantime::parse_duration(raw)
                .with_context(|| format!("Invalid '{key}' in config file: '{raw}'"))?;
            Ok(if parsed.is_zero() { default } else { parsed })
        }
        None => Ok(default),
    }
}

/// Accepts `local@domain` without whitespace, with a dotted domain.
pub fn validate_email(email: &str) -> Result<()> {
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.is_empty()
            && !domain.contains('@')
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !email.chars().any(char::is_whitespace)
    });
    if !valid {
        bail!("Invalid email address: '{email}'");
    }
    Ok(())
}

/// Locates and reads `config.toml`.
pub struct ConfigManager {
    config_path: PathBuf,
    explicit: bool,
}

impl ConfigManager {
    /// Uses `path` if given, otherwise `$XDG_CONFIG_HOME/leo/config.toml`
    /// or `~/.config/leo/config.toml`.
    pub fn new(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(config_path) => Ok(Self {
                config_path,
                explicit: true,
            }),
            None => Ok(Self {
                config_path: paths::config_file()?,
                explicit: false,
            }),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// A missing default file yields an empty config; a missing file that
    /// was asked for explicitly is an error.
    pub fn load(&self) -> Result<ConfigFile> {
        if !self.explicit && !self.config_path.exists() {
            return Ok(ConfigFile::default());
        }

        let contents = fs::read_to_string(&self.config_path).with_context(|| {
            format!("Failed to read config file: {}", self.config_path.display())
        })?;

        toml::from_str(&contents).with_context(|| {
            format!("Failed to parse config file: {}", self.config_path.display())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn base_options() -> ResolveOptions {
        ResolveOptions {
            email: Some("user@example.com".into()),
            password: Some("secret".into()),
            words: vec!["house".into()],
            ..ResolveOptions::default()
        }
    }

    #[test]
    fn test_load_full_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
email = "file@example.com"
password = "file-secret"
player = "mpg123 -q"
sound = true
download = true
workers = 8
max_redirects = 3
retry_max_attempts = 5
request_timeout = "30s"
retry_initial_wait = "250ms"
retry_max_wait = "2s"
player_shutdown_timeout = "500ms"
"#,
        )
        .unwrap();

        let config = ConfigManager::new(Some(path)).unwrap().load().unwrap();

        assert_eq!(config.email.as_deref(), Some("file@example.com"));
        assert_eq!(config.player.as_deref(), Some("mpg123 -q"));
        assert!(config.sound);
        assert!(config.download);
        assert!(!config.add);
        assert_eq!(config.workers, Some(8));
        assert_eq!(config.request_timeout.as_deref(), Some("30s"));
        assert_eq!(config.player_shutdown_timeout.as_deref(), Some("500ms"));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::new(Some(temp_dir.path().join("missing.toml"))).unwrap();

        let err = manager.load().unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_missing_default_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager {
            config_path: temp_dir.path().join("config.toml"),
            explicit: false,
        };

        assert_eq!(manager.load().unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "emali = \"typo@example.com\"\n").unwrap();

        let err = ConfigManager::new(Some(path)).unwrap().load().unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_resolve_defaults() {
        let settings = resolve_settings(&base_options(), &ConfigFile::default()).unwrap();

        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.workers, 0);
        assert_eq!(settings.max_redirects, 10);
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
        assert_eq!(settings.retry, RetryPolicy::default());
        assert_eq!(settings.player_shutdown_timeout, Duration::from_secs(2));
        assert!(!settings.sound);
        assert!(settings.player.is_none());
    }

    #[test]
    fn test_resolve_cli_wins_over_file() {
        let options = ResolveOptions {
            email: Some("cli@example.com".into()),
            workers: Some(2),
            request_timeout: Some(Duration::from_secs(3)),
            ..base_options()
        };
        let file = ConfigFile {
            email: Some("file@example.com".into()),
            workers: Some(8),
            request_timeout: Some("30s".into()),
            ..ConfigFile::default()
        };

        let settings = resolve_settings(&options, &file).unwrap();

        assert_eq!(settings.email, "cli@example.com");
        assert_eq!(settings.workers, 2);
        assert_eq!(settings.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_resolve_player_shutdown_timeout() {
        let file = ConfigFile {
            player_shutdown_timeout: Some("750ms".into()),
            ..ConfigFile::default()
        };
        let settings = resolve_settings(&base_options(), &file).unwrap();
        assert_eq!(settings.player_shutdown_timeout, Duration::from_millis(750));

        let options = ResolveOptions {
            player_shutdown_timeout: Some(Duration::from_secs(5)),
            ..base_options()
        };
        let settings = resolve_settings(&options, &file).unwrap();
        assert_eq!(settings.player_shutdown_timeout, Duration::from_secs(5));

        let file = ConfigFile {
            player_shutdown_timeout: Some("whenever".into()),
            ..ConfigFile::default()
        };
        let err = resolve_settings(&base_options(), &file).unwrap_err();
        assert!(err.to_string().contains("player_shutdown_timeout"));
    }

    #[test]
    fn test_resolve_falls_back_to_file() {
        let options = ResolveOptions {
            email: None,
            password: None,
            ..base_options()
        };
        let file = ConfigFile {
            email: Some("file@example.com".into()),
            password: Some("file-secret".into()),
            retry_max_attempts: Some(5),
            retry_initial_wait: Some("250ms".into()),
            player: Some("mpv".into()),
            ..ConfigFile::default()
        };

        let settings = resolve_settings(&options, &file).unwrap();

        assert_eq!(settings.email, "file@example.com");
        assert_eq!(settings.password, "file-secret");
        assert_eq!(settings.retry.max_attempts, 5);
        assert_eq!(settings.retry.initial_wait, Duration::from_millis(250));
        assert_eq!(settings.retry.max_wait, Duration::from_secs(5));
        assert_eq!(settings.player.as_deref(), Some("mpv"));
    }

    #[test]
    fn test_resolve_flags_are_ored() {
        let options = ResolveOptions {
            sound: true,
            ..base_options()
        };
        let file = ConfigFile {
            download: true,
            reverse_translate: true,
            ..ConfigFile::default()
        };

        let settings = resolve_settings(&options, &file).unwrap();

        assert!(settings.sound);
        assert!(settings.download);
        assert!(settings.reverse_translate);
        assert!(!settings.add);
    }

    #[test]
    fn test_resolve_debug_forces_debug_level() {
        let options = ResolveOptions {
            log_level: Some("warn".into()),
            ..base_options()
        };
        let file = ConfigFile {
            debug: true,
            ..ConfigFile::default()
        };

        let settings = resolve_settings(&options, &file).unwrap();
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_resolve_rejects_unknown_log_level() {
        let options = ResolveOptions {
            log_level: Some("loud".into()),
            ..base_options()
        };
        let err = resolve_settings(&options, &ConfigFile::default()).unwrap_err();
        assert!(err.to_string().contains("Unknown log level"));
    }

    #[test]
    fn test_resolve_requires_email() {
        let options = ResolveOptions {
            email: None,
            ..base_options()
        };
        let err = resolve_settings(&options, &ConfigFile::default()).unwrap_err();
        assert!(err.to_string().contains("'email'"));
    }

    #[test]
    fn test_resolve_requires_password() {
        let options = ResolveOptions {
            password: Some(String::new()),
            ..base_options()
        };
        let err = resolve_settings(&options, &ConfigFile::default()).unwrap_err();
        assert!(err.to_string().contains("'password'"));
    }

    #[test]
    fn test_resolve_requires_words() {
        let options = ResolveOptions {
            words: Vec::new(),
            ..base_options()
        };
        let err = resolve_settings(&options, &ConfigFile::default()).unwrap_err();
        assert!(err.to_string().contains("no words"));
    }

    #[test]
    fn test_resolve_custom_translation_needs_one_word() {
        let options = ResolveOptions {
            add: true,
            translations: vec!["дом".into()],
            words: vec!["house".into(), "home".into()],
            ..base_options()
        };
        let err = resolve_settings(&options, &ConfigFile::default()).unwrap_err();
        assert!(err.to_string().contains("exactly one word"));
    }

    #[test]
    fn test_resolve_rejects_bad_file_duration() {
        let file = ConfigFile {
            retry_max_wait: Some("soon".into()),
            ..ConfigFile::default()
        };
        let err = resolve_settings(&base_options(), &file).unwrap_err();
        assert!(err.to_string().contains("retry_max_wait"));
    }

    #[test]
    fn test_validate_email() {
        for ok in ["user@example.com", "a.b+c@mail.example.org"] {
            assert!(validate_email(ok).is_ok(), "{ok} should be valid");
        }
        for bad in [
            "",
            "user",
            "@example.com",
            "user@",
            "user@localhost",
            "user@@example.com",
            "us er@example.com",
            "user@.com",
        ] {
            assert!(validate_email(bad).is_err(), "{bad:?} should be invalid");
        }
    }
}
