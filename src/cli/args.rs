use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "leo")]
#[command(about = "Translate words with the LinguaLeo dictionary")]
#[command(version)]
pub struct Args {
    /// Words to translate
    pub words: Vec<String>,

    /// LinguaLeo account email
    #[arg(short = 'e', long, global = true, env = "LEO_EMAIL")]
    pub email: Option<String>,

    /// LinguaLeo account password
    #[arg(
        short = 'p',
        long,
        global = true,
        env = "LEO_PASSWORD",
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// Path to config.toml
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Media player command, e.g. "mpg123 -q"
    #[arg(short = 'm', long, global = true)]
    pub player: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Timeout for a single HTTP attempt, e.g. "10s"
    #[arg(long = "timeout", global = true, value_parser = humantime::parse_duration)]
    pub request_timeout: Option<Duration>,

    /// Redirects followed per request
    #[arg(long, global = true)]
    pub max_redirects: Option<usize>,

    /// Attempts per request, including the first
    #[arg(long, global = true)]
    pub retry_max_attempts: Option<u32>,

    /// Wait before the first retry, e.g. "500ms"
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    pub retry_initial_wait: Option<Duration>,

    /// Upper bound for the wait between retries, e.g. "5s"
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    pub retry_max_wait: Option<Duration>,

    /// Time a cancelled player gets to exit after SIGTERM, e.g. "2s"
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    pub player_shutdown_timeout: Option<Duration>,

    /// Concurrent workers per stage (0 uses the CPU count)
    #[arg(short = 'w', long, global = true, allow_negative_numbers = true)]
    pub workers: Option<i64>,

    /// Pronounce translated words
    #[arg(short = 's', long, global = true)]
    pub sound: bool,

    /// Download audio before playing it
    #[arg(long, global = true)]
    pub download: bool,

    /// Enable debug logging
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Also translate the English variants of each result
    #[arg(long, global = true)]
    pub reverse_translate: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Base URL of the API
    #[arg(long, global = true, hide = true, env = "LEO_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a word with custom translations to the dictionary
    #[command(visible_alias = "a")]
    Add {
        /// Word to add
        #[arg(required = true)]
        words: Vec<String>,

        /// Custom translation (repeatable or comma-separated)
        #[arg(short = 't', long = "translate", required = true, value_delimiter = ',')]
        translations: Vec<String>,
    },
}
