//! Command-line interface definitions and handlers.

/// CLI argument parsing with clap.
pub mod args;

/// Subcommand implementations.
pub mod commands;

pub use args::{Args, Command};

use anyhow::Result;

use crate::config::{ConfigManager, ResolveOptions, Settings, resolve_settings};

/// Merges `args` over the config file into the settings for this run.
pub fn load_settings(args: Args) -> Result<Settings> {
    let manager = ConfigManager::new(args.config.clone())?;
    let file = manager.load()?;
    resolve_settings(&resolve_options(args), &file)
}

fn resolve_options(args: Args) -> ResolveOptions {
    let mut options = ResolveOptions {
        email: args.email,
        password: args.password,
        player: args.player,
        log_level: args.log_level,
        api_url: args.api_url,
        sound: args.sound,
        download: args.download,
        add: false,
        debug: args.debug,
        reverse_translate: args.reverse_translate,
        workers: args.workers,
        max_redirects: args.max_redirects,
        retry_max_attempts: args.retry_max_attempts,
        request_timeout: args.request_timeout,
        retry_initial_wait: args.retry_initial_wait,
        retry_max_wait: args.retry_max_wait,
        player_shutdown_timeout: args.player_shutdown_timeout,
        words: args.words,
        translations: Vec::new(),
    };

    if let Some(Command::Add {
        words,
        translations,
    }) = args.command
    {
        options.add = true;
        options.words = words;
        options.translations = translations
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
    }
    options
}
