//! # leo - LinguaLeo Translation CLI
//!
//! `leo` looks words up in the LinguaLeo dictionary, prints their
//! translations, optionally pronounces them, and can add custom
//! translations to the user's dictionary.
//!
//! Words are translated concurrently. Each result is routed to the
//! pronunciation and dictionary branches that are enabled, and the whole
//! run stops promptly on Ctrl-C.
//!
//! ## Quick Start
//!
//! ```bash
//! # Translate words
//! leo -e user@example.com -p secret house cat
//!
//! # Pronounce them with a local player
//! leo -s -m "mpg123 -q" house
//!
//! # Add a custom translation
//! leo add house -t "дом,жильё"
//! ```
//!
//! ## Configuration
//!
//! Settings are read from `~/.config/leo/config.toml`:
//!
//! ```toml
//! email = "user@example.com"
//! password = "secret"
//! player = "mpg123 -q"
//! sound = true
//! ```

/// Audio download and playback.
pub mod audio;

/// Cancellation-aware channel helpers.
pub mod channel;

/// Command-line interface definitions and handlers.
pub mod cli;

/// Configuration file loading and setting resolution.
pub mod config;

/// Bounded-concurrency worker dispatch.
pub mod dispatch;

/// Tracing subscriber setup.
pub mod logging;

/// Printing translations (colors, stdout routing).
pub mod output;

/// XDG-style path utilities for configuration.
pub mod paths;

/// The translate/pronounce/add pipeline.
pub mod pipeline;

/// Restoring submission order after concurrent work.
pub mod reorder;

/// HTTP requests with retry and error classification.
pub mod request;

/// Values tagged with their submission index.
pub mod sequenced;

/// LinguaLeo client and translation model.
pub mod translation;

/// Terminal UI components (spinner, colors).
pub mod ui;
