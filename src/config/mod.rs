mod manager;

pub use manager::{
    ConfigFile, ConfigManager, DEFAULT_LOG_LEVEL, ResolveOptions, Settings, resolve_settings,
    validate_email,
};
