//! Configuration directory lookup
//!
//! The history and key-macro files live under the user configuration
//! directory, `$XDG_CONFIG_HOME/mathshell` or `~/.config/mathshell`.

use std::path::PathBuf;

/// Environment variable overriding the bounded history length.
pub const HISTSIZE_ENV: &str = "MATHSHELL_HISTSIZE";

/// Default bounded history length when neither the settings store nor the
/// environment provides one.
pub const DEFAULT_HISTSIZE: usize = 50;

/// Return the mathshell configuration directory, creating it if needed.
///
/// Falls back to the current directory when no home directory can be
/// determined; the caller treats missing files as empty state, so this is
/// never fatal.
pub fn config_dir() -> PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));
    let dir = base.join("mathshell");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

/// History file for the minimal backend.
pub fn history_file() -> PathBuf {
    config_dir().join("history")
}

/// History file for the rich backend.
///
/// Kept separate from the minimal backend's file, matching the two
/// backends' differing history formats in earlier releases.
pub fn rich_history_file() -> PathBuf {
    config_dir().join("history-rich")
}

/// Key-macro bindings file shared by both backends.
pub fn bindings_file() -> PathBuf {
    config_dir().join("bindings")
}

/// Resolve the bounded history length: environment variable first, then
/// the provided settings value, then the default.
pub fn history_length(from_settings: Option<i64>) -> usize {
    if let Ok(v) = std::env::var(HISTSIZE_ENV) {
        if let Ok(n) = v.parse::<usize>() {
            return n;
        }
    }
    match from_settings {
        Some(n) if n >= 0 => n as usize,
        _ => DEFAULT_HISTSIZE,
    }
}
