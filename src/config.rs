use crate::locale::Locale;
use crate::recap::DEFAULT_FAMILIAR_THRESHOLD;
use anyhow::{anyhow, Result};
use camino::Utf8PathBuf;
use log::warn;
use std::env;

pub const ENV_DIR: &str = "LISTEN_STATS_DIR";
pub const ENV_LOCALE: &str = "LISTEN_STATS_LOCALE";
pub const ENV_FAMILIAR: &str = "LISTEN_STATS_FAMILIAR";

/// Location of the history files relative to the home directory.
const DEFAULT_DIR: &str = "Music/.listen-stats";

/// Returns the default location of the streaming history files, `~/Music/.listen-stats`.
pub fn default_dir() -> Result<Utf8PathBuf> {
    let home = match dirs::home_dir() {
        Some(path) => path,
        None => return Err(anyhow!("Failed to locate home directory")),
    };
    match Utf8PathBuf::from_path_buf(home) {
        Ok(home) => Ok(home.join(DEFAULT_DIR)),
        Err(path) => Err(anyhow!("Failed to convert home directory {:?} to UTF-8 (other encodings not supported)", path)),
    }
}

/// Settings that apply to every command unless overridden on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Set through the environment. See `history_dir` for the effective directory.
    pub history_dir: Option<Utf8PathBuf>,
    pub locale: Locale,
    pub familiar_threshold: usize,
}

impl Config {
    /// Reads the settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the settings through an arbitrary variable lookup. Unusable values are reported and
    /// replaced by defaults.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let history_dir = match lookup(ENV_DIR) {
            Some(dir) if !dir.trim().is_empty() => Some(Utf8PathBuf::from(dir)),
            _ => None,
        };
        let locale = match lookup(ENV_LOCALE) {
            Some(s) => match s.parse::<Locale>() {
                Ok(locale) => locale,
                Err(e) => {
                    warn!("{}: {}, using the default", ENV_LOCALE, e);
                    Locale::default()
                },
            },
            None => Locale::default(),
        };
        let familiar_threshold = match lookup(ENV_FAMILIAR) {
            Some(s) => match s.trim().parse::<usize>() {
                Ok(n) => n,
                Err(_) => {
                    warn!("{}: expected a non-negative number, got '{}', using {}", ENV_FAMILIAR, s, DEFAULT_FAMILIAR_THRESHOLD);
                    DEFAULT_FAMILIAR_THRESHOLD
                },
            },
            None => DEFAULT_FAMILIAR_THRESHOLD,
        };
        Self { history_dir, locale, familiar_threshold }
    }

    /// The configured history directory, or the default one. The home directory is only looked
    /// up when nothing is configured.
    pub fn history_dir(&self) -> Result<Utf8PathBuf> {
        match &self.history_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_dir(),
        }
    }
}
