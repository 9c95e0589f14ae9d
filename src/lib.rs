pub mod config;
pub mod date;
pub mod details;
pub mod duration;
pub mod error;
pub mod export;
pub mod hierarchy;
pub mod history;
pub mod locale;
pub mod query;
pub mod rank;
pub mod recap;
pub mod record;
pub mod trend;

mod collate;

pub use error::QueryError;
pub use locale::{Labels, Locale};
pub use record::{PlayEvent, TriState};

use anyhow::{anyhow, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::warn;
use std::fs;

/// Returns the paths of directory files accepted by a filtering function, sorted by name.
fn iter_paths<F: Fn(&Utf8Path) -> bool>(dir: &Utf8Path, f: F) -> Result<impl Iterator<Item = Utf8PathBuf>> {
    let mut path_strings = Vec::<Utf8PathBuf>::new();
    for result in fs::read_dir(dir)? {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Unexpected error when listing the '{}' directory: {}, skipping", dir, e);
                continue;
            },
        };
        let path = entry.path();
        let path_str = match path.to_str() {
            Some(str) => str,
            None => return Err(anyhow!("Failed to convert system path {:?} to UTF-8 (other encodings not supported)", path)),
        };
        let path = Utf8PathBuf::from(path_str);
        if f(&path) {
            path_strings.push(path);
        }
    }
    path_strings.sort_unstable();
    Ok(path_strings.into_iter())
}
