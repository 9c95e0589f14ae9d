use crate::locale::Labels;
use crate::record::{normalize, PlayEvent};
use anyhow::{anyhow, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::{info, warn};
use serde_json::Value;
use std::fs;

/// Returns the paths of all streaming history files (`*.json`) in a directory, sorted by name.
pub fn history_paths<P: AsRef<Utf8Path>>(dir: P) -> Result<Vec<Utf8PathBuf>> {
    let dir = dir.as_ref();
    let paths = match crate::iter_paths(dir, |x| x.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) && x.is_file()) {
        Ok(paths) => paths,
        Err(e) => return Err(anyhow!("Failed to list history files in '{}': {}", dir, e)),
    };
    Ok(paths.collect())
}

/// Reads and normalizes the records of every history file, concatenated in file order.
///
/// Empty files and files whose top-level value is not an array are skipped with a warning.
/// A file that cannot be read or is not JSON at all aborts the load.
pub fn load_history<P: AsRef<Utf8Path>>(paths: &[P], labels: &Labels) -> Result<Vec<PlayEvent>> {
    let mut records = Vec::<PlayEvent>::new();
    for path in paths {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => return Err(anyhow!("Failed to read '{}': {}", path, e)),
        };
        if contents.trim().is_empty() {
            warn!("History file '{}' is empty, skipping", path);
            continue;
        }
        let value = match serde_json::from_str::<Value>(&contents) {
            Ok(value) => value,
            Err(e) => return Err(anyhow!("Failed to parse '{}' as JSON: {}", path, e)),
        };
        let Value::Array(items) = value else {
            warn!("History file '{}' does not contain a list of plays, skipping", path);
            continue;
        };
        info!("Loaded {} records from '{}'", items.len(), path);
        records.extend(items.iter().map(|x| normalize(x, labels)));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locale;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(dir.path().join(name)).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_files_in_order() {
        let dir = TempDir::new().unwrap();
        let a = write(&dir, "a.json", r#"[{"ts": "2023-01-01T00:00:00Z", "ms_played": 5}]"#);
        let b = write(&dir, "b.json", r#"[{"ts": "2023-01-02T00:00:00Z"}, {"ts": "2023-01-03T00:00:00Z"}]"#);
        let records = load_history(&[a, b], Locale::ZhTw.labels()).unwrap();
        let ts: Vec<&str> = records.iter().map(|x| x.timestamp.as_str()).collect();
        assert_eq!(ts, ["2023-01-01T00:00:00Z", "2023-01-02T00:00:00Z", "2023-01-03T00:00:00Z"]);
        assert_eq!(records[0].ms_played, 5);
    }

    #[test]
    fn skips_empty_and_non_array_files() {
        let dir = TempDir::new().unwrap();
        let empty = write(&dir, "empty.json", "  \n");
        let object = write(&dir, "object.json", r#"{"ts": "2023-01-01T00:00:00Z"}"#);
        let good = write(&dir, "good.json", r#"[{"ts": "2023-01-01T00:00:00Z"}]"#);
        let records = load_history(&[empty, object, good], Locale::En.labels()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].track_name, "Unknown Track");
    }

    #[test]
    fn invalid_json_names_the_file() {
        let dir = TempDir::new().unwrap();
        let bad = write(&dir, "bad.json", "[{");
        let err = load_history(&[bad], Locale::ZhTw.labels()).unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = Utf8PathBuf::from_path_buf(dir.path().join("missing.json")).unwrap();
        assert!(load_history(&[missing], Locale::ZhTw.labels()).is_err());
    }

    #[test]
    fn lists_json_files_sorted() {
        let dir = TempDir::new().unwrap();
        write(&dir, "Streaming_History_Audio_2021_1.json", "[]");
        write(&dir, "Streaming_History_Audio_2019-2021_0.json", "[]");
        write(&dir, "ReadMeFirst.pdf", "");
        fs::create_dir(dir.path().join("nested.json")).unwrap();
        let dir_path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let names: Vec<String> = history_paths(&dir_path).unwrap()
            .iter()
            .map(|x| x.file_name().unwrap().to_string())
            .collect();
        assert_eq!(names, ["Streaming_History_Audio_2019-2021_0.json", "Streaming_History_Audio_2021_1.json"]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(history_paths("/nonexistent/listen-stats").is_err());
    }
}
