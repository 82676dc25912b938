use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{Evaluation, Settings};

const EVAL_SUFFIX: &str = ".eval.json";
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("evaluation not found: {0}")]
    NotFound(String),
    #[error("invalid evaluation id {0:?} (use letters, digits, '-' or '_')")]
    InvalidId(String),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Resolve the default home directory: `$CRITIQUE_HOME`, else `~/.critique/`.
pub fn default_home() -> PathBuf {
    if let Some(dir) = std::env::var_os("CRITIQUE_HOME").filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".critique")
}

/// Flat-file store for evaluations and settings, one JSON file per record.
#[derive(Debug, Clone)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn open_default() -> Self {
        Self::new(default_home())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn eval_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}{EVAL_SUFFIX}"))
    }

    /// All stored evaluations, oldest first. Unreadable files are skipped.
    pub fn list_evaluations(&self) -> Result<Vec<Evaluation>, StoreError> {
        if !self.root.exists() {
            return Ok(vec![]);
        }
        let entries = fs::read_dir(&self.root).map_err(io_err(&self.root))?;
        let mut evaluations: Vec<Evaluation> = entries
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let name = entry.file_name().to_string_lossy().to_string();
                let id = name.strip_suffix(EVAL_SUFFIX)?;
                match self.read_evaluation(id) {
                    Ok(eval) => Some(eval),
                    Err(e) => {
                        warn!("skipping {name}: {e}");
                        None
                    }
                }
            })
            .collect();
        evaluations.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(evaluations)
    }

    pub fn read_evaluation(&self, id: &str) -> Result<Evaluation, StoreError> {
        validate_id(id)?;
        let path = self.eval_path(id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()))
            }
            Err(e) => return Err(io_err(&path)(e)),
        };
        serde_json::from_str(&raw).map_err(|source| StoreError::Json { path, source })
    }

    /// Write via temp file + rename so a reader never sees a half-written record.
    pub fn write_evaluation(&self, evaluation: &Evaluation) -> Result<(), StoreError> {
        validate_id(&evaluation.id)?;
        let path = self.eval_path(&evaluation.id);
        let json = serde_json::to_string_pretty(evaluation).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;
        self.write_atomic(&format!("{}{EVAL_SUFFIX}", evaluation.id), &json)?;
        debug!("wrote evaluation {} to {}", evaluation.id, path.display());
        Ok(())
    }

    pub fn delete_evaluation(&self, id: &str) -> Result<(), StoreError> {
        validate_id(id)?;
        let path = self.eval_path(id);
        if !path.exists() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        fs::remove_file(&path).map_err(io_err(&path))
    }

    /// Next free id of the form `eval-N`. Counted from file names, so a record
    /// that no longer parses still holds its id.
    pub fn next_evaluation_id(&self) -> Result<String, StoreError> {
        if !self.root.exists() {
            return Ok("eval-1".to_string());
        }
        let max = fs::read_dir(&self.root)
            .map_err(io_err(&self.root))?
            .filter_map(|entry| {
                let name = entry.ok()?.file_name().to_string_lossy().to_string();
                name.strip_suffix(EVAL_SUFFIX)?
                    .strip_prefix("eval-")?
                    .parse::<u64>()
                    .ok()
            })
            .max()
            .unwrap_or(0);
        Ok(format!("eval-{}", max + 1))
    }

    // --- Settings ---

    /// Settings from disk; defaults when the file is missing or corrupt.
    pub fn read_settings(&self) -> Settings {
        let path = self.root.join(SETTINGS_FILE);
        if !path.exists() {
            return Settings::default();
        }
        match fs::read_to_string(&path).map(|s| serde_json::from_str(&s)) {
            Ok(Ok(settings)) => settings,
            Ok(Err(e)) => {
                warn!("ignoring malformed {}: {e}", path.display());
                Settings::default()
            }
            Err(e) => {
                warn!("cannot read {}: {e}", path.display());
                Settings::default()
            }
        }
    }

    pub fn write_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        let path = self.root.join(SETTINGS_FILE);
        let json = serde_json::to_string_pretty(settings)
            .map_err(|source| StoreError::Json { path, source })?;
        self.write_atomic(SETTINGS_FILE, &json)
    }

    fn write_atomic(&self, file_name: &str, data: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(io_err(&self.root))?;
        let tmp = self.root.join(format!(".{file_name}.tmp"));
        let path = self.root.join(file_name);
        fs::write(&tmp, data).map_err(io_err(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_err(&path))
    }
}

fn validate_id(id: &str) -> Result<(), StoreError> {
    let ok = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FallbackMode;
    use tempfile::tempdir;

    fn sample(id: &str, created_at: u64) -> Evaluation {
        Evaluation {
            id: id.to_string(),
            title: "Sum helper".to_string(),
            language: "javascript".to_string(),
            score: 72,
            strengths: "Readable.".to_string(),
            improvements: "Add tests.".to_string(),
            full_report: r#"{"readability":"Clear names."}"#.to_string(),
            created_at,
        }
    }

    #[test]
    fn write_read_list_delete() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());

        assert!(store.list_evaluations().unwrap().is_empty());
        assert_eq!(store.next_evaluation_id().unwrap(), "eval-1");

        store.write_evaluation(&sample("eval-2", 20)).unwrap();
        store.write_evaluation(&sample("eval-1", 10)).unwrap();

        let ids: Vec<String> = store.list_evaluations().unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["eval-1", "eval-2"]);
        assert_eq!(store.next_evaluation_id().unwrap(), "eval-3");
        assert_eq!(store.read_evaluation("eval-2").unwrap(), sample("eval-2", 20));

        store.delete_evaluation("eval-1").unwrap();
        assert!(matches!(
            store.read_evaluation("eval-1"),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_evaluation("eval-1"),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn ids_cannot_escape_the_root() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        assert!(matches!(
            store.read_evaluation("../etc/passwd"),
            Err(StoreError::InvalidId(_))
        ));
        assert!(matches!(store.read_evaluation(""), Err(StoreError::InvalidId(_))));
    }

    #[test]
    fn malformed_records_are_skipped_in_listing() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        store.write_evaluation(&sample("eval-1", 1)).unwrap();
        fs::write(dir.path().join("eval-9.eval.json"), "{ nope").unwrap();

        let all = store.list_evaluations().unwrap();
        assert_eq!(all.len(), 1);
        assert!(matches!(
            store.read_evaluation("eval-9"),
            Err(StoreError::Json { .. })
        ));
    }

    #[test]
    fn corrupt_records_keep_their_id() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        fs::write(dir.path().join("eval-1.eval.json"), "{ half written").unwrap();
        fs::write(dir.path().join("notes.txt"), "eval-7").unwrap();

        assert_eq!(store.next_evaluation_id().unwrap(), "eval-2");

        store.write_evaluation(&sample("eval-2", 5)).unwrap();
        assert_eq!(store.next_evaluation_id().unwrap(), "eval-3");
        assert!(store.read_evaluation("eval-1").is_err());
    }

    #[test]
    fn settings_round_trip_and_corruption() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        assert_eq!(store.read_settings(), Settings::default());

        let mut settings = Settings::default();
        settings.render.fallback = FallbackMode::Notice;
        store.write_settings(&settings).unwrap();
        assert_eq!(store.read_settings(), settings);

        fs::write(dir.path().join(SETTINGS_FILE), "not json").unwrap();
        assert_eq!(store.read_settings(), Settings::default());
    }
}
