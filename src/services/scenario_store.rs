use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::scenario::Scenario;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("scenario storage unavailable at {path}: {source}")]
    Unavailable { path: PathBuf, source: io::Error },
    #[error("failed to parse stored scenario {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("failed to serialize scenario: {0}")]
    Serialize(#[source] serde_yaml::Error),
    #[error("project id cannot be used as a scenario key: {0:?}")]
    InvalidKey(String),
}

impl StoreError {
    /// Whether retrying the same operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. })
    }
}

/// Keyed persistence of what-if scenarios, one per project.
///
/// Concurrent writes to the same project id are last-writer-wins.
pub trait ScenarioStore: Send + Sync {
    fn save(&self, project_id: &str, scenario: &Scenario) -> Result<(), StoreError>;
    fn load(&self, project_id: &str) -> Result<Option<Scenario>, StoreError>;
    fn clear(&self, project_id: &str) -> Result<(), StoreError>;
    fn load_all(&self) -> Result<BTreeMap<String, Scenario>, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryScenarioStore {
    scenarios: RwLock<BTreeMap<String, Scenario>>,
}

impl InMemoryScenarioStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScenarioStore for InMemoryScenarioStore {
    fn save(&self, project_id: &str, scenario: &Scenario) -> Result<(), StoreError> {
        self.scenarios
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(project_id.to_string(), *scenario);
        Ok(())
    }

    fn load(&self, project_id: &str) -> Result<Option<Scenario>, StoreError> {
        Ok(self
            .scenarios
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(project_id)
            .copied())
    }

    fn clear(&self, project_id: &str) -> Result<(), StoreError> {
        self.scenarios
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(project_id);
        Ok(())
    }

    fn load_all(&self) -> Result<BTreeMap<String, Scenario>, StoreError> {
        Ok(self
            .scenarios
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

/// Stores each scenario as `<project_id>.yaml` inside a directory.
///
/// The files are the only state. Other processes sharing the directory see
/// each other's writes: `load` reads the file and `load_all` scans the directory.
pub struct FileScenarioStore {
    dir: PathBuf,
    key_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FileScenarioStore {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Unavailable {
            path: dir.clone(),
            source,
        })?;

        let scenarios = scan_dir(&dir)?;
        info!(dir = %dir.display(), scenarios = scenarios.len(), "opened scenario store");
        Ok(Self {
            dir,
            key_locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, project_id: &str) -> Result<PathBuf, StoreError> {
        validate_key(project_id)?;
        Ok(self.dir.join(format!("{project_id}.yaml")))
    }

    /// Runs `op` while holding the lock for `project_id`. The lock entry is
    /// dropped again once no other caller is waiting on it.
    fn with_key_lock<T>(&self, project_id: &str, op: impl FnOnce() -> T) -> T {
        let lock = {
            let mut locks = self.key_locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                locks
                    .entry(project_id.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            op()
        };

        let mut locks = self.key_locks.lock().unwrap_or_else(PoisonError::into_inner);
        let unused = locks
            .get(project_id)
            .is_some_and(|held| Arc::ptr_eq(held, &lock) && Arc::strong_count(&lock) == 2);
        if unused {
            locks.remove(project_id);
        }
        result
    }

    #[cfg(test)]
    fn tracked_key_locks(&self) -> usize {
        self.key_locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl ScenarioStore for FileScenarioStore {
    fn save(&self, project_id: &str, scenario: &Scenario) -> Result<(), StoreError> {
        let path = self.path_for(project_id)?;
        let yaml = serde_yaml::to_string(scenario).map_err(StoreError::Serialize)?;

        self.with_key_lock(project_id, || -> Result<(), StoreError> {
            let temp_path = self.dir.join(format!(".{project_id}.yaml.tmp"));
            std::fs::write(&temp_path, yaml).map_err(|source| StoreError::Unavailable {
                path: temp_path.clone(),
                source,
            })?;
            std::fs::rename(&temp_path, &path).map_err(|source| StoreError::Unavailable {
                path: path.clone(),
                source,
            })?;

            info!(project_id, "saved scenario");
            Ok(())
        })
    }

    fn load(&self, project_id: &str) -> Result<Option<Scenario>, StoreError> {
        let path = self.path_for(project_id)?;
        let scenario = self.with_key_lock(project_id, || read_scenario_file(&path))?;
        debug!(project_id, found = scenario.is_some(), "loaded scenario");
        Ok(scenario)
    }

    fn clear(&self, project_id: &str) -> Result<(), StoreError> {
        let path = self.path_for(project_id)?;
        self.with_key_lock(project_id, || -> Result<(), StoreError> {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => return Err(StoreError::Unavailable { path, source }),
            }
            info!(project_id, "cleared scenario");
            Ok(())
        })
    }

    fn load_all(&self) -> Result<BTreeMap<String, Scenario>, StoreError> {
        scan_dir(&self.dir)
    }
}

fn validate_key(project_id: &str) -> Result<(), StoreError> {
    let valid = !project_id.is_empty()
        && !project_id.starts_with('.')
        && project_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(project_id.to_string()))
    }
}

fn read_scenario_file(path: &Path) -> Result<Option<Scenario>, StoreError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Unavailable {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_yaml::from_str(&contents)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

fn scan_dir(dir: &Path) -> Result<BTreeMap<String, Scenario>, StoreError> {
    let unavailable = |source| StoreError::Unavailable {
        path: dir.to_path_buf(),
        source,
    };
    let mut scenarios = BTreeMap::new();
    for entry in std::fs::read_dir(dir).map_err(unavailable)? {
        let path = entry.map_err(unavailable)?.path();
        if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("yaml") {
            continue;
        }
        let Some(project_id) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        if validate_key(project_id).is_err() {
            continue;
        }
        match read_scenario_file(&path) {
            Ok(Some(scenario)) => {
                scenarios.insert(project_id.to_string(), scenario);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "skipping unreadable scenario file"),
        }
    }
    Ok(scenarios)
}
