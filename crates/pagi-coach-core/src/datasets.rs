//! Local JSON datasets: objectives, habits and reports.
//!
//! Each dataset is one pretty-printed JSON object on disk (`<dir>/<name>.json`), replaced
//! wholesale on every save. All loads and saves share a single lock, whichever dataset
//! they touch, so no reader sees a half-written file and no two writers interleave.

use serde_json::Value;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::sync::Mutex;

/// Untyped mapping persisted per dataset.
pub type JsonMap = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Objectives,
    Habits,
    Reports,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [Dataset::Objectives, Dataset::Habits, Dataset::Reports];

    pub fn name(self) -> &'static str {
        match self {
            Dataset::Objectives => "objectives",
            Dataset::Habits => "habits",
            Dataset::Reports => "reports",
        }
    }

    fn file_name(self) -> String {
        format!("{}.json", self.name())
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dataset {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dataset::ALL
            .into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| DatasetError::Unknown(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("unknown dataset: {0}")]
    Unknown(String),
    #[error("dataset {dataset} I/O at {path}: {source}")]
    Io {
        dataset: Dataset,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("dataset {dataset} is not a valid JSON object: {source}")]
    Json {
        dataset: Dataset,
        #[source]
        source: serde_json::Error,
    },
}

/// File-backed store for the three datasets.
pub struct DatasetStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl DatasetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Backing file for a dataset.
    pub fn path(&self, dataset: Dataset) -> PathBuf {
        self.dir.join(dataset.file_name())
    }

    /// Read a dataset. A missing file is an empty mapping; an unreadable or corrupt file is
    /// logged and also yields an empty mapping.
    pub async fn load(&self, dataset: Dataset) -> JsonMap {
        let _guard = self.lock.lock().await;
        match self.read(dataset).await {
            Ok(Some(map)) => map,
            Ok(None) => JsonMap::new(),
            Err(e) => {
                tracing::error!(target: "pagi::coach::datasets", error = %e, "Dataset load failed; using empty mapping");
                JsonMap::new()
            }
        }
    }

    /// Replace a dataset on disk. Failures are logged here and returned for visibility;
    /// callers treat persistence as fire-and-forget and never raise them.
    pub async fn save(&self, dataset: Dataset, data: &JsonMap) -> Result<(), DatasetError> {
        let _guard = self.lock.lock().await;
        let result = self.write(dataset, data).await;
        match &result {
            Ok(()) => {
                tracing::debug!(target: "pagi::coach::datasets", %dataset, entries = data.len(), "Dataset saved");
            }
            Err(e) => {
                tracing::error!(target: "pagi::coach::datasets", error = %e, "Dataset save failed");
            }
        }
        result
    }

    async fn read(&self, dataset: Dataset) -> Result<Option<JsonMap>, DatasetError> {
        let path = self.path(dataset);
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(DatasetError::Io { dataset, path, source }),
        };
        let map = serde_json::from_slice::<JsonMap>(&bytes)
            .map_err(|source| DatasetError::Json { dataset, source })?;
        Ok(Some(map))
    }

    async fn write(&self, dataset: Dataset, data: &JsonMap) -> Result<(), DatasetError> {
        let path = self.path(dataset);
        let io_err = |path: &Path, source: std::io::Error| DatasetError::Io {
            dataset,
            path: path.to_path_buf(),
            source,
        };

        // serde_json writes non-ASCII characters as-is.
        let json = serde_json::to_vec_pretty(data)
            .map_err(|source| DatasetError::Json { dataset, source })?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_err(&self.dir, e))?;
        let tmp = self.dir.join(format!(".{}.tmp", dataset.file_name()));
        tokio::fs::write(&tmp, &json).await.map_err(|e| io_err(&tmp, e))?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| io_err(&path, e))?;
        Ok(())
    }
}
