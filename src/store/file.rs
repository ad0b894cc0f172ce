use async_trait::async_trait;
use fd_lock::RwLock;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{StoreError, WorkflowStore};
use crate::workflow::{SubmissionId, WorkflowState};

/// One JSON document per submission. Writers take an exclusive lock on a
/// sidecar `.lock` file so the version check and the replace are atomic
/// across processes; the document itself is swapped in with a rename.
#[derive(Debug, Clone)]
pub struct FileStore {
    directory: PathBuf,
}

impl FileStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn state_path(&self, submission_id: &SubmissionId) -> Result<PathBuf, StoreError> {
        validate_id(submission_id)?;
        Ok(self.directory.join(format!("{submission_id}.json")))
    }

    fn lock_path(&self, submission_id: &SubmissionId) -> PathBuf {
        self.directory.join(format!("{submission_id}.lock"))
    }

    /// Run a closure on the blocking pool while holding the submission's
    /// exclusive file lock
    async fn with_lock<T, F>(&self, submission_id: &SubmissionId, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(PathBuf) -> Result<T, StoreError> + Send + 'static,
    {
        let state_path = self.state_path(submission_id)?;
        let lock_path = self.lock_path(submission_id);
        let directory = self.directory.clone();

        tokio::task::spawn_blocking(move || {
            fs::create_dir_all(&directory)?;
            let lock_file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)?;
            let mut lock = RwLock::new(lock_file);
            let _guard = lock.write().map_err(|e| StoreError::Lock {
                reason: format!("{}: {e}", lock_path.display()),
            })?;
            f(state_path)
        })
        .await
        .map_err(|e| StoreError::Lock {
            reason: format!("blocking task failed: {e}"),
        })?
    }
}

fn validate_id(submission_id: &SubmissionId) -> Result<(), StoreError> {
    let id = submission_id.as_str();
    let safe = !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if safe {
        Ok(())
    } else {
        Err(StoreError::InvalidSubmissionId(id.to_string()))
    }
}

fn read_state(path: &Path, submission_id: &SubmissionId) -> Result<WorkflowState, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(StoreError::NotFound(submission_id.clone()))
        }
        Err(e) => Err(e.into()),
    }
}

fn write_state(path: &Path, state: &WorkflowState) -> Result<(), StoreError> {
    let tmp_path = path.with_extension("json.tmp");
    let contents = serde_json::to_vec_pretty(state)?;
    {
        let mut tmp = File::create(&tmp_path)?;
        std::io::Write::write_all(&mut tmp, &contents)?;
        tmp.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[async_trait]
impl WorkflowStore for FileStore {
    async fn insert(&self, state: &WorkflowState) -> Result<(), StoreError> {
        let state = state.clone();
        self.with_lock(&state.submission_id.clone(), move |path| {
            if path.exists() {
                return Err(StoreError::AlreadyExists(state.submission_id.clone()));
            }
            write_state(&path, &state)?;
            debug!(submission_id = %state.submission_id, path = %path.display(), "Stored new submission");
            Ok(())
        })
        .await
    }

    async fn load(&self, submission_id: &SubmissionId) -> Result<WorkflowState, StoreError> {
        let path = self.state_path(submission_id)?;
        let id = submission_id.clone();
        tokio::task::spawn_blocking(move || read_state(&path, &id))
            .await
            .map_err(|e| StoreError::Lock {
                reason: format!("blocking task failed: {e}"),
            })?
    }

    async fn save(&self, state: &WorkflowState, expected_version: u64) -> Result<(), StoreError> {
        let state = state.clone();
        self.with_lock(&state.submission_id.clone(), move |path| {
            let stored = read_state(&path, &state.submission_id)?;
            if stored.version != expected_version {
                return Err(StoreError::StaleWrite {
                    submission_id: state.submission_id.clone(),
                    expected: expected_version,
                    found: stored.version,
                });
            }
            write_state(&path, &state)?;
            debug!(
                submission_id = %state.submission_id,
                version = state.version,
                "Stored workflow state"
            );
            Ok(())
        })
        .await
    }

    async fn list(&self) -> Result<Vec<SubmissionId>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                ids.push(SubmissionId::from(stem));
            }
        }
        ids.sort();
        Ok(ids)
    }
}
