//! In-memory stand-ins for repositories and blob storage.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use backlot_core::models::{Mmif, Run, RunStatus};
use backlot_db::{MmifStore, RunStore};
use backlot_storage::{Storage, StorageBackend, StorageError, StorageResult};

/// Mock run store backed by a HashMap. Records every applied status so
/// tests can assert what was (or was not) mutated.
#[derive(Default)]
pub struct MockRunStore {
    runs: Mutex<HashMap<String, Run>>,
    applied: Mutex<Vec<(String, RunStatus)>>,
}

impl MockRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_run(&self, run: Run) {
        self.runs.lock().unwrap().insert(run.id.clone(), run);
    }

    pub fn applied(&self) -> Vec<(String, RunStatus)> {
        self.applied.lock().unwrap().clone()
    }

    pub fn get_run(&self, run_id: &str) -> Option<Run> {
        self.runs.lock().unwrap().get(run_id).cloned()
    }
}

#[async_trait]
impl RunStore for MockRunStore {
    async fn get(&self, run_id: &str) -> Result<Option<Run>> {
        Ok(self.runs.lock().unwrap().get(run_id).cloned())
    }

    async fn apply_status(&self, run_id: &str, status: &RunStatus) -> Result<u64> {
        let mut runs = self.runs.lock().unwrap();
        let Some(run) = runs.get_mut(run_id) else {
            return Ok(0);
        };
        run.finished = status.finished;
        run.finished_at = status.finished_at;
        run.successful = status.successful;
        run.current_step = status.current_step.clone();
        run.current_task = status.current_task.clone();
        self.applied
            .lock()
            .unwrap()
            .push((run_id.to_string(), status.clone()));
        Ok(1)
    }
}

/// Mock MMIF store over a fixed artifact list.
#[derive(Default)]
pub struct MockMmifStore {
    mmifs: Mutex<Vec<Mmif>>,
}

impl MockMmifStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mmif(&self, mmif: Mmif) {
        self.mmifs.lock().unwrap().push(mmif);
    }
}

#[async_trait]
impl MmifStore for MockMmifStore {
    async fn get_many(&self, ids: &[i32]) -> Result<Vec<Mmif>> {
        let mmifs = self.mmifs.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| mmifs.iter().find(|m| m.id == *id).cloned())
            .collect())
    }

    async fn outputs_for_batches(&self, batch_ids: &[i32]) -> Result<Vec<Mmif>> {
        let mmifs = self.mmifs.lock().unwrap();
        Ok(mmifs
            .iter()
            .filter(|m| m.batch_output_id.map(|b| batch_ids.contains(&b)).unwrap_or(false))
            .cloned()
            .collect())
    }
}

/// Mock blob storage: objects by key, plus keys that always fail.
#[derive(Default)]
pub struct MockStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    failures: Mutex<HashMap<String, String>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_object(&self, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
    }

    pub fn fail_key(&self, key: &str, cause: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(key.to_string(), cause.to_string());
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        if let Some(cause) = self.failures.lock().unwrap().get(storage_key) {
            return Err(StorageError::DownloadFailed(cause.clone()));
        }
        self.objects
            .lock()
            .unwrap()
            .get(storage_key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(storage_key.to_string()))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
