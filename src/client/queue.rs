//! Durable per-fixture buffer of events not yet acknowledged by the server.
//!
//! Each fixture owns one JSON file, `<fixture_id>.json`, holding the pending
//! [`MatchEvent`] array. Writes go to a sibling temp file that is then
//! renamed over the original, so a crash leaves either the old or the new
//! array on disk.

use std::{
    collections::HashSet,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use tokio::{
    fs,
    sync::{Mutex, OwnedMutexGuard},
};
use tracing::debug;
use uuid::Uuid;

use super::error::{ClientError, ClientResult};
use crate::events::{ClientId, MatchEvent};

const QUEUE_EXTENSION: &str = "json";

/// File-backed offline queue.
pub struct OfflineQueue {
    dir: PathBuf,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl OfflineQueue {
    /// Open (and create if needed) the queue directory.
    pub async fn open(dir: impl Into<PathBuf>) -> ClientResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| ClientError::QueueIo {
                path: dir.clone(),
                source,
            })?;
        Ok(Self {
            dir,
            locks: DashMap::new(),
        })
    }

    /// Directory holding the queue files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `event` at the tail of its fixture's queue.
    pub async fn append(&self, event: &MatchEvent) -> ClientResult<()> {
        let fixture_id = require_fixture(event.fixture_id)?;
        let _guard = self.lock(fixture_id).await;
        let path = self.path_for(fixture_id);
        let mut pending = read_queue(&path).await?;
        pending.push(event.clone());
        write_queue(&path, &pending).await?;
        debug!(fixture_id = %fixture_id, client_id = %event.client_id, pending = pending.len(), "event queued");
        Ok(())
    }

    /// Pending events of a fixture in capture order.
    pub async fn pending(&self, fixture_id: Uuid) -> ClientResult<Vec<MatchEvent>> {
        let fixture_id = require_fixture(fixture_id)?;
        let _guard = self.lock(fixture_id).await;
        read_queue(&self.path_for(fixture_id)).await
    }

    /// Number of pending events of a fixture.
    pub async fn len(&self, fixture_id: Uuid) -> ClientResult<usize> {
        Ok(self.pending(fixture_id).await?.len())
    }

    /// Drop the acknowledged events, keeping anything appended meanwhile.
    pub async fn remove(
        &self,
        fixture_id: Uuid,
        acknowledged: &HashSet<ClientId>,
    ) -> ClientResult<usize> {
        let fixture_id = require_fixture(fixture_id)?;
        if acknowledged.is_empty() {
            return Ok(0);
        }
        let _guard = self.lock(fixture_id).await;
        let path = self.path_for(fixture_id);
        let mut pending = read_queue(&path).await?;
        let before = pending.len();
        pending.retain(|event| !acknowledged.contains(&event.client_id));
        let removed = before - pending.len();
        if removed > 0 {
            write_queue(&path, &pending).await?;
        }
        Ok(removed)
    }

    /// Remove one still-pending event, returning whether it was queued.
    pub async fn remove_one(&self, fixture_id: Uuid, client_id: &str) -> ClientResult<bool> {
        let fixture_id = require_fixture(fixture_id)?;
        let _guard = self.lock(fixture_id).await;
        let path = self.path_for(fixture_id);
        let mut pending = read_queue(&path).await?;
        let Some(index) = pending.iter().position(|event| event.client_id == client_id) else {
            return Ok(false);
        };
        pending.remove(index);
        write_queue(&path, &pending).await?;
        Ok(true)
    }

    /// Fixtures that currently have a non-empty queue.
    pub async fn fixtures_with_pending(&self) -> ClientResult<Vec<Uuid>> {
        let io_err = |source| ClientError::QueueIo {
            path: self.dir.clone(),
            source,
        };
        let mut entries = fs::read_dir(&self.dir).await.map_err(io_err)?;
        let mut fixtures = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(QUEUE_EXTENSION) {
                continue;
            }
            let Some(fixture_id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| Uuid::parse_str(stem).ok())
            else {
                continue;
            };
            if !self.pending(fixture_id).await?.is_empty() {
                fixtures.push(fixture_id);
            }
        }
        fixtures.sort();
        Ok(fixtures)
    }

    fn path_for(&self, fixture_id: Uuid) -> PathBuf {
        self.dir.join(format!("{fixture_id}.{QUEUE_EXTENSION}"))
    }

    async fn lock(&self, fixture_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(fixture_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }
}

fn require_fixture(fixture_id: Uuid) -> ClientResult<Uuid> {
    if fixture_id.is_nil() {
        Err(ClientError::MissingFixtureId)
    } else {
        Ok(fixture_id)
    }
}

async fn read_queue(path: &Path) -> ClientResult<Vec<MatchEvent>> {
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| ClientError::QueueCorrupt {
            path: path.to_path_buf(),
            source,
        }),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(source) => Err(ClientError::QueueIo {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn write_queue(path: &Path, pending: &[MatchEvent]) -> ClientResult<()> {
    let io_err = |source| ClientError::QueueIo {
        path: path.to_path_buf(),
        source,
    };

    if pending.is_empty() {
        return match fs::remove_file(path).await {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(io_err(err)),
            _ => Ok(()),
        };
    }

    let bytes = serde_json::to_vec(pending).map_err(|source| ClientError::QueueCorrupt {
        path: path.to_path_buf(),
        source,
    })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).await.map_err(io_err)?;
    fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}
