//! JSON snapshot of the whole store.
//!
//! A snapshot is read whole, changed in memory, and written back whole. Every
//! writer holds a [`SnapshotLock`] from before the read until after the write,
//! so two processes sharing one file take turns instead of overwriting each
//! other's submissions.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};

use digiclass_core::model::{Assignment, AssignmentId, Submission};

use crate::MemoryStore;

/// Everything a [`MemoryStore`] holds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Last assignment id handed out.
    #[serde(default)]
    pub next_id: AssignmentId,
    #[serde(default)]
    pub assignments: BTreeMap<AssignmentId, Assignment>,
    /// In insertion order.
    #[serde(default)]
    pub submissions: Vec<Submission>,
}

impl Snapshot {
    /// Save the snapshot as JSON. The file is replaced atomically.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize store")?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create store directory {}", parent.display())
                })?;
            }
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("failed to write store to {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("failed to replace store at {}", path.display()))?;
        Ok(())
    }

    /// Load a snapshot. A missing file is an empty store.
    pub fn load_json(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("no store at {}, starting empty", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read store from {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse store JSON: {}", path.display()))?;
        Ok(snapshot)
    }
}

/// Exclusive hold on a snapshot file, released on drop.
///
/// The lock lives on a sidecar `<store>.lock` file because the snapshot
/// itself is replaced by rename on every save.
#[derive(Debug)]
pub struct SnapshotLock {
    store_path: PathBuf,
    _file: File,
}

impl SnapshotLock {
    /// Block until no other holder has the snapshot at `store_path`.
    pub fn acquire(store_path: &Path) -> Result<Self> {
        if let Some(parent) = store_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create store directory {}", parent.display())
                })?;
            }
        }

        let lock_path = lock_path_for(store_path);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("failed to open lock file {}", lock_path.display()))?;
        file.lock_exclusive()
            .with_context(|| format!("failed to lock {}", lock_path.display()))?;
        tracing::debug!("locked {}", lock_path.display());

        Ok(Self {
            store_path: store_path.to_path_buf(),
            _file: file,
        })
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }
}

fn lock_path_for(store_path: &Path) -> PathBuf {
    let mut name = OsString::from(store_path.as_os_str());
    name.push(".lock");
    PathBuf::from(name)
}

/// Open the store saved at `path`.
pub fn open(path: &Path) -> Result<MemoryStore> {
    Ok(MemoryStore::from_snapshot(Snapshot::load_json(path)?))
}

/// Lock the snapshot at `path` and open it. Keep the lock until the last
/// [`save`].
pub fn open_locked(path: &Path) -> Result<(MemoryStore, SnapshotLock)> {
    let lock = SnapshotLock::acquire(path)?;
    let store = open(path)?;
    Ok((store, lock))
}

/// Write the store's current state to the snapshot `lock` guards.
pub async fn save(store: &MemoryStore, lock: &SnapshotLock) -> Result<()> {
    store.snapshot().await.save_json(lock.store_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use digiclass_core::model::{Answers, AssignmentKind, Grade, NewAssignment};
    use digiclass_core::traits::{AssignmentStore, SubmissionStore};
    use uuid::Uuid;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = Snapshot::load_json(&dir.path().join("nope.json")).unwrap();
        assert_eq!(snapshot.next_id, 0);
        assert!(snapshot.assignments.is_empty());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Snapshot::load_json(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse store JSON"));
    }

    #[tokio::test]
    async fn saved_store_reopens_with_same_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = MemoryStore::new();
        let assignment = store
            .create(NewAssignment {
                class_id: 1,
                subject: "chemistry".into(),
                topic_id: 8,
                kind: AssignmentKind::Practice,
                title: "Acids".into(),
                description: None,
                max_attempts: 1,
                published: true,
                questions: vec![],
            })
            .await
            .unwrap();
        store
            .insert(Submission {
                id: Uuid::new_v4(),
                assignment_id: assignment.id,
                learner_id: 12,
                attempt_no: 1,
                answers: Answers::new(),
                score: 80,
                grade: Grade::Four,
                submitted_at: Utc::now(),
            })
            .await
            .unwrap();
        let lock = SnapshotLock::acquire(&path).unwrap();
        save(&store, &lock).await.unwrap();
        drop(lock);

        let reopened = open(&path).unwrap();
        assert_eq!(reopened.count(12, assignment.id).await.unwrap(), 1);
        let again = reopened.get(assignment.id).await.unwrap().unwrap();
        assert_eq!(again.title, "Acids");

        // ids keep counting from where the saved store left off
        let next = reopened
            .create(NewAssignment {
                title: "Bases".into(),
                ..again_draft(&again)
            })
            .await
            .unwrap();
        assert_eq!(next.id, assignment.id + 1);
    }

    #[test]
    fn lock_file_sits_next_to_the_store() {
        assert_eq!(
            lock_path_for(Path::new("/data/store.json")),
            PathBuf::from("/data/store.json.lock")
        );
    }

    #[test]
    fn second_holder_waits_for_the_first() {
        use std::sync::mpsc;
        use std::time::Duration;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let first = SnapshotLock::acquire(&path).unwrap();

        let (tx, rx) = mpsc::channel();
        let contender_path = path.clone();
        let contender = std::thread::spawn(move || {
            let lock = SnapshotLock::acquire(&contender_path).unwrap();
            tx.send(()).unwrap();
            drop(lock);
        });

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        drop(first);
        rx.recv_timeout(Duration::from_secs(10)).unwrap();
        contender.join().unwrap();
    }

    fn again_draft(a: &Assignment) -> NewAssignment {
        NewAssignment {
            class_id: a.class_id,
            subject: a.subject.clone(),
            topic_id: a.topic_id,
            kind: a.kind,
            title: a.title.clone(),
            description: a.description.clone(),
            max_attempts: a.max_attempts,
            published: a.published,
            questions: a.questions.clone(),
        }
    }
}
