//! Shared setup for commands that touch the store.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use digiclass_core::config::{load_config_from, DigiclassConfig};
use digiclass_core::model::{LearnerId, Principal, TeacherId};
use digiclass_core::service::SubmissionService;
use digiclass_store::{snapshot, MemoryStore, SnapshotLock};

/// Loaded config, the opened store, and a service over it.
///
/// The store file stays locked for the life of the session, so concurrent
/// `digiclass` processes run their read-check-write one after another.
pub struct Session {
    pub config: DigiclassConfig,
    pub service: SubmissionService,
    store: Arc<MemoryStore>,
    lock: SnapshotLock,
}

impl Session {
    pub fn open(config_path: Option<PathBuf>) -> Result<Self> {
        let config = load_config_from(config_path.as_deref())?;
        let (store, lock) = snapshot::open_locked(&config.store_path)?;
        let store = Arc::new(store);
        tracing::debug!("opened store at {}", config.store_path.display());
        let service =
            SubmissionService::new(store.clone(), store.clone(), config.service_config());
        Ok(Self {
            config,
            service,
            store,
            lock,
        })
    }

    /// Persist the store after a command changed it.
    pub async fn save(&self) -> Result<()> {
        snapshot::save(&self.store, &self.lock).await
    }
}

pub fn teacher(id: TeacherId) -> Principal {
    Principal::Teacher {
        id,
        name: format!("teacher {id}"),
    }
}

pub fn student(id: LearnerId) -> Principal {
    Principal::Student {
        id,
        name: format!("learner {id}"),
        class_id: None,
    }
}
