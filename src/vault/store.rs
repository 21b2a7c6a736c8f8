//! Persistence for encrypted credential blob pairs.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::vault::cipher::EncryptedBlob;

/// The stored credential/session pair for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredBundle {
    pub credential: EncryptedBlob,
    pub session: EncryptedBlob,
}

/// A thread-safe store of one encrypted blob pair per user.
///
/// Pairs are only ever replaced wholesale; there is no partial update.
#[derive(Clone, Default)]
pub struct CredentialStore {
    inner: Arc<DashMap<Uuid, StoredBundle>>,
    persistence_path: Option<String>,
}

impl CredentialStore {
    /// Create a new empty store.
    pub fn new(persistence_path: Option<String>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            persistence_path,
        }
    }

    /// Load from file if it exists.
    pub fn load_from_file(path: &str) -> std::io::Result<Self> {
        let store = Self::new(Some(path.to_string()));
        if Path::new(path).exists() {
            let file = File::open(path)?;
            let reader = BufReader::new(file);
            let map: std::collections::HashMap<Uuid, StoredBundle> =
                serde_json::from_reader(reader)?;

            for (k, v) in map {
                store.inner.insert(k, v);
            }
            tracing::info!(
                "Loaded {} credential pairs from store file",
                store.inner.len()
            );
        }
        Ok(store)
    }

    /// Snapshot to file.
    pub fn save_to_file(&self) -> std::io::Result<()> {
        if let Some(path) = &self.persistence_path {
            let file = File::create(path)?;
            let writer = BufWriter::new(file);

            let map: std::collections::HashMap<_, _> = self
                .inner
                .iter()
                .map(|r| (*r.key(), r.value().clone()))
                .collect();

            serde_json::to_writer(writer, &map)?;
            tracing::debug!("Saved {} credential pairs to store file", map.len());
        }
        Ok(())
    }

    /// Replace a user's blob pair wholesale.
    pub fn put(&self, user: Uuid, credential: EncryptedBlob, session: EncryptedBlob) {
        self.inner.insert(
            user,
            StoredBundle {
                credential,
                session,
            },
        );
    }

    /// Fetch a user's blob pair.
    pub fn get(&self, user: &Uuid) -> Option<StoredBundle> {
        self.inner.get(user).map(|r| r.value().clone())
    }

    pub fn count(&self) -> usize {
        self.inner.len()
    }
}
