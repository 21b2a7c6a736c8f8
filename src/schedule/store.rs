//! Persistence for standing order records.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::schedule::types::{RecurringPaymentSchedule, ScheduleStatus};

/// A thread-safe store of schedule records.
///
/// Records are never deleted; a finished or cancelled schedule is
/// soft-stopped and stays queryable.
#[derive(Clone, Default)]
pub struct ScheduleStore {
    inner: Arc<DashMap<Uuid, RecurringPaymentSchedule>>,
    persistence_path: Option<String>,
}

impl ScheduleStore {
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
            let map: std::collections::HashMap<Uuid, RecurringPaymentSchedule> =
                serde_json::from_reader(reader)?;

            for (k, v) in map {
                store.inner.insert(k, v);
            }
            tracing::info!("Loaded {} schedules from store file", store.inner.len());
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
            tracing::debug!("Saved {} schedules to store file", map.len());
        }
        Ok(())
    }

    /// Insert or replace a record.
    pub fn upsert(&self, schedule: RecurringPaymentSchedule) {
        self.inner.insert(schedule.id, schedule);
    }

    pub fn get(&self, id: &Uuid) -> Option<RecurringPaymentSchedule> {
        self.inner.get(id).map(|r| r.value().clone())
    }

    /// Schedules eligible for reconciliation: locally active with an
    /// external id. Paused schedules are deliberately excluded.
    pub fn reconcilable(&self) -> Vec<RecurringPaymentSchedule> {
        self.inner
            .iter()
            .filter(|r| {
                r.value().status == ScheduleStatus::Active && r.value().external_id.is_some()
            })
            .map(|r| r.value().clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.inner.len()
    }

    /// Counts by lifecycle bucket: (active, paused, stopped, degraded).
    pub fn status_summary(&self) -> (usize, usize, usize, usize) {
        let mut active = 0;
        let mut paused = 0;
        let mut stopped = 0;
        let mut degraded = 0;
        for r in self.inner.iter() {
            match r.value().status {
                ScheduleStatus::Active => active += 1,
                ScheduleStatus::Paused => paused += 1,
                ScheduleStatus::Stopped => stopped += 1,
                ScheduleStatus::ActivationFailed => degraded += 1,
                _ => {}
            }
        }
        (active, paused, stopped, degraded)
    }
}
