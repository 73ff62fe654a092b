// ── Fleet aggregate ──
//
// Owns one runtime record per configured unit, each behind its own async
// mutex, plus the published snapshot that display collaborators watch.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use indexmap::IndexMap;
use obsfleet_api::UnitClient;
use tokio::sync::{Mutex, MutexGuard, watch};

use crate::directory::UnitDirectory;
use crate::error::CoreError;
use crate::model::{Unit, UnitRuntimeState, UnitSnapshot};

/// Everything the fleet holds for one unit.
pub struct UnitHandle {
    unit: Arc<Unit>,
    client: UnitClient,
    state: Mutex<UnitRuntimeState>,
}

impl UnitHandle {
    pub fn unit(&self) -> &Arc<Unit> {
        &self.unit
    }

    pub fn name(&self) -> &str {
        &self.unit.name
    }

    pub fn client(&self) -> &UnitClient {
        &self.client
    }

    /// Lock this unit's runtime record. Other units are unaffected.
    pub async fn lock(&self) -> MutexGuard<'_, UnitRuntimeState> {
        self.state.lock().await
    }
}

/// Per-unit runtime records plus the reactive snapshot.
///
/// Mutations happen under the unit's own mutex; after each one the owner
/// calls [`publish`](Self::publish) with the new record, which rebuilds the
/// snapshot in directory order and notifies subscribers.
pub struct Fleet {
    directory: Arc<UnitDirectory>,
    handles: IndexMap<String, Arc<UnitHandle>>,
    /// Last published record per unit, keyed by name.
    published: DashMap<String, UnitRuntimeState>,
    snapshot: watch::Sender<Arc<Vec<UnitSnapshot>>>,
}

impl Fleet {
    /// Build the fleet. All units share one HTTP connection pool.
    pub fn new(
        directory: Arc<UnitDirectory>,
        http: &reqwest::Client,
        timeout: Duration,
    ) -> Result<Self, CoreError> {
        let mut handles = IndexMap::with_capacity(directory.len());
        let published = DashMap::with_capacity(directory.len());

        for unit in directory.iter() {
            let client = UnitClient::with_client(http.clone(), unit.base_url()?, timeout);
            let handle = UnitHandle {
                unit: Arc::clone(unit),
                client,
                state: Mutex::new(UnitRuntimeState::default()),
            };
            handles.insert(unit.name.clone(), Arc::new(handle));
            published.insert(unit.name.clone(), UnitRuntimeState::default());
        }

        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        let fleet = Self {
            directory,
            handles,
            published,
            snapshot,
        };
        fleet.rebuild_snapshot();
        Ok(fleet)
    }

    pub fn directory(&self) -> &UnitDirectory {
        &self.directory
    }

    /// Look up a unit's handle by name.
    pub fn handle(&self, name: &str) -> Result<&Arc<UnitHandle>, CoreError> {
        self.handles.get(name).ok_or_else(|| CoreError::UnitNotFound {
            name: name.to_owned(),
        })
    }

    /// Handles in directory order.
    pub fn handles(&self) -> impl Iterator<Item = &Arc<UnitHandle>> {
        self.handles.values()
    }

    /// Record `state` as the current view of `name` and notify subscribers.
    pub fn publish(&self, name: &str, state: &UnitRuntimeState) {
        self.published.insert(name.to_owned(), state.clone());
        self.rebuild_snapshot();
    }

    /// Current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Vec<UnitSnapshot>> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<UnitSnapshot>>> {
        self.snapshot.subscribe()
    }

    /// Last published view of one unit.
    pub fn unit_snapshot(&self, name: &str) -> Result<UnitSnapshot, CoreError> {
        let unit = self.directory.get(name).ok_or_else(|| CoreError::UnitNotFound {
            name: name.to_owned(),
        })?;
        let state = self
            .published
            .get(name)
            .map(|r| r.value().clone())
            .unwrap_or_default();
        Ok(UnitSnapshot::new(Arc::clone(unit), state))
    }

    /// Rebuild the snapshot from the published records.
    ///
    /// Reading the records happens inside the watch lock, so concurrent
    /// publishers are serialized and the last send always sees every insert
    /// made before it.
    fn rebuild_snapshot(&self) {
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot
            .send_modify(|snap| *snap = Arc::new(self.collect_units()));
    }

    fn collect_units(&self) -> Vec<UnitSnapshot> {
        self.directory
            .iter()
            .map(|unit| {
                let state = self
                    .published
                    .get(&unit.name)
                    .map(|r| r.value().clone())
                    .unwrap_or_default();
                UnitSnapshot::new(Arc::clone(unit), state)
            })
            .collect()
    }
}
