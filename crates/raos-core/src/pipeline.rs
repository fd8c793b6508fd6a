use crate::cache::ExtractionCache;
use crate::config::PipelineConfig;
use crate::error::{RaosError, Result};
use crate::extraction::Extractor;
use crate::gate::ConcurrencyGate;
use crate::mockup::MockupGenerator;
use crate::requirement::{RecordEdit, RequirementRecord};
use crate::store::{ListQuery, Page, RecordStore};
use crate::types::RecordState;
use completion_client::Completer;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Per-record locks
// ---------------------------------------------------------------------------

type RecordMutex = Arc<tokio::sync::Mutex<()>>;

/// One async mutex per record id, so two mutations of the same record never
/// race past the idempotence checks. Entries live only while some task holds
/// or waits on them.
#[derive(Default)]
struct RecordLocks {
    inner: Mutex<HashMap<Uuid, RecordMutex>>,
}

impl RecordLocks {
    async fn lock(&self, id: Uuid) -> RecordGuard<'_> {
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(map.entry(id).or_default())
        };
        let guard = Arc::clone(&mutex).lock_owned().await;
        RecordGuard {
            locks: self,
            id,
            mutex,
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Holds a record's mutex; evicts the map entry on drop when nobody else
/// holds or waits on it.
struct RecordGuard<'a> {
    locks: &'a RecordLocks,
    id: Uuid,
    mutex: RecordMutex,
    guard: Option<tokio::sync::OwnedMutexGuard<()>>,
}

impl Drop for RecordGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut map = self.locks.inner.lock().unwrap_or_else(PoisonError::into_inner);
        // The map entry and `self.mutex` are the only references left.
        let idle = map
            .get(&self.id)
            .is_some_and(|m| Arc::ptr_eq(m, &self.mutex) && Arc::strong_count(m) == 2);
        if idle {
            map.remove(&self.id);
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Drives records through `Created → Extracted → Completed`.
///
/// Both stages run under the shared [`ConcurrencyGate`]. Re-running a stage
/// whose output is already persisted returns that output without taking a
/// permit or calling the model. A failed stage writes nothing.
pub struct Pipeline {
    store: Arc<dyn RecordStore>,
    gate: ConcurrencyGate,
    extractor: Extractor,
    generator: MockupGenerator,
    locks: RecordLocks,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn RecordStore>,
        completer: Arc<dyn Completer>,
        cache: Arc<dyn ExtractionCache>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            store,
            gate: ConcurrencyGate::new(config.gate_capacity),
            extractor: Extractor::new(Arc::clone(&completer), cache, config.extraction_max_tokens),
            generator: MockupGenerator::new(completer, config.mockup_max_tokens, config.mockup_attempts),
            locks: RecordLocks::default(),
        }
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Run a store call on the blocking pool; file-backed stores do disk I/O.
    async fn with_store<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn RecordStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| RaosError::Io(std::io::Error::other(format!("task join error: {e}"))))?
    }

    // -----------------------------------------------------------------------
    // Record lifecycle
    // -----------------------------------------------------------------------

    /// Persist a new record in the `Created` state. No model call.
    pub fn create(&self, description: &str, owner_id: &str) -> Result<RequirementRecord> {
        let record = RequirementRecord::new(description.trim(), owner_id)?;
        self.store.create(&record)?;
        tracing::info!(id = %record.id, owner = owner_id, "requirement created");
        Ok(record)
    }

    pub fn get(&self, id: Uuid) -> Result<RequirementRecord> {
        self.store.get(id)
    }

    pub fn list(&self, query: &ListQuery) -> Result<Page<RequirementRecord>> {
        self.store.list(query)
    }

    /// Stage 1 for record `id`. Returns the record in the `Extracted` state
    /// (or later, if it was already past extraction).
    pub async fn run_extraction(&self, id: Uuid) -> Result<RequirementRecord> {
        let _guard = self.locks.lock(id).await;

        let record = self.with_store(move |s| s.get(id)).await?;
        if record.state() != RecordState::Created {
            tracing::debug!(%id, state = %record.state(), "extraction already present");
            return Ok(record);
        }

        let extraction = {
            let _permit = self.gate.acquire().await?;
            tracing::debug!(%id, in_flight = self.gate.in_flight(), "gate admitted extraction");
            self.extractor.extract(&record.description).await?
        };

        let app_name = extraction.app_name.clone();
        let record = self
            .with_store(move |s| s.save_extraction(id, &extraction))
            .await?;
        tracing::info!(%id, %app_name, "requirement extracted");
        Ok(record)
    }

    /// Stage 2 for record `id`. Returns the persisted markup.
    pub async fn run_mockup(&self, id: Uuid) -> Result<String> {
        let _guard = self.locks.lock(id).await;

        let record = self.with_store(move |s| s.get(id)).await?;
        match record.state() {
            RecordState::Created => {
                return Err(RaosError::InvalidTransition {
                    from: RecordState::Created,
                    to: RecordState::Completed,
                    reason: "run extraction before generating a mockup".into(),
                })
            }
            RecordState::Completed => {
                tracing::debug!(%id, "mockup already present");
                return Ok(record.mockup_markup.unwrap_or_default());
            }
            RecordState::Extracted => {}
        }

        let app_name = record.app_name.clone().unwrap_or_default();
        let raos = record.raos.clone().unwrap_or_default();
        let markup = {
            let _permit = self.gate.acquire().await?;
            tracing::debug!(%id, in_flight = self.gate.in_flight(), "gate admitted mockup");
            self.generator.generate(&app_name, &raos).await?
        };

        let record = self.with_store(move |s| s.save_mockup(id, &markup)).await?;
        let markup = record.mockup_markup.unwrap_or_default();
        tracing::info!(%id, bytes = markup.len(), "requirement completed");
        Ok(markup)
    }

    /// Owner edit of the extracted fields.
    pub async fn edit(&self, id: Uuid, owner_id: &str, edit: &RecordEdit) -> Result<RequirementRecord> {
        let _guard = self.locks.lock(id).await;
        let (owner, edit) = (owner_id.to_string(), edit.clone());
        let record = self
            .with_store(move |s| s.update_fields(id, &owner, &edit))
            .await?;
        tracing::info!(%id, owner = owner_id, "requirement edited");
        Ok(record)
    }

    pub async fn delete(&self, id: Uuid, owner_id: &str) -> Result<()> {
        let _guard = self.locks.lock(id).await;
        let owner = owner_id.to_string();
        self.with_store(move |s| s.delete(id, &owner)).await?;
        tracing::info!(%id, owner = owner_id, "requirement deleted");
        Ok(())
    }
}
