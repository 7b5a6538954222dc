// In memory implementation of the SagaPersister port.
//
// Purpose
// - Reference store for hosts and tests that do not need durability. All data is lost on restart.
//
// Responsibilities
// - Keep one snapshot per saga id, across all saga types.
// - Enforce correlation uniqueness and optimistic concurrency by revision.
// - Copy values on the way in and on the way out so callers never share state with the store.
//
// Every operation runs under a single lock. Uniqueness is checked by scanning the whole map,
// so the check and the write must see the same snapshot.

use crate::adapters::in_memory::stored_saga::StoredSaga;
use crate::core::ports::{ConcurrencyViolation, SagaPersister, SagaStoreError, require_id};
use crate::core::saga_data::{CorrelationProperty, CorrelationValue, SagaData, SagaId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace, warn};

type SagaMap = HashMap<SagaId, StoredSaga>;

#[derive(Default)]
pub struct InMemorySagaStore {
    sagas: Mutex<SagaMap>,
}

impl InMemorySagaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every stored saga.
    pub fn clear(&self) {
        self.lock().clear();
    }

    // Checks never mutate and the map is written last, so a panic inside a record's
    // `clone` or `correlation_value` leaves it consistent. The guard is taken back on poison.
    fn lock(&self) -> MutexGuard<'_, SagaMap> {
        self.sagas.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fails when another saga of the same type already holds one of the declared correlation
/// values. The saga with `id` itself is skipped so unchanged values can be saved again.
fn ensure_unique_correlation<T: SagaData>(
    sagas: &SagaMap,
    id: SagaId,
    saga: &T,
    correlation: &[CorrelationProperty],
) -> Result<(), SagaStoreError> {
    for property in correlation {
        let value = saga.correlation_value(property.name()).ok_or_else(|| {
            SagaStoreError::UnknownCorrelationProperty {
                type_name: std::any::type_name::<T>(),
                property: property.name().to_string(),
            }
        })?;
        if value.is_null() {
            continue;
        }

        let collision = sagas.iter().find(|(other_id, stored)| {
            **other_id != id
                && stored.is::<T>()
                && stored.correlation_value(property.name()).as_ref() == Some(&value)
        });

        if let Some((existing_id, _)) = collision {
            warn!(
                saga_id = %id,
                existing_id = %existing_id,
                property = property.name(),
                value = %value,
                "correlation collision"
            );
            return Err(ConcurrencyViolation::CorrelationCollision {
                property: property.name().to_string(),
                value,
                existing_id: *existing_id,
            }
            .into());
        }
    }
    Ok(())
}

impl SagaPersister for InMemorySagaStore {
    fn find<T: SagaData>(
        &self,
        property: &str,
        value: &CorrelationValue,
    ) -> Result<Option<T>, SagaStoreError> {
        let needle = value.to_string();
        let guard = self.lock();
        let found = guard
            .values()
            .filter(|stored| stored.is::<T>())
            .find(|stored| {
                stored
                    .correlation_value(property)
                    .is_some_and(|candidate| candidate.to_string() == needle)
            })
            .and_then(StoredSaga::snapshot::<T>);
        trace!(property, value = %needle, found = found.is_some(), "find saga");
        Ok(found)
    }

    fn get<T: SagaData>(&self, id: SagaId) -> Result<Option<T>, SagaStoreError> {
        let guard = self.lock();
        Ok(guard.get(&id).and_then(StoredSaga::snapshot::<T>))
    }

    fn insert<T: SagaData>(
        &self,
        saga: &T,
        correlation: &[CorrelationProperty],
    ) -> Result<(), SagaStoreError> {
        let id = require_id(saga)?;
        let mut guard = self.lock();

        if guard.contains_key(&id) {
            warn!(saga_id = %id, "duplicate saga id");
            return Err(SagaStoreError::DuplicateId { id });
        }
        ensure_unique_correlation(&guard, id, saga, correlation)?;
        if saga.revision() != 0 {
            return Err(SagaStoreError::InvalidRevision {
                id,
                revision: saga.revision(),
            });
        }

        guard.insert(id, StoredSaga::new(saga.clone()));
        let saga_type = std::any::type_name::<T>();
        debug!(saga_id = %id, saga_type, "saga inserted");
        Ok(())
    }

    fn update<T: SagaData>(
        &self,
        saga: &mut T,
        correlation: &[CorrelationProperty],
    ) -> Result<(), SagaStoreError> {
        let id = require_id(saga)?;
        let mut guard = self.lock();

        let stored = guard.get(&id).ok_or(SagaStoreError::NotFound { id })?;
        if !stored.is::<T>() {
            return Err(SagaStoreError::TypeMismatch {
                id,
                stored: stored.type_name(),
                supplied: std::any::type_name::<T>(),
            });
        }
        let actual = stored.revision();

        ensure_unique_correlation(&guard, id, saga, correlation)?;
        if actual != saga.revision() {
            warn!(saga_id = %id, expected = saga.revision(), actual, "stale saga revision");
            return Err(ConcurrencyViolation::StaleRevision {
                id,
                expected: saga.revision(),
                actual,
            }
            .into());
        }

        let next = actual + 1;
        let mut copy = saga.clone();
        copy.set_revision(next);
        guard.insert(id, StoredSaga::new(copy));
        saga.set_revision(next);
        debug!(saga_id = %id, revision = next, "saga updated");
        Ok(())
    }

    fn delete<T: SagaData>(&self, saga: &T) -> Result<(), SagaStoreError> {
        let id = require_id(saga)?;
        let mut guard = self.lock();
        if guard.remove(&id).is_none() {
            return Err(SagaStoreError::NotFound { id });
        }
        debug!(saga_id = %id, "saga deleted");
        Ok(())
    }
}
