// Ports define what the orchestration engine needs from saga storage, without implementing it.
//
// Purpose
// - Describe the storage capability as a trait so handlers can be tested against any store.
//
// Boundaries
// - No concrete storage here. Adapters implement `SagaPersister` in the adapters layer.
// - Operations are synchronous. Stores never await while holding their lock.

use crate::core::saga_data::{CorrelationProperty, CorrelationValue, SagaData, SagaId};
use thiserror::Error;

/// A lost optimistic-concurrency race. Callers are expected to retry from a fresh lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConcurrencyViolation {
    #[error("correlation value '{value}' of '{property}' is already used by saga {existing_id}")]
    CorrelationCollision {
        property: String,
        value: CorrelationValue,
        existing_id: SagaId,
    },

    #[error("stale revision for saga {id}: expected {expected}, actual {actual}")]
    StaleRevision { id: SagaId, expected: u64, actual: u64 },
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SagaStoreError {
    #[error("saga of type {type_name} has no identifier")]
    IdentifierMissing { type_name: &'static str },

    #[error("saga {id} already exists")]
    DuplicateId { id: SagaId },

    #[error("saga {id} must be inserted with revision 0, got {revision}")]
    InvalidRevision { id: SagaId, revision: u64 },

    #[error("saga {id} not found")]
    NotFound { id: SagaId },

    #[error(transparent)]
    ConcurrencyViolation(#[from] ConcurrencyViolation),

    #[error("saga type {type_name} does not expose correlation property '{property}'")]
    UnknownCorrelationProperty {
        type_name: &'static str,
        property: String,
    },

    #[error("saga {id} is stored as {stored}, not {supplied}")]
    TypeMismatch {
        id: SagaId,
        stored: &'static str,
        supplied: &'static str,
    },

    /// Storage failure of an adapter with a fallible backend. The in-memory store never raises it.
    #[error("backend error: {0}")]
    Backend(String),
}

impl SagaStoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SagaStoreError::ConcurrencyViolation(_))
    }
}

pub trait SagaPersister: Send + Sync {
    /// Returns the first stored saga of type `T` whose `property` renders to the same string as
    /// `value`. `Null` renders as the empty string.
    fn find<T: SagaData>(
        &self,
        property: &str,
        value: &CorrelationValue,
    ) -> Result<Option<T>, SagaStoreError>;

    fn get<T: SagaData>(&self, id: SagaId) -> Result<Option<T>, SagaStoreError>;

    fn insert<T: SagaData>(
        &self,
        saga: &T,
        correlation: &[CorrelationProperty],
    ) -> Result<(), SagaStoreError>;

    /// On success the caller's `saga` has its revision advanced to match the stored copy.
    fn update<T: SagaData>(
        &self,
        saga: &mut T,
        correlation: &[CorrelationProperty],
    ) -> Result<(), SagaStoreError>;

    fn delete<T: SagaData>(&self, saga: &T) -> Result<(), SagaStoreError>;
}

/// Identifier precondition shared by every write.
pub fn require_id<T: SagaData>(saga: &T) -> Result<SagaId, SagaStoreError> {
    let id = saga.id();
    if id.is_nil() {
        return Err(SagaStoreError::IdentifierMissing {
            type_name: std::any::type_name::<T>(),
        });
    }
    Ok(id)
}

#[cfg(test)]
mod saga_store_ports_tests {
    use super::*;
    use crate::test_support::fixtures::sagas::order_saga::{OrderSaga, OrderSagaBuilder};
    use rstest::rstest;
    use uuid::Uuid;

    #[rstest]
    fn it_should_return_the_identifier_when_present() {
        let saga = OrderSagaBuilder::new().build();
        assert_eq!(require_id(&saga).unwrap(), saga.id);
    }

    #[rstest]
    fn it_should_reject_a_nil_identifier() {
        let saga = OrderSagaBuilder::new().id(Uuid::nil()).build();
        let result = require_id(&saga);
        assert!(matches!(
            result,
            Err(SagaStoreError::IdentifierMissing { type_name })
                if type_name == std::any::type_name::<OrderSaga>()
        ));
    }

    #[rstest]
    #[case(SagaStoreError::NotFound { id: Uuid::nil() }, false)]
    #[case(SagaStoreError::DuplicateId { id: Uuid::nil() }, false)]
    #[case(SagaStoreError::InvalidRevision { id: Uuid::nil(), revision: 3 }, false)]
    #[case(SagaStoreError::Backend("disk full".into()), false)]
    #[case(
        SagaStoreError::from(ConcurrencyViolation::StaleRevision {
            id: Uuid::nil(),
            expected: 0,
            actual: 1,
        }),
        true
    )]
    fn it_should_only_retry_concurrency_violations(
        #[case] error: SagaStoreError,
        #[case] retryable: bool,
    ) {
        assert_eq!(error.is_retryable(), retryable);
    }

    #[rstest]
    fn it_should_name_the_colliding_property_value_and_owner() {
        let existing_id = Uuid::parse_str("6f1c5b9e-4c1a-4d8e-9f0a-2b3c4d5e6f70").unwrap();
        let error = SagaStoreError::from(ConcurrencyViolation::CorrelationCollision {
            property: "order_number".into(),
            value: CorrelationValue::from("ABC"),
            existing_id,
        });
        assert_eq!(
            error.to_string(),
            format!(
                "correlation value 'ABC' of 'order_number' is already used by saga {existing_id}"
            )
        );
    }
}
