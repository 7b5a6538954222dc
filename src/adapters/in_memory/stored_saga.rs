// Type-erased envelope for a saga snapshot held by the in memory store.
//
// One map holds every saga type. The envelope remembers the concrete type so lookups can
// filter by it and hand back a typed clone.

use crate::core::saga_data::{CorrelationValue, SagaData};
use std::any::{Any, TypeId};

pub(crate) trait ErasedSaga: Any + Send + Sync {
    fn revision(&self) -> u64;
    fn correlation_value(&self, property: &str) -> Option<CorrelationValue>;
    fn as_any(&self) -> &dyn Any;
}

impl<T: SagaData> ErasedSaga for T {
    fn revision(&self) -> u64 {
        SagaData::revision(self)
    }

    fn correlation_value(&self, property: &str) -> Option<CorrelationValue> {
        SagaData::correlation_value(self, property)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct StoredSaga {
    type_id: TypeId,
    type_name: &'static str,
    data: Box<dyn ErasedSaga>,
}

impl StoredSaga {
    /// Takes ownership of `saga`. Callers pass a clone, never the caller's own value.
    pub(crate) fn new<T: SagaData>(saga: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            data: Box::new(saga),
        }
    }

    pub(crate) fn is<T: SagaData>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn revision(&self) -> u64 {
        self.data.revision()
    }

    pub(crate) fn correlation_value(&self, property: &str) -> Option<CorrelationValue> {
        self.data.correlation_value(property)
    }

    /// Independent copy of the stored value, or `None` if it is not a `T`.
    pub(crate) fn snapshot<T: SagaData>(&self) -> Option<T> {
        self.data.as_any().downcast_ref::<T>().cloned()
    }
}

#[cfg(test)]
mod stored_saga_tests {
    use super::*;
    use crate::test_support::fixtures::sagas::order_saga::{
        OrderSaga, OrderSagaBuilder, ShipmentSaga,
    };
    use rstest::rstest;

    #[rstest]
    fn it_should_remember_the_concrete_type() {
        let stored = StoredSaga::new(OrderSagaBuilder::new().build());
        assert!(stored.is::<OrderSaga>());
        assert!(!stored.is::<ShipmentSaga>());
        assert!(stored.type_name().ends_with("OrderSaga"));
    }

    #[rstest]
    fn it_should_only_snapshot_as_the_stored_type() {
        let saga = OrderSagaBuilder::new().revision(3).build();
        let stored = StoredSaga::new(saga.clone());
        assert_eq!(stored.snapshot::<OrderSaga>(), Some(saga));
        assert_eq!(stored.snapshot::<ShipmentSaga>(), None);
        assert_eq!(stored.revision(), 3);
    }

    #[rstest]
    fn it_should_read_correlation_values_through_the_envelope() {
        let stored = StoredSaga::new(OrderSagaBuilder::new().order_number("ORD-7").build());
        assert_eq!(
            stored.correlation_value("order_number"),
            Some(CorrelationValue::from("ORD-7"))
        );
        assert_eq!(stored.correlation_value("unknown"), None);
    }
}
