// Shared saga fixtures for unit tests.
// Exposed under `crate::test_support::fixtures::sagas` only when compiling tests.

use crate::core::saga_data::{CorrelationValue, SagaData, SagaId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSaga {
    pub id: SagaId,
    pub revision: u64,
    pub order_number: String,
    pub customer_id: Option<u64>,
    pub lines: Vec<String>,
    pub paid: bool,
}

impl SagaData for OrderSaga {
    fn id(&self) -> SagaId {
        self.id
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }

    fn correlation_value(&self, property: &str) -> Option<CorrelationValue> {
        match property {
            "order_number" => Some(CorrelationValue::from(&self.order_number)),
            "customer_id" => Some(CorrelationValue::from(self.customer_id)),
            "paid" => Some(CorrelationValue::from(self.paid)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentSaga {
    pub id: SagaId,
    pub revision: u64,
    pub order_number: String,
}

impl SagaData for ShipmentSaga {
    fn id(&self) -> SagaId {
        self.id
    }

    fn revision(&self) -> u64 {
        self.revision
    }

    fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }

    fn correlation_value(&self, property: &str) -> Option<CorrelationValue> {
        match property {
            "order_number" => Some(CorrelationValue::from(&self.order_number)),
            _ => None,
        }
    }
}

pub struct OrderSagaBuilder {
    inner: OrderSaga,
}

impl Default for OrderSagaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl OrderSagaBuilder {
    pub fn new() -> Self {
        Self {
            inner: OrderSaga {
                id: Uuid::now_v7(),
                revision: 0,
                order_number: "ORD-0001".to_string(),
                customer_id: Some(1001),
                lines: vec!["sku-0001".to_string()],
                paid: false,
            },
        }
    }

    pub fn id(mut self, v: SagaId) -> Self {
        self.inner.id = v;
        self
    }

    pub fn revision(mut self, v: u64) -> Self {
        self.inner.revision = v;
        self
    }

    pub fn order_number(mut self, v: impl Into<String>) -> Self {
        self.inner.order_number = v.into();
        self
    }

    pub fn customer_id(mut self, v: Option<u64>) -> Self {
        self.inner.customer_id = v;
        self
    }

    pub fn lines(mut self, v: Vec<String>) -> Self {
        self.inner.lines = v;
        self
    }

    pub fn paid(mut self, v: bool) -> Self {
        self.inner.paid = v;
        self
    }

    pub fn build(self) -> OrderSaga {
        self.inner
    }
}

pub fn make_shipment_saga(order_number: &str) -> ShipmentSaga {
    ShipmentSaga {
        id: Uuid::now_v7(),
        revision: 0,
        order_number: order_number.to_string(),
    }
}

#[cfg(test)]
mod order_saga_builder_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn default_delegates_to_new() {
        let built = OrderSagaBuilder::default().build();
        assert!(!built.id.is_nil());
        assert_eq!(built.revision, 0);
        assert_eq!(built.order_number, "ORD-0001");
        assert_eq!(built.customer_id, Some(1001));
    }

    #[rstest]
    fn setters_override_fields_and_build_returns_inner() {
        let id = Uuid::now_v7();
        let custom = OrderSagaBuilder::new()
            .id(id)
            .revision(4)
            .order_number("ORD-0042")
            .customer_id(None)
            .lines(vec!["a".into(), "b".into()])
            .paid(true)
            .build();

        assert_eq!(custom.id, id);
        assert_eq!(custom.revision, 4);
        assert_eq!(custom.order_number, "ORD-0042");
        assert_eq!(custom.customer_id, None);
        assert_eq!(custom.lines, vec!["a", "b"]);
        assert!(custom.paid);
    }

    #[rstest]
    fn it_should_expose_declared_correlation_fields_only() {
        let saga = OrderSagaBuilder::new().customer_id(None).build();
        assert_eq!(
            saga.correlation_value("order_number"),
            Some(CorrelationValue::from("ORD-0001"))
        );
        assert_eq!(saga.correlation_value("customer_id"), Some(CorrelationValue::Null));
        assert_eq!(saga.correlation_value("lines"), None);
    }
}
