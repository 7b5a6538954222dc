// Order fulfilment saga used by the demo binary.
//
// An order completes once it was placed, paid and every item shipped. Messages for one order
// arrive on different workers in any order, and any of them may start the saga.

use saga_store::adapters::in_memory::in_memory_saga_store::InMemorySagaStore;
use saga_store::application::errors::ApplicationError;
use saga_store::application::saga_handler::{
    HandleOutcome, Handled, RetryPolicy, SagaMessageHandler, SagaStep,
};
use saga_store::core::saga_data::{
    CorrelationProperty, CorrelationValue, SagaData, SagaId, new_saga_id,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const ORDER_NUMBER: &str = "order_number";

pub type OrderHandler = SagaMessageHandler<InMemorySagaStore, OrderFulfilment>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFulfilment {
    pub id: SagaId,
    pub revision: u64,
    pub order_number: String,
    pub expected_items: Option<u32>,
    pub shipped_items: u32,
    pub paid: bool,
}

impl OrderFulfilment {
    pub fn new(order_number: &str) -> Self {
        Self {
            id: new_saga_id(),
            revision: 0,
            order_number: order_number.to_string(),
            expected_items: None,
            shipped_items: 0,
            paid: false,
        }
    }

    pub fn apply(&mut self, message: &OrderMessage) -> SagaStep {
        match message {
            OrderMessage::Placed { items, .. } => self.expected_items = Some(*items),
            OrderMessage::PaymentReceived { .. } => self.paid = true,
            OrderMessage::ItemShipped { .. } => self.shipped_items += 1,
        }
        match self.expected_items {
            Some(expected) if self.paid && self.shipped_items >= expected => SagaStep::Complete,
            _ => SagaStep::Continue,
        }
    }
}

impl SagaData for OrderFulfilment {
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
            ORDER_NUMBER => Some(CorrelationValue::from(&self.order_number)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderMessage {
    Placed { order_number: String, items: u32 },
    PaymentReceived { order_number: String },
    ItemShipped { order_number: String },
}

impl OrderMessage {
    pub fn order_number(&self) -> &str {
        match self {
            OrderMessage::Placed { order_number, .. }
            | OrderMessage::PaymentReceived { order_number }
            | OrderMessage::ItemShipped { order_number } => order_number,
        }
    }
}

pub fn handler(store: Arc<InMemorySagaStore>, retry: RetryPolicy) -> OrderHandler {
    SagaMessageHandler::new(store, vec![CorrelationProperty::from(ORDER_NUMBER)], retry)
}

/// Every message needed to complete `orders` orders, with one to three items each.
pub fn messages(orders: u32) -> Vec<OrderMessage> {
    let mut messages = Vec::new();
    for n in 1..=orders {
        let order_number = format!("ORD-{n:05}");
        let items = 1 + n % 3;
        messages.push(OrderMessage::Placed {
            order_number: order_number.clone(),
            items,
        });
        messages.push(OrderMessage::PaymentReceived {
            order_number: order_number.clone(),
        });
        for _ in 0..items {
            messages.push(OrderMessage::ItemShipped {
                order_number: order_number.clone(),
            });
        }
    }
    messages
}

pub fn dispatch(
    handler: &OrderHandler,
    message: &OrderMessage,
) -> Result<Handled, ApplicationError> {
    let order_number = message.order_number();
    handler.handle(
        ORDER_NUMBER,
        &CorrelationValue::from(order_number),
        || Some(OrderFulfilment::new(order_number)),
        |saga| saga.apply(message),
    )
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub messages: u64,
    pub started: u64,
    pub updated: u64,
    pub completed: u64,
    pub retries: u64,
    pub remaining_sagas: usize,
}

impl RunSummary {
    pub fn record(&mut self, handled: Handled) {
        self.messages += 1;
        self.retries += u64::from(handled.attempts.saturating_sub(1));
        match handled.outcome {
            HandleOutcome::Started => self.started += 1,
            HandleOutcome::Updated => self.updated += 1,
            HandleOutcome::Completed => self.completed += 1,
            HandleOutcome::Ignored => {}
        }
    }
}
