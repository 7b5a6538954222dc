// Saga message handler orchestrates one message against the saga store.
//
// Responsibilities
// - Locate the saga instance by the message's correlation value, or start a new one.
// - Apply the message to the saga state.
// - Persist with insert, update or delete under optimistic concurrency.
// - Repeat the whole cycle from the lookup when the write lost a race.

use crate::application::errors::ApplicationError;
use crate::core::ports::{SagaPersister, SagaStoreError};
use crate::core::saga_data::{CorrelationProperty, CorrelationValue, SagaData};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

/// What the saga wants after a message has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SagaStep {
    Continue,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    Started,
    Updated,
    Completed,
    /// No saga matched and the message does not start one.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handled {
    pub outcome: HandleOutcome,
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    /// At least one attempt is always made.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS)
    }
}

pub struct SagaMessageHandler<TStore, TSaga>
where
    TStore: SagaPersister + 'static,
    TSaga: SagaData,
{
    store: Arc<TStore>,
    correlation: Vec<CorrelationProperty>,
    retry: RetryPolicy,
    _saga: PhantomData<fn() -> TSaga>,
}

impl<TStore, TSaga> SagaMessageHandler<TStore, TSaga>
where
    TStore: SagaPersister + 'static,
    TSaga: SagaData,
{
    pub fn new(
        store: Arc<TStore>,
        correlation: Vec<CorrelationProperty>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store,
            correlation,
            retry,
            _saga: PhantomData,
        }
    }

    /// `start` is asked for a fresh saga when nothing matches; returning `None` ignores the
    /// message. `apply` may run several times, once per attempt, always on a fresh copy.
    ///
    /// Completion deletes by id without a revision check. An update that lands between this
    /// attempt's lookup and its delete is discarded together with the saga.
    pub fn handle<S, A>(
        &self,
        property: &str,
        value: &CorrelationValue,
        start: S,
        apply: A,
    ) -> Result<Handled, ApplicationError>
    where
        S: Fn() -> Option<TSaga>,
        A: Fn(&mut TSaga) -> SagaStep,
    {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.attempt(property, value, &start, &apply) {
                Ok(outcome) => {
                    debug!(property, value = %value, ?outcome, attempts, "saga message handled");
                    return Ok(Handled { outcome, attempts });
                }
                Err(err) if Self::should_retry(&err) => {
                    if attempts >= self.retry.max_attempts() {
                        warn!(
                            property,
                            value = %value,
                            attempts,
                            error = %err,
                            "saga retries exhausted"
                        );
                        return Err(ApplicationError::RetriesExhausted {
                            attempts,
                            last: err,
                        });
                    }
                    debug!(
                        property,
                        value = %value,
                        attempts,
                        error = %err,
                        "retrying saga message"
                    );
                }
                Err(err) => return Err(ApplicationError::Store(err)),
            }
        }
    }

    fn attempt<S, A>(
        &self,
        property: &str,
        value: &CorrelationValue,
        start: &S,
        apply: &A,
    ) -> Result<HandleOutcome, SagaStoreError>
    where
        S: Fn() -> Option<TSaga>,
        A: Fn(&mut TSaga) -> SagaStep,
    {
        match self.store.find::<TSaga>(property, value)? {
            Some(mut saga) => match apply(&mut saga) {
                SagaStep::Continue => {
                    self.store.update(&mut saga, &self.correlation)?;
                    Ok(HandleOutcome::Updated)
                }
                SagaStep::Complete => {
                    self.store.delete(&saga)?;
                    Ok(HandleOutcome::Completed)
                }
            },
            None => {
                let Some(mut saga) = start() else {
                    return Ok(HandleOutcome::Ignored);
                };
                match apply(&mut saga) {
                    SagaStep::Continue => {
                        self.store.insert(&saga, &self.correlation)?;
                        Ok(HandleOutcome::Started)
                    }
                    // Finished within its first message, so it is never stored.
                    SagaStep::Complete => Ok(HandleOutcome::Completed),
                }
            }
        }
    }

    fn should_retry(err: &SagaStoreError) -> bool {
        err.is_retryable() || matches!(err, SagaStoreError::DuplicateId { .. })
    }
}
