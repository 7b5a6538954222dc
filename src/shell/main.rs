// Composition root.
//
// Responsibilities
// - Read config from environment.
// - Instantiate the in memory saga store and the order fulfilment handler.
// - Fan the demo messages out over concurrent workers and report what happened.

mod config;
mod order_workflow;

use config::ShellConfig;
use order_workflow::{RunSummary, dispatch, handler, messages};
use saga_store::adapters::in_memory::in_memory_saga_store::InMemorySagaStore;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = ShellConfig::from_env()?;
    tracing::info!(
        orders = config.orders,
        workers = config.workers,
        max_attempts = config.retry.max_attempts(),
        "starting saga workload"
    );

    let store = Arc::new(InMemorySagaStore::new());
    let handler = Arc::new(handler(store.clone(), config.retry));

    let mut queues = vec![Vec::new(); config.workers];
    for (i, message) in messages(config.orders).into_iter().enumerate() {
        queues[i % config.workers].push(message);
    }

    let mut workers = Vec::with_capacity(queues.len());
    for queue in queues {
        let handler = handler.clone();
        workers.push(tokio::task::spawn_blocking(move || {
            queue
                .iter()
                .map(|message| dispatch(&handler, message))
                .collect::<Result<Vec<_>, _>>()
        }));
    }

    let mut summary = RunSummary::default();
    for worker in workers {
        for handled in worker.await?? {
            summary.record(handled);
        }
    }
    summary.remaining_sagas = store.len();

    tracing::info!(
        completed = summary.completed,
        retries = summary.retries,
        remaining = summary.remaining_sagas,
        "saga workload finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
