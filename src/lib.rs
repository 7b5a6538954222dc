// Crate entry point. Re-export modules so tests and binaries can import them easily.
//
// Responsibilities
// - Only declare and expose modules. No business logic here.
//
// How it is used
// - Hosts depend on `core::ports::SagaPersister` and wire in `InMemorySagaStore`.
// - Tests import modules from this crate root to reach the code under test.

pub mod core {
    pub mod ports;
    pub mod saga_data;
}

pub mod adapters {
    pub mod in_memory {
        pub mod in_memory_saga_store;
        mod stored_saga;
    }
}

pub mod application {
    pub mod errors;
    pub mod saga_handler;
}
