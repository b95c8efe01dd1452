//! Persistence collaborator for Tempwatch
//!
//! Consumes batch outcomes as opaque `(description, value)` pairs and keeps
//! one row per location per day. The aggregation engine knows nothing about
//! this crate; the app hands it successful batches only.

pub mod store;

pub use store::{SqliteStorage, Storage, StorageError, TemperatureRecord};
