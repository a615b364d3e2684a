//! Persistence providers.

pub mod local;

pub use local::{LocalPersister, PersistMode};
