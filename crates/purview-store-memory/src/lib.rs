//! In-memory [`purview_core::store::StructureStore`] adapter.
//!
//! Backs the full store contract with hash maps behind a mutex. Nothing is
//! persisted; intended for tests, demos, and environments without a database.
//! Clones share the same underlying state.

mod store;

pub use store::MemoryStore;
