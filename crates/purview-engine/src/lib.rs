//! The Purview reconciliation engine.
//!
//! Applies gazette documents to a [`purview_core::store::StructureStore`] in
//! published order: a base gazette seeds a lineage, each amendment stamps
//! provenance onto the ministers and items it touches, and snapshots
//! reconstruct the structure as of any applied gazette straight from those
//! stamps. Storage-agnostic; callers inject the adapter.
//!
//! # Quick start
//!
//! ```no_run
//! use purview_engine::Engine;
//! use purview_store_memory::MemoryStore;
//!
//! # async fn demo(base_json: &str, amendment_json: &str) -> purview_engine::Result<()> {
//! let engine = Engine::new(MemoryStore::new());
//! let base = engine.load_base_json(base_json).await?;
//! let outcome = engine.apply_amendment_json(amendment_json).await?;
//! println!(
//!   "{}: {} applied, {} skipped",
//!   outcome.gazette,
//!   outcome.applied,
//!   outcome.skipped.len(),
//! );
//! let snapshot = engine.snapshot(&base.gazette).await?;
//! println!("{} ministers active", snapshot.ministers.len());
//! # Ok(())
//! # }
//! ```

mod apply;
pub mod diff;
pub mod error;
pub mod matcher;
mod reconcile;
pub mod report;

pub use diff::{Snapshot, StructureDiff};
pub use error::{Error, Result};
pub use reconcile::{
  AmendmentOutcome, BaseOutcome, Engine, SkipReason, SkippedRecord,
};
pub use report::DiffDocument;

#[cfg(test)]
mod tests;
