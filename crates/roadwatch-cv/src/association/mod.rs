//! Violation association

pub mod dedup;
pub mod engine;

pub use dedup::ViolationDeduplicator;
pub use engine::{AssociationEngine, ViolationRecord};
