//! Product domain model.
//!
//! # Responsibility
//! - Define table/column/type-code constants for the `products` table.
//! - Define write payloads and the field validation policy.
//!
//! # Invariants
//! - Every persisted row is identified by an engine-assigned `ProductId`.
//! - Deletion is physical; there is no tombstone state.

pub mod product;
pub mod values;
