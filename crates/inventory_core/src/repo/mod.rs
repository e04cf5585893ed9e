//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define data access contracts for the `products` table.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes accept only validated payloads.
//! - Repository APIs return row counts; zero is not an error.

pub mod product_repo;
