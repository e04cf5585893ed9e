//! Resource locators and routing.
//!
//! # Responsibility
//! - Parse caller-facing locator strings into typed values.
//! - Classify locators into collection or item targets.

pub mod router;
pub mod uri;
