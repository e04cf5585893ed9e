//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate routing, validation, persistence and notification.
//! - Keep presentation-layer callers decoupled from storage details.

pub mod cursor;
pub mod product_service;
