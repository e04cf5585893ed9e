//! Change notification channel.
//!
//! # Responsibility
//! - Let observers learn that data behind a locator changed.
//! - Keep delivery decoupled from the write that triggered it.

pub mod channel;

pub use channel::{ChangeEvent, ChangeNotifier, Subscription};
