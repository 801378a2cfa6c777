//! Regex rule engine for numeric and identifier entities
//!
//! Rules run in a fixed priority order so that broad patterns (bank cards)
//! never claim digits already owned by precise ones (ID numbers).

pub mod pattern;
pub mod scanner;

pub use pattern::{Boundary, BoundedPattern};
pub use scanner::RuleScanner;
