//! Supplement domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep validation and merge rules next to the data they protect.
//!
//! # Invariants
//! - Every supplement is identified by its immutable 13-digit `gtin`.
//! - Deletion is a hard delete; there are no tombstones or history.

pub mod supplement;
