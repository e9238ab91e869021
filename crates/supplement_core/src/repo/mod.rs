//! Supplement store contract and its backends.
//!
//! # Responsibility
//! - Define the CRUD contract the service is written against.
//! - Provide interchangeable relational (SQLite) and document (JSON file)
//!   implementations.
//!
//! # Invariants
//! - Repositories are plain accessors: no existence or uniqueness rules.
//! - "Not found" is `Ok(None)` here; the service turns it into an error.

pub mod document_repo;
pub mod supplement_repo;
