//! Core use-case services.
//!
//! # Responsibility
//! - Turn repository CRUD into supplement use-cases with business checks.
//! - Keep adapters (CLI, HTTP, functions) decoupled from storage details.

pub mod supplement_service;
