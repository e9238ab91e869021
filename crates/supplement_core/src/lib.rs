//! Core domain logic for the supplement records service.
//! This crate is the single source of truth for supplement invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::supplement::{
    PatchDocument, PatchError, PatchField, Supplement, SupplementPatch,
    SupplementValidationError, SupplementViolation,
};
pub use repo::document_repo::DocumentSupplementRepository;
pub use repo::supplement_repo::{
    RepoError, RepoResult, SqliteSupplementRepository, SupplementRepository,
};
pub use service::supplement_service::{ServiceError, ServiceResult, SupplementService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
