//! Supplement use-case service.
//!
//! # Responsibility
//! - Enforce existence and uniqueness rules around a storage-agnostic
//!   repository.
//! - Validate input and apply partial updates before any write.
//!
//! # Invariants
//! - Every operation issues one read and at most one write; nothing is
//!   retried or recovered locally.
//! - Validation of an update runs on the merged record, not on the patch.
//! - Absence is always reported as `NotFound`, never as an empty success.
//! - There is no locking between the read and the write. Two concurrent
//!   callers can both pass the existence check; the backend decides what
//!   happens next.

use crate::model::supplement::{Supplement, SupplementPatch, SupplementValidationError};
use crate::repo::supplement_repo::{RepoError, SupplementRepository};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for supplement use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// No supplement is stored under this gtin.
    NotFound(String),
    /// Create targeted an occupied gtin; carries the rejected payload.
    AlreadyExists(Box<Supplement>),
    /// Input (or the merged update) broke one or more field rules.
    InvalidSupplement(SupplementValidationError),
    /// Backend failure, passed through unchanged.
    Store(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(gtin) => write!(f, "{gtin}: supplement not found"),
            Self::AlreadyExists(supplement) => {
                write!(f, "{supplement:?}: supplement already exists")
            }
            Self::InvalidSupplement(err) => write!(f, "invalid supplement: {err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidSupplement(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::NotFound(_) | Self::AlreadyExists(_) => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Store(value)
    }
}

impl From<SupplementValidationError> for ServiceError {
    fn from(value: SupplementValidationError) -> Self {
        Self::InvalidSupplement(value)
    }
}

/// Supplement service facade over a repository implementation.
pub struct SupplementService<R: SupplementRepository> {
    repo: R,
}

impl<R: SupplementRepository> SupplementService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Stores a new supplement.
    ///
    /// # Errors
    /// - `InvalidSupplement` listing every violated rule.
    /// - `AlreadyExists` when the gtin is taken.
    /// - `Store` for backend failures.
    pub fn create(&self, supplement: &Supplement) -> ServiceResult<()> {
        if let Err(err) = supplement.validate() {
            warn!(
                "event=supplement_create module=service status=rejected gtin={:?} violations={}",
                supplement.gtin,
                err.violations.len()
            );
            return Err(err.into());
        }

        if self.repo.find_by_gtin(&supplement.gtin)?.is_some() {
            warn!(
                "event=supplement_create module=service status=conflict gtin={}",
                supplement.gtin
            );
            return Err(ServiceError::AlreadyExists(Box::new(supplement.clone())));
        }

        if let Err(err) = self.repo.create(supplement) {
            if err.is_duplicate_key() {
                // Another writer inserted the gtin after the existence check.
                warn!(
                    "event=supplement_create module=service status=race_lost gtin={}",
                    supplement.gtin
                );
            }
            return Err(err.into());
        }
        info!(
            "event=supplement_create module=service status=ok gtin={}",
            supplement.gtin
        );
        Ok(())
    }

    /// Gets one supplement by gtin.
    pub fn find_by_gtin(&self, gtin: &str) -> ServiceResult<Supplement> {
        self.require(gtin)
    }

    /// Applies a partial update to an existing supplement.
    ///
    /// # Errors
    /// - `NotFound` when nothing is stored under `gtin`.
    /// - `InvalidSupplement` when the merged record breaks a rule.
    /// - `Store` for backend failures.
    pub fn update(&self, gtin: &str, patch: &SupplementPatch) -> ServiceResult<()> {
        let current = self.require(gtin)?;
        let merged = current.apply_update(patch);

        if let Err(err) = merged.validate() {
            warn!(
                "event=supplement_update module=service status=rejected gtin={gtin} violations={}",
                err.violations.len()
            );
            return Err(err.into());
        }

        self.repo.update(&merged)?;
        info!(
            "event=supplement_update module=service status=ok gtin={gtin} noop={}",
            patch.is_empty()
        );
        Ok(())
    }

    /// Deletes an existing supplement.
    ///
    /// The repository receives the full stored record, not only the key.
    pub fn delete(&self, gtin: &str) -> ServiceResult<()> {
        let current = self.require(gtin)?;
        self.repo.delete(&current)?;
        info!("event=supplement_delete module=service status=ok gtin={gtin}");
        Ok(())
    }

    /// Lists every stored supplement. An empty store yields an empty vec.
    // TODO: pagination and filtering once a caller needs more than a full dump.
    pub fn list_all(&self) -> ServiceResult<Vec<Supplement>> {
        Ok(self.repo.list_all()?)
    }

    fn require(&self, gtin: &str) -> ServiceResult<Supplement> {
        match self.repo.find_by_gtin(gtin)? {
            Some(supplement) => Ok(supplement),
            None => {
                info!("event=supplement_lookup module=service status=not_found gtin={gtin:?}");
                Err(ServiceError::NotFound(gtin.to_string()))
            }
        }
    }
}
