//! Document-store backend: one JSON collection file of supplement documents.
//!
//! # Responsibility
//! - Persist supplements as self-describing JSON documents, one per record.
//! - Offer the same contract as the relational backend.
//!
//! # Invariants
//! - A missing collection file is an empty collection.
//! - The file is only replaced whole: every write stages into its own
//!   uniquely named temp file next to the collection and renames it over the
//!   collection. Concurrent writers may lose updates, never the file.
//! - At most one document per `gtin` (enforced on insert, like a unique index).
//!
//! # Storage format
//! ```text
//! supplements.json   # JSON array of supplement documents
//! ```

use crate::model::supplement::Supplement;
use crate::repo::supplement_repo::{RepoError, RepoResult, SupplementRepository};
use log::debug;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// JSON-file document collection of supplements.
#[derive(Debug, Clone)]
pub struct DocumentSupplementRepository {
    path: PathBuf,
}

impl DocumentSupplementRepository {
    /// Uses `path` as the collection file. Nothing is touched until the first
    /// call; parent directories are created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the collection file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> RepoResult<Vec<Supplement>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let documents: Vec<Supplement> = serde_json::from_str(&content)?;
        for document in &documents {
            document.validate().map_err(|err| {
                RepoError::InvalidData(format!(
                    "document `{}` in {}: {err}",
                    document.gtin,
                    self.path.display()
                ))
            })?;
        }
        Ok(documents)
    }

    fn store(&self, documents: &[Supplement]) -> RepoResult<()> {
        let dir = self.collection_dir();
        fs::create_dir_all(dir)?;

        let mut staging = NamedTempFile::new_in(dir)?;
        staging.write_all(serde_json::to_string_pretty(documents)?.as_bytes())?;
        staging
            .persist(&self.path)
            .map_err(|err| RepoError::Io(err.error))?;

        debug!(
            "event=document_store_write module=repo status=ok documents={} path={}",
            documents.len(),
            self.path.display()
        );
        Ok(())
    }

    // Staging must share the collection's filesystem for the rename to be atomic.
    fn collection_dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }
}

impl SupplementRepository for DocumentSupplementRepository {
    fn find_by_gtin(&self, gtin: &str) -> RepoResult<Option<Supplement>> {
        Ok(self
            .load()?
            .into_iter()
            .find(|document| document.gtin == gtin))
    }

    fn create(&self, supplement: &Supplement) -> RepoResult<()> {
        let mut documents = self.load()?;
        if documents.iter().any(|document| document.gtin == supplement.gtin) {
            return Err(RepoError::DuplicateKey(supplement.gtin.clone()));
        }

        documents.push(supplement.clone());
        self.store(&documents)
    }

    fn update(&self, supplement: &Supplement) -> RepoResult<()> {
        let mut documents = self.load()?;
        // Zero matches is a silent no-op, like a replace with an unmatched filter.
        let Some(slot) = documents
            .iter_mut()
            .find(|document| document.gtin == supplement.gtin)
        else {
            return Ok(());
        };

        *slot = supplement.clone();
        self.store(&documents)
    }

    fn delete(&self, supplement: &Supplement) -> RepoResult<()> {
        let mut documents = self.load()?;
        let before = documents.len();
        documents.retain(|document| document.gtin != supplement.gtin);
        if documents.len() == before {
            return Ok(());
        }

        self.store(&documents)
    }

    fn list_all(&self) -> RepoResult<Vec<Supplement>> {
        self.load()
    }
}

#[cfg(test)]
mod tests {
    use super::DocumentSupplementRepository;
    use std::path::Path;

    #[test]
    fn staging_happens_next_to_the_collection() {
        let repo = DocumentSupplementRepository::new("/var/lib/supplements/supplements.json");
        assert_eq!(repo.collection_dir(), Path::new("/var/lib/supplements"));
    }

    #[test]
    fn bare_file_name_stages_in_the_working_directory() {
        let repo = DocumentSupplementRepository::new("supplements.json");
        assert_eq!(repo.collection_dir(), Path::new("."));
    }
}
