//! Persistence collaborator boundary
//!
//! The engine never reads or writes bytes itself. The `Save` command hands
//! the document to whatever [`DocumentWriter`] the engine was given.

use airmark_model::Document;
use std::path::Path;

/// Error type returned by writers; any error is acceptable since failures are only logged.
pub type WriteError = Box<dyn std::error::Error + Send + Sync>;

/// Serializes a document to storage.
pub trait DocumentWriter {
    fn write(&self, document: &Document, path: &Path) -> Result<(), WriteError>;
}
