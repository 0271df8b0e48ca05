use airmark_core::persistence::WriteError;
use airmark_core::{DocumentWriter, EditorConfig};
use airmark_model::Document;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DOCUMENT_SCHEMA_VERSION: u32 = 1;
const CONFIG_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("unable to resolve local data directory")]
    NoDataDirectory,
    #[error("unsupported schema version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentEnvelope {
    version: u32,
    document: Document,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigEnvelope {
    version: u32,
    config: EditorConfig,
}

fn check_version(found: u32, expected: u32) -> Result<(), StorageError> {
    if found == expected {
        Ok(())
    } else {
        Err(StorageError::UnsupportedVersion { found, expected })
    }
}

/// Read a document saved by [`write_document`].
pub fn read_document(path: &Path) -> Result<Document, StorageError> {
    let bytes = fs::read(path)?;
    let envelope: DocumentEnvelope = serde_json::from_slice(&bytes)?;
    check_version(envelope.version, DOCUMENT_SCHEMA_VERSION)?;
    Ok(envelope.document)
}

/// Write `document` as versioned JSON, creating parent directories as needed.
pub fn write_document(document: &Document, path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let envelope = DocumentEnvelope { version: DOCUMENT_SCHEMA_VERSION, document: document.clone() };
    let bytes = serde_json::to_vec_pretty(&envelope)?;
    fs::write(path, bytes)?;
    tracing::debug!(path = %path.display(), pages = document.page_count(), "document written");
    Ok(())
}

/// [`DocumentWriter`] backed by [`write_document`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDocumentWriter;

impl DocumentWriter for JsonDocumentWriter {
    fn write(&self, document: &Document, path: &Path) -> Result<(), WriteError> {
        write_document(document, path).map_err(Into::into)
    }
}

/// Per-user application data (editor configuration).
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn from_default_project() -> Result<Self, StorageError> {
        let dirs =
            ProjectDirs::from("dev", "Airmark", "Airmark").ok_or(StorageError::NoDataDirectory)?;

        Ok(Self { root: dirs.data_local_dir().to_path_buf() })
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn load_config(&self) -> Result<EditorConfig, StorageError> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(EditorConfig::default());
        }

        let bytes = fs::read(path)?;
        let envelope: ConfigEnvelope = serde_json::from_slice(&bytes)?;
        check_version(envelope.version, CONFIG_SCHEMA_VERSION)?;

        Ok(envelope.config)
    }

    pub fn save_config(&self, config: &EditorConfig) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;

        let envelope = ConfigEnvelope { version: CONFIG_SCHEMA_VERSION, config: config.clone() };

        let bytes = serde_json::to_vec_pretty(&envelope)?;
        fs::write(self.config_path(), bytes)?;
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.json")
    }
}
