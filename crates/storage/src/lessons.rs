use std::path::Path;

use tracing::info;

use vocab_core::model::LessonCatalog;

use crate::repository::StorageError;

/// Read lesson content (`lesson id -> { questions: [...] }`) from a JSON file.
///
/// # Errors
///
/// Returns `StorageError::Io` if the file cannot be read and
/// `StorageError::Serialization` if it is not valid lesson content.
pub async fn load_catalog(path: &Path) -> Result<LessonCatalog, StorageError> {
    let bytes = tokio::fs::read(path).await?;
    let catalog = parse_catalog(&bytes)
        .map_err(|err| StorageError::Serialization(format!("{}: {err}", path.display())))?;
    info!(path = %path.display(), lessons = catalog.len(), "loaded lesson catalog");
    Ok(catalog)
}

/// Parse lesson content from JSON bytes.
///
/// # Errors
///
/// Returns the parse error if the bytes are not valid lesson content.
pub fn parse_catalog(bytes: &[u8]) -> Result<LessonCatalog, serde_json::Error> {
    serde_json::from_slice(bytes)
}
