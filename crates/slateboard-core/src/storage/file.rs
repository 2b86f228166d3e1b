//! File-based persistence implementation for native platforms.

use super::{
    BoxFuture, DEFAULT_WHITEBOARD_NAME, Persistence, PersistenceError, PersistenceResult,
    Whiteboard, WhiteboardSummary, unix_millis, validate_elements,
};
use crate::element::Element;
use std::fs;
use std::path::PathBuf;
use uuid::Uuid;

/// File-based persistence for native platforms.
///
/// Stores whiteboards as JSON files in a specified directory, one file
/// per whiteboard.
pub struct FileStore {
    /// Base directory for whiteboard storage.
    base_path: PathBuf,
}

impl FileStore {
    /// Create a new file store with the given base directory.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(base_path: PathBuf) -> PersistenceResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                PersistenceError::Unavailable(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create a file store in the default location.
    ///
    /// On Unix: `~/.local/share/slateboard/whiteboards/`
    /// On Windows: `%APPDATA%\slateboard\whiteboards\`
    pub fn default_location() -> PersistenceResult<Self> {
        let base = dirs::data_local_dir().or_else(dirs::home_dir).ok_or_else(|| {
            PersistenceError::Unavailable("Could not determine home directory".to_string())
        })?;

        let path = base.join("slateboard").join("whiteboards");
        Self::new(path)
    }

    /// Get the file path for a whiteboard id.
    fn board_path(&self, id: &str) -> PathBuf {
        // Sanitize the id to be safe for filenames
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }

    /// Get the base path.
    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    fn read_board(&self, path: &PathBuf) -> PersistenceResult<Whiteboard> {
        let json = fs::read_to_string(path).map_err(|e| {
            PersistenceError::Unavailable(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let board: Whiteboard = serde_json::from_str(&json).map_err(|e| {
            PersistenceError::Validation(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        validate_elements(&board.elements)?;
        Ok(board)
    }

    fn write_board(&self, board: &Whiteboard) -> PersistenceResult<()> {
        let path = self.board_path(&board.id);
        let json = serde_json::to_string_pretty(board)
            .map_err(|e| PersistenceError::Validation(e.to_string()))?;
        fs::write(&path, json).map_err(|e| {
            PersistenceError::Unavailable(format!("Failed to write {}: {}", path.display(), e))
        })
    }
}

impl Persistence for FileStore {
    fn list(&self) -> BoxFuture<'_, PersistenceResult<Vec<WhiteboardSummary>>> {
        Box::pin(async move {
            if !self.base_path.exists() {
                return Ok(vec![]);
            }

            let entries = fs::read_dir(&self.base_path).map_err(|e| {
                PersistenceError::Unavailable(format!("Failed to read directory: {}", e))
            })?;

            let mut summaries = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e == "json").unwrap_or(false) {
                    // Skip files that fail to parse rather than failing
                    // the whole listing.
                    if let Ok(board) = self.read_board(&path) {
                        summaries.push(board.summary());
                    }
                }
            }
            summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(summaries)
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, PersistenceResult<Whiteboard>> {
        let path = self.board_path(id);
        let id_owned = id.to_string();

        Box::pin(async move {
            if !path.exists() {
                return Err(PersistenceError::NotFound(id_owned));
            }
            self.read_board(&path)
        })
    }

    fn save(
        &self,
        name: Option<&str>,
        elements: &[Element],
        existing_id: Option<&str>,
    ) -> BoxFuture<'_, PersistenceResult<Whiteboard>> {
        let name = name.map(str::to_string);
        let elements = elements.to_vec();
        let existing_id = existing_id.map(str::to_string);

        Box::pin(async move {
            validate_elements(&elements)?;
            let now = unix_millis();

            let board = if let Some(id) = existing_id {
                let path = self.board_path(&id);
                if !path.exists() {
                    return Err(PersistenceError::NotFound(id));
                }
                let mut board = self.read_board(&path)?;
                if let Some(name) = name {
                    board.name = name;
                }
                board.elements = elements;
                board.updated_at = now;
                board
            } else {
                Whiteboard {
                    id: Uuid::new_v4().to_string(),
                    name: name.unwrap_or_else(|| DEFAULT_WHITEBOARD_NAME.to_string()),
                    elements,
                    created_at: now,
                    updated_at: now,
                }
            };

            self.write_board(&board)?;
            Ok(board)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, PersistenceResult<()>> {
        let path = self.board_path(id);
        let id_owned = id.to_string();

        Box::pin(async move {
            if !path.exists() {
                return Err(PersistenceError::NotFound(id_owned));
            }
            fs::remove_file(&path).map_err(|e| {
                PersistenceError::Unavailable(format!(
                    "Failed to delete {}: {}",
                    path.display(),
                    e
                ))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::PathElement;
    use crate::storage::block_on;
    use kurbo::Point;
    use tempfile::tempdir;

    fn pencil() -> Element {
        Element::Pencil(PathElement::new(
            vec![Point::new(0.0, 0.0), Point::new(3.0, 4.0)],
            "#ff0000",
            2.0,
        ))
    }

    #[test]
    fn test_file_store_save_load() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        let saved = block_on(store.save(Some("Test Board"), &[pencil()], None)).unwrap();
        let loaded = block_on(store.load(&saved.id)).unwrap();

        assert_eq!(loaded, saved);
        assert_eq!(loaded.name, "Test Board");
    }

    #[test]
    fn test_file_store_not_found() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        let result = block_on(store.load("nonexistent"));
        assert!(matches!(result, Err(PersistenceError::NotFound(_))));
    }

    #[test]
    fn test_file_store_update_in_place() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        let created = block_on(store.save(Some("Board"), &[], None)).unwrap();
        let updated = block_on(store.save(None, &[pencil()], Some(&created.id))).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Board");
        assert_eq!(updated.created_at, created.created_at);

        let list = block_on(store.list()).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Board");
    }

    #[test]
    fn test_file_store_delete() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        let saved = block_on(store.save(None, &[], None)).unwrap();
        block_on(store.delete(&saved.id)).unwrap();

        assert!(matches!(
            block_on(store.load(&saved.id)),
            Err(PersistenceError::NotFound(_))
        ));
    }

    #[test]
    fn test_file_store_rejects_malformed_payload_on_load() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        fs::write(
            dir.path().join("broken.json"),
            r##"{"id":"broken","name":"x","elements":[{"type":"line","id":"l1","points":[{"x":0.0,"y":0.0}],"strokeColor":"#000000","strokeWidth":2.0}],"createdAt":0,"updatedAt":0}"##,
        )
        .unwrap();

        let result = block_on(store.load("broken"));
        assert!(matches!(result, Err(PersistenceError::Validation(_))));

        // The broken file must not poison the listing.
        assert!(block_on(store.list()).unwrap().is_empty());
    }

    #[test]
    fn test_file_store_sanitizes_id() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().to_path_buf()).unwrap();

        let path = store.board_path("test/board:with*special");
        let name = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(name, "test_board_with_special.json");
        assert_eq!(path.parent().unwrap(), dir.path());
    }
}
