//! In-memory persistence implementation.

use super::{
    BoxFuture, DEFAULT_WHITEBOARD_NAME, Persistence, PersistenceError, PersistenceResult,
    Whiteboard, WhiteboardSummary, unix_millis, validate_elements,
};
use crate::element::Element;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory persistence for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStore {
    boards: RwLock<HashMap<String, Whiteboard>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for MemoryStore {
    fn list(&self) -> BoxFuture<'_, PersistenceResult<Vec<WhiteboardSummary>>> {
        Box::pin(async move {
            let boards = self
                .boards
                .read()
                .map_err(|e| PersistenceError::Unavailable(format!("Lock error: {}", e)))?;
            let mut summaries: Vec<_> = boards.values().map(Whiteboard::summary).collect();
            summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(summaries)
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, PersistenceResult<Whiteboard>> {
        let id = id.to_string();
        Box::pin(async move {
            let boards = self
                .boards
                .read()
                .map_err(|e| PersistenceError::Unavailable(format!("Lock error: {}", e)))?;
            boards
                .get(&id)
                .cloned()
                .ok_or(PersistenceError::NotFound(id))
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
            let mut boards = self
                .boards
                .write()
                .map_err(|e| PersistenceError::Unavailable(format!("Lock error: {}", e)))?;
            let now = unix_millis();

            let board = if let Some(id) = existing_id {
                let board = boards
                    .get_mut(&id)
                    .ok_or(PersistenceError::NotFound(id))?;
                if let Some(name) = name {
                    board.name = name;
                }
                board.elements = elements;
                board.updated_at = now;
                board.clone()
            } else {
                let board = Whiteboard {
                    id: Uuid::new_v4().to_string(),
                    name: name.unwrap_or_else(|| DEFAULT_WHITEBOARD_NAME.to_string()),
                    elements,
                    created_at: now,
                    updated_at: now,
                };
                boards.insert(board.id.clone(), board.clone());
                board
            };
            Ok(board)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, PersistenceResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut boards = self
                .boards
                .write()
                .map_err(|e| PersistenceError::Unavailable(format!("Lock error: {}", e)))?;
            boards
                .remove(&id)
                .map(|_| ())
                .ok_or(PersistenceError::NotFound(id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::PathElement;
    use crate::storage::block_on;
    use kurbo::Point;

    fn rectangle() -> Element {
        Element::Rectangle(PathElement::new(
            vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)],
            "#000000",
            2.0,
        ))
    }

    #[test]
    fn test_save_and_load() {
        let store = MemoryStore::new();
        let saved = block_on(store.save(Some("Plan"), &[rectangle()], None)).unwrap();

        let loaded = block_on(store.load(&saved.id)).unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.name, "Plan");
        assert_eq!(loaded.elements.len(), 1);
    }

    #[test]
    fn test_save_without_name_uses_default() {
        let store = MemoryStore::new();
        let saved = block_on(store.save(None, &[], None)).unwrap();
        assert_eq!(saved.name, DEFAULT_WHITEBOARD_NAME);
    }

    #[test]
    fn test_update_keeps_creation_time_and_name() {
        let store = MemoryStore::new();
        let created = block_on(store.save(Some("Plan"), &[], None)).unwrap();

        let updated =
            block_on(store.save(None, &[rectangle()], Some(&created.id))).unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Plan");
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.elements.len(), 1);

        let listed = block_on(store.list()).unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn test_update_missing_id_is_not_found() {
        let store = MemoryStore::new();
        let result = block_on(store.save(None, &[], Some("nope")));
        assert!(matches!(result, Err(PersistenceError::NotFound(_))));
    }

    #[test]
    fn test_save_rejects_malformed_elements() {
        let store = MemoryStore::new();
        let line = Element::Line(PathElement::new(vec![Point::new(0.0, 0.0)], "#000000", 2.0));
        let result = block_on(store.save(None, &[line], None));
        assert!(matches!(result, Err(PersistenceError::Validation(_))));
    }

    #[test]
    fn test_not_found() {
        let store = MemoryStore::new();
        let result = block_on(store.load("nonexistent"));
        assert!(matches!(result, Err(PersistenceError::NotFound(_))));
    }

    #[test]
    fn test_delete() {
        let store = MemoryStore::new();
        let saved = block_on(store.save(None, &[], None)).unwrap();

        block_on(store.delete(&saved.id)).unwrap();
        assert!(matches!(
            block_on(store.load(&saved.id)),
            Err(PersistenceError::NotFound(_))
        ));
        assert!(matches!(
            block_on(store.delete(&saved.id)),
            Err(PersistenceError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_newest_first() {
        let store = MemoryStore::new();
        let first = block_on(store.save(Some("first"), &[], None)).unwrap();
        let second = block_on(store.save(Some("second"), &[], None)).unwrap();

        // Force distinct timestamps regardless of clock resolution.
        let mut boards = store.boards.write().unwrap();
        boards.get_mut(&second.id).unwrap().updated_at = first.updated_at + 10;
        drop(boards);

        let listed = block_on(store.list()).unwrap();
        assert_eq!(listed[0].name, "second");
        assert_eq!(listed[1].name, "first");
    }
}
