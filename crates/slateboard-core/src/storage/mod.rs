//! Persistence abstraction for whiteboards.

mod memory;

#[cfg(not(target_arch = "wasm32"))]
mod file;

pub use memory::MemoryStore;

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileStore;

use crate::element::Element;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Name given to a whiteboard saved without one.
pub const DEFAULT_WHITEBOARD_NAME: &str = "Untitled";

/// Persistence errors. `Validation` and `Unauthorized` map onto the
/// HTTP 422 and 401 responses of a remote backend; local backends use
/// them for malformed payloads.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Whiteboard not found: {0}")]
    NotFound(String),
    #[error("Invalid whiteboard payload: {0}")]
    Validation(String),
    #[error("Not authorized")]
    Unauthorized,
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Boxed future for async operations (compatible with WASM).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A stored whiteboard: named element list plus timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Whiteboard {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Unix epoch milliseconds.
    pub created_at: u64,
    pub updated_at: u64,
}

/// Listing entry: everything but the element payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhiteboardSummary {
    pub id: String,
    pub name: String,
    pub updated_at: u64,
}

impl Whiteboard {
    pub fn summary(&self) -> WhiteboardSummary {
        WhiteboardSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            updated_at: self.updated_at,
        }
    }
}

/// Current time as unix epoch milliseconds.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Reject a payload whose elements break the per-kind invariants.
pub fn validate_elements(elements: &[Element]) -> PersistenceResult<()> {
    for element in elements {
        element
            .validate()
            .map_err(|e| PersistenceError::Validation(e.to_string()))?;
    }
    Ok(())
}

/// Trait for whiteboard persistence backends.
///
/// Implementations can store whiteboards in memory, on the filesystem,
/// or behind an HTTP API.
///
/// Note: On native platforms, implementations must be Send + Sync.
/// On WASM, these bounds are relaxed since it's single-threaded.
#[cfg(not(target_arch = "wasm32"))]
pub trait Persistence: Send + Sync {
    /// List stored whiteboards, newest first.
    fn list(&self) -> BoxFuture<'_, PersistenceResult<Vec<WhiteboardSummary>>>;

    /// Load a whiteboard by id.
    fn load(&self, id: &str) -> BoxFuture<'_, PersistenceResult<Whiteboard>>;

    /// Save the element list. With `existing_id` the stored whiteboard
    /// is updated in place (keeping its creation time, and its name
    /// unless a new one is given); otherwise a new one is created.
    fn save(
        &self,
        name: Option<&str>,
        elements: &[Element],
        existing_id: Option<&str>,
    ) -> BoxFuture<'_, PersistenceResult<Whiteboard>>;

    /// Delete a whiteboard by id.
    fn delete(&self, id: &str) -> BoxFuture<'_, PersistenceResult<()>>;
}

/// Trait for whiteboard persistence backends (WASM version without
/// Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait Persistence {
    /// List stored whiteboards, newest first.
    fn list(&self) -> BoxFuture<'_, PersistenceResult<Vec<WhiteboardSummary>>>;

    /// Load a whiteboard by id.
    fn load(&self, id: &str) -> BoxFuture<'_, PersistenceResult<Whiteboard>>;

    /// Save the element list. With `existing_id` the stored whiteboard
    /// is updated in place (keeping its creation time, and its name
    /// unless a new one is given); otherwise a new one is created.
    fn save(
        &self,
        name: Option<&str>,
        elements: &[Element],
        existing_id: Option<&str>,
    ) -> BoxFuture<'_, PersistenceResult<Whiteboard>>;

    /// Delete a whiteboard by id.
    fn delete(&self, id: &str) -> BoxFuture<'_, PersistenceResult<()>>;
}

#[cfg(test)]
pub(crate) fn block_on<F: std::future::Future>(f: F) -> F::Output {
    // Simple blocking executor for tests
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        match f.as_mut().poll(&mut cx) {
            Poll::Ready(result) => return result,
            Poll::Pending => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::PathElement;
    use kurbo::Point;

    #[test]
    fn test_whiteboard_wire_shape() {
        let board = Whiteboard {
            id: "b1".to_string(),
            name: "Sketches".to_string(),
            elements: vec![],
            created_at: 1_700_000_000_000,
            updated_at: 1_700_000_000_500,
        };
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(
            json,
            r#"{"id":"b1","name":"Sketches","elements":[],"createdAt":1700000000000,"updatedAt":1700000000500}"#
        );
    }

    #[test]
    fn test_validate_elements_rejects_malformed() {
        let mut line = PathElement::new(vec![Point::new(0.0, 0.0)], "#000000", 2.0);
        line.id = "bad".to_string();
        let result = validate_elements(&[Element::Line(line)]);
        assert!(matches!(result, Err(PersistenceError::Validation(_))));
    }

    #[test]
    fn test_validate_elements_accepts_pencil_any_length() {
        let pencil = PathElement::new(vec![Point::new(0.0, 0.0)], "#000000", 2.0);
        assert!(validate_elements(&[Element::Pencil(pencil)]).is_ok());
    }
}
