//! Slateboard Core Library
//!
//! Platform-agnostic editing engine for the Slateboard whiteboard:
//! element model, scene with undo/redo history, viewport transform,
//! interaction state machine, and persistence backends.

pub mod element;
pub mod geometry;
pub mod input;
pub mod scene;
pub mod session;
pub mod storage;
pub mod tools;
pub mod viewport;

pub use element::{Element, PathElement, TextElement, ValidationError};
pub use geometry::{Handle, is_point_in_element, point_to_segment_distance, resize_handle_at};
pub use input::{Key, Modifiers, MouseButton};
pub use scene::{Scene, StartDraw};
pub use session::{Editor, InteractionState, LoadToken, TextEditState};
pub use storage::{
    MemoryStore, Persistence, PersistenceError, PersistenceResult, Whiteboard, WhiteboardSummary,
};
pub use tools::Tool;
pub use viewport::Viewport;

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStore;
