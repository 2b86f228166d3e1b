//! Tool selection.

use serde::{Deserialize, Serialize};

/// The active tool. Drawing tools map one-to-one onto element kinds;
/// `Select` and `Hand` never create elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Pencil,
    Line,
    Rectangle,
    Diamond,
    Ellipse,
    Arrow,
    Text,
    Select,
    Hand,
}

impl Tool {
    /// Whether this tool creates an element on drag.
    pub fn is_drawing_tool(self) -> bool {
        !matches!(self, Tool::Select | Tool::Hand | Tool::Text)
    }
}
