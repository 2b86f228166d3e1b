//! Editor session: the interaction state machine.
//!
//! [`Editor`] composes the scene store, the viewport, and the current
//! tool, and interprets pointer/keyboard events against them. All
//! transitions are synchronous and infallible; invalid input is a
//! no-op. Continuous gestures (pan, drag-move, drag-resize, drawing)
//! mutate live state per event and coalesce into a single history
//! snapshot at pointer-up.

use crate::element::{DEFAULT_FONT_SIZE, Element};
use crate::geometry::{self, Handle};
use crate::input::{ClickTracker, Key, Modifiers, MouseButton};
use crate::scene::{Scene, StartDraw};
use crate::tools::Tool;
use crate::viewport::Viewport;
use kurbo::{Point, Rect, Vec2};
use log::debug;

/// Smallest font size reachable by dragging the text-resize handle.
const MIN_TEXT_FONT_SIZE: f64 = 8.0;

/// Minimum screen-space extent of the text input box, so an empty
/// editor is still clickable.
const TEXT_INPUT_MIN_WIDTH: f64 = 150.0;
const TEXT_INPUT_MIN_HEIGHT: f64 = 40.0;

/// Live state of the inline text editor.
#[derive(Debug, Clone)]
pub struct TextEditState {
    pub buffer: String,
    /// Anchor position in world coordinates.
    pub position: Point,
    pub font_size: f64,
    /// Id of the text element being edited, if not a fresh one.
    pub editing_id: Option<String>,
    /// Set once the input has received focus. Guards against the
    /// creating click immediately dismissing the editor.
    pub focused: bool,
}

/// Interaction states. Pointer and key events dispatch on this.
#[derive(Debug, Clone)]
pub enum InteractionState {
    Idle,
    Panning {
        last: Point,
    },
    Drawing,
    MovingElement {
        last: Point,
    },
    ResizingElement {
        handle: Handle,
    },
    ResizingText {
        start_y: f64,
        initial_font_size: f64,
    },
    EditingText(TextEditState),
}

/// Token handed out by [`Editor::begin_load`]; a completed load is
/// applied only if no newer load has started since.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadToken(u64);

struct HitInfo {
    id: String,
    text: Option<(String, Point, f64)>,
}

/// Coordinates scene, viewport, tool, and interaction state for one
/// open whiteboard session.
pub struct Editor {
    scene: Scene,
    viewport: Viewport,
    tool: Tool,
    state: InteractionState,
    clicks: ClickTracker,
    listeners: Vec<Box<dyn FnMut()>>,
    load_generation: u64,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// Create an editor over an empty scene.
    pub fn new() -> Self {
        Self::with_elements(Vec::new())
    }

    /// Create an editor over an existing element list.
    pub fn with_elements(elements: Vec<Element>) -> Self {
        Self {
            scene: Scene::with_elements(elements),
            viewport: Viewport::new(),
            tool: Tool::default(),
            state: InteractionState::Idle,
            clicks: ClickTracker::new(),
            listeners: Vec::new(),
            load_generation: 0,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// The inline text editor state, if text editing is active.
    pub fn text_edit(&self) -> Option<&TextEditState> {
        match &self.state {
            InteractionState::EditingText(edit) => Some(edit),
            _ => None,
        }
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        self.emit_change();
    }

    pub fn set_stroke_color(&mut self, color: impl Into<String>) {
        self.scene.set_stroke_color(color);
        self.emit_change();
    }

    pub fn set_stroke_width(&mut self, width: f64) {
        self.scene.set_stroke_width(width);
        self.emit_change();
    }

    /// Register a change listener, invoked after every committed state
    /// transition.
    pub fn subscribe(&mut self, listener: impl FnMut() + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn emit_change(&mut self) {
        for listener in &mut self.listeners {
            listener();
        }
    }

    /// Start a load; any load begun earlier is considered stale.
    pub fn begin_load(&mut self) -> LoadToken {
        self.load_generation += 1;
        LoadToken(self.load_generation)
    }

    /// Apply a completed load. Returns false (leaving the scene
    /// untouched) when a newer load has started since the token was
    /// issued.
    pub fn finish_load(&mut self, token: LoadToken, elements: Vec<Element>) -> bool {
        if token.0 != self.load_generation {
            debug!("discarding stale load (token {:?})", token);
            return false;
        }
        self.scene.set_elements(elements);
        self.state = InteractionState::Idle;
        self.emit_change();
        true
    }

    pub fn undo(&mut self) {
        self.scene.undo();
        self.emit_change();
    }

    pub fn redo(&mut self) {
        self.scene.redo();
        self.emit_change();
    }

    pub fn clear(&mut self) {
        self.scene.clear();
        self.emit_change();
    }

    pub fn delete_selected(&mut self) {
        self.scene.delete_selected();
        self.emit_change();
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.viewport.pan_by(delta);
        self.emit_change();
    }

    /// Wheel scroll: zoom about the cursor. Positive delta zooms out.
    pub fn scroll(&mut self, screen: Point, delta_y: f64) {
        self.viewport.zoom_at(screen, delta_y);
        self.emit_change();
    }

    /// The host notifies once the text input has received focus; only
    /// then can a pointer-down outside the input dismiss it.
    pub fn notify_text_focus(&mut self) {
        if let InteractionState::EditingText(edit) = &mut self.state {
            edit.focused = true;
        }
    }

    pub fn pointer_down(&mut self, screen: Point, button: MouseButton, modifiers: Modifiers) {
        // An active text editor swallows canvas clicks; a click outside
        // its box commits (or discards a blank buffer) once focused.
        if let InteractionState::EditingText(edit) = &self.state {
            if edit.focused && !text_input_box(edit, &self.viewport).contains(screen) {
                self.close_text_editor(true);
                self.emit_change();
            }
            return;
        }

        if !matches!(self.state, InteractionState::Idle) {
            return;
        }

        if button == MouseButton::Middle
            || (button == MouseButton::Left && (modifiers.ctrl || self.tool == Tool::Hand))
        {
            self.state = InteractionState::Panning { last: screen };
            self.emit_change();
            return;
        }

        if button != MouseButton::Left {
            return;
        }

        let double_click = self.clicks.register(screen);

        // Handles of the current selection win over the hit-test; they
        // can sit outside the element's own hit region.
        if let Some(selected) = self.scene.selected_element() {
            if let Some(handle) = geometry::resize_handle_at(screen, selected, &self.viewport) {
                let font_size = match selected {
                    Element::Text(t) => Some(t.font_size()),
                    _ => None,
                };
                self.state = match (handle, font_size) {
                    (Handle::TextResize, Some(initial_font_size)) => {
                        InteractionState::ResizingText {
                            start_y: screen.y,
                            initial_font_size,
                        }
                    }
                    _ => InteractionState::ResizingElement { handle },
                };
                self.emit_change();
                return;
            }
        }

        let hit = self.scene.element_at(screen, &self.viewport).map(|e| HitInfo {
            id: e.id().to_string(),
            text: match e {
                Element::Text(t) => Some((t.text.clone(), t.position, t.font_size())),
                _ => None,
            },
        });

        if let Some(hit) = hit {
            if self.scene.selected_id() != Some(hit.id.as_str()) {
                self.scene.select(Some(hit.id.clone()));
            }

            if double_click {
                if let Some((text, position, font_size)) = hit.text {
                    self.state = InteractionState::EditingText(TextEditState {
                        buffer: text,
                        position,
                        font_size,
                        editing_id: Some(hit.id),
                        focused: false,
                    });
                    self.emit_change();
                    return;
                }
            }

            self.state = InteractionState::MovingElement { last: screen };
            self.emit_change();
            return;
        }

        self.scene.select(None);
        let world = self.viewport.to_world(screen);

        if self.tool == Tool::Text {
            self.state = InteractionState::EditingText(TextEditState {
                buffer: String::new(),
                position: world,
                font_size: DEFAULT_FONT_SIZE,
                editing_id: None,
                focused: false,
            });
        } else if self.tool.is_drawing_tool() {
            if self.scene.start_draw(self.tool, world, &self.viewport) == StartDraw::Drawing {
                self.state = InteractionState::Drawing;
            }
        }
        self.emit_change();
    }

    pub fn pointer_move(&mut self, screen: Point) {
        match &mut self.state {
            InteractionState::Panning { last } => {
                let delta = screen - *last;
                *last = screen;
                self.viewport.pan_by(delta);
            }
            InteractionState::Drawing => {
                let world = self.viewport.to_world(screen);
                self.scene.continue_draw(world);
            }
            InteractionState::MovingElement { last } => {
                let dx = (screen.x - last.x) / self.viewport.scale;
                let dy = (screen.y - last.y) / self.viewport.scale;
                *last = screen;
                if let Some(id) = self.scene.selected_id().map(String::from) {
                    self.scene.move_element(&id, dx, dy);
                }
            }
            InteractionState::ResizingElement { handle } => {
                let handle = *handle;
                let world = self.viewport.to_world(screen);
                let target = self.scene.selected_element().and_then(|e| {
                    match e.points() {
                        [p1, p2, ..] => Some((e.id().to_string(), *p1, *p2)),
                        _ => None,
                    }
                });
                if let Some((id, p1, p2)) = target {
                    let new_points = resized_points(handle, p1, p2, world);
                    self.scene.resize_element(&id, new_points);
                }
            }
            InteractionState::ResizingText {
                start_y,
                initial_font_size,
            } => {
                let dy = screen.y - *start_y;
                let font_size = (*initial_font_size + dy / 2.0).max(MIN_TEXT_FONT_SIZE);
                if let Some(id) = self.scene.selected_id().map(String::from) {
                    self.scene.set_text_font_size(&id, font_size);
                }
            }
            InteractionState::Idle | InteractionState::EditingText(_) => return,
        }
        self.emit_change();
    }

    pub fn pointer_up(&mut self) {
        match self.state {
            InteractionState::Panning { .. } => {
                self.state = InteractionState::Idle;
            }
            InteractionState::Drawing => {
                self.scene.end_draw();
                self.state = InteractionState::Idle;
            }
            InteractionState::MovingElement { .. }
            | InteractionState::ResizingElement { .. }
            | InteractionState::ResizingText { .. } => {
                self.scene.record_snapshot();
                self.state = InteractionState::Idle;
            }
            InteractionState::Idle | InteractionState::EditingText(_) => return,
        }
        self.emit_change();
    }

    pub fn key_down(&mut self, key: Key, modifiers: Modifiers) {
        if let InteractionState::EditingText(edit) = &mut self.state {
            // Typing implies the input has focus.
            edit.focused = true;
            match key {
                Key::Enter if modifiers.shift => edit.buffer.push('\n'),
                Key::Enter => self.close_text_editor(true),
                // A blank buffer is discarded either way.
                Key::Escape => self.close_text_editor(true),
                Key::Backspace => {
                    edit.buffer.pop();
                }
                Key::Character(c) => edit.buffer.push(c),
                _ => {}
            }
            self.emit_change();
            return;
        }

        match key {
            Key::Character(c) if c.eq_ignore_ascii_case(&'z') && modifiers.command() => {
                if modifiers.shift {
                    self.scene.redo();
                } else {
                    self.scene.undo();
                }
            }
            Key::Character(c) if c.eq_ignore_ascii_case(&'y') && modifiers.command() => {
                self.scene.redo();
            }
            Key::Delete | Key::Backspace => self.scene.delete_selected(),
            Key::Escape => self.scene.select(None),
            Key::ArrowUp | Key::ArrowDown | Key::ArrowLeft | Key::ArrowRight => {
                let Some(id) = self.scene.selected_id().map(String::from) else {
                    return;
                };
                let step = if modifiers.shift { 10.0 } else { 1.0 };
                let (dx, dy) = match key {
                    Key::ArrowUp => (0.0, -step),
                    Key::ArrowDown => (0.0, step),
                    Key::ArrowLeft => (-step, 0.0),
                    Key::ArrowRight => (step, 0.0),
                    _ => unreachable!(),
                };
                // Each arrow press is a discrete action, unlike a drag.
                self.scene.move_element(&id, dx, dy);
                self.scene.record_snapshot();
            }
            _ => return,
        }
        self.emit_change();
    }

    fn close_text_editor(&mut self, commit: bool) {
        let state = std::mem::replace(&mut self.state, InteractionState::Idle);
        let InteractionState::EditingText(edit) = state else {
            return;
        };
        if commit {
            self.scene.commit_text(
                &edit.buffer,
                edit.position,
                Some(edit.font_size),
                edit.editing_id.as_deref(),
            );
        }
    }
}

/// Screen-space box of the text input overlay, with a minimum clickable
/// extent for an empty buffer.
fn text_input_box(edit: &TextEditState, viewport: &Viewport) -> Rect {
    let pos = viewport.to_screen(edit.position);
    let (w, h) = geometry::measure_text(&edit.buffer, edit.font_size);
    let padding = geometry::TEXT_PADDING * viewport.scale;
    Rect::new(
        pos.x - padding,
        pos.y - padding,
        pos.x + (w * viewport.scale).max(TEXT_INPUT_MIN_WIDTH) + padding,
        pos.y + (h * viewport.scale).max(TEXT_INPUT_MIN_HEIGHT) + padding,
    )
}

/// New anchor points after dragging a box handle to `target` (world).
fn resized_points(handle: Handle, p1: Point, p2: Point, target: Point) -> Vec<Point> {
    match handle {
        Handle::Nw => vec![target, p2],
        Handle::Ne => vec![Point::new(p1.x, target.y), Point::new(target.x, p2.y)],
        Handle::Se => vec![p1, target],
        Handle::Sw => vec![Point::new(target.x, p1.y), Point::new(p2.x, target.y)],
        Handle::N => vec![Point::new(p1.x, target.y), p2],
        Handle::E => vec![p1, Point::new(target.x, p2.y)],
        Handle::S => vec![p1, Point::new(p2.x, target.y)],
        Handle::W => vec![Point::new(target.x, p1.y), p2],
        Handle::TextResize => vec![p1, p2],
    }
}
