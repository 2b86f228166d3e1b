//! Scene and history store.
//!
//! Owns the live element list (list order is z-order, later entries on
//! top), the optional in-progress element, selection, and the undo/redo
//! history. History entries are full element-list snapshots with a
//! cursor; pushing truncates any redone-then-abandoned entries.

use crate::element::{Element, PathElement, TextElement};
use crate::geometry;
use crate::tools::Tool;
use crate::viewport::Viewport;
use kurbo::Point;
use log::debug;

/// Maximum number of history snapshots to keep.
const MAX_HISTORY: usize = 50;

#[derive(Debug, Clone)]
struct History {
    entries: Vec<Vec<Element>>,
    cursor: usize,
}

impl History {
    /// Seed with a single snapshot so the state before the first edit
    /// is always reachable by undo.
    fn new(initial: Vec<Element>) -> Self {
        Self {
            entries: vec![initial],
            cursor: 0,
        }
    }

    fn push(&mut self, snapshot: Vec<Element>) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(snapshot);
        if self.entries.len() > MAX_HISTORY {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len() - 1;
    }

    fn back(&mut self) -> Option<&[Element]> {
        if self.cursor > 0 {
            self.cursor -= 1;
            Some(&self.entries[self.cursor])
        } else {
            None
        }
    }

    fn forward(&mut self) -> Option<&[Element]> {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
            Some(&self.entries[self.cursor])
        } else {
            None
        }
    }
}

/// The outcome of a pointer-down dispatched through [`Scene::start_draw`].
#[derive(Debug, Clone, PartialEq)]
pub enum StartDraw {
    /// Selection changed (or cleared); id of the hit element if any.
    Selected(Option<String>),
    /// Text tool: the caller should open a text editor at this point.
    TextEdit(Point),
    /// An in-progress element was created and drawing began.
    Drawing,
}

/// Live editing state for one open whiteboard.
#[derive(Debug, Clone)]
pub struct Scene {
    elements: Vec<Element>,
    /// In-progress element, rendered on top but not yet committed.
    current: Option<Element>,
    drawing: bool,
    selected: Option<String>,
    history: History,
    stroke_color: String,
    stroke_width: f64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::with_elements(Vec::new())
    }

    /// Create a scene from an existing element list (the load path).
    pub fn with_elements(elements: Vec<Element>) -> Self {
        Self {
            history: History::new(elements.clone()),
            elements,
            current: None,
            drawing: false,
            selected: None,
            stroke_color: "#000000".to_string(),
            stroke_width: 2.0,
        }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// The in-progress element, if a draw gesture is active.
    pub fn current(&self) -> Option<&Element> {
        self.current.as_ref()
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, id: Option<String>) {
        self.selected = id;
    }

    /// The selected element, if the selection id is still present.
    pub fn selected_element(&self) -> Option<&Element> {
        let id = self.selected.as_deref()?;
        self.elements.iter().find(|e| e.id() == id)
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.id() == id)
    }

    pub fn stroke_color(&self) -> &str {
        &self.stroke_color
    }

    pub fn stroke_width(&self) -> f64 {
        self.stroke_width
    }

    pub fn set_stroke_color(&mut self, color: impl Into<String>) {
        self.stroke_color = color.into();
    }

    pub fn set_stroke_width(&mut self, width: f64) {
        self.stroke_width = width;
    }

    pub fn can_undo(&self) -> bool {
        self.history.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.history.cursor + 1 < self.history.entries.len()
    }

    /// Number of history snapshots currently held.
    pub fn history_len(&self) -> usize {
        self.history.entries.len()
    }

    /// Topmost element whose hit-test passes at a screen point.
    pub fn element_at(&self, screen: Point, viewport: &Viewport) -> Option<&Element> {
        self.elements
            .iter()
            .rev()
            .find(|e| geometry::is_point_in_element(screen, e, viewport))
    }

    /// Begin a pointer-down action for the given tool at a world point.
    ///
    /// Select/hand hit-test topmost-first (in screen space via the
    /// viewport) and update the selection; the text tool defers element
    /// creation to the text editor; drawing tools seed an in-progress
    /// element.
    pub fn start_draw(&mut self, tool: Tool, world: Point, viewport: &Viewport) -> StartDraw {
        match tool {
            Tool::Select | Tool::Hand => {
                let screen = viewport.to_screen(world);
                let hit = self.element_at(screen, viewport).map(|e| e.id().to_string());
                self.selected = hit.clone();
                StartDraw::Selected(hit)
            }
            Tool::Text => StartDraw::TextEdit(world),
            _ => {
                let path = PathElement::new(
                    vec![world],
                    self.stroke_color.clone(),
                    self.stroke_width,
                );
                self.current = Some(match tool {
                    Tool::Pencil => Element::Pencil(path),
                    Tool::Line => Element::Line(path),
                    Tool::Rectangle => Element::Rectangle(path),
                    Tool::Diamond => Element::Diamond(path),
                    Tool::Ellipse => Element::Ellipse(path),
                    Tool::Arrow => Element::Arrow(path),
                    Tool::Text | Tool::Select | Tool::Hand => unreachable!(),
                });
                self.drawing = true;
                StartDraw::Drawing
            }
        }
    }

    /// Extend the in-progress element. Freehand strokes accumulate
    /// points; two-point kinds are redefined by their first point and
    /// the latest one.
    pub fn continue_draw(&mut self, world: Point) {
        if !self.drawing {
            return;
        }
        let Some(current) = self.current.as_mut() else {
            return;
        };
        match current {
            Element::Pencil(e) => e.points.push(world),
            Element::Line(e)
            | Element::Rectangle(e)
            | Element::Diamond(e)
            | Element::Ellipse(e)
            | Element::Arrow(e) => {
                let first = e.points.first().copied().unwrap_or(world);
                e.points = vec![first, world];
            }
            Element::Text(_) => {}
        }
    }

    /// Commit the in-progress element and push one history snapshot.
    ///
    /// Degenerate shapes (never dragged) are still committed; a
    /// two-point kind that only has its seed point gets the point
    /// duplicated so the kind invariant holds.
    pub fn end_draw(&mut self) {
        if !self.drawing {
            return;
        }
        let Some(mut element) = self.current.take() else {
            self.drawing = false;
            return;
        };
        if element.is_two_point() && element.points().len() == 1 {
            let p = element.points()[0];
            element.set_points(vec![p, p]);
        }
        debug!("committing {} element {}", element.kind(), element.id());
        self.elements.push(element);
        self.drawing = false;
        self.record_snapshot();
    }

    /// Commit text from the text editor.
    ///
    /// Blank or whitespace-only text commits nothing and pushes no
    /// snapshot. With `editing_id` the existing element keeps its id,
    /// position, and z-order slot and only text/font size change.
    /// Returns the id of the committed element.
    pub fn commit_text(
        &mut self,
        text: &str,
        position: Point,
        font_size: Option<f64>,
        editing_id: Option<&str>,
    ) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }

        let id = if let Some(editing_id) = editing_id {
            let existing = self.elements.iter_mut().find_map(|e| match e {
                Element::Text(t) if t.id == editing_id => Some(t),
                _ => None,
            })?;
            existing.text = text.to_string();
            if font_size.is_some() {
                existing.font_size = font_size;
            }
            existing.id.clone()
        } else {
            let element = TextElement::new(
                text,
                position,
                font_size,
                self.stroke_color.clone(),
                self.stroke_width,
            );
            let id = element.id.clone();
            self.elements.push(Element::Text(element));
            id
        };

        self.record_snapshot();
        Some(id)
    }

    /// Delete the selected element and push one history snapshot.
    /// No-op without a selection.
    pub fn delete_selected(&mut self) {
        let Some(id) = self.selected.take() else {
            return;
        };
        let before = self.elements.len();
        self.elements.retain(|e| e.id() != id);
        if self.elements.len() != before {
            self.record_snapshot();
        }
    }

    /// Remove every element. Pushes a snapshot only if there was
    /// something to remove.
    pub fn clear(&mut self) {
        self.selected = None;
        if self.elements.is_empty() {
            return;
        }
        self.elements.clear();
        self.record_snapshot();
    }

    /// Step the history cursor back. Boundary no-op.
    pub fn undo(&mut self) -> bool {
        if let Some(snapshot) = self.history.back() {
            self.elements = snapshot.to_vec();
            self.selected = None;
            true
        } else {
            false
        }
    }

    /// Step the history cursor forward. Boundary no-op.
    pub fn redo(&mut self) -> bool {
        if let Some(snapshot) = self.history.forward() {
            self.elements = snapshot.to_vec();
            self.selected = None;
            true
        } else {
            false
        }
    }

    /// Translate an element by (dx, dy) world units. Pushes no
    /// snapshot; continuous drags coalesce via [`Scene::record_snapshot`]
    /// at gesture end.
    pub fn move_element(&mut self, id: &str, dx: f64, dy: f64) {
        if let Some(element) = self.elements.iter_mut().find(|e| e.id() == id) {
            element.translate(dx, dy);
        }
    }

    /// Replace a two-point element's points wholesale. Pushes no
    /// snapshot. Defensive no-op for other kinds or malformed input.
    pub fn resize_element(&mut self, id: &str, new_points: Vec<Point>) {
        if new_points.len() != 2 {
            return;
        }
        if let Some(element) = self.elements.iter_mut().find(|e| e.id() == id) {
            if element.is_two_point() {
                element.set_points(new_points);
            }
        }
    }

    /// Set a text element's font size without pushing a snapshot
    /// (continuous text-resize drag).
    pub fn set_text_font_size(&mut self, id: &str, font_size: f64) {
        if let Some(Element::Text(t)) = self.elements.iter_mut().find(|e| e.id() == id) {
            t.font_size = Some(font_size);
        }
    }

    /// Push one snapshot of the current element list. Called at the end
    /// of continuous gestures and after each discrete action.
    pub fn record_snapshot(&mut self) {
        self.history.push(self.elements.clone());
    }

    /// Replace the whole element list and reset history to a single
    /// snapshot (loading a whiteboard or starting a blank one).
    pub fn set_elements(&mut self, elements: Vec<Element>) {
        self.history = History::new(elements.clone());
        self.elements = elements;
        self.current = None;
        self.drawing = false;
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp() -> Viewport {
        Viewport::new()
    }

    fn draw_rectangle(scene: &mut Scene, a: Point, b: Point) -> String {
        scene.start_draw(Tool::Rectangle, a, &vp());
        scene.continue_draw(b);
        scene.end_draw();
        scene.elements().last().unwrap().id().to_string()
    }

    #[test]
    fn test_draw_then_undo() {
        let mut scene = Scene::new();
        scene.start_draw(Tool::Rectangle, Point::new(0.0, 0.0), &vp());
        scene.continue_draw(Point::new(10.0, 10.0));
        scene.end_draw();

        assert_eq!(scene.elements().len(), 1);
        assert_eq!(
            scene.elements()[0].points(),
            &[Point::new(0.0, 0.0), Point::new(10.0, 10.0)]
        );

        assert!(scene.undo());
        assert!(scene.elements().is_empty());
    }

    #[test]
    fn test_two_point_shape_keeps_latest_corner() {
        let mut scene = Scene::new();
        scene.start_draw(Tool::Ellipse, Point::new(0.0, 0.0), &vp());
        scene.continue_draw(Point::new(5.0, 5.0));
        scene.continue_draw(Point::new(20.0, 30.0));
        scene.end_draw();

        assert_eq!(
            scene.elements()[0].points(),
            &[Point::new(0.0, 0.0), Point::new(20.0, 30.0)]
        );
    }

    #[test]
    fn test_pencil_accumulates_points() {
        let mut scene = Scene::new();
        scene.start_draw(Tool::Pencil, Point::new(0.0, 0.0), &vp());
        scene.continue_draw(Point::new(1.0, 1.0));
        scene.continue_draw(Point::new(2.0, 2.0));
        scene.end_draw();

        assert_eq!(scene.elements()[0].points().len(), 3);
    }

    #[test]
    fn test_degenerate_shape_still_commits() {
        let mut scene = Scene::new();
        scene.start_draw(Tool::Rectangle, Point::new(4.0, 4.0), &vp());
        scene.end_draw();

        assert_eq!(scene.elements().len(), 1);
        assert_eq!(
            scene.elements()[0].points(),
            &[Point::new(4.0, 4.0), Point::new(4.0, 4.0)]
        );
        assert!(scene.elements()[0].validate().is_ok());
    }

    #[test]
    fn test_continue_and_end_outside_drawing_are_noops() {
        let mut scene = Scene::new();
        scene.continue_draw(Point::new(1.0, 1.0));
        scene.end_draw();
        assert!(scene.elements().is_empty());
        assert_eq!(scene.history_len(), 1);
    }

    #[test]
    fn test_undo_redo_inverse() {
        let mut scene = Scene::new();
        draw_rectangle(&mut scene, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        draw_rectangle(&mut scene, Point::new(20.0, 20.0), Point::new(30.0, 30.0));

        let before = scene.elements().to_vec();
        assert!(scene.undo());
        assert!(scene.redo());
        assert_eq!(scene.elements(), before.as_slice());
    }

    #[test]
    fn test_history_boundaries_are_noops() {
        let mut scene = Scene::new();
        assert!(!scene.undo());
        assert!(!scene.redo());

        draw_rectangle(&mut scene, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        assert!(!scene.redo());
        assert!(scene.undo());
        assert!(!scene.undo());
        assert_eq!(scene.history_len(), 2);
    }

    #[test]
    fn test_push_truncates_redo_entries() {
        let mut scene = Scene::new();
        draw_rectangle(&mut scene, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        assert!(scene.undo());
        assert!(scene.can_redo());

        draw_rectangle(&mut scene, Point::new(5.0, 5.0), Point::new(15.0, 15.0));
        assert!(!scene.can_redo());
        assert_eq!(scene.elements().len(), 1);
    }

    #[test]
    fn test_history_capped() {
        let mut scene = Scene::new();
        for i in 0..60 {
            draw_rectangle(
                &mut scene,
                Point::new(i as f64, 0.0),
                Point::new(i as f64 + 1.0, 1.0),
            );
        }
        assert_eq!(scene.history_len(), 50);
    }

    #[test]
    fn test_commit_text_blank_is_discarded() {
        let mut scene = Scene::new();
        assert!(scene.commit_text("   \n ", Point::new(5.0, 5.0), None, None).is_none());
        assert!(scene.elements().is_empty());
        assert_eq!(scene.history_len(), 1);
    }

    #[test]
    fn test_text_edit_round_trip() {
        let mut scene = Scene::new();
        let id = scene
            .commit_text("hello", Point::new(5.0, 5.0), None, None)
            .unwrap();
        assert_eq!(scene.elements().len(), 1);
        match &scene.elements()[0] {
            Element::Text(t) => {
                assert_eq!(t.text, "hello");
                assert_eq!(t.position, Point::new(5.0, 5.0));
                assert!((t.font_size() - 16.0).abs() < f64::EPSILON);
            }
            _ => panic!("expected text"),
        }

        let replaced = scene
            .commit_text("hi", Point::new(5.0, 5.0), Some(20.0), Some(&id))
            .unwrap();
        assert_eq!(replaced, id);
        assert_eq!(scene.elements().len(), 1);
        match &scene.elements()[0] {
            Element::Text(t) => {
                assert_eq!(t.id, id);
                assert_eq!(t.text, "hi");
                assert_eq!(t.position, Point::new(5.0, 5.0));
                assert!((t.font_size() - 20.0).abs() < f64::EPSILON);
            }
            _ => panic!("expected text"),
        }
    }

    #[test]
    fn test_delete_then_undo_restores() {
        let mut scene = Scene::new();
        let id = draw_rectangle(&mut scene, Point::new(0.0, 0.0), Point::new(10.0, 10.0));

        scene.select(Some(id.clone()));
        scene.delete_selected();
        assert!(scene.elements().is_empty());
        assert!(scene.selected_id().is_none());

        assert!(scene.undo());
        assert_eq!(scene.elements().len(), 1);
        assert_eq!(scene.elements()[0].id(), id);
    }

    #[test]
    fn test_delete_without_selection_is_noop() {
        let mut scene = Scene::new();
        draw_rectangle(&mut scene, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let len = scene.history_len();
        scene.delete_selected();
        assert_eq!(scene.elements().len(), 1);
        assert_eq!(scene.history_len(), len);
    }

    #[test]
    fn test_clear_pushes_only_when_non_empty() {
        let mut scene = Scene::new();
        scene.clear();
        assert_eq!(scene.history_len(), 1);

        draw_rectangle(&mut scene, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        scene.clear();
        assert!(scene.elements().is_empty());
        assert_eq!(scene.history_len(), 3);

        assert!(scene.undo());
        assert_eq!(scene.elements().len(), 1);
    }

    #[test]
    fn test_move_and_resize_do_not_push_history() {
        let mut scene = Scene::new();
        let id = draw_rectangle(&mut scene, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let len = scene.history_len();

        for _ in 0..50 {
            scene.move_element(&id, 1.0, 0.0);
        }
        scene.resize_element(&id, vec![Point::new(0.0, 0.0), Point::new(99.0, 99.0)]);
        assert_eq!(scene.history_len(), len);

        scene.record_snapshot();
        assert_eq!(scene.history_len(), len + 1);
    }

    #[test]
    fn test_resize_rejects_malformed_points() {
        let mut scene = Scene::new();
        let id = draw_rectangle(&mut scene, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        scene.resize_element(&id, vec![Point::new(1.0, 1.0)]);
        assert_eq!(
            scene.elements()[0].points(),
            &[Point::new(0.0, 0.0), Point::new(10.0, 10.0)]
        );
    }

    #[test]
    fn test_select_tool_picks_topmost() {
        let mut scene = Scene::new();
        let bottom = draw_rectangle(&mut scene, Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        let top = draw_rectangle(&mut scene, Point::new(50.0, 50.0), Point::new(150.0, 150.0));

        let hit = scene.start_draw(Tool::Select, Point::new(75.0, 75.0), &vp());
        assert_eq!(hit, StartDraw::Selected(Some(top.clone())));
        assert_eq!(scene.selected_id(), Some(top.as_str()));

        let hit = scene.start_draw(Tool::Select, Point::new(25.0, 25.0), &vp());
        assert_eq!(hit, StartDraw::Selected(Some(bottom)));

        let hit = scene.start_draw(Tool::Select, Point::new(500.0, 500.0), &vp());
        assert_eq!(hit, StartDraw::Selected(None));
        assert!(scene.selected_id().is_none());
    }

    #[test]
    fn test_set_elements_resets_history() {
        let mut scene = Scene::new();
        draw_rectangle(&mut scene, Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        scene.select(scene.elements()[0].id().to_string().into());

        let replacement = vec![Element::Text(TextElement::new(
            "loaded",
            Point::new(1.0, 1.0),
            None,
            "#000000",
            2.0,
        ))];
        scene.set_elements(replacement.clone());

        assert_eq!(scene.elements(), replacement.as_slice());
        assert_eq!(scene.history_len(), 1);
        assert!(scene.selected_id().is_none());
        assert!(!scene.can_undo());
    }
}
