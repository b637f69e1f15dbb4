//! The document interface the LaTeX tool edits, plus an in-memory model.
//!
//! Real hosts implement [`DocumentHost`] on top of their own page/layer model
//! and undo stack. [`MemoryDocument`] backs the command-line tool and the tests.

use serde::Serialize;

use crate::latex::{PlacementHint, TexImage};

pub type ElementId = u64;

/// A plain text element on a layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextElement {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    Tex(TexImage),
    Text(TextElement),
}

impl Element {
    pub fn bounds(&self) -> PlacementHint {
        let (x, y, width, height) = match self {
            Self::Tex(image) => (image.x, image.y, image.width, image.height),
            Self::Text(text) => (text.x, text.y, text.width, text.height),
        };
        PlacementHint {
            x,
            y,
            width,
            height,
        }
    }
}

/// What the LaTeX tool can pick up from the current selection.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectedElement {
    /// A previously inserted formula image.
    Tex {
        id: ElementId,
        text: String,
        bounds: PlacementHint,
    },
    /// A text element to be converted into a formula.
    Text {
        id: ElementId,
        text: String,
        bounds: PlacementHint,
    },
}

impl SelectedElement {
    pub fn id(&self) -> ElementId {
        match self {
            Self::Tex { id, .. } | Self::Text { id, .. } => *id,
        }
    }

    pub fn bounds(&self) -> PlacementHint {
        match self {
            Self::Tex { bounds, .. } | Self::Text { bounds, .. } => *bounds,
        }
    }

    /// Formula text the editor should start from.
    pub fn initial_formula(&self) -> String {
        match self {
            Self::Tex { text, .. } => text.clone(),
            Self::Text { text, .. } => format!("\\text{{{text}}}"),
        }
    }
}

/// Undo steps registered with the host.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoAction {
    Insert {
        page: usize,
        layer: usize,
        element: ElementId,
    },
    Delete {
        page: usize,
        layer: usize,
        element: ElementId,
        removed: Element,
    },
}

/// Operations the LaTeX tool needs from the document it edits.
pub trait DocumentHost {
    fn lock(&mut self);
    fn unlock(&mut self);

    /// The formula image or text element selected on the current page.
    fn selected_element(&self) -> Option<SelectedElement>;

    fn clear_selection(&mut self);

    /// Remove an element, registering the matching undo step.
    fn delete_element(&mut self, id: ElementId);

    /// Add an image to the current page's selected layer.
    fn add_image(&mut self, image: TexImage) -> ElementId;

    fn add_undo_action(&mut self, action: UndoAction);

    /// Replace the selection with `id`.
    fn select(&mut self, id: ElementId);

    /// Page and layer new elements are added to.
    fn current_layer(&self) -> (usize, usize);
}

/// Run `f` with the document locked.
pub fn with_lock<D, R>(document: &mut D, f: impl FnOnce(&mut D) -> R) -> R
where
    D: DocumentHost + ?Sized,
{
    document.lock();
    let result = f(document);
    document.unlock();
    result
}

#[derive(Debug, Default)]
struct Layer {
    elements: Vec<(ElementId, Element)>,
}

#[derive(Debug)]
struct Page {
    layers: Vec<Layer>,
    selected_layer: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            layers: vec![Layer::default()],
            selected_layer: 0,
        }
    }
}

/// A single-user document kept entirely in memory.
#[derive(Debug)]
pub struct MemoryDocument {
    pages: Vec<Page>,
    current_page: usize,
    selection: Option<ElementId>,
    undo: Vec<UndoAction>,
    next_id: ElementId,
    lock_depth: usize,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// A document with one page holding one empty layer.
    pub fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            current_page: 0,
            selection: None,
            undo: Vec::new(),
            next_id: 0,
            lock_depth: 0,
        }
    }

    /// Add an element to the current layer without recording undo.
    pub fn push_element(&mut self, element: Element) -> ElementId {
        let (page, layer) = self.current_layer();
        self.insert_at(page, layer, element)
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.find(id).map(|(page, layer, index)| {
            &self.pages[page].layers[layer].elements[index].1
        })
    }

    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.pages
            .iter()
            .flat_map(|page| page.layers.iter())
            .flat_map(|layer| layer.elements.iter().map(|(id, element)| (*id, element)))
    }

    pub fn selection(&self) -> Option<ElementId> {
        self.selection
    }

    pub fn undo_actions(&self) -> &[UndoAction] {
        &self.undo
    }

    pub fn is_locked(&self) -> bool {
        self.lock_depth > 0
    }

    /// Revert the most recent undo step. Returns `false` when there is none.
    pub fn undo(&mut self) -> bool {
        let Some(action) = self.undo.pop() else {
            return false;
        };
        match action {
            UndoAction::Insert { element, .. } => {
                self.remove(element);
                if self.selection == Some(element) {
                    self.selection = None;
                }
            }
            UndoAction::Delete {
                page,
                layer,
                element,
                removed,
            } => {
                self.pages[page].layers[layer].elements.push((element, removed));
            }
        }
        true
    }

    fn insert_at(&mut self, page: usize, layer: usize, element: Element) -> ElementId {
        self.next_id += 1;
        let id = self.next_id;
        self.pages[page].layers[layer].elements.push((id, element));
        id
    }

    fn find(&self, id: ElementId) -> Option<(usize, usize, usize)> {
        self.pages.iter().enumerate().find_map(|(page_index, page)| {
            page.layers.iter().enumerate().find_map(|(layer_index, layer)| {
                layer
                    .elements
                    .iter()
                    .position(|(element_id, _)| *element_id == id)
                    .map(|index| (page_index, layer_index, index))
            })
        })
    }

    fn remove(&mut self, id: ElementId) -> Option<(usize, usize, Element)> {
        let (page, layer, index) = self.find(id)?;
        let (_, element) = self.pages[page].layers[layer].elements.remove(index);
        Some((page, layer, element))
    }
}

impl DocumentHost for MemoryDocument {
    fn lock(&mut self) {
        self.lock_depth += 1;
    }

    fn unlock(&mut self) {
        self.lock_depth = self.lock_depth.saturating_sub(1);
    }

    fn selected_element(&self) -> Option<SelectedElement> {
        let id = self.selection?;
        let (page, _, _) = self.find(id)?;
        if page != self.current_page {
            return None;
        }
        let element = self.element(id)?;
        let bounds = element.bounds();
        Some(match element {
            Element::Tex(image) => SelectedElement::Tex {
                id,
                text: image.text.clone(),
                bounds,
            },
            Element::Text(text) => SelectedElement::Text {
                id,
                text: text.text.clone(),
                bounds,
            },
        })
    }

    fn clear_selection(&mut self) {
        self.selection = None;
    }

    fn delete_element(&mut self, id: ElementId) {
        if let Some((page, layer, removed)) = self.remove(id) {
            self.undo.push(UndoAction::Delete {
                page,
                layer,
                element: id,
                removed,
            });
        }
        if self.selection == Some(id) {
            self.selection = None;
        }
    }

    fn add_image(&mut self, image: TexImage) -> ElementId {
        let (page, layer) = self.current_layer();
        self.insert_at(page, layer, Element::Tex(image))
    }

    fn add_undo_action(&mut self, action: UndoAction) {
        self.undo.push(action);
    }

    fn select(&mut self, id: ElementId) {
        if self.find(id).is_some() {
            self.selection = Some(id);
        }
    }

    fn current_layer(&self) -> (usize, usize) {
        (
            self.current_page,
            self.pages[self.current_page].selected_layer,
        )
    }
}
