//! Document access.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::identifiers::ElementId;

use super::KeyEvent;

// ============================================================================
// Types
// ============================================================================

/// Structural description of one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementInfo {
    /// Lowercase tag name.
    pub tag: String,
    /// Element id attribute, if non-empty.
    pub id: Option<String>,
    /// Class list in document order.
    pub classes: Vec<String>,
    /// Attributes other than `id` and `class`.
    pub attrs: BTreeMap<String, String>,
    /// Text from the element's own text children, trimmed.
    pub text: Option<String>,
    /// Current form value for inputs, selects, and textareas.
    pub value: Option<String>,
}

impl ElementInfo {
    /// Returns an attribute value.
    #[inline]
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }
}

/// Element bounding box in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Returns `true` if the box has an area.
    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Viewport geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    /// Viewport width.
    pub width: f64,
    /// Viewport height.
    pub height: f64,
    /// Horizontal scroll offset.
    pub scroll_x: f64,
    /// Vertical scroll offset.
    pub scroll_y: f64,
}

/// Where to scroll.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrollTarget {
    /// Scroll relative to the current position.
    By {
        /// Horizontal delta.
        x: f64,
        /// Vertical delta.
        y: f64,
    },
    /// Scroll to an absolute position.
    To {
        /// Horizontal position.
        x: f64,
        /// Vertical position.
        y: f64,
    },
    /// Scroll an element into view.
    Element(ElementId),
}

// ============================================================================
// DocumentHost
// ============================================================================

/// Reads and mutates the host document.
///
/// All calls are synchronous: they run inside a single handler invocation and
/// never yield.
pub trait DocumentHost: Send + Sync {
    /// Returns the element snapshots and trees start from (the body).
    fn root(&self) -> Result<ElementId>;

    /// Returns all elements matching `selector`, in document order.
    ///
    /// When `scope` is set, only descendants of that element are searched.
    fn query(&self, selector: &str, scope: Option<&ElementId>) -> Result<Vec<ElementId>>;

    /// Describes an element.
    fn describe(&self, element: &ElementId) -> Result<ElementInfo>;

    /// Returns the element children of an element, in document order.
    fn children(&self, element: &ElementId) -> Result<Vec<ElementId>>;

    /// Returns the outer markup of an element.
    fn outer_html(&self, element: &ElementId) -> Result<String>;

    /// Returns the computed bounding box of an element.
    fn bounding_rect(&self, element: &ElementId) -> Result<Rect>;

    /// Clicks an element.
    fn click(&self, element: &ElementId) -> Result<()>;

    /// Focuses an element.
    fn focus(&self, element: &ElementId) -> Result<()>;

    /// Inserts text into an editable element, replacing its value if `replace`.
    fn insert_text(&self, element: &ElementId, text: &str, replace: bool) -> Result<()>;

    /// Dispatches a paste of `text` into an element.
    fn paste(&self, element: &ElementId, text: &str) -> Result<()>;

    /// Dispatches a key event to an element, or the active element if `None`.
    fn key(&self, element: Option<&ElementId>, event: &KeyEvent) -> Result<()>;

    /// Scrolls and returns the resulting viewport.
    fn scroll(&self, target: &ScrollTarget) -> Result<Viewport>;

    /// Returns the current viewport.
    fn viewport(&self) -> Result<Viewport>;

    /// Returns the full scrollable page size (width, height).
    fn page_size(&self) -> Result<(f64, f64)>;

    /// Returns the document URL.
    fn url(&self) -> String;

    /// Returns the document title.
    fn title(&self) -> String;
}
