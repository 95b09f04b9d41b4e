//! DOM interaction handlers.
//!
//! Pointer and text actions resolve their target first, then wait the
//! configured settle delay before acting so the page can react to focus and
//! layout changes.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::host::{ElementInfo, KeyEvent, Modifiers, Rect, ScrollTarget, Viewport};
use crate::identifiers::ElementId;
use crate::protocol::{ScrollMode, to_json_text};
use crate::util::truncate_chars;

use super::Bridge;
use super::dispatch::Reply;

/// Characters of element text kept in query summaries.
const QUERY_TEXT_CHARS: usize = 200;

// ============================================================================
// Types
// ============================================================================

/// One matched element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSummary {
    /// Lowercase tag name.
    pub tag: String,
    /// Id attribute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Class list.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    /// Own text, truncated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Form value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Other attributes.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    /// Bounding box.
    pub rect: Rect,
    /// `true` if the box has an area.
    pub visible: bool,
}

impl ElementSummary {
    fn new(info: ElementInfo, rect: Rect) -> Self {
        Self {
            tag: info.tag,
            id: info.id,
            classes: info.classes,
            text: info.text.map(|t| truncate_chars(&t, QUERY_TEXT_CHARS)),
            value: info.value,
            attrs: info.attrs,
            visible: rect.is_visible(),
            rect,
        }
    }
}

/// Query result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Selector queried.
    pub selector: String,
    /// All matches in the document.
    pub total: usize,
    /// Summaries of the first matches.
    pub elements: Vec<ElementSummary>,
}

/// Acknowledgement of an element action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActionResult<'a> {
    action: &'a str,
    selector: &'a str,
    tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

// ============================================================================
// Bridge - DOM
// ============================================================================

impl Bridge {
    pub(crate) fn dom_query(&self, selector: &str, limit: Option<usize>) -> Result<Reply> {
        let document = &self.inner.hosts.document;
        let matches = document.query(selector, None)?;
        let limit = limit.unwrap_or(self.inner.config.limits.query_results);

        let elements = matches
            .iter()
            .take(limit)
            .map(|el| Ok(ElementSummary::new(document.describe(el)?, document.bounding_rect(el)?)))
            .collect::<Result<Vec<_>>>()?;

        to_json_text(&QueryResult {
            selector: selector.to_string(),
            total: matches.len(),
            elements,
        })
        .map(Some)
    }

    pub(crate) async fn dom_click(&self, selector: &str) -> Result<Reply> {
        let element = self.resolve(selector)?;
        self.settle().await;

        let document = &self.inner.hosts.document;
        document.click(&element)?;
        debug!(selector, "Clicked");

        self.action("click", selector, &element)
    }

    pub(crate) async fn dom_type(&self, selector: &str, text: &str, clear: bool) -> Result<Reply> {
        let element = self.resolve(selector)?;
        let document = &self.inner.hosts.document;
        document.focus(&element)?;
        self.settle().await;

        document.insert_text(&element, text, clear)?;
        self.action("type", selector, &element)
    }

    pub(crate) async fn dom_paste(&self, selector: &str, text: &str) -> Result<Reply> {
        let element = self.resolve(selector)?;
        let document = &self.inner.hosts.document;
        document.focus(&element)?;
        self.settle().await;

        document.paste(&element, text)?;
        self.action("paste", selector, &element)
    }

    pub(crate) async fn dom_focus(&self, selector: &str) -> Result<Reply> {
        let element = self.resolve(selector)?;
        self.settle().await;

        self.inner.hosts.document.focus(&element)?;
        self.action("focus", selector, &element)
    }

    /// Dispatches a key to the matched element, or the active element.
    pub(crate) fn dom_keypress(
        &self,
        selector: Option<&str>,
        key: &str,
        [ctrl, shift, alt, meta]: [bool; 4],
    ) -> Result<Reply> {
        let event = KeyEvent::resolve(
            key,
            Modifiers {
                ctrl,
                shift,
                alt,
                meta,
            },
        )?;
        let element = selector.map(|s| self.resolve(s)).transpose()?;
        self.inner.hosts.document.key(element.as_ref(), &event)?;
        to_json_text(&event).map(Some)
    }

    pub(crate) fn dom_scroll(
        &self,
        selector: Option<&str>,
        x: Option<f64>,
        y: Option<f64>,
        mode: ScrollMode,
    ) -> Result<Reply> {
        let target = match selector {
            Some(selector) => ScrollTarget::Element(self.resolve(selector)?),
            None => {
                let (x, y) = (x.unwrap_or(0.0), y.unwrap_or(0.0));
                match mode {
                    ScrollMode::By => ScrollTarget::By { x, y },
                    ScrollMode::To => ScrollTarget::To { x, y },
                }
            }
        };
        let viewport: Viewport = self.inner.hosts.document.scroll(&target)?;
        to_json_text(&viewport).map(Some)
    }

    fn action(&self, action: &str, selector: &str, element: &ElementId) -> Result<Reply> {
        let info = self.inner.hosts.document.describe(element)?;
        to_json_text(&ActionResult {
            action,
            selector,
            tag: info.tag,
            value: info.value,
        })
        .map(Some)
    }
}

// ============================================================================
// Tests
// ============================================================================
