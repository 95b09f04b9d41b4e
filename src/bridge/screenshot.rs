//! Screenshot handlers.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::error::{Error, Result};
use crate::identifiers::ScreenshotId;
use crate::protocol::to_json_text;
use crate::screenshot::{
    ImageFormat, RenderRequest, ScreenshotFormat, ScreenshotSummary, compare, render, screenshot,
};

use super::Bridge;
use super::dispatch::Reply;

#[derive(Serialize)]
struct Cleared {
    cleared: usize,
}

// ============================================================================
// Bridge - Screenshot
// ============================================================================

impl Bridge {
    /// Renders the page, or one element, and caches the image.
    pub(crate) fn screenshot_capture(
        &self,
        id: Option<ScreenshotId>,
        selector: Option<String>,
        full_page: bool,
        format: ScreenshotFormat,
        quality: Option<u8>,
        scale: Option<f64>,
    ) -> Result<Reply> {
        let document = &self.inner.hosts.document;
        let element = self.resolve_or_root(selector.as_deref())?;

        let (css_width, css_height) = if full_page {
            document.page_size()?
        } else if selector.is_some() {
            let rect = document.bounding_rect(&element)?;
            (rect.width, rect.height)
        } else {
            let viewport = document.viewport()?;
            (viewport.width, viewport.height)
        };

        let format = ImageFormat::from_request(format, quality);
        let request = RenderRequest {
            markup: document.outer_html(&element)?,
            css_width,
            css_height,
            scale: scale.unwrap_or(1.0),
            format,
        };
        let rendered = render(self.inner.hosts.rasterizer.as_ref(), &request)?;

        let id = id.unwrap_or_else(ScreenshotId::generate);
        let shot = screenshot(id.clone(), rendered, format, selector, full_page);
        let view = shot.view();
        self.inner.screenshots.lock().insert(id, shot);

        to_json_text(&view).map(Some)
    }

    pub(crate) fn screenshot_get(&self, id: &ScreenshotId) -> Result<Reply> {
        let shot = self
            .inner
            .screenshots
            .lock()
            .get(id)
            .ok_or_else(|| Error::screenshot_not_found(id.clone()))?;
        to_json_text(&shot.view()).map(Some)
    }

    pub(crate) fn screenshot_list(&self) -> Result<Reply> {
        let list: Vec<ScreenshotSummary> = self
            .inner
            .screenshots
            .lock()
            .iter()
            .map(|(_, shot)| shot.summary())
            .collect();
        to_json_text(&list).map(Some)
    }

    pub(crate) fn screenshot_clear(&self) -> Result<Reply> {
        let cleared = self.inner.screenshots.lock().clear();
        to_json_text(&Cleared { cleared }).map(Some)
    }

    pub(crate) fn screenshot_compare(&self, first: &ScreenshotId, second: &ScreenshotId) -> Result<Reply> {
        let (a, b) = {
            let cache = self.inner.screenshots.lock();
            (cache.get(first), cache.get(second))
        };
        let a = a.ok_or_else(|| Error::screenshot_not_found(first.clone()))?;
        let b = b.ok_or_else(|| Error::screenshot_not_found(second.clone()))?;
        to_json_text(&compare(&a, &b)).map(Some)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::testing::Harness;

    fn harness() -> Harness {
        Harness::with_rasterizer()
    }

    #[tokio::test]
    async fn test_capture_viewport_png() {
        let mut h = harness();
        let reply = h
            .call(json!({"type": "screenshot_capture", "id": "1", "screenshotId": "home"}))
            .await;
        let shot = Harness::result_of(&reply);
        assert_eq!(shot["id"], "home");
        assert_eq!(shot["width"], 1280);
        assert_eq!(shot["height"], 720);
        assert_eq!(shot["format"], "png");
        assert!(shot["dataUrl"].as_str().unwrap_or_default().starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_capture_element_jpeg_scaled() {
        let mut h = harness();
        let body = h.document.body();
        h.document.append(&body, "div", &[("id", "card")]);

        let reply = h
            .call(json!({
                "type": "screenshot_capture",
                "id": "1",
                "selector": "#card",
                "format": "jpeg",
                "quality": 70,
                "scale": 2.0,
            }))
            .await;
        let shot = Harness::result_of(&reply);
        assert_eq!(shot["format"], "jpeg");
        assert_eq!(shot["selector"], "#card");
        assert_eq!(shot["width"], 200);
        assert_eq!(shot["height"], 40);
        assert!(h.rasterizer_svg().contains(r#"id="card""#));
    }

    #[tokio::test]
    async fn test_full_page_get_compare_clear() {
        let mut h = harness();
        h.call(json!({"type": "screenshot_capture", "id": "1", "screenshotId": "a", "fullPage": true}))
            .await;
        h.call(json!({"type": "screenshot_capture", "id": "2", "screenshotId": "b", "fullPage": true}))
            .await;

        let reply = h.call(json!({"type": "screenshot_get", "id": "3", "screenshotId": "a"})).await;
        assert_eq!(Harness::result_of(&reply)["height"], 2000);
        assert_eq!(Harness::result_of(&reply)["fullPage"], true);

        let reply = h
            .call(json!({"type": "screenshot_compare", "id": "4", "firstId": "a", "secondId": "b"}))
            .await;
        let comparison = Harness::result_of(&reply);
        assert_eq!(comparison["sameDimensions"], true);
        assert_eq!(comparison["identical"], true);

        let reply = h.call(json!({"type": "screenshot_list", "id": "5"})).await;
        assert!(Harness::result_of(&reply)[0].get("dataUrl").is_none());

        let reply = h.call(json!({"type": "screenshot_clear", "id": "6"})).await;
        assert_eq!(Harness::result_of(&reply)["cleared"], 2);

        let reply = h.call(json!({"type": "screenshot_get", "id": "7", "screenshotId": "a"})).await;
        assert_eq!(Harness::error_of(&reply)["message"], "Screenshot not found: a");
    }

    #[tokio::test]
    async fn test_without_rasterizer_is_unsupported() {
        let mut h = Harness::new();
        let reply = h.call(json!({"type": "screenshot_capture", "id": "1"})).await;
        assert_eq!(Harness::error_of(&reply)["type"], "unsupported");
    }
}
