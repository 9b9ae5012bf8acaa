//! CDP page session for driving a single tab.
//!
//! Exposes the capability set the harvest loop needs: navigate, bounded
//! waits, positional selector queries, clicks, text/attribute reads, and
//! history-back. All waits are polling with fixed timeouts.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::debug;

use super::client::Transport;
use super::error::BrowserError;
use super::protocol::{BoxModel, MouseButton, MouseEventType};

/// Poll step used by the bounded waits.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A session attached to a single page/target.
pub struct PageSession {
    target_id: String,
    session_id: String,
    transport: Arc<Transport>,
}

impl PageSession {
    pub(crate) fn new(target_id: String, session_id: String, transport: Arc<Transport>) -> Self {
        Self {
            target_id,
            session_id,
            transport,
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Send a CDP command scoped to this page.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, BrowserError> {
        self.transport
            .call(method, params, Some(&self.session_id))
            .await
    }

    /// Enable the CDP domains the session relies on.
    pub(crate) async fn enable_domains(&self) -> Result<(), BrowserError> {
        self.call("Page.enable", None).await?;
        self.call("DOM.enable", None).await?;
        self.call("Runtime.enable", None).await?;
        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Navigate to `url` and wait for the document to load.
    pub async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), BrowserError> {
        let result = self
            .call("Page.navigate", Some(json!({"url": url})))
            .await?;

        if let Some(error) = result.get("errorText") {
            return Err(BrowserError::NavigationFailed(
                error.as_str().unwrap_or("Unknown error").to_string(),
            ));
        }

        self.wait_for_load(timeout).await?;
        debug!("Navigated to {}", url);
        Ok(())
    }

    /// Poll `document.readyState` until the page is usable.
    pub async fn wait_for_load(&self, timeout: Duration) -> Result<(), BrowserError> {
        let start = std::time::Instant::now();
        loop {
            let result = self.evaluate("document.readyState").await?;
            if let Some(state) = result.as_str() {
                if state == "complete" || state == "interactive" {
                    return Ok(());
                }
            }
            if start.elapsed() > timeout {
                return Err(BrowserError::Timeout("Page load timeout".to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Navigate one entry back in this tab's history and wait for load.
    pub async fn go_back(&self, timeout: Duration) -> Result<(), BrowserError> {
        let history = self.call("Page.getNavigationHistory", None).await?;
        let current_index = history["currentIndex"].as_i64().unwrap_or(0);

        if current_index > 0 {
            if let Some(entries) = history["entries"].as_array() {
                if let Some(entry) = entries.get((current_index - 1) as usize) {
                    let entry_id = entry["id"].as_i64().unwrap_or(0);
                    self.call(
                        "Page.navigateToHistoryEntry",
                        Some(json!({"entryId": entry_id})),
                    )
                    .await?;
                    self.wait_for_load(timeout).await?;
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // JavaScript
    // ------------------------------------------------------------------

    /// Evaluate a JavaScript expression, returning its value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, BrowserError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        if let Some(exception) = result.get("exceptionDetails") {
            let text = exception["text"].as_str().unwrap_or("Unknown error");
            return Err(BrowserError::JavaScript(text.to_string()));
        }

        Ok(result["result"]["value"].clone())
    }

    // ------------------------------------------------------------------
    // DOM queries
    // ------------------------------------------------------------------

    async fn document_node_id(&self) -> Result<i64, BrowserError> {
        let result = self.call("DOM.getDocument", Some(json!({"depth": 0}))).await?;
        result["root"]["nodeId"]
            .as_i64()
            .ok_or_else(|| BrowserError::InvalidResponse("Missing document nodeId".to_string()))
    }

    /// Query one element; `None` when nothing matches.
    pub async fn query_selector(&self, selector: &str) -> Result<Option<i64>, BrowserError> {
        let doc = self.document_node_id().await?;
        let result = self
            .call(
                "DOM.querySelector",
                Some(json!({"nodeId": doc, "selector": selector})),
            )
            .await?;

        match result["nodeId"].as_i64() {
            Some(0) | None => Ok(None),
            Some(node_id) => Ok(Some(node_id)),
        }
    }

    /// Query all matching elements.
    pub async fn query_selector_all(&self, selector: &str) -> Result<Vec<i64>, BrowserError> {
        let doc = self.document_node_id().await?;
        let result = self
            .call(
                "DOM.querySelectorAll",
                Some(json!({"nodeId": doc, "selector": selector})),
            )
            .await?;

        let node_ids: Vec<i64> = result["nodeIds"]
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_i64()).collect())
            .unwrap_or_default();

        Ok(node_ids)
    }

    /// Wait (bounded) for a selector to be present; returns its node id.
    pub async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<i64, BrowserError> {
        let start = std::time::Instant::now();
        loop {
            if let Some(node_id) = self.query_selector(selector).await? {
                return Ok(node_id);
            }
            if start.elapsed() > timeout {
                return Err(BrowserError::Timeout(format!(
                    "Waiting for selector '{}' timed out",
                    selector
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Read an element's trimmed text content.
    pub async fn text(&self, selector: &str) -> Result<String, BrowserError> {
        let expr = format!(
            "(() => {{ const el = document.querySelector({sel}); \
             return el ? el.textContent.trim() : null; }})()",
            sel = js_string(selector)
        );
        match self.evaluate(&expr).await? {
            Value::String(s) => Ok(s),
            Value::Null => Err(BrowserError::ElementNotFound(selector.to_string())),
            other => Ok(other.to_string()),
        }
    }

    /// Read an element's attribute. The DOM property is read first so link
    /// reads (`href`) resolve to absolute URLs.
    pub async fn attribute(&self, selector: &str, name: &str) -> Result<String, BrowserError> {
        let expr = format!(
            "(() => {{ const el = document.querySelector({sel}); if (!el) return null; \
             const v = el[{name}] !== undefined ? el[{name}] : el.getAttribute({name}); \
             return v == null ? null : String(v); }})()",
            sel = js_string(selector),
            name = js_string(name)
        );
        match self.evaluate(&expr).await? {
            Value::String(s) => Ok(s),
            Value::Null => Err(BrowserError::ElementNotFound(format!(
                "{} [{}]",
                selector, name
            ))),
            other => Ok(other.to_string()),
        }
    }

    // ------------------------------------------------------------------
    // Interaction
    // ------------------------------------------------------------------

    /// Scroll an element into view.
    pub async fn scroll_into_view(&self, node_id: i64) -> Result<(), BrowserError> {
        self.call(
            "DOM.scrollIntoViewIfNeeded",
            Some(json!({"nodeId": node_id})),
        )
        .await?;
        Ok(())
    }

    async fn get_box_model(&self, node_id: i64) -> Result<Option<BoxModel>, BrowserError> {
        let result = self
            .call("DOM.getBoxModel", Some(json!({"nodeId": node_id})))
            .await;

        match result {
            Ok(r) => {
                let model: BoxModel = serde_json::from_value(r["model"].clone())?;
                Ok(Some(model))
            }
            // -32000: node has no layout (hidden or detached).
            Err(BrowserError::Protocol { code: -32000, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Dispatch a left click at page coordinates.
    async fn click_at(&self, x: f64, y: f64) -> Result<(), BrowserError> {
        for event in [MouseEventType::MousePressed, MouseEventType::MouseReleased] {
            self.call(
                "Input.dispatchMouseEvent",
                Some(json!({
                    "type": event,
                    "x": x,
                    "y": y,
                    "button": MouseButton::Left,
                    "clickCount": 1,
                })),
            )
            .await?;
        }
        debug!("Clicked at ({}, {})", x, y);
        Ok(())
    }

    /// Scroll a node into view and click its center.
    pub async fn click_node(&self, node_id: i64, selector: &str) -> Result<(), BrowserError> {
        self.scroll_into_view(node_id).await?;

        let box_model = self
            .get_box_model(node_id)
            .await?
            .ok_or_else(|| BrowserError::ElementNotFound(format!("{} (not visible)", selector)))?;

        let (x, y) = quad_center(&box_model.content);
        self.click_at(x, y).await
    }
}

/// Center point of a CDP content quad (`[x1,y1,...,x4,y4]`).
fn quad_center(quad: &[f64]) -> (f64, f64) {
    if quad.len() >= 8 {
        let x = (quad[0] + quad[2] + quad[4] + quad[6]) / 4.0;
        let y = (quad[1] + quad[3] + quad[5] + quad[7]) / 4.0;
        (x, y)
    } else {
        (0.0, 0.0)
    }
}

/// Quote a string as a JavaScript string literal.
fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_center_averages_corners() {
        let quad = vec![0.0, 0.0, 100.0, 0.0, 100.0, 100.0, 0.0, 100.0];
        assert_eq!(quad_center(&quad), (50.0, 50.0));
    }

    #[test]
    fn quad_center_tolerates_short_quads() {
        assert_eq!(quad_center(&[1.0, 2.0]), (0.0, 0.0));
    }

    #[test]
    fn js_string_escapes_quotes() {
        assert_eq!(js_string(r#"tr[data-x="1"]"#), r#""tr[data-x=\"1\"]""#);
    }
}
