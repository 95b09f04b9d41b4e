//! In-memory hosts and a harness for driving a bridge without a socket.

// ============================================================================
// Imports
// ============================================================================

use std::collections::{BTreeMap, HashMap, HashSet};
use std::result::Result as StdResult;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use crate::bridge::Bridge;
use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::host::{
    DocumentHost, ElementInfo, Evaluation, FileHost, KeyEvent, Rasterizer, Rect, ScriptError,
    ScriptHost, ScriptValue, ScrollTarget, ShellExit, ShellHost, ShellOutput, ShellRequest,
    StorageHost, StorageScope, TelemetryHost, TelemetryStream, Viewport,
};
use crate::identifiers::ElementId;

const TEST_URL: &str = "ws://127.0.0.1:9/bridge";
const TEST_PAGE: &str = "test-page";

/// Installs a test-writer subscriber once. Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Harness
// ============================================================================

/// A bridge wired to in-memory hosts with its outbox open on a channel.
pub struct Harness {
    pub bridge: Bridge,
    pub rx: mpsc::UnboundedReceiver<String>,
    pub script: Arc<FakeScript>,
    pub document: Arc<FakeDocument>,
    pub shell: Arc<FakeShell>,
    pub storage: Arc<MemoryStorage>,
    pub telemetry: Arc<RecordingTelemetry>,
    pub files: Arc<MemoryFiles>,
    pub rasterizer: Arc<SolidRasterizer>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Wiring {
    Minimal,
    Standard,
    WithRasterizer,
}

impl Harness {
    /// Every host except the rasterizer.
    pub fn new() -> Self {
        Self::build(BridgeConfig::new(), Wiring::Standard)
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        Self::build(config, Wiring::Standard)
    }

    pub fn with_rasterizer() -> Self {
        Self::build(BridgeConfig::new(), Wiring::WithRasterizer)
    }

    /// Only the required script and document hosts.
    pub fn minimal() -> Self {
        Self::build(BridgeConfig::new(), Wiring::Minimal)
    }

    fn build(config: BridgeConfig, wiring: Wiring) -> Self {
        init_tracing();

        let script = Arc::new(FakeScript::new());
        let document = Arc::new(FakeDocument::new());
        let shell = Arc::new(FakeShell::default());
        let storage = Arc::new(MemoryStorage::default());
        let telemetry = Arc::new(RecordingTelemetry::default());
        let files = Arc::new(MemoryFiles::default());
        let rasterizer = Arc::new(SolidRasterizer::default());

        let mut builder = Bridge::builder()
            .config(config)
            .controller_url(TEST_URL)
            .page(TEST_PAGE)
            .script_host(Arc::clone(&script))
            .document_host(Arc::clone(&document));
        if wiring != Wiring::Minimal {
            builder = builder
                .shell_host(Arc::clone(&shell))
                .storage_host(Arc::clone(&storage))
                .telemetry_host(Arc::clone(&telemetry))
                .file_host(Arc::clone(&files));
        }
        if wiring == Wiring::WithRasterizer {
            builder = builder.rasterizer(Arc::clone(&rasterizer));
        }
        let bridge = builder.build().expect("harness bridge");

        let (tx, mut rx) = mpsc::unbounded_channel();
        bridge.inner.outbox.open(tx);
        let ready: Value = serde_json::from_str(&rx.try_recv().expect("ready")).expect("json");
        assert_eq!(ready["type"], "ready");

        Self {
            bridge,
            rx,
            script,
            document,
            shell,
            storage,
            telemetry,
            files,
            rasterizer,
        }
    }

    /// Handles one command and returns its result envelope.
    pub async fn call(&mut self, command: Value) -> Value {
        self.bridge.handle_text(&command.to_string()).await;
        while let Some(message) = self.try_next() {
            if message["type"] == "result" {
                return message;
            }
        }
        panic!("no result for {command}");
    }

    /// Next outbound envelope, if one is waiting.
    pub fn try_next(&mut self) -> Option<Value> {
        let text = self.rx.try_recv().ok()?;
        Some(serde_json::from_str(&text).expect("outbound json"))
    }

    /// Parses the serialized `result` field.
    pub fn result_of(reply: &Value) -> Value {
        let text = reply["result"].as_str().expect("result text");
        serde_json::from_str(text).expect("result json")
    }

    /// Parses the serialized `error` field.
    pub fn error_of(reply: &Value) -> Value {
        let text = reply["error"].as_str().expect("error text");
        serde_json::from_str(text).expect("error json")
    }

    /// Markup handed to the rasterizer by the last render.
    pub fn rasterizer_svg(&self) -> String {
        self.rasterizer.last.lock().clone().unwrap_or_default()
    }
}

// ============================================================================
// FakeScript
// ============================================================================

/// Canned evaluation outcome.
#[derive(Debug, Clone)]
pub enum Scripted {
    Value(ScriptValue),
    Throw(ScriptError),
    Resolve { after: Duration, value: ScriptValue },
    Reject { after: Duration, error: ScriptError },
}

/// Script host answering from a table of code strings.
#[derive(Default)]
pub struct FakeScript {
    table: Mutex<HashMap<String, Scripted>>,
    /// Deferred evaluations that have settled.
    pub completed: Arc<AtomicUsize>,
}

impl FakeScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, code: &str, outcome: Scripted) {
        self.table.lock().insert(code.to_string(), outcome);
    }
}

impl ScriptHost for FakeScript {
    fn evaluate(&self, code: &str) -> StdResult<Evaluation, ScriptError> {
        let Some(outcome) = self.table.lock().get(code).cloned() else {
            return Err(ScriptError::new(
                "ReferenceError",
                format!("{code} is not defined"),
            ));
        };

        let completed = Arc::clone(&self.completed);
        let settle = move |after: Duration, result: StdResult<ScriptValue, ScriptError>| {
            Evaluation::Deferred(Box::pin(async move {
                tokio::time::sleep(after).await;
                completed.fetch_add(1, Ordering::SeqCst);
                result
            }))
        };

        match outcome {
            Scripted::Value(value) => Ok(Evaluation::Ready(value)),
            Scripted::Throw(error) => Err(error),
            Scripted::Resolve { after, value } => Ok(settle(after, Ok(value))),
            Scripted::Reject { after, error } => Ok(settle(after, Err(error))),
        }
    }
}

// ============================================================================
// FakeShell
// ============================================================================

/// Canned command behavior.
#[derive(Debug, Clone, Default)]
pub struct ShellScript {
    chunks: Vec<ShellOutput>,
    code: i32,
    cwd: Option<String>,
    delay: Duration,
}

impl ShellScript {
    pub fn exits(code: i32) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }

    pub fn with_stdout(mut self, text: &str) -> Self {
        self.chunks.push(ShellOutput::stdout(text));
        self
    }

    pub fn with_stderr(mut self, text: &str) -> Self {
        self.chunks.push(ShellOutput::stderr(text));
        self
    }

    pub fn with_cwd(mut self, cwd: &str) -> Self {
        self.cwd = Some(cwd.to_string());
        self
    }

    /// Delay between the last chunk and the exit.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Shell host answering from a table of command lines.
#[derive(Default)]
pub struct FakeShell {
    table: Mutex<HashMap<String, ShellScript>>,
    last: Mutex<Option<ShellRequest>>,
}

impl FakeShell {
    pub fn on(&self, command: &str, script: ShellScript) {
        self.table.lock().insert(command.to_string(), script);
    }

    pub fn last_request(&self) -> Option<ShellRequest> {
        self.last.lock().clone()
    }
}

#[async_trait]
impl ShellHost for FakeShell {
    async fn run(
        &self,
        request: ShellRequest,
        output: mpsc::UnboundedSender<ShellOutput>,
    ) -> Result<ShellExit> {
        let script = self.table.lock().get(&request.command).cloned();
        let command = request.command.clone();
        *self.last.lock() = Some(request);

        let Some(script) = script else {
            let _ = output.send(ShellOutput::stderr(format!("command not found: {command}\n")));
            return Ok(ShellExit {
                code: 127,
                cwd: None,
            });
        };

        for chunk in script.chunks {
            let _ = output.send(chunk);
        }
        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }

        Ok(ShellExit {
            code: script.code,
            cwd: script.cwd,
        })
    }
}

// ============================================================================
// MemoryStorage
// ============================================================================

#[derive(Default)]
pub struct MemoryStorage {
    scopes: Mutex<HashMap<StorageScope, BTreeMap<String, String>>>,
}

impl StorageHost for MemoryStorage {
    fn entries(&self, scope: StorageScope) -> Result<Vec<(String, String)>> {
        Ok(self
            .scopes
            .lock()
            .get(&scope)
            .map(|entries| entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }

    fn get(&self, scope: StorageScope, key: &str) -> Result<Option<String>> {
        Ok(self
            .scopes
            .lock()
            .get(&scope)
            .and_then(|entries| entries.get(key).cloned()))
    }

    fn set(&self, scope: StorageScope, key: &str, value: &str) -> Result<()> {
        self.scopes
            .lock()
            .entry(scope)
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, scope: StorageScope, key: &str) -> Result<()> {
        if let Some(entries) = self.scopes.lock().get_mut(&scope) {
            entries.remove(key);
        }
        Ok(())
    }

    fn clear(&self, scope: StorageScope) -> Result<()> {
        self.scopes.lock().remove(&scope);
        Ok(())
    }
}

// ============================================================================
// SolidRasterizer
// ============================================================================

/// Paints every render white and keeps the last SVG.
#[derive(Default)]
pub struct SolidRasterizer {
    last: Mutex<Option<String>>,
}

impl Rasterizer for SolidRasterizer {
    fn rasterize(&self, svg: &str, width: u32, height: u32) -> Result<RgbaImage> {
        *self.last.lock() = Some(svg.to_string());
        Ok(RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])))
    }
}

// ============================================================================
// RecordingTelemetry
// ============================================================================

#[derive(Default)]
pub struct RecordingTelemetry {
    subscribed: Mutex<HashSet<TelemetryStream>>,
    refused: Mutex<HashSet<TelemetryStream>>,
}

impl RecordingTelemetry {
    pub fn is_subscribed(&self, stream: TelemetryStream) -> bool {
        self.subscribed.lock().contains(&stream)
    }

    /// Makes later subscriptions to `stream` fail.
    pub fn refuse(&self, stream: TelemetryStream) {
        self.refused.lock().insert(stream);
    }
}

impl TelemetryHost for RecordingTelemetry {
    fn subscribe(&self, stream: TelemetryStream) -> Result<()> {
        if self.refused.lock().contains(&stream) {
            return Err(Error::unsupported(format!("{stream:?}")));
        }
        self.subscribed.lock().insert(stream);
        Ok(())
    }

    fn unsubscribe(&self, stream: TelemetryStream) {
        self.subscribed.lock().remove(&stream);
    }
}

// ============================================================================
// MemoryFiles
// ============================================================================

#[derive(Default)]
pub struct MemoryFiles {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryFiles {
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().get(path).cloned()
    }
}

#[async_trait]
impl FileHost for MemoryFiles {
    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.files
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::host(format!("No such file: {path}")))
    }

    async fn write(&self, path: &str, data: Vec<u8>) -> Result<()> {
        self.files.lock().insert(path.to_string(), data);
        Ok(())
    }
}

// ============================================================================
// FakeDocument
// ============================================================================

const VIEWPORT_WIDTH: f64 = 1280.0;
const VIEWPORT_HEIGHT: f64 = 720.0;
const PAGE_HEIGHT: f64 = 2000.0;
const ROW_HEIGHT: f64 = 20.0;

const EDITABLE: [&str; 3] = ["input", "textarea", "select"];
const VOID: [&str; 4] = ["input", "img", "br", "hr"];

struct Node {
    tag: String,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    value: Option<String>,
    parent: Option<usize>,
    children: Vec<usize>,
    detached: bool,
}

impl Node {
    fn new(tag: &str, parent: Option<usize>) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            text: None,
            value: None,
            parent,
            children: Vec::new(),
            detached: false,
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or_default().split_whitespace()
    }

    fn is_editable(&self) -> bool {
        EDITABLE.contains(&self.tag.as_str()) || self.attr("contenteditable").is_some()
    }
}

struct DocumentState {
    nodes: Vec<Node>,
    focused: Option<usize>,
    clicks: Vec<ElementId>,
    keys: Vec<KeyEvent>,
    scroll: (f64, f64),
}

impl DocumentState {
    fn index(&self, element: &ElementId) -> Result<usize> {
        element
            .as_str()
            .strip_prefix('e')
            .and_then(|n| n.parse::<usize>().ok())
            .filter(|&idx| self.nodes.get(idx).is_some_and(|node| !node.detached))
            .ok_or_else(|| Error::stale_element(element.clone()))
    }

    /// Preorder walk of the subtree under `root`, excluding `root`.
    fn descendants(&self, root: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.nodes[root].children.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            out.push(idx);
            stack.extend(self.nodes[idx].children.iter().rev().copied());
        }
        out
    }

    fn position(&self, idx: usize) -> usize {
        if idx == 0 {
            return 0;
        }
        self.descendants(0)
            .iter()
            .position(|&i| i == idx)
            .map_or(0, |p| p + 1)
    }

    fn matches(&self, idx: usize, compound: &Compound) -> bool {
        let node = &self.nodes[idx];
        compound.tag.as_ref().is_none_or(|tag| *tag == node.tag)
            && compound.id.as_deref().is_none_or(|id| node.attr("id") == Some(id))
            && compound
                .classes
                .iter()
                .all(|class| node.classes().any(|c| c == class))
            && compound.attrs.iter().all(|(name, value)| match value {
                Some(value) => node.attr(name) == Some(value.as_str()),
                None => node.attr(name).is_some(),
            })
    }

    fn matches_chain(&self, idx: usize, chain: &[Compound]) -> bool {
        let Some((last, ancestors)) = chain.split_last() else {
            return false;
        };
        if !self.matches(idx, last) {
            return false;
        }

        let mut current = self.nodes[idx].parent;
        for compound in ancestors.iter().rev() {
            loop {
                let Some(parent) = current else {
                    return false;
                };
                current = self.nodes[parent].parent;
                if self.matches(parent, compound) {
                    break;
                }
            }
        }
        true
    }

    fn render(&self, idx: usize, out: &mut String) {
        let node = &self.nodes[idx];
        out.push('<');
        out.push_str(&node.tag);
        for (name, value) in &node.attrs {
            out.push_str(&format!(r#" {name}="{}""#, escape(value)));
        }
        out.push('>');
        if VOID.contains(&node.tag.as_str()) {
            return;
        }
        if let Some(text) = &node.text {
            out.push_str(&escape(text));
        }
        for &child in &node.children {
            self.render(child, out);
        }
        out.push_str(&format!("</{}>", node.tag));
    }

    fn detach(&mut self, idx: usize) {
        self.nodes[idx].detached = true;
        for child in self.nodes[idx].children.clone() {
            self.detach(child);
        }
    }
}

/// In-memory document with a small CSS selector engine.
///
/// Supports tag, `#id`, `.class`, `[attr]`, and `[attr=value]` compounds,
/// descendant combinators, and comma-separated groups. Every element is laid
/// out as a 100x20 row in document order; `hidden` elements have no box.
pub struct FakeDocument {
    state: Mutex<DocumentState>,
}

impl Default for FakeDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDocument {
    /// Creates a document holding an empty body.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DocumentState {
                nodes: vec![Node::new("body", None)],
                focused: None,
                clicks: Vec::new(),
                keys: Vec::new(),
                scroll: (0.0, 0.0),
            }),
        }
    }

    pub fn body(&self) -> ElementId {
        element_id(0)
    }

    pub fn append(&self, parent: &ElementId, tag: &str, attrs: &[(&str, &str)]) -> ElementId {
        let mut state = self.state.lock();
        let parent = state.index(parent).expect("live parent");
        let mut node = Node::new(tag, Some(parent));
        for (name, value) in attrs {
            node.set_attr(name, value);
        }
        let idx = state.nodes.len();
        state.nodes.push(node);
        state.nodes[parent].children.push(idx);
        element_id(idx)
    }

    pub fn append_text(&self, parent: &ElementId, tag: &str, text: &str) -> ElementId {
        let element = self.append(parent, tag, &[]);
        self.set_text(&element, text);
        element
    }

    pub fn set_attr(&self, element: &ElementId, name: &str, value: &str) {
        let mut state = self.state.lock();
        let idx = state.index(element).expect("live element");
        state.nodes[idx].set_attr(name, value);
    }

    pub fn set_text(&self, element: &ElementId, text: &str) {
        let mut state = self.state.lock();
        let idx = state.index(element).expect("live element");
        state.nodes[idx].text = Some(text.to_string());
    }

    pub fn remove(&self, element: &ElementId) {
        let mut state = self.state.lock();
        let idx = state.index(element).expect("live element");
        if let Some(parent) = state.nodes[idx].parent {
            state.nodes[parent].children.retain(|&c| c != idx);
        }
        state.detach(idx);
    }

    pub fn query_one(&self, selector: &str) -> ElementId {
        self.query(selector, None)
            .expect("selector")
            .into_iter()
            .next()
            .expect("match")
    }

    pub fn clicks(&self) -> Vec<ElementId> {
        self.state.lock().clicks.clone()
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.state.lock().focused.map(element_id)
    }

    pub fn keys(&self) -> Vec<KeyEvent> {
        self.state.lock().keys.clone()
    }
}

impl DocumentHost for FakeDocument {
    fn root(&self) -> Result<ElementId> {
        Ok(element_id(0))
    }

    fn query(&self, selector: &str, scope: Option<&ElementId>) -> Result<Vec<ElementId>> {
        let groups = parse_selector(selector)?;
        let state = self.state.lock();

        let candidates = match scope {
            Some(scope) => state.descendants(state.index(scope)?),
            None => {
                let mut all = vec![0];
                all.extend(state.descendants(0));
                all
            }
        };

        Ok(candidates
            .into_iter()
            .filter(|&idx| groups.iter().any(|chain| state.matches_chain(idx, chain)))
            .map(element_id)
            .collect())
    }

    fn describe(&self, element: &ElementId) -> Result<ElementInfo> {
        let state = self.state.lock();
        let node = &state.nodes[state.index(element)?];

        Ok(ElementInfo {
            tag: node.tag.clone(),
            id: node.attr("id").filter(|id| !id.is_empty()).map(str::to_string),
            classes: node.classes().map(str::to_string).collect(),
            attrs: node
                .attrs
                .iter()
                .filter(|(name, _)| name != "id" && name != "class")
                .cloned()
                .collect(),
            text: node
                .text
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            value: EDITABLE
                .contains(&node.tag.as_str())
                .then(|| node.value.clone().unwrap_or_default()),
        })
    }

    fn children(&self, element: &ElementId) -> Result<Vec<ElementId>> {
        let state = self.state.lock();
        let idx = state.index(element)?;
        Ok(state.nodes[idx].children.iter().copied().map(element_id).collect())
    }

    fn outer_html(&self, element: &ElementId) -> Result<String> {
        let state = self.state.lock();
        let idx = state.index(element)?;
        let mut out = String::new();
        state.render(idx, &mut out);
        Ok(out)
    }

    fn bounding_rect(&self, element: &ElementId) -> Result<Rect> {
        let state = self.state.lock();
        let idx = state.index(element)?;
        if state.nodes[idx].attr("hidden").is_some() {
            return Ok(Rect::default());
        }
        Ok(Rect {
            x: 0.0,
            y: state.position(idx) as f64 * ROW_HEIGHT,
            width: 100.0,
            height: ROW_HEIGHT,
        })
    }

    fn click(&self, element: &ElementId) -> Result<()> {
        let mut state = self.state.lock();
        state.index(element)?;
        state.clicks.push(element.clone());
        Ok(())
    }

    fn focus(&self, element: &ElementId) -> Result<()> {
        let mut state = self.state.lock();
        let idx = state.index(element)?;
        state.focused = Some(idx);
        Ok(())
    }

    fn insert_text(&self, element: &ElementId, text: &str, replace: bool) -> Result<()> {
        let mut state = self.state.lock();
        let idx = state.index(element)?;
        let node = &mut state.nodes[idx];
        if !node.is_editable() {
            return Err(Error::host(format!("<{}> is not editable", node.tag)));
        }
        let value = node.value.get_or_insert_with(String::new);
        if replace {
            value.clear();
        }
        value.push_str(text);
        Ok(())
    }

    fn paste(&self, element: &ElementId, text: &str) -> Result<()> {
        self.insert_text(element, text, false)
    }

    fn key(&self, element: Option<&ElementId>, event: &KeyEvent) -> Result<()> {
        let mut state = self.state.lock();
        if let Some(element) = element {
            state.index(element)?;
        }
        state.keys.push(event.clone());
        Ok(())
    }

    fn scroll(&self, target: &ScrollTarget) -> Result<Viewport> {
        let max_y = PAGE_HEIGHT - VIEWPORT_HEIGHT;
        let (x, y) = {
            let state = self.state.lock();
            match target {
                ScrollTarget::By { x, y } => (state.scroll.0 + x, state.scroll.1 + y),
                ScrollTarget::To { x, y } => (*x, *y),
                ScrollTarget::Element(element) => {
                    let idx = state.index(element)?;
                    (0.0, state.position(idx) as f64 * ROW_HEIGHT)
                }
            }
        };
        self.state.lock().scroll = (x.max(0.0), y.clamp(0.0, max_y));
        self.viewport()
    }

    fn viewport(&self) -> Result<Viewport> {
        let (scroll_x, scroll_y) = self.state.lock().scroll;
        Ok(Viewport {
            width: VIEWPORT_WIDTH,
            height: VIEWPORT_HEIGHT,
            scroll_x,
            scroll_y,
        })
    }

    fn page_size(&self) -> Result<(f64, f64)> {
        Ok((VIEWPORT_WIDTH, PAGE_HEIGHT))
    }

    fn url(&self) -> String {
        "https://shop.test/".to_string()
    }

    fn title(&self) -> String {
        "Test Shop".to_string()
    }
}

fn element_id(idx: usize) -> ElementId {
    ElementId::new(format!("e{idx}"))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ============================================================================
// Selector parsing
// ============================================================================

#[derive(Debug, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

fn parse_selector(selector: &str) -> Result<Vec<Vec<Compound>>> {
    let unsupported = || Error::invalid_argument(format!("Unsupported selector: {selector}"));

    let groups = selector
        .split(',')
        .map(|group| {
            group
                .split_whitespace()
                .map(|token| parse_compound(token).ok_or_else(unsupported))
                .collect::<Result<Vec<_>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    if groups.iter().any(Vec::is_empty) {
        return Err(unsupported());
    }
    Ok(groups)
}

fn parse_compound(token: &str) -> Option<Compound> {
    let name_end = |s: &str| s.find(['#', '.', '[']).unwrap_or(s.len());
    let mut compound = Compound::default();

    let end = name_end(token);
    let tag = &token[..end];
    if !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '*') {
        return None;
    }
    if !tag.is_empty() && tag != "*" {
        compound.tag = Some(tag.to_ascii_lowercase());
    }

    let mut rest = &token[end..];
    while let Some(marker) = rest.chars().next() {
        match marker {
            '#' | '.' => {
                let body = &rest[1..];
                let end = name_end(body);
                if end == 0 {
                    return None;
                }
                let name = body[..end].to_string();
                if marker == '#' {
                    compound.id = Some(name);
                } else {
                    compound.classes.push(name);
                }
                rest = &body[end..];
            }
            '[' => {
                let close = rest.find(']')?;
                let inner = &rest[1..close];
                let (name, value) = match inner.split_once('=') {
                    Some((name, value)) => (
                        name.trim(),
                        Some(value.trim().trim_matches(['"', '\'']).to_string()),
                    ),
                    None => (inner.trim(), None),
                };
                if name.is_empty() {
                    return None;
                }
                compound.attrs.push((name.to_string(), value));
                rest = &rest[close + 1..];
            }
            _ => return None,
        }
    }
    Some(compound)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_document_selectors() {
        let doc = FakeDocument::new();
        let body = doc.body();
        let nav = doc.append(&body, "nav", &[("id", "top"), ("class", "bar dark")]);
        let link = doc.append(&nav, "a", &[("href", "/"), ("class", "home")]);
        doc.append(&body, "a", &[("href", "/about")]);

        assert_eq!(doc.query("a", None).expect("query").len(), 2);
        assert_eq!(doc.query("#top a", None).expect("query"), vec![link.clone()]);
        assert_eq!(doc.query("nav.bar.dark", None).expect("query"), vec![nav.clone()]);
        assert_eq!(doc.query("[href='/about']", None).expect("query").len(), 1);
        assert_eq!(doc.query("a, nav", Some(&body)).expect("query").len(), 3);
        assert!(doc.query("a > b", None).is_err());

        doc.remove(&nav);
        assert!(doc.describe(&link).is_err());
        assert_eq!(doc.query("a", None).expect("query").len(), 1);
    }

    #[test]
    fn test_fake_document_markup() {
        let doc = FakeDocument::new();
        let body = doc.body();
        let card = doc.append(&body, "div", &[("id", "card")]);
        doc.append_text(&card, "p", "a < b");
        assert_eq!(
            doc.outer_html(&card).expect("html"),
            r#"<div id="card"><p>a &lt; b</p></div>"#
        );
    }
}
