use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use rf_timeline_core::gesture::InputEvent;
use rf_timeline_core::{RunModel, SubscriptionId, TimelineConfig, TimelineEngine, TreeView};
use rf_timeline_protocol::{SpanId, TimelineEvent};
use wasm_bindgen::prelude::*;

/// One timeline per report element. Nothing is shared between instances.
#[wasm_bindgen]
pub struct Timeline {
    engine: TimelineEngine,
    handles: HashMap<u32, SubscriptionId>,
    next_handle: u32,
}

/// Tree view living in the embedding document, reached through a callback
/// that receives the span id to reveal.
struct JsTreeView {
    callback: js_sys::Function,
}

impl TreeView for JsTreeView {
    fn highlight_span(&mut self, span_id: &SpanId) {
        if let Err(err) = self
            .callback
            .call1(&JsValue::NULL, &JsValue::from_str(span_id.as_str()))
        {
            tracing::warn!(?err, span_id = %span_id, "tree view callback failed");
        }
    }
}

fn parse_config(config_json: Option<&str>) -> Result<TimelineConfig, String> {
    match config_json.map(str::trim).filter(|s| !s.is_empty()) {
        Some(json) => TimelineConfig::from_json(json).map_err(|e| format!("invalid config: {e}")),
        None => Ok(TimelineConfig::default()),
    }
}

fn load_engine(model_json: &str, config_json: Option<&str>) -> Result<TimelineEngine, String> {
    let config = parse_config(config_json)?;
    TimelineEngine::from_json(model_json.as_bytes(), config).map_err(|e| e.to_string())
}

fn parse_input(input_json: &str) -> Result<InputEvent, String> {
    serde_json::from_str(input_json).map_err(|e| format!("invalid input event: {e}"))
}

fn to_js(json: &str) -> Result<JsValue, JsError> {
    js_sys::JSON::parse(json).map_err(|_| JsError::new("failed to build JS value"))
}

impl Timeline {
    fn register(&mut self, id: SubscriptionId) -> u32 {
        let handle = self.next_handle;
        self.next_handle += 1;
        self.handles.insert(handle, id);
        handle
    }
}

#[wasm_bindgen]
impl Timeline {
    /// Build a timeline from run-model JSON and an optional config JSON.
    #[wasm_bindgen(constructor)]
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(model_json: &str, config_json: Option<String>) -> Result<Timeline, JsError> {
        let engine = load_engine(model_json, config_json.as_deref()).map_err(|e| JsError::new(&e))?;
        Ok(Self {
            engine,
            handles: HashMap::new(),
            next_handle: 1,
        })
    }

    /// Select and center a span on behalf of the tree view.
    #[wasm_bindgen(js_name = highlightSpan)]
    pub fn highlight_span(&mut self, span_id: &str) -> bool {
        self.engine.highlight_span(span_id)
    }

    #[wasm_bindgen(js_name = selectFromTimeline)]
    pub fn select_from_timeline(&mut self, span_id: &str) -> bool {
        self.engine.select_from_timeline(span_id)
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&mut self) {
        self.engine.clear_selection();
    }

    /// Call `callback` with every timeline event as a plain object.
    pub fn subscribe(&mut self, callback: js_sys::Function) -> u32 {
        let id = self.engine.subscribe(move |event: &TimelineEvent| {
            let value = serde_json::to_string(event)
                .ok()
                .and_then(|json| js_sys::JSON::parse(&json).ok());
            let Some(value) = value else {
                tracing::warn!(?event, "event could not be converted for JS");
                return;
            };
            if let Err(err) = callback.call1(&JsValue::NULL, &value) {
                tracing::warn!(?err, "event listener failed");
            }
        });
        self.register(id)
    }

    /// Forward timeline-originated selections to `callback(spanId)`.
    #[wasm_bindgen(js_name = connectTreeView)]
    pub fn connect_tree_view(&mut self, callback: js_sys::Function) -> u32 {
        let tree = Rc::new(RefCell::new(JsTreeView { callback }));
        let id = self.engine.connect_tree_view(tree);
        self.register(id)
    }

    pub fn unsubscribe(&mut self, handle: u32) -> bool {
        self.handles
            .remove(&handle)
            .is_some_and(|id| self.engine.unsubscribe(id))
    }

    #[wasm_bindgen(js_name = getDebugState)]
    pub fn get_debug_state(&self) -> Result<JsValue, JsError> {
        let json = serde_json::to_string(&self.engine.debug_state()).map_err(|e| JsError::new(&e.to_string()))?;
        to_js(&json)
    }

    /// Render commands for the current frame, as JSON.
    pub fn render(&self) -> Result<String, JsError> {
        serde_json::to_string(&self.engine.render()).map_err(|e| JsError::new(&e.to_string()))
    }

    #[wasm_bindgen(js_name = renderSvg)]
    pub fn render_svg(&self, dark: bool) -> String {
        let vp = self.engine.viewport();
        rf_timeline_core::svg::render_svg(
            &self.engine.render(),
            vp.width(),
            vp.height(),
            &self.engine.config().colors,
            dark,
        )
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.engine.resize(width, height);
    }

    /// Surface height needed to show every row.
    #[wasm_bindgen(js_name = contentHeight)]
    pub fn content_height(&self) -> f64 {
        self.engine.content_height()
    }

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, x: f64, y: f64, shift: bool) -> bool {
        self.engine.handle_input(InputEvent::PointerDown { x, y, shift })
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.engine.handle_input(InputEvent::PointerMove { x, y })
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, x: f64, y: f64) -> bool {
        self.engine.handle_input(InputEvent::PointerUp { x, y })
    }

    #[wasm_bindgen(js_name = pointerLeave)]
    pub fn pointer_leave(&mut self) -> bool {
        self.engine.handle_input(InputEvent::PointerLeave)
    }

    pub fn wheel(&mut self, x: f64, y: f64, delta_x: f64, delta_y: f64, shift: bool) -> bool {
        self.engine.handle_input(InputEvent::Wheel {
            x,
            y,
            delta_x,
            delta_y,
            shift,
        })
    }

    /// Route a JSON-encoded input event, e.g. `{"type":"pointer_leave"}`.
    #[wasm_bindgen(js_name = handleInput)]
    pub fn handle_input(&mut self, input_json: &str) -> Result<bool, JsError> {
        let event = parse_input(input_json).map_err(|e| JsError::new(&e))?;
        Ok(self.engine.handle_input(event))
    }

    #[wasm_bindgen(js_name = resetView)]
    pub fn reset_view(&mut self) {
        self.engine.reset_view();
    }

    /// Merge a newer run model (live mode). Malformed JSON leaves the
    /// current data untouched.
    pub fn refresh(&mut self, model_json: &str) -> Result<(), JsError> {
        let model = RunModel::from_json(model_json.as_bytes()).map_err(|e| JsError::new(&e.to_string()))?;
        self.engine.refresh(&model);
        Ok(())
    }

    #[wasm_bindgen(js_name = selectedSpan)]
    pub fn selected_span(&self) -> Option<String> {
        self.engine.selected_span().map(ToString::to_string)
    }

    #[wasm_bindgen(js_name = hoveredSpan)]
    pub fn hovered_span(&self) -> Option<String> {
        self.engine.hovered_span().map(ToString::to_string)
    }

    /// Span id under a surface point, if any.
    #[wasm_bindgen(js_name = spanAt)]
    pub fn span_at(&self, x: f64, y: f64) -> Option<String> {
        self.engine.hit_test(x, y).map(|s| s.id.to_string())
    }
}
