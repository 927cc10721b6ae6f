use wasm_bindgen::prelude::*;

use crate::error::InformeError;
use crate::model::{DateStamp, Report};

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Render canvas operations for a report snapshot. Returns an array of
/// pages, each a list of draw ops.
#[wasm_bindgen]
pub fn render_canvas(snapshot: &str, day: u32, month: u32, year: i32) -> Result<JsValue, JsValue> {
    let pages = crate::render_canvas_json(snapshot, &DateStamp::new(day, month, year))
        .map_err(js_err)?;
    serde_wasm_bindgen::to_value(&pages).map_err(js_err)
}

/// Render flow directives for a report snapshot.
#[wasm_bindgen]
pub fn render_flow(snapshot: &str, day: u32, month: u32, year: i32) -> Result<JsValue, JsValue> {
    let ops = crate::render_flow_json(snapshot, &DateStamp::new(day, month, year))
        .map_err(js_err)?;
    serde_wasm_bindgen::to_value(&ops).map_err(js_err)
}

/// Validate a report snapshot. Returns the list of validation messages;
/// an empty list means the report is complete.
#[wasm_bindgen]
pub fn validate_report(snapshot: &str) -> Result<JsValue, JsValue> {
    let report = Report::from_json(snapshot).map_err(js_err)?;
    let messages = match crate::content::validate(&report) {
        Ok(()) => Vec::new(),
        Err(InformeError::Validation(messages)) => messages,
        Err(other) => return Err(js_err(other)),
    };
    serde_wasm_bindgen::to_value(&messages).map_err(js_err)
}
