//! # Informe
//!
//! A deterministic layout engine for Spanish technical field reports.
//!
//! The engine is built around one idea: the page is the unit of layout.
//! Content does not render and then get sliced up; it flows *into* pages
//! with fixed vertical budgets, and every placement decision happens at a
//! single cursor. The earlier report generators each carried their own
//! copy of that arithmetic and the copies drifted apart, so page counts
//! and photo placement disagreed between outputs of the same report.
//! Here the arithmetic lives in one allocator and the output backends
//! only draw what it already placed.
//!
//! Given the same report snapshot and date stamp, the engine produces
//! identical output every time. No clocks, no randomness, no
//! environment.
//!
//! ## Architecture
//!
//! ```text
//!   report snapshot (JSON) + date stamp
//!               │
//!               ▼
//!      ┌────────────────┐
//!      │     model      │  typed snapshot, page geometry, text blocks
//!      └────────┬───────┘
//!               ▼
//!      ┌────────────────┐
//!      │    content     │  parse stage text, resolve images, compose
//!      └────────┬───────┘  the report template, validate
//!               ▼
//!      ┌────────────────┐
//!      │     layout     │  page flow allocator: one cursor,
//!      └────────┬───────┘  hard per-page budgets
//!               ▼
//!      ┌────────────────┐
//!      │     render     │  canvas ops (absolute) or flow
//!      └────────────────┘  directives (ordered)
//! ```
//!
//! The `fit`, `measure` and `probe` modules supply the supporting
//! arithmetic: box fitting for photos and logos, text height
//! estimation, and image dimension probing from raw bytes.

pub mod content;
pub mod error;
pub mod fit;
pub mod layout;
pub mod measure;
pub mod model;
pub mod probe;
pub mod render;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{InformeError, Result};

use layout::LayoutResult;
use model::{DateStamp, PageGeometry, Report};
use render::canvas::{CanvasPage, CanvasTarget};
use render::flow::{FlowOp, FlowTarget};
use render::RenderTarget;

/// Render a report to absolute-positioned canvas operations, one op
/// list per page.
pub fn render_canvas(
    report: &Report,
    date: &DateStamp,
    geometry: &PageGeometry,
) -> Result<Vec<CanvasPage>> {
    let mut target = CanvasTarget::new(*geometry);
    render::render_document(report, date, geometry, &mut target)?;
    Ok(target.into_pages())
}

/// Render a report to an ordered flow directive stream with explicit
/// page breaks.
pub fn render_flow(
    report: &Report,
    date: &DateStamp,
    geometry: &PageGeometry,
) -> Result<Vec<FlowOp>> {
    let mut target = FlowTarget::new(*geometry);
    render::render_document(report, date, geometry, &mut target)?;
    Ok(target.into_ops())
}

/// Parse a report snapshot from JSON and render canvas operations on
/// A4, the geometry the report template was designed for.
pub fn render_canvas_json(snapshot: &str, date: &DateStamp) -> Result<Vec<CanvasPage>> {
    let report = Report::from_json(snapshot)?;
    render_canvas(&report, date, &PageGeometry::a4())
}

/// Parse a report snapshot from JSON and render flow directives on A4.
pub fn render_flow_json(snapshot: &str, date: &DateStamp) -> Result<Vec<FlowOp>> {
    let report = Report::from_json(snapshot)?;
    render_flow(&report, date, &PageGeometry::a4())
}

/// Lay out a report without rendering and return the page plan, using
/// the canvas target's measurements. The cheap way to answer "how many
/// pages will this be".
pub fn plan_pages(
    report: &Report,
    date: &DateStamp,
    geometry: &PageGeometry,
) -> Result<LayoutResult> {
    let caps = CanvasTarget::new(*geometry).caps();
    render::layout_report(report, date, geometry, &caps)
}
