//! Flow target: ordered directives for word-processor style writers.
//!
//! No absolute coordinates here. The output is a single sequence of
//! directives with explicit `PageBreak`s where the allocator decided a
//! page ends; the writer walks it top to bottom. Image dimensions are
//! CSS pixels (the unit such writers take), spacing heights are
//! geometry units.
//!
//! This target runs post-hoc: it reports the height each directive
//! consumes back to the driver, which is what keeps its page breaks
//! honest even though the writer reflows text itself.

use serde::{Deserialize, Serialize};

use crate::layout::{
    measure_content, AdapterCaps, HeightMode, PlacedContent, BODY_FONT_SIZE, HEADING_FONT_SIZE,
};
use crate::measure;
use crate::model::{BlockKind, PageGeometry, TextBlock};

use super::{company_lines, RenderTarget, PX_TO_MM};

/// Photo fitting box, in pixels.
const PHOTO_MAX_WIDTH: f64 = 400.0;
const PHOTO_MAX_HEIGHT: f64 = 250.0;
/// Logo caps and fallback, in pixels.
const LOGO_MAX_WIDTH: f64 = 300.0;
const LOGO_MAX_HEIGHT: f64 = 100.0;
const LOGO_FALLBACK: f64 = 70.0;

/// One styled run of text inside a paragraph directive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    pub font_size: f64,
}

impl TextRun {
    fn new(text: impl Into<String>, bold: bool, font_size: f64) -> Self {
        Self {
            text: text.into(),
            bold,
            font_size,
        }
    }
}

/// An image with its final pixel dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowImage {
    pub payload_ref: String,
    pub width: f64,
    pub height: f64,
}

/// One writer directive, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum FlowOp {
    PageBreak,
    /// A paragraph of runs. `indent` is a left indent in geometry units;
    /// bullets carry their marker inside the text.
    Paragraph { runs: Vec<TextRun>, indent: f64 },
    /// Pure vertical spacing in geometry units.
    Spacing { height: f64 },
    /// Photos side by side, bordered like a table row, each centered in
    /// an equal-width cell.
    PhotoRow { cells: Vec<FlowImage> },
    /// Logo beside right-aligned company lines (one run per line), with
    /// a rule below. The writer renders it as a two-cell header table.
    Letterhead {
        logo: Option<FlowImage>,
        logo_placeholder: bool,
        lines: Vec<TextRun>,
    },
    /// The closing block: signature space, rule, then the author lines.
    Signature {
        name: String,
        role: String,
        department: String,
    },
}

/// Post-hoc target emitting an ordered [`FlowOp`] stream.
#[derive(Debug)]
pub struct FlowTarget {
    geometry: PageGeometry,
    caps: AdapterCaps,
    ops: Vec<FlowOp>,
}

impl FlowTarget {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            caps: AdapterCaps {
                height_mode: HeightMode::PostHoc,
                photos_per_row: 2,
                photo_box: crate::fit::BoxConstraint::new(PHOTO_MAX_WIDTH, PHOTO_MAX_HEIGHT),
                logo_cap_width: LOGO_MAX_WIDTH,
                logo_cap_height: LOGO_MAX_HEIGHT,
                logo_fallback: LOGO_FALLBACK,
                image_unit_scale: PX_TO_MM,
                logo_unit_scale: PX_TO_MM,
            },
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[FlowOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<FlowOp> {
        self.ops
    }

    fn paragraph_for(&self, block: &TextBlock, font_size: f64, bold: bool) -> Option<FlowOp> {
        match block.kind {
            BlockKind::Blank => None,
            BlockKind::Paragraph => Some(FlowOp::Paragraph {
                runs: vec![TextRun::new(block.text.clone(), bold, font_size)],
                indent: 0.0,
            }),
            BlockKind::Bullet => {
                let marker = block.display_marker().unwrap_or_else(|| "•".to_string());
                Some(FlowOp::Paragraph {
                    runs: vec![TextRun::new(
                        format!("{} {}", marker, block.text),
                        bold,
                        font_size,
                    )],
                    indent: block.indent_level as f64 * measure::INDENT_STEP,
                })
            }
        }
    }
}

impl RenderTarget for FlowTarget {
    fn caps(&self) -> AdapterCaps {
        self.caps
    }

    fn begin_page(&mut self, page_index: usize) {
        if page_index > 0 {
            self.ops.push(FlowOp::PageBreak);
        }
    }

    fn place_item(
        &mut self,
        _page_index: usize,
        _y_offset: f64,
        content: &PlacedContent,
    ) -> Option<f64> {
        match content {
            PlacedContent::Spacer { height } => {
                self.ops.push(FlowOp::Spacing { height: *height });
                return None;
            }
            PlacedContent::ImageRow { cells } => {
                self.ops.push(FlowOp::PhotoRow {
                    cells: cells
                        .iter()
                        .map(|cell| FlowImage {
                            payload_ref: cell.payload_ref.clone(),
                            width: cell.fitted.width,
                            height: cell.fitted.height,
                        })
                        .collect(),
                });
                return None;
            }
            PlacedContent::Line { text, style } => {
                self.ops.push(FlowOp::Paragraph {
                    runs: vec![TextRun::new(text.clone(), style.bold, style.font_size)],
                    indent: 0.0,
                });
            }
            PlacedContent::Heading { text } => {
                self.ops.push(FlowOp::Paragraph {
                    runs: vec![TextRun::new(text.clone(), true, HEADING_FONT_SIZE)],
                    indent: 0.0,
                });
            }
            PlacedContent::Field {
                label,
                value,
                bold_value,
            } => {
                self.ops.push(FlowOp::Paragraph {
                    runs: vec![
                        TextRun::new(label.clone(), true, BODY_FONT_SIZE),
                        TextRun::new(value.clone(), *bold_value, BODY_FONT_SIZE),
                    ],
                    indent: 0.0,
                });
            }
            PlacedContent::Text { block, style } => {
                match self.paragraph_for(block, style.font_size, style.bold) {
                    Some(op) => self.ops.push(op),
                    // Blank blocks become explicit spacing for the writer
                    None => {
                        let height = measure::block_height(
                            block,
                            style.font_size,
                            self.geometry.content_width(),
                        );
                        self.ops.push(FlowOp::Spacing { height });
                    }
                }
            }
            PlacedContent::Letterhead {
                logo,
                name,
                nit,
                contact,
                city,
            } => {
                let mut lines = vec![TextRun::new(name.clone(), true, 13.0)];
                for line in company_lines(nit, contact, city) {
                    lines.push(TextRun::new(line, false, 10.0));
                }
                self.ops.push(FlowOp::Letterhead {
                    logo: logo.as_ref().map(|slot| FlowImage {
                        payload_ref: slot.payload_ref.clone(),
                        width: slot.width,
                        height: slot.height,
                    }),
                    logo_placeholder: logo.as_ref().map_or(false, |slot| slot.placeholder),
                    lines,
                });
            }
            PlacedContent::Signature {
                name,
                role,
                department,
            } => {
                self.ops.push(FlowOp::Signature {
                    name: name.clone(),
                    role: role.clone(),
                    department: department.clone(),
                });
            }
        }
        // Post-hoc contract: report what this directive will consume.
        Some(measure_content(content, &self.geometry, &self.caps))
    }
}
