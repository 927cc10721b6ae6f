//! Canvas target: absolute-positioned draw ops, one list per page.
//!
//! Coordinates are millimeters from the page's top-left corner, text
//! `y` is the baseline, and wrapped blocks carry a `max_width` so the
//! writer's own line breaker does the final fill. The op vocabulary is
//! deliberately small; styling beyond weight and size is the writer's
//! concern.

use serde::{Deserialize, Serialize};

use crate::layout::{
    AdapterCaps, HeightMode, LogoSlot, PlacedContent, BODY_FONT_SIZE, CLOSING_GAP,
    COMPANY_LINE_ADVANCE, COMPANY_NAME_ADVANCE, HEADING_FONT_SIZE, LETTERHEAD_MAX_HEIGHT,
    RULE_GAP, SIGNATURE_LINE_GAP, SIGNATURE_SPACE,
};
use crate::measure;
use crate::model::{BlockKind, PageGeometry, TextBlock};

use super::{company_lines, RenderTarget, MM_TO_PX, PX_TO_MM};

/// Gap between side-by-side photo cells.
const CELL_GAP: f64 = 5.0;
/// Photo cell height cap: 250px at 96dpi. Photo boxes are expressed in
/// millimeters and fitted against raw pixel dimensions, as the producer
/// always did; the resulting sizes are read as millimeters directly.
const PHOTO_MAX_HEIGHT: f64 = 250.0 * PX_TO_MM;
/// Side of the fallback square when logo dimensions are unknown (mm).
const LOGO_FALLBACK: f64 = 35.0;
/// Length of the ink-signature rule.
const SIGNATURE_RULE_LENGTH: f64 = 80.0;
/// Padding between a photo and its cell border, above and below.
const ROW_INSET: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// One drawing instruction. Everything a coordinate writer needs, and
/// nothing it can decide for itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum CanvasOp {
    Text {
        x: f64,
        y: f64,
        text: String,
        font_size: f64,
        bold: bool,
        align: TextAlign,
        /// Present on wrapping blocks; the writer breaks lines to fit.
        max_width: Option<f64>,
    },
    Rule {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        line_width: f64,
    },
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        filled: bool,
    },
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        payload_ref: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasPage {
    pub index: usize,
    pub ops: Vec<CanvasOp>,
}

/// Pre-measured target emitting [`CanvasOp`] lists per page.
#[derive(Debug)]
pub struct CanvasTarget {
    geometry: PageGeometry,
    caps: AdapterCaps,
    pages: Vec<CanvasPage>,
}

impl CanvasTarget {
    pub fn new(geometry: PageGeometry) -> Self {
        let cell_width = geometry.content_width() / 2.0 - CELL_GAP;
        Self {
            geometry,
            caps: AdapterCaps {
                height_mode: HeightMode::PreMeasured,
                photos_per_row: 2,
                photo_box: crate::fit::BoxConstraint::new(cell_width, PHOTO_MAX_HEIGHT),
                // The logo is the one image fitted in pixel space, so a
                // small logo keeps its native pixel size (converted to
                // mm) instead of being measured against mm caps.
                logo_cap_width: geometry.content_width() / 2.0 * MM_TO_PX,
                logo_cap_height: LETTERHEAD_MAX_HEIGHT * MM_TO_PX,
                logo_fallback: LOGO_FALLBACK * MM_TO_PX,
                image_unit_scale: 1.0,
                logo_unit_scale: PX_TO_MM,
            },
            pages: Vec::new(),
        }
    }

    pub fn pages(&self) -> &[CanvasPage] {
        &self.pages
    }

    pub fn into_pages(self) -> Vec<CanvasPage> {
        self.pages
    }

    fn push(&mut self, op: CanvasOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn left(&self) -> f64 {
        self.geometry.left_margin
    }

    fn right(&self) -> f64 {
        self.geometry.page_width - self.geometry.right_margin
    }

    fn baseline(&self, top: f64, font_size: f64) -> f64 {
        self.geometry.top_margin + top + measure::line_advance(font_size)
    }

    fn text_block(&mut self, top: f64, block: &TextBlock, font_size: f64, bold: bool) {
        match block.kind {
            BlockKind::Blank => {}
            BlockKind::Paragraph => {
                self.push(CanvasOp::Text {
                    x: self.left(),
                    y: self.baseline(top, font_size),
                    text: block.text.clone(),
                    font_size,
                    bold,
                    align: TextAlign::Left,
                    max_width: Some(self.geometry.content_width()),
                });
            }
            BlockKind::Bullet => {
                let marker = block.display_marker().unwrap_or_else(|| "•".to_string());
                let marker_x =
                    self.left() + block.indent_level as f64 * measure::INDENT_STEP;
                let marker_width =
                    marker.chars().count() as f64 * measure::avg_char_width(font_size);
                let content_x = marker_x + marker_width + 2.0;
                let y = self.baseline(top, font_size);
                self.push(CanvasOp::Text {
                    x: marker_x,
                    y,
                    text: marker,
                    font_size,
                    bold,
                    align: TextAlign::Left,
                    max_width: None,
                });
                self.push(CanvasOp::Text {
                    x: content_x,
                    y,
                    text: block.text.clone(),
                    font_size,
                    bold,
                    align: TextAlign::Left,
                    max_width: Some((self.right() - content_x).max(0.0)),
                });
            }
        }
    }

    fn letterhead(
        &mut self,
        top: f64,
        logo: Option<&LogoSlot>,
        name: &str,
        nit: &str,
        contact: &str,
        city: &str,
    ) {
        let t = self.geometry.top_margin + top;
        let company_text = COMPANY_NAME_ADVANCE + COMPANY_LINE_ADVANCE * 3.0;
        let logo_height = logo.map_or(0.0, |slot| slot.height * self.caps.logo_unit_scale);
        let block_height = logo_height.max(company_text).min(LETTERHEAD_MAX_HEIGHT);

        if let Some(slot) = logo {
            let width = slot.width * self.caps.logo_unit_scale;
            let height = slot.height * self.caps.logo_unit_scale;
            if slot.placeholder {
                self.push(CanvasOp::Rect {
                    x: self.left(),
                    y: t,
                    width,
                    height,
                    filled: true,
                });
                self.push(CanvasOp::Text {
                    x: self.left() + width / 2.0,
                    y: t + height / 2.0,
                    text: "LOGO".to_string(),
                    font_size: 10.0,
                    bold: false,
                    align: TextAlign::Center,
                    max_width: None,
                });
            } else {
                self.push(CanvasOp::Image {
                    x: self.left(),
                    y: t,
                    width,
                    height,
                    payload_ref: slot.payload_ref.clone(),
                });
            }
        }

        // Company lines, right-aligned and centered against the logo
        let text_top = t + (block_height - company_text) / 2.0;
        let mut y = text_top + measure::line_advance(BODY_FONT_SIZE);
        self.push(CanvasOp::Text {
            x: self.right(),
            y,
            text: name.to_string(),
            font_size: BODY_FONT_SIZE,
            bold: true,
            align: TextAlign::Right,
            max_width: None,
        });
        y += COMPANY_NAME_ADVANCE;
        for line in company_lines(nit, contact, city) {
            self.push(CanvasOp::Text {
                x: self.right(),
                y,
                text: line,
                font_size: 10.0,
                bold: false,
                align: TextAlign::Right,
                max_width: None,
            });
            y += COMPANY_LINE_ADVANCE;
        }

        let rule_y = t + block_height + 2.6;
        self.push(CanvasOp::Rule {
            x1: self.left(),
            y1: rule_y,
            x2: self.right(),
            y2: rule_y,
            line_width: 0.8,
        });
    }

    fn image_row(&mut self, top: f64, cells: &[crate::layout::ImageCell]) {
        let t = self.geometry.top_margin + top;
        let slot = self.geometry.content_width() / self.caps.photos_per_row as f64;
        let tallest = cells
            .iter()
            .map(|cell| cell.fitted.height)
            .fold(0.0, f64::max);
        let row_height = tallest + 2.0 * ROW_INSET;

        self.push(CanvasOp::Rect {
            x: self.left() - 2.0,
            y: t,
            width: self.geometry.content_width() + 4.0,
            height: row_height,
            filled: false,
        });
        for divider in 1..cells.len() {
            let x = self.left() + divider as f64 * slot;
            self.push(CanvasOp::Rule {
                x1: x,
                y1: t,
                x2: x,
                y2: t + row_height,
                line_width: 0.5,
            });
        }
        for (index, cell) in cells.iter().enumerate() {
            self.push(CanvasOp::Image {
                x: self.left() + index as f64 * slot + (slot - cell.fitted.width) / 2.0,
                y: t + ROW_INSET,
                width: cell.fitted.width,
                height: cell.fitted.height,
                payload_ref: cell.payload_ref.clone(),
            });
        }
    }

    fn signature(&mut self, top: f64, name: &str, role: &str, department: &str) {
        let atent_y = self.baseline(top, BODY_FONT_SIZE);
        self.push(CanvasOp::Text {
            x: self.left(),
            y: atent_y,
            text: "Atentamente,".to_string(),
            font_size: BODY_FONT_SIZE,
            bold: false,
            align: TextAlign::Left,
            max_width: None,
        });
        let rule_y = atent_y + CLOSING_GAP + SIGNATURE_SPACE;
        self.push(CanvasOp::Rule {
            x1: self.left(),
            y1: rule_y,
            x2: self.left() + SIGNATURE_RULE_LENGTH,
            y2: rule_y,
            line_width: 0.2,
        });
        self.push(CanvasOp::Text {
            x: self.left(),
            y: rule_y + RULE_GAP,
            text: name.to_string(),
            font_size: 13.0,
            bold: true,
            align: TextAlign::Left,
            max_width: None,
        });
        self.push(CanvasOp::Text {
            x: self.left(),
            y: rule_y + RULE_GAP + SIGNATURE_LINE_GAP,
            text: role.to_string(),
            font_size: BODY_FONT_SIZE,
            bold: true,
            align: TextAlign::Left,
            max_width: None,
        });
        self.push(CanvasOp::Text {
            x: self.left(),
            y: rule_y + RULE_GAP + 2.0 * SIGNATURE_LINE_GAP,
            text: department.to_string(),
            font_size: BODY_FONT_SIZE,
            bold: true,
            align: TextAlign::Left,
            max_width: None,
        });
    }
}

impl RenderTarget for CanvasTarget {
    fn caps(&self) -> AdapterCaps {
        self.caps
    }

    fn begin_page(&mut self, page_index: usize) {
        self.pages.push(CanvasPage {
            index: page_index,
            ops: Vec::new(),
        });
    }

    fn place_item(
        &mut self,
        _page_index: usize,
        y_offset: f64,
        content: &PlacedContent,
    ) -> Option<f64> {
        match content {
            PlacedContent::Spacer { .. } => {}
            PlacedContent::Line { text, style } => {
                let op = CanvasOp::Text {
                    x: self.left(),
                    y: self.baseline(y_offset, style.font_size),
                    text: text.clone(),
                    font_size: style.font_size,
                    bold: style.bold,
                    align: TextAlign::Left,
                    max_width: None,
                };
                self.push(op);
            }
            PlacedContent::Heading { text } => {
                let op = CanvasOp::Text {
                    x: self.left(),
                    y: self.baseline(y_offset, HEADING_FONT_SIZE),
                    text: text.clone(),
                    font_size: HEADING_FONT_SIZE,
                    bold: true,
                    align: TextAlign::Left,
                    max_width: None,
                };
                self.push(op);
            }
            PlacedContent::Field {
                label,
                value,
                bold_value,
            } => {
                let y = self.baseline(y_offset, BODY_FONT_SIZE);
                let label_width =
                    label.chars().count() as f64 * measure::avg_char_width(BODY_FONT_SIZE);
                let label_op = CanvasOp::Text {
                    x: self.left(),
                    y,
                    text: label.clone(),
                    font_size: BODY_FONT_SIZE,
                    bold: true,
                    align: TextAlign::Left,
                    max_width: None,
                };
                let value_op = CanvasOp::Text {
                    x: self.left() + label_width,
                    y,
                    text: value.clone(),
                    font_size: BODY_FONT_SIZE,
                    bold: *bold_value,
                    align: TextAlign::Left,
                    max_width: None,
                };
                self.push(label_op);
                self.push(value_op);
            }
            PlacedContent::Text { block, style } => {
                self.text_block(y_offset, block, style.font_size, style.bold);
            }
            PlacedContent::Letterhead {
                logo,
                name,
                nit,
                contact,
                city,
            } => {
                self.letterhead(y_offset, logo.as_ref(), name, nit, contact, city);
            }
            PlacedContent::ImageRow { cells } => {
                self.image_row(y_offset, cells);
            }
            PlacedContent::Signature {
                name,
                role,
                department,
            } => {
                self.signature(y_offset, name, role, department);
            }
        }
        None
    }
}
