//! # Page Flow Allocator
//!
//! This is the heart of the crate and the reason it exists.
//!
//! The original report generator laid content out twice, with measurement
//! math copy-pasted into each output path, and the two copies had already
//! drifted apart (one paired photos side by side, the other did not; they
//! disagreed on headings and datelines). This module is the single
//! replacement: one geometry-agnostic allocator that walks the content
//! stream, accumulates a vertical cursor, and decides page breaks against
//! a fixed page budget. The output targets consume the same placed-item
//! stream and never make a pagination decision of their own.
//!
//! The allocator works per item:
//!
//! 1. Open a page with a known usable height
//! 2. For each item, ask "does this fit below the cursor?"
//! 3. If it fits: place it and advance the cursor
//! 4. If not: start a new page and place it there (items are atomic;
//!    an image row or signature block is never split)
//! 5. An item taller than a whole page is placed alone at the top of its
//!    own page, overflow and all, rather than looping forever
//!
//! Heights come in two ways. Pre-measured items carry an estimate from
//! [`crate::measure`]; post-hoc items are placed at the cursor first and
//! their real height is reported back by the target after it draws, at
//! which point an overdrawn page breaks before the *next* item. The
//! capability flag on [`AdapterCaps`] says which mode a target needs.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fit::{fit_box, BoxConstraint, ScaledBox};
use crate::measure;
use crate::model::{PageGeometry, Section, TextBlock};

// ── Template constants (geometry units) ─────────────────────────────

/// Vertical advance of a section heading line.
pub const HEADING_ADVANCE: f64 = 10.0;
/// Spacing after a section's description blocks, before its photos.
pub const DESCRIPTION_TAIL: f64 = 5.0;
/// Spacing after a section's last row, before the next heading.
pub const SECTION_TAIL: f64 = 10.0;
/// Border padding consumed by a photo row beyond its tallest image.
pub const ROW_PADDING: f64 = 10.0;
/// Gap after the closing word, left free for an ink signature.
pub const CLOSING_GAP: f64 = 30.0;
pub const SIGNATURE_SPACE: f64 = 20.0;
/// Gap between the signature rule and the author name.
pub const RULE_GAP: f64 = 10.0;
pub const SIGNATURE_LINE_GAP: f64 = 8.0;
/// Height of the right-aligned company text in the letterhead:
/// a 7-unit name line plus three 4.5-unit detail lines.
pub const COMPANY_NAME_ADVANCE: f64 = 7.0;
pub const COMPANY_LINE_ADVANCE: f64 = 4.5;
/// The letterhead never grows past this, logo or not (100px at 96dpi).
pub const LETTERHEAD_MAX_HEIGHT: f64 = 100.0 * 25.4 / 96.0;
/// Spacing under the letterhead: logo-to-rule gap plus rule-to-content.
pub const LETTERHEAD_TAIL: f64 = 2.6 + 12.0;

/// Font size of body text in the report template.
pub const BODY_FONT_SIZE: f64 = 12.0;
/// Font size of section headings.
pub const HEADING_FONT_SIZE: f64 = 14.0;

// ── Content vocabulary ──────────────────────────────────────────────

/// Font treatment for a placed text item, resolved by the composer so
/// targets never consult the template themselves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub font_size: f64,
    pub bold: bool,
}

impl TextStyle {
    pub fn body() -> Self {
        Self {
            font_size: BODY_FONT_SIZE,
            bold: false,
        }
    }

    pub fn bold(font_size: f64) -> Self {
        Self {
            font_size,
            bold: true,
        }
    }
}

/// The letterhead logo after resolution and fitting. Dimensions are in
/// the adapter's image units ([`AdapterCaps::image_unit_scale`] converts
/// them to geometry units).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoSlot {
    pub payload_ref: String,
    pub width: f64,
    pub height: f64,
    /// True when the intrinsic dimensions could not be recovered and the
    /// fallback square is in use; targets frame it as a placeholder.
    pub placeholder: bool,
}

/// One photo inside an image row, already fitted to its cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCell {
    pub id: String,
    pub payload_ref: String,
    pub fitted: ScaledBox,
}

/// Everything the allocator can place. Targets receive exactly this
/// vocabulary, with positions attached, and turn it into their own
/// drawing or flow primitives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlacedContent {
    /// One content-model block (paragraph, bullet, or blank).
    Text { block: TextBlock, style: TextStyle },
    /// A single template line that never wraps (the dateline).
    Line { text: String, style: TextStyle },
    /// A numbered section heading. Orphan-protected: the allocator
    /// reserves room for the heading plus one body line.
    Heading { text: String },
    /// A labeled field line ("Para: ", "Cargo: ", "Asunto: ") with a
    /// bold label; `bold_value` carries the emphasis over the value too.
    Field {
        label: String,
        value: String,
        bold_value: bool,
    },
    /// The opening block: logo beside right-aligned company lines, with
    /// a rule underneath. Placed atomically.
    Letterhead {
        logo: Option<LogoSlot>,
        name: String,
        nit: String,
        contact: String,
        city: String,
    },
    /// One or more photos side by side. Never split across pages.
    ImageRow { cells: Vec<ImageCell> },
    /// The closing block: "Atentamente,", space for an ink signature, a
    /// rule, then the author lines. Placed atomically.
    Signature {
        name: String,
        role: String,
        department: String,
    },
    /// Pure vertical spacing. Truncated (or dropped) at a page boundary
    /// instead of ever forcing a break.
    Spacer { height: f64 },
}

fn content_kind_name(content: &PlacedContent) -> &'static str {
    match content {
        PlacedContent::Text { .. } => "Text",
        PlacedContent::Line { .. } => "Line",
        PlacedContent::Heading { .. } => "Heading",
        PlacedContent::Field { .. } => "Field",
        PlacedContent::Letterhead { .. } => "Letterhead",
        PlacedContent::ImageRow { .. } => "ImageRow",
        PlacedContent::Signature { .. } => "Signature",
        PlacedContent::Spacer { .. } => "Spacer",
    }
}

/// What a target must tell the allocator about itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterCaps {
    pub height_mode: HeightMode,
    /// Row-grouping arity for photos (1 or 2 in practice). Deliberately
    /// configuration rather than a constant; the two original output
    /// paths disagreed on it.
    pub photos_per_row: usize,
    /// Per-cell fitting box for photos, in the target's photo units.
    pub photo_box: BoxConstraint,
    /// Hard caps and fallback square for the letterhead logo, in the
    /// target's logo units. Logo and photo units differ on some targets,
    /// hence the two scale factors.
    pub logo_cap_width: f64,
    pub logo_cap_height: f64,
    pub logo_fallback: f64,
    /// Conversion from photo units to geometry units (1.0 when they
    /// share a unit system).
    pub image_unit_scale: f64,
    /// Conversion from logo units to geometry units.
    pub logo_unit_scale: f64,
}

/// Whether a target trusts pre-measured heights or reports its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeightMode {
    /// The allocator estimates text heights up front.
    PreMeasured,
    /// The target wraps text itself and reports consumed heights back
    /// after drawing each item.
    PostHoc,
}

// ── Placed output ───────────────────────────────────────────────────

/// One item with its final position. For items on the same page,
/// `y_offset` is strictly increasing and items never overlap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedItem {
    pub page_index: usize,
    pub y_offset: f64,
    pub height_consumed: f64,
    pub content: PlacedContent,
}

/// Where the flow just put an item, returned from each placement call so
/// a driver can mirror the decision onto an output target in step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Index into [`PageFlow::items`].
    pub index: usize,
    pub page_index: usize,
    pub y_offset: f64,
    /// Height charged so far; zero for a pending post-hoc item.
    pub height: f64,
}

/// The allocator's complete output for one generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutResult {
    pub items: Vec<PlacedItem>,
    /// Always at least 1: an empty report still produces one empty page.
    pub total_pages: usize,
}

impl LayoutResult {
    /// Serializable per-page summary for dev tooling and tests.
    pub fn info(&self, geometry: &PageGeometry) -> LayoutInfo {
        let mut pages: Vec<PageInfo> = (0..self.total_pages)
            .map(|index| PageInfo {
                index,
                usable_height: geometry.usable_height(),
                used_height: 0.0,
                items: Vec::new(),
            })
            .collect();
        for item in &self.items {
            let page = &mut pages[item.page_index];
            page.used_height = page.used_height.max(item.y_offset + item.height_consumed);
            page.items.push(ItemInfo {
                kind: content_kind_name(&item.content).to_string(),
                y_offset: item.y_offset,
                height: item.height_consumed,
            });
        }
        LayoutInfo { pages }
    }
}

// ── Serializable layout metadata (for dev tools / tests) ────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutInfo {
    pub pages: Vec<PageInfo>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub index: usize,
    pub usable_height: f64,
    pub used_height: f64,
    pub items: Vec<ItemInfo>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInfo {
    pub kind: String,
    pub y_offset: f64,
    pub height: f64,
}

// ── The allocator ───────────────────────────────────────────────────

/// Tracks where we are on the current page during layout.
///
/// The cursor runs in content coordinates: 0 is the top margin, and the
/// budget per page is the geometry's usable height. The state machine is
/// `ON_PAGE(page_index, cursor_y)`; every transition is one of `place`,
/// `place_spacer`, `begin_post_hoc`/`report_actual_height`, or `reserve`.
#[derive(Debug, Clone)]
pub struct PageFlow {
    usable_height: f64,
    page_index: usize,
    cursor_y: f64,
    items: Vec<PlacedItem>,
    /// Index of the item awaiting a post-hoc height report.
    pending: Option<usize>,
    /// Set when a post-hoc report ran past the budget; the next item
    /// opens a fresh page first.
    break_before_next: bool,
}

impl PageFlow {
    /// Validates the geometry first: a non-positive budget would loop
    /// forever, so it is rejected before any layout work.
    pub fn new(geometry: &PageGeometry) -> Result<Self> {
        geometry.validate()?;
        Ok(Self {
            usable_height: geometry.usable_height(),
            page_index: 0,
            cursor_y: 0.0,
            items: Vec::new(),
            pending: None,
            break_before_next: false,
        })
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn cursor_y(&self) -> f64 {
        self.cursor_y
    }

    pub fn remaining_height(&self) -> f64 {
        (self.usable_height - self.cursor_y).max(0.0)
    }

    /// Everything placed so far, in placement order.
    pub fn items(&self) -> &[PlacedItem] {
        &self.items
    }

    fn break_page(&mut self) {
        self.page_index += 1;
        self.cursor_y = 0.0;
        self.break_before_next = false;
    }

    /// Force a break unless at least `needed` height remains. Used before
    /// section headings so a heading never sits alone at a page bottom.
    /// A fresh page is kept even when `needed` exceeds the whole budget.
    pub fn reserve(&mut self, needed: f64) {
        if self.break_before_next {
            self.break_page();
        }
        if needed > self.remaining_height() && self.cursor_y > 0.0 {
            self.break_page();
        }
    }

    /// Place a pre-measured item. Breaks to a new page when the item does
    /// not fit below the cursor; an exact fit stays on the current page.
    ///
    /// An item taller than the whole budget is the documented exception:
    /// it is placed alone at the top of its own page and overflows, which
    /// beats looping in search of room that cannot exist.
    pub fn place(&mut self, content: PlacedContent, height: f64) -> Placement {
        if self.break_before_next {
            self.break_page();
        }
        if self.cursor_y + height > self.usable_height && self.cursor_y > 0.0 {
            self.break_page();
        }
        let placement = Placement {
            index: self.items.len(),
            page_index: self.page_index,
            y_offset: self.cursor_y,
            height,
        };
        self.items.push(PlacedItem {
            page_index: self.page_index,
            y_offset: self.cursor_y,
            height_consumed: height,
            content,
        });
        self.cursor_y += height;
        placement
    }

    /// Place pure spacing. Spacing never opens a page: it is truncated to
    /// the remaining height, and dropped entirely at a boundary or when a
    /// break is already pending (a new page starts at its top margin, not
    /// with leftover spacing). Returns None when the spacer was dropped.
    pub fn place_spacer(&mut self, height: f64) -> Option<Placement> {
        if self.break_before_next {
            return None;
        }
        let truncated = height.min(self.remaining_height());
        if truncated <= 0.0 {
            return None;
        }
        let placement = Placement {
            index: self.items.len(),
            page_index: self.page_index,
            y_offset: self.cursor_y,
            height: truncated,
        };
        self.items.push(PlacedItem {
            page_index: self.page_index,
            y_offset: self.cursor_y,
            height_consumed: truncated,
            content: PlacedContent::Spacer { height: truncated },
        });
        self.cursor_y += truncated;
        Some(placement)
    }

    /// Place an item whose height only the target knows. The item lands
    /// at the current cursor with zero height until
    /// [`report_actual_height`](Self::report_actual_height) fixes it up.
    pub fn begin_post_hoc(&mut self, content: PlacedContent) -> Placement {
        debug_assert!(self.pending.is_none(), "post-hoc item already pending");
        if self.break_before_next {
            self.break_page();
        }
        let placement = Placement {
            index: self.items.len(),
            page_index: self.page_index,
            y_offset: self.cursor_y,
            height: 0.0,
        };
        self.items.push(PlacedItem {
            page_index: self.page_index,
            y_offset: self.cursor_y,
            height_consumed: 0.0,
            content,
        });
        self.pending = Some(self.items.len() - 1);
        placement
    }

    /// Record the height the target actually consumed for the pending
    /// post-hoc item. When the drawn item ran past the budget the page is
    /// full; the break happens before the next item, never retroactively.
    pub fn report_actual_height(&mut self, height: f64) {
        let index = match self.pending.take() {
            Some(index) => index,
            None => return,
        };
        self.items[index].height_consumed = height;
        self.cursor_y += height;
        if self.cursor_y >= self.usable_height {
            self.break_before_next = true;
        }
    }

    /// Close the flow. Page count is the final page index plus one, so an
    /// empty report yields exactly one empty page.
    pub fn finish(self) -> LayoutResult {
        LayoutResult {
            total_pages: self.page_index + 1,
            items: self.items,
        }
    }
}

// ── Section streaming and measurement ───────────────────────────────

/// Turn sections into the allocator's content stream: heading, blocks,
/// then photos grouped into rows of `caps.photos_per_row`, each photo
/// fitted to the per-cell box.
pub fn stream_sections(sections: &[Section], caps: &AdapterCaps) -> Vec<PlacedContent> {
    let per_row = caps.photos_per_row.max(1);
    let mut stream = Vec::new();
    for section in sections {
        stream.push(PlacedContent::Heading {
            text: section.heading.clone(),
        });
        for block in &section.blocks {
            stream.push(PlacedContent::Text {
                block: block.clone(),
                style: TextStyle::body(),
            });
        }
        if !section.blocks.is_empty() {
            stream.push(PlacedContent::Spacer {
                height: DESCRIPTION_TAIL,
            });
        }
        for chunk in section.images.chunks(per_row) {
            stream.push(PlacedContent::ImageRow {
                cells: chunk
                    .iter()
                    .map(|asset| ImageCell {
                        id: asset.id.clone(),
                        payload_ref: asset.payload_ref.clone(),
                        fitted: fit_box(asset.pixel_width, asset.pixel_height, caps.photo_box),
                    })
                    .collect(),
            });
        }
        stream.push(PlacedContent::Spacer {
            height: SECTION_TAIL,
        });
    }
    stream
}

/// Height of a photo row in geometry units: the tallest fitted image,
/// converted from image units, plus the row's border padding.
pub fn row_height(cells: &[ImageCell], image_unit_scale: f64) -> f64 {
    let tallest = cells
        .iter()
        .map(|cell| cell.fitted.height)
        .fold(0.0, f64::max);
    tallest * image_unit_scale + ROW_PADDING
}

/// Height of the letterhead block: the taller of logo and company text,
/// capped, plus the rule spacing underneath.
pub fn letterhead_height(logo: Option<&LogoSlot>, logo_unit_scale: f64) -> f64 {
    let company_text = COMPANY_NAME_ADVANCE + COMPANY_LINE_ADVANCE * 3.0;
    let logo_height = logo.map_or(0.0, |slot| slot.height * logo_unit_scale);
    logo_height
        .max(company_text)
        .min(LETTERHEAD_MAX_HEIGHT)
        + LETTERHEAD_TAIL
}

/// Height of the atomic signature block, from the closing word to the
/// author department line.
pub fn signature_height() -> f64 {
    CLOSING_GAP
        + SIGNATURE_SPACE
        + RULE_GAP
        + SIGNATURE_LINE_GAP * 2.0
        + measure::line_advance(BODY_FONT_SIZE)
}

/// Reserved height checked before a heading: the heading line plus one
/// body line, so a heading is never orphaned at a page bottom.
pub fn heading_reservation() -> f64 {
    HEADING_ADVANCE + measure::single_line_height(BODY_FONT_SIZE)
}

/// Estimate the height of any content item, in geometry units.
pub fn measure_content(content: &PlacedContent, geometry: &PageGeometry, caps: &AdapterCaps) -> f64 {
    match content {
        PlacedContent::Text { block, style } => {
            measure::block_height(block, style.font_size, geometry.content_width())
        }
        PlacedContent::Line { style, .. } => measure::single_line_height(style.font_size),
        PlacedContent::Heading { .. } => HEADING_ADVANCE,
        PlacedContent::Field { .. } => measure::single_line_height(BODY_FONT_SIZE),
        PlacedContent::Letterhead { logo, .. } => {
            letterhead_height(logo.as_ref(), caps.logo_unit_scale)
        }
        PlacedContent::ImageRow { cells } => row_height(cells, caps.image_unit_scale),
        PlacedContent::Signature { .. } => signature_height(),
        PlacedContent::Spacer { height } => *height,
    }
}

/// Feed one item into the flow with a pre-measured height, applying the
/// heading reservation and the spacer rule. Returns None when a spacer
/// was dropped at a boundary.
pub(crate) fn push_measured(
    flow: &mut PageFlow,
    content: PlacedContent,
    geometry: &PageGeometry,
    caps: &AdapterCaps,
) -> Option<Placement> {
    match content {
        PlacedContent::Spacer { height } => flow.place_spacer(height),
        other => {
            if matches!(other, PlacedContent::Heading { .. }) {
                flow.reserve(heading_reservation());
            }
            let height = measure_content(&other, geometry, caps);
            Some(flow.place(other, height))
        }
    }
}

/// Lay out a section stream against a page geometry.
///
/// This is the pre-measured core: every block height comes from the wrap
/// estimator, image rows are atomic, headings reserve room, and the
/// result is a placed-item stream sorted by `(page_index, y_offset)`.
pub fn layout_document(
    sections: &[Section],
    geometry: &PageGeometry,
    caps: &AdapterCaps,
) -> Result<LayoutResult> {
    let mut flow = PageFlow::new(geometry)?;
    for content in stream_sections(sections, caps) {
        push_measured(&mut flow, content, geometry, caps);
    }
    Ok(flow.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ImageAsset;

    fn geometry_with_usable(usable: f64) -> PageGeometry {
        PageGeometry {
            page_height: usable + 40.0,
            ..PageGeometry::a4()
        }
    }

    fn text_caps() -> AdapterCaps {
        AdapterCaps {
            height_mode: HeightMode::PreMeasured,
            photos_per_row: 2,
            photo_box: BoxConstraint::new(80.0, 66.0),
            logo_cap_width: 85.0,
            logo_cap_height: 26.0,
            logo_fallback: 35.0,
            image_unit_scale: 1.0,
            logo_unit_scale: 1.0,
        }
    }

    fn line(text: &str) -> PlacedContent {
        PlacedContent::Line {
            text: text.to_string(),
            style: TextStyle::body(),
        }
    }

    fn asset(id: &str, w: u32, h: u32) -> ImageAsset {
        ImageAsset {
            id: id.to_string(),
            pixel_width: Some(w),
            pixel_height: Some(h),
            payload_ref: format!("data:image/jpeg;base64,{}", id),
        }
    }

    // ─── Cursor state machine ───

    #[test]
    fn test_sequential_placement_no_overlap() {
        let mut flow = PageFlow::new(&geometry_with_usable(200.0)).unwrap();
        flow.place(line("a"), 50.0);
        flow.place(line("b"), 50.0);
        flow.place(line("c"), 50.0);
        let result = flow.finish();
        assert_eq!(result.total_pages, 1);
        let ys: Vec<f64> = result.items.iter().map(|i| i.y_offset).collect();
        assert_eq!(ys, vec![0.0, 50.0, 100.0]);
    }

    #[test]
    fn test_break_on_overflow() {
        let mut flow = PageFlow::new(&geometry_with_usable(100.0)).unwrap();
        flow.place(line("a"), 60.0);
        flow.place(line("b"), 60.0);
        let result = flow.finish();
        assert_eq!(result.total_pages, 2);
        assert_eq!(result.items[1].page_index, 1);
        assert_eq!(result.items[1].y_offset, 0.0);
    }

    #[test]
    fn test_exact_fit_stays_on_page() {
        // 60 + 40 lands exactly on the boundary: inclusive, no break
        let mut flow = PageFlow::new(&geometry_with_usable(100.0)).unwrap();
        flow.place(line("a"), 60.0);
        flow.place(line("b"), 40.0);
        let result = flow.finish();
        assert_eq!(result.total_pages, 1);
        assert_eq!(result.items[1].y_offset, 60.0);
    }

    #[test]
    fn test_oversize_item_gets_own_page() {
        let mut flow = PageFlow::new(&geometry_with_usable(100.0)).unwrap();
        flow.place(line("a"), 40.0);
        flow.place(line("huge"), 150.0);
        flow.place(line("b"), 40.0);
        let result = flow.finish();
        assert_eq!(result.total_pages, 3);
        // The oversize item sits alone at the top of page 1
        assert_eq!(result.items[1].page_index, 1);
        assert_eq!(result.items[1].y_offset, 0.0);
        assert_eq!(result.items[1].height_consumed, 150.0);
        // And the next item opens page 2 rather than stacking under it
        assert_eq!(result.items[2].page_index, 2);
        assert_eq!(result.items[2].y_offset, 0.0);
    }

    #[test]
    fn test_oversize_item_on_fresh_page_does_not_break_twice() {
        let mut flow = PageFlow::new(&geometry_with_usable(100.0)).unwrap();
        flow.place(line("huge"), 150.0);
        let result = flow.finish();
        assert_eq!(result.total_pages, 1);
        assert_eq!(result.items[0].y_offset, 0.0);
    }

    #[test]
    fn test_spacer_truncates_and_never_breaks() {
        let mut flow = PageFlow::new(&geometry_with_usable(100.0)).unwrap();
        flow.place(line("a"), 90.0);
        flow.place_spacer(20.0);
        assert_eq!(flow.page_index(), 0);
        assert!((flow.cursor_y() - 100.0).abs() < 1e-9);
        flow.place(line("b"), 30.0);
        let result = flow.finish();
        // spacer was truncated to 10; the next item broke normally
        assert_eq!(result.items[1].height_consumed, 10.0);
        assert_eq!(result.items[2].page_index, 1);
    }

    #[test]
    fn test_spacer_at_boundary_is_dropped() {
        let mut flow = PageFlow::new(&geometry_with_usable(100.0)).unwrap();
        flow.place(line("a"), 100.0);
        flow.place_spacer(10.0);
        let result = flow.finish();
        assert_eq!(result.items.len(), 1);
    }

    #[test]
    fn test_reserve_prevents_orphaned_heading() {
        let mut flow = PageFlow::new(&geometry_with_usable(100.0)).unwrap();
        flow.place(line("body"), 90.0);
        flow.reserve(16.0);
        flow.place(
            PlacedContent::Heading {
                text: "2. Etapa".to_string(),
            },
            HEADING_ADVANCE,
        );
        let result = flow.finish();
        assert_eq!(result.items[1].page_index, 1);
        assert_eq!(result.items[1].y_offset, 0.0);
    }

    #[test]
    fn test_reserve_with_enough_room_stays() {
        let mut flow = PageFlow::new(&geometry_with_usable(100.0)).unwrap();
        flow.place(line("body"), 50.0);
        flow.reserve(16.0);
        assert_eq!(flow.page_index(), 0);
        assert!((flow.cursor_y() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_post_hoc_breaks_before_next_item() {
        let mut flow = PageFlow::new(&geometry_with_usable(100.0)).unwrap();
        flow.begin_post_hoc(line("a"));
        flow.report_actual_height(60.0);
        flow.begin_post_hoc(line("b"));
        // The second item was placed before its height was known; the
        // overflow is discovered on report and the break comes after.
        flow.report_actual_height(60.0);
        flow.begin_post_hoc(line("c"));
        flow.report_actual_height(10.0);
        let result = flow.finish();
        assert_eq!(result.items[1].page_index, 0);
        assert_eq!(result.items[1].y_offset, 60.0);
        assert_eq!(result.items[2].page_index, 1);
        assert_eq!(result.items[2].y_offset, 0.0);
    }

    #[test]
    fn test_empty_flow_pins_one_page() {
        let flow = PageFlow::new(&geometry_with_usable(100.0)).unwrap();
        let result = flow.finish();
        assert!(result.items.is_empty());
        assert_eq!(result.total_pages, 1);
    }

    #[test]
    fn test_invalid_geometry_fails_fast() {
        let bad = PageGeometry {
            page_height: 30.0,
            ..PageGeometry::a4()
        };
        assert!(PageFlow::new(&bad).is_err());
    }

    // ─── Section streaming ───

    #[test]
    fn test_stream_groups_photos_into_rows() {
        let section = Section {
            heading: "1. Avance".to_string(),
            blocks: vec![TextBlock::paragraph("Descripción.")],
            images: vec![
                asset("p1", 2000, 1500),
                asset("p2", 2000, 1500),
                asset("p3", 2000, 1500),
            ],
        };
        let stream = stream_sections(std::slice::from_ref(&section), &text_caps());
        let rows: Vec<&PlacedContent> = stream
            .iter()
            .filter(|c| matches!(c, PlacedContent::ImageRow { .. }))
            .collect();
        assert_eq!(rows.len(), 2);
        match rows[0] {
            PlacedContent::ImageRow { cells } => assert_eq!(cells.len(), 2),
            _ => unreachable!(),
        }
        match rows[1] {
            PlacedContent::ImageRow { cells } => assert_eq!(cells.len(), 1),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_stream_single_column_arity() {
        let section = Section {
            heading: "1. Avance".to_string(),
            blocks: vec![],
            images: vec![asset("p1", 2000, 1500), asset("p2", 2000, 1500)],
        };
        let caps = AdapterCaps {
            photos_per_row: 1,
            ..text_caps()
        };
        let stream = stream_sections(std::slice::from_ref(&section), &caps);
        let rows = stream
            .iter()
            .filter(|c| matches!(c, PlacedContent::ImageRow { .. }))
            .count();
        assert_eq!(rows, 2);
    }

    #[test]
    fn test_row_cells_fit_to_cell_box() {
        let section = Section {
            heading: "1. Avance".to_string(),
            blocks: vec![],
            images: vec![asset("p1", 2000, 1500)],
        };
        let stream = stream_sections(std::slice::from_ref(&section), &text_caps());
        let cell = stream
            .iter()
            .find_map(|c| match c {
                PlacedContent::ImageRow { cells } => Some(cells[0].clone()),
                _ => None,
            })
            .unwrap();
        // min(80/2000, 66/1500, 1) = 0.04 → 80 × 60
        assert_eq!(cell.fitted.width, 80.0);
        assert_eq!(cell.fitted.height, 60.0);
    }

    // ─── layout_document invariants ───

    fn sample_sections() -> Vec<Section> {
        vec![
            Section {
                heading: "1. Cimentación".to_string(),
                blocks: vec![
                    TextBlock::paragraph("Se excavó la zona norte del lote."),
                    TextBlock::bullet("-", 0, "Retiro de material sobrante"),
                    TextBlock::blank(),
                    TextBlock::paragraph("Sin novedades."),
                ],
                images: vec![asset("p1", 2000, 1500), asset("p2", 1600, 1200)],
            },
            Section {
                heading: "2. Estructura".to_string(),
                blocks: vec![TextBlock::paragraph("Fundida de columnas del eje A.")],
                images: vec![asset("p3", 1200, 900)],
            },
        ]
    }

    #[test]
    fn test_layout_sorted_and_within_budget() {
        let geometry = PageGeometry::a4();
        let result = layout_document(&sample_sections(), &geometry, &text_caps()).unwrap();
        assert!(!result.items.is_empty());

        let usable = geometry.usable_height();
        let mut prev: Option<(usize, f64)> = None;
        for item in &result.items {
            if let Some((page, end)) = prev {
                if item.page_index == page {
                    assert!(item.y_offset >= end, "items overlap on page {}", page);
                } else {
                    assert!(item.page_index > page, "pages out of order");
                }
            }
            assert!(
                item.y_offset + item.height_consumed <= usable + 1e-9,
                "item exceeds budget: {} + {}",
                item.y_offset,
                item.height_consumed
            );
            prev = Some((item.page_index, item.y_offset + item.height_consumed));
        }
    }

    #[test]
    fn test_image_row_deferred_atomically() {
        // Budget squeezed so the first section's row cannot fit under its
        // text: heading 10 + paragraph + tail 5 leave less than the row's
        // 60 + 10 padding.
        let geometry = geometry_with_usable(80.0);
        let section = Section {
            heading: "1. Cimentación".to_string(),
            blocks: vec![TextBlock::paragraph("Corta.")],
            images: vec![asset("p1", 2000, 1500), asset("p2", 2000, 1500)],
        };
        let result =
            layout_document(std::slice::from_ref(&section), &geometry, &text_caps()).unwrap();
        let row = result
            .items
            .iter()
            .find(|i| matches!(i.content, PlacedContent::ImageRow { .. }))
            .unwrap();
        assert_eq!(row.page_index, 1);
        assert_eq!(row.y_offset, 0.0);
        match &row.content {
            PlacedContent::ImageRow { cells } => assert_eq!(cells.len(), 2),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_empty_sections_one_empty_page() {
        let result = layout_document(&[], &PageGeometry::a4(), &text_caps()).unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.total_pages, 1);
    }

    #[test]
    fn test_layout_info_summarizes_pages() {
        let geometry = PageGeometry::a4();
        let result = layout_document(&sample_sections(), &geometry, &text_caps()).unwrap();
        let info = result.info(&geometry);
        assert_eq!(info.pages.len(), result.total_pages);
        assert!(info.pages[0].items.iter().any(|i| i.kind == "Heading"));
        assert!(info.pages[0].used_height > 0.0);
    }

    #[test]
    fn test_heading_reservation_math() {
        // 10 heading advance + one 12pt body line (4.2 + 2.0)
        assert!((heading_reservation() - 16.2).abs() < 1e-9);
    }

    #[test]
    fn test_signature_height_math() {
        // 30 + 20 + 10 + 8 + 8 + 4.2
        assert!((signature_height() - 80.2).abs() < 1e-9);
    }
}
