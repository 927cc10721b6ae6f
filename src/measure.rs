//! # Height Estimation
//!
//! Wrap simulation for pre-measured layout. The canvas target has no text
//! engine of its own, so the allocator estimates how many lines a block
//! will occupy from UAX#14 break opportunities and an average glyph
//! advance, then converts the line count to a height with the template's
//! line metrics.
//!
//! The metrics reproduce the original report template: a wrapped line
//! advances `font_size * 0.35` units, a block carries `2.0` units of
//! trailing spacing, and a blank line advances `font_size * 0.4`.
//! Estimates are deliberately conservative rather than exact; targets
//! that wrap text themselves report real heights back through the
//! allocator's post-hoc mode instead.

use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::model::{BlockKind, TextBlock};

/// Points to the geometry unit (millimeters), at 72pt per inch.
pub const PT_TO_MM: f64 = 25.4 / 72.0;

/// Average glyph advance as a fraction of the font size. Half an em is a
/// serviceable average for the mixed prose these reports carry.
pub const AVG_GLYPH_FRACTION: f64 = 0.5;

/// Vertical advance per wrapped line, as a fraction of the font size.
pub const LINE_FACTOR: f64 = 0.35;

/// Trailing spacing after a paragraph or bullet block.
pub const BLOCK_SPACING: f64 = 2.0;

/// Vertical advance of a blank line, as a fraction of the font size.
pub const BLANK_FACTOR: f64 = 0.4;

/// Horizontal indent per leading whitespace character of a bullet line.
pub const INDENT_STEP: f64 = 2.0;

/// Estimated advance of one average glyph at the given font size.
pub fn avg_char_width(font_size: f64) -> f64 {
    font_size * AVG_GLYPH_FRACTION * PT_TO_MM
}

/// Vertical advance of one wrapped line.
pub fn line_advance(font_size: f64) -> f64 {
    font_size * LINE_FACTOR
}

/// Height of a single non-wrapping line, trailing spacing included.
pub fn single_line_height(font_size: f64) -> f64 {
    line_advance(font_size) + BLOCK_SPACING
}

/// How many character columns fit in `wrap_width`. Never less than one,
/// so a degenerate width cannot stall the line counter.
pub fn wrap_columns(wrap_width: f64, font_size: f64) -> usize {
    let cols = (wrap_width / avg_char_width(font_size)).floor() as usize;
    cols.max(1)
}

/// Estimated height of one content block at the given wrap width.
///
/// Bullets wrap against a narrower column: the indent (at
/// [`INDENT_STEP`] per leading whitespace character) plus the rendered
/// marker and its gap are subtracted first, mirroring how the renderer
/// positions bullet content.
pub fn block_height(block: &TextBlock, font_size: f64, wrap_width: f64) -> f64 {
    match block.kind {
        BlockKind::Blank => font_size * BLANK_FACTOR,
        BlockKind::Paragraph => {
            let lines = count_wrapped_lines(&block.text, wrap_columns(wrap_width, font_size));
            lines as f64 * line_advance(font_size) + BLOCK_SPACING
        }
        BlockKind::Bullet => {
            let indent = block.indent_level as f64 * INDENT_STEP;
            let marker_chars = block
                .display_marker()
                .map_or(1, |m| m.chars().count().max(1));
            let marker_width = marker_chars as f64 * avg_char_width(font_size) + 2.0;
            let content_width = (wrap_width - indent - marker_width).max(avg_char_width(font_size));
            let lines = count_wrapped_lines(&block.text, wrap_columns(content_width, font_size));
            lines as f64 * line_advance(font_size) + BLOCK_SPACING
        }
    }
}

/// Count the lines a greedy wrap would produce at `max_cols` columns.
///
/// Breaks happen at UAX#14 opportunities when possible; a run longer than
/// the line with no opportunity is hard-broken mid-word, so the count is
/// always finite.
pub fn count_wrapped_lines(text: &str, max_cols: usize) -> usize {
    if text.is_empty() {
        return 1;
    }
    let max_cols = max_cols.max(1);
    let char_count = text.chars().count();
    if char_count <= max_cols {
        return 1;
    }

    let break_before = compute_break_opportunities(text);
    let mut lines = 1usize;
    let mut line_start = 0usize;
    let mut line_len = 0usize;
    let mut last_break: Option<usize> = None;

    for i in 0..char_count {
        if let Some(opp) = break_before[i] {
            if matches!(opp, BreakOpportunity::Mandatory) && i > line_start {
                lines += 1;
                line_start = i;
                line_len = 0;
                last_break = None;
            } else {
                last_break = Some(i);
            }
        }
        line_len += 1;
        if line_len > max_cols {
            if let Some(bp) = last_break {
                if bp > line_start {
                    lines += 1;
                    line_len = i - bp + 1;
                    line_start = bp;
                    last_break = None;
                    continue;
                }
            }
            // No opportunity inside the line: hard-break before this char.
            lines += 1;
            line_start = i;
            line_len = 1;
            last_break = None;
        }
    }

    lines
}

/// Compute UAX#14 break opportunities indexed by char position.
///
/// Entry `i` is the opportunity *before* char `i`; index 0 is always
/// `None`. `linebreaks()` reports byte offsets, so a byte-to-char map
/// converts them first.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    let byte_to_char: Vec<usize> = {
        let mut map = vec![0usize; text.len() + 1];
        let mut char_idx = 0;
        for (byte_idx, _) in text.char_indices() {
            map[byte_idx] = char_idx;
            char_idx += 1;
        }
        map[text.len()] = char_idx;
        map
    };

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
        // byte_offset == text.len() is the end-of-text break; irrelevant here
    }

    result
}
