//! # Report Model
//!
//! The input representation for the layout engine. A report snapshot is the
//! JSON document the form/storage layer produces: company and recipient
//! data, an ordered list of stages (each with a description and photos),
//! and a free-text recommendations block. This module also defines the
//! normalized content model the builder produces from raw text (typed
//! blocks, sections, image assets) and the page geometry the allocator
//! works against.
//!
//! Everything here is plain data. The snapshot is deserialized once per
//! generation, the content model is built once from it, and neither is
//! mutated during layout.

use serde::{Deserialize, Serialize};

use crate::error::{InformeError, Result};

/// A complete report snapshot, as stored by the producing application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Company and author data for the letterhead and signature.
    #[serde(default)]
    pub company: Company,

    /// Who the report is addressed to.
    #[serde(default)]
    pub recipient: Recipient,

    /// Ordered stages: the numbered body sections of the report.
    #[serde(default)]
    pub stages: Vec<Stage>,

    /// Free-text recommendations, rendered as the closing section.
    #[serde(default)]
    pub recommendations: String,
}

impl Report {
    /// Parse a snapshot from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Company and author fields shown in the letterhead and signature block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub company_nit: String,
    #[serde(default)]
    pub company_contact: String,
    /// City printed in the dateline ("{city}, {day} de {month} de {year}").
    #[serde(default)]
    pub company_city: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_role: String,
    #[serde(default)]
    pub author_department: String,
    /// Letterhead logo. Snapshots have stored this three different ways
    /// over time, hence the dedicated union type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<LogoRef>,
}

/// Recipient fields for the "Para:" / "Cargo:" / "Asunto:" block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    #[serde(default)]
    pub recipient_name: String,
    #[serde(default)]
    pub recipient_role: String,
    #[serde(default)]
    pub report_subject: String,
}

/// One numbered body section: a title, a formatted description, and an
/// ordered set of photos.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

/// A photo attached to a stage. `data` is an opaque payload reference
/// (data URI or path); the engine never decodes it during layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub name: String,
    /// Intrinsic pixel width, when the producer managed to decode the
    /// image. Null in the snapshot when it did not.
    #[serde(default)]
    pub width: Option<u32>,
    /// Intrinsic pixel height, same caveat as `width`.
    #[serde(default)]
    pub height: Option<u32>,
}

/// The three historical shapes of the stored logo field.
///
/// Snapshots written by the current producer store an object with `data`
/// (same shape as stage photos). Older snapshots stored `src`, and the
/// oldest stored the payload string directly. Variant order matters:
/// untagged deserialization tries `Inline` before `LegacySrc`, matching
/// the resolution order the producer documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LogoRef {
    /// Current format: object carrying the payload under `data`, with
    /// the decoded dimensions when the producer had them.
    Inline {
        data: String,
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        height: Option<u32>,
    },
    /// Legacy format: object carrying the payload under `src`.
    LegacySrc {
        src: String,
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        height: Option<u32>,
    },
    /// Oldest format: the payload string itself.
    RawString(String),
}

impl LogoRef {
    /// The payload reference this variant carries, or None when it is
    /// empty. Resolved exactly once, at content-model build time.
    pub fn payload(&self) -> Option<&str> {
        let value = match self {
            LogoRef::Inline { data, .. } => data,
            LogoRef::LegacySrc { src, .. } => src,
            LogoRef::RawString(value) => value,
        };
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Dimensions stored alongside the payload, when the snapshot has
    /// them. The oldest format never carried any.
    pub fn intrinsic_dimensions(&self) -> (Option<u32>, Option<u32>) {
        match self {
            LogoRef::Inline { width, height, .. }
            | LogoRef::LegacySrc { width, height, .. } => (*width, *height),
            LogoRef::RawString(_) => (None, None),
        }
    }
}

/// Page geometry for one generation. All values share one
/// device-independent unit (the canvas adapter uses millimeters); the
/// engine itself is unit-agnostic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub page_width: f64,
    pub page_height: f64,
    pub top_margin: f64,
    pub bottom_margin: f64,
    pub left_margin: f64,
    pub right_margin: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

impl PageGeometry {
    /// A4 portrait with 20mm margins on every side, the geometry the
    /// original report template was designed for.
    pub fn a4() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            top_margin: 20.0,
            bottom_margin: 20.0,
            left_margin: 20.0,
            right_margin: 20.0,
        }
    }

    /// Vertical budget per page. May be non-positive for nonsense
    /// margins; `validate` rejects such geometry before layout starts.
    pub fn usable_height(&self) -> f64 {
        self.page_height - self.top_margin - self.bottom_margin
    }

    /// Horizontal space available to content.
    pub fn content_width(&self) -> f64 {
        self.page_width - self.left_margin - self.right_margin
    }

    /// Fail fast on geometry that leaves no room for content. Called once
    /// per generation, so layout never has to loop on a zero budget.
    pub fn validate(&self) -> Result<()> {
        if self.usable_height() <= 0.0 {
            return Err(InformeError::Geometry(format!(
                "usable height is {:.2} (page height {:.2}, margins {:.2} + {:.2}); must be positive",
                self.usable_height(),
                self.page_height,
                self.top_margin,
                self.bottom_margin
            )));
        }
        if self.content_width() <= 0.0 {
            return Err(InformeError::Geometry(format!(
                "content width is {:.2} (page width {:.2}, margins {:.2} + {:.2}); must be positive",
                self.content_width(),
                self.page_width,
                self.left_margin,
                self.right_margin
            )));
        }
        Ok(())
    }
}

/// A calendar date for the report dateline. Passed in explicitly so a
/// given snapshot always lays out identically.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DateStamp {
    pub day: u32,
    /// 1-based month (1 = enero).
    pub month: u32,
    pub year: i32,
}

impl DateStamp {
    pub fn new(day: u32, month: u32, year: i32) -> Self {
        Self { day, month, year }
    }
}

/// What kind of text block a line of raw input became.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    /// A plain line of prose.
    Paragraph,
    /// A list item introduced by `•`, `-`, `*`, or `<digits>.`.
    Bullet,
    /// An empty line. Contributes vertical spacing only.
    Blank,
}

/// One atomic unit of the content model. Produced by
/// [`parse_formatted_text`](crate::content::parse_formatted_text);
/// immutable once built, order always preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    pub kind: BlockKind,
    /// Trimmed line content. Empty for blank blocks.
    pub text: String,
    /// The matched bullet marker, verbatim. Numeric markers like "3."
    /// are preserved, never renumbered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bullet_marker: Option<String>,
    /// Count of leading whitespace characters on the raw line.
    #[serde(default)]
    pub indent_level: usize,
}

impl TextBlock {
    pub fn paragraph(text: &str) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            text: text.to_string(),
            bullet_marker: None,
            indent_level: 0,
        }
    }

    pub fn bullet(marker: &str, indent_level: usize, text: &str) -> Self {
        Self {
            kind: BlockKind::Bullet,
            text: text.to_string(),
            bullet_marker: Some(marker.to_string()),
            indent_level,
        }
    }

    pub fn blank() -> Self {
        Self {
            kind: BlockKind::Blank,
            text: String::new(),
            bullet_marker: None,
            indent_level: 0,
        }
    }

    /// The marker string a renderer should draw. Numeric markers ("3.")
    /// stay verbatim; the symbol markers all normalize to a bullet dot.
    pub fn display_marker(&self) -> Option<String> {
        let marker = self.bullet_marker.as_deref()?;
        if marker.chars().next().map_or(false, |c| c.is_ascii_digit()) {
            Some(marker.to_string())
        } else {
            Some("•".to_string())
        }
    }
}

/// An image the layout engine places but never decodes. `payload_ref` is
/// whatever string the snapshot carried (data URI, path); resolving it to
/// bytes is the final writer's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAsset {
    pub id: String,
    /// Intrinsic pixel width; None triggers the fallback box policy.
    pub pixel_width: Option<u32>,
    /// Intrinsic pixel height; None triggers the fallback box policy.
    pub pixel_height: Option<u32>,
    pub payload_ref: String,
}

/// One laid-out body section: heading, formatted description blocks, and
/// the photos that follow them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub heading: String,
    pub blocks: Vec<TextBlock>,
    pub images: Vec<ImageAsset>,
}
