//! # Content model and document composer
//!
//! Bridges the stored snapshot and the allocator. Two jobs live here:
//!
//! - **Building**: turning raw stage text into structured blocks
//!   ([`parse_formatted_text`]) and stages into numbered sections with
//!   resolved image assets ([`build_content_model`]).
//! - **Composing**: assembling the full informe stream in template order
//!   ([`compose_report`]), so the allocator and the targets never consult
//!   the snapshot themselves.
//!
//! Template decisions (labels, the fixed introduction, heading numbers,
//! the uppercased signature name) are all resolved here, once.

use crate::error::{InformeError, Result};
use crate::fit::fit_logo_box;
use crate::layout::{stream_sections, AdapterCaps, LogoSlot, PlacedContent, TextStyle};
use crate::model::{
    Company, DateStamp, ImageAsset, Photo, Report, Section, TextBlock,
};
use crate::probe;

/// Fixed introduction paragraph every informe opens with.
pub const INTRO_TEXT: &str = "Por medio del presente documento, se presenta \
     el informe técnico correspondiente a las actividades realizadas:";

/// Vertical gap between the template's opening blocks.
const TEMPLATE_GAP: f64 = 10.0;

const SPANISH_MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

// ── Dates ───────────────────────────────────────────────────────────

fn month_name(month: u32) -> &'static str {
    SPANISH_MONTHS
        .get((month as usize).saturating_sub(1))
        .copied()
        .unwrap_or("")
}

/// `"{day} de {month} de {year}"` with Spanish month names.
pub fn formatted_date(stamp: &DateStamp) -> String {
    format!(
        "{} de {} de {}",
        stamp.day,
        month_name(stamp.month),
        stamp.year
    )
}

/// Dateline form used by the template: `"{city}, {day} de {month} de
/// {year}"`. An empty city falls back to `"Ciudad"`.
pub fn formatted_date_with_city(stamp: &DateStamp, city: &str) -> String {
    let city_name = if city.trim().is_empty() {
        "Ciudad"
    } else {
        city
    };
    format!("{}, {}", city_name, formatted_date(stamp))
}

// ── Formatted text parsing ──────────────────────────────────────────

/// Split a line into its bullet marker and content, when it has one.
///
/// A bullet is a `•`, `-` or `*` marker, or a run of digits followed by
/// a dot, then at least one whitespace character before the content.
/// Both parts are required: `"-sin espacio"` is a plain paragraph, and
/// so is a bare `"- "` with nothing after the marker.
fn split_bullet(line: &str) -> Option<(&str, &str)> {
    for marker in ["•", "-", "*"] {
        if let Some(rest) = line.strip_prefix(marker) {
            if rest.starts_with(char::is_whitespace) && !rest.trim().is_empty() {
                return Some((marker, rest.trim()));
            }
        }
    }
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let after = &line[digits..];
        if let Some(rest) = after.strip_prefix('.') {
            if rest.starts_with(char::is_whitespace) && !rest.trim().is_empty() {
                return Some((&line[..digits + 1], rest.trim()));
            }
        }
    }
    None
}

/// Parse user-entered stage text into blocks.
///
/// Lines become paragraphs, bullet lines become bullets (the numeric
/// marker is kept verbatim so `3.` stays `3.`), and blank lines become
/// blank spacing blocks. The indent level counts the leading whitespace
/// of the raw line, so nested bullets written with two leading spaces
/// survive the round trip. An empty input yields no blocks at all.
pub fn parse_formatted_text(text: &str) -> Vec<TextBlock> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .map(|line| {
            let trimmed = line.trim_start();
            if trimmed.is_empty() {
                return TextBlock::blank();
            }
            let indent = line.chars().count() - trimmed.chars().count();
            match split_bullet(trimmed) {
                Some((marker, content)) => TextBlock::bullet(marker, indent, content),
                None => TextBlock::paragraph(line.trim()),
            }
        })
        .collect()
}

// ── Asset resolution ────────────────────────────────────────────────

/// Resolve one stage photo into an image asset. Dimensions stored in the
/// snapshot win; otherwise the payload header is probed. Either way the
/// asset may end up dimensionless, and the fitting fallback covers it.
fn photo_asset(photo: &Photo) -> ImageAsset {
    let id = if photo.id.is_empty() {
        photo.name.clone()
    } else {
        photo.id.clone()
    };
    let (pixel_width, pixel_height) = resolve_dimensions(photo.width, photo.height, &photo.data);
    ImageAsset {
        id,
        pixel_width,
        pixel_height,
        payload_ref: photo.data.clone(),
    }
}

fn resolve_dimensions(
    width: Option<u32>,
    height: Option<u32>,
    payload: &str,
) -> (Option<u32>, Option<u32>) {
    match (width, height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (Some(w), Some(h)),
        _ => probe::probe_dimensions(payload)
            .map_or((None, None), |(w, h)| (Some(w), Some(h))),
    }
}

/// Resolve the company logo, whatever historical shape the snapshot
/// stored it in. Returns None when there is no usable payload.
pub fn resolve_logo(company: &Company) -> Option<ImageAsset> {
    let logo = company.logo.as_ref()?;
    let payload = logo.payload()?;
    let (width, height) = logo.intrinsic_dimensions();
    let (pixel_width, pixel_height) = resolve_dimensions(width, height, payload);
    Some(ImageAsset {
        id: "letterhead-logo".to_string(),
        pixel_width,
        pixel_height,
        payload_ref: payload.to_string(),
    })
}

// ── Content model ───────────────────────────────────────────────────

/// Build the section list the allocator consumes: one numbered section
/// per stage (title falling back to `"Etapa {n}"`), the description
/// parsed into blocks, photos resolved into assets; then, when present,
/// a final `"{n}. Recomendaciones"` section continuing the numbering.
pub fn build_content_model(report: &Report) -> Vec<Section> {
    let mut sections: Vec<Section> = report
        .stages
        .iter()
        .enumerate()
        .map(|(index, stage)| {
            let number = index + 1;
            let title = if stage.title.trim().is_empty() {
                format!("Etapa {}", number)
            } else {
                stage.title.trim().to_string()
            };
            Section {
                heading: format!("{}. {}", number, title),
                blocks: parse_formatted_text(&stage.description),
                images: stage.photos.iter().map(photo_asset).collect(),
            }
        })
        .collect();

    if !report.recommendations.trim().is_empty() {
        sections.push(Section {
            heading: format!("{}. Recomendaciones", report.stages.len() + 1),
            blocks: parse_formatted_text(&report.recommendations),
            images: Vec::new(),
        });
    }
    sections
}

// ── Validation ──────────────────────────────────────────────────────

fn require(errors: &mut Vec<String>, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.push(message.to_string());
    }
}

/// Check a snapshot before generation. Collects every problem instead of
/// stopping at the first; messages are the user-facing Spanish strings
/// shown by the producer UI.
pub fn validate(report: &Report) -> Result<()> {
    let mut errors = Vec::new();

    require(
        &mut errors,
        &report.company.company_name,
        "• El nombre de la empresa es requerido",
    );
    require(
        &mut errors,
        &report.company.company_nit,
        "• El NIT de la empresa es requerido",
    );
    require(
        &mut errors,
        &report.company.company_contact,
        "• El contacto de la empresa es requerido",
    );
    require(
        &mut errors,
        &report.company.company_city,
        "• La ciudad de la empresa es requerida",
    );
    require(
        &mut errors,
        &report.company.author_name,
        "• El nombre del autor es requerido",
    );
    require(
        &mut errors,
        &report.company.author_role,
        "• El cargo del autor es requerido",
    );
    require(
        &mut errors,
        &report.company.author_department,
        "• El departamento del autor es requerido",
    );
    require(
        &mut errors,
        &report.recipient.recipient_name,
        "• El nombre del destinatario es requerido",
    );
    require(
        &mut errors,
        &report.recipient.recipient_role,
        "• El cargo del destinatario es requerido",
    );
    require(
        &mut errors,
        &report.recipient.report_subject,
        "• El asunto del informe es requerido",
    );

    if report.stages.is_empty() {
        errors.push("• Debe agregar al menos una etapa al informe".to_string());
    } else {
        let mut has_valid_stage = false;
        for (index, stage) in report.stages.iter().enumerate() {
            if stage.title.trim().is_empty() {
                errors.push(format!("• La etapa {} debe tener un título", index + 1));
            } else {
                has_valid_stage = true;
            }
            if stage.description.trim().is_empty() {
                errors.push(format!(
                    "• La etapa {} debe tener una descripción",
                    index + 1
                ));
            } else {
                has_valid_stage = true;
            }
        }
        if !has_valid_stage {
            errors.push("• Al menos una etapa debe tener título y descripción".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(InformeError::Validation(errors))
    }
}

// ── Composer ────────────────────────────────────────────────────────

fn letterhead(company: &Company, caps: &AdapterCaps) -> PlacedContent {
    let logo = resolve_logo(company).map(|asset| {
        let placeholder = asset.pixel_width.is_none() || asset.pixel_height.is_none();
        let fitted = fit_logo_box(
            asset.pixel_width,
            asset.pixel_height,
            caps.logo_cap_width,
            caps.logo_cap_height,
            caps.logo_fallback,
        );
        LogoSlot {
            payload_ref: asset.payload_ref,
            width: fitted.width,
            height: fitted.height,
            placeholder,
        }
    });
    PlacedContent::Letterhead {
        logo,
        name: company.company_name.clone(),
        nit: company.company_nit.clone(),
        contact: company.company_contact.clone(),
        city: company.company_city.clone(),
    }
}

/// Assemble the full informe content stream in template order: dateline,
/// letterhead, recipient block, subject, introduction, the numbered
/// sections, and the closing signature block.
///
/// The date is an explicit input rather than read from a clock, so the
/// same snapshot always composes to the same stream.
pub fn compose_report(
    report: &Report,
    date: &DateStamp,
    caps: &AdapterCaps,
) -> Vec<PlacedContent> {
    let mut stream = Vec::new();

    stream.push(PlacedContent::Line {
        text: formatted_date_with_city(date, &report.company.company_city),
        style: TextStyle::body(),
    });
    stream.push(PlacedContent::Spacer {
        height: TEMPLATE_GAP,
    });

    stream.push(letterhead(&report.company, caps));

    stream.push(PlacedContent::Field {
        label: "Para: ".to_string(),
        value: report.recipient.recipient_name.clone(),
        bold_value: false,
    });
    stream.push(PlacedContent::Field {
        label: "Cargo: ".to_string(),
        value: report.recipient.recipient_role.clone(),
        bold_value: false,
    });
    stream.push(PlacedContent::Spacer {
        height: TEMPLATE_GAP,
    });
    stream.push(PlacedContent::Field {
        label: "Asunto: ".to_string(),
        value: report.recipient.report_subject.clone(),
        bold_value: true,
    });
    stream.push(PlacedContent::Spacer {
        height: TEMPLATE_GAP,
    });

    stream.push(PlacedContent::Text {
        block: TextBlock::paragraph(INTRO_TEXT),
        style: TextStyle::body(),
    });
    stream.push(PlacedContent::Spacer {
        height: TEMPLATE_GAP,
    });

    stream.extend(stream_sections(&build_content_model(report), caps));

    stream.push(PlacedContent::Signature {
        name: report.company.author_name.to_uppercase(),
        role: report.company.author_role.clone(),
        department: report.company.author_department.clone(),
    });

    stream
}
