//! # Output targets
//!
//! The allocator decides *where* everything goes; targets decide what
//! that looks like in their own command vocabulary. Two ship with the
//! crate:
//!
//! - [`canvas::CanvasTarget`] emits absolute-positioned draw ops per
//!   page, in millimeters, for coordinate renderers.
//! - [`flow::FlowTarget`] emits ordered directives with explicit page
//!   breaks, for word-processor style writers.
//!
//! Both produce plain serializable values. Writing actual file bytes is
//! an external collaborator's job.
//!
//! [`render_document`] is the driver: it composes the report, runs the
//! allocator honoring the target's capability flags, and mirrors every
//! placement onto the target in order.

pub mod canvas;
pub mod flow;

use crate::content::compose_report;
use crate::error::Result;
use crate::layout::{
    heading_reservation, measure_content, push_measured, AdapterCaps, HeightMode, LayoutResult,
    PageFlow, PlacedContent,
};
use crate::model::{DateStamp, PageGeometry, Report};

/// Millimeters per CSS pixel at the 96dpi the producer assumed.
pub(crate) const PX_TO_MM: f64 = 25.4 / 96.0;
pub(crate) const MM_TO_PX: f64 = 96.0 / 25.4;

/// An output surface the driver can render onto.
pub trait RenderTarget {
    /// How this target wants to be driven: its height mode, photo row
    /// arity, and image fitting boxes.
    fn caps(&self) -> AdapterCaps;

    /// Called when the flow opens a page, page 0 included, before any
    /// item lands on it.
    fn begin_page(&mut self, page_index: usize);

    /// Called for every placed item in order, spacing included, with its
    /// final position. A post-hoc target returns the height it actually
    /// consumed, in geometry units; returning None accepts the driver's
    /// estimate. Pre-measured targets always return None.
    fn place_item(
        &mut self,
        page_index: usize,
        y_offset: f64,
        content: &PlacedContent,
    ) -> Option<f64>;
}

/// Compose and lay out a report without an output target. Useful for
/// page-count queries and tests; heights all come from the estimator.
pub fn layout_report(
    report: &Report,
    date: &DateStamp,
    geometry: &PageGeometry,
    caps: &AdapterCaps,
) -> Result<LayoutResult> {
    let mut flow = PageFlow::new(geometry)?;
    for content in compose_report(report, date, caps) {
        push_measured(&mut flow, content, geometry, caps);
    }
    Ok(flow.finish())
}

/// Render a full report onto a target.
///
/// Drives the allocator per the target's capability flags. In
/// pre-measured mode every height comes from the estimator before the
/// target sees the item. In post-hoc mode the item is placed at the
/// cursor first, the target draws and reports what it consumed, and an
/// overrun breaks the page before the next item. Image rows are measured
/// up front in both modes since their extent is known from the fitted
/// cells, and spacing follows the truncate-at-boundary rule everywhere.
pub fn render_document<T: RenderTarget>(
    report: &Report,
    date: &DateStamp,
    geometry: &PageGeometry,
    target: &mut T,
) -> Result<LayoutResult> {
    let caps = target.caps();
    let mut flow = PageFlow::new(geometry)?;
    let mut open_page = 0;
    target.begin_page(0);

    for content in compose_report(report, date, &caps) {
        let mut awaiting_report = false;
        let placement = match caps.height_mode {
            HeightMode::PreMeasured => push_measured(&mut flow, content, geometry, &caps),
            HeightMode::PostHoc => match content {
                PlacedContent::Spacer { height } => flow.place_spacer(height),
                row @ PlacedContent::ImageRow { .. } => {
                    let height = measure_content(&row, geometry, &caps);
                    Some(flow.place(row, height))
                }
                other => {
                    if matches!(other, PlacedContent::Heading { .. }) {
                        flow.reserve(heading_reservation());
                    }
                    awaiting_report = true;
                    Some(flow.begin_post_hoc(other))
                }
            },
        };
        let placement = match placement {
            Some(placement) => placement,
            None => continue,
        };

        if placement.page_index != open_page {
            open_page = placement.page_index;
            target.begin_page(open_page);
        }

        let item = &flow.items()[placement.index];
        let reported = target.place_item(item.page_index, item.y_offset, &item.content);

        if awaiting_report {
            let consumed = match reported {
                Some(height) => height,
                None => measure_content(&flow.items()[placement.index].content, geometry, &caps),
            };
            flow.report_actual_height(consumed);
        }
    }

    Ok(flow.finish())
}

/// The right-aligned company lines every target renders beside the logo,
/// top to bottom.
pub(crate) fn company_lines(nit: &str, contact: &str, city: &str) -> [String; 3] {
    [
        format!("NIT: {}", nit),
        format!("Contacto: {}", contact),
        format!("Ubicación: {} - Colombia", city),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::BoxConstraint;
    use crate::model::{Company, LogoRef, Photo, Recipient, Stage};

    struct RecordingTarget {
        caps: AdapterCaps,
        pages_opened: Vec<usize>,
        placed: Vec<(usize, f64, String)>,
        /// Height to report per post-hoc item; None accepts estimates.
        reported_height: Option<f64>,
    }

    impl RecordingTarget {
        fn new(height_mode: HeightMode) -> Self {
            Self {
                caps: AdapterCaps {
                    height_mode,
                    photos_per_row: 2,
                    photo_box: BoxConstraint::new(80.0, 66.0),
                    logo_cap_width: 85.0,
                    logo_cap_height: 26.458,
                    logo_fallback: 35.0,
                    image_unit_scale: 1.0,
                    logo_unit_scale: 1.0,
                },
                pages_opened: Vec::new(),
                placed: Vec::new(),
                reported_height: None,
            }
        }
    }

    impl RenderTarget for RecordingTarget {
        fn caps(&self) -> AdapterCaps {
            self.caps
        }

        fn begin_page(&mut self, page_index: usize) {
            self.pages_opened.push(page_index);
        }

        fn place_item(
            &mut self,
            page_index: usize,
            y_offset: f64,
            content: &PlacedContent,
        ) -> Option<f64> {
            let kind = match content {
                PlacedContent::Text { .. } => "text",
                PlacedContent::Line { .. } => "line",
                PlacedContent::Heading { .. } => "heading",
                PlacedContent::Field { .. } => "field",
                PlacedContent::Letterhead { .. } => "letterhead",
                PlacedContent::ImageRow { .. } => "row",
                PlacedContent::Signature { .. } => "signature",
                PlacedContent::Spacer { .. } => "spacer",
            };
            self.placed.push((page_index, y_offset, kind.to_string()));
            match self.caps.height_mode {
                HeightMode::PostHoc => self.reported_height,
                HeightMode::PreMeasured => None,
            }
        }
    }

    fn sample_report() -> Report {
        Report {
            company: Company {
                company_name: "Constructora Andina SAS".to_string(),
                company_nit: "900.123.456-7".to_string(),
                company_contact: "310 555 0123".to_string(),
                company_city: "Medellín".to_string(),
                author_name: "María Gómez".to_string(),
                author_role: "Ingeniera Residente".to_string(),
                author_department: "Dirección de Obra".to_string(),
                logo: Some(LogoRef::Inline {
                    data: "data:image/png;base64,Zm9v".to_string(),
                    width: Some(300),
                    height: Some(100),
                }),
            },
            recipient: Recipient {
                recipient_name: "Carlos Ruiz".to_string(),
                recipient_role: "Interventor".to_string(),
                report_subject: "Avance de obra, contrato 042".to_string(),
            },
            stages: vec![Stage {
                title: "Cimentación".to_string(),
                description: "Se excavó la zona norte.\n- Retiro de sobrantes".to_string(),
                photos: vec![
                    Photo {
                        id: "photo-1".to_string(),
                        data: "data:image/jpeg;base64,QQQQ".to_string(),
                        name: "p1.jpg".to_string(),
                        width: Some(2000),
                        height: Some(1500),
                    },
                    Photo {
                        id: "photo-2".to_string(),
                        data: "data:image/jpeg;base64,RRRR".to_string(),
                        name: "p2.jpg".to_string(),
                        width: Some(1600),
                        height: Some(1200),
                    },
                ],
            }],
            recommendations: "Continuar según cronograma.".to_string(),
        }
    }

    fn stamp() -> DateStamp {
        DateStamp::new(5, 3, 2024)
    }

    #[test]
    fn test_driver_opens_every_page_once() {
        let mut target = RecordingTarget::new(HeightMode::PreMeasured);
        let result =
            render_document(&sample_report(), &stamp(), &PageGeometry::a4(), &mut target).unwrap();
        let expected: Vec<usize> = (0..result.total_pages).collect();
        assert_eq!(target.pages_opened, expected);
    }

    #[test]
    fn test_driver_mirrors_every_placed_item() {
        let mut target = RecordingTarget::new(HeightMode::PreMeasured);
        let result =
            render_document(&sample_report(), &stamp(), &PageGeometry::a4(), &mut target).unwrap();
        assert_eq!(target.placed.len(), result.items.len());
        assert_eq!(target.placed[0].2, "line");
        assert_eq!(target.placed.last().unwrap().2, "signature");
    }

    #[test]
    fn test_driver_matches_dry_run_layout() {
        let mut target = RecordingTarget::new(HeightMode::PreMeasured);
        let rendered =
            render_document(&sample_report(), &stamp(), &PageGeometry::a4(), &mut target).unwrap();
        let dry = layout_report(
            &sample_report(),
            &stamp(),
            &PageGeometry::a4(),
            &target.caps(),
        )
        .unwrap();
        assert_eq!(rendered.total_pages, dry.total_pages);
        assert_eq!(rendered.items, dry.items);
    }

    #[test]
    fn test_post_hoc_reported_heights_drive_breaks() {
        // Every post-hoc item claims 40 units on a 100-unit page, so
        // breaks come every three items regardless of estimates.
        let geometry = PageGeometry {
            page_height: 140.0,
            ..PageGeometry::a4()
        };
        let mut target = RecordingTarget::new(HeightMode::PostHoc);
        target.reported_height = Some(40.0);
        let result = render_document(&sample_report(), &stamp(), &geometry, &mut target).unwrap();
        assert!(result.total_pages > 1);
        for item in &result.items {
            if !matches!(
                item.content,
                PlacedContent::Spacer { .. } | PlacedContent::ImageRow { .. }
            ) {
                assert_eq!(item.height_consumed, 40.0);
            }
        }
        // Positions the target saw match the final result
        for (recorded, item) in target.placed.iter().zip(result.items.iter()) {
            assert_eq!(recorded.0, item.page_index);
            assert_eq!(recorded.1, item.y_offset);
        }
    }

    #[test]
    fn test_post_hoc_image_rows_stay_pre_measured() {
        let mut target = RecordingTarget::new(HeightMode::PostHoc);
        target.reported_height = Some(3.0);
        let result =
            render_document(&sample_report(), &stamp(), &PageGeometry::a4(), &mut target).unwrap();
        let row = result
            .items
            .iter()
            .find(|i| matches!(i.content, PlacedContent::ImageRow { .. }))
            .unwrap();
        // 2000×1500 into 80×66: height 60, scale 1, plus row padding
        assert_eq!(row.height_consumed, 70.0);
    }

    #[test]
    fn test_invalid_geometry_rejected_before_target_runs() {
        let bad = PageGeometry {
            page_height: 10.0,
            ..PageGeometry::a4()
        };
        let mut target = RecordingTarget::new(HeightMode::PreMeasured);
        assert!(render_document(&sample_report(), &stamp(), &bad, &mut target).is_err());
    }
}
