//! Stamp composition engine.
//!
//! Takes the document's canonical PDF plus a list of placement requests,
//! renders each stamp's field-mapping text onto its bitmap, and composites
//! the bitmaps onto the requested pages. Placements fail individually
//! (missing asset, bad page, unreadable image) without aborting the rest;
//! only a request where nothing at all could be placed is an error.
//!
//! Submodules: [`placement`] does the pure geometry, [`text`] resolves and
//! rasterizes field text, [`compose`] drives lopdf.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io::Cursor;

use image::ImageOutputFormat;
use lopdf::ObjectId;
use serde::Serialize;
use thiserror::Error;

use crate::models::FieldMapping;

mod compose;
mod placement;
mod text;

pub use compose::{is_pdf, pdf_info, PageInfo, PdfInfo};
pub use placement::{StampPlacement, StampPosition};
pub use text::{
    document_field_values, DisplayLookups, FixedAdvanceRasterizer, GlyphRasterizer, TextRasterizer,
};

use compose::PageOverlay;
use placement::PlacedRect;

// ═══════════════════════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum StampError {
    #[error("Main document is not a PDF (missing %PDF- signature)")]
    NotAPdf,

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("PDF encoding failed: {0}")]
    PdfEncoding(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Stamp font unavailable: {reason}")]
    FontLoading { reason: String },

    #[error("No stamp placements requested")]
    NoPlacements,

    #[error("All stamp placements failed: {}", summarize_failures(.failures))]
    NothingApplied { failures: Vec<PlacementFailure> },
}

/// One placement that could not be composited.
#[derive(Debug, Clone, Serialize)]
pub struct PlacementFailure {
    pub stamp_name: String,
    pub page_number: usize,
    pub reason: String,
}

impl fmt::Display for PlacementFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (page {}): {}",
            self.stamp_name, self.page_number, self.reason
        )
    }
}

fn summarize_failures(failures: &[PlacementFailure]) -> String {
    failures
        .iter()
        .map(PlacementFailure::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Composited PDF plus the per-placement report.
#[derive(Debug)]
pub struct ApplyOutcome {
    pub pdf_bytes: Vec<u8>,
    pub applied: Vec<StampPlacement>,
    pub failed: Vec<PlacementFailure>,
}

/// A stamp's image bytes and text rules, loaded by the caller from the
/// stamp record and the file store.
#[derive(Debug, Clone)]
pub struct StampAsset {
    pub image_bytes: Vec<u8>,
    pub field_mappings: Vec<FieldMapping>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Engine
// ═══════════════════════════════════════════════════════════════════════════

pub struct StampEngine {
    rasterizer: Box<dyn TextRasterizer>,
}

impl StampEngine {
    pub fn new(rasterizer: Box<dyn TextRasterizer>) -> Self {
        Self { rasterizer }
    }

    /// Engine over the configured TrueType stamp font. Fails when no font
    /// can be found, so the missing asset surfaces at startup rather than
    /// on the first stamped document.
    pub fn with_configured_font() -> Result<Self, StampError> {
        Ok(Self::new(Box::new(GlyphRasterizer::from_config()?)))
    }

    /// Composite `placements` onto `pdf_bytes`. Field text is drawn from
    /// `field_values` (see [`document_field_values`]). Individual failures
    /// are collected; the call errors only when no placement succeeded.
    pub fn apply_stamps(
        &self,
        pdf_bytes: &[u8],
        placements: &[StampPlacement],
        assets: &HashMap<String, StampAsset>,
        field_values: &HashMap<String, String>,
    ) -> Result<ApplyOutcome, StampError> {
        if placements.is_empty() {
            return Err(StampError::NoPlacements);
        }

        let mut doc = compose::load_pdf(pdf_bytes)?;
        let page_ids: Vec<ObjectId> = doc.page_iter().collect();

        let mut applied: Vec<StampPlacement> = Vec::new();
        let mut failed: Vec<PlacementFailure> = Vec::new();
        let mut by_page: BTreeMap<usize, Vec<PageOverlay>> = BTreeMap::new();

        for (index, placement) in placements.iter().enumerate() {
            match self.prepare_overlay(&mut doc, &page_ids, placement, index, assets, field_values)
            {
                Ok(overlay) => {
                    by_page.entry(placement.page_number).or_default().push(overlay);
                    applied.push(placement.clone());
                }
                Err(reason) => {
                    tracing::warn!(
                        stamp = %placement.stamp_name,
                        page = placement.page_number,
                        %reason,
                        "Stamp placement failed"
                    );
                    failed.push(PlacementFailure {
                        stamp_name: placement.stamp_name.clone(),
                        page_number: placement.page_number,
                        reason,
                    });
                }
            }
        }

        if applied.is_empty() {
            return Err(StampError::NothingApplied { failures: failed });
        }

        for (page_index, overlays) in &by_page {
            compose::overlay_page(&mut doc, page_ids[*page_index], overlays)?;
        }
        let stamped = compose::save_pdf(&mut doc)?;

        tracing::debug!(
            applied = applied.len(),
            failed = failed.len(),
            pages = by_page.len(),
            "Composited stamps onto PDF"
        );
        Ok(ApplyOutcome { pdf_bytes: stamped, applied, failed })
    }

    /// Resolve one placement into a page overlay, embedding the finished
    /// stamp bitmap into the PDF. Failures come back as display reasons.
    fn prepare_overlay(
        &self,
        doc: &mut lopdf::Document,
        page_ids: &[ObjectId],
        placement: &StampPlacement,
        index: usize,
        assets: &HashMap<String, StampAsset>,
        field_values: &HashMap<String, String>,
    ) -> Result<PageOverlay, String> {
        let asset = assets
            .get(&placement.stamp_name)
            .ok_or_else(|| "stamp has no image asset".to_string())?;

        if placement.page_number >= page_ids.len() {
            return Err(format!(
                "page {} out of range (document has {} pages)",
                placement.page_number,
                page_ids.len()
            ));
        }
        let (page_width, page_height) =
            compose::page_dimensions(doc, page_ids[placement.page_number])
                .map_err(|e| e.to_string())?;

        let mut bitmap = image::load_from_memory(&asset.image_bytes)
            .map_err(|e| format!("unreadable stamp image: {e}"))?
            .to_rgba8();
        text::draw_mappings(&mut bitmap, &asset.field_mappings, field_values, self.rasterizer.as_ref());

        let scale = placement.effective_scale();
        let (width, height) = placement::scaled_size(bitmap.width(), bitmap.height(), scale);
        if width <= 0.0 || height <= 0.0 {
            return Err(format!("non-positive stamp size at scale {scale}"));
        }

        let (x, y) = if placement.position.is_custom() {
            let (cx, cy) = placement
                .custom_center()
                .ok_or_else(|| "custom position without x/y coordinates".to_string())?;
            placement::custom_origin(cx, cy, page_width, page_height, width, height)
        } else {
            placement::anchor_origin(placement.position, page_width, page_height, width, height)
                .ok_or_else(|| "unresolvable anchor position".to_string())?
        };

        let image_id = compose::embed_stamp_image(doc, &bitmap);
        Ok(PageOverlay {
            xobject_name: format!("EdoStamp{}", index + 1),
            image_id,
            rect: PlacedRect { x, y, width, height },
        })
    }

    /// PNG preview of a stamp with its field text rendered. With no field
    /// values the mapped labels render as «...» placeholders, which is what
    /// the stamp editor shows before a document is chosen.
    pub fn render_stamp_preview(
        &self,
        asset: &StampAsset,
        field_values: Option<&HashMap<String, String>>,
    ) -> Result<Vec<u8>, StampError> {
        let mut bitmap = image::load_from_memory(&asset.image_bytes)
            .map_err(|e| StampError::ImageProcessing(format!("unreadable stamp image: {e}")))?
            .to_rgba8();

        let placeholders: HashMap<String, String>;
        let values = match field_values {
            Some(values) => values,
            None => {
                placeholders = asset
                    .field_mappings
                    .iter()
                    .map(|m| (m.document_field.clone(), text::placeholder_value(&m.document_field)))
                    .collect();
                &placeholders
            }
        };
        text::draw_mappings(&mut bitmap, &asset.field_mappings, values, self.rasterizer.as_ref());

        let mut png = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(bitmap)
            .write_to(&mut png, ImageOutputFormat::Png)
            .map_err(|e| StampError::ImageProcessing(format!("PNG encode failed: {e}")))?;
        Ok(png.into_inner())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> StampEngine {
        StampEngine::new(Box::new(FixedAdvanceRasterizer::new()))
    }

    fn make_stamp_png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([20, 60, 200, 255]));
        let mut png = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut png, ImageOutputFormat::Png)
            .unwrap();
        png.into_inner()
    }

    fn asset_with_mapping() -> StampAsset {
        StampAsset {
            image_bytes: make_stamp_png(200, 100),
            field_mappings: vec![FieldMapping {
                document_field: "incoming_number".into(),
                position_x: 10.0,
                position_y: 10.0,
                font_size: 14.0,
                color: "#000000".into(),
                max_width: 0.0,
            }],
        }
    }

    fn placement(stamp: &str, page: usize, position: StampPosition) -> StampPlacement {
        StampPlacement {
            stamp_name: stamp.to_string(),
            page_number: page,
            position,
            x: None,
            y: None,
            scale: None,
        }
    }

    #[test]
    fn engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StampEngine>();
    }

    // ── apply_stamps ──

    #[test]
    fn applies_placements_across_pages() {
        let pdf = compose::make_blank_pdf(2);
        let mut assets = HashMap::new();
        assets.insert("Виза".to_string(), asset_with_mapping());
        let mut values = HashMap::new();
        values.insert("incoming_number".to_string(), "ВХ-117".to_string());

        let placements = vec![
            placement("Виза", 0, StampPosition::BottomRight),
            StampPlacement {
                stamp_name: "Виза".into(),
                page_number: 1,
                position: StampPosition::Custom,
                x: Some(300.0),
                y: Some(400.0),
                scale: Some(0.3),
            },
        ];
        let outcome = engine().apply_stamps(&pdf, &placements, &assets, &values).unwrap();

        assert_eq!(outcome.applied.len(), 2);
        assert!(outcome.failed.is_empty());
        assert!(is_pdf(&outcome.pdf_bytes));
        let info = pdf_info(&outcome.pdf_bytes).unwrap();
        assert_eq!(info.page_count, 2);
    }

    #[test]
    fn reports_partial_success_and_keeps_going() {
        let pdf = compose::make_blank_pdf(1);
        let mut assets = HashMap::new();
        assets.insert("Виза".to_string(), asset_with_mapping());

        let placements = vec![
            placement("Виза", 0, StampPosition::TopLeft),
            placement("Несуществующий", 0, StampPosition::TopRight),
            placement("Виза", 7, StampPosition::BottomLeft),
        ];
        let outcome = engine()
            .apply_stamps(&pdf, &placements, &assets, &HashMap::new())
            .unwrap();

        assert_eq!(outcome.applied.len(), 1);
        assert_eq!(outcome.failed.len(), 2);
        assert_eq!(outcome.failed[0].stamp_name, "Несуществующий");
        assert!(outcome.failed[0].reason.contains("no image asset"));
        assert!(outcome.failed[1].reason.contains("out of range"));
    }

    #[test]
    fn fails_outright_when_nothing_could_be_placed() {
        let pdf = compose::make_blank_pdf(1);
        let placements = vec![placement("Призрак", 0, StampPosition::TopLeft)];

        let err = engine()
            .apply_stamps(&pdf, &placements, &HashMap::new(), &HashMap::new())
            .unwrap_err();
        match err {
            StampError::NothingApplied { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].stamp_name, "Призрак");
            }
            other => panic!("expected NothingApplied, got {other:?}"),
        }
    }

    #[test]
    fn zero_scale_is_a_placement_failure() {
        let pdf = compose::make_blank_pdf(1);
        let mut assets = HashMap::new();
        assets.insert("Виза".to_string(), asset_with_mapping());
        let mut bad = placement("Виза", 0, StampPosition::TopLeft);
        bad.scale = Some(0.0);

        let err = engine()
            .apply_stamps(&pdf, &[bad], &assets, &HashMap::new())
            .unwrap_err();
        match err {
            StampError::NothingApplied { failures } => {
                assert!(failures[0].reason.contains("non-positive"));
            }
            other => panic!("expected NothingApplied, got {other:?}"),
        }
    }

    #[test]
    fn empty_request_is_rejected() {
        let pdf = compose::make_blank_pdf(1);
        let err = engine()
            .apply_stamps(&pdf, &[], &HashMap::new(), &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, StampError::NoPlacements));
    }

    #[test]
    fn non_pdf_input_is_rejected_before_any_placement() {
        let mut assets = HashMap::new();
        assets.insert("Виза".to_string(), asset_with_mapping());
        let placements = vec![placement("Виза", 0, StampPosition::TopLeft)];

        let err = engine()
            .apply_stamps(b"MZ not a pdf", &placements, &assets, &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, StampError::NotAPdf));
    }

    // ── Previews ──

    #[test]
    fn preview_renders_live_values_as_png() {
        let asset = asset_with_mapping();
        let mut values = HashMap::new();
        values.insert("incoming_number".to_string(), "ВХ-117".to_string());

        let png = engine().render_stamp_preview(&asset, Some(&values)).unwrap();
        assert_eq!(&png[0..4], b"\x89PNG");

        // The text block darkened pixels that were uniform blue before.
        let img = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(*img.get_pixel(12, 12), image::Rgba([0, 0, 0, 255]));
        assert_eq!(*img.get_pixel(190, 90), image::Rgba([20, 60, 200, 255]));
    }

    #[test]
    fn preview_without_document_draws_placeholders() {
        let asset = asset_with_mapping();
        let png = engine().render_stamp_preview(&asset, None).unwrap();
        let img = image::load_from_memory(&png).unwrap().to_rgba8();
        // «Входящий номер» rendered at the mapping position.
        assert_eq!(*img.get_pixel(12, 12), image::Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn preview_rejects_broken_image_assets() {
        let asset = StampAsset { image_bytes: b"not an image".to_vec(), field_mappings: vec![] };
        let err = engine().render_stamp_preview(&asset, None).unwrap_err();
        assert!(matches!(err, StampError::ImageProcessing(_)));
    }
}
