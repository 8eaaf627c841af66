//! Field text rendering for stamp bitmaps.
//!
//! A stamp's field mappings name document attributes that get drawn onto
//! the stamp image before compositing: link references resolve to display
//! names, dates format as `dd.mm.yyyy`, everything else renders literally.
//! Glyph rasterization sits behind [`TextRasterizer`] so the wrapping and
//! layout logic stays testable without a font file on disk.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
use chrono::{DateTime, NaiveDate, Utc};
use image::{Rgba, RgbaImage};

use crate::config;
use crate::models::{Document, FieldMapping};

use super::StampError;

// ═══════════════════════════════════════════════════════════════════════════
// Field value resolution
// ═══════════════════════════════════════════════════════════════════════════

/// Display names for the link references a document carries, loaded by the
/// caller for exactly the names the document mentions.
#[derive(Debug, Clone, Default)]
pub struct DisplayLookups {
    /// User name → full name.
    pub users: HashMap<String, String>,
    /// Reception office name → office display name.
    pub offices: HashMap<String, String>,
    /// Resolution template name → display text.
    pub resolutions: HashMap<String, String>,
}

impl DisplayLookups {
    fn user(&self, name: &str) -> String {
        self.users.get(name).cloned().unwrap_or_else(|| name.to_string())
    }

    fn office(&self, name: &str) -> String {
        self.offices.get(name).cloned().unwrap_or_else(|| name.to_string())
    }

    fn resolution(&self, name: &str) -> String {
        self.resolutions.get(name).cloned().unwrap_or_else(|| name.to_string())
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

pub fn format_datetime(moment: DateTime<Utc>) -> String {
    moment.format("%d.%m.%Y").to_string()
}

/// Every stampable document attribute resolved to its display text.
/// Attributes without a value are omitted, so their mappings draw nothing.
pub fn document_field_values(doc: &Document, lookups: &DisplayLookups) -> HashMap<String, String> {
    let mut values = HashMap::new();
    let mut put = |field: &str, value: Option<String>| {
        if let Some(value) = value {
            if !value.is_empty() {
                values.insert(field.to_string(), value);
            }
        }
    };

    put("name", Some(doc.name.clone()));
    put("title", Some(doc.title.clone()));
    put("status", Some(doc.status.as_str().to_string()));
    put("brief_content", doc.brief_content.clone());
    put("document_date", doc.document_date.map(format_date));
    put("incoming_number", doc.incoming_number.clone());
    put("incoming_date", doc.incoming_date.map(format_date));
    put("outgoing_number", doc.outgoing_number.clone());
    put("outgoing_date", doc.outgoing_date.map(format_date));
    put("document_type", doc.document_type.clone());
    put("priority", doc.priority.clone());
    put("correspondent", doc.correspondent.clone());
    put("classification", doc.classification.clone());
    put("delivery_method", doc.delivery_method.clone());
    put(
        "reception_office",
        doc.reception_office.as_deref().map(|o| lookups.office(o)),
    );
    put(
        "reception_user",
        doc.reception_user.as_deref().map(|u| lookups.user(u)),
    );
    put(
        "reception_decision_date",
        doc.reception_decision_date.map(format_datetime),
    );
    put(
        "director_user",
        doc.director_user.as_deref().map(|u| lookups.user(u)),
    );
    put(
        "director_decision_date",
        doc.director_decision_date.map(format_datetime),
    );
    put("director_comment", doc.director_comment.clone());
    put(
        "resolution",
        doc.resolution.as_deref().map(|r| lookups.resolution(r)),
    );
    put("resolution_text", doc.resolution_text.clone());
    put("executor", doc.executor.as_deref().map(|u| lookups.user(u)));
    if !doc.co_executors.is_empty() {
        let joined = doc
            .co_executors
            .iter()
            .map(|u| lookups.user(u))
            .collect::<Vec<_>>()
            .join(", ");
        put("co_executors", Some(joined));
    }
    put("created_at", Some(format_datetime(doc.created_at)));
    put("modified_at", Some(format_datetime(doc.modified_at)));

    values
}

/// Portal label for a document attribute, used for preview placeholders.
pub fn field_label(field: &str) -> &str {
    match field {
        "name" => "Номер документа",
        "title" => "Наименование",
        "status" => "Статус",
        "brief_content" => "Краткое содержание",
        "document_date" => "Дата документа",
        "incoming_number" => "Входящий номер",
        "incoming_date" => "Входящая дата",
        "outgoing_number" => "Исходящий номер",
        "outgoing_date" => "Исходящая дата",
        "document_type" => "Вид документа",
        "priority" => "Приоритет",
        "correspondent" => "Корреспондент",
        "classification" => "Гриф",
        "delivery_method" => "Способ доставки",
        "reception_office" => "Приёмная",
        "reception_user" => "Сотрудник приёмной",
        "reception_decision_date" => "Дата обработки в приёмной",
        "director_user" => "Директор",
        "director_decision_date" => "Дата решения директора",
        "director_comment" => "Комментарий директора",
        "resolution" => "Резолюция",
        "resolution_text" => "Текст резолюции",
        "executor" => "Исполнитель",
        "co_executors" => "Соисполнители",
        "created_at" => "Дата создания",
        "modified_at" => "Дата изменения",
        other => other,
    }
}

/// Placeholder shown on previews rendered without a document.
pub fn placeholder_value(field: &str) -> String {
    format!("«{}»", field_label(field))
}

// ═══════════════════════════════════════════════════════════════════════════
// Layout
// ═══════════════════════════════════════════════════════════════════════════

/// Parse `#RRGGBB` (leading `#` optional). Unparseable colors fall back to
/// opaque black so a bad mapping still renders legible text.
pub fn parse_hex_color(color: &str) -> Rgba<u8> {
    let hex = color.trim().trim_start_matches('#');
    if hex.len() == 6 {
        if let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&hex[0..2], 16),
            u8::from_str_radix(&hex[2..4], 16),
            u8::from_str_radix(&hex[4..6], 16),
        ) {
            return Rgba([r, g, b, 255]);
        }
    }
    Rgba([0, 0, 0, 255])
}

/// Wrap text to `max_width` pixels using the supplied measure function.
/// Breaks on word boundaries; a single word wider than the limit breaks at
/// character level. `max_width <= 0` disables wrapping.
pub fn wrap_text(text: &str, max_width: f32, measure: &dyn Fn(&str) -> f32) -> Vec<String> {
    if max_width <= 0.0 {
        return if text.is_empty() { Vec::new() } else { vec![text.to_string()] };
    }

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure(&candidate) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if measure(word) <= max_width {
            current = word.to_string();
        } else {
            current = break_word(word, max_width, measure, &mut lines);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Character-level fallback for a word wider than the wrap width. Always
/// keeps at least one character per line so progress is guaranteed.
fn break_word(
    word: &str,
    max_width: f32,
    measure: &dyn Fn(&str) -> f32,
    lines: &mut Vec<String>,
) -> String {
    let mut piece = String::new();
    for ch in word.chars() {
        let mut candidate = piece.clone();
        candidate.push(ch);
        if !piece.is_empty() && measure(&candidate) > max_width {
            lines.push(std::mem::take(&mut piece));
            piece.push(ch);
        } else {
            piece = candidate;
        }
    }
    piece
}

// ═══════════════════════════════════════════════════════════════════════════
// Rasterization
// ═══════════════════════════════════════════════════════════════════════════

/// Measures and draws text onto RGBA bitmaps. The production implementation
/// uses real glyph outlines; tests swap in a fixed-advance stand-in.
pub trait TextRasterizer: Send + Sync {
    /// Advance width of `text` at `font_px` pixels, in pixels.
    fn measure(&self, text: &str, font_px: f32) -> f32;

    /// Draw one line of text with its top-left corner at `(x, y)`.
    fn draw(&self, canvas: &mut RgbaImage, text: &str, font_px: f32, x: f32, y: f32, color: Rgba<u8>);
}

/// TrueType rasterizer over the configured stamp font.
pub struct GlyphRasterizer {
    font: FontVec,
}

impl GlyphRasterizer {
    pub fn from_path(path: &Path) -> Result<Self, StampError> {
        let bytes = fs::read(path).map_err(|e| StampError::FontLoading {
            reason: format!("{}: {e}", path.display()),
        })?;
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, StampError> {
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| StampError::FontLoading { reason: e.to_string() })?;
        Ok(Self { font })
    }

    /// Load from the configured font path.
    pub fn from_config() -> Result<Self, StampError> {
        let path = config::stamp_font_path().ok_or_else(|| StampError::FontLoading {
            reason: "no stamp font found; set EDO_STAMP_FONT".to_string(),
        })?;
        Self::from_path(&path)
    }
}

impl TextRasterizer for GlyphRasterizer {
    fn measure(&self, text: &str, font_px: f32) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(font_px));
        text.chars().map(|ch| scaled.h_advance(scaled.glyph_id(ch))).sum()
    }

    fn draw(&self, canvas: &mut RgbaImage, text: &str, font_px: f32, x: f32, y: f32, color: Rgba<u8>) {
        let scale = PxScale::from(font_px);
        let scaled = self.font.as_scaled(scale);
        let baseline = y + scaled.ascent();
        let mut caret = x;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            let glyph = id.with_scale_and_position(scale, point(caret, baseline));
            if let Some(outlined) = self.font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let px = bounds.min.x as i32 + gx as i32;
                    let py = bounds.min.y as i32 + gy as i32;
                    blend_pixel(canvas, px, py, color, coverage);
                });
            }
            caret += scaled.h_advance(id);
        }
    }
}

/// Deterministic rasterizer for tests: every character advances the same
/// fraction of the font size and draws as a solid block.
pub struct FixedAdvanceRasterizer {
    pub advance_em: f32,
}

impl FixedAdvanceRasterizer {
    pub fn new() -> Self {
        Self { advance_em: 0.6 }
    }
}

impl Default for FixedAdvanceRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRasterizer for FixedAdvanceRasterizer {
    fn measure(&self, text: &str, font_px: f32) -> f32 {
        text.chars().count() as f32 * font_px * self.advance_em
    }

    fn draw(&self, canvas: &mut RgbaImage, text: &str, font_px: f32, x: f32, y: f32, color: Rgba<u8>) {
        let width = self.measure(text, font_px).ceil() as i32;
        let height = font_px.ceil() as i32;
        for dy in 0..height {
            for dx in 0..width {
                blend_pixel(canvas, x as i32 + dx, y as i32 + dy, color, 1.0);
            }
        }
    }
}

fn blend_pixel(canvas: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x as u32 >= canvas.width() || y as u32 >= canvas.height() {
        return;
    }
    let alpha = f32::from(color[3]) / 255.0 * coverage.clamp(0.0, 1.0);
    if alpha <= 0.0 {
        return;
    }
    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    for i in 0..3 {
        let src = f32::from(color[i]);
        let old = f32::from(dst[i]);
        dst[i] = (src * alpha + old * (1.0 - alpha)).round() as u8;
    }
    let old_alpha = f32::from(dst[3]) / 255.0;
    dst[3] = ((alpha + old_alpha * (1.0 - alpha)) * 255.0).round() as u8;
}

/// Render every field mapping with a value onto the stamp bitmap. Lines
/// advance by font size plus the fixed leading.
pub fn draw_mappings(
    canvas: &mut RgbaImage,
    mappings: &[FieldMapping],
    values: &HashMap<String, String>,
    rasterizer: &dyn TextRasterizer,
) {
    for mapping in mappings {
        let Some(text) = values.get(&mapping.document_field) else {
            continue;
        };
        let color = parse_hex_color(&mapping.color);
        let font_px = mapping.font_size.max(1.0);
        let measure = |s: &str| rasterizer.measure(s, font_px);
        let lines = wrap_text(text, mapping.max_width, &measure);
        let line_height = font_px + config::TEXT_LINE_LEADING;
        for (i, line) in lines.iter().enumerate() {
            let y = mapping.position_y + i as f32 * line_height;
            rasterizer.draw(canvas, line, font_px, mapping.position_x, y, color);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════
