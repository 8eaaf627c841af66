use serde::{Deserialize, Serialize};

/// A reusable stamp asset: an image plus the field mappings describing
/// which document attributes get rendered onto it before compositing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stamp {
    pub name: String,
    pub stamp_name: String,
    /// File store reference to the stamp image (PNG/JPEG).
    pub stamp_image: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub field_mappings: Vec<FieldMapping>,
}

/// One text overlay rule on a stamp image. Positions and widths are in
/// pixels of the stamp's native bitmap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Document attribute to render, e.g. `incoming_number` or `name`.
    pub document_field: String,
    pub position_x: f32,
    pub position_y: f32,
    pub font_size: f32,
    /// Hex color, `#RRGGBB`.
    pub color: String,
    /// Wrap width in pixels; 0 disables wrapping.
    pub max_width: f32,
}
