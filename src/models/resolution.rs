use serde::{Deserialize, Serialize};

/// Reusable resolution template picked by reception when routing a
/// document, as an alternative to free-form resolution text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionTemplate {
    pub name: String,
    pub resolution_name: String,
    pub resolution_text: Option<String>,
    pub is_active: bool,
}

impl ResolutionTemplate {
    /// Text printed on routing artifacts: the template body when present,
    /// otherwise the template's display name.
    pub fn display_text(&self) -> &str {
        match self.resolution_text.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => &self.resolution_name,
        }
    }
}
