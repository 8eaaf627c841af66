use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "EDO Core";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default `RUST_LOG`-style filter when none is set in the environment.
pub fn default_log_filter() -> &'static str {
    "info,edo_core=debug"
}

/// Get the application data directory
/// ~/EdoCore/ on all platforms (user-visible)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("EdoCore")
}

/// SQLite database location.
pub fn database_path() -> PathBuf {
    app_data_dir().join("edo.db")
}

/// Root for publicly served files (stamp images).
pub fn public_files_dir() -> PathBuf {
    app_data_dir().join("files")
}

/// Root for access-controlled document files.
pub fn private_files_dir() -> PathBuf {
    app_data_dir().join("private").join("files")
}

// ── Stamp engine tuning ─────────────────────────────────────

/// Fraction of a stamp's native pixel size used when the placement
/// carries no scale of its own.
pub const DEFAULT_STAMP_SCALE: f32 = 0.15;

/// Distance in PDF points between an anchored stamp and the page edge.
pub const STAMP_ANCHOR_MARGIN: f32 = 20.0;

/// Extra pixels between wrapped lines of field-mapping text.
pub const TEXT_LINE_LEADING: f32 = 4.0;

/// Locate a TTF with Cyrillic coverage for rendering field-mapping text.
/// `EDO_STAMP_FONT` overrides; otherwise the first bundled candidate wins.
pub fn stamp_font_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("EDO_STAMP_FONT") {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Some(path);
        }
    }
    first_existing(&[
        app_data_dir().join("fonts").join("DejaVuSans.ttf"),
        PathBuf::from("/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"),
        PathBuf::from("/usr/share/fonts/TTF/DejaVuSans.ttf"),
        PathBuf::from("/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf"),
    ])
}

fn first_existing(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find(|p| p.is_file()).cloned()
}

// ── Gateway ─────────────────────────────────────────────────

/// LexDoc calls must not hang the portal request longer than this.
pub const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 60;

/// Connection settings for the LexDoc signature service.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl GatewayConfig {
    /// Read `EDO_LEXDOC_URL` / `EDO_LEXDOC_API_KEY` from the environment.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("EDO_LEXDOC_URL").ok()?;
        let api_key = std::env::var("EDO_LEXDOC_API_KEY").ok()?;
        Some(Self {
            base_url,
            api_key,
            timeout_secs: DEFAULT_GATEWAY_TIMEOUT_SECS,
        })
    }
}
