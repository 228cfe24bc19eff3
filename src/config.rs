//! Application configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! serialized to a TOML value, the user's file is merged on top, and the result
//! is deserialized with unknown keys rejected.
//!
//! ## Config File Location
//!
//! `config.toml` lives in the working root (the `--root` argument, default `.`),
//! next to the content and state files:
//!
//! ```text
//! ./
//! ├── config.toml              # Optional, overrides stock defaults
//! ├── verified_hadiths.json    # Content store
//! ├── posted_hadiths.json      # Posted state (created on first post)
//! ├── image_usage.json         # Asset usage counter
//! ├── fonts/
//! ├── images/
//! ├── output/                  # Rendered slides
//! └── archive/                 # Posted carousels
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [theme]
//! name = "sage_green"
//!
//! [slides]
//! max_slides = 8
//! ```
//!
//! Run `hadith-carousel gen-config` for the full annotated list. Unknown keys
//! are rejected to catch typos early. The Graph API access token is never read
//! from this file: `instagram.access_token_env` names the environment variable
//! holding it.

use crate::render::layout::SlideGeometry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `config.toml`.
///
/// All fields have defaults matching the production account's look.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub content: ContentConfig,
    pub state: StateConfig,
    pub slides: SlidesConfig,
    pub layout: LayoutConfig,
    pub fonts: FontsConfig,
    pub theme: ThemeConfig,
    pub assets: AssetsConfig,
    pub posting: PostingConfig,
    pub instagram: InstagramConfig,
    pub archive: ArchiveConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=10).contains(&self.slides.max_slides) {
            return Err(ConfigError::Validation(
                "slides.max_slides must be 1-10".into(),
            ));
        }
        if self.slides.min_words_last_slide == 0 {
            return Err(ConfigError::Validation(
                "slides.min_words_last_slide must be at least 1".into(),
            ));
        }
        if self.layout.width == 0 || self.layout.height == 0 {
            return Err(ConfigError::Validation(
                "layout.width and layout.height must be non-zero".into(),
            ));
        }
        for (name, value) in [
            ("layout.image_height_ratio", self.layout.image_height_ratio),
            ("layout.image_opacity", self.layout.image_opacity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Validation(format!("{name} must be 0.0-1.0")));
            }
        }
        if self.layout.line_spacing < 1.0 {
            return Err(ConfigError::Validation(
                "layout.line_spacing must be at least 1.0".into(),
            ));
        }
        let f = &self.fonts;
        if f.heading_size == 0 || f.body_size == 0 || f.source_size == 0 || f.watermark_size == 0
        {
            return Err(ConfigError::Validation(
                "fonts sizes must be non-zero".into(),
            ));
        }
        if self.layout.margin.saturating_mul(2) >= self.layout.width {
            return Err(ConfigError::Validation(
                "layout.margin leaves no room for text".into(),
            ));
        }
        if SlideGeometry::from_config(self).text_budget == 0 {
            return Err(ConfigError::Validation(
                "layout leaves no vertical room for text".into(),
            ));
        }
        if self.posting.caption_limit == 0 {
            return Err(ConfigError::Validation(
                "posting.caption_limit must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// Content file, relative to the root.
    pub file: String,
    /// Only items with exactly this grade are postable.
    pub accepted_grade: String,
    /// Variants with shorter text are not selection candidates.
    pub min_variant_chars: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            file: "verified_hadiths.json".into(),
            accepted_grade: "Sahih".into(),
            min_variant_chars: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StateConfig {
    pub posted_file: String,
    pub usage_file: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            posted_file: crate::posted::STATE_FILENAME.into(),
            usage_file: crate::usage::USAGE_FILENAME.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlidesConfig {
    /// Platform ceiling on carousel length.
    pub max_slides: usize,
    pub min_words_last_slide: usize,
    /// Where rendered slides are written, relative to the root.
    pub output_dir: String,
}

impl Default for SlidesConfig {
    fn default() -> Self {
        Self {
            max_slides: 10,
            min_words_last_slide: crate::paginate::DEFAULT_MIN_WORDS_LAST,
            output_dir: "output".into(),
        }
    }
}

/// Slide canvas and spacing, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub width: u32,
    pub height: u32,
    pub padding_top: u32,
    pub padding_bottom: u32,
    /// Left and right text margin.
    pub margin: u32,
    pub heading_gap: u32,
    pub reference_gap: u32,
    pub line_spacing: f32,
    /// Share of the canvas height taken by the image band.
    pub image_height_ratio: f32,
    pub image_opacity: f32,
    pub heading: String,
    pub continuation_heading: String,
    pub verification_note: String,
    pub watermark: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1350,
            padding_top: 40,
            padding_bottom: 60,
            margin: 80,
            heading_gap: 35,
            reference_gap: 50,
            line_spacing: 1.5,
            image_height_ratio: 0.25,
            image_opacity: 0.95,
            heading: "The Prophet ﷺ said:".into(),
            continuation_heading: "(continued)".into(),
            verification_note: "Verified from 2+ authentic sources".into(),
            watermark: "@NectarFromProphet".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FontsConfig {
    pub regular: String,
    pub bold: String,
    /// Fonts tried in order for glyphs the main fonts lack (the ﷺ ligature).
    /// Missing files are skipped.
    pub fallback: Vec<String>,
    pub heading_size: u32,
    pub body_size: u32,
    pub source_size: u32,
    pub watermark_size: u32,
}

impl Default for FontsConfig {
    fn default() -> Self {
        Self {
            regular: "fonts/ProductSans-Regular.ttf".into(),
            bold: "fonts/ProductSans-Bold.ttf".into(),
            fallback: vec![
                "fonts/NotoNaskhArabic-Regular.ttf".into(),
                "/usr/share/fonts/truetype/noto/NotoSansArabic-Regular.ttf".into(),
                "/usr/share/fonts/truetype/noto/NotoNaskhArabic-Regular.ttf".into(),
            ],
            heading_size: 46,
            body_size: 54,
            source_size: 38,
            watermark_size: 28,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeConfig {
    pub name: ThemeName,
}

/// Built-in color themes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeName {
    #[default]
    WarmBeige,
    SageGreen,
    SoftCream,
    MutedBlue,
    DesertSand,
    OliveTone,
}

/// An sRGB color.
pub type Rgb = [u8; 3];

/// Resolved colors for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background_top: Rgb,
    pub background_bottom: Rgb,
    pub text: Rgb,
    pub heading: Rgb,
    pub source: Rgb,
    pub accent: Rgb,
}

impl ThemeName {
    pub const ALL: [ThemeName; 6] = [
        ThemeName::WarmBeige,
        ThemeName::SageGreen,
        ThemeName::SoftCream,
        ThemeName::MutedBlue,
        ThemeName::DesertSand,
        ThemeName::OliveTone,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThemeName::WarmBeige => "warm_beige",
            ThemeName::SageGreen => "sage_green",
            ThemeName::SoftCream => "soft_cream",
            ThemeName::MutedBlue => "muted_blue",
            ThemeName::DesertSand => "desert_sand",
            ThemeName::OliveTone => "olive_tone",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            ThemeName::WarmBeige => Palette {
                background_top: [0xF5, 0xE6, 0xD3],
                background_bottom: [0xE8, 0xD4, 0xB8],
                text: [0x2C, 0x24, 0x16],
                heading: [0xC1, 0x78, 0x17],
                source: [0x8B, 0x45, 0x13],
                accent: [0xC1, 0x78, 0x17],
            },
            ThemeName::SageGreen => Palette {
                background_top: [0xE8, 0xF3, 0xE8],
                background_bottom: [0xD4, 0xE7, 0xD4],
                text: [0x1B, 0x3A, 0x1B],
                heading: [0x2E, 0x7D, 0x32],
                source: [0xD8, 0x43, 0x15],
                accent: [0xC1, 0x78, 0x17],
            },
            ThemeName::SoftCream => Palette {
                background_top: [0xFF, 0xF8, 0xE7],
                background_bottom: [0xF5, 0xE9, 0xD3],
                text: [0x1A, 0x1A, 0x1A],
                heading: [0x8B, 0x45, 0x13],
                source: [0xC1, 0x78, 0x17],
                accent: [0xC0, 0x39, 0x2B],
            },
            ThemeName::MutedBlue => Palette {
                background_top: [0xE3, 0xF2, 0xFD],
                background_bottom: [0xBB, 0xDE, 0xFB],
                text: [0x0D, 0x47, 0xA1],
                heading: [0x19, 0x76, 0xD2],
                source: [0xE6, 0x51, 0x00],
                accent: [0xD8, 0x43, 0x15],
            },
            ThemeName::DesertSand => Palette {
                background_top: [0xFA, 0xF3, 0xE0],
                background_bottom: [0xE8, 0xD7, 0xC3],
                text: [0x3E, 0x27, 0x23],
                heading: [0xBF, 0x36, 0x0C],
                source: [0x6D, 0x4C, 0x41],
                accent: [0xC0, 0x39, 0x2B],
            },
            ThemeName::OliveTone => Palette {
                background_top: [0xF1, 0xF3, 0xE8],
                background_bottom: [0xE0, 0xE5, 0xD3],
                text: [0x1B, 0x5E, 0x20],
                heading: [0x82, 0x77, 0x17],
                source: [0xD8, 0x43, 0x15],
                accent: [0xE7, 0x4C, 0x3C],
            },
        }
    }
}

impl std::fmt::Display for ThemeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    /// Draw a background image band on each slide.
    pub enabled: bool,
    /// Directory searched for images when a category has none of its own.
    pub dir: String,
    /// Category name → image path, relative to the root.
    pub categories: BTreeMap<String, String>,
}

impl AssetsConfig {
    pub fn image_for(&self, category: &str) -> Option<&str> {
        self.categories.get(category).map(String::as_str)
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        let categories = [
            ("Intention", "images/nature/mountains_sunrise.jpg"),
            ("Character", "images/nature/mountain_lake.jpg"),
            ("Brotherhood", "images/nature/forest_path.jpg"),
            ("Speech", "images/nature/sunset_sky.jpg"),
            ("Worship", "images/nature/night_stars.jpg"),
            ("Teaching", "images/patterns/geometric_gold.jpg"),
            ("Charity", "images/nature/light_rays.jpg"),
            ("Kindness", "images/nature/flowers_field.jpg"),
            ("Patience", "images/nature/calm_water.jpg"),
            ("Helping Others", "images/nature/clouds_sunset.jpg"),
            ("Knowledge", "images/patterns/islamic_pattern.jpg"),
            ("Legacy", "images/nature/ancient_tree.jpg"),
            ("Golden Rule", "images/patterns/geometric_gold.jpg"),
            ("Service", "images/nature/mountain_peak.jpg"),
            ("Mercy", "images/nature/peaceful_sky.jpg"),
            ("Parents", "images/nature/green_hills.jpg"),
            ("Quran", "images/patterns/geometric_gold.jpg"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self {
            enabled: true,
            dir: "images".into(),
            categories,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PostingConfig {
    /// Platform caption limit in characters.
    pub caption_limit: usize,
    pub attribution: String,
    pub hashtags: Vec<String>,
}

impl Default for PostingConfig {
    fn default() -> Self {
        Self {
            caption_limit: 2200,
            attribution: "Prophet Muhammad ﷺ".into(),
            hashtags: [
                "#Hadith",
                "#Islam",
                "#IslamicQuotes",
                "#Muslim",
                "#ProphetMuhammad",
                "#IslamicReminders",
                "#SahihBukhari",
                "#Quran",
                "#Allah",
                "#Deen",
                "#IslamicPost",
                "#MuslimCommunity",
                "#IslamicKnowledge",
                "#Sunnah",
                "#Dawah",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstagramConfig {
    pub graph_api_base: String,
    /// Instagram business account id. Empty disables publishing.
    pub user_id: String,
    /// Public URL prefix where the output directory is served.
    pub media_base_url: String,
    /// Environment variable holding the access token.
    pub access_token_env: String,
    pub timeout_secs: u64,
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            graph_api_base: "https://graph.facebook.com/v21.0".into(),
            user_id: String::new(),
            media_base_url: String::new(),
            access_token_env: "INSTAGRAM_ACCESS_TOKEN".into(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchiveConfig {
    pub enabled: bool,
    pub dir: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: "archive".into(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
pub fn load_config(root: &Path) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# hadith-carousel configuration
# =============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Paths are relative to the root
# directory (--root). Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Content
# ---------------------------------------------------------------------------
[content]
# JSON file with the postable items, in stable order.
file = "verified_hadiths.json"

# Items with any other grade are quarantined when selected.
accepted_grade = "Sahih"

# Lettered variants ("251a") shorter than this are never selected.
min_variant_chars = 100

# ---------------------------------------------------------------------------
# State files
# ---------------------------------------------------------------------------
[state]
posted_file = "posted_hadiths.json"
usage_file = "image_usage.json"

# ---------------------------------------------------------------------------
# Slides
# ---------------------------------------------------------------------------
[slides]
# Carousel ceiling. Items needing more slides are skipped for the run.
max_slides = 10

# Minimum words on the last slide before rebalancing kicks in.
min_words_last_slide = 5

output_dir = "output"

# ---------------------------------------------------------------------------
# Layout (pixels)
# ---------------------------------------------------------------------------
[layout]
width = 1080
height = 1350
padding_top = 40
padding_bottom = 60
margin = 80
heading_gap = 35
reference_gap = 50
line_spacing = 1.5

# Share of the canvas height used by the image band (0.0-1.0).
image_height_ratio = 0.25
image_opacity = 0.95

heading = "The Prophet ﷺ said:"
continuation_heading = "(continued)"
verification_note = "Verified from 2+ authentic sources"
watermark = "@NectarFromProphet"

# ---------------------------------------------------------------------------
# Fonts
# ---------------------------------------------------------------------------
[fonts]
regular = "fonts/ProductSans-Regular.ttf"
bold = "fonts/ProductSans-Bold.ttf"

# Tried in order for glyphs the fonts above lack (the ﷺ ligature).
# Missing files are skipped.
fallback = [
    "fonts/NotoNaskhArabic-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSansArabic-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoNaskhArabic-Regular.ttf",
]

heading_size = 46
body_size = 54
source_size = 38
watermark_size = 28

# ---------------------------------------------------------------------------
# Theme
# ---------------------------------------------------------------------------
[theme]
# One of: warm_beige, sage_green, soft_cream, muted_blue, desert_sand, olive_tone
name = "warm_beige"

# ---------------------------------------------------------------------------
# Background images
# ---------------------------------------------------------------------------
[assets]
enabled = true

# Searched recursively (jpg/jpeg/png) when a category has no image on disk.
# The least-used image wins.
dir = "images"

# Category → image path.
[assets.categories]
Brotherhood = "images/nature/forest_path.jpg"
Character = "images/nature/mountain_lake.jpg"
Charity = "images/nature/light_rays.jpg"
"Golden Rule" = "images/patterns/geometric_gold.jpg"
"Helping Others" = "images/nature/clouds_sunset.jpg"
Intention = "images/nature/mountains_sunrise.jpg"
Kindness = "images/nature/flowers_field.jpg"
Knowledge = "images/patterns/islamic_pattern.jpg"
Legacy = "images/nature/ancient_tree.jpg"
Mercy = "images/nature/peaceful_sky.jpg"
Parents = "images/nature/green_hills.jpg"
Patience = "images/nature/calm_water.jpg"
Quran = "images/patterns/geometric_gold.jpg"
Service = "images/nature/mountain_peak.jpg"
Speech = "images/nature/sunset_sky.jpg"
Teaching = "images/patterns/geometric_gold.jpg"
Worship = "images/nature/night_stars.jpg"

# ---------------------------------------------------------------------------
# Caption
# ---------------------------------------------------------------------------
[posting]
# Captions longer than this are shortened by trimming the quoted text.
caption_limit = 2200
attribution = "Prophet Muhammad ﷺ"
hashtags = [
    "#Hadith", "#Islam", "#IslamicQuotes", "#Muslim", "#ProphetMuhammad",
    "#IslamicReminders", "#SahihBukhari", "#Quran", "#Allah", "#Deen",
    "#IslamicPost", "#MuslimCommunity", "#IslamicKnowledge", "#Sunnah", "#Dawah",
]

# ---------------------------------------------------------------------------
# Instagram Graph API
# ---------------------------------------------------------------------------
[instagram]
graph_api_base = "https://graph.facebook.com/v21.0"

# Business account id. Publishing is refused while empty.
user_id = ""

# Public URL where the output directory is served; slide file names are
# appended to it.
media_base_url = ""

# Environment variable holding the access token.
access_token_env = "INSTAGRAM_ACCESS_TOKEN"
timeout_secs = 60

# ---------------------------------------------------------------------------
# Archive
# ---------------------------------------------------------------------------
[archive]
# Copy posted slides to <dir>/<collection>/<number>/.
enabled = true
dir = "archive"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn default_config_matches_production_look() {
        let config = AppConfig::default();
        assert_eq!(config.layout.width, 1080);
        assert_eq!(config.layout.height, 1350);
        assert_eq!(config.fonts.body_size, 54);
        assert_eq!(config.theme.name, ThemeName::WarmBeige);
        assert_eq!(config.posting.hashtags.len(), 15);
        assert_eq!(
            config.assets.image_for("Patience"),
            Some("images/nature/calm_water.jpg")
        );
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[theme]
name = "muted_blue"
"##;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.theme.name, ThemeName::MutedBlue);
        assert_eq!(config.slides.max_slides, 10);
    }

    #[test]
    fn unknown_theme_is_rejected() {
        let toml = r##"
[theme]
name = "neon_pink"
"##;
        assert!(toml::from_str::<AppConfig>(toml).is_err());
    }

    #[test]
    fn theme_names_round_trip() {
        for theme in ThemeName::ALL {
            let config: AppConfig =
                toml::from_str(&format!("[theme]\nname = \"{theme}\"\n")).unwrap();
            assert_eq!(config.theme.name, theme);
        }
    }

    #[test]
    fn palettes_are_distinct() {
        for (i, a) in ThemeName::ALL.iter().enumerate() {
            for b in &ThemeName::ALL[i + 1..] {
                assert_ne!(a.palette(), b.palette());
            }
        }
        assert_eq!(ThemeName::WarmBeige.palette().text, [0x2C, 0x24, 0x16]);
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r##"
[slides]
max_slides = 6

[posting]
hashtags = ["#One"]
"##,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.slides.max_slides, 6);
        assert_eq!(config.slides.min_words_last_slide, 5);
        assert_eq!(config.posting.hashtags, vec!["#One"]);
        assert_eq!(config.posting.caption_limit, 2200);
    }

    #[test]
    fn merge_keeps_sibling_map_entries() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r##"
[assets.categories]
Patience = "images/mine.jpg"
"##,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.assets.image_for("Patience"), Some("images/mine.jpg"));
        assert_eq!(
            config.assets.image_for("Mercy"),
            Some("images/nature/peaceful_sky.jpg")
        );
    }

    #[test]
    fn load_config_rejects_unknown_keys() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "[slides]\nmax_slide = 3\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_config_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "[slides\n").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    // =========================================================================
    // Validation
    // =========================================================================

    fn validation_message(config: &AppConfig) -> String {
        match config.validate() {
            Err(ConfigError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn max_slides_bounds() {
        let mut config = AppConfig::default();
        config.slides.max_slides = 11;
        assert!(validation_message(&config).contains("max_slides"));
        config.slides.max_slides = 0;
        assert!(validation_message(&config).contains("max_slides"));
        config.slides.max_slides = 1;
        config.validate().unwrap();
    }

    #[test]
    fn min_words_must_be_positive() {
        let mut config = AppConfig::default();
        config.slides.min_words_last_slide = 0;
        assert!(validation_message(&config).contains("min_words_last_slide"));
    }

    #[test]
    fn ratios_must_be_fractions() {
        let mut config = AppConfig::default();
        config.layout.image_opacity = 1.5;
        assert!(validation_message(&config).contains("image_opacity"));
    }

    #[test]
    fn line_spacing_at_least_one() {
        let mut config = AppConfig::default();
        config.layout.line_spacing = 0.8;
        assert!(validation_message(&config).contains("line_spacing"));
    }

    #[test]
    fn zero_font_size_rejected() {
        let mut config = AppConfig::default();
        config.fonts.watermark_size = 0;
        assert!(validation_message(&config).contains("fonts"));
    }

    #[test]
    fn layout_without_text_room_rejected() {
        let mut config = AppConfig::default();
        config.layout.height = 300;
        assert!(validation_message(&config).contains("vertical room"));
    }

    #[test]
    fn huge_margin_rejected_without_overflow() {
        let mut config = AppConfig::default();
        config.layout.margin = u32::MAX;
        assert!(validation_message(&config).contains("layout.margin"));
    }

    #[test]
    fn zero_caption_limit_rejected() {
        let mut config = AppConfig::default();
        config.posting.caption_limit = 0;
        assert!(validation_message(&config).contains("caption_limit"));
    }

    // =========================================================================
    // stock_config_toml
    // =========================================================================

    #[test]
    fn stock_config_toml_is_valid_toml() {
        let _: toml::Value =
            toml::from_str(stock_config_toml()).expect("stock config must be valid TOML");
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: AppConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn stock_defaults_value_is_table() {
        let value = stock_defaults_value();
        assert!(value.get("slides").is_some());
        assert!(value.get("instagram").is_some());
    }
}
