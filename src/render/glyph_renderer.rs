//! Production renderer: draws slides into `image` buffers with `ab_glyph`.
//!
//! ## Crate mapping
//!
//! | Step | Crate / function |
//! |---|---|
//! | Font parsing, glyph outlines, advances, kerning | `ab_glyph::FontVec` |
//! | Canvas | `image::RgbaImage` |
//! | Background image band | `image::open` + `resize_to_fill` (Lanczos3) |
//! | Output | `image::DynamicImage::save` (PNG) |
//!
//! Glyphs missing from the main fonts (the ﷺ ligature in most Latin faces) are
//! taken from the first loadable fallback font.

use super::backend::{RenderError, SlideRenderer};
use super::layout::{SlideGeometry, wrap_lines};
use super::params::SlideParams;
use crate::config::{AppConfig, LayoutConfig, Rgb};
use ab_glyph::{Font, FontVec, GlyphId, PxScale, ScaleFont, point};
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Height of the fade at the bottom of the image band.
const BAND_FADE: u32 = 60;
const WATERMARK_ALPHA: f32 = 100.0 / 255.0;

#[derive(Debug, Clone, Copy)]
struct Sizes {
    heading: f32,
    body: f32,
    source: f32,
    note: f32,
    watermark: f32,
}

pub struct GlyphRenderer {
    layout: LayoutConfig,
    geometry: SlideGeometry,
    sizes: Sizes,
    regular: FontVec,
    bold: FontVec,
    fallback: Option<FontVec>,
}

impl GlyphRenderer {
    /// Load fonts named in `config`, resolving relative paths against `root`.
    pub fn new(config: &AppConfig, root: &Path) -> Result<Self, RenderError> {
        let regular = load_font(&root.join(&config.fonts.regular))?;
        let bold = load_font(&root.join(&config.fonts.bold))?;
        let fallback = config
            .fonts
            .fallback
            .iter()
            .map(|p| root.join(p))
            .filter(|p| p.is_file())
            .find_map(|p| match load_font(&p) {
                Ok(font) => {
                    debug!(path = %p.display(), "loaded fallback font");
                    Some(font)
                }
                Err(e) => {
                    debug!("skipping fallback font: {e}");
                    None
                }
            });
        Ok(Self::from_fonts(config, regular, bold, fallback))
    }

    pub fn from_fonts(
        config: &AppConfig,
        regular: FontVec,
        bold: FontVec,
        fallback: Option<FontVec>,
    ) -> Self {
        let geometry = SlideGeometry::from_config(config);
        let fonts = &config.fonts;
        Self {
            layout: config.layout.clone(),
            geometry,
            sizes: Sizes {
                heading: fonts.heading_size as f32,
                body: fonts.body_size as f32,
                source: fonts.source_size as f32,
                note: geometry.note_size as f32,
                watermark: fonts.watermark_size as f32,
            },
            regular,
            bold,
            fallback,
        }
    }

    fn font_for<'a>(&'a self, primary: &'a FontVec, c: char) -> &'a FontVec {
        if primary.glyph_id(c) != GlyphId(0) {
            return primary;
        }
        match &self.fallback {
            Some(fallback) if fallback.glyph_id(c) != GlyphId(0) => fallback,
            _ => primary,
        }
    }

    fn text_width(&self, primary: &FontVec, size: f32, text: &str) -> f32 {
        let scale = PxScale::from(size);
        let mut width = 0.0;
        let mut prev: Option<(&FontVec, GlyphId)> = None;
        for c in text.chars() {
            let font = self.font_for(primary, c);
            let scaled = font.as_scaled(scale);
            let id = font.glyph_id(c);
            if let Some((prev_font, prev_id)) = prev
                && std::ptr::eq(prev_font, font)
            {
                width += scaled.kern(prev_id, id);
            }
            width += scaled.h_advance(id);
            prev = Some((font, id));
        }
        width
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &self,
        canvas: &mut RgbaImage,
        primary: &FontVec,
        size: f32,
        text: &str,
        x: f32,
        top: f32,
        color: Rgb,
        alpha: f32,
    ) {
        let scale = PxScale::from(size);
        let baseline = top + primary.as_scaled(scale).ascent();
        let mut caret = x;
        let mut prev: Option<(&FontVec, GlyphId)> = None;
        for c in text.chars() {
            let font = self.font_for(primary, c);
            let scaled = font.as_scaled(scale);
            let id = font.glyph_id(c);
            if let Some((prev_font, prev_id)) = prev
                && std::ptr::eq(prev_font, font)
            {
                caret += scaled.kern(prev_id, id);
            }
            let glyph = id.with_scale_and_position(scale, point(caret, baseline));
            caret += scaled.h_advance(id);
            prev = Some((font, id));

            if let Some(outlined) = font.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let px = bounds.min.x as i64 + i64::from(gx);
                    let py = bounds.min.y as i64 + i64::from(gy);
                    blend(canvas, px, py, color, coverage * alpha);
                });
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_centered(
        &self,
        canvas: &mut RgbaImage,
        primary: &FontVec,
        size: f32,
        text: &str,
        top: u32,
        color: Rgb,
        alpha: f32,
    ) {
        let width = self.text_width(primary, size, text);
        let x = ((self.geometry.width as f32 - width) / 2.0).max(0.0);
        self.draw_text(canvas, primary, size, text, x, top as f32, color, alpha);
    }

    fn wrap_body(&self, text: &str) -> Vec<String> {
        wrap_lines(
            text,
            |s| self.text_width(&self.regular, self.sizes.body, s),
            self.geometry.text_width as f32,
        )
    }

    fn draw_asset_band(&self, canvas: &mut RgbaImage, asset: &Path) -> Result<(), RenderError> {
        let band = self.geometry.image_band;
        if band == 0 {
            return Ok(());
        }
        let photo = image::open(asset)?
            .resize_to_fill(self.geometry.width, band, FilterType::Lanczos3)
            .to_rgba8();
        let fade_start = band.saturating_sub(BAND_FADE);
        for (x, y, pixel) in photo.enumerate_pixels() {
            let fade = if y >= fade_start {
                1.0 - (y - fade_start) as f32 / BAND_FADE as f32
            } else {
                1.0
            };
            let alpha = self.layout.image_opacity * fade * (f32::from(pixel[3]) / 255.0);
            blend(
                canvas,
                i64::from(x),
                i64::from(y),
                [pixel[0], pixel[1], pixel[2]],
                alpha,
            );
        }
        Ok(())
    }
}

impl SlideRenderer for GlyphRenderer {
    fn measure(&self, text: &str) -> u32 {
        self.geometry.block_height(self.wrap_body(text).len())
    }

    fn text_budget(&self) -> u32 {
        self.geometry.text_budget
    }

    fn render_slide(&self, params: &SlideParams) -> Result<PathBuf, RenderError> {
        let g = self.geometry;
        let palette = params.theme.palette();
        let mut canvas = gradient(
            g.width,
            g.height,
            palette.background_top,
            palette.background_bottom,
        );

        if let Some(asset) = &params.asset {
            self.draw_asset_band(&mut canvas, asset)?;
        }

        let heading = if params.is_continuation() {
            &self.layout.continuation_heading
        } else {
            &self.layout.heading
        };
        self.draw_centered(
            &mut canvas,
            &self.bold,
            self.sizes.heading,
            heading,
            g.heading_top,
            palette.heading,
            1.0,
        );

        let indicator = params.page_indicator();
        if !indicator.is_empty() {
            let width = self.text_width(&self.regular, self.sizes.source, &indicator);
            let x = (g.width - g.text_left) as f32 - width;
            self.draw_text(
                &mut canvas,
                &self.regular,
                self.sizes.source,
                &indicator,
                x,
                g.heading_top as f32,
                palette.accent,
                1.0,
            );
        }

        let lines = self.wrap_body(&params.text);
        let mut top = g.centered_text_top(g.block_height(lines.len()));
        let inset = g.body_line_height.saturating_sub(self.sizes.body as u32) / 2;
        for line in &lines {
            self.draw_centered(
                &mut canvas,
                &self.regular,
                self.sizes.body,
                line,
                top + inset,
                palette.text,
                1.0,
            );
            top += g.body_line_height;
        }

        self.draw_centered(
            &mut canvas,
            &self.bold,
            self.sizes.source,
            &params.reference,
            g.reference_top,
            palette.source,
            1.0,
        );
        self.draw_centered(
            &mut canvas,
            &self.regular,
            self.sizes.note,
            &self.layout.verification_note,
            g.note_top,
            palette.source,
            1.0,
        );
        if !self.layout.watermark.is_empty() {
            self.draw_centered(
                &mut canvas,
                &self.regular,
                self.sizes.watermark,
                &self.layout.watermark,
                g.watermark_top,
                palette.source,
                WATERMARK_ALPHA,
            );
        }

        if let Some(parent) = params.output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        DynamicImage::ImageRgba8(canvas)
            .to_rgb8()
            .save(&params.output)?;
        Ok(params.output.clone())
    }
}

fn load_font(path: &Path) -> Result<FontVec, RenderError> {
    let data = std::fs::read(path).map_err(|e| RenderError::Font {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    FontVec::try_from_vec(data).map_err(|e| RenderError::Font {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Vertical linear gradient from `top` to `bottom`.
fn gradient(width: u32, height: u32, top: Rgb, bottom: Rgb) -> RgbaImage {
    let span = height.saturating_sub(1).max(1) as f32;
    RgbaImage::from_fn(width, height, |_, y| {
        let t = y as f32 / span;
        let [r, g, b] = lerp(top, bottom, t);
        Rgba([r, g, b, 255])
    })
}

fn lerp(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let mix = |x: u8, y: u8| (f32::from(x) + (f32::from(y) - f32::from(x)) * t).round() as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2])]
}

/// Alpha-blend `color` over the pixel at (`x`, `y`); out-of-bounds is a no-op.
fn blend(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgb, alpha: f32) {
    if x < 0 || y < 0 || x >= i64::from(canvas.width()) || y >= i64::from(canvas.height()) {
        return;
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    let [r, g, b] = lerp([pixel[0], pixel[1], pixel[2]], color, alpha);
    *pixel = Rgba([r, g, b, 255]);
}
