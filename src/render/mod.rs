//! Slide rendering.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Measure** | greedy wrap over `ab_glyph` advances |
//! | **Background** | vertical gradient from the theme palette |
//! | **Image band** | `resize_to_fill` + opacity blend with a bottom fade |
//! | **Text** | `ab_glyph` outlines blended onto an `RgbaImage` |
//!
//! The module is split into:
//! - **Layout**: pure geometry and wrapping (unit testable)
//! - **Parameters**: what goes on one slide
//! - **Backend**: [`SlideRenderer`] trait + [`GlyphRenderer`]

pub mod backend;
pub mod glyph_renderer;
pub mod layout;
mod params;

pub use backend::{RenderError, SlideRenderer};
pub use glyph_renderer::GlyphRenderer;
pub use layout::SlideGeometry;
pub use params::{SlideParams, slide_file_name};
