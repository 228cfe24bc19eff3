//! Slide renderer trait and shared types.
//!
//! The [`SlideRenderer`] trait is the seam between orchestration and pixels:
//! the assembler measures text through it to paginate, then asks it to draw
//! each slide. The production implementation is
//! [`GlyphRenderer`](super::glyph_renderer::GlyphRenderer).

use super::params::SlideParams;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot load font {path}: {reason}")]
    Font { path: PathBuf, reason: String },
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Rendering failed: {0}")]
    Failed(String),
}

pub trait SlideRenderer {
    /// Height in pixels of `text` wrapped at the slide's body width.
    fn measure(&self, text: &str) -> u32;

    /// Vertical space available for body text on one slide.
    fn text_budget(&self) -> u32;

    /// Draw one slide and return the written file.
    fn render_slide(&self, params: &SlideParams) -> Result<PathBuf, RenderError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock renderer with word-count metrics that records slides instead of
    /// drawing them.
    ///
    /// Every word costs `px_per_word` pixels of height. Rendering writes an
    /// empty file at the requested output so later stages can copy it.
    pub struct MockRenderer {
        pub px_per_word: u32,
        pub budget: u32,
        /// Fail when asked to render this ordinal.
        pub fail_on: Option<usize>,
        pub rendered: Mutex<Vec<SlideParams>>,
    }

    impl MockRenderer {
        pub fn new(px_per_word: u32, budget: u32) -> Self {
            Self {
                px_per_word,
                budget,
                fail_on: None,
                rendered: Mutex::new(Vec::new()),
            }
        }

        pub fn failing_on(mut self, ordinal: usize) -> Self {
            self.fail_on = Some(ordinal);
            self
        }

        pub fn get_rendered(&self) -> Vec<SlideParams> {
            self.rendered.lock().unwrap().clone()
        }
    }

    impl SlideRenderer for MockRenderer {
        fn measure(&self, text: &str) -> u32 {
            text.split_whitespace().count() as u32 * self.px_per_word
        }

        fn text_budget(&self) -> u32 {
            self.budget
        }

        fn render_slide(&self, params: &SlideParams) -> Result<PathBuf, RenderError> {
            if self.fail_on == Some(params.ordinal) {
                return Err(RenderError::Failed(format!(
                    "mock failure on slide {}",
                    params.ordinal
                )));
            }
            if let Some(parent) = params.output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&params.output, b"")?;
            self.rendered.lock().unwrap().push(params.clone());
            Ok(params.output.clone())
        }
    }

    #[test]
    fn mock_records_and_writes() {
        let tmp = tempfile::TempDir::new().unwrap();
        let renderer = MockRenderer::new(10, 100);
        let params = SlideParams {
            text: "a b c".into(),
            theme: crate::config::ThemeName::SoftCream,
            asset: None,
            ordinal: 1,
            total: 1,
            reference: "ref".into(),
            output: tmp.path().join("out/slide.png"),
        };

        assert_eq!(renderer.measure(&params.text), 30);
        let path = renderer.render_slide(&params).unwrap();

        assert!(path.exists());
        assert_eq!(renderer.get_rendered(), vec![params]);
    }

    #[test]
    fn mock_fails_on_requested_ordinal() {
        let tmp = tempfile::TempDir::new().unwrap();
        let renderer = MockRenderer::new(10, 100).failing_on(2);
        let mut params = SlideParams {
            text: "a".into(),
            theme: crate::config::ThemeName::SoftCream,
            asset: None,
            ordinal: 1,
            total: 2,
            reference: "ref".into(),
            output: tmp.path().join("1.png"),
        };
        assert!(renderer.render_slide(&params).is_ok());
        params.ordinal = 2;
        params.output = tmp.path().join("2.png");
        assert!(matches!(
            renderer.render_slide(&params),
            Err(RenderError::Failed(_))
        ));
    }
}
