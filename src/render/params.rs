//! Parameter type for one slide render.
//!
//! Describes *what* goes on a slide; the [`SlideRenderer`](super::SlideRenderer)
//! decides how it looks. The assembler builds these, so swapping in a mock
//! renderer for tests needs no change to orchestration.

use crate::config::ThemeName;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct SlideParams {
    /// Body text as drawn, continuation markers included.
    pub text: String,
    pub theme: ThemeName,
    /// Background image for the top band.
    pub asset: Option<PathBuf>,
    /// 1-based.
    pub ordinal: usize,
    pub total: usize,
    /// Source line, e.g. `Sahih al-Bukhari 1`.
    pub reference: String,
    pub output: PathBuf,
}

impl SlideParams {
    pub fn is_continuation(&self) -> bool {
        self.ordinal > 1
    }

    /// `2/5` style indicator; empty for a single slide.
    pub fn page_indicator(&self) -> String {
        if self.total > 1 {
            format!("{}/{}", self.ordinal, self.total)
        } else {
            String::new()
        }
    }
}

/// File name for slide `ordinal` of item `collection:number`.
pub fn slide_file_name(collection: &str, number: &str, ordinal: usize) -> String {
    let safe: String = number
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{collection}_{safe}_slide_{ordinal:02}.png")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(ordinal: usize, total: usize) -> SlideParams {
        SlideParams {
            text: "text".into(),
            theme: ThemeName::WarmBeige,
            asset: None,
            ordinal,
            total,
            reference: "Sahih Muslim 1".into(),
            output: PathBuf::from("out.png"),
        }
    }

    #[test]
    fn page_indicator() {
        assert_eq!(params(1, 1).page_indicator(), "");
        assert_eq!(params(2, 5).page_indicator(), "2/5");
    }

    #[test]
    fn continuation() {
        assert!(!params(1, 3).is_continuation());
        assert!(params(3, 3).is_continuation());
    }

    #[test]
    fn file_names_sort_by_ordinal() {
        assert_eq!(slide_file_name("muslim", "251b", 3), "muslim_251b_slide_03.png");
        assert_eq!(slide_file_name("x", "1/2", 10), "x_1_2_slide_10.png");
        assert!(slide_file_name("a", "1", 2) < slide_file_name("a", "1", 10));
    }
}
