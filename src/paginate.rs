//! Balanced text pagination.
//!
//! Splits a text body into slides that each fit a pixel-height budget. The
//! paginator knows nothing about fonts: the caller passes a `measure` function
//! returning the wrapped height of a string at the slide's text width.
//!
//! ```text
//! words < 8            → one chunk, no measuring
//! otherwise            → greedy fill against max_height × 0.85
//! last chunk < min     → pull words from the end of the previous chunk,
//!                        as many as still fit the limit
//! ```
//!
//! A word always enters an empty chunk, so a single word taller than the budget
//! becomes its own chunk instead of looping forever. Such chunks are listed in
//! [`Pagination::overflowing`].
//!
//! Chunk texts are exact slices of the word sequence joined by single spaces;
//! continuation markers live only in [`SlideChunk::display_text`].

/// Texts with fewer words than this are never split.
pub const SHORT_TEXT_WORDS: usize = 8;

/// Fraction of the height budget the greedy pass may fill.
pub const SAFETY_FACTOR: f64 = 0.85;

/// A chunk must have at least this many words to donate to a short last chunk.
pub const DONOR_MIN_WORDS: usize = 8;

pub const DEFAULT_MIN_WORDS_LAST: usize = 5;

const CONTINUED_PREFIX: &str = "… ";
const CONTINUES_SUFFIX: &str = " …";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideChunk {
    /// 1-based position.
    pub ordinal: usize,
    pub total: usize,
    pub text: String,
}

impl SlideChunk {
    pub fn is_first(&self) -> bool {
        self.ordinal == 1
    }

    pub fn is_last(&self) -> bool {
        self.ordinal == self.total
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Text as drawn on the slide, with ellipses marking a continuation.
    pub fn display_text(&self) -> String {
        let mut out = String::new();
        if !self.is_first() {
            out.push_str(CONTINUED_PREFIX);
        }
        out.push_str(&self.text);
        if !self.is_last() {
            out.push_str(CONTINUES_SUFFIX);
        }
        out
    }
}

/// `text` framed by both continuation markers, as on a middle slide.
pub fn with_markers(text: &str) -> String {
    format!("{CONTINUED_PREFIX}{text}{CONTINUES_SUFFIX}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub chunks: Vec<SlideChunk>,
    /// Ordinals of single-word chunks taller than `max_height`.
    pub overflowing: Vec<usize>,
}

impl Pagination {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn exceeds(&self, max_slides: usize) -> bool {
        self.chunks.len() > max_slides
    }
}

/// Split `text` into balanced chunks that fit `max_height`.
///
/// Deterministic for a given `text`, `measure` and `max_height`.
pub fn paginate<F>(text: &str, measure: F, max_height: u32, min_words_last: usize) -> Pagination
where
    F: Fn(&str) -> u32,
{
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() < SHORT_TEXT_WORDS {
        return finish(vec![words], &measure, max_height);
    }

    let limit = (f64::from(max_height) * SAFETY_FACTOR).floor() as u32;
    let mut chunks: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for word in words {
        if current.is_empty() {
            current.push(word);
            continue;
        }
        current.push(word);
        if measure(&current.join(" ")) > limit {
            current.pop();
            chunks.push(std::mem::take(&mut current));
            current.push(word);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    rebalance_tail(&mut chunks, min_words_last, &measure, limit);
    finish(chunks, &measure, max_height)
}

/// Move words from the second-to-last chunk into a too-short last chunk,
/// never past `limit`.
fn rebalance_tail<F>(chunks: &mut [Vec<&str>], min_words_last: usize, measure: &F, limit: u32)
where
    F: Fn(&str) -> u32,
{
    let [.., donor, last] = chunks else {
        return;
    };
    if last.len() >= min_words_last || donor.len() < DONOR_MIN_WORDS {
        return;
    }
    let combined = donor.len() + last.len();
    let target = (combined / 2).max(min_words_last);
    let mut moved = target.saturating_sub(last.len()).min(donor.len() / 2);
    while moved > 0 {
        let candidate: Vec<&str> = donor[donor.len() - moved..]
            .iter()
            .chain(last.iter())
            .copied()
            .collect();
        if measure(&candidate.join(" ")) <= limit {
            break;
        }
        moved -= 1;
    }
    if moved == 0 {
        return;
    }
    let mut tail = donor.split_off(donor.len() - moved);
    tail.append(last);
    *last = tail;
}

fn finish<F>(chunks: Vec<Vec<&str>>, measure: &F, max_height: u32) -> Pagination
where
    F: Fn(&str) -> u32,
{
    let total = chunks.len();
    let mut overflowing = Vec::new();
    let chunks = chunks
        .into_iter()
        .enumerate()
        .map(|(i, words)| {
            let text = words.join(" ");
            if words.len() == 1 && measure(&text) > max_height {
                overflowing.push(i + 1);
            }
            SlideChunk {
                ordinal: i + 1,
                total,
                text,
            }
        })
        .collect();
    Pagination {
        chunks,
        overflowing,
    }
}
