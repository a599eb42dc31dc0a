//! Title and heading outline extraction
//!
//! Pure heuristics over pre-extracted text spans. The parsing layer hands in
//! pages of [`TextSpan`]s in layout order; [`extract_outline`] folds them into
//! an [`ExtractionResult`] in a single pass.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Title candidates need strictly more words than this.
const TITLE_MIN_WORDS: usize = 2;

/// Heading candidates need strictly fewer words than this.
const HEADING_MAX_WORDS: usize = 20;

/// Spans at or below this size never become headings.
const HEADING_MIN_FONT_SIZE: f32 = 8.0;

const H1_FONT_SIZE: f32 = 16.0;
const H2_FONT_SIZE: f32 = 13.0;
const H3_FONT_SIZE: f32 = 11.0;

/// A contiguous run of text rendered with one font.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    /// Raw text, not yet trimmed.
    pub text: String,
    pub font_size: f32,
    pub font_name: String,
    /// Zero-based index of the page the span was found on.
    pub page_index: usize,
}

impl TextSpan {
    pub fn new(
        text: impl Into<String>,
        font_size: f32,
        font_name: impl Into<String>,
        page_index: usize,
    ) -> Self {
        Self {
            text: text.into(),
            font_size,
            font_name: font_name.into(),
            page_index,
        }
    }

    /// Bold-ness inferred from the font name.
    ///
    /// Informational only: level assignment is driven by font size alone.
    pub fn is_bold(&self) -> bool {
        self.font_name.to_lowercase().contains("bold")
    }
}

/// Heading rank derived from font size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    /// Map a font size onto a level. Breakpoints are exclusive lower bounds.
    pub fn for_font_size(font_size: f32) -> Option<Self> {
        if font_size > H1_FONT_SIZE {
            Some(HeadingLevel::H1)
        } else if font_size > H2_FONT_SIZE {
            Some(HeadingLevel::H2)
        } else if font_size > H3_FONT_SIZE {
            Some(HeadingLevel::H3)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HeadingLevel::H1 => "H1",
            HeadingLevel::H2 => "H2",
            HeadingLevel::H3 => "H3",
        }
    }
}

impl fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of the emitted outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingRecord {
    pub level: HeadingLevel,
    /// Trimmed span text.
    pub text: String,
    /// One-based page number.
    pub page: usize,
}

/// Title plus outline for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub title: String,
    pub outline: Vec<HeadingRecord>,
}

/// Number of whitespace-separated tokens in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Running state for a single [`extract_outline`] call.
#[derive(Debug, Default)]
struct OutlineBuilder {
    max_font: f32,
    /// Untrimmed text of the current title candidate.
    title: String,
    headings: Vec<HeadingRecord>,
}

impl OutlineBuilder {
    fn visit(mut self, page_index: usize, span: &TextSpan) -> Self {
        let trimmed = span.text.trim();
        let words = word_count(trimmed);

        if page_index == 0 && span.font_size > self.max_font && words > TITLE_MIN_WORDS {
            self.max_font = span.font_size;
            self.title = span.text.clone();
        }

        if words < HEADING_MAX_WORDS && span.font_size > HEADING_MIN_FONT_SIZE {
            if let Some(level) = HeadingLevel::for_font_size(span.font_size) {
                self.headings.push(HeadingRecord {
                    level,
                    text: trimmed.to_string(),
                    page: page_index + 1,
                });
            }
        }

        self
    }

    fn finish(self) -> ExtractionResult {
        ExtractionResult {
            title: self.title.trim().to_string(),
            outline: self.headings,
        }
    }
}

/// Extract a title and heading outline from pages of spans.
///
/// Pages are visited in the given order and indexed from zero; spans within
/// a page are visited in the given order and never re-sorted, so the outline
/// preserves traversal order.
///
/// The title is the first page's span with the strictly largest font size
/// among spans of more than two words (first seen wins on ties). A span is an
/// outline entry when it has fewer than twenty words, is larger than 8pt and
/// maps onto a [`HeadingLevel`].
pub fn extract_outline(pages: &[Vec<TextSpan>]) -> ExtractionResult {
    pages
        .iter()
        .enumerate()
        .flat_map(|(page_index, spans)| spans.iter().map(move |span| (page_index, span)))
        .fold(OutlineBuilder::default(), |builder, (page_index, span)| {
            builder.visit(page_index, span)
        })
        .finish()
}
