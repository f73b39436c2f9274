//! Reading-level estimate from the densest content page.

use std::fmt;

use serde::Serialize;

use crate::analysis::text::WordCounter;
use crate::book::pages::{self, TextFilter};
use crate::dom::Document;

/// Reading levels, following the African Storybook word-count bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u8")]
pub enum ReadingLevel {
    FirstWords = 1,
    FirstSentences = 2,
    FirstParagraphs = 3,
    LongerParagraphs = 4,
}

impl ReadingLevel {
    pub fn from_max_words(max_words_per_page: usize) -> Self {
        match max_words_per_page {
            0..=10 => Self::FirstWords,
            11..=25 => Self::FirstSentences,
            26..=50 => Self::FirstParagraphs,
            _ => Self::LongerParagraphs,
        }
    }

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::FirstWords => "First words",
            Self::FirstSentences => "First sentences",
            Self::FirstParagraphs => "First paragraphs",
            Self::LongerParagraphs => "Longer paragraphs",
        }
    }
}

impl From<ReadingLevel> for u8 {
    fn from(level: ReadingLevel) -> u8 {
        level.number()
    }
}

impl fmt::Display for ReadingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.label())
    }
}

/// Largest per-page word count over content pages, counting `lang` text.
///
/// Image descriptions are excluded; text over pictures is included.
pub fn max_words_per_page(doc: &Document, lang: &str, counter: &WordCounter) -> usize {
    let filter = TextFilter {
        include_image_descriptions: false,
        include_text_over_picture: true,
    };
    pages::numbered_pages(doc)
        .iter()
        .map(|page| {
            pages::editables(page, lang, filter)
                .iter()
                .map(|editable| counter.count(&editable.text_with_breaks()))
                .sum::<usize>()
        })
        .max()
        .unwrap_or(0)
}

pub fn compute_reading_level(doc: &Document, lang: &str, counter: &WordCounter) -> ReadingLevel {
    ReadingLevel::from_max_words(max_words_per_page(doc, lang, counter))
}
