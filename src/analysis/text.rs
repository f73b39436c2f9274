//! Word segmentation and counting.
//!
//! Counting is deliberately not whitespace splitting. Punctuation is
//! removed only where it touches a string edge or a separator, so `don't`
//! and `well-known` stay single words, and splitting honours a small set of
//! zero-width and directional format characters without splitting on every
//! `\p{Cf}` character (joiners are meaningful inside words in several scripts).

use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;

/// Line-break markup variants and literal newlines.
static LINE_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<br></br>|<br>|<br />|<br/>|\r?\n").unwrap());

/// Separator runs that split words: whitespace/separators, true control
/// characters, ZWSP, LRM/RLM, directional embeddings/overrides and isolates.
static WORD_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Z}\p{Cc}\x{200B}\x{200E}\x{200F}\x{202A}-\x{202E}\x{2066}-\x{2069}]+").unwrap()
});

static DEFAULT_PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&punctuation_pattern(r"\p{P}")).unwrap());

/// Case mapping used before counting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaseMapping {
    /// Unicode default lowercasing, identical on every machine.
    #[default]
    Invariant,
    /// Turkish/Azeri dotted and dotless i.
    Turkic,
}

impl CaseMapping {
    pub fn lowercase(self, text: &str) -> String {
        match self {
            CaseMapping::Invariant => text.to_lowercase(),
            CaseMapping::Turkic => text
                .chars()
                .map(|c| match c {
                    'I' => 'ı',
                    'İ' => 'i',
                    other => other,
                })
                .collect::<String>()
                .to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordCountOptions {
    pub case_mapping: CaseMapping,
    /// Characters Unicode classes as punctuation that should count as letters
    /// (for example an apostrophe used as a glottal stop).
    pub letters: String,
}

/// Compiled word counter. Cheap to clone.
#[derive(Debug, Clone)]
pub struct WordCounter {
    case_mapping: CaseMapping,
    punctuation: Regex,
}

impl Default for WordCounter {
    fn default() -> Self {
        Self {
            case_mapping: CaseMapping::Invariant,
            punctuation: DEFAULT_PUNCTUATION_RE.clone(),
        }
    }
}

impl WordCounter {
    pub fn new(options: &WordCountOptions) -> Result<Self> {
        let punctuation = if options.letters.is_empty() {
            DEFAULT_PUNCTUATION_RE.clone()
        } else {
            let letters: String = options
                .letters
                .chars()
                .map(|c| regex::escape(c.encode_utf8(&mut [0; 4])))
                .collect();
            Regex::new(&punctuation_pattern(&format!(r"[\p{{P}}--[{letters}]]")))?
        };
        Ok(Self {
            case_mapping: options.case_mapping,
            punctuation,
        })
    }

    /// Number of words in `text`; blank input counts zero.
    pub fn count(&self, text: &str) -> usize {
        if text.trim().is_empty() {
            return 0;
        }
        self.words(text).len()
    }

    /// The words of `text`, lowercased, with edge punctuation stripped.
    pub fn words(&self, text: &str) -> Vec<String> {
        let lowered = self.case_mapping.lowercase(text);
        let spaced = LINE_BREAK_RE.replace_all(&lowered, " ");
        let stripped = self.punctuation.replace_all(&spaced, " ");
        WORD_SPLIT_RE
            .split(stripped.trim())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Count words with default options.
pub fn count_words(text: &str) -> usize {
    WordCounter::default().count(text)
}

/// Edge-punctuation pattern for a punctuation class `p`.
///
/// Alternatives, in priority order: punctuation at the start, punctuation on
/// both sides of a separator run, before a word, after a word, at the end.
fn punctuation_pattern(p: &str) -> String {
    let sep = r"[\s\p{Z}\p{C}]";
    format!("(^{p}+)|({p}+{sep}+{p}+)|({sep}+{p}+)|({p}+{sep}+)|({p}+$)")
}
