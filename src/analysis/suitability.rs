//! Which artifacts a book can reasonably be converted to.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::analysis::settings::{EpubMode, GeneratorVersion};
use crate::book::pages;
use crate::diagnostics::{Category, Diagnostic};
use crate::dom::Document;

/// Why a book cannot become a reflowable ePub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Unsuitability {
    MultipleImages,
    MultipleTextBoxes,
    MultipleVideos,
    NoContentPages,
}

impl Unsuitability {
    pub fn message(self) -> &'static str {
        match self {
            Self::MultipleImages => "Bad ePUB because some page(s) had multiple images",
            Self::MultipleTextBoxes => "Bad ePUB because some page(s) had multiple text boxes",
            Self::MultipleVideos => "Bad ePUB because some page(s) had multiple videos",
            Self::NoContentPages => "Bad ePUB because there were no content pages",
        }
    }
}

impl fmt::Display for Unsuitability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "lowercase")]
pub enum EpubVerdict {
    Suitable,
    Unsuitable(Unsuitability),
}

impl EpubVerdict {
    pub fn is_suitable(self) -> bool {
        matches!(self, Self::Suitable)
    }
}

impl From<EpubVerdict> for bool {
    fn from(verdict: EpubVerdict) -> bool {
        verdict.is_suitable()
    }
}

/// Reader packages can be built from any book.
pub fn is_reader_suitable(_log: &mut Vec<Diagnostic>) -> bool {
    true
}

/// Decide whether the book can become an ePub.
///
/// A fixed-layout ePub from a current generator always works. Otherwise the
/// book must reflow, which requires every content page to hold at most one
/// image, one text box and one video. The first failing page decides.
pub fn epub_verdict(
    doc: &Document,
    mode: Option<EpubMode>,
    generator: GeneratorVersion,
    cutoff: GeneratorVersion,
    log: &mut Vec<Diagnostic>,
) -> EpubVerdict {
    if mode == Some(EpubMode::Fixed) && generator >= cutoff {
        return EpubVerdict::Suitable;
    }

    let content_pages = pages::numbered_pages(doc);
    let reason = if content_pages.is_empty() {
        Some(Unsuitability::NoContentPages)
    } else {
        content_pages.iter().find_map(|page| {
            if pages::image_containers(page).len() > 1 {
                Some(Unsuitability::MultipleImages)
            } else if pages::translation_groups(page, false).len() > 1 {
                Some(Unsuitability::MultipleTextBoxes)
            } else if pages::videos_from(page).len() > 1 {
                Some(Unsuitability::MultipleVideos)
            } else {
                None
            }
        })
    };

    match reason {
        Some(reason) => {
            debug!(%reason, "book is not ePub suitable");
            log.push(Diagnostic::info(Category::ArtifactSuitability, reason.message()));
            EpubVerdict::Unsuitable(reason)
        }
        None => EpubVerdict::Suitable,
    }
}
