//! # bookprobe
//!
//! Metadata and quality signals for picture-book packages: a book's markup
//! file plus its `meta.json` sidecar.
//!
//! ## Features
//!
//! - Resolve the book's languages, language location, bookshelf and branding
//! - Synthesize a skeleton collection descriptor (`temp.bloomCollection`)
//! - Normalize `publish-settings.json` for books from older generators
//! - Estimate a reading level from per-page word counts
//! - Decide reader/ePub suitability with diagnostics
//! - Fingerprint a representative image with a reproducible perceptual hash
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use bookprobe::{AnalyzerOptions, BookAnalyzer};
//!
//! let folder = Path::new("books/The Moon and the Cap");
//! let analyzer = BookAnalyzer::from_folder(folder, AnalyzerOptions::default()).unwrap();
//! println!("L1: {}", analyzer.language1_code());
//! println!("level: {}", analyzer.computed_level());
//! analyzer.write_collection(folder).unwrap();
//! ```
//!
//! ## Working with Markup Directly
//!
//! ```
//! use bookprobe::{AnalyzerOptions, Book, BookAnalyzer};
//!
//! let markup = r#"<html><body>
//!   <div id="bloomDataDiv"><div data-book="contentLanguage1">fr</div></div>
//!   <div class="bloom-page numberedPage"><div class="marginBox">
//!     <div class="bloom-translationGroup">
//!       <div class="bloom-editable" lang="fr">Le chat dort.</div>
//!     </div>
//!   </div></div>
//! </body></html>"#;
//!
//! let book = Book::parse(markup, "{}").unwrap();
//! let analyzer = BookAnalyzer::new(book, None, None, AnalyzerOptions::default()).unwrap();
//! assert_eq!(analyzer.language1_code(), "fr");
//! assert_eq!(analyzer.computed_level().number(), 1);
//! ```

pub mod analysis;
pub mod analyzer;
pub mod book;
pub mod config;
pub mod diagnostics;
pub mod dom;
pub mod error;
pub mod fingerprint;
pub(crate) mod util;

pub use analysis::{
    CollectionDescriptor, EpubMode, EpubVerdict, GeneratorVersion, LanguageSet, Location,
    PublishSettings, ReadingLevel, Unsuitability, WordCounter, count_words,
};
pub use analyzer::{AnalysisReport, BookAnalyzer};
pub use book::{Book, Metadata};
pub use config::AnalyzerOptions;
pub use diagnostics::{Category, Diagnostic, Severity};
pub use dom::Document;
pub use error::{Error, Result};
pub use fingerprint::{compute_image_hash, hamming_distance};
