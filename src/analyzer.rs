//! Whole-book analysis.
//!
//! [`BookAnalyzer`] resolves everything about a book once, at construction,
//! and answers queries from the resolved state afterwards.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, instrument};

use crate::analysis::collection::{CollectionDescriptor, DescriptorInputs};
use crate::analysis::language::{self, LanguageSet, Location};
use crate::analysis::level::{self, ReadingLevel};
use crate::analysis::settings::{
    self, EpubMode, FolderLock, GeneratorVersion, PublishSettings, SettingsResolution,
};
use crate::analysis::suitability::{self, EpubVerdict};
use crate::analysis::text::WordCounter;
use crate::book::{Book, pages};
use crate::config::AnalyzerOptions;
use crate::diagnostics::{Category, Diagnostic};
use crate::error::Result;
use crate::fingerprint;

#[derive(Debug)]
pub struct BookAnalyzer {
    book: Book,
    folder: Option<PathBuf>,
    options: AnalyzerOptions,
    word_counter: WordCounter,
    languages: LanguageSet,
    location: Location,
    branding: String,
    bookshelf: String,
    descriptor: CollectionDescriptor,
    generator: GeneratorVersion,
    settings: SettingsResolution,
}

impl BookAnalyzer {
    /// Analyze an already-loaded book.
    ///
    /// `folder` is only consulted for the front/back-matter pack; without it
    /// the default pack is used. Nothing is written.
    pub fn new(
        book: Book,
        folder: Option<&Path>,
        existing_settings: Option<PublishSettings>,
        options: AnalyzerOptions,
    ) -> Result<Self> {
        let word_counter = WordCounter::new(&options.word_count)?;
        let languages = language::resolve_languages(&book);
        let location = language::resolve_location(&book.document);
        let branding = language::resolve_branding(&book.metadata, &options.default_branding);
        let bookshelf = language::resolve_bookshelf(&book);
        let xmatter = match folder {
            Some(folder) => language::xmatter_pack(folder, &options.default_xmatter),
            None => options.default_xmatter.clone(),
        };
        let descriptor = CollectionDescriptor::build(DescriptorInputs {
            languages: &languages,
            location: &location,
            branding: &branding,
            bookshelf: &bookshelf,
            xmatter_pack: &xmatter,
            metadata: &book.metadata,
        });
        let generator = GeneratorVersion::parse(pages::generator(&book.document));
        let settings = settings::resolve(existing_settings, generator, options.epub_mode_cutoff);

        Ok(Self {
            folder: folder.map(Path::to_path_buf),
            book,
            options,
            word_counter,
            languages,
            location,
            branding,
            bookshelf,
            descriptor,
            generator,
            settings,
        })
    }

    /// Load, analyze and normalize the publish settings of a book folder.
    ///
    /// Holds the folder's [`FolderLock`] for the duration and rewrites the
    /// settings file only when resolution changed it.
    #[instrument(skip(options), fields(folder = %folder.display()))]
    pub fn from_folder(folder: &Path, options: AnalyzerOptions) -> Result<Self> {
        let _lock = FolderLock::acquire(folder);
        let book = Book::from_folder(folder, &options.meta_file_name)?;
        let existing = settings::load(folder, &options.settings_file_name);
        let analyzer = Self::new(book, Some(folder), existing, options)?;
        if analyzer.settings.changed
            && let Some(resolved) = &analyzer.settings.settings
        {
            settings::save(folder, &analyzer.options.settings_file_name, resolved)?;
        }
        info!(
            l1 = %analyzer.languages.l1,
            generator = %analyzer.generator,
            "analyzed book"
        );
        Ok(analyzer)
    }

    pub fn book(&self) -> &Book {
        &self.book
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    pub fn languages(&self) -> &LanguageSet {
        &self.languages
    }

    pub fn language1_code(&self) -> &str {
        &self.languages.l1
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn branding(&self) -> &str {
        &self.branding
    }

    pub fn bookshelf(&self) -> &str {
        &self.bookshelf
    }

    pub fn descriptor(&self) -> &CollectionDescriptor {
        &self.descriptor
    }

    pub fn generator_version(&self) -> GeneratorVersion {
        self.generator
    }

    pub fn settings_resolution(&self) -> &SettingsResolution {
        &self.settings
    }

    pub fn epub_mode(&self) -> Option<EpubMode> {
        self.settings.settings.as_ref().and_then(PublishSettings::epub_mode)
    }

    /// Write the collection descriptor beside `book_folder`.
    pub fn write_collection(&self, book_folder: &Path) -> Result<PathBuf> {
        self.descriptor
            .write_to(book_folder, &self.options.collection_file_name)
    }

    pub fn is_reader_suitable(&self, log: &mut Vec<Diagnostic>) -> bool {
        suitability::is_reader_suitable(log)
    }

    pub fn epub_verdict(&self, log: &mut Vec<Diagnostic>) -> EpubVerdict {
        suitability::epub_verdict(
            &self.book.document,
            self.epub_mode(),
            self.generator,
            self.options.epub_mode_cutoff,
            log,
        )
    }

    pub fn is_epub_suitable(&self, log: &mut Vec<Diagnostic>) -> bool {
        self.epub_verdict(log).is_suitable()
    }

    pub fn computed_level(&self) -> ReadingLevel {
        level::compute_reading_level(&self.book.document, &self.languages.l1, &self.word_counter)
    }

    pub fn has_custom_license(&self) -> bool {
        self.book.metadata.license() == Some("custom")
    }

    pub fn representative_image_source(&self) -> Option<String> {
        fingerprint::representative_image_source(&self.book.document)
    }

    /// The representative image as a file path, when the book has a folder.
    pub fn representative_image_path(&self) -> Option<PathBuf> {
        let folder = self.folder.as_deref()?;
        let src = self.representative_image_source()?;
        Some(fingerprint::resolve_image_path(folder, &src))
    }

    pub fn compute_image_hash(&self, path: &Path) -> Result<u64> {
        fingerprint::hash_image_file(path)
    }

    /// Everything known about the book, with its diagnostics.
    pub fn analyze(&self) -> AnalysisReport {
        let mut diagnostics = Vec::new();
        if self.settings.inconsistent {
            diagnostics.push(Diagnostic::warning(
                Category::PublishSettings,
                format!(
                    "ePub mode \"fixed\" recorded by generator {}, older than {}",
                    self.generator, self.options.epub_mode_cutoff
                ),
            ));
        }
        let reader_suitable = self.is_reader_suitable(&mut diagnostics);
        let epub = self.epub_verdict(&mut diagnostics);
        AnalysisReport {
            languages: self.languages.clone(),
            location: self.location.clone(),
            branding: self.branding.clone(),
            bookshelf: self.bookshelf.clone(),
            generator: self.generator,
            epub_mode: self.epub_mode(),
            settings_changed: self.settings.changed,
            reader_suitable,
            epub,
            level: self.computed_level(),
            custom_license: self.has_custom_license(),
            representative_image: self.representative_image_source(),
            image_hash: None,
            collection: self.descriptor.clone(),
            diagnostics,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub languages: LanguageSet,
    pub location: Location,
    pub branding: String,
    pub bookshelf: String,
    pub generator: GeneratorVersion,
    pub epub_mode: Option<EpubMode>,
    pub settings_changed: bool,
    pub reader_suitable: bool,
    pub epub: EpubVerdict,
    pub level: ReadingLevel,
    pub custom_license: bool,
    pub representative_image: Option<String>,
    /// Hex-encoded fingerprint, filled in by callers that hash the image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_hash: Option<String>,
    pub collection: CollectionDescriptor,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisReport {
    pub fn set_image_hash(&mut self, hash: u64) {
        self.image_hash = Some(format!("{hash:016x}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKUP: &str = r#"<html><head><meta name="Generator" content="Bloom Version 5.2.1"></head>
      <body data-bookshelfurlkey="animals">
        <div id="bloomDataDiv"><div data-book="contentLanguage1" lang="*">tpi</div></div>
        <div class="bloom-page numberedPage"><div class="marginBox">
          <div class="bloom-imageContainer"><img src="pig.png"></div>
          <div class="bloom-translationGroup"><div class="bloom-editable" lang="tpi">Mi lukim pik.</div></div>
        </div></div>
      </body></html>"#;

    fn analyzer(meta: &str, settings: Option<&str>) -> BookAnalyzer {
        let book = Book::parse(MARKUP, meta).unwrap();
        let existing = settings.and_then(PublishSettings::parse);
        BookAnalyzer::new(book, None, existing, AnalyzerOptions::default()).unwrap()
    }

    #[test]
    fn test_resolved_values() {
        let a = analyzer(r#"{"license":"custom"}"#, None);
        assert_eq!(a.language1_code(), "tpi");
        assert_eq!(a.languages().l2, "en");
        assert_eq!(a.bookshelf(), "bookshelf:animals");
        assert_eq!(a.branding(), "Default");
        assert_eq!(a.descriptor().x_matter_pack, "Device");
        assert_eq!(a.generator_version(), GeneratorVersion::new(5, 2));
        assert!(a.has_custom_license());
        assert_eq!(a.computed_level(), ReadingLevel::FirstWords);
        assert_eq!(a.representative_image_source().as_deref(), Some("pig.png"));
        assert_eq!(a.representative_image_path(), None);
    }

    #[test]
    fn test_old_generator_gets_flowable_settings() {
        let a = analyzer("{}", None);
        assert!(a.settings_resolution().changed);
        assert_eq!(a.epub_mode(), Some(EpubMode::Flowable));
        let mut log = Vec::new();
        assert!(a.is_epub_suitable(&mut log));
        assert!(a.is_reader_suitable(&mut log));
        assert!(log.is_empty());
    }

    #[test]
    fn test_report_flags_inconsistent_settings() {
        let a = analyzer("{}", Some(r#"{"epub":{"mode":"fixed"}}"#));
        let report = a.analyze();
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].category, Category::PublishSettings);
        assert!(report.epub.is_suitable());
    }

    #[test]
    fn test_report_serializes() {
        let mut report = analyzer("{}", None).analyze();
        report.set_image_hash(0xABCD);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["level"], 1);
        assert_eq!(json["imageHash"], "000000000000abcd");
        assert_eq!(json["epub"]["verdict"], "suitable");
        assert_eq!(json["collection"]["Language1Iso639Code"], "tpi");
        assert_eq!(json["epubMode"], "flowable");
    }
}
