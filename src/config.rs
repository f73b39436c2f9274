//! Analyzer configuration.

use crate::analysis::settings::GeneratorVersion;
use crate::analysis::text::WordCountOptions;

/// Options that control how a book package is analyzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerOptions {
    /// Branding used when the sidecar names none.
    pub default_branding: String,
    /// Front/back-matter pack used when the book folder names none.
    pub default_xmatter: String,
    /// First generator version whose explicit ePub mode is trusted.
    pub epub_mode_cutoff: GeneratorVersion,
    pub settings_file_name: String,
    pub meta_file_name: String,
    pub collection_file_name: String,
    pub word_count: WordCountOptions,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            default_branding: "Default".into(),
            default_xmatter: "Device".into(),
            epub_mode_cutoff: GeneratorVersion::new(5, 4),
            settings_file_name: "publish-settings.json".into(),
            meta_file_name: "meta.json".into(),
            collection_file_name: "temp.bloomCollection".into(),
            word_count: WordCountOptions::default(),
        }
    }
}

impl AnalyzerOptions {
    pub fn with_default_branding(mut self, branding: impl Into<String>) -> Self {
        self.default_branding = branding.into();
        self
    }

    pub fn with_default_xmatter(mut self, xmatter: impl Into<String>) -> Self {
        self.default_xmatter = xmatter.into();
        self
    }
}
