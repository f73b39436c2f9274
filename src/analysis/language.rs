//! Language, location, bookshelf, branding and front/back-matter resolution.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::book::pages::{self, attr, class};
use crate::book::{Book, Metadata};
use crate::dom::{Document, select_within};

const SIGN_LANGUAGE_FEATURE: &str = "signLanguage:";
const BOOKSHELF_PREFIX: &str = "bookshelf:";
const XMATTER_SUFFIX: &str = "-XMatter.css";

/// One of the four language roles a book can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageSlot {
    L1,
    L2,
    L3,
    Sign,
}

impl LanguageSlot {
    pub const ALL: [LanguageSlot; 4] = [Self::L1, Self::L2, Self::L3, Self::Sign];

    /// `data-book` key of the data-div entry for this slot.
    pub fn data_book_key(self) -> &'static str {
        match self {
            Self::L1 => "contentLanguage1",
            Self::L2 => "contentLanguage2",
            Self::L3 => "contentLanguage3",
            Self::Sign => "signLanguage",
        }
    }

    /// Class marking text in this slot's language; sign language has none.
    pub fn marker_class(self) -> Option<&'static str> {
        match self {
            Self::L1 => Some("bloom-content1"),
            Self::L2 => Some("bloom-contentNational1"),
            Self::L3 => Some("bloom-contentNational2"),
            Self::Sign => None,
        }
    }

    pub fn default_code(self) -> &'static str {
        match self {
            Self::L2 => "en",
            _ => "",
        }
    }
}

impl fmt::Display for LanguageSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::L1 => "L1",
            Self::L2 => "L2",
            Self::L3 => "L3",
            Self::Sign => "sign",
        })
    }
}

/// Resolved language codes. Empty string means "none".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LanguageSet {
    pub l1: String,
    pub l2: String,
    pub l3: String,
    pub sign: String,
}

impl LanguageSet {
    pub fn get(&self, slot: LanguageSlot) -> &str {
        match slot {
            LanguageSlot::L1 => &self.l1,
            LanguageSlot::L2 => &self.l2,
            LanguageSlot::L3 => &self.l3,
            LanguageSlot::Sign => &self.sign,
        }
    }
}

/// Resolve every language slot of a book. Never fails.
pub fn resolve_languages(book: &Book) -> LanguageSet {
    let doc = &book.document;
    let mut sign = resolve_slot(doc, LanguageSlot::Sign);
    if sign.is_empty() {
        sign = sign_language_from_features(&book.metadata).unwrap_or_default();
    }
    let set = LanguageSet {
        l1: resolve_slot(doc, LanguageSlot::L1),
        l2: resolve_slot(doc, LanguageSlot::L2),
        l3: resolve_slot(doc, LanguageSlot::L3),
        sign,
    };
    debug!(l1 = %set.l1, l2 = %set.l2, l3 = %set.l3, sign = %set.sign, "resolved languages");
    set
}

/// Code for one slot: data-div entry, then markup fallback, then the slot default.
pub fn resolve_slot(doc: &Document, slot: LanguageSlot) -> String {
    if let Some(entry) = pages::data_div_entries(doc, slot.data_book_key()).first() {
        return entry.inner_text().trim().to_string();
    }
    language_from_markup(doc, slot)
        .filter(|lang| !lang.is_empty())
        .unwrap_or(slot.default_code())
        .to_string()
}

/// Infer a slot's language from marked-up content when the data div is silent.
fn language_from_markup(doc: &Document, slot: LanguageSlot) -> Option<&str> {
    let marker = slot.marker_class()?;

    let title_lang = doc
        .select_first(|e| {
            e.is("div") && e.class_contains(marker) && e.attr_is(attr::DATA_BOOK, "bookTitle") && e.has_attr("lang")
        })
        .and_then(|title| title.attr("lang"))
        .filter(|lang| !lang.is_empty());
    if title_lang.is_some() {
        return title_lang;
    }

    doc.select_all(|e| {
        e.is("div")
            && e.class_contains(class::VISIBILITY_ON)
            && e.class_contains(marker)
            && e.has_attr("lang")
    })
    .into_iter()
    .find(|container| {
        container.children().any(|p| {
            p.is("p") && p.first_text_child().is_some_and(|t| !t.trim().is_empty())
        })
    })
    .and_then(|container| container.attr("lang"))
}

/// Suffix of the first `signLanguage:` feature.
pub fn sign_language_from_features(metadata: &Metadata) -> Option<String> {
    metadata
        .features()?
        .into_iter()
        .find_map(|f| f.strip_prefix(SIGN_LANGUAGE_FEATURE))
        .map(str::to_string)
}

/// Geographic origin of the book's language. Empty string means unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Location {
    pub country: String,
    pub province: String,
    pub district: String,
}

impl Location {
    /// Split a comma-separated location, assigning parts right to left.
    ///
    /// Text with more than three parts yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        let (district, province, country) = match parts.as_slice() {
            [country] => ("", "", *country),
            [province, country] => ("", *province, *country),
            [district, province, country] => (*district, *province, *country),
            _ => return None,
        };
        Some(Self {
            country: country.to_string(),
            province: province.to_string(),
            district: district.to_string(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.country.is_empty() && self.province.is_empty() && self.district.is_empty()
    }
}

/// Location from the single `languageLocation` field of the front/back matter.
///
/// Zero or several matches leave the location empty.
pub fn resolve_location(doc: &Document) -> Location {
    let xmatter = doc.select_all(|e| e.has_attr(attr::XMATTER_PAGE));
    let fields = select_within(&xmatter, |e| e.attr_is(attr::DATA_LIBRARY, "languageLocation"));
    match fields.as_slice() {
        [field] => Location::parse(&field.inner_text()).unwrap_or_default(),
        _ => {
            debug!(matches = fields.len(), "language location not unique, ignoring");
            Location::default()
        }
    }
}

/// `bookshelf:<key>` from the body attribute, else the first bookshelf tag.
pub fn resolve_bookshelf(book: &Book) -> String {
    if let Some(key) = book
        .document
        .body()
        .attr(attr::BOOKSHELF_URL_KEY)
        .filter(|k| !k.is_empty())
    {
        return format!("{BOOKSHELF_PREFIX}{key}");
    }
    book.metadata
        .tags()
        .and_then(|tags| tags.into_iter().find(|t| t.starts_with(BOOKSHELF_PREFIX)))
        .unwrap_or_default()
        .to_string()
}

pub fn resolve_branding(metadata: &Metadata, default_branding: &str) -> String {
    metadata
        .branding_project_name()
        .unwrap_or(default_branding)
        .to_string()
}

/// Pack name from a folder listing: stem of the first `*-XMatter.css` file.
pub fn xmatter_pack_from_listing<'a, I>(file_names: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    file_names
        .into_iter()
        .find_map(|name| name.strip_suffix(XMATTER_SUFFIX))
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

/// Pack name for a book folder, falling back to `default_xmatter` on any failure.
pub fn xmatter_pack(folder: &Path, default_xmatter: &str) -> String {
    let entries = match fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(folder = %folder.display(), error = %e, "cannot list book folder for xmatter");
            return default_xmatter.to_string();
        }
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect();
    names.sort();
    xmatter_pack_from_listing(names.iter().map(String::as_str))
        .unwrap_or_else(|| default_xmatter.to_string())
}
