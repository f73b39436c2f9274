//! Skeleton collection descriptor (`temp.bloomCollection`) for a single book.
//!
//! The descriptor is built purely from already-resolved values; only
//! [`CollectionDescriptor::write_to`] touches the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::Serialize;
use tracing::info;

use crate::analysis::language::{LanguageSet, Location};
use crate::book::Metadata;
use crate::error::Result;

const ROOT_ELEMENT: &str = "Collection";

/// Everything the descriptor is assembled from.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorInputs<'a> {
    pub languages: &'a LanguageSet,
    pub location: &'a Location,
    pub branding: &'a str,
    pub bookshelf: &'a str,
    pub xmatter_pack: &'a str,
    pub metadata: &'a Metadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CollectionDescriptor {
    pub language1_iso639_code: String,
    pub language2_iso639_code: String,
    pub language3_iso639_code: String,
    pub sign_language_iso639_code: String,
    pub language1_name: String,
    pub language2_name: String,
    pub language3_name: String,
    pub sign_language_name: String,
    pub x_matter_pack: String,
    pub branding_project_name: String,
    pub default_book_tags: String,
    pub page_number_style: String,
    pub is_language1_rtl: bool,
    pub country: String,
    pub province: String,
    pub district: String,
}

impl CollectionDescriptor {
    pub fn build(inputs: DescriptorInputs<'_>) -> Self {
        let langs = inputs.languages;
        let name = |code: &str| {
            inputs
                .metadata
                .language_display_name(code)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            language1_iso639_code: langs.l1.clone(),
            language2_iso639_code: langs.l2.clone(),
            language3_iso639_code: langs.l3.clone(),
            sign_language_iso639_code: langs.sign.clone(),
            language1_name: name(&langs.l1),
            language2_name: name(&langs.l2),
            language3_name: name(&langs.l3),
            sign_language_name: name(&langs.sign),
            x_matter_pack: inputs.xmatter_pack.to_string(),
            branding_project_name: inputs.branding.to_string(),
            default_book_tags: inputs.bookshelf.to_string(),
            page_number_style: inputs.metadata.page_number_style().unwrap_or_default().to_string(),
            is_language1_rtl: inputs.metadata.is_rtl(),
            country: inputs.location.country.clone(),
            province: inputs.location.province.clone(),
            district: inputs.location.district.clone(),
        }
    }

    /// Element names and text values, in document order.
    pub fn fields(&self) -> [(&'static str, &str); 16] {
        [
            ("Language1Iso639Code", self.language1_iso639_code.as_str()),
            ("Language2Iso639Code", self.language2_iso639_code.as_str()),
            ("Language3Iso639Code", self.language3_iso639_code.as_str()),
            ("SignLanguageIso639Code", self.sign_language_iso639_code.as_str()),
            ("Language1Name", self.language1_name.as_str()),
            ("Language2Name", self.language2_name.as_str()),
            ("Language3Name", self.language3_name.as_str()),
            ("SignLanguageName", self.sign_language_name.as_str()),
            ("XMatterPack", self.x_matter_pack.as_str()),
            ("BrandingProjectName", self.branding_project_name.as_str()),
            ("DefaultBookTags", self.default_book_tags.as_str()),
            ("PageNumberStyle", self.page_number_style.as_str()),
            ("IsLanguage1Rtl", if self.is_language1_rtl { "true" } else { "false" }),
            ("Country", self.country.as_str()),
            ("Province", self.province.as_str()),
            ("District", self.district.as_str()),
        ]
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new(ROOT_ELEMENT)))?;
        for (name, value) in self.fields() {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            writer.write_event(Event::Text(BytesText::new(value)))?;
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
        writer.write_event(Event::End(BytesEnd::new(ROOT_ELEMENT)))?;
        // Only &str content was written, so the buffer is valid UTF-8.
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }

    /// Write the descriptor next to the book folder (into its parent directory).
    pub fn write_to(&self, book_folder: &Path, file_name: &str) -> Result<PathBuf> {
        let collection_folder = book_folder.parent().unwrap_or(Path::new("."));
        let path = collection_folder.join(file_name);
        fs::write(&path, self.to_xml()?)?;
        info!(path = %path.display(), "wrote collection descriptor");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CollectionDescriptor {
        let languages = LanguageSet {
            l1: "tpi".into(),
            l2: "en".into(),
            l3: String::new(),
            sign: String::new(),
        };
        let location = Location {
            country: "Papua New Guinea".into(),
            province: "Madang".into(),
            district: String::new(),
        };
        let metadata = Metadata::parse(
            r#"{"language-display-names":{"tpi":"Tok Pisin","en":"English"},
                "page-number-style":"Devanagari","isRtl":false}"#,
        )
        .unwrap();
        CollectionDescriptor::build(DescriptorInputs {
            languages: &languages,
            location: &location,
            branding: "Default",
            bookshelf: "bookshelf:R&D <test>",
            xmatter_pack: "Traditional",
            metadata: &metadata,
        })
    }

    #[test]
    fn test_fields_in_order() {
        let names: Vec<&str> = sample().fields().iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            [
                "Language1Iso639Code",
                "Language2Iso639Code",
                "Language3Iso639Code",
                "SignLanguageIso639Code",
                "Language1Name",
                "Language2Name",
                "Language3Name",
                "SignLanguageName",
                "XMatterPack",
                "BrandingProjectName",
                "DefaultBookTags",
                "PageNumberStyle",
                "IsLanguage1Rtl",
                "Country",
                "Province",
                "District",
            ]
        );
    }

    #[test]
    fn test_names_from_sidecar() {
        let d = sample();
        assert_eq!(d.language1_name, "Tok Pisin");
        assert_eq!(d.language2_name, "English");
        assert_eq!(d.language3_name, "");
        assert_eq!(d.page_number_style, "Devanagari");
    }

    #[test]
    fn test_xml_shape_and_escaping() {
        let xml = sample().to_xml().unwrap();
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="utf-8"?><Collection>"#));
        assert!(xml.ends_with("</Collection>"));
        assert!(xml.contains("<Language1Iso639Code>tpi</Language1Iso639Code>"));
        assert!(xml.contains("<IsLanguage1Rtl>false</IsLanguage1Rtl>"));
        assert!(xml.contains("<DefaultBookTags>bookshelf:R&amp;D &lt;test&gt;</DefaultBookTags>"));
        assert!(xml.contains("<District></District>"));
        let first = xml.find("<Language1Iso639Code>").unwrap();
        let last = xml.find("<District>").unwrap();
        assert!(first < last);
    }

    #[test]
    fn test_write_to_parent_folder() {
        let dir = tempfile::tempdir().unwrap();
        let book_folder = dir.path().join("My Book");
        fs::create_dir(&book_folder).unwrap();
        let path = sample().write_to(&book_folder, "temp.bloomCollection").unwrap();
        assert_eq!(path, dir.path().join("temp.bloomCollection"));
        let written = fs::read_to_string(path).unwrap();
        assert!(written.contains("<XMatterPack>Traditional</XMatterPack>"));
    }
}
