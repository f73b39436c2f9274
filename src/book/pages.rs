//! Page-level vocabulary of the authoring tool's markup.
//!
//! Class names are matched with the same semantics the authoring tool's own
//! queries use: `numberedPage` as a class token, everything else as a
//! substring of the class attribute.

use crate::dom::{Document, Element, select_within};

pub mod class {
    pub const PAGE: &str = "bloom-page";
    pub const NUMBERED_PAGE: &str = "numberedPage";
    pub const MARGIN_BOX: &str = "marginBox";
    pub const IMAGE_CONTAINER: &str = "bloom-imageContainer";
    pub const TRANSLATION_GROUP: &str = "bloom-translationGroup";
    pub const IMAGE_DESCRIPTION: &str = "bloom-imageDescription";
    pub const BOX_HEADER_OFF: &str = "box-header-off";
    pub const EDITABLE: &str = "bloom-editable";
    pub const TEXT_OVER_PICTURE: &str = "bloom-textOverPicture";
    pub const VISIBILITY_ON: &str = "bloom-visibility-code-on";
}

pub mod attr {
    pub const DATA_BOOK: &str = "data-book";
    pub const XMATTER_PAGE: &str = "data-xmatter-page";
    pub const DATA_LIBRARY: &str = "data-library";
    pub const BOOKSHELF_URL_KEY: &str = "data-bookshelfurlkey";
}

/// Id of the hidden element carrying book-level data entries.
pub const DATA_DIV_ID: &str = "bloomDataDiv";

/// Which text containers count toward a page's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextFilter {
    pub include_image_descriptions: bool,
    pub include_text_over_picture: bool,
}

impl Default for TextFilter {
    fn default() -> Self {
        Self {
            include_image_descriptions: true,
            include_text_over_picture: true,
        }
    }
}

/// Content pages (pages counted toward pagination), in document order.
pub fn numbered_pages(doc: &Document) -> Vec<Element<'_>> {
    doc.select_all(|e| e.is("div") && e.has_class(class::NUMBERED_PAGE))
}

/// Margin boxes directly under a page.
pub fn margin_boxes<'a>(page: &Element<'a>) -> Vec<Element<'a>> {
    page.select_children(|e| e.is("div") && e.class_contains(class::MARGIN_BOX))
}

pub fn image_containers<'a>(page: &Element<'a>) -> Vec<Element<'a>> {
    select_within(&margin_boxes(page), is_image_container)
}

pub fn is_image_container(e: &Element<'_>) -> bool {
    e.is("div") && e.class_contains(class::IMAGE_CONTAINER)
}

/// Translation groups inside the page's margin boxes.
///
/// Groups marked `box-header-off` never count; image descriptions count
/// only when asked for.
pub fn translation_groups<'a>(
    page: &Element<'a>,
    include_image_descriptions: bool,
) -> Vec<Element<'a>> {
    select_within(&margin_boxes(page), |e| {
        e.is("div")
            && e.class_contains(class::TRANSLATION_GROUP)
            && !e.class_contains(class::BOX_HEADER_OFF)
            && (include_image_descriptions || !e.class_contains(class::IMAGE_DESCRIPTION))
    })
}

/// Editable text blocks of a page, optionally restricted to one language.
///
/// An empty or `*` language disables the language filter.
pub fn editables<'a>(page: &Element<'a>, lang: &str, filter: TextFilter) -> Vec<Element<'a>> {
    let groups = translation_groups(page, filter.include_image_descriptions);
    let filter_lang = is_language_valid(lang);
    select_within(&groups, |e| {
        e.is("div")
            && e.class_contains(class::EDITABLE)
            && (!filter_lang || e.attr_is("lang", lang))
    })
    .into_iter()
    .filter(|e| {
        filter.include_text_over_picture
            || e.closest(|a| a.has_class(class::TEXT_OVER_PICTURE)).is_none()
    })
    .collect()
}

/// Videos in margin boxes of this page and of every page after it.
pub fn videos_from<'a>(page: &Element<'a>) -> Vec<Element<'a>> {
    let mut scopes = margin_boxes(page);
    for sibling in page.following_siblings() {
        if sibling.is("div") && sibling.class_contains(class::MARGIN_BOX) {
            scopes.push(sibling);
        }
        scopes.extend(margin_boxes(&sibling));
    }
    select_within(&scopes, |e| e.is("video"))
}

/// True for elements inside (or forming) a front/back-matter page.
pub fn in_xmatter(e: &Element<'_>) -> bool {
    e.closest(|a| a.has_attr(attr::XMATTER_PAGE)).is_some()
}

/// Front-cover pages.
pub fn front_cover_pages(doc: &Document) -> Vec<Element<'_>> {
    doc.select_all(|e| {
        e.is("div") && e.class_contains(class::PAGE) && e.attr_is(attr::XMATTER_PAGE, "frontCover")
    })
}

/// Entries of the data div keyed by `data-book`, in document order.
pub fn data_div_entries<'a>(doc: &'a Document, key: &str) -> Vec<Element<'a>> {
    doc.select_all(|e| e.attr_is("id", DATA_DIV_ID))
        .iter()
        .flat_map(|div| div.select_children(|c| c.attr_is(attr::DATA_BOOK, key)))
        .collect()
}

/// The generator `<meta>` content, e.g. `Bloom Version 5.3.0 (apparent build date: ...)`.
pub fn generator(doc: &Document) -> Option<&str> {
    doc.head()?
        .select_first(|e| {
            e.is("meta")
                && e.attr("name")
                    .is_some_and(|n| n.eq_ignore_ascii_case("generator"))
        })?
        .attr("content")
}

pub fn is_language_valid(lang: &str) -> bool {
    !lang.is_empty() && lang != "*"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_html(inner: &str) -> String {
        format!(
            r#"<html><body><div class="bloom-page numberedPage"><div class="marginBox">{inner}</div></div></body></html>"#
        )
    }

    #[test]
    fn test_numbered_pages_use_token_match() {
        let doc = Document::parse(
            r#"<body><div class="bloom-page numberedPage"></div><div class="bloom-page numberedPageX"></div>
               <div class="bloom-page" data-xmatter-page="frontCover"></div></body>"#,
        )
        .unwrap();
        assert_eq!(numbered_pages(&doc).len(), 1);
        assert_eq!(front_cover_pages(&doc).len(), 1);
    }

    #[test]
    fn test_translation_groups_skip_descriptions_and_headers() {
        let doc = Document::parse(&page_html(
            r#"<div class="bloom-translationGroup"></div>
               <div class="bloom-translationGroup box-header-off"></div>
               <div class="bloom-imageContainer">
                 <div class="bloom-translationGroup bloom-imageDescription"></div>
               </div>"#,
        ))
        .unwrap();
        let page = numbered_pages(&doc)[0];
        assert_eq!(translation_groups(&page, false).len(), 1);
        assert_eq!(translation_groups(&page, true).len(), 2);
        assert_eq!(image_containers(&page).len(), 1);
    }

    #[test]
    fn test_editables_language_and_overlay_filters() {
        let doc = Document::parse(&page_html(
            r#"<div class="bloom-translationGroup">
                 <div class="bloom-editable" lang="en">a</div>
                 <div class="bloom-editable" lang="fr">b</div>
               </div>
               <div class="bloom-textOverPicture">
                 <div class="bloom-translationGroup"><div class="bloom-editable" lang="en">c</div></div>
               </div>"#,
        ))
        .unwrap();
        let page = numbered_pages(&doc)[0];
        let all = TextFilter::default();
        assert_eq!(editables(&page, "en", all).len(), 2);
        assert_eq!(editables(&page, "", all).len(), 3);
        let no_overlay = TextFilter {
            include_text_over_picture: false,
            ..all
        };
        assert_eq!(editables(&page, "en", no_overlay).len(), 1);
    }

    #[test]
    fn test_videos_counted_from_page_onward() {
        let doc = Document::parse(
            r#"<body>
              <div class="bloom-page numberedPage" id="a"><div class="marginBox"><video></video></div></div>
              <div class="bloom-page numberedPage" id="b"><div class="marginBox"><video></video></div></div>
            </body>"#,
        )
        .unwrap();
        let pages = numbered_pages(&doc);
        assert_eq!(videos_from(&pages[0]).len(), 2);
        assert_eq!(videos_from(&pages[1]).len(), 1);
    }

    #[test]
    fn test_data_div_and_generator() {
        let doc = Document::parse(
            r#"<html><head><meta name="Generator" content="Bloom Version 4.9.1"></head><body>
               <div id="bloomDataDiv"><div data-book="contentLanguage1" lang="*"> tpi </div></div>
               </body></html>"#,
        )
        .unwrap();
        let entries = data_div_entries(&doc, "contentLanguage1");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].inner_text().trim(), "tpi");
        assert_eq!(generator(&doc), Some("Bloom Version 4.9.1"));
    }
}
