//! Choosing which picture represents a book.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::book::pages::{self, class};
use crate::dom::{Document, Element, select_within};

static BACKGROUND_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)background-image\s*:\s*url\((.*)\)").unwrap());

/// Source of the picture used for the book's fingerprint.
///
/// Content pages are tried before the front cover. On each, the first `img`
/// directly inside an image container wins, then the first container's
/// inline background image.
pub fn representative_image_source(doc: &Document) -> Option<String> {
    let content_pages = doc.select_all(|e| {
        e.is("div") && e.class_contains(class::PAGE) && e.class_contains(class::NUMBERED_PAGE)
    });
    if let Some(src) = image_source_in(&content_pages) {
        return Some(src);
    }
    image_source_in(&pages::front_cover_pages(doc))
}

fn image_source_in(scopes: &[Element<'_>]) -> Option<String> {
    let containers = select_within(scopes, pages::is_image_container);
    let first_img = select_within(&containers, |e| e.is("img"))
        .into_iter()
        .find(|img| img.parent().is_some_and(|p| pages::is_image_container(&p)));
    if let Some(img) = first_img {
        return Some(img.attr("src").unwrap_or_default().to_string());
    }
    containers.first().and_then(|c| background_image_url(c.attr("style")?))
}

/// URL of an inline `background-image` declaration, without surrounding quotes.
pub fn background_image_url(style: &str) -> Option<String> {
    let caps = BACKGROUND_IMAGE_RE.captures(style)?;
    let url = caps[1].trim().trim_matches(|c| c == '\'' || c == '"');
    Some(url.to_string())
}

/// Resolve an image source against the book folder.
///
/// Sources are URL-encoded relative paths; any query string is dropped.
pub fn resolve_image_path(folder: &Path, src: &str) -> PathBuf {
    let without_query = src.split(['?', '#']).next().unwrap_or_default();
    let decoded = percent_decode_str(without_query).decode_utf8_lossy();
    folder.join(decoded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn src(markup: &str) -> Option<String> {
        representative_image_source(&Document::parse(markup).unwrap())
    }

    #[test]
    fn test_first_content_image() {
        let markup = r#"<body>
          <div class="bloom-page" data-xmatter-page="frontCover"><div class="bloom-imageContainer"><img src="cover.jpg"></div></div>
          <div class="bloom-page numberedPage"><div class="marginBox"><p>no picture</p></div></div>
          <div class="bloom-page numberedPage"><div class="marginBox">
            <div class="bloom-imageContainer"><img src="my%20dog.png?optional=true"></div>
          </div></div>
          <div class="bloom-page numberedPage"><div class="bloom-imageContainer"><img src="later.png"></div></div>
        </body>"#;
        assert_eq!(src(markup).as_deref(), Some("my%20dog.png?optional=true"));
    }

    #[test]
    fn test_background_image_fallback() {
        let markup = r#"<body>
          <div class="bloom-page numberedPage">
            <div class="bloom-imageContainer" style="Background-Image : url('bg.png')"></div>
          </div></body>"#;
        assert_eq!(src(markup).as_deref(), Some("bg.png"));
    }

    #[test]
    fn test_front_cover_fallback() {
        let markup = r#"<body>
          <div class="bloom-page" data-xmatter-page="frontCover">
            <div class="marginBox"><div class="bloom-imageContainer"><img src="cover.jpg"></div></div>
          </div>
          <div class="bloom-page numberedPage"><div class="marginBox"></div></div>
        </body>"#;
        assert_eq!(src(markup).as_deref(), Some("cover.jpg"));
    }

    #[test]
    fn test_no_image() {
        assert_eq!(src("<body><div class=\"bloom-page numberedPage\"></div></body>"), None);
    }

    #[test]
    fn test_background_url_quotes() {
        assert_eq!(background_image_url(r#"background-image:url("a b.png")"#).as_deref(), Some("a b.png"));
        assert_eq!(background_image_url("color: red"), None);
    }

    #[test]
    fn test_resolve_image_path() {
        let folder = Path::new("/books/My Book");
        assert_eq!(
            resolve_image_path(folder, "my%20dog.png?optional=true"),
            folder.join("my dog.png")
        );
        assert_eq!(resolve_image_path(folder, "images/a.jpg"), folder.join("images/a.jpg"));
    }
}
