//! Document model: an immutable, queryable tree parsed from book markup.
//!
//! Parsing is delegated to html5ever with a custom sink, so malformed
//! markup is recovered the way browsers recover it. Queries are plain
//! predicates over [`Element`] views; there is no selector language.
//!
//! ```
//! use bookprobe::dom::Document;
//!
//! let doc = Document::parse(r#"<body><div class="page numberedPage"><p>Hi</p></div></body>"#).unwrap();
//! let pages = doc.select_all(|e| e.is("div") && e.has_class("numberedPage"));
//! assert_eq!(pages.len(), 1);
//! assert_eq!(pages[0].inner_text(), "Hi");
//! ```

mod arena;
mod tree_sink;

pub use arena::{Attribute, NodeData, NodeId, Tree};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use tracing::debug;

use crate::error::{Error, Result};
use tree_sink::TreeBuilderSink;

/// Elements whose boundaries separate words when text is extracted.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "li", "ol", "p", "pre", "section",
    "table", "td", "th", "tr", "ul",
];

/// A parsed book document.
#[derive(Debug)]
pub struct Document {
    tree: Tree,
    body: NodeId,
}

impl Document {
    /// Parse markup with lenient HTML recovery.
    ///
    /// Fails when there is nothing to recover: empty input, input without any
    /// markup, or a tree without a `body` element.
    pub fn parse(markup: &str) -> Result<Self> {
        if markup.trim().is_empty() {
            return Err(Error::Markup("document is empty".into()));
        }
        if !markup.contains('<') {
            return Err(Error::Markup("document contains no markup".into()));
        }

        let sink = TreeBuilderSink::new();
        let (tree, parse_errors) = parse_document(sink, ParseOpts::default())
            .one(markup)
            .into_tree();
        if parse_errors > 0 {
            debug!(parse_errors, "recovered from malformed markup");
        }

        let body = tree
            .descendants(tree.document())
            .find(|&id| tree.element_name(id).is_some_and(|n| n.as_ref() == "body"))
            .ok_or_else(|| Error::Markup("document has no body".into()))?;

        Ok(Self { tree, body })
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The document node; queries from here cover `head` and `body`.
    pub fn root(&self) -> Element<'_> {
        Element {
            tree: &self.tree,
            id: self.tree.document(),
        }
    }

    pub fn body(&self) -> Element<'_> {
        Element {
            tree: &self.tree,
            id: self.body,
        }
    }

    pub fn head(&self) -> Option<Element<'_>> {
        self.select_first(|e| e.is("head"))
    }

    /// All elements in the document matching `pred`, in document order.
    pub fn select_all<F>(&self, pred: F) -> Vec<Element<'_>>
    where
        F: Fn(&Element<'_>) -> bool,
    {
        self.root().select_all(pred)
    }

    /// First element in document order matching `pred`.
    pub fn select_first<F>(&self, pred: F) -> Option<Element<'_>>
    where
        F: Fn(&Element<'_>) -> bool,
    {
        self.root().select_first(pred)
    }
}

/// A borrowed view of one element (or the document node).
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    tree: &'a Tree,
    id: NodeId,
}

impl PartialEq for Element<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for Element<'_> {}

impl<'a> Element<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Local tag name, empty for the document node.
    pub fn name(&self) -> &'a str {
        self.tree
            .element_name(self.id)
            .map(|n| &**n)
            .unwrap_or("")
    }

    /// Tag name test, ASCII case-insensitive.
    pub fn is(&self, tag: &str) -> bool {
        self.name().eq_ignore_ascii_case(tag)
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.tree.get_attr(self.id, name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn attr_is(&self, name: &str, value: &str) -> bool {
        self.attr(name) == Some(value)
    }

    /// Whitespace-separated class token match.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_ascii_whitespace().any(|t| t == class))
    }

    /// Substring match on the raw class attribute.
    pub fn class_contains(&self, fragment: &str) -> bool {
        self.attr("class").is_some_and(|c| c.contains(fragment))
    }

    pub fn parent(&self) -> Option<Element<'a>> {
        self.tree
            .parent(self.id)
            .filter(|&p| self.tree.is_element(p))
            .map(|id| self.at(id))
    }

    /// Element children, in order.
    pub fn children(self) -> impl Iterator<Item = Element<'a>> + 'a {
        let tree = self.tree;
        tree.children(self.id)
            .filter(move |&id| tree.is_element(id))
            .map(move |id| Element { tree, id })
    }

    /// Element descendants in document order, excluding `self`.
    pub fn descendants(self) -> impl Iterator<Item = Element<'a>> + 'a {
        let tree = self.tree;
        tree.descendants(self.id)
            .filter(move |&id| tree.is_element(id))
            .map(move |id| Element { tree, id })
    }

    /// Element siblings after this one, in document order.
    pub fn following_siblings(self) -> impl Iterator<Item = Element<'a>> + 'a {
        let tree = self.tree;
        tree.following_siblings(self.id)
            .filter(move |&id| tree.is_element(id))
            .map(move |id| Element { tree, id })
    }

    /// Nearest ancestor-or-self satisfying `pred`.
    pub fn closest<F>(&self, pred: F) -> Option<Element<'a>>
    where
        F: Fn(&Element<'a>) -> bool,
    {
        let mut current = Some(*self);
        while let Some(element) = current {
            if pred(&element) {
                return Some(element);
            }
            current = element.parent();
        }
        None
    }

    pub fn select_all<F>(&self, pred: F) -> Vec<Element<'a>>
    where
        F: Fn(&Element<'a>) -> bool,
    {
        self.descendants().filter(|e| pred(e)).collect()
    }

    pub fn select_first<F>(&self, pred: F) -> Option<Element<'a>>
    where
        F: Fn(&Element<'a>) -> bool,
    {
        self.descendants().find(|e| pred(e))
    }

    /// Direct children matching `pred`.
    pub fn select_children<F>(&self, pred: F) -> Vec<Element<'a>>
    where
        F: Fn(&Element<'a>) -> bool,
    {
        self.children().filter(|e| pred(e)).collect()
    }

    /// All descendant text concatenated, like DOM `textContent`.
    pub fn inner_text(&self) -> String {
        self.tree
            .descendants(self.id)
            .filter_map(|id| self.tree.text_content(id))
            .collect()
    }

    /// Text of the first direct text child, if any.
    pub fn first_text_child(&self) -> Option<&'a str> {
        self.tree
            .children(self.id)
            .find_map(|id| self.tree.text_content(id))
    }

    /// Descendant text with `<br>` and block boundaries rendered as newlines.
    ///
    /// Used for word counting, where `<p>one</p><p>two</p>` must not read as
    /// a single word.
    pub fn text_with_breaks(&self) -> String {
        let mut out = String::new();
        self.collect_text(self.id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        for child in self.tree.children(id) {
            if let Some(text) = self.tree.text_content(child) {
                out.push_str(text);
                continue;
            }
            let Some(name) = self.tree.element_name(child) else {
                continue;
            };
            if name.as_ref() == "br" {
                out.push('\n');
            } else if BLOCK_ELEMENTS.contains(&name.as_ref()) {
                out.push('\n');
                self.collect_text(child, out);
                out.push('\n');
            } else {
                self.collect_text(child, out);
            }
        }
    }

    fn at(&self, id: NodeId) -> Element<'a> {
        Element {
            tree: self.tree,
            id,
        }
    }
}

/// Collect matches from several scopes, dropping duplicates but keeping first-seen order.
///
/// Mirrors node-set semantics where overlapping scopes (nested containers)
/// must not count an element twice.
pub fn select_within<'a, F>(scopes: &[Element<'a>], pred: F) -> Vec<Element<'a>>
where
    F: Fn(&Element<'a>) -> bool,
{
    let mut found: Vec<Element<'a>> = Vec::new();
    for scope in scopes {
        for element in scope.descendants() {
            if pred(&element) && !found.contains(&element) {
                found.push(element);
            }
        }
    }
    found
}
