use lazy_static::lazy_static;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{span, Level};

use crate::dom::{Child, List, Node, Tag};

mod parsing;
#[cfg(test)]
mod tests;

pub use parsing::parse_html;

pub const DOCTYPE: &str = "<!DOCTYPE html>";

lazy_static! {
    /// Tags whose text is written out as is
    static ref NO_ESCAPE_TAGS: BTreeSet<Tag> = ["script", "style"].into_iter().map(Tag::from).collect();
}

/// Settings for turning a tree into HTML
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlOptions {
    include_doctype: bool,
    encoding: String,
    no_escape_tags: BTreeSet<Tag>,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            include_doctype: true,
            encoding: "UTF-8".to_string(),
            no_escape_tags: NO_ESCAPE_TAGS.clone(),
        }
    }
}

impl HtmlOptions {
    /// Options for rendering a piece of a document: no doctype
    pub fn fragment() -> Self {
        Self::default().include_doctype(false)
    }

    pub fn include_doctype(mut self, include: bool) -> Self {
        self.include_doctype = include;
        self
    }

    /// The charset declared in the `head` of a full document. The output
    /// itself is always a UTF-8 `String`.
    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn no_escape_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Tag>,
    {
        self.no_escape_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn doctype(&self) -> bool {
        self.include_doctype
    }

    pub fn charset(&self) -> &str {
        &self.encoding
    }

    pub fn escapes(&self, tag: &Tag) -> bool {
        !self.no_escape_tags.contains(tag)
    }
}

/// Escape the text content of an element
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#x27;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Escape a value for use between single quotes
pub fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('\'', "&#x27;")
}

/// Write `node` and everything below it. The doctype is never written here.
pub fn write_html<W: fmt::Write>(out: &mut W, node: &Node, options: &HtmlOptions) -> fmt::Result {
    write!(out, "<{}", node.tag())?;
    for (name, value) in node.attributes().iter() {
        write!(out, " {}='{}'", name, escape_attr(value))?;
    }
    out.write_char('>')?;
    let escape = options.escapes(node.tag());
    for child in node.children() {
        match child {
            Child::Element(element) => write_html(out, element, options)?,
            Child::Text(text) if escape => out.write_str(&escape_text(text))?,
            Child::Text(text) => out.write_str(text)?,
        }
    }
    write!(out, "</{}>", node.tag())
}

impl Node {
    pub fn to_html(&self, options: &HtmlOptions) -> String {
        let span = span!(Level::DEBUG, "to_html", tag = %self.tag());
        let _enter = span.enter();

        let mut out = String::new();
        let node = if options.doctype() {
            out.push_str(DOCTYPE);
            with_charset_meta(self, options.charset())
        } else {
            self.clone()
        };
        let _ = write_html(&mut out, &node, options);
        out
    }
}

/// Declare `charset` at the start of the document's `head`, unless a
/// `<meta charset>` is already there. Other trees come back unchanged.
fn with_charset_meta(document: &Node, charset: &str) -> Node {
    if !document.is_tag("html") {
        return document.clone();
    }
    document.map_children(|child| match child {
        Child::Element(head) if head.is_tag("head") && !declares_charset(head) => {
            let meta = Node::new("meta").set_attr("charset", charset);
            let children: List = std::iter::once(Child::from(meta))
                .chain(head.children().iter().cloned())
                .collect();
            Child::from(head.set_children(children))
        }
        child => child.clone(),
    })
}

fn declares_charset(head: &Node) -> bool {
    head.children()
        .iter()
        .filter_map(Child::as_element)
        .any(|child| child.is_tag("meta") && child.has_attr("charset"))
}

impl Child {
    /// Text on its own is always escaped, there is no enclosing tag to exempt it
    pub fn to_html(&self, options: &HtmlOptions) -> String {
        match self {
            Child::Element(node) => node.to_html(options),
            Child::Text(text) => escape_text(text),
        }
    }
}

/// The HTML of the node, without a doctype
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_html(f, self, &HtmlOptions::fragment())
    }
}
