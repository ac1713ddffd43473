//! Immutable HTML trees with CSS selector queries and rewrites.
//!
//! A [`Node`] is a tag, its [`Attributes`] and a [`List`] of children. Nodes
//! never change: every operation hands back a new tree that shares whatever
//! it did not touch with the old one.
//!
//! ```
//! use hexp::{h, literal, Node};
//!
//! let page = Node::normalize(h![ul, literal![h![li, "one"], h![li, "two"]]])?;
//! let page = page.rewrite("ul li", |li: Node| li.add_class("item"))?;
//! assert_eq!(
//!     page.to_string(),
//!     "<ul><li class='item'>one</li><li class='item'>two</li></ul>"
//! );
//! # Ok::<(), hexp::Error>(())
//! ```

/// Selector syntax, parsing and matching
pub mod css;
mod dom;
pub mod error;
/// HTML output and input
pub mod html;
pub mod select;
pub mod walk;

pub use css::{parse_selector, CommaSequence};
pub use dom::{AttrCall, Attributes, Child, List, Literal, Node, Tag, TextNode, ToNode};
pub use error::{Error, Result};
pub use html::{parse_html, HtmlOptions};
pub use select::{rewrite, Converted, IntoReplacement, Matcher, PathPredicate, Predicate, Selection};
pub use walk::{MutableTreeWalk, Replacement, Visit};
