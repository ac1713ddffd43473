use lazy_static::lazy_static;
use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::error::{Error, Result};

mod attributes;
mod children;
mod normalize;
mod pp;

pub use attributes::{AttrCall, Attributes};
pub use normalize::{Literal, ToNode};

lazy_static! {
    static ref EMPTY_LIST: List = List(Arc::from(Vec::new()));
}

static EMPTY_ATTRIBUTES: Attributes = Attributes::new();

/// The name of an element, e.g. `div`. Clones share the same allocation.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(Arc<str>);

impl Tag {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Tag {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Tag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        Tag::new(name)
    }
}

impl From<String> for Tag {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl PartialEq<str> for Tag {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Tag {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}

/// An HTML element: a tag, its attributes and its children.
///
/// Nodes are immutable. Every operation that "changes" a node returns a new
/// one; untouched subtrees are shared between the old and the new tree.
#[derive(Clone, PartialEq, Eq)]
pub struct Node(Arc<NodeData>);

#[derive(PartialEq, Eq)]
struct NodeData {
    tag: Tag,
    attributes: Attributes,
    children: List,
}

impl Node {
    /// An element without attributes or children
    pub fn new(tag: impl Into<Tag>) -> Self {
        Self::with(tag, Attributes::new(), List::empty())
    }

    /// Build a node from its canonical triplet
    pub fn with(tag: impl Into<Tag>, attributes: Attributes, children: impl Into<List>) -> Self {
        Self(Arc::new(NodeData {
            tag: tag.into(),
            attributes,
            children: children.into(),
        }))
    }

    pub fn tag(&self) -> &Tag {
        &self.0.tag
    }

    pub fn attributes(&self) -> &Attributes {
        &self.0.attributes
    }

    pub fn children(&self) -> &List {
        &self.0.children
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.0.tag == tag
    }

    pub fn is_text(&self) -> bool {
        false
    }

    /// A node with the same attributes and children but a different tag
    pub fn set_tag(&self, tag: impl Into<Tag>) -> Node {
        Node::with(tag, self.attributes().clone(), self.children().clone())
    }

    /// Whether both handles point at the very same node, rather than merely equal ones
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Feed this node through a chain of processors, each receiving the output of the previous one
    pub fn process<I, F>(&self, processors: I) -> Node
    where
        I: IntoIterator<Item = F>,
        F: FnOnce(Node) -> Node,
    {
        processors
            .into_iter()
            .fold(self.clone(), |node, processor| processor(node))
    }
}

/// A run of text inside an element
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TextNode(Arc<str>);

impl TextNode {
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(Arc::from(text.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Text has no tag
    pub fn tag(&self) -> Option<&Tag> {
        None
    }

    pub fn attributes(&self) -> &'static Attributes {
        &EMPTY_ATTRIBUTES
    }

    pub fn children(&self) -> &'static List {
        &EMPTY_LIST
    }

    pub fn attr(&self, _name: &str) -> Option<&str> {
        None
    }

    /// Text cannot carry attributes, so this always fails
    pub fn set_attr(&self, name: &str, _value: impl ToString) -> Result<Node> {
        Err(Error::illegal_request(format!(
            "cannot set attribute {:?} on text node {:?}",
            name,
            self.as_str()
        )))
    }

    pub fn is_text(&self) -> bool {
        true
    }
}

impl Deref for TextNode {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TextNode {
    fn from(text: &str) -> Self {
        TextNode::new(text)
    }
}

impl From<String> for TextNode {
    fn from(text: String) -> Self {
        Self(Arc::from(text))
    }
}

impl PartialEq<str> for TextNode {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for TextNode {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

/// One entry in a list of children
#[derive(Clone, PartialEq, Eq)]
pub enum Child {
    Element(Node),
    Text(TextNode),
}

impl Child {
    pub fn as_element(&self) -> Option<&Node> {
        match self {
            Child::Element(node) => Some(node),
            Child::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            Child::Element(_) => None,
            Child::Text(text) => Some(text),
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Child::Text(_))
    }

    pub fn tag(&self) -> Option<&Tag> {
        self.as_element().map(Node::tag)
    }

    pub fn attributes(&self) -> &Attributes {
        match self {
            Child::Element(node) => node.attributes(),
            Child::Text(text) => text.attributes(),
        }
    }

    pub fn children(&self) -> &List {
        match self {
            Child::Element(node) => node.children(),
            Child::Text(text) => text.children(),
        }
    }

    /// All text of this child and its descendants
    pub fn text(&self) -> String {
        match self {
            Child::Element(node) => node.text(),
            Child::Text(text) => text.to_string(),
        }
    }

    /// Whether both handles point at the very same node
    pub fn ptr_eq(&self, other: &Child) -> bool {
        match (self, other) {
            (Child::Element(a), Child::Element(b)) => a.ptr_eq(b),
            (Child::Text(a), Child::Text(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => false,
        }
    }
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Element(node)
    }
}

impl From<TextNode> for Child {
    fn from(text: TextNode) -> Self {
        Child::Text(text)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(text.into())
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text.into())
    }
}

impl PartialEq<Node> for Child {
    fn eq(&self, other: &Node) -> bool {
        self.as_element() == Some(other)
    }
}

impl PartialEq<&str> for Child {
    fn eq(&self, other: &&str) -> bool {
        matches!(self, Child::Text(text) if text == other)
    }
}

/// An immutable, ordered list of children
#[derive(Clone)]
pub struct List(Arc<[Child]>);

impl List {
    pub fn new(children: Vec<Child>) -> Self {
        if children.is_empty() {
            return List::empty();
        }
        Self(Arc::from(children))
    }

    pub fn empty() -> Self {
        EMPTY_LIST.clone()
    }

    /// Stricter than `==`: both lists hold the very same child nodes, not
    /// merely equal ones. Structural sharing after a rewrite shows up here.
    pub fn same_repr(&self, other: &List) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.len() == other.len()
                && self.iter().zip(other.iter()).all(|(a, b)| a.ptr_eq(b)))
    }

    pub fn to_vec(&self) -> Vec<Child> {
        self.0.to_vec()
    }
}

impl Deref for List {
    type Target = [Child];
    fn deref(&self) -> &[Child] {
        &self.0
    }
}

impl PartialEq for List {
    fn eq(&self, other: &List) -> bool {
        self.0 == other.0
    }
}

impl Eq for List {}

impl PartialEq<[Child]> for List {
    fn eq(&self, other: &[Child]) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<Vec<Child>> for List {
    fn eq(&self, other: &Vec<Child>) -> bool {
        &*self.0 == other.as_slice()
    }
}

impl From<Vec<Child>> for List {
    fn from(children: Vec<Child>) -> Self {
        List::new(children)
    }
}

impl FromIterator<Child> for List {
    fn from_iter<I: IntoIterator<Item = Child>>(iter: I) -> Self {
        List::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Child;
    type IntoIter = std::slice::Iter<'a, Child>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
