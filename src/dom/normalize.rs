use std::fmt;
use std::sync::Arc;

use super::{Attributes, Child, List, Node, Tag, TextNode};
use crate::error::{Error, Result};

/// Anything that knows how to present itself as a tree node. Implement this
/// for your own types to embed them in node literals.
pub trait ToNode {
    fn to_node(&self) -> Child;
}

impl ToNode for Node {
    fn to_node(&self) -> Child {
        Child::Element(self.clone())
    }
}

impl ToNode for TextNode {
    fn to_node(&self) -> Child {
        Child::Text(self.clone())
    }
}

impl ToNode for Child {
    fn to_node(&self) -> Child {
        self.clone()
    }
}

/// A loosely structured description of a tree, as accepted by
/// [`Node::normalize`]. The [`h!`](crate::h) and [`literal!`](crate::literal)
/// macros build these.
#[derive(Clone)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Number(f64),
    Str(String),
    /// An element name. A list starting with a tag is a node literal.
    Tag(Tag),
    /// Attributes, in order
    Map(Vec<(String, Literal)>),
    List(Vec<Literal>),
    Node(Node),
    Text(TextNode),
    Object(Arc<dyn ToNode + Send + Sync>),
}

impl Literal {
    pub fn object(object: impl ToNode + Send + Sync + 'static) -> Self {
        Literal::Object(Arc::new(object))
    }

    /// Whether this is a list of the form `[tag, ...]`
    pub fn is_node_literal(&self) -> bool {
        matches!(self, Literal::List(items) if starts_with_tag(items))
    }
}

fn starts_with_tag(items: &[Literal]) -> bool {
    matches!(items.first(), Some(Literal::Tag(_)))
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::Str(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::Str(s)
    }
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Number(n)
    }
}

impl From<i32> for Literal {
    fn from(n: i32) -> Self {
        Literal::Int(n.into())
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Int(n)
    }
}

impl From<usize> for Literal {
    fn from(n: usize) -> Self {
        Literal::Int(n as i64)
    }
}

impl From<Tag> for Literal {
    fn from(tag: Tag) -> Self {
        Literal::Tag(tag)
    }
}

impl From<Node> for Literal {
    fn from(node: Node) -> Self {
        Literal::Node(node)
    }
}

impl From<TextNode> for Literal {
    fn from(text: TextNode) -> Self {
        Literal::Text(text)
    }
}

impl From<Child> for Literal {
    fn from(child: Child) -> Self {
        match child {
            Child::Element(node) => Literal::Node(node),
            Child::Text(text) => Literal::Text(text),
        }
    }
}

impl From<Attributes> for Literal {
    fn from(attrs: Attributes) -> Self {
        Literal::Map(
            attrs
                .iter()
                .map(|(k, v)| (k.to_string(), Literal::from(v)))
                .collect(),
        )
    }
}

impl<T: Into<Literal>> From<Vec<T>> for Literal {
    fn from(items: Vec<T>) -> Self {
        Literal::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Literal>> From<Option<T>> for Literal {
    fn from(value: Option<T>) -> Self {
        value.map_or(Literal::Null, Into::into)
    }
}

impl fmt::Debug for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("nil"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Str(s) => write!(f, "{:?}", s),
            Literal::Tag(tag) => write!(f, "{:?}", tag),
            Literal::Map(pairs) => {
                f.write_str("{")?;
                for (i, (k, v)) in pairs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}=>{:?}", k, v)?;
                }
                f.write_str("}")
            }
            Literal::List(items) => f.debug_list().entries(items).finish(),
            Literal::Node(node) => write!(f, "{:?}", node),
            Literal::Text(text) => write!(f, "{:?}", text),
            Literal::Object(object) => write!(f, "{:?}", object.to_node()),
        }
    }
}

/// Build a node literal: `h![p, attributes!(class => "intro"), "Hello"]`
#[macro_export]
macro_rules! h {
    (@build $tag:expr $(, $rest:expr)*) => {
        $crate::Literal::List(vec![
            $crate::Literal::Tag($crate::Tag::new($tag))
            $(, $crate::Literal::from($rest))*
        ])
    };
    ($tag:ident $(, $rest:expr)* $(,)?) => {
        $crate::h!(@build stringify!($tag) $(, $rest)*)
    };
    ($tag:literal $(, $rest:expr)* $(,)?) => {
        $crate::h!(@build $tag $(, $rest)*)
    };
}

/// Build a list literal out of mixed values: `literal!["text", h![br]]`
#[macro_export]
macro_rules! literal {
    ($($item:expr),* $(,)?) => {
        $crate::Literal::List(vec![$($crate::Literal::from($item)),*])
    };
}

impl Node {
    /// Turn a loose literal into a node.
    ///
    /// A node literal is a list `[tag, attributes?, children...]`. The
    /// attributes are a `Map` in second position. Whatever follows is the
    /// children: a single list is taken as the list of children (unless it is
    /// itself a node literal), anything else is taken child by child. Strings
    /// become text, nested lists become nodes, objects are converted through
    /// [`ToNode`].
    pub fn normalize(literal: impl Into<Literal>) -> Result<Node> {
        match literal.into() {
            Literal::List(items) => normalize_triplet(items),
            Literal::Node(node) => Ok(node),
            Literal::Object(object) => match object.to_node() {
                Child::Element(node) => Ok(node),
                Child::Text(text) => Err(Error::format(format!(
                    "expected a node, but the object converted to text {:?}",
                    text
                ))),
            },
            other => Err(Error::format(format!(
                "expected a node literal, got {:?}",
                other
            ))),
        }
    }

    /// The canonical triplet `[tag, {attributes}, [children]]` of this node
    pub fn to_literal(&self) -> Literal {
        let children = self
            .children()
            .iter()
            .map(|child| match child {
                Child::Element(node) => node.to_literal(),
                Child::Text(text) => Literal::Str(text.to_string()),
            })
            .collect();
        Literal::List(vec![
            Literal::Tag(self.tag().clone()),
            self.attributes().clone().into(),
            Literal::List(children),
        ])
    }
}

impl TryFrom<Literal> for Node {
    type Error = Error;

    fn try_from(literal: Literal) -> Result<Node> {
        Node::normalize(literal)
    }
}

impl Literal {
    /// Read this literal as zero or more sibling nodes: a node literal is one
    /// node, any other list is taken item by item.
    pub fn into_children(self) -> Result<Vec<Child>> {
        match self {
            Literal::List(items) if starts_with_tag(&items) => {
                normalize_triplet(items).map(|node| vec![Child::Element(node)])
            }
            Literal::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(position, item)| normalize_child(position, item))
                .collect(),
            Literal::Str(s) => Ok(vec![Child::Text(s.into())]),
            Literal::Text(text) => Ok(vec![Child::Text(text)]),
            Literal::Node(node) => Ok(vec![Child::Element(node)]),
            Literal::Object(object) => Ok(vec![object.to_node()]),
            other => Err(Error::format(format!(
                "expected a node or a list of nodes, got {:?}",
                other
            ))),
        }
    }
}

fn normalize_triplet(items: Vec<Literal>) -> Result<Node> {
    let mut items = items.into_iter().peekable();
    let tag = match items.next() {
        Some(Literal::Tag(tag)) => tag,
        Some(Literal::Str(name)) => Tag::from(name),
        Some(other) => {
            return Err(Error::format(format!(
                "a node literal must start with a tag, got {:?}",
                other
            )))
        }
        None => return Err(Error::format("empty node literal")),
    };
    let attributes = match items.next_if(|item| matches!(item, Literal::Map(_))) {
        Some(Literal::Map(pairs)) => normalize_attributes(pairs)?,
        _ => Attributes::new(),
    };

    let mut rest: Vec<Literal> = items.collect();
    let sources = if rest.len() == 1 {
        match rest.pop() {
            Some(Literal::List(list)) if !starts_with_tag(&list) => list,
            Some(single) => vec![single],
            None => Vec::new(),
        }
    } else {
        rest
    };

    let children = sources
        .into_iter()
        .enumerate()
        .map(|(position, source)| normalize_child(position, source))
        .collect::<Result<Vec<_>>>()?;
    Ok(Node::with(tag, attributes, List::new(children)))
}

fn normalize_child(position: usize, source: Literal) -> Result<Child> {
    match source {
        Literal::Str(s) => Ok(Child::Text(s.into())),
        Literal::Text(text) => Ok(Child::Text(text)),
        Literal::Node(node) => Ok(Child::Element(node)),
        Literal::List(items) => normalize_triplet(items).map(Child::Element),
        Literal::Object(object) => Ok(object.to_node()),
        other => Err(Error::format(format!(
            "invalid value in node literal at position {}: {:?} is not a string, a node or a node literal",
            position, other
        ))),
    }
}

fn normalize_attributes(pairs: Vec<(String, Literal)>) -> Result<Attributes> {
    pairs
        .into_iter()
        .map(|(name, value)| {
            let value = match value {
                Literal::Null => String::new(),
                Literal::Bool(b) => b.to_string(),
                Literal::Int(n) => n.to_string(),
                Literal::Number(n) => n.to_string(),
                Literal::Str(s) => s,
                Literal::Tag(tag) => tag.to_string(),
                Literal::Text(text) => text.to_string(),
                other => {
                    return Err(Error::format(format!(
                        "attribute {:?} must have a scalar value, got {:?}",
                        name, other
                    )))
                }
            };
            Ok((name, value))
        })
        .collect()
}
