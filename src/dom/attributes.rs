use std::fmt;

use super::Node;
#[cfg(test)]
use super::List;
use crate::error::{Error, Result};

/// Attribute map of a node. Keys are unique and keep their insertion order,
/// which is the order they are serialized in; equality ignores that order.
#[derive(Clone, Default)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(key, _)| key == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set `name`, keeping its original position if it was already present
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let (name, value) = (name.into(), value.into());
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.0.iter().position(|(key, _)| key == name)?;
        Some(self.0.remove(idx).1)
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Attributes) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Eq for Attributes {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.insert(k, v);
        }
        attrs
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Attributes {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:?}=>{:?}", k, v)?;
        }
        f.write_str("}")
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __attribute_name {
    ($name:ident) => {
        stringify!($name)
    };
    ($name:literal) => {
        $name
    };
}

/// Build an [`Attributes`] map: `attributes!(class => "big", "data-id" => 7)`
#[macro_export]
macro_rules! attributes {
    ($($name:tt => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut attrs = $crate::Attributes::new();
        $(attrs.insert($crate::__attribute_name!($name), $value.to_string());)*
        attrs
    }};
}

/// What [`Node::attr_args`] produced
#[derive(Debug, Clone, PartialEq)]
pub enum AttrCall<'a> {
    /// A single name was given: the current value
    Value(Option<&'a str>),
    /// A name and value were given: the updated node
    Updated(Node),
}

impl Node {
    /// Value of an attribute
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes().get(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes().contains(name)
    }

    /// A node with `name` set to `value`
    pub fn set_attr(&self, name: &str, value: impl ToString) -> Node {
        let mut attrs = self.attributes().clone();
        attrs.insert(name, value.to_string());
        Node::with(self.tag().clone(), attrs, self.children().clone())
    }

    /// A node with `name` removed
    pub fn remove_attr(&self, name: &str) -> Node {
        if !self.has_attr(name) {
            return self.clone();
        }
        let mut attrs = self.attributes().clone();
        attrs.remove(name);
        Node::with(self.tag().clone(), attrs, self.children().clone())
    }

    /// Set or remove an attribute; `None` removes it
    pub fn update_attr(&self, name: &str, value: Option<impl ToString>) -> Node {
        match value {
            Some(value) => self.set_attr(name, value),
            None => self.remove_attr(name),
        }
    }

    /// Positional attribute accessor for callers that hold their arguments in
    /// a list: `[name]` reads, `[name, value]` sets (or removes, when the
    /// value is `None`). Any other number of arguments is an error.
    pub fn attr_args(&self, args: &[Option<&str>]) -> Result<AttrCall<'_>> {
        match args {
            [Some(name)] => Ok(AttrCall::Value(self.attr(name))),
            [Some(name), value] => Ok(AttrCall::Updated(self.update_attr(name, *value))),
            [None] | [None, _] => Err(Error::illegal_request("attribute name must not be nil")),
            _ => Err(Error::Arity {
                expected: "1..2",
                got: args.len(),
            }),
        }
    }

    /// Replace all attributes at once
    pub fn set_attrs(&self, attrs: Attributes) -> Node {
        Node::with(self.tag().clone(), attrs, self.children().clone())
    }

    /// Merge attributes into this node. Class lists are merged, any other
    /// attribute is overwritten.
    pub fn merge_attrs(&self, attrs: &Attributes) -> Node {
        attrs.iter().fold(self.clone(), |node, (name, value)| {
            if name == "class" {
                node.add_class(value)
            } else {
                node.set_attr(name, value)
            }
        })
    }

    /// The tokens of the `class` attribute, in order
    pub fn class_list(&self) -> Vec<&str> {
        self.attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Check if the `class` attribute is present and contains the specified class
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Append the given class (or whitespace separated classes) to the class list.
    /// Classes that are already present are not repeated.
    pub fn add_class(&self, class: &str) -> Node {
        let mut list: Vec<&str> = self.class_list();
        let before = list.len();
        for token in class.split_whitespace() {
            if !list.contains(&token) {
                list.push(token);
            }
        }
        if list.len() == before && self.has_attr("class") {
            return self.clone();
        }
        self.set_attr("class", list.join(" "))
    }

    /// Remove every occurrence of `class`. When no class is left the
    /// attribute is dropped altogether.
    pub fn remove_class(&self, class: &str) -> Node {
        if !self.has_attr("class") {
            return self.clone();
        }
        let list: Vec<&str> = self
            .class_list()
            .into_iter()
            .filter(|c| *c != class)
            .collect();
        if list.is_empty() {
            self.remove_attr("class")
        } else {
            self.set_attr("class", list.join(" "))
        }
    }
}

#[cfg(test)]
#[test]
fn test_attributes_equality_ignores_order() {
    let a = attributes!(class => "foo", id => "bar");
    let b = attributes!(id => "bar", class => "foo");
    assert_eq!(a, b);
    assert_eq!(a.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec!["class", "id"]);
    assert_ne!(a, attributes!(class => "foo"));
}

#[cfg(test)]
#[test]
fn test_insert_keeps_position() {
    let mut attrs = attributes!(href => "/", "data-id" => 7, title => "home");
    attrs.insert("data-id", "8");
    assert_eq!(
        attrs.iter().collect::<Vec<_>>(),
        vec![("href", "/"), ("data-id", "8"), ("title", "home")]
    );
}

#[cfg(test)]
#[test]
fn test_attr_args() {
    let div = Node::with("div", attributes!(class => "foo"), List::empty());
    assert_eq!(div.attr_args(&[Some("class")]), Ok(AttrCall::Value(Some("foo"))));
    assert_eq!(
        div.attr_args(&[Some("data-id"), Some("7")]),
        Ok(AttrCall::Updated(Node::with(
            "div",
            attributes!(class => "foo", "data-id" => "7"),
            List::empty()
        )))
    );
    assert_eq!(
        div.attr_args(&[Some("class"), None]),
        Ok(AttrCall::Updated(Node::new("div")))
    );
    assert_eq!(
        div.attr_args(&[Some("class"), Some("baz"), Some("bar")]),
        Err(Error::Arity {
            expected: "1..2",
            got: 3
        })
    );
    assert_eq!(
        div.attr_args(&[]),
        Err(Error::Arity {
            expected: "1..2",
            got: 0
        })
    );
}

#[cfg(test)]
#[test]
fn test_has_class() {
    let p = Node::with("p", attributes!(class => "banner strong"), List::empty());
    assert!(p.has_class("strong"));
    assert!(!p.has_class("stron"));
    assert!(!p.has_class("er str"));
    assert!(!Node::new("p").has_class("strong"));
}

#[cfg(test)]
#[test]
fn test_add_and_remove_class() {
    let div = Node::new("div");
    let foo = div.add_class("foo");
    assert_eq!(foo, Node::with("div", attributes!(class => "foo"), List::empty()));
    assert_eq!(div, Node::new("div"));

    let both = foo.add_class("bar").add_class("foo");
    assert_eq!(both.attr("class"), Some("foo bar"));
    assert_eq!(both.class_list(), vec!["foo", "bar"]);

    assert_eq!(both.remove_class("foo").attr("class"), Some("bar"));
    assert_eq!(both.remove_class("foo").remove_class("bar"), Node::new("div"));
    assert_eq!(div.remove_class("foo"), div);

    let empty = Node::with("div", attributes!(class => ""), List::empty());
    assert!(!empty.remove_class("foo").has_attr("class"));
}

#[cfg(test)]
#[test]
fn test_merge_attrs() {
    let a = Node::with("a", attributes!(class => "link", href => "/"), List::empty());
    let merged = a.merge_attrs(&attributes!(class => "active", href => "/home", rel => "next"));
    assert_eq!(
        merged,
        Node::with(
            "a",
            attributes!(class => "link active", href => "/home", rel => "next"),
            List::empty()
        )
    );
}
