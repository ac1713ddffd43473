use super::{Child, List, Node};
#[cfg(test)]
use crate::attributes;

impl Node {
    /// A node with `child` appended to its children
    pub fn add_child(&self, child: impl Into<Child>) -> Node {
        let mut children = self.children().to_vec();
        children.push(child.into());
        self.set_children(children)
    }

    /// A node with its whole list of children replaced
    pub fn set_children(&self, children: impl Into<List>) -> Node {
        Node::with(self.tag().clone(), self.attributes().clone(), children)
    }

    pub fn map_children<F>(&self, f: F) -> Node
    where
        F: FnMut(&Child) -> Child,
    {
        self.set_children(self.children().iter().map(f).collect::<List>())
    }

    /// All text inside this node, in document order
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    pub fn is_empty(&self) -> bool {
        self.children().is_empty()
    }
}

fn collect_text(node: &Node, out: &mut String) {
    for child in node.children() {
        match child {
            Child::Element(node) => collect_text(node, out),
            Child::Text(text) => out.push_str(text),
        }
    }
}

#[cfg(test)]
#[test]
fn test_add_child() {
    let ul = Node::new("ul");
    let one = ul.add_child(Node::new("li"));
    let two = one.add_child("text");
    assert!(ul.is_empty());
    assert_eq!(one.children(), &vec![Child::from(Node::new("li"))]);
    assert_eq!(two.children().len(), 2);
    assert_eq!(two.children()[1], "text");
    assert!(two.children()[0].ptr_eq(&one.children()[0]));
}

#[cfg(test)]
#[test]
fn test_set_children_keeps_attributes() {
    let p = Node::with("p", attributes!(class => "intro"), vec![Child::from("old")]);
    let replaced = p.set_children(vec![Child::from("new")]);
    assert_eq!(replaced.attr("class"), Some("intro"));
    assert_eq!(replaced.text(), "new");
    assert_eq!(p.text(), "old");
}

#[cfg(test)]
#[test]
fn test_map_children() {
    let ul = Node::with(
        "ul",
        Default::default(),
        vec![Child::from(Node::new("li")), Child::from(" ")],
    );
    let mapped = ul.map_children(|child| match child {
        Child::Element(node) => node.add_class("item").into(),
        Child::Text(_) => child.clone(),
    });
    assert_eq!(mapped.children()[0].attributes().get("class"), Some("item"));
    assert_eq!(mapped.children()[1], " ");
}

#[cfg(test)]
#[test]
fn test_text() {
    let p = Node::with(
        "p",
        Default::default(),
        vec![
            Child::from("Hello "),
            Child::from(Node::with("em", Default::default(), vec![Child::from("big")])),
            Child::from(" world"),
        ],
    );
    assert_eq!(p.text(), "Hello big world");
    assert_eq!(Node::new("br").text(), "");
}
