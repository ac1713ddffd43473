//! Property-based tests for the tree walker and rewrite engine
//!
//! The walker rewrites a tree iteratively; these tests check it against a
//! plain recursive rewrite over generated trees.

use hexp::{parse_selector, Attributes, Child, CommaSequence, Error, MutableTreeWalk, Node};
use proptest::prelude::*;

const SELECTORS: &[&str] = &[
    "div",
    "p",
    "*",
    ".x",
    ".x.y",
    "div a",
    "p em",
    "div p a",
    "li:first-child",
    "em:last-child",
    ":empty",
    "[class~=y]",
    "div, em",
];

fn make(tag: &str, class: Option<&str>, children: Vec<Child>) -> Node {
    let mut attributes = Attributes::new();
    if let Some(class) = class {
        attributes.insert("class", class);
    }
    Node::with(tag, attributes, children)
}

fn tag_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["div", "p", "a", "em", "li"])
}

fn class() -> impl Strategy<Value = Option<&'static str>> {
    prop::option::of(prop::sample::select(vec!["x", "y", "x y"]))
}

fn text() -> impl Strategy<Value = Child> {
    "[a-z ]{0,6}".prop_map(Child::from)
}

fn tree() -> impl Strategy<Value = Node> {
    let leaf = (tag_name(), class()).prop_map(|(tag, class)| make(tag, class, Vec::new()));
    leaf.prop_recursive(4, 48, 4, |inner| {
        (
            tag_name(),
            class(),
            prop::collection::vec(prop_oneof![inner.prop_map(Child::from), text()], 0..4),
        )
            .prop_map(|(tag, class, children)| make(tag, class, children))
    })
}

fn selector() -> impl Strategy<Value = &'static str> {
    prop::sample::select(SELECTORS.to_vec())
}

/// Removes links, duplicates emphasis, wraps list items and marks the rest
fn transform(node: Node) -> Vec<Child> {
    match node.tag().as_str() {
        "a" => Vec::new(),
        "em" => vec![Child::from("*"), Child::from(node.add_class("seen"))],
        "li" => vec![Child::from(make("div", None, vec![Child::from(node)]))],
        _ => vec![Child::from(node.add_class("seen"))],
    }
}

fn recursive_rewrite<'a>(
    node: &'a Node,
    path: &mut Vec<&'a Node>,
    selector: &CommaSequence,
) -> Vec<Child> {
    path.push(node);
    let matched = selector.matches_path(path);
    let mut children = Vec::new();
    for child in node.children() {
        match child {
            Child::Element(element) => children.extend(recursive_rewrite(element, path, selector)),
            Child::Text(_) => children.push(child.clone()),
        }
    }
    path.pop();
    let rebuilt = node.set_children(children);
    if matched {
        transform(rebuilt)
    } else {
        vec![Child::Element(rebuilt)]
    }
}

fn recursive_select<'a>(
    node: &'a Node,
    path: &mut Vec<&'a Node>,
    selector: &CommaSequence,
    out: &mut Vec<Node>,
) {
    path.push(node);
    if selector.matches_path(path) {
        out.push(node.clone());
    }
    for element in node.children().iter().filter_map(Child::as_element) {
        recursive_select(element, path, selector, out);
    }
    path.pop();
}

proptest! {
    #[test]
    fn walker_rewrite_matches_recursive_rewrite(tree in tree(), selector in selector()) {
        let parsed = parse_selector(selector).unwrap();
        let expected = recursive_rewrite(&tree, &mut Vec::new(), &parsed);
        let actual = tree.rewrite(selector, transform);
        match expected.as_slice() {
            [Child::Element(root)] => prop_assert_eq!(actual, Ok(root.clone())),
            _ => prop_assert!(matches!(actual, Err(Error::Format(_)))),
        }
    }

    #[test]
    fn select_is_pre_order(tree in tree(), selector in selector()) {
        let parsed = parse_selector(selector).unwrap();
        let mut expected = Vec::new();
        recursive_select(&tree, &mut Vec::new(), &parsed, &mut expected);
        let actual: Vec<Node> = tree.select(selector).unwrap().collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn identity_rewrite_is_identity(tree in tree()) {
        prop_assert_eq!(tree.rewrite_by(|_| true, |node: Node| node), Ok(tree.clone()));
    }

    #[test]
    fn plain_walk_shares_the_tree(tree in tree()) {
        let mut walk = MutableTreeWalk::new(&tree);
        let mut visited = 0;
        while !walk.is_end() {
            visited += 1;
            walk.next().unwrap();
        }
        prop_assert!(visited >= 1);
        prop_assert!(walk.into_result().unwrap().ptr_eq(&tree));
    }

    #[test]
    fn normalize_is_idempotent(tree in tree()) {
        let once = Node::normalize(tree.to_literal()).unwrap();
        prop_assert_eq!(&once, &tree);
        let twice = Node::normalize(once.clone()).unwrap();
        prop_assert!(twice.ptr_eq(&once));
    }
}
