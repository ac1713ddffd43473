use std::ptr;

use super::*;
use crate::dom::{Child, Node};

impl AttributeOperator {
    /// Compare the value an element carries against the one in the selector
    pub fn test(&self, actual: &str, expected: &str) -> bool {
        match self {
            AttributeOperator::Exists => true,
            AttributeOperator::Equal => actual == expected,
            AttributeOperator::Includes => actual.split_whitespace().any(|token| token == expected),
            AttributeOperator::DashMatch => {
                actual == expected
                    || actual
                        .strip_prefix(expected)
                        .map_or(false, |rest| rest.starts_with('-'))
            }
            AttributeOperator::PrefixMatch => actual.starts_with(expected),
            AttributeOperator::SuffixMatch => actual.ends_with(expected),
            AttributeOperator::SubstringMatch => actual.contains(expected),
        }
    }
}

impl Attribute {
    pub fn matches(&self, node: &Node) -> bool {
        let actual = match self.namespace.as_deref() {
            None | Some("*") => node.attr(&self.name),
            Some(ns) => node.attr(&format!("{}:{}", ns, self.name)),
        };
        match actual {
            None => false,
            Some(actual) if self.ignores_case() => self
                .operator
                .test(&actual.to_ascii_lowercase(), &self.value.to_ascii_lowercase()),
            Some(actual) => self.operator.test(actual, &self.value),
        }
    }
}

impl PseudoClass {
    /// Needs the path because `:first-child` and `:last-child` look at the
    /// parent. The root has no parent, so it is neither.
    pub fn matches_path(&self, path: &[&Node]) -> bool {
        let (node, parent) = match path {
            [] => return false,
            [node] => (*node, None),
            [.., parent, node] => (*node, Some(*parent)),
        };
        self.0.iter().all(|kind| match kind {
            PseudoClassKind::FirstChild => parent
                .and_then(|p| p.children().first())
                .map_or(false, |first| is_slot_of(first, node)),
            PseudoClassKind::LastChild => parent
                .and_then(|p| p.children().last())
                .map_or(false, |last| is_slot_of(last, node)),
            PseudoClassKind::Empty => node.is_empty(),
        })
    }
}

/// Identity, not equality: `node` must live in this very slot of the parent
fn is_slot_of(child: &Child, node: &Node) -> bool {
    matches!(child, Child::Element(element) if ptr::eq(element, node))
}

impl SimpleSelector {
    /// Match a node on its own. Pseudo-classes see a path without a parent.
    pub fn matches(&self, node: &Node) -> bool {
        match self {
            SimpleSelector::Element(name) => node.tag() == name.as_str(),
            SimpleSelector::Universal => true,
            SimpleSelector::Class(name) => node.has_class(name),
            SimpleSelector::Id(name) => node.attr("id") == Some(name.as_str()),
            SimpleSelector::Attribute(attr) => attr.matches(node),
            SimpleSelector::PseudoClass(pseudo) => pseudo.matches_path(&[node]),
        }
    }

    /// Match the last node of `path`
    pub fn matches_path(&self, path: &[&Node]) -> bool {
        match (self, path.last()) {
            (_, None) => false,
            (SimpleSelector::PseudoClass(pseudo), Some(_)) => pseudo.matches_path(path),
            (_, Some(node)) => self.matches(node),
        }
    }
}

impl SimpleSequence {
    pub fn matches(&self, node: &Node) -> bool {
        self.0.iter().all(|simple| simple.matches(node))
    }

    pub fn matches_path(&self, path: &[&Node]) -> bool {
        self.0.iter().all(|simple| simple.matches_path(path))
    }
}

impl Sequence {
    /// The last compound must match the last node of `path`, and every
    /// compound before it some ancestor, in order.
    ///
    /// Each compound takes the nearest ancestor it matches. Taking a nearer
    /// one never rules out a match further up, so no backtracking is needed.
    pub fn matches_path(&self, path: &[&Node]) -> bool {
        let (last, ancestors) = match self.0.split_last() {
            Some(split) => split,
            None => return false,
        };
        if path.is_empty() || !last.matches_path(path) {
            return false;
        }
        let mut depth = path.len() - 1;
        for compound in ancestors.iter().rev() {
            loop {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
                if compound.matches_path(&path[..=depth]) {
                    break;
                }
            }
        }
        true
    }
}

impl CommaSequence {
    pub fn matches_path(&self, path: &[&Node]) -> bool {
        self.0.iter().any(|sequence| sequence.matches_path(path))
    }

    /// Match a node without knowing its ancestors. Only the alternatives made
    /// of a single compound can match.
    pub fn matches(&self, node: &Node) -> bool {
        self.0.iter().any(|sequence| match sequence.0.as_slice() {
            [compound] => compound.matches(node),
            _ => false,
        })
    }
}
