//! Querying and rewriting trees with selectors or predicates

use std::sync::Arc;

use tracing::{debug, span, Level};

use crate::css::{parse_selector, CommaSequence};
use crate::dom::{Attributes, Child, Literal, Node, Tag, TextNode, ToNode};
use crate::error::{Error, Result};
use crate::walk::{MutableTreeWalk, Replacement, Visit};

#[cfg(test)]
mod tests;

/// Decides whether the last node of a path is selected. The path runs from
/// the root of the tree down to that node.
pub trait Matcher {
    fn matches_path(&self, path: &[&Node]) -> bool;
}

impl Matcher for CommaSequence {
    fn matches_path(&self, path: &[&Node]) -> bool {
        CommaSequence::matches_path(self, path)
    }
}

impl<M: Matcher + ?Sized> Matcher for &M {
    fn matches_path(&self, path: &[&Node]) -> bool {
        (**self).matches_path(path)
    }
}

/// Select nodes with a closure that only looks at the node itself
#[derive(Debug, Clone, Copy)]
pub struct Predicate<F>(pub F);

impl<F: Fn(&Node) -> bool> Matcher for Predicate<F> {
    fn matches_path(&self, path: &[&Node]) -> bool {
        path.last().map_or(false, |node| (self.0)(node))
    }
}

/// Select nodes with a closure that sees the whole path
#[derive(Debug, Clone, Copy)]
pub struct PathPredicate<F>(pub F);

impl<F: Fn(&[&Node]) -> bool> Matcher for PathPredicate<F> {
    fn matches_path(&self, path: &[&Node]) -> bool {
        (self.0)(path)
    }
}

/// What a rewrite callback may answer with
pub trait IntoReplacement {
    fn into_replacement(self) -> Result<Replacement>;
}

impl IntoReplacement for Replacement {
    fn into_replacement(self) -> Result<Replacement> {
        Ok(self)
    }
}

impl IntoReplacement for Node {
    fn into_replacement(self) -> Result<Replacement> {
        Ok(self.into())
    }
}

impl IntoReplacement for TextNode {
    fn into_replacement(self) -> Result<Replacement> {
        Ok(self.into())
    }
}

impl IntoReplacement for Child {
    fn into_replacement(self) -> Result<Replacement> {
        Ok(self.into())
    }
}

impl IntoReplacement for String {
    fn into_replacement(self) -> Result<Replacement> {
        Ok(TextNode::from(self).into())
    }
}

impl IntoReplacement for &str {
    fn into_replacement(self) -> Result<Replacement> {
        Ok(TextNode::from(self).into())
    }
}

/// A value of a user type, converted with its [`ToNode`] impl
#[derive(Debug, Clone, Copy)]
pub struct Converted<T>(pub T);

impl<T: ToNode> IntoReplacement for Converted<T> {
    fn into_replacement(self) -> Result<Replacement> {
        Ok(self.0.to_node().into())
    }
}

impl IntoReplacement for Arc<dyn ToNode + Send + Sync> {
    fn into_replacement(self) -> Result<Replacement> {
        Ok(self.to_node().into())
    }
}

impl IntoReplacement for Literal {
    fn into_replacement(self) -> Result<Replacement> {
        self.into_children().map(Replacement)
    }
}

/// Every item is converted and the results are spliced in order
impl<T: IntoReplacement> IntoReplacement for Vec<T> {
    fn into_replacement(self) -> Result<Replacement> {
        let mut children = Vec::new();
        for item in self {
            children.extend(item.into_replacement()?.into_children());
        }
        Ok(Replacement(children))
    }
}

/// `None` is an error. Leave a node alone by not selecting it.
impl<T: IntoReplacement> IntoReplacement for Option<T> {
    fn into_replacement(self) -> Result<Replacement> {
        match self {
            Some(value) => value.into_replacement(),
            None => Err(Error::format(
                "a rewrite must return a node or a list of nodes, got nothing",
            )),
        }
    }
}

impl<T: IntoReplacement> IntoReplacement for Result<T> {
    fn into_replacement(self) -> Result<Replacement> {
        self.and_then(IntoReplacement::into_replacement)
    }
}

/// The nodes of a tree picked by a matcher, in document order.
///
/// The walk happens lazily as the iterator is advanced, and only once.
pub struct Selection<'a, M> {
    walk: MutableTreeWalk<'a>,
    matcher: M,
}

impl<'a, M: Matcher> Selection<'a, M> {
    pub fn new(root: &'a Node, matcher: M) -> Self {
        Self {
            walk: MutableTreeWalk::new(root),
            matcher,
        }
    }

    /// A copy of the whole tree with every selected node replaced by what
    /// `callback` returns for it
    pub fn rewrite<F, R>(self, callback: F) -> Result<Node>
    where
        F: FnMut(Node) -> R,
        R: IntoReplacement,
    {
        rewrite(self.walk.root(), &self.matcher, callback)
    }

    /// Wrap every selected node in a new `tag` element
    pub fn wrap(self, tag: impl Into<Tag>, attributes: Attributes) -> Result<Node> {
        let tag = tag.into();
        self.rewrite(|node| Node::with(tag.clone(), attributes.clone(), vec![Child::Element(node)]))
    }

    pub fn set_attr(self, name: &str, value: impl ToString) -> Result<Node> {
        let value = value.to_string();
        self.rewrite(|node| node.set_attr(name, &value))
    }

    pub fn add_class(self, class: &str) -> Result<Node> {
        self.rewrite(|node| node.add_class(class))
    }

    pub fn remove_class(self, class: &str) -> Result<Node> {
        self.rewrite(|node| node.remove_class(class))
    }

    /// Drop every selected node, along with everything inside it
    pub fn remove(self) -> Result<Node> {
        self.rewrite(|_| Replacement::none())
    }
}

impl<'a, M: Matcher> Iterator for Selection<'a, M> {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        loop {
            let visit = self.walk.current()?;
            let selected = match visit {
                Visit::Element(node) if self.matcher.matches_path(self.walk.path()) => Some(node),
                _ => None,
            };
            self.walk.next().ok()?;
            if let Some(node) = selected {
                return Some(node.clone());
            }
        }
    }
}

/// Rewrite every node of `root` selected by `matcher`.
///
/// Nodes are handed to `callback` bottom-up: by the time a node is passed in,
/// its own selected descendants have already been rewritten. Whether a node
/// is selected is decided on the original tree.
pub fn rewrite<M, F, R>(root: &Node, matcher: &M, mut callback: F) -> Result<Node>
where
    M: Matcher + ?Sized,
    F: FnMut(Node) -> R,
    R: IntoReplacement,
{
    let span = span!(Level::DEBUG, "rewrite", root = %root.tag());
    let _enter = span.enter();

    let mut matched = 0;
    let mut walk = MutableTreeWalk::with_rewriter(root, |node| callback(node).into_replacement());
    while let Some(visit) = walk.current() {
        if !visit.is_text() && matcher.matches_path(walk.path()) {
            matched += 1;
            walk.rewrite_current()?;
        }
        walk.next()?;
    }
    debug!(matched, "rewrite done");
    walk.into_result()
        .ok_or_else(|| Error::illegal_request("the walk stopped before the end of the tree"))
}

impl Node {
    /// All nodes matching a CSS selector, the root included
    pub fn select(&self, selector: &str) -> Result<Selection<'_, CommaSequence>> {
        Ok(Selection::new(self, parse_selector(selector)?))
    }

    /// All nodes for which `predicate` holds
    pub fn select_by<F>(&self, predicate: F) -> Selection<'_, Predicate<F>>
    where
        F: Fn(&Node) -> bool,
    {
        Selection::new(self, Predicate(predicate))
    }

    pub fn select_matching<M: Matcher>(&self, matcher: M) -> Selection<'_, M> {
        Selection::new(self, matcher)
    }

    /// Replace every node matching a CSS selector by what `callback` returns
    pub fn rewrite<F, R>(&self, selector: &str, callback: F) -> Result<Node>
    where
        F: FnMut(Node) -> R,
        R: IntoReplacement,
    {
        rewrite(self, &parse_selector(selector)?, callback)
    }

    pub fn rewrite_by<P, F, R>(&self, predicate: P, callback: F) -> Result<Node>
    where
        P: Fn(&Node) -> bool,
        F: FnMut(Node) -> R,
        R: IntoReplacement,
    {
        rewrite(self, &Predicate(predicate), callback)
    }

    pub fn rewrite_matching<M, F, R>(&self, matcher: &M, callback: F) -> Result<Node>
    where
        M: Matcher + ?Sized,
        F: FnMut(Node) -> R,
        R: IntoReplacement,
    {
        rewrite(self, matcher, callback)
    }

    /// Rewrite every node below this one, text included, bottom-up.
    ///
    /// The callback gets the (already rewritten) child and its original
    /// parent. `None` keeps the child as it is.
    pub fn rewrite_children<F, R>(&self, mut callback: F) -> Result<Node>
    where
        F: FnMut(&Child, &Node) -> Option<R>,
        R: IntoReplacement,
    {
        rewrite_below(self, &mut callback)
    }
}

fn rewrite_below<F, R>(node: &Node, callback: &mut F) -> Result<Node>
where
    F: FnMut(&Child, &Node) -> Option<R>,
    R: IntoReplacement,
{
    let mut children = Vec::with_capacity(node.children().len());
    for child in node.children() {
        let child = match child {
            Child::Element(element) => Child::Element(rewrite_below(element, callback)?),
            Child::Text(_) => child.clone(),
        };
        match callback(&child, node) {
            Some(response) => children.extend(response.into_replacement()?.into_children()),
            None => children.push(child),
        }
    }
    Ok(node.set_children(children))
}
