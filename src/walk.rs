//! Depth-first walk over a tree that can queue replacements as it goes.
//!
//! The walker keeps one frame per depth. Each frame remembers which of its
//! children have been replaced; a parent is rebuilt only once, when the walk
//! leaves it, and only if something below it changed.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::dom::{Child, Node, TextNode};
use crate::error::{Error, Result};

/// The node a walk is currently at
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Visit<'a> {
    Element(&'a Node),
    Text(&'a TextNode),
}

impl<'a> Visit<'a> {
    pub fn as_element(&self) -> Option<&'a Node> {
        match *self {
            Visit::Element(node) => Some(node),
            Visit::Text(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Visit::Text(_))
    }

    pub fn to_child(&self) -> Child {
        match *self {
            Visit::Element(node) => Child::Element(node.clone()),
            Visit::Text(text) => Child::Text(text.clone()),
        }
    }
}

impl<'a> From<&'a Child> for Visit<'a> {
    fn from(child: &'a Child) -> Self {
        match child {
            Child::Element(node) => Visit::Element(node),
            Child::Text(text) => Visit::Text(text),
        }
    }
}

/// What a node is replaced with: zero, one or more siblings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Replacement(pub Vec<Child>);

impl Replacement {
    /// Remove the node
    pub fn none() -> Self {
        Self(Vec::new())
    }

    pub fn into_children(self) -> Vec<Child> {
        self.0
    }
}

impl From<Node> for Replacement {
    fn from(node: Node) -> Self {
        Self(vec![Child::Element(node)])
    }
}

impl From<TextNode> for Replacement {
    fn from(text: TextNode) -> Self {
        Self(vec![Child::Text(text)])
    }
}

impl From<Child> for Replacement {
    fn from(child: Child) -> Self {
        Self(vec![child])
    }
}

impl From<Vec<Child>> for Replacement {
    fn from(children: Vec<Child>) -> Self {
        Self(children)
    }
}

impl From<Vec<Node>> for Replacement {
    fn from(nodes: Vec<Node>) -> Self {
        Self(nodes.into_iter().map(Child::Element).collect())
    }
}

enum Pending {
    /// Put these children in place of the node
    Replace(Vec<Child>),
    /// Give the node to the rewriter once its subtree is done
    Rewrite,
}

struct Frame<'a> {
    node: Visit<'a>,
    /// Position among the parent's children
    index: usize,
    /// Requests for this node's children, by index
    pending: BTreeMap<usize, Pending>,
}

type Rewriter<'a> = Box<dyn FnMut(Node) -> Result<Replacement> + 'a>;

/// An explicit-stack pre-order walk over a tree, visiting elements and text.
///
/// ```
/// use hexp::{h, literal, MutableTreeWalk, Node, Visit};
///
/// let tree = Node::normalize(h![ul, literal![h![li, "a"], h![li, "b"]]]).unwrap();
/// let mut walk = MutableTreeWalk::new(&tree);
/// let mut tags = vec![];
/// while let Some(visit) = walk.current() {
///     if let Visit::Element(node) = visit {
///         tags.push(node.tag().to_string());
///     }
///     walk.next().unwrap();
/// }
/// assert_eq!(tags, ["ul", "li", "li"]);
/// ```
pub struct MutableTreeWalk<'a> {
    root: &'a Node,
    frames: Vec<Frame<'a>>,
    /// The elements of `frames`, root first
    path: Vec<&'a Node>,
    root_pending: Option<Pending>,
    rewriter: Option<Rewriter<'a>>,
    result: Option<Node>,
}

impl<'a> MutableTreeWalk<'a> {
    pub fn new(root: &'a Node) -> Self {
        Self {
            root,
            frames: vec![Frame {
                node: Visit::Element(root),
                index: 0,
                pending: BTreeMap::new(),
            }],
            path: vec![root],
            root_pending: None,
            rewriter: None,
            result: None,
        }
    }

    /// A walk whose [`rewrite_current`](Self::rewrite_current) hands nodes
    /// to `rewriter`
    pub fn with_rewriter<F>(root: &'a Node, rewriter: F) -> Self
    where
        F: FnMut(Node) -> Result<Replacement> + 'a,
    {
        Self {
            rewriter: Some(Box::new(rewriter)),
            ..Self::new(root)
        }
    }

    pub fn root(&self) -> &'a Node {
        self.root
    }

    /// `None` once the walk has ended
    pub fn current(&self) -> Option<Visit<'a>> {
        self.frames.last().map(|frame| frame.node)
    }

    /// The elements from the root down to the current node. When the walk is
    /// at a text node this ends with its parent.
    pub fn path(&self) -> &[&'a Node] {
        &self.path
    }

    pub fn parent(&self) -> Option<&'a Node> {
        let depth = self.frames.len();
        if depth < 2 {
            return None;
        }
        self.frames[depth - 2].node.as_element()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_end(&self) -> bool {
        self.frames.is_empty()
    }

    /// The rebuilt tree, once the walk has ended
    pub fn result(&self) -> Option<&Node> {
        self.result.as_ref()
    }

    pub fn into_result(self) -> Option<Node> {
        self.result
    }

    /// Move to the next node in document order. At the end this does nothing.
    pub fn next(&mut self) -> Result<()> {
        let current = match self.current() {
            Some(current) => current,
            None => return Ok(()),
        };
        if let Some(first) = current.as_element().and_then(|node| node.children().first()) {
            self.push(first, 0);
            return Ok(());
        }
        self.backtrack_and_right()
    }

    /// Queue a substitution for the current node, applied when the walk
    /// leaves its parent. An empty replacement removes the node.
    pub fn replace(&mut self, replacement: impl Into<Replacement>) -> Result<()> {
        let children = replacement.into().into_children();
        self.queue(Pending::Replace(children))
    }

    /// Queue the current element for the rewriter. It is called once the
    /// walk is done with the element's subtree, with the rewritten children
    /// already in place.
    pub fn rewrite_current(&mut self) -> Result<()> {
        if self.rewriter.is_none() {
            return Err(Error::illegal_request("this walk has no rewriter"));
        }
        match self.current() {
            Some(Visit::Element(_)) => self.queue(Pending::Rewrite),
            Some(Visit::Text(text)) => Err(Error::illegal_request(format!(
                "cannot rewrite text node {:?}",
                text
            ))),
            None => Err(Error::illegal_request("the walk has ended")),
        }
    }

    fn queue(&mut self, pending: Pending) -> Result<()> {
        let depth = self.frames.len();
        match depth {
            0 => Err(Error::illegal_request("the walk has ended")),
            1 => {
                self.root_pending = Some(pending);
                Ok(())
            }
            _ => {
                let index = self.frames[depth - 1].index;
                self.frames[depth - 2].pending.insert(index, pending);
                Ok(())
            }
        }
    }

    fn push(&mut self, child: &'a Child, index: usize) {
        let node = Visit::from(child);
        trace!(?node, index, depth = self.frames.len(), "visit");
        if let Visit::Element(element) = node {
            self.path.push(element);
        }
        self.frames.push(Frame {
            node,
            index,
            pending: BTreeMap::new(),
        });
    }

    fn pop(&mut self) -> Option<Frame<'a>> {
        let frame = self.frames.pop()?;
        if !frame.node.is_text() {
            self.path.pop();
        }
        Some(frame)
    }

    fn backtrack_and_right(&mut self) -> Result<()> {
        loop {
            let index = self.settle()?;
            let parent = match self.frames.last() {
                Some(frame) => frame.node,
                None => return Ok(()),
            };
            let next = parent
                .as_element()
                .and_then(|node| node.children().get(index + 1));
            if let Some(sibling) = next {
                self.push(sibling, index + 1);
                return Ok(());
            }
        }
    }

    /// Leave the current node, working out what it turns into and handing
    /// that to its parent. Returns the index the node had.
    fn settle(&mut self) -> Result<usize> {
        let frame = match self.pop() {
            Some(frame) => frame,
            None => return Err(Error::illegal_request("the walk has ended")),
        };
        let rebuilt = match frame.node {
            Visit::Element(node) if !frame.pending.is_empty() => Some(rebuild(node, frame.pending)),
            _ => None,
        };
        let request = match self.frames.last_mut() {
            Some(parent) => parent.pending.remove(&frame.index),
            None => self.root_pending.take(),
        };
        let outcome = match request {
            Some(Pending::Replace(children)) => {
                if rebuilt.is_some() {
                    debug!(node = ?frame.node, "replacement discards changes below it");
                }
                Some(children)
            }
            Some(Pending::Rewrite) => {
                let node = match rebuilt.or_else(|| frame.node.as_element().cloned()) {
                    Some(node) => node,
                    None => return Err(Error::illegal_request("cannot rewrite a text node")),
                };
                let rewriter = match self.rewriter.as_mut() {
                    Some(rewriter) => rewriter,
                    None => return Err(Error::illegal_request("this walk has no rewriter")),
                };
                Some(rewriter(node)?.into_children())
            }
            None => rebuilt.map(|node| vec![Child::Element(node)]),
        };

        match self.frames.last_mut() {
            Some(parent) => {
                if let Some(children) = outcome {
                    trace!(index = frame.index, count = children.len(), "replaced");
                    parent.pending.insert(frame.index, Pending::Replace(children));
                }
            }
            None => self.result = Some(finish(self.root, outcome)?),
        }
        Ok(frame.index)
    }
}

/// A copy of `node` with the queued replacements spliced into its children
fn rebuild(node: &Node, pending: BTreeMap<usize, Pending>) -> Node {
    let mut pending = pending.into_iter().peekable();
    let mut children = Vec::with_capacity(node.children().len());
    for (index, child) in node.children().iter().enumerate() {
        match pending.next_if(|(at, _)| *at == index) {
            Some((_, Pending::Replace(with))) => children.extend(with),
            _ => children.push(child.clone()),
        }
    }
    debug!(tag = %node.tag(), "rebuilt");
    node.set_children(children)
}

/// The root has nowhere to put siblings, so it must stay a single element
fn finish(root: &Node, outcome: Option<Vec<Child>>) -> Result<Node> {
    let mut children = match outcome {
        None => return Ok(root.clone()),
        Some(children) => children,
    };
    match (children.pop(), children.is_empty()) {
        (Some(Child::Element(node)), true) => Ok(node),
        (last, _) => {
            children.extend(last);
            Err(Error::format(format!(
                "the root must be replaced by exactly one element, got {:?}",
                children
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{h, literal};

    fn tree() -> Node {
        Node::normalize(h![ul, h![p, literal![h![li, "foo", "boo"], h![li, "bar"]]]]).unwrap()
    }

    fn walked(walk: &mut MutableTreeWalk, steps: usize) {
        for _ in 0..steps {
            walk.next().unwrap();
        }
    }

    #[test]
    fn test_starts_at_the_root() {
        let node = tree();
        let walk = MutableTreeWalk::new(&node);
        assert_eq!(walk.current(), Some(Visit::Element(&node)));
        assert_eq!(walk.parent(), None);
        assert_eq!(walk.path(), &[&node]);
    }

    #[test]
    fn test_depth_first_left_to_right() {
        let node = tree();
        let mut walk = MutableTreeWalk::new(&node);
        walked(&mut walk, 1);
        assert!(walk.current().and_then(|v| v.as_element()).unwrap().is_tag("p"));
        walked(&mut walk, 1);
        let li = walk.current().and_then(|v| v.as_element()).unwrap();
        assert_eq!(li.text(), "fooboo");
        assert_eq!(walk.path().len(), 3);
        walked(&mut walk, 1);
        assert!(matches!(walk.current(), Some(Visit::Text(t)) if t == "foo"));
        assert_eq!(walk.path().len(), 3);
        assert!(walk.parent().unwrap().ptr_eq(li));
        walked(&mut walk, 1);
        assert!(matches!(walk.current(), Some(Visit::Text(t)) if t == "boo"));
        walked(&mut walk, 1);
        let li = walk.current().and_then(|v| v.as_element()).unwrap();
        assert_eq!(li.text(), "bar");
        assert_eq!(walk.path().len(), 3);
    }

    #[test]
    fn test_finishes_and_stays_at_the_end() {
        let node = tree();
        let mut walk = MutableTreeWalk::new(&node);
        walked(&mut walk, 7);
        assert!(walk.is_end());
        assert_eq!(walk.current(), None);
        assert!(walk.path().is_empty());
        walked(&mut walk, 1);
        assert!(walk.is_end());
        assert!(walk.result().unwrap().ptr_eq(&node));
    }

    #[test]
    fn test_replace() {
        let node = tree();
        let mut walk = MutableTreeWalk::new(&node);
        walked(&mut walk, 2);
        walk.replace(Node::new("foo")).unwrap();
        walked(&mut walk, 6);
        let target = Node::normalize(h![ul, h![p, h![foo], h![li, "bar"]]]).unwrap();
        assert_eq!(walk.result(), Some(&target));
        // the untouched sibling is shared with the original tree
        let p = walk.result().unwrap().children()[0].as_element().unwrap().clone();
        let original_p = node.children()[0].as_element().unwrap();
        assert!(p.children()[1].ptr_eq(&original_p.children()[1]));
    }

    #[test]
    fn test_replace_while_walking() {
        let node = tree();
        let mut walk = MutableTreeWalk::new(&node);
        for _ in 0..7 {
            walk.next().unwrap();
            if let Some(Visit::Element(current)) = walk.current() {
                if current.is_tag("li") {
                    let span = Node::with("span", Default::default(), vec![Child::from(current.clone())]);
                    walk.replace(span).unwrap();
                }
            }
        }
        let target = Node::normalize(h![
            ul,
            h![p, h![span, h![li, "foo", "boo"]], h![span, h![li, "bar"]]]
        ])
        .unwrap();
        assert_eq!(walk.into_result(), Some(target));
    }

    #[test]
    fn test_replace_with_many_and_none() {
        let node = Node::normalize(h![div, h![a], h![b], h![c]]).unwrap();
        let mut walk = MutableTreeWalk::new(&node);
        while let Some(visit) = walk.current() {
            match visit.as_element().map(|n| n.tag().to_string()).as_deref() {
                Some("a") => walk.replace(Replacement::none()).unwrap(),
                Some("b") => walk
                    .replace(vec![Node::new("x"), Node::new("y")])
                    .unwrap(),
                _ => {}
            }
            walk.next().unwrap();
        }
        let target = Node::normalize(h![div, h![x], h![y], h![c]]).unwrap();
        assert_eq!(walk.into_result(), Some(target));
    }

    #[test]
    fn test_replace_text() {
        let node = Node::normalize(h![p, "a", h![br], "b"]).unwrap();
        let mut walk = MutableTreeWalk::new(&node);
        while let Some(visit) = walk.current() {
            if let Visit::Text(text) = visit {
                walk.replace(TextNode::new(text.to_uppercase())).unwrap();
            }
            walk.next().unwrap();
        }
        assert_eq!(walk.into_result(), Some(Node::normalize(h![p, "A", h![br], "B"]).unwrap()));
    }

    #[test]
    fn test_rewrite_sees_rewritten_children() {
        let node = Node::normalize(h![div, h![section, h![p, "x"]]]).unwrap();
        let mut seen = Vec::new();
        let result = {
            let mut walk = MutableTreeWalk::with_rewriter(&node, |node: Node| {
                seen.push(format!("{:?}", node));
                Ok(node.add_class("done").into())
            });
            while let Some(visit) = walk.current() {
                if !visit.is_text() {
                    walk.rewrite_current().unwrap();
                }
                walk.next().unwrap();
            }
            walk.into_result()
        };
        assert_eq!(
            seen,
            vec![
                r#"H[:p, ["x"]]"#,
                r#"H[:section, [H[:p, {"class"=>"done"}, ["x"]]]]"#,
                r#"H[:div, [H[:section, {"class"=>"done"}, [H[:p, {"class"=>"done"}, ["x"]]]]]]"#,
            ]
        );
        assert_eq!(result.unwrap().attr("class"), Some("done"));
    }

    #[test]
    fn test_rewrite_requests_are_checked() {
        let node = Node::normalize(h![p, "x"]).unwrap();
        let mut walk = MutableTreeWalk::new(&node);
        assert!(matches!(walk.rewrite_current(), Err(Error::IllegalRequest(_))));

        let mut walk = MutableTreeWalk::with_rewriter(&node, |node: Node| Ok(node.into()));
        walk.next().unwrap();
        assert!(matches!(walk.rewrite_current(), Err(Error::IllegalRequest(_))));
        walk.next().unwrap();
        assert!(walk.is_end());
        assert!(matches!(walk.replace(Node::new("p")), Err(Error::IllegalRequest(_))));
    }

    #[test]
    fn test_root_must_stay_one_element() {
        let node = Node::normalize(h![p, "x"]).unwrap();
        let mut walk = MutableTreeWalk::new(&node);
        walk.replace(Replacement::none()).unwrap();
        walk.next().unwrap();
        assert!(matches!(walk.next(), Err(Error::Format(_))));

        let mut walk = MutableTreeWalk::new(&node);
        walk.replace(Node::new("div")).unwrap();
        walked(&mut walk, 2);
        assert_eq!(walk.into_result(), Some(Node::new("div")));
    }
}
