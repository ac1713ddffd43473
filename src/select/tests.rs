use std::sync::Arc;

use super::*;
use crate::{attributes, h, literal};

fn node(literal: Literal) -> Node {
    Node::normalize(literal).unwrap()
}

#[test]
fn test_select_in_document_order() {
    let ul = node(h![ul, literal![h![li, "a"], h![li, "b"]]]);
    let selected: Vec<Node> = ul.select("li").unwrap().collect();
    assert_eq!(selected, vec![node(h![li, "a"]), node(h![li, "b"])]);
}

#[test]
fn test_select_includes_the_root() {
    let tree = node(h![div, attributes!(class => "x"), literal![h![p, literal![h![div]]]]]);
    let tags: Vec<String> = tree
        .select("div")
        .unwrap()
        .map(|n| format!("{:?}", n))
        .collect();
    assert_eq!(tags, vec![r#"H[:div, {"class"=>"x"}, [H[:p, [H[:div]]]]]"#, "H[:div]"]);
}

#[test]
fn test_select_is_lazy() {
    let ul = node(h![ul, literal![h![li, "a"], h![li, "b"], h![li, "c"]]]);
    let mut selection = ul.select("li").unwrap();
    assert_eq!(selection.next().map(|n| n.text()), Some("a".to_string()));
    assert_eq!(selection.next().map(|n| n.text()), Some("b".to_string()));
    assert_eq!(selection.count(), 1);
}

#[test]
fn test_select_descendants() {
    let tree = node(h![
        body,
        literal![
            h![div, literal![h![section, literal![h![p, "deep"]]]]],
            h![p, "outside"]
        ]
    ]);
    let texts: Vec<String> = tree.select("div p").unwrap().map(|n| n.text()).collect();
    assert_eq!(texts, vec!["deep"]);
}

#[test]
fn test_select_by_predicate() {
    let tree = node(h![div, literal![h![a, attributes!(href => "/")], h![a], h![span]]]);
    let links: Vec<Node> = tree.select_by(|n| n.has_attr("href")).collect();
    assert_eq!(links, vec![node(h![a, attributes!(href => "/")])]);

    let under_div = tree
        .select_matching(PathPredicate(|path: &[&Node]| path.len() == 2))
        .count();
    assert_eq!(under_div, 3);
}

#[test]
fn test_select_invalid_selector() {
    let tree = Node::new("div");
    assert!(matches!(tree.select("div > p"), Err(Error::Parse { .. })));
    assert!(matches!(
        tree.rewrite("p:hover", |n: Node| n),
        Err(Error::Parse { .. })
    ));
}

#[test]
fn test_rewrite_removes_nodes() {
    let tree = node(h![div, literal![h![script, "alert(1)"]]]);
    let result = tree.rewrite("script", |_| Vec::<Node>::new()).unwrap();
    assert_eq!(result, Node::new("div"));
    assert!(result.children().is_empty());
}

#[test]
fn test_rewrite_identity() {
    let tree = node(h![div, literal![h![p, "a", h![em, "b"]], "c", h![br]]]);
    let result = tree.rewrite_by(|_| true, |n: Node| n).unwrap();
    assert_eq!(result, tree);
}

#[test]
fn test_rewrite_with_descendant_selector() {
    let tree = node(h![
        ul,
        literal![h![li, literal![h![a, attributes!(href => "/"), "home"]]], h![a, "top"]]
    ]);
    let result = tree.rewrite("li a", |a: Node| a.add_class("nav")).unwrap();
    let target = node(h![
        ul,
        literal![
            h![li, literal![h![a, attributes!(href => "/", class => "nav"), "home"]]],
            h![a, "top"]
        ]
    ]);
    assert_eq!(result, target);
    // the original tree is untouched
    assert_eq!(tree.select(".nav").unwrap().count(), 0);
}

#[test]
fn test_rewrite_response_types() {
    let tree = node(h![div, literal![h![a], h![p], h![br]]]);

    let result = tree.rewrite("div *", |_| Node::new("br")).unwrap();
    assert_eq!(result, node(h![div, literal![h![br], h![br], h![br]]]));

    let result = tree
        .rewrite("div *", |_| h![br, attributes!(class => "foo")])
        .unwrap();
    let br = node(h![br, attributes!(class => "foo")]);
    assert_eq!(result, node(h![div, literal![br.clone(), br.clone(), br]]));

    let result = tree.rewrite("p", |_| "text").unwrap();
    assert_eq!(result, node(h![div, literal![h![a], "text", h![br]]]));

    let result = tree
        .rewrite("p", |p: Node| literal!["before", p, h![hr]])
        .unwrap();
    assert_eq!(
        result,
        node(h![div, literal![h![a], "before", h![p], h![hr], h![br]]])
    );

    let result = tree
        .rewrite("p", |p: Node| vec![Child::from("x"), Child::from(p)])
        .unwrap();
    assert_eq!(result.children().len(), 4);
}

#[test]
fn test_rewrite_returning_nothing_is_an_error() {
    let tree = node(h![div, literal![h![a], h![p]]]);
    let result = tree.rewrite("div *", |n: Node| if n.is_tag("a") { Some(n) } else { None });
    assert!(matches!(result, Err(Error::Format(_))));

    let result = tree.rewrite("a", |_| Literal::Bool(true));
    assert!(matches!(result, Err(Error::Format(_))));
}

#[test]
fn test_rewrite_callback_errors_propagate() {
    let tree = node(h![div, literal![h![a]]]);
    let result = tree.rewrite("a", |_| -> Result<Node> { Err(Error::illegal_request("no")) });
    assert_eq!(result, Err(Error::illegal_request("no")));
}

#[test]
fn test_rewrite_is_bottom_up() {
    let tree = node(h![div, literal![h![div, literal![h![div]]]]]);
    let mut depths = Vec::new();
    let result = tree
        .rewrite("div", |n: Node| {
            depths.push(n.select("div").unwrap().count());
            n.add_class("seen")
        })
        .unwrap();
    assert_eq!(depths, vec![1, 2, 3]);
    assert_eq!(result.select(".seen").unwrap().count(), 3);
}

#[test]
fn test_rewrite_matches_on_the_original_tree() {
    let tree = node(h![div, literal![h![p, literal![h![span]]]]]);
    // wrapping the p does not make the span match "section span"
    let result = tree
        .rewrite("p, section span", |n: Node| {
            if n.is_tag("p") {
                Node::with("section", Attributes::new(), vec![Child::from(n)])
            } else {
                n.add_class("hit")
            }
        })
        .unwrap();
    assert_eq!(result.select(".hit").unwrap().count(), 0);
    assert_eq!(result.select("section p span").unwrap().count(), 1);
}

#[test]
fn test_rewrite_root() {
    let tree = node(h![p, "x"]);
    let result = tree.rewrite("p", |p: Node| p.set_tag("div")).unwrap();
    assert_eq!(result, node(h![div, "x"]));

    let result = tree.rewrite("p", |p: Node| vec![p.clone(), p]);
    assert!(matches!(result, Err(Error::Format(_))));
    assert!(matches!(
        tree.rewrite("p", |_| Replacement::none()),
        Err(Error::Format(_))
    ));
}

#[test]
fn test_selection_helpers() {
    let tree = node(h![ul, literal![h![li, "a"], h![li, attributes!(class => "x y"), "b"]]]);

    let wrapped = tree
        .select("li")
        .unwrap()
        .wrap("span", attributes!(class => "w"))
        .unwrap();
    assert_eq!(wrapped.select("span.w li").unwrap().count(), 2);

    let marked = tree.select("li").unwrap().set_attr("data-n", 1).unwrap();
    assert_eq!(marked.select("[data-n='1']").unwrap().count(), 2);

    let classed = tree.select("li").unwrap().add_class("item").unwrap();
    assert_eq!(classed.select("li.item").unwrap().count(), 2);

    let unclassed = tree.select(".x").unwrap().remove_class("x").unwrap();
    assert_eq!(unclassed.select(".x").unwrap().count(), 0);
    assert_eq!(unclassed.select(".y").unwrap().count(), 1);

    let removed = tree.select(".x").unwrap().remove().unwrap();
    assert_eq!(removed, node(h![ul, literal![h![li, "a"]]]));
}

#[test]
fn test_rewrite_children_with_parent() {
    let tree = node(h![span, literal![h![div, literal![h![a], h![p], h![br]]]]]);
    let mut seen = Vec::new();
    let result = tree
        .rewrite_children(|child: &Child, parent: &Node| -> Option<Node> {
            seen.push((child.tag().map(|t| t.to_string()), parent.tag().to_string()));
            None
        })
        .unwrap();
    assert_eq!(result, tree);
    assert_eq!(
        seen,
        vec![
            (Some("a".to_string()), "div".to_string()),
            (Some("p".to_string()), "div".to_string()),
            (Some("br".to_string()), "div".to_string()),
            (Some("div".to_string()), "span".to_string()),
        ]
    );

    let result = tree
        .rewrite_children(|child: &Child, _: &Node| match child.tag() {
            Some(tag) if tag == "p" => Some(h![blockquote, literal![child.clone()]]),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        result,
        node(h![span, literal![h![div, literal![h![a], h![blockquote, literal![h![p]]], h![br]]]]])
    );
}

struct Badge {
    count: usize,
}

impl ToNode for Badge {
    fn to_node(&self) -> Child {
        Node::new("span")
            .set_attr("class", "badge")
            .add_child(self.count.to_string())
            .into()
    }
}

#[test]
fn test_rewrite_with_to_node_objects() {
    let list = node(h![ul, literal![h![li, "a"], h![li, "b"]]]);
    let counted = list
        .rewrite("li", |li: Node| Converted(Badge { count: li.text().len() }))
        .unwrap();
    assert_eq!(
        counted,
        node(h![ul, literal![
            h![span, attributes!(class => "badge"), "1"],
            h![span, attributes!(class => "badge"), "1"]
        ]])
    );

    let shared: Arc<dyn ToNode + Send + Sync> = Arc::new(Badge { count: 7 });
    let replaced = list.rewrite("li:last-child", |_| Arc::clone(&shared)).unwrap();
    assert_eq!(replaced.children()[1], Child::from(node(h![span, attributes!(class => "badge"), "7"])));

    let text: Arc<dyn ToNode + Send + Sync> = Arc::new(TextNode::new("t"));
    assert_eq!(
        list.rewrite("li", |_| Arc::clone(&text)).unwrap(),
        Node::with("ul", Attributes::new(), vec![Child::from("t"), Child::from("t")])
    );
}
