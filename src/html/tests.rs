use super::*;
use crate::error::Error;
use crate::{attributes, h, literal};

fn node(literal: crate::Literal) -> Node {
    Node::normalize(literal).unwrap()
}

#[test]
fn test_escape_text() {
    let p = node(h![p, r#"it's "ok" & <fine>"#]);
    assert_eq!(
        p.to_html(&HtmlOptions::fragment()),
        "<p>it&#x27;s &quot;ok&quot; &amp; &lt;fine&gt;</p>"
    );

    let p = node(h![p, r#"Hello "world", it's great meet & chat >.<"#]);
    assert_eq!(
        p.to_string(),
        "<p>Hello &quot;world&quot;, it&#x27;s great meet &amp; chat &gt;.&lt;</p>"
    );
}

#[test]
fn test_attributes_are_single_quoted() {
    let a = node(h![a, attributes!(href => "/?a=1&b=2", title => r#"it's "here""#), "x"]);
    assert_eq!(
        a.to_string(),
        r#"<a href='/?a=1&amp;b=2' title='it&#x27;s "here"'>x</a>"#
    );
}

#[test]
fn test_nested_and_empty_elements() {
    let tree = node(h![div, literal![h![p, "a", h![br]], h![span]]]);
    assert_eq!(tree.to_string(), "<div><p>a<br></br></p><span></span></div>");
}

#[test]
fn test_no_escape_tags() {
    let script = node(h![script, r#"Hello "world", "#, "it's great meet & chat >.<"]);
    assert_eq!(
        script.to_string(),
        r#"<script>Hello "world", it's great meet & chat >.<</script>"#
    );

    let options = HtmlOptions::fragment().no_escape_tags(["pre"]);
    assert_eq!(script.to_html(&options), "<script>Hello &quot;world&quot;, it&#x27;s great meet &amp; chat &gt;.&lt;</script>");
    let pre = node(h![pre, "a < b"]);
    assert_eq!(pre.to_html(&options), "<pre>a < b</pre>");
}

#[test]
fn test_doctype() {
    let html = node(h![html, literal![h![body, "hi"]]]);
    assert_eq!(
        html.to_html(&HtmlOptions::default()),
        "<!DOCTYPE html><html><body>hi</body></html>"
    );
    assert_eq!(html.to_html(&HtmlOptions::default().include_doctype(false)), html.to_string());
    assert_eq!(HtmlOptions::default().charset(), "UTF-8");
    assert_eq!(HtmlOptions::default().encoding("latin1").charset(), "latin1");
}

#[test]
fn test_encoding_declared_in_head() {
    let page = node(h![html, literal![h![head, literal![h![title, "t"]]], h![body, "hi"]]]);
    assert_eq!(
        page.to_html(&HtmlOptions::default()),
        "<!DOCTYPE html><html><head><meta charset='UTF-8'></meta><title>t</title></head><body>hi</body></html>"
    );
    assert_eq!(
        page.to_html(&HtmlOptions::default().encoding("ISO-8859-1")),
        "<!DOCTYPE html><html><head><meta charset='ISO-8859-1'></meta><title>t</title></head><body>hi</body></html>"
    );
    assert_eq!(
        page.to_html(&HtmlOptions::fragment().encoding("ISO-8859-1")),
        "<html><head><title>t</title></head><body>hi</body></html>"
    );

    let declared = node(h![html, literal![h![head, literal![h![meta, attributes!(charset => "utf-8")]]]]]);
    assert_eq!(
        declared.to_html(&HtmlOptions::default().encoding("latin1")),
        "<!DOCTYPE html><html><head><meta charset='utf-8'></meta></head></html>"
    );
}

#[test]
fn test_child_to_html() {
    let child = Child::from("<&>");
    assert_eq!(child.to_html(&HtmlOptions::default()), "&lt;&amp;&gt;");
}

#[test]
fn test_parse_html() {
    let parsed = parse_html("<a>Ciao <em>Bella</em></a>").unwrap();
    assert_eq!(parsed, node(h![a, "Ciao ", h![em, "Bella"]]));

    let document = r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Title</title></head>
<!-- comment -->
<body class='main'><p>a &amp; b<br/></p><style>p > a { color: red }</style></body>
</html>
"#;
    let parsed = parse_html(document).unwrap();
    assert_eq!(parsed.attr("lang"), Some("en"));
    assert_eq!(parsed.select("meta").unwrap().count(), 1);
    assert_eq!(parsed.select("title").unwrap().next().map(|t| t.text()), Some("Title".to_string()));
    let p = parsed.select("body.main p").unwrap().next().unwrap();
    assert_eq!(p, node(h![p, "a & b", h![br]]));
    let style = parsed.select("style").unwrap().next().unwrap();
    assert_eq!(style.text(), "p > a { color: red }");
}

#[test]
fn test_parse_html_round_trip() {
    let html = "<div id='x'><p>it&#x27;s &lt;here&gt;</p><script>a < b && c</script></div>";
    assert_eq!(parse_html(html).unwrap().to_string(), html);
}

#[test]
fn test_parse_html_errors() {
    assert!(matches!(parse_html(""), Err(Error::Parse { offset: 0, .. })));
    assert!(matches!(parse_html("just text"), Err(Error::Parse { offset: 0, .. })));
    assert!(matches!(
        parse_html("<p></p><p></p>"),
        Err(Error::Parse { offset: 7, .. })
    ));
    assert!(matches!(parse_html("<p><b></p>"), Err(Error::Parse { .. })));
}

#[test]
fn test_parse_html_uppercase_raw_text() {
    let parsed = parse_html("<div><SCRIPT>if (a < b) {}</SCRIPT><Style>p {}</STYLE></div>").unwrap();
    assert_eq!(parsed, node(h![div, literal![h![script, "if (a < b) {}"], h![style, "p {}"]]]));
}
