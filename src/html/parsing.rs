use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, tag_no_case, take_until, take_while};
use nom::character::complete::{char, digit1, hex_digit1, multispace0, multispace1, one_of, satisfy};
use nom::combinator::{map, map_opt, map_res, opt, recognize, value, verify};
use nom::error::ErrorKind;
use nom::multi::many0;
use nom::sequence::{delimited, pair, preceded, tuple};
use nom::IResult;
use tracing::{debug, span, Level};

use crate::dom::{Literal, Node, Tag};
use crate::error::{Error, Result};

/// Elements that never have children or a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is taken as text up to the closing tag
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Read an HTML document with a single root element.
///
/// This is not a validating parser: it understands nested tags, attributes,
/// comments and a doctype, and no more.
pub fn parse_html(input: &str) -> Result<Node> {
    let span = span!(Level::DEBUG, "parse_html", len = input.len());
    let _enter = span.enter();

    let (rest, literal) = delimited(misc, element, misc)(input)
        .map_err(|e| Error::from_nom("HTML document", input, e))?;
    if !rest.is_empty() {
        return Err(Error::parse(
            "HTML document",
            input,
            rest,
            "unexpected trailing input after the root element",
        ));
    }
    let node = Node::normalize(literal)?;
    debug!(root = %node.tag(), "parsed document");
    Ok(node)
}

/// Whitespace, comments and doctypes, which are all dropped
fn misc(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0(alt((value((), multispace1), value((), comment), value((), doctype)))),
    )(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
    delimited(tag("<!--"), take_until("-->"), tag("-->"))(input)
}

fn doctype(input: &str) -> IResult<&str, &str> {
    delimited(tag_no_case("<!doctype"), is_not(">"), char('>'))(input)
}

/// Parse a complete element, returning its node literal
fn element(input: &str) -> IResult<&str, Literal> {
    let (rest, (name, attributes, self_closing)) = open_tag(input)?;
    if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
        return Ok((rest, node_literal(name, attributes, Vec::new())));
    }

    let (rest, children) = if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
        let (rest, text) = raw_text(rest, &name)?;
        let children = if text.is_empty() {
            Vec::new()
        } else {
            vec![Literal::Str(text.to_string())]
        };
        (rest, children)
    } else {
        let (rest, children) = many0(content)(rest)?;
        (rest, children.into_iter().flatten().collect())
    };

    let (rest, _) = verify(close_tag, |close: &str| close.eq_ignore_ascii_case(&name))(rest)?;
    Ok((rest, node_literal(name, attributes, children)))
}

#[cfg(test)]
#[test]
fn test_element() {
    let target = node_literal(
        "a".to_string(),
        vec![("href".to_string(), "/".to_string())],
        vec![
            Literal::from("Ciao "),
            node_literal("em".to_string(), Vec::new(), vec![Literal::from("Bella")]),
        ],
    );
    let (rest, parsed) = element(r#"<a href="/">Ciao <em>Bella</em></a>"#).unwrap();
    assert_eq!(rest, "");
    assert_eq!(format!("{:?}", parsed), format!("{:?}", target));

    assert!(element("<a><b></a></b>").is_err());
    assert!(element("<p>unclosed").is_err());
}

fn node_literal(name: String, attributes: Vec<(String, String)>, children: Vec<Literal>) -> Literal {
    Literal::List(vec![
        Literal::Tag(Tag::from(name)),
        Literal::Map(
            attributes
                .into_iter()
                .map(|(k, v)| (k, Literal::Str(v)))
                .collect(),
        ),
        Literal::List(children),
    ])
}

/// Everything up to the closing tag of `name`, which is matched in any case
fn raw_text<'a>(input: &'a str, name: &str) -> IResult<&'a str, &'a str> {
    let close = format!("</{}", name);
    // ASCII lowercasing keeps byte offsets
    match input.to_ascii_lowercase().find(&close) {
        Some(at) => Ok((&input[at..], &input[..at])),
        None => Err(nom::Err::Error(nom::error::Error::new(input, ErrorKind::TakeUntil))),
    }
}

#[cfg(test)]
#[test]
fn test_raw_text() {
    assert_eq!(raw_text("a < b</script>", "script"), Ok(("</script>", "a < b")));
    assert_eq!(raw_text("x</SCRIPT>", "script"), Ok(("</SCRIPT>", "x")));
    assert_eq!(raw_text("</Style>", "style"), Ok(("</Style>", "")));
    assert!(raw_text("never closed", "script").is_err());
}

/// A child of an element. Comments come back as `None`.
fn content(input: &str) -> IResult<&str, Option<Literal>> {
    alt((
        map(comment, |_| None),
        map(element, Some),
        map(is_not("<"), |s: &str| Some(Literal::Str(decode_entities(s)))),
    ))(input)
}

/// Attempt to parse a string as a valid tag name, lowercasing it
fn tag_name(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            satisfy(|c| c.is_ascii_alphabetic()),
            take_while(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == ':'),
        )),
        str::to_ascii_lowercase,
    )(input)
}

/// Parse a tag in the form `<name attr=value ...>` or `<name ... />`
fn open_tag(input: &str) -> IResult<&str, (String, Vec<(String, String)>, bool)> {
    let (rest, (_, name, attributes, _, self_closing)) = tuple((
        char('<'),
        tag_name,
        many0(preceded(multispace1, attribute)),
        multispace0,
        alt((value(true, tag("/>")), value(false, char('>')))),
    ))(input)?;
    Ok((rest, (name, attributes, self_closing)))
}

#[cfg(test)]
#[test]
fn test_open_tag() {
    assert_eq!(open_tag("<div>"), Ok(("", ("div".to_string(), vec![], false))));
    assert_eq!(open_tag("<BR/>"), Ok(("", ("br".to_string(), vec![], true))));

    let data = r#"<div attr1 attr2=two attr3='three' attr4 = "number four" >"#;
    let target = vec![
        ("attr1".to_string(), "".to_string()),
        ("attr2".to_string(), "two".to_string()),
        ("attr3".to_string(), "three".to_string()),
        ("attr4".to_string(), "number four".to_string()),
    ];
    assert_eq!(open_tag(data), Ok(("", ("div".to_string(), target, false))));
}

/// Parse a tag in the form `</name>`, returning `name`
fn close_tag(input: &str) -> IResult<&str, String> {
    delimited(tag("</"), tag_name, preceded(multispace0, char('>')))(input)
}

// Attribute parsing below

fn attribute(input: &str) -> IResult<&str, (String, String)> {
    let (rest, (name, value)) = pair(
        is_not(" \t\r\n\"'>/="),
        opt(preceded(tuple((multispace0, char('='), multispace0)), attribute_value)),
    )(input)?;
    Ok((rest, (name.to_string(), value.map(decode_entities).unwrap_or_default())))
}

fn attribute_value(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('\''), map(opt(is_not("'")), Option::unwrap_or_default), char('\'')),
        delimited(char('"'), map(opt(is_not("\"")), Option::unwrap_or_default), char('"')),
        is_not(" \t\r\n\"'=<>`"),
    ))(input)
}

#[cfg(test)]
#[test]
fn test_attribute() {
    assert_eq!(attribute("a=''"), Ok(("", ("a".to_string(), "".to_string()))));
    assert_eq!(
        attribute(r#"title="fish &amp; chips""#),
        Ok(("", ("title".to_string(), "fish & chips".to_string())))
    );
    assert_eq!(attribute("checked>"), Ok((">", ("checked".to_string(), "".to_string()))));
}

/// Replace character references by the characters they stand for. Unknown
/// references are kept as written.
fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        match entity(&rest[at..]) {
            Ok((remaining, c)) => {
                out.push(c);
                rest = remaining;
            }
            Err(_) => {
                out.push('&');
                rest = &rest[at + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity(input: &str) -> IResult<&str, char> {
    delimited(char('&'), alt((numeric_entity, named_entity)), char(';'))(input)
}

fn named_entity(input: &str) -> IResult<&str, char> {
    alt((
        value('&', tag("amp")),
        value('<', tag("lt")),
        value('>', tag("gt")),
        value('"', tag("quot")),
        value('\'', tag("apos")),
        value('\u{a0}', tag("nbsp")),
    ))(input)
}

fn numeric_entity(input: &str) -> IResult<&str, char> {
    preceded(
        char('#'),
        map_opt(
            alt((
                preceded(one_of("xX"), map_res(hex_digit1, |h: &str| u32::from_str_radix(h, 16))),
                map_res(digit1, |d: &str| d.parse::<u32>()),
            )),
            char::from_u32,
        ),
    )(input)
}

#[cfg(test)]
#[test]
fn test_decode_entities() {
    assert_eq!(decode_entities("it&#x27;s &quot;ok&quot; &amp; &lt;fine&gt;"), r#"it's "ok" & <fine>"#);
    assert_eq!(decode_entities("&#65;&#x42;"), "AB");
    assert_eq!(decode_entities("R&D &unknown; &"), "R&D &unknown; &");
}
