use nom::branch::alt;
use nom::bytes::complete::take_while_m_n;
use nom::character::complete::{anychar, char, multispace0, multispace1, none_of, one_of, satisfy};
use nom::combinator::{map, not, opt};
use nom::error::ErrorKind;
use nom::multi::{many0, many1};
use nom::sequence::{delimited, pair, preceded, terminated, tuple};
use nom::IResult;
use tracing::{debug, span, Level};

use super::*;
use crate::error::Result;

/// A simple selector as written, before it is checked against what we support
#[derive(Debug, Clone, PartialEq)]
enum RawSimple {
    Type(String),
    Universal,
    Id(String),
    Class(String),
    Attribute {
        namespace: Option<String>,
        name: String,
        operator: String,
        value: Option<String>,
        flags: Option<String>,
    },
    Pseudo {
        name: String,
        element: bool,
        argument: Option<String>,
    },
}

/// Each part keeps the input it started at, for error offsets
type RawCompound<'a> = Vec<(&'a str, RawSimple)>;
type RawSequence<'a> = (RawCompound<'a>, Vec<((&'a str, char), RawCompound<'a>)>);

/// Parse a selector group like `#main a.strong, li:first-child`
pub fn parse_selector(selector: &str) -> Result<CommaSequence> {
    let span = span!(Level::DEBUG, "parse_selector", selector);
    let _enter = span.enter();

    let (rest, groups) = delimited(multispace0, selector_group, multispace0)(selector)
        .map_err(|e| Error::from_nom("selector", selector, e))?;
    if !rest.is_empty() {
        return Err(Error::parse(
            "selector",
            selector,
            rest,
            format!("unexpected trailing input {:?}", rest),
        ));
    }
    let parsed = groups
        .into_iter()
        .map(|group| translate_sequence(selector, group))
        .collect::<Result<Vec<_>>>()
        .map(CommaSequence)?;
    debug!(%parsed, "parsed selector");
    Ok(parsed)
}

fn translate_sequence(selector: &str, (head, tail): RawSequence<'_>) -> Result<Sequence> {
    let mut compounds = vec![translate_compound(selector, head)?];
    for ((at, combinator), compound) in tail {
        if combinator != ' ' {
            return Err(Error::parse(
                "selector",
                selector,
                at,
                format!(
                    "unsupported combinator {:?}, only descendant selectors are supported",
                    combinator
                ),
            ));
        }
        compounds.push(translate_compound(selector, compound)?);
    }
    Ok(Sequence(compounds))
}

fn translate_compound(selector: &str, parts: RawCompound<'_>) -> Result<SimpleSequence> {
    let mut members = Vec::with_capacity(parts.len() + 1);
    if !matches!(parts.first(), Some((_, RawSimple::Type(_) | RawSimple::Universal))) {
        members.push(SimpleSelector::Universal);
    }
    for (at, part) in parts {
        let member = match part {
            RawSimple::Type(name) => SimpleSelector::Element(name),
            RawSimple::Universal => SimpleSelector::Universal,
            RawSimple::Id(name) => SimpleSelector::Id(name),
            RawSimple::Class(name) => SimpleSelector::Class(name),
            RawSimple::Attribute {
                namespace,
                name,
                operator,
                value,
                flags,
            } => {
                let op = AttributeOperator::from_symbol(&operator).ok_or_else(|| {
                    Error::parse(
                        "selector",
                        selector,
                        at,
                        format!("unknown attribute operator {:?}", operator),
                    )
                })?;
                if let Some(flags) = flags.as_deref().filter(|f| !matches!(*f, "i" | "s")) {
                    return Err(Error::parse(
                        "selector",
                        selector,
                        at,
                        format!("unknown attribute selector flag {:?}", flags),
                    ));
                }
                SimpleSelector::Attribute(Attribute {
                    name,
                    namespace,
                    operator: op,
                    value: value.unwrap_or_default(),
                    flags,
                })
            }
            RawSimple::Pseudo {
                name,
                element,
                argument,
            } => {
                let unsupported = |message: String| Error::parse("selector", selector, at, message);
                if element {
                    return Err(unsupported(format!("pseudo-element ::{} is not supported", name)));
                }
                if argument.is_some() {
                    return Err(unsupported(format!("pseudo-class :{}() is not supported", name)));
                }
                let kind = PseudoClassKind::from_name(&name)
                    .ok_or_else(|| unsupported(format!("pseudo-class :{} is not supported", name)))?;
                if let Some(SimpleSelector::PseudoClass(PseudoClass(kinds))) = members.last_mut() {
                    kinds.push(kind);
                    continue;
                }
                SimpleSelector::PseudoClass(PseudoClass(vec![kind]))
            }
        };
        members.push(member);
    }
    Ok(SimpleSequence(members))
}

/// Run `parser`, also returning the input it started at
fn located<'a, O, F>(mut parser: F) -> impl FnMut(&'a str) -> IResult<&'a str, (&'a str, O)>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    move |input| {
        let (rest, out) = parser(input)?;
        Ok((rest, (input, out)))
    }
}

/// Parse comma seperated groups of selectors
fn selector_group(input: &str) -> IResult<&str, Vec<RawSequence<'_>>> {
    let (input, (first, rest)) = pair(
        sequence,
        many0(preceded(tuple((multispace0, char(','), multispace0)), sequence)),
    )(input)?;
    Ok((input, [first].into_iter().chain(rest).collect()))
}

fn sequence(input: &str) -> IResult<&str, RawSequence<'_>> {
    pair(compound, many0(pair(combinator, compound)))(input)
}

/// Descendant combinators come out as `' '`
fn combinator(input: &str) -> IResult<&str, (&str, char)> {
    alt((
        preceded(multispace0, located(terminated(one_of(">+~"), multispace0))),
        located(map(multispace1, |_| ' ')),
    ))(input)
}
#[cfg(test)]
#[test]
fn test_combinator() {
    let i = " > p";
    assert_eq!(combinator(i), Ok(("p", (&i[1..], '>'))));
    let i = "  p";
    assert_eq!(combinator(i), Ok(("p", (i, ' '))));
    assert!(combinator("p").is_err());
}

fn compound(input: &str) -> IResult<&str, RawCompound<'_>> {
    let (rest, (head, tail)) = pair(
        opt(located(type_selector)),
        many0(located(alt((id, class, attribute, pseudo)))),
    )(input)?;
    if head.is_none() && tail.is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(input, ErrorKind::Many1)));
    }
    Ok((rest, head.into_iter().chain(tail).collect()))
}
#[cfg(test)]
#[test]
fn test_compound() {
    let i = "a.strong#top";
    let (rest, parts) = compound(i).unwrap();
    assert_eq!(rest, "");
    assert_eq!(
        parts.into_iter().map(|(_, p)| p).collect::<Vec<_>>(),
        vec![
            RawSimple::Type("a".to_string()),
            RawSimple::Class("strong".to_string()),
            RawSimple::Id("top".to_string()),
        ]
    );
    assert!(compound("&.foo").is_err());
    assert!(compound(" a").is_err());
}

fn type_selector(input: &str) -> IResult<&str, RawSimple> {
    alt((map(char('*'), |_| RawSimple::Universal), map(ident, RawSimple::Type)))(input)
}

fn id(input: &str) -> IResult<&str, RawSimple> {
    map(preceded(char('#'), name), RawSimple::Id)(input)
}

fn class(input: &str) -> IResult<&str, RawSimple> {
    map(preceded(char('.'), ident), RawSimple::Class)(input)
}

/// Parse `[ns|name op value flags]`. Any `?=` operator is accepted here and
/// rejected later, so the error can name it.
fn attribute(input: &str) -> IResult<&str, RawSimple> {
    let namespace = terminated(
        alt((ident, map(char('*'), |c| c.to_string()))),
        pair(char('|'), not(char('='))),
    );
    let operator = map(pair(opt(one_of("~|^$*!")), char('=')), |(prefix, eq)| {
        prefix.into_iter().chain([eq]).collect::<String>()
    });
    let value = alt((string, name));
    let (input, (_, _, namespace, name, _, rest, _)) = tuple((
        char('['),
        multispace0,
        opt(namespace),
        ident,
        multispace0,
        opt(tuple((
            operator,
            multispace0,
            value,
            multispace0,
            opt(terminated(ident, multispace0)),
        ))),
        char(']'),
    ))(input)?;
    let raw = match rest {
        Some((operator, _, value, _, flags)) => RawSimple::Attribute {
            namespace,
            name,
            operator,
            value: Some(value),
            flags,
        },
        None => RawSimple::Attribute {
            namespace,
            name,
            operator: String::new(),
            value: None,
            flags: None,
        },
    };
    Ok((input, raw))
}
#[cfg(test)]
#[test]
fn test_attribute() {
    let target = RawSimple::Attribute {
        namespace: None,
        name: "href".to_string(),
        operator: "^=".to_string(),
        value: Some("http://".to_string()),
        flags: None,
    };
    assert_eq!(attribute(r#"[href^="http://"]"#), Ok(("", target)));

    let target = RawSimple::Attribute {
        namespace: Some("xlink".to_string()),
        name: "lang".to_string(),
        operator: "|=".to_string(),
        value: Some("en".to_string()),
        flags: Some("i".to_string()),
    };
    assert_eq!(attribute("[ xlink|lang |= en i ]"), Ok(("", target)));

    let target = RawSimple::Attribute {
        namespace: None,
        name: "lang".to_string(),
        operator: "|=".to_string(),
        value: Some("en".to_string()),
        flags: None,
    };
    assert_eq!(attribute("[lang|=en]"), Ok(("", target)));

    let target = RawSimple::Attribute {
        namespace: None,
        name: "disabled".to_string(),
        operator: String::new(),
        value: None,
        flags: None,
    };
    assert_eq!(attribute("[disabled]"), Ok(("", target)));
}

fn pseudo(input: &str) -> IResult<&str, RawSimple> {
    let argument = delimited(char('('), many0(none_of(")")), char(')'));
    let (input, (_, element, name, argument)) =
        tuple((char(':'), opt(char(':')), ident, opt(argument)))(input)?;
    Ok((
        input,
        RawSimple::Pseudo {
            name,
            element: element.is_some(),
            argument: argument.map(|chars| chars.into_iter().collect()),
        },
    ))
}
#[cfg(test)]
#[test]
fn test_pseudo() {
    let target = RawSimple::Pseudo {
        name: "nth-child".to_string(),
        element: false,
        argument: Some("2n+1".to_string()),
    };
    assert_eq!(pseudo(":nth-child(2n+1)"), Ok(("", target)));
    let target = RawSimple::Pseudo {
        name: "before".to_string(),
        element: true,
        argument: None,
    };
    assert_eq!(pseudo("::before"), Ok(("", target)));
}

/// Parse quoted string
fn string(input: &str) -> IResult<&str, String> {
    /// Parse double-quoted string
    fn string1(input: &str) -> IResult<&str, String> {
        map(
            delimited(char('"'), many0(alt((escape, none_of("\"\\")))), char('"')),
            |chars| chars.into_iter().collect(),
        )(input)
    }
    /// Parse single-quoted string
    fn string2(input: &str) -> IResult<&str, String> {
        map(
            delimited(char('\''), many0(alt((escape, none_of("'\\")))), char('\'')),
            |chars| chars.into_iter().collect(),
        )(input)
    }
    alt((string1, string2))(input)
}
#[cfg(test)]
#[test]
fn test_string() {
    let i = r#""Hello, world""#;
    assert_eq!(string(i), Ok(("", "Hello, world".to_string())));

    let i = "'Hello, world'";
    assert_eq!(string(i), Ok(("", "Hello, world".to_string())));

    let i = r#""say \"hi\"""#;
    assert_eq!(string(i), Ok(("", r#"say "hi""#.to_string())));

    assert!(string(r#""open"#).is_err());
}

/// A backslash escape: up to six hex digits and one optional whitespace, or
/// any other character taken literally
fn escape(input: &str) -> IResult<&str, char> {
    let code_point = map(
        terminated(
            take_while_m_n(1, 6, |c: char| c.is_ascii_hexdigit()),
            opt(one_of(" \t\n\r\x0c")),
        ),
        |hex: &str| {
            u32::from_str_radix(hex, 16)
                .ok()
                .and_then(char::from_u32)
                .filter(|&c| c != '\0')
                .unwrap_or(char::REPLACEMENT_CHARACTER)
        },
    );
    preceded(char('\\'), alt((code_point, anychar)))(input)
}
#[cfg(test)]
#[test]
fn test_escape() {
    assert_eq!(escape(r"\31 23"), Ok(("23", '1')));
    assert_eq!(escape(r"\000041B"), Ok(("B", 'A')));
    assert_eq!(escape("\\9\tx"), Ok(("x", '\t')));
    assert_eq!(escape(r"\0"), Ok(("", char::REPLACEMENT_CHARACTER)));
    assert_eq!(escape(r"\110000"), Ok(("", char::REPLACEMENT_CHARACTER)));
    assert_eq!(escape(r"\."), Ok(("", '.')));
    assert_eq!(escape(r"\ "), Ok(("", ' ')));
    assert_eq!(name(r"\31 23"), Ok(("", "123".to_string())));
}

fn nmchar(input: &str) -> IResult<&str, char> {
    alt((
        escape,
        satisfy(|c| c.is_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()),
    ))(input)
}

/// Parse name
fn name(input: &str) -> IResult<&str, String> {
    map(many1(nmchar), |chars| chars.into_iter().collect())(input)
}

/// Parse ident
fn ident(input: &str) -> IResult<&str, String> {
    let nmstart = alt((escape, satisfy(|c| c.is_alphabetic() || c == '_' || !c.is_ascii())));
    let (input, (prefix, start, rest)) = tuple((opt(char('-')), nmstart, many0(nmchar)))(input)?;
    let identifier = prefix.into_iter().chain([start]).chain(rest).collect();
    Ok((input, identifier))
}
#[cfg(test)]
#[test]
fn test_ident() {
    assert_eq!(ident("first-child)"), Ok((")", "first-child".to_string())));
    assert_eq!(ident("-moz-thing"), Ok(("", "-moz-thing".to_string())));
    assert_eq!(ident(r"a\.b c"), Ok((" c", "a.b".to_string())));
    assert!(ident("2col").is_err());
    assert_eq!(name("2col"), Ok(("", "2col".to_string())));
}
