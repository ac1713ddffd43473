use thiserror::Error;

/// Everything that can go wrong while building, querying or rewriting a tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A literal could not be normalized into a node, or a rewrite callback
    /// answered with something that is not a node or list of nodes
    #[error("invalid node literal: {0}")]
    Format(String),
    /// A selector (or HTML document) could not be parsed
    #[error("could not parse {what} {input:?} at offset {offset}: {message}")]
    Parse {
        what: &'static str,
        input: String,
        offset: usize,
        message: String,
    },
    /// The operation makes no sense for this kind of node
    #[error("illegal request: {0}")]
    IllegalRequest(String),
    #[error("wrong number of arguments ({got} for {expected})")]
    Arity { expected: &'static str, got: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn format(message: impl Into<String>) -> Self {
        Error::Format(message.into())
    }

    pub fn illegal_request(message: impl Into<String>) -> Self {
        Error::IllegalRequest(message.into())
    }

    /// Build a parse error pointing at `fragment`, which must be a slice of `input`
    pub fn parse(what: &'static str, input: &str, fragment: &str, message: impl Into<String>) -> Self {
        Error::Parse {
            what,
            input: input.to_string(),
            offset: offset_of(input, fragment),
            message: message.into(),
        }
    }

    /// Convert a nom failure into a parse error
    pub fn from_nom(what: &'static str, input: &str, err: nom::Err<nom::error::Error<&str>>) -> Self {
        match err {
            nom::Err::Incomplete(_) => Error::Parse {
                what,
                input: input.to_string(),
                offset: input.len(),
                message: "unexpected end of input".to_string(),
            },
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                let message = if e.input.is_empty() {
                    "unexpected end of input".to_string()
                } else {
                    format!("unexpected input {:?}", truncate(e.input))
                };
                Error::parse(what, input, e.input, message)
            }
        }
    }
}

/// Byte offset of `fragment` inside `input`. Fragments that do not point into
/// `input` are reported at its end.
fn offset_of(input: &str, fragment: &str) -> usize {
    let start = input.as_ptr() as usize;
    let at = fragment.as_ptr() as usize;
    if at >= start && at <= start + input.len() {
        at - start
    } else {
        input.len()
    }
}

fn truncate(s: &str) -> &str {
    match s.char_indices().nth(16) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
#[test]
fn test_parse_offset() {
    let input = "div > p";
    let err = Error::parse("selector", input, &input[4..], "unsupported combinator");
    assert_eq!(
        err,
        Error::Parse {
            what: "selector",
            input: "div > p".to_string(),
            offset: 4,
            message: "unsupported combinator".to_string(),
        }
    );
    assert_eq!(offset_of(input, "elsewhere"), input.len());
}
