use std::fmt::{self, Write};
use std::str::FromStr;

use crate::error::Error;

mod matching;
mod parsing;

pub use parsing::parse_selector;

/// A group of selectors separated by commas. Matches if any member matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommaSequence(pub Vec<Sequence>);

/// Compound selectors joined by the descendant combinator, outermost first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence(pub Vec<SimpleSequence>);

/// Simple selectors that must all match the same node, e.g. `a.strong`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleSequence(pub Vec<SimpleSelector>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Element(String),
    Universal,
    Class(String),
    Id(String),
    Attribute(Attribute),
    PseudoClass(PseudoClass),
}

/// `[namespace|name operator value flags]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub namespace: Option<String>,
    pub operator: AttributeOperator,
    pub value: String,
    pub flags: Option<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, operator: AttributeOperator, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            operator,
            value: value.into(),
            flags: None,
        }
    }

    /// `[name]`
    pub fn exists(name: impl Into<String>) -> Self {
        Self::new(name, AttributeOperator::Exists, "")
    }

    pub fn with_flags(mut self, flags: impl Into<String>) -> Self {
        self.flags = Some(flags.into());
        self
    }

    /// Whether the `i` flag asks for case-insensitive value comparison
    pub fn ignores_case(&self) -> bool {
        self.flags.as_deref() == Some("i")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeOperator {
    // [att]
    Exists,
    // [att=val]
    Equal,
    // [att~=val]
    // whitespace separated list contains val
    Includes,
    // [att|=val]
    // equal to val, or begins with val-
    DashMatch,
    // [att^=val]
    PrefixMatch,
    // [att$=val]
    SuffixMatch,
    // [att*=val]
    SubstringMatch,
}

impl AttributeOperator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "" => AttributeOperator::Exists,
            "=" => AttributeOperator::Equal,
            "~=" => AttributeOperator::Includes,
            "|=" => AttributeOperator::DashMatch,
            "^=" => AttributeOperator::PrefixMatch,
            "$=" => AttributeOperator::SuffixMatch,
            "*=" => AttributeOperator::SubstringMatch,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeOperator::Exists => "",
            AttributeOperator::Equal => "=",
            AttributeOperator::Includes => "~=",
            AttributeOperator::DashMatch => "|=",
            AttributeOperator::PrefixMatch => "^=",
            AttributeOperator::SuffixMatch => "$=",
            AttributeOperator::SubstringMatch => "*=",
        }
    }
}

/// One or more pseudo-classes written back to back, e.g. `:first-child:empty`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PseudoClass(pub Vec<PseudoClassKind>);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoClassKind {
    FirstChild,
    LastChild,
    Empty,
}

impl PseudoClassKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "first-child" => Some(PseudoClassKind::FirstChild),
            "last-child" => Some(PseudoClassKind::LastChild),
            "empty" => Some(PseudoClassKind::Empty),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PseudoClassKind::FirstChild => "first-child",
            PseudoClassKind::LastChild => "last-child",
            PseudoClassKind::Empty => "empty",
        }
    }
}

impl FromStr for CommaSequence {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_selector(s)
    }
}

impl fmt::Display for CommaSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, sequence) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", sequence)?;
        }
        Ok(())
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, simple) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", simple)?;
        }
        Ok(())
    }
}

impl fmt::Display for SimpleSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The implicit universal selector is left out unless it stands alone
        let skip_universal = self.0.len() > 1 && self.0[0] == SimpleSelector::Universal;
        for (i, selector) in self.0.iter().enumerate() {
            if i == 0 && skip_universal {
                continue;
            }
            write!(f, "{}", selector)?;
        }
        Ok(())
    }
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimpleSelector::Element(name) => write_escaped(f, name, true),
            SimpleSelector::Universal => f.write_str("*"),
            SimpleSelector::Class(name) => {
                f.write_str(".")?;
                write_escaped(f, name, true)
            }
            SimpleSelector::Id(name) => {
                f.write_str("#")?;
                write_escaped(f, name, false)
            }
            SimpleSelector::Attribute(attr) => {
                f.write_str("[")?;
                match attr.namespace.as_deref() {
                    Some("*") => f.write_str("*|")?,
                    Some(ns) => {
                        write_escaped(f, ns, true)?;
                        f.write_str("|")?;
                    }
                    None => {}
                }
                write_escaped(f, &attr.name, true)?;
                if attr.operator != AttributeOperator::Exists {
                    f.write_str(attr.operator.as_str())?;
                    write_quoted(f, &attr.value)?;
                }
                if let Some(flags) = &attr.flags {
                    f.write_str(" ")?;
                    write_escaped(f, flags, true)?;
                }
                f.write_str("]")
            }
            SimpleSelector::PseudoClass(PseudoClass(kinds)) => {
                for kind in kinds {
                    write!(f, ":{}", kind.as_str())?;
                }
                Ok(())
            }
        }
    }
}

/// Write `s` so that it reads back as the same identifier, or as the same
/// name when `ident` is false. Names may start with a digit, identifiers may not.
fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str, ident: bool) -> fmt::Result {
    let dashed = s.starts_with('-');
    for (i, c) in s.chars().enumerate() {
        let start = ident && (i == 0 || (i == 1 && dashed));
        if c.is_control() || (start && c.is_ascii_digit()) {
            write!(f, "\\{:x} ", c as u32)?;
        } else if start && i == 1 && c == '-' {
            f.write_str("\\-")?;
        } else if c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            f.write_char(c)?;
        } else {
            write!(f, "\\{}", c)?;
        }
    }
    Ok(())
}

/// Write `s` as a double-quoted CSS string
fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' | '\\' => write!(f, "\\{}", c)?,
            c if c.is_control() => write!(f, "\\{:x} ", c as u32)?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}

#[macro_export]
macro_rules! simple_selector {
    (#$x:expr) => {
        $crate::css::SimpleSelector::Id(stringify!($x).to_string())
    };
    (.$x:expr) => {
        $crate::css::SimpleSelector::Class(stringify!($x).to_string())
    };
    (*) => {
        $crate::css::SimpleSelector::Universal
    };
    ($x:expr) => {
        $crate::css::SimpleSelector::Element(stringify!($x).to_string())
    };
}

#[macro_export]
macro_rules! compound_selector {
    ($($sel:expr),*) => {$crate::css::SimpleSequence(vec![$($sel),*])}
}
