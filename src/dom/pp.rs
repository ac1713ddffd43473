use std::fmt;

use super::{Child, List, Node, TextNode};

impl fmt::Debug for Node {
    /// The literal form, `H[:p, {"class"=>"intro"}, ["Hello"]]`, leaving out
    /// empty attributes and children
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "H[{:?}", self.tag())?;
        if !self.attributes().is_empty() {
            write!(f, ", {:?}", self.attributes())?;
        }
        if !self.children().is_empty() {
            write!(f, ", {:?}", self.children())?;
        }
        f.write_str("]")
    }
}

impl fmt::Debug for TextNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl fmt::Debug for Child {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Child::Element(node) => fmt::Debug::fmt(node, f),
            Child::Text(text) => fmt::Debug::fmt(text, f),
        }
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, child) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:?}", child)?;
        }
        f.write_str("]")
    }
}

impl Node {
    /// Like the `Debug` output, but spread over several lines with every
    /// level of children indented by two spaces
    pub fn pp(&self) -> String {
        let mut rest = String::new();
        if !self.attributes().is_empty() {
            rest.push_str(&format!(", {:?}", self.attributes()));
        }
        if self.children().is_empty() {
            rest.push(']');
        } else {
            let children: Vec<String> = self.children().iter().map(Child::pp).collect();
            rest.push_str(&format!(", [\n{}]]", children.join(",\n")));
        }
        format!("H[{:?}{}", self.tag(), indent(&rest, 2).trim())
    }
}

impl Child {
    pub fn pp(&self) -> String {
        match self {
            Child::Element(node) => node.pp(),
            Child::Text(text) => format!("{:?}", text),
        }
    }
}

fn indent(s: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    s.split_inclusive('\n')
        .map(|line| format!("{}{}", pad, line))
        .collect()
}

#[cfg(test)]
#[test]
fn test_indent() {
    assert_eq!(indent("a\nb", 2), "  a\n  b");
    assert_eq!(indent("a\n", 1), " a\n");
}
