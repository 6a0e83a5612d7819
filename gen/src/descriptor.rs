// Copyright (C) 2025 Piers Finlayson <piers@piers.rocks>
//
// MIT License

//! Generic labelled tree used to build, serialize and materialize MRA
//! descriptors.

use core::fmt;

const INDENT: &str = "    ";

/// One node of a descriptor tree.
///
/// Attributes keep their insertion order.  A comment node renders its tag as
/// the comment text and ignores attributes and children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorNode {
    pub tag: String,
    pub text: String,
    pub comment: bool,
    /// Render the text as an indented block instead of inline
    pub indent_text: bool,
    attrs: Vec<(String, String)>,
    children: Vec<DescriptorNode>,
}

impl DescriptorNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn new_comment(text: impl Into<String>) -> Self {
        Self {
            tag: text.into(),
            comment: true,
            ..Default::default()
        }
    }

    /// Appends a child and returns its index
    pub fn push(&mut self, child: DescriptorNode) -> usize {
        self.children.push(child);
        self.children.len() - 1
    }

    /// Appends an empty child and returns it
    pub fn add_node(&mut self, tag: impl Into<String>) -> &mut DescriptorNode {
        let index = self.push(DescriptorNode::new(tag));
        &mut self.children[index]
    }

    /// Appends a child holding text and returns it
    pub fn add_text_node(
        &mut self,
        tag: impl Into<String>,
        text: impl Into<String>,
    ) -> &mut DescriptorNode {
        let index = self.push(DescriptorNode::with_text(tag, text));
        &mut self.children[index]
    }

    /// Appends a comment and returns its index
    pub fn add_comment(&mut self, text: impl Into<String>) -> usize {
        self.push(DescriptorNode::new_comment(text))
    }

    pub fn add_attr(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn add_int_attr(&mut self, name: impl Into<String>, value: usize) -> &mut Self {
        self.add_attr(name, value.to_string())
    }

    /// Replaces the value of an attribute, appending it if not present
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
        self
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = text.into();
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    pub fn children(&self) -> &[DescriptorNode] {
        &self.children
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut DescriptorNode> {
        self.children.get_mut(index)
    }

    /// The child at `index`, or this node if there is none
    pub fn child_or_self(&mut self, index: Option<usize>) -> &mut DescriptorNode {
        match index {
            Some(ii) if ii < self.children.len() => &mut self.children[ii],
            _ => self,
        }
    }

    /// First direct child with this tag
    pub fn get_node(&self, tag: &str) -> Option<&DescriptorNode> {
        self.children.iter().find(|c| !c.comment && c.tag == tag)
    }

    /// Depth-first search, including this node
    pub fn find<F>(&self, pred: F) -> Option<&DescriptorNode>
    where
        F: Fn(&DescriptorNode) -> bool + Copy,
    {
        if pred(self) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(pred))
    }

    pub fn find_mut<F>(&mut self, pred: F) -> Option<&mut DescriptorNode>
    where
        F: Fn(&DescriptorNode) -> bool + Copy,
    {
        if pred(self) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(pred))
    }

    /// Depth-first search by tag.  Comments never match.
    pub fn find_tag(&self, tag: &str) -> Option<&DescriptorNode> {
        self.find(|n| !n.comment && n.tag == tag)
    }

    fn dump(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = INDENT.repeat(depth);
        if self.comment {
            return write!(f, "{indent}<!-- {} -->", self.tag);
        }

        write!(f, "{indent}<{}", self.tag)?;
        for (name, value) in self.attrs.iter() {
            write!(f, " {name}=\"{}\"", escape(value))?;
        }

        if !self.text.is_empty() {
            write!(f, ">")?;
            if self.indent_text {
                for line in escape(&self.text).split('\n') {
                    write!(f, "\n{indent}")?;
                    if !line.is_empty() {
                        write!(f, "{INDENT}{line}")?;
                    }
                }
            } else {
                write!(f, "{}", escape(&self.text))?;
            }
            write!(f, "</{}>", self.tag)
        } else if !self.children.is_empty() {
            write!(f, ">")?;
            for child in self.children.iter() {
                writeln!(f)?;
                child.dump(f, depth + 1)?;
            }
            write!(f, "\n{indent}</{}>", self.tag)
        } else {
            write!(f, "/>")
        }
    }
}

impl fmt::Display for DescriptorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dump(f, 0)
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('\'', "&apos;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Formats bytes as upper case hex, `cols` bytes per line
pub fn hexdump(data: &[u8], cols: usize) -> String {
    let mut out = String::with_capacity(data.len() * 3);
    for (ii, byte) in data.iter().enumerate() {
        out.push_str(&format!("{byte:02X}"));
        out.push(if ii % cols == cols - 1 { '\n' } else { ' ' });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hexdump() {
        assert_eq!(hexdump(&[0x00, 0x1c, 0xff], 2), "00 1C\nFF ");
        assert_eq!(hexdump(&[], 8), "");
    }

    #[test]
    fn test_dump() {
        let mut root = DescriptorNode::new("rom");
        root.add_attr("index", "0").add_attr("zip", "a.zip|b.zip");
        root.add_comment("maincpu - starts at 0x0");
        root.add_node("part")
            .add_attr("name", "a&b.bin")
            .add_attr("crc", "12345678");
        root.add_text_node("part", " FF").add_attr("repeat", "0x10");
        let block = root.add_text_node("part", "00 01\n02 03\n");
        block.indent_text = true;

        let expected = "<rom index=\"0\" zip=\"a.zip|b.zip\">\n\
                        \x20   <!-- maincpu - starts at 0x0 -->\n\
                        \x20   <part name=\"a&amp;b.bin\" crc=\"12345678\"/>\n\
                        \x20   <part repeat=\"0x10\"> FF</part>\n\
                        \x20   <part>\n\
                        \x20       00 01\n\
                        \x20       02 03\n\
                        \x20   </part>\n\
                        </rom>";
        assert_eq!(root.to_string(), expected);
    }

    #[test]
    fn test_find_and_set() {
        let mut root = DescriptorNode::new("misterromdescription");
        root.add_text_node("setname", "1942");
        root.add_node("rom").add_attr("index", "1");
        root.add_node("rom").add_attr("index", "0").add_attr("md5", "None");

        assert_eq!(root.find_tag("setname").map(|n| n.text.as_str()), Some("1942"));
        let rom = root
            .find_mut(|n| n.tag == "rom" && n.attr("index") == Some("0"))
            .unwrap();
        rom.set_attr("md5", "abc").set_attr("asm_md5", "def");
        assert_eq!(rom.attrs().len(), 3);
        assert_eq!(rom.attr("md5"), Some("abc"));
    }
}
