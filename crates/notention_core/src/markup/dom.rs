//! Tolerant markup tree used for both note bodies and the editable surface.
//!
//! # Responsibility
//! - Tokenize the HTML-like note markup into an element/text tree.
//! - Decode and escape character references.
//!
//! # Invariants
//! - Parsing never fails: unknown or broken syntax degrades to text.
//! - Unbalanced close tags are ignored; unclosed elements close at the end.
//! - Adjacent text children are merged.

/// Class carried by every widget element.
pub const WIDGET_CLASS: &str = "widget";
/// Class of tag widgets.
pub const TAG_CLASS: &str = "tag";
/// Class of property widgets.
pub const PROPERTY_CLASS: &str = "property";

const ROOT_TAG: &str = "#root";
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "meta", "link", "wbr"];

/// Kind of a widget element on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    Tag,
    Property,
}

/// Node of the markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Element(Element),
    Text(String),
}

impl MarkupNode {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::Element(element) => {
                for child in &element.children {
                    child.push_text(out);
                }
            }
        }
    }
}

/// Element with lowercase tag name and ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<MarkupNode>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    fn root() -> Self {
        Self::new(ROOT_TAG)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }

    /// Widget classification from the class list.
    pub fn widget_kind(&self) -> Option<WidgetKind> {
        if !self.has_class(WIDGET_CLASS) {
            return None;
        }
        if self.has_class(TAG_CLASS) {
            Some(WidgetKind::Tag)
        } else if self.has_class(PROPERTY_CLASS) {
            Some(WidgetKind::Property)
        } else {
            None
        }
    }

    /// Paragraph-level containers of the document.
    pub fn is_block_container(&self) -> bool {
        matches!(self.tag.as_str(), "p" | "div")
    }

    /// Follows a child-index path from this element.
    pub fn node_at(&self, path: &[usize]) -> Option<&MarkupNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get(*first)?;
        for index in rest {
            node = node.as_element()?.children.get(*index)?;
        }
        Some(node)
    }

    fn push_child(&mut self, node: MarkupNode) {
        if let MarkupNode::Text(text) = &node {
            if text.is_empty() {
                return;
            }
            if let Some(MarkupNode::Text(last)) = self.children.last_mut() {
                last.push_str(text);
                return;
            }
        }
        self.children.push(node);
    }
}

/// Parses a markup fragment into a synthetic root element.
pub fn parse_fragment(markup: &str) -> Element {
    let mut stack: Vec<Element> = vec![Element::root()];
    let bytes = markup.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] == b'<' {
            if markup[pos..].starts_with("<!--") {
                pos = markup[pos + 4..]
                    .find("-->")
                    .map_or(bytes.len(), |end| pos + 4 + end + 3);
                continue;
            }
            if markup[pos..].starts_with("</") {
                if let Some(end) = markup[pos..].find('>') {
                    let name = markup[pos + 2..pos + end].trim().to_ascii_lowercase();
                    close_element(&mut stack, &name);
                    pos += end + 1;
                    continue;
                }
            } else if markup[pos..].starts_with("<!") || markup[pos..].starts_with("<?") {
                pos = markup[pos..].find('>').map_or(bytes.len(), |end| pos + end + 1);
                continue;
            } else if bytes.get(pos + 1).is_some_and(u8::is_ascii_alphabetic) {
                if let Some((element, self_closing, consumed)) = parse_start_tag(&markup[pos..]) {
                    pos += consumed;
                    if self_closing || VOID_ELEMENTS.contains(&element.tag.as_str()) {
                        current(&mut stack).push_child(MarkupNode::Element(element));
                    } else {
                        stack.push(element);
                    }
                    continue;
                }
            }
        }

        // Text runs to the next '<' (a stray '<' is kept as text).
        let step = markup[pos..].chars().next().map_or(1, char::len_utf8);
        let next = markup[pos + step..]
            .find('<')
            .map_or(bytes.len(), |offset| pos + step + offset);
        current(&mut stack).push_child(MarkupNode::Text(decode_entities(&markup[pos..next])));
        pos = next;
    }

    while let Some(element) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.push_child(MarkupNode::Element(element)),
            None => return element,
        }
    }
    Element::root()
}

fn current(stack: &mut Vec<Element>) -> &mut Element {
    if stack.is_empty() {
        stack.push(Element::root());
    }
    let last = stack.len() - 1;
    &mut stack[last]
}

fn close_element(stack: &mut Vec<Element>, name: &str) {
    let Some(open_at) = stack.iter().rposition(|element| element.tag == name) else {
        return;
    };
    if open_at == 0 {
        return;
    }
    while stack.len() > open_at {
        let Some(element) = stack.pop() else {
            return;
        };
        current(stack).push_child(MarkupNode::Element(element));
    }
}

/// Parses `<tag attr=...>` at the start of `input`.
///
/// Returns the element, whether it was self-closed, and the bytes consumed.
fn parse_start_tag(input: &str) -> Option<(Element, bool, usize)> {
    let bytes = input.as_bytes();
    let mut pos = 1;
    while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'-') {
        pos += 1;
    }
    let mut element = Element::new(input[1..pos].to_ascii_lowercase());

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        match bytes.get(pos)? {
            b'>' => return Some((element, false, pos + 1)),
            b'/' => {
                if bytes.get(pos + 1) == Some(&b'>') {
                    return Some((element, true, pos + 2));
                }
                pos += 1;
                continue;
            }
            _ => {}
        }

        let name_start = pos;
        while pos < bytes.len()
            && !bytes[pos].is_ascii_whitespace()
            && !matches!(bytes[pos], b'=' | b'>' | b'/')
        {
            pos += 1;
        }
        let name = input[name_start..pos].to_ascii_lowercase();

        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let mut value = String::new();
        if bytes.get(pos) == Some(&b'=') {
            pos += 1;
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            match bytes.get(pos)? {
                quote @ (b'"' | b'\'') => {
                    let close = input[pos + 1..].find(*quote as char)?;
                    value = decode_entities(&input[pos + 1..pos + 1 + close]);
                    pos += close + 2;
                }
                _ => {
                    let start = pos;
                    while pos < bytes.len()
                        && !bytes[pos].is_ascii_whitespace()
                        && bytes[pos] != b'>'
                    {
                        pos += 1;
                    }
                    value = decode_entities(&input[start..pos]);
                }
            }
        }
        if !name.is_empty() && element.attr(&name).is_none() {
            element.attrs.push((name, value));
        }
    }
}

/// Decodes named and numeric character references; unknown ones are kept.
pub fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest[1..]
            .find(';')
            .filter(|end| *end <= 10)
            .and_then(|end| decode_reference(&rest[1..1 + end]).map(|ch| (ch, end + 2)));
        match decoded {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &rest[consumed..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse::<u32>().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// Escapes text content.
pub fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escapes a value for a double-quoted attribute or interpolated markup.
pub fn escape_attr(value: &str) -> String {
    escape_text(value)
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}
