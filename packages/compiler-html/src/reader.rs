//! # Surface Reader
//!
//! Recovers a [`Document`] from surface markup: the HTML produced by
//! [`render_html`](crate::render_html), possibly after native edits.
//!
//! ```text
//! markup → MarkupToken (logos) → StyledNode tree → Document
//! ```
//!
//! Elements carrying `data-node` are read exactly. Anything else is read
//! leniently by tag name, and unknown inline markup keeps its text.

use crate::compiler::{is_self_closing, ROOT_MARKER};
use crate::error::{SurfaceError, SurfaceResult};
use crate::styled::StyledNode;
use folio_parser::ast::*;
use logos::Logos;
use std::collections::BTreeMap;

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
enum MarkupToken<'src> {
    #[regex(r"<![^>]*>")]
    Declaration,

    #[regex(r"</[a-zA-Z][a-zA-Z0-9]*[ \t\r\n]*>", |lex| close_tag_name(lex.slice()))]
    CloseTag(&'src str),

    #[regex(r"<[a-zA-Z][^>]*>", |lex| lex.slice())]
    OpenTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

fn close_tag_name(slice: &str) -> &str {
    slice.trim_start_matches("</").trim_end_matches('>').trim()
}

/// True when the input is rendered surface markup rather than raw text
pub fn is_surface_markup(input: &str) -> bool {
    input.trim_start().starts_with('<') && input.contains(&format!("{}=", ROOT_MARKER))
}

/// Read surface markup back into the annotation model
pub fn read_surface(html: &str) -> SurfaceResult<Document> {
    let tree = read_markup(html);
    let mut reader = BlockReader::default();
    reader.read_blocks(surface_root(&tree))?;
    Ok(Document::from_nodes(reader.finish()))
}

struct Frame {
    tag: String,
    attributes: BTreeMap<String, String>,
    children: Vec<StyledNode>,
}

impl Frame {
    fn new(tag: impl Into<String>, attributes: BTreeMap<String, String>) -> Self {
        Self {
            tag: tag.into(),
            attributes,
            children: Vec::new(),
        }
    }

    fn push_text(&mut self, text: String) {
        if let Some(StyledNode::Text { content }) = self.children.last_mut() {
            content.push_str(&text);
        } else {
            self.children.push(StyledNode::Text { content: text });
        }
    }

    fn into_node(self) -> StyledNode {
        StyledNode::Element {
            tag: self.tag,
            attributes: self.attributes,
            children: self.children,
        }
    }
}

/// Build a tolerant element tree. Unmatched close tags are ignored and
/// unclosed elements are closed at the end of input.
pub fn read_markup(html: &str) -> Vec<StyledNode> {
    let mut stack = vec![Frame::new("", BTreeMap::new())];
    let mut lexer = MarkupToken::lexer(html);

    while let Some(token) = lexer.next() {
        let frame_count = stack.len();
        match token {
            Ok(MarkupToken::Declaration) => {}
            Ok(MarkupToken::OpenTag(slice)) => {
                let (tag, attributes, self_closing) = parse_open_tag(slice);
                if self_closing || is_self_closing(&tag) {
                    stack[frame_count - 1]
                        .children
                        .push(Frame::new(tag, attributes).into_node());
                } else {
                    stack.push(Frame::new(tag, attributes));
                }
            }
            Ok(MarkupToken::CloseTag(name)) => {
                let name = name.to_ascii_lowercase();
                if let Some(pos) = stack.iter().skip(1).rposition(|frame| frame.tag == name) {
                    close_frames(&mut stack, pos + 1);
                }
            }
            Ok(MarkupToken::Text(text)) => stack[frame_count - 1].push_text(decode_entities(text)),
            Err(_) => stack[frame_count - 1].push_text(decode_entities(lexer.slice())),
        }
    }

    close_frames(&mut stack, 1);
    stack.pop().map(|root| root.children).unwrap_or_default()
}

/// Pop frames until the stack has `depth` entries, attaching each to its parent
fn close_frames(stack: &mut Vec<Frame>, depth: usize) {
    while stack.len() > depth.max(1) {
        if let Some(frame) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                parent.children.push(frame.into_node());
            }
        }
    }
}

fn parse_open_tag(slice: &str) -> (String, BTreeMap<String, String>, bool) {
    let inner = slice.trim_start_matches('<').trim_end_matches('>');
    let self_closing = inner.trim_end().ends_with('/');
    let inner = inner.trim_end().trim_end_matches('/');

    let name_len = inner
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(inner.len());
    let tag = inner[..name_len].to_ascii_lowercase();

    (tag, parse_attributes(&inner[name_len..]), self_closing)
}

fn parse_attributes(mut rest: &str) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        let name_len = rest
            .find(|c: char| c.is_whitespace() || c == '=')
            .unwrap_or(rest.len());
        let name = rest[..name_len].to_ascii_lowercase();
        rest = rest[name_len..].trim_start();

        let value = if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            match after_eq.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let body = &after_eq[1..];
                    let end = body.find(quote).unwrap_or(body.len());
                    rest = body.get(end + 1..).unwrap_or("");
                    &body[..end]
                }
                _ => {
                    let end = after_eq.find(char::is_whitespace).unwrap_or(after_eq.len());
                    rest = &after_eq[end..];
                    &after_eq[..end]
                }
            }
        } else {
            ""
        };

        if !name.is_empty() {
            attributes.insert(name, decode_entities(value));
        }
    }

    attributes
}

const ENTITIES: &[(&str, char)] = &[
    ("&amp;", '&'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&quot;", '"'),
    ("&#39;", '\''),
    ("&apos;", '\''),
];

/// Decode the basic character entities; anything else is kept verbatim
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match ENTITIES.iter().find(|(entity, _)| tail.starts_with(entity)) {
            Some((entity, ch)) => {
                out.push(*ch);
                rest = &tail[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Children of the report root, else of `<body>`, else the whole tree
fn surface_root(tree: &[StyledNode]) -> &[StyledNode] {
    find_element(tree, &|node| node.attr(ROOT_MARKER).is_some())
        .or_else(|| find_element(tree, &|node| node.tag() == Some("body")))
        .map(StyledNode::children)
        .unwrap_or(tree)
}

fn find_element<'a>(
    nodes: &'a [StyledNode],
    predicate: &dyn Fn(&StyledNode) -> bool,
) -> Option<&'a StyledNode> {
    for node in nodes {
        if predicate(node) {
            return Some(node);
        }
        if let Some(found) = find_element(node.children(), predicate) {
            return Some(found);
        }
    }
    None
}

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "header", "footer", "aside", "blockquote", "pre",
    "ul", "ol", "li", "h1", "h2", "h3", "h4", "h5", "h6", "table", "body", "html",
];

const SKIPPED_TAGS: &[&str] = &["head", "title", "style", "script", "meta", "link"];

fn is_block(node: &StyledNode) -> bool {
    node.tag().map(|tag| BLOCK_TAGS.contains(&tag)).unwrap_or(false)
}

fn has_block_children(node: &StyledNode) -> bool {
    node.children().iter().any(is_block)
}

#[derive(Default)]
struct BlockReader {
    nodes: Vec<Node>,
    /// Loose inline content waiting to become a paragraph
    pending: Vec<Inline>,
}

impl BlockReader {
    fn finish(mut self) -> Vec<Node> {
        self.flush();
        self.nodes
    }

    fn flush(&mut self) {
        let content = tidy_inlines(std::mem::take(&mut self.pending));
        if !content.is_empty() {
            self.nodes.push(Node::paragraph(content));
        }
    }

    fn read_blocks(&mut self, nodes: &[StyledNode]) -> SurfaceResult<()> {
        for node in nodes {
            self.read_block(node)?;
        }
        Ok(())
    }

    fn read_block(&mut self, node: &StyledNode) -> SurfaceResult<()> {
        let tag = match node {
            StyledNode::Text { content } => {
                if !(self.pending.is_empty() && content.trim().is_empty()) {
                    self.pending.push(Inline::text(content.clone()));
                }
                return Ok(());
            }
            StyledNode::Element { tag, .. } => tag.as_str(),
        };

        match node.attr("data-node") {
            Some(kind) => self.read_annotated(kind, node),
            None if SKIPPED_TAGS.contains(&tag) => Ok(()),
            None => self.read_by_tag(tag, node),
        }
    }

    fn read_annotated(&mut self, kind: &str, node: &StyledNode) -> SurfaceResult<()> {
        if matches!(kind, "confidence" | "citation") {
            collect_inline(node, Marks::default(), &Annotation::None, &mut self.pending)?;
            return Ok(());
        }

        self.flush();
        match kind {
            "heading" => {
                let raw = node
                    .attr("data-level")
                    .ok_or_else(|| SurfaceError::missing_attribute(kind, "data-level"))?;
                let level: u8 = raw
                    .parse()
                    .map_err(|_| SurfaceError::invalid_attribute(kind, "data-level", raw))?;
                self.push_heading(level, node)?;
            }
            "paragraph" | "list-item" => self.push_paragraph(node)?,
            "list" => {
                let ordered = match node.attr("data-ordered") {
                    Some("true") => true,
                    Some("false") => false,
                    Some(other) => {
                        return Err(SurfaceError::invalid_attribute(kind, "data-ordered", other))
                    }
                    None => node.tag() == Some("ol"),
                };
                self.push_list(ordered, node)?;
            }
            "chart" => {
                let description = node
                    .attr("data-description")
                    .ok_or_else(|| SurfaceError::missing_attribute(kind, "data-description"))?;
                self.nodes.push(Node::ChartPlaceholder {
                    description: description.to_string(),
                });
            }
            "metadata" => {
                let raw = node
                    .attr("data-kind")
                    .ok_or_else(|| SurfaceError::missing_attribute(kind, "data-kind"))?;
                let metadata_kind = MetadataKind::from_str_opt(raw)
                    .ok_or_else(|| SurfaceError::invalid_attribute(kind, "data-kind", raw))?;
                let body = node
                    .children()
                    .iter()
                    .find(|child| child.has_class("metadata-body"))
                    .unwrap_or(node);
                self.nodes.push(Node::MetadataSection {
                    kind: metadata_kind,
                    raw_text: body.text_content(),
                });
            }
            "draft-notice" => self.nodes.push(Node::DraftNotice {
                text: node.text_content(),
            }),
            "empty" => {}
            other => return Err(SurfaceError::UnknownNode(other.to_string())),
        }
        Ok(())
    }

    fn read_by_tag(&mut self, tag: &str, node: &StyledNode) -> SurfaceResult<()> {
        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush();
                let level = tag[1..].parse::<u8>().unwrap_or(1);
                self.push_heading(level, node)
            }
            "ul" | "ol" => {
                self.flush();
                self.push_list(tag == "ol", node)
            }
            "br" => {
                self.flush();
                Ok(())
            }
            _ if is_block(node) => {
                self.flush();
                if has_block_children(node) {
                    self.read_blocks(node.children())?;
                    self.flush();
                    Ok(())
                } else {
                    self.push_paragraph(node)
                }
            }
            _ => collect_inline(node, Marks::default(), &Annotation::None, &mut self.pending),
        }
    }

    fn push_heading(&mut self, level: u8, node: &StyledNode) -> SurfaceResult<()> {
        let content = read_inlines(node.children())?;
        if !content.is_empty() {
            self.nodes.push(Node::heading(level.clamp(1, 3), content));
        }
        Ok(())
    }

    fn push_paragraph(&mut self, node: &StyledNode) -> SurfaceResult<()> {
        let content = read_inlines(node.children())?;
        if !content.is_empty() {
            self.nodes.push(Node::paragraph(content));
        }
        Ok(())
    }

    fn push_list(&mut self, ordered: bool, node: &StyledNode) -> SurfaceResult<()> {
        let mut items = Vec::new();
        for child in node.children() {
            if child.tag() == Some("li") {
                items.push(ListItem {
                    content: read_inlines(child.children())?,
                });
            }
        }
        if !items.is_empty() {
            self.nodes.push(Node::List(ListBlock { ordered, items }));
        }
        Ok(())
    }
}

/// Annotation inherited by text inside a marker span
enum Annotation {
    None,
    Confidence(ConfidenceLevel),
    Citation(String),
}

impl Annotation {
    fn inline(&self, text: impl Into<String>, marks: Marks) -> Inline {
        let mut inline = match self {
            Annotation::None => Inline::text(text),
            Annotation::Confidence(level) => Inline::confidence(*level, text),
            Annotation::Citation(source) => Inline::citation(source.clone(), text),
        };
        *inline.marks_mut() = marks;
        inline
    }
}

fn read_inlines(nodes: &[StyledNode]) -> SurfaceResult<Vec<Inline>> {
    let mut out = Vec::new();
    for node in nodes {
        collect_inline(node, Marks::default(), &Annotation::None, &mut out)?;
    }
    Ok(tidy_inlines(out))
}

fn collect_inline(
    node: &StyledNode,
    marks: Marks,
    annotation: &Annotation,
    out: &mut Vec<Inline>,
) -> SurfaceResult<()> {
    let tag = match node {
        StyledNode::Text { content } => {
            out.push(annotation.inline(content.clone(), marks));
            return Ok(());
        }
        StyledNode::Element { tag, .. } => tag.as_str(),
    };

    match node.attr("data-node") {
        Some(kind @ "confidence") => {
            let raw = node
                .attr("data-level")
                .ok_or_else(|| SurfaceError::missing_attribute(kind, "data-level"))?;
            let level = ConfidenceLevel::from_str_opt(raw)
                .ok_or_else(|| SurfaceError::invalid_attribute(kind, "data-level", raw))?;
            return collect_marker(node, marks, Annotation::Confidence(level), out);
        }
        Some(kind @ "citation") => {
            let source = node
                .attr("data-source")
                .ok_or_else(|| SurfaceError::missing_attribute(kind, "data-source"))?;
            return collect_marker(node, marks, Annotation::Citation(source.to_string()), out);
        }
        _ => {}
    }

    let mut marks = marks;
    match tag {
        "strong" | "b" => marks.bold = true,
        "em" | "i" => marks.italic = true,
        "u" => marks.underline = true,
        "br" => {
            out.push(annotation.inline(" ", marks));
            return Ok(());
        }
        _ => {}
    }

    for child in node.children() {
        collect_inline(child, marks, annotation, out)?;
    }
    Ok(())
}

/// A marker span with no text still yields an (empty) marker
fn collect_marker(
    node: &StyledNode,
    marks: Marks,
    annotation: Annotation,
    out: &mut Vec<Inline>,
) -> SurfaceResult<()> {
    let before = out.len();
    for child in node.children() {
        collect_inline(child, marks, &annotation, out)?;
    }
    if out.len() == before {
        out.push(annotation.inline("", marks));
    }
    Ok(())
}

/// Normalize and trim whitespace at the edges of a block
fn tidy_inlines(content: Vec<Inline>) -> Vec<Inline> {
    let mut content = normalize_inlines(content);

    if let Some(first) = content.first_mut() {
        let trimmed = first.as_text().trim_start().to_string();
        *first = first.with_text(trimmed);
    }
    if let Some(last) = content.last_mut() {
        let trimmed = last.as_text().trim_end().to_string();
        *last = last.with_text(trimmed);
    }

    normalize_inlines(content)
}
