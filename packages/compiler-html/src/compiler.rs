use crate::styled::{StyledContent, StyledNode};
use folio_parser::ast::*;

/// Attribute on the root element identifying rendered report markup
pub const ROOT_MARKER: &str = "data-folio";
pub const ROOT_CLASS: &str = "folio-report";
pub const EMPTY_STATE_TEXT: &str = "No content";

/// Options for standalone document export
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Document title placed in `<title>`
    pub title: String,
    /// Pretty print the document skeleton
    pub pretty: bool,
    /// Indentation string
    pub indent: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            title: "Report".to_string(),
            pretty: true,
            indent: "  ".to_string(),
        }
    }
}

/// Styles shipped with exported documents
const STYLESHEET: &[&str] = &[
    "body { font-family: Georgia, serif; max-width: 48rem; margin: 2rem auto; line-height: 1.6; color: #222; }",
    ".folio-report h1, .folio-report h2, .folio-report h3 { font-family: Helvetica, Arial, sans-serif; }",
    ".confidence { padding: 0 0.2em; border-radius: 3px; }",
    ".confidence-high { background: #e3f5e1; }",
    ".confidence-medium { background: #fff4d6; }",
    ".confidence-low { background: #fde2e1; }",
    ".confidence-no-data { background: #eceff1; font-style: italic; }",
    ".source-citation { border-bottom: 1px dotted #3366ff; }",
    ".source-citation::after { content: \" [\" attr(data-source) \"]\"; font-size: 0.8em; color: #3366ff; }",
    ".chart-placeholder { border: 2px dashed #9aa5b1; padding: 2rem; text-align: center; color: #52606d; }",
    ".metadata { background: #f5f7fa; border-left: 4px solid #9aa5b1; padding: 0.5rem 1rem; }",
    ".metadata-body { white-space: pre-wrap; font-family: inherit; margin: 0; }",
    ".draft-notice { background: #fff3cd; border: 1px solid #ffc107; padding: 0.5rem 1rem; font-weight: bold; }",
    ".empty-state { color: #9aa5b1; font-style: italic; }",
];

struct Context {
    options: ExportOptions,
    depth: usize,
    buffer: String,
}

impl Context {
    fn new(options: ExportOptions) -> Self {
        Self {
            options,
            depth: 0,
            buffer: String::new(),
        }
    }

    fn add(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn add_line(&mut self, text: &str) {
        if self.options.pretty {
            self.add_indent();
        }
        self.add(text);
        if self.options.pretty {
            self.add("\n");
        }
    }

    fn add_indent(&mut self) {
        for _ in 0..self.depth {
            self.buffer.push_str(&self.options.indent);
        }
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        if self.depth > 0 {
            self.depth -= 1;
        }
    }

    fn get_output(self) -> String {
        self.buffer
    }
}

/// Map every node to its presentational form. Total and deterministic; the
/// annotation kind of every span survives in `data-*` attributes.
pub fn render(document: &Document) -> StyledContent {
    StyledContent {
        blocks: document.nodes.iter().map(render_node).collect(),
    }
}

/// Render straight to the surface markup
pub fn render_html(document: &Document) -> String {
    render(document).to_html()
}

fn render_node(node: &Node) -> StyledNode {
    match node {
        Node::Heading { level, content } => {
            let level = (*level).clamp(1, 3);
            StyledNode::element(format!("h{}", level))
                .with_attr("data-node", "heading")
                .with_attr("data-level", level.to_string())
                .with_children(render_inlines(content))
        }

        Node::Paragraph { content } => StyledNode::element("p")
            .with_attr("data-node", "paragraph")
            .with_children(render_inlines(content)),

        Node::List(list) => {
            let tag = if list.ordered { "ol" } else { "ul" };
            let items = list
                .items
                .iter()
                .map(|item| {
                    StyledNode::element("li")
                        .with_attr("data-node", "list-item")
                        .with_children(render_inlines(&item.content))
                })
                .collect();

            StyledNode::element(tag)
                .with_attr("data-node", "list")
                .with_attr("data-ordered", list.ordered.to_string())
                .with_children(items)
        }

        Node::ChartPlaceholder { description } => StyledNode::element("div")
            .with_attr("class", "chart-placeholder")
            .with_attr("data-node", "chart")
            .with_attr("data-description", description.clone())
            .with_child(StyledNode::text(format!("Chart: {}", description))),

        Node::MetadataSection { kind, raw_text } => StyledNode::element("section")
            .with_attr("class", format!("metadata metadata-{}", kind.as_str()))
            .with_attr("data-node", "metadata")
            .with_attr("data-kind", kind.as_str())
            .with_child(
                StyledNode::element("h4")
                    .with_attr("class", "metadata-title")
                    .with_child(StyledNode::text(kind.title())),
            )
            .with_child(
                StyledNode::element("pre")
                    .with_attr("class", "metadata-body")
                    .with_child(StyledNode::text(raw_text.clone())),
            ),

        Node::DraftNotice { text } => StyledNode::element("div")
            .with_attr("class", "draft-notice")
            .with_attr("data-node", "draft-notice")
            .with_child(StyledNode::text(text.clone())),
    }
}

fn render_inlines(content: &[Inline]) -> Vec<StyledNode> {
    content.iter().map(render_inline).collect()
}

fn render_inline(inline: &Inline) -> StyledNode {
    let text = with_marks(StyledNode::text(inline.as_text()), inline.marks());

    match inline {
        Inline::Text { .. } => text,
        Inline::Confidence(marker) => {
            let level = marker.level.as_str();
            let span = StyledNode::element("span")
                .with_attr("class", format!("confidence confidence-{}", level))
                .with_attr("data-node", "confidence")
                .with_attr("data-level", level);
            if marker.text.is_empty() {
                span
            } else {
                span.with_child(text)
            }
        }
        Inline::Citation(citation) => {
            let span = StyledNode::element("span")
                .with_attr("class", "source-citation")
                .with_attr("data-node", "citation")
                .with_attr("data-source", citation.source.clone());
            if citation.text.is_empty() {
                span
            } else {
                span.with_child(text)
            }
        }
    }
}

/// Wrap as `strong > em > u > text`
fn with_marks(node: StyledNode, marks: Marks) -> StyledNode {
    let mut node = node;
    if marks.underline {
        node = StyledNode::element("u").with_child(node);
    }
    if marks.italic {
        node = StyledNode::element("em").with_child(node);
    }
    if marks.bold {
        node = StyledNode::element("strong").with_child(node);
    }
    node
}

impl StyledContent {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Compact surface markup, wrapped in the report root element
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "<article class=\"{}\" {}=\"1\">",
            ROOT_CLASS, ROOT_MARKER
        ));

        if self.blocks.is_empty() {
            out.push_str(&format!(
                "<p class=\"empty-state\" data-node=\"empty\">{}</p>",
                EMPTY_STATE_TEXT
            ));
        }
        for block in &self.blocks {
            write_node(block, &mut out);
        }

        out.push_str("</article>");
        out
    }
}

fn write_node(node: &StyledNode, out: &mut String) {
    match node {
        StyledNode::Text { content } => out.push_str(&escape_html(content)),
        StyledNode::Element {
            tag,
            attributes,
            children,
        } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attributes {
                out.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
            }

            if children.is_empty() && is_self_closing(tag) {
                out.push_str(" />");
                return;
            }
            out.push('>');

            for child in children {
                write_node(child, out);
            }

            out.push_str(&format!("</{}>", tag));
        }
    }
}

/// Wrap rendered content in a standalone HTML file
pub fn export_document(content_html: &str, options: &ExportOptions) -> String {
    let mut ctx = Context::new(options.clone());

    ctx.add_line("<!DOCTYPE html>");
    ctx.add_line("<html lang=\"en\">");
    ctx.indent();

    ctx.add_line("<head>");
    ctx.indent();
    ctx.add_line("<meta charset=\"UTF-8\">");
    ctx.add_line("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">");
    ctx.add_line(&format!("<title>{}</title>", escape_html(&options.title)));
    ctx.add_line("<style>");
    ctx.indent();
    for rule in STYLESHEET {
        ctx.add_line(rule);
    }
    ctx.dedent();
    ctx.add_line("</style>");
    ctx.dedent();
    ctx.add_line("</head>");

    ctx.add_line("<body>");
    ctx.indent();
    ctx.add_line(content_html.trim());
    ctx.dedent();
    ctx.add_line("</body>");

    ctx.dedent();
    ctx.add_line("</html>");

    ctx.get_output()
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub(crate) fn is_self_closing(tag: &str) -> bool {
    matches!(
        tag,
        "img" | "input" | "br" | "hr" | "meta" | "link" | "area" | "base" | "col" | "embed" | "source" | "wbr"
    )
}
