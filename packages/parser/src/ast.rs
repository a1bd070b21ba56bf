use serde::{Deserialize, Serialize};
use std::fmt;

/// Formatted report: an ordered sequence of annotated block nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub nodes: Vec<Node>,
}

/// Block-level annotation node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Heading { level: u8, content: Vec<Inline> },
    Paragraph { content: Vec<Inline> },
    List(ListBlock),
    ChartPlaceholder { description: String },
    #[serde(rename_all = "camelCase")]
    MetadataSection { kind: MetadataKind, raw_text: String },
    DraftNotice { text: String },
}

/// Contiguous run of same-kind list items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBlock {
    pub ordered: bool,
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub content: Vec<Inline>,
}

/// Inline run inside a heading, paragraph or list item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Inline {
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Marks::is_plain")]
        marks: Marks,
    },
    Confidence(ConfidenceMarker),
    Citation(SourceCitation),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceMarker {
    pub level: ConfidenceLevel,
    pub text: String,
    #[serde(default, skip_serializing_if = "Marks::is_plain")]
    pub marks: Marks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCitation {
    pub source: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Marks::is_plain")]
    pub marks: Marks,
}

/// Rich-text marks applied by editing commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Marks {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
}

impl Marks {
    pub fn is_plain(&self) -> bool {
        !(self.bold || self.italic || self.underline)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
    NoData,
}

impl ConfidenceLevel {
    pub fn all() -> &'static [ConfidenceLevel] {
        &[
            ConfidenceLevel::High,
            ConfidenceLevel::Medium,
            ConfidenceLevel::Low,
            ConfidenceLevel::NoData,
        ]
    }

    /// Stable identifier used in rendered attributes and class names
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::NoData => "no-data",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "High Confidence",
            ConfidenceLevel::Medium => "Medium Confidence",
            ConfidenceLevel::Low => "Low Confidence",
            ConfidenceLevel::NoData => "No Data",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|level| level.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kind of ring-fenced metadata block emitted by the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetadataKind {
    ConfidenceLevels,
    DraftStatus,
    SourceCitations,
    UserRequirements,
}

impl MetadataKind {
    pub fn all() -> &'static [MetadataKind] {
        &[
            MetadataKind::ConfidenceLevels,
            MetadataKind::DraftStatus,
            MetadataKind::SourceCitations,
            MetadataKind::UserRequirements,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataKind::ConfidenceLevels => "confidence-levels",
            MetadataKind::DraftStatus => "draft-status",
            MetadataKind::SourceCitations => "source-citations",
            MetadataKind::UserRequirements => "user-requirements",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            MetadataKind::ConfidenceLevels => "Confidence Levels",
            MetadataKind::DraftStatus => "Draft Status",
            MetadataKind::SourceCitations => "Source Citations",
            MetadataKind::UserRequirements => "User Requirements",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value)
    }
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text {
            text: text.into(),
            marks: Marks::default(),
        }
    }

    pub fn confidence(level: ConfidenceLevel, text: impl Into<String>) -> Self {
        Inline::Confidence(ConfidenceMarker {
            level,
            text: text.into(),
            marks: Marks::default(),
        })
    }

    pub fn citation(source: impl Into<String>, text: impl Into<String>) -> Self {
        Inline::Citation(SourceCitation {
            source: source.into(),
            text: text.into(),
            marks: Marks::default(),
        })
    }

    pub fn as_text(&self) -> &str {
        match self {
            Inline::Text { text, .. } => text,
            Inline::Confidence(marker) => &marker.text,
            Inline::Citation(citation) => &citation.text,
        }
    }

    pub fn marks(&self) -> Marks {
        match self {
            Inline::Text { marks, .. } => *marks,
            Inline::Confidence(marker) => marker.marks,
            Inline::Citation(citation) => citation.marks,
        }
    }

    pub fn marks_mut(&mut self) -> &mut Marks {
        match self {
            Inline::Text { marks, .. } => marks,
            Inline::Confidence(marker) => &mut marker.marks,
            Inline::Citation(citation) => &mut citation.marks,
        }
    }

    /// Same annotation and marks, different text
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        let text = text.into();
        match self {
            Inline::Text { marks, .. } => Inline::Text {
                text,
                marks: *marks,
            },
            Inline::Confidence(marker) => Inline::Confidence(ConfidenceMarker {
                level: marker.level,
                text,
                marks: marker.marks,
            }),
            Inline::Citation(citation) => Inline::Citation(SourceCitation {
                source: citation.source.clone(),
                text,
                marks: citation.marks,
            }),
        }
    }

    pub fn char_len(&self) -> usize {
        self.as_text().chars().count()
    }

    fn same_shape(&self, other: &Inline) -> bool {
        match (self, other) {
            (Inline::Text { marks: a, .. }, Inline::Text { marks: b, .. }) => a == b,
            (Inline::Confidence(a), Inline::Confidence(b)) => a.level == b.level && a.marks == b.marks,
            (Inline::Citation(a), Inline::Citation(b)) => a.source == b.source && a.marks == b.marks,
            _ => false,
        }
    }
}

/// Merge adjacent runs of identical shape and drop empty plain text.
///
/// Annotated runs survive even when empty: an empty marker still records
/// that the generator tagged the position.
pub fn normalize_inlines(content: Vec<Inline>) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::with_capacity(content.len());
    for inline in content {
        if matches!(&inline, Inline::Text { text, .. } if text.is_empty()) {
            continue;
        }
        if let Some(last) = out.last_mut() {
            if last.same_shape(&inline) && !last.as_text().is_empty() && !inline.as_text().is_empty() {
                let merged = format!("{}{}", last.as_text(), inline.as_text());
                *last = last.with_text(merged);
                continue;
            }
        }
        out.push(inline);
    }
    out
}

pub fn inline_text(content: &[Inline]) -> String {
    content.iter().map(Inline::as_text).collect()
}

impl Node {
    pub fn heading(level: u8, content: Vec<Inline>) -> Self {
        Node::Heading { level, content }
    }

    pub fn paragraph(content: Vec<Inline>) -> Self {
        Node::Paragraph { content }
    }

    /// Name of the node kind as it appears in rendered `data-node` attributes
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Heading { .. } => "heading",
            Node::Paragraph { .. } => "paragraph",
            Node::List(_) => "list",
            Node::ChartPlaceholder { .. } => "chart",
            Node::MetadataSection { .. } => "metadata",
            Node::DraftNotice { .. } => "draft-notice",
        }
    }

    /// Lines this node contributes to the surface text
    pub fn surface_lines(&self) -> Vec<String> {
        match self {
            Node::Heading { content, .. } | Node::Paragraph { content } => vec![inline_text(content)],
            Node::List(list) => list.items.iter().map(|item| inline_text(&item.content)).collect(),
            Node::ChartPlaceholder { description } => vec![format!("Chart: {}", description)],
            Node::MetadataSection { raw_text, .. } => raw_text.lines().map(str::to_string).collect(),
            Node::DraftNotice { text } => vec![text.clone()],
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Plain-text projection shown by the editing surface, one line per unit
    pub fn surface_text(&self) -> String {
        self.nodes
            .iter()
            .flat_map(Node::surface_lines)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// All confidence markers in document order
    pub fn confidence_markers(&self) -> Vec<&ConfidenceMarker> {
        self.inlines()
            .into_iter()
            .filter_map(|inline| match inline {
                Inline::Confidence(marker) => Some(marker),
                _ => None,
            })
            .collect()
    }

    /// All source citations in document order
    pub fn citations(&self) -> Vec<&SourceCitation> {
        self.inlines()
            .into_iter()
            .filter_map(|inline| match inline {
                Inline::Citation(citation) => Some(citation),
                _ => None,
            })
            .collect()
    }

    fn inlines(&self) -> Vec<&Inline> {
        let mut out = Vec::new();
        for node in &self.nodes {
            match node {
                Node::Heading { content, .. } | Node::Paragraph { content } => out.extend(content.iter()),
                Node::List(list) => {
                    for item in &list.items {
                        out.extend(item.content.iter());
                    }
                }
                _ => {}
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_merges_same_shape() {
        let merged = normalize_inlines(vec![
            Inline::text("a"),
            Inline::text(""),
            Inline::text("b"),
            Inline::confidence(ConfidenceLevel::High, "c"),
            Inline::confidence(ConfidenceLevel::High, "d"),
            Inline::confidence(ConfidenceLevel::Low, "e"),
        ]);

        assert_eq!(
            merged,
            vec![
                Inline::text("ab"),
                Inline::confidence(ConfidenceLevel::High, "cd"),
                Inline::confidence(ConfidenceLevel::Low, "e"),
            ]
        );
    }

    #[test]
    fn test_normalize_keeps_empty_markers() {
        let merged = normalize_inlines(vec![
            Inline::text("claim "),
            Inline::confidence(ConfidenceLevel::Medium, ""),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_surface_text_lines() {
        let doc = Document::from_nodes(vec![
            Node::heading(1, vec![Inline::text("Title")]),
            Node::List(ListBlock {
                ordered: false,
                items: vec![
                    ListItem { content: vec![Inline::text("one")] },
                    ListItem { content: vec![Inline::text("two")] },
                ],
            }),
            Node::ChartPlaceholder { description: "Revenue".to_string() },
        ]);

        assert_eq!(doc.surface_text(), "Title\none\ntwo\nChart: Revenue");
    }

    #[test]
    fn test_level_and_kind_identifiers_roundtrip() {
        for level in ConfidenceLevel::all() {
            assert_eq!(ConfidenceLevel::from_str_opt(level.as_str()), Some(*level));
        }
        for kind in MetadataKind::all() {
            assert_eq!(MetadataKind::from_str_opt(kind.as_str()), Some(*kind));
        }
    }
}
