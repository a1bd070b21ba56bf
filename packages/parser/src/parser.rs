//! # Report Parser
//!
//! Single pass over the raw text producing the annotation model directly.
//! Each line is resolved by the first rule that claims it, so a span that
//! has been annotated is never re-scanned by a later rule:
//!
//! ```text
//! metadata block → heading → list item → draft notice → paragraph
//!                                                         ↓
//!                                 inline: confidence / source / chart tokens
//! ```

use crate::ast::*;
use crate::lexer::{classify_line, tokenize_line, InlineToken, LineKind};
use std::iter::Peekable;
use std::str::Lines;

/// Notice text used when a draft token carries no text of its own
pub const DEFAULT_DRAFT_NOTICE: &str =
    "This is a draft report. Verify all figures and sources before distribution.";

/// Parse raw generated text into a document. Never fails: malformed tokens
/// are kept as plain text.
pub fn parse(source: &str) -> Document {
    Parser::new(source).parse_document()
}

/// Line-oriented parser for generated reports
pub struct Parser<'src> {
    lines: Peekable<Lines<'src>>,
    nodes: Vec<Node>,
    pending_list: Option<ListBlock>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            lines: source.lines().peekable(),
            nodes: Vec::new(),
            pending_list: None,
        }
    }

    pub fn parse_document(mut self) -> Document {
        while let Some(line) = self.lines.next() {
            match classify_line(line) {
                LineKind::Blank => self.flush_list(),
                LineKind::MetadataHeader(kind) => {
                    self.flush_list();
                    self.parse_metadata(kind);
                }
                LineKind::Heading { level, text } => {
                    self.flush_list();
                    let content = parse_inline(text);
                    if !content.is_empty() {
                        self.nodes.push(Node::heading(level, content));
                    }
                }
                LineKind::Bullet(text) => self.push_item(false, text),
                LineKind::Numbered(text) => self.push_item(true, text),
                LineKind::Draft(text) => {
                    self.flush_list();
                    let text = if text.is_empty() {
                        DEFAULT_DRAFT_NOTICE.to_string()
                    } else {
                        text.to_string()
                    };
                    self.nodes.push(Node::DraftNotice { text });
                }
                LineKind::Text(text) => {
                    self.flush_list();
                    self.parse_paragraph_line(text);
                }
            }
        }

        self.flush_list();
        Document::from_nodes(self.nodes)
    }

    /// Body lines run until the next blank line and are never re-scanned
    fn parse_metadata(&mut self, kind: MetadataKind) {
        let mut body = Vec::new();
        while let Some(line) = self.lines.peek() {
            if line.trim().is_empty() {
                break;
            }
            body.push(line.trim_end());
            self.lines.next();
        }

        self.nodes.push(Node::MetadataSection {
            kind,
            raw_text: body.join("\n"),
        });
    }

    fn push_item(&mut self, ordered: bool, text: &str) {
        let item = ListItem {
            content: parse_inline(text),
        };

        match &mut self.pending_list {
            Some(list) if list.ordered == ordered => list.items.push(item),
            _ => {
                self.flush_list();
                self.pending_list = Some(ListBlock {
                    ordered,
                    items: vec![item],
                });
            }
        }
    }

    fn flush_list(&mut self) {
        if let Some(list) = self.pending_list.take() {
            self.nodes.push(Node::List(list));
        }
    }

    /// Chart tokens split a paragraph line into paragraph / chart / paragraph
    fn parse_paragraph_line(&mut self, line: &str) {
        let mut segment_start = 0;

        for (token, span) in tokenize_line(line) {
            if let Some(InlineToken::Chart(description)) = token {
                self.push_paragraph(&line[segment_start..span.start]);
                self.nodes.push(Node::ChartPlaceholder {
                    description: description.to_string(),
                });
                segment_start = span.end;
            }
        }

        self.push_paragraph(&line[segment_start..]);
    }

    fn push_paragraph(&mut self, text: &str) {
        let content = parse_inline(text.trim());
        if !content.is_empty() {
            self.nodes.push(Node::paragraph(content));
        }
    }
}

/// Parse the inline content of one line.
///
/// A confidence or source token opens an annotated run covering the text up
/// to the next such token or the end of the line.
pub fn parse_inline(text: &str) -> Vec<Inline> {
    let mut runs = Vec::new();
    let mut current = Inline::text("");
    let mut text_buf = String::new();
    let mut after_token = false;

    for (token, span) in tokenize_line(text) {
        match token {
            Some(InlineToken::Confidence(level)) => {
                runs.push(current.with_text(std::mem::take(&mut text_buf)));
                current = Inline::confidence(level, "");
                after_token = true;
            }
            Some(InlineToken::Source(source)) => {
                runs.push(current.with_text(std::mem::take(&mut text_buf)));
                current = Inline::citation(source, "");
                after_token = true;
            }
            _ => {
                let slice = &text[span];
                if after_token {
                    let trimmed = slice.trim_start();
                    if trimmed.is_empty() {
                        continue;
                    }
                    text_buf.push_str(trimmed);
                    after_token = false;
                } else {
                    text_buf.push_str(slice);
                }
            }
        }
    }

    runs.push(current.with_text(text_buf));
    normalize_inlines(runs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_is_empty_document() {
        assert!(parse("").is_empty());
        assert!(parse("\n\n   \n").is_empty());
    }

    #[test]
    fn test_heading_levels() {
        let doc = parse("# One\n## Two\n### Three");
        assert_eq!(
            doc.nodes,
            vec![
                Node::heading(1, vec![Inline::text("One")]),
                Node::heading(2, vec![Inline::text("Two")]),
                Node::heading(3, vec![Inline::text("Three")]),
            ]
        );
    }

    #[test]
    fn test_contiguous_items_group_into_one_list() {
        let doc = parse("- a\n- b\n1. c\n2. d\n\n- e");
        assert_eq!(doc.len(), 3);

        match &doc.nodes[0] {
            Node::List(list) => {
                assert!(!list.ordered);
                assert_eq!(list.items.len(), 2);
            }
            other => panic!("Expected list, got {:?}", other),
        }
        match &doc.nodes[1] {
            Node::List(list) => {
                assert!(list.ordered);
                assert_eq!(list.items.len(), 2);
            }
            other => panic!("Expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_confidence_marker_covers_following_text() {
        let content = parse_inline("Revenue grew [High Confidence] 12% this year");
        assert_eq!(
            content,
            vec![
                Inline::text("Revenue grew "),
                Inline::confidence(ConfidenceLevel::High, "12% this year"),
            ]
        );
    }

    #[test]
    fn test_citation_ends_at_next_token() {
        let content = parse_inline("[Source: Q3 Filing] margin up [Low] guidance");
        assert_eq!(
            content,
            vec![
                Inline::citation("Q3 Filing", "margin up "),
                Inline::confidence(ConfidenceLevel::Low, "guidance"),
            ]
        );
    }

    #[test]
    fn test_metadata_block_is_not_wrapped() {
        let doc = parse("Confidence Levels:\n- High: audited\n[Low] estimates\n\nBody text");
        assert_eq!(
            doc.nodes,
            vec![
                Node::MetadataSection {
                    kind: MetadataKind::ConfidenceLevels,
                    raw_text: "- High: audited\n[Low] estimates".to_string(),
                },
                Node::paragraph(vec![Inline::text("Body text")]),
            ]
        );
    }

    #[test]
    fn test_chart_token_splits_paragraph() {
        let doc = parse("Before [CHART: Sales] after");
        assert_eq!(
            doc.nodes,
            vec![
                Node::paragraph(vec![Inline::text("Before")]),
                Node::ChartPlaceholder {
                    description: "Sales".to_string()
                },
                Node::paragraph(vec![Inline::text("after")]),
            ]
        );
    }

    #[test]
    fn test_malformed_tokens_pass_through() {
        let doc = parse("[CHART: Revenue\n[Unknown] thing\n[Source:] empty");
        assert_eq!(
            doc.nodes,
            vec![
                Node::paragraph(vec![Inline::text("[CHART: Revenue")]),
                Node::paragraph(vec![Inline::text("[Unknown] thing")]),
                Node::paragraph(vec![Inline::text("[Source:] empty")]),
            ]
        );
    }

    #[test]
    fn test_draft_notice() {
        let doc = parse("[DRAFT]\n[Draft Report] Internal only");
        assert_eq!(
            doc.nodes,
            vec![
                Node::DraftNotice {
                    text: DEFAULT_DRAFT_NOTICE.to_string()
                },
                Node::DraftNotice {
                    text: "Internal only".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_heading_wins_over_inline_chart() {
        let doc = parse("# Outlook [CHART: x]");
        assert_eq!(
            doc.nodes,
            vec![Node::heading(1, vec![Inline::text("Outlook [CHART: x]")])]
        );
    }
}
