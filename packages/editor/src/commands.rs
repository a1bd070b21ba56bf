//! # Command Processor
//!
//! Rich-text and annotation commands applied to a selection of the
//! document's surface text.
//!
//! ## Selection model
//!
//! Offsets count characters of [`Document::surface_text`]: one line per
//! heading, paragraph, list item, chart and metadata line, joined by `\n`.
//! Only headings, paragraphs and list items are editable; charts, metadata
//! and draft notices are skipped by every command except chart insertion.
//!
//! ## Validation
//!
//! - Mark and annotation commands need a non-empty selection
//! - Prompted text (source name, chart description) must be non-blank
//! - A rejected command never touches the document

use folio_parser::ast::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SOURCE_PROMPT: &str = "Enter source name:";
pub const CHART_PROMPT: &str = "Enter chart description:";

/// Character range of the surface text, supplied by the editing surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRange {
    pub start: usize,
    pub end: usize,
}

impl SelectionRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn caret(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Ordered and clamped to `len`
    fn clamp(&self, len: usize) -> (usize, usize) {
        let start = self.start.min(self.end).min(len);
        let end = self.start.max(self.end).min(len);
        (start, end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "value", rename_all = "kebab-case")]
pub enum CommandKind {
    Heading(u8),
    Bold,
    Italic,
    Underline,
    UnorderedList,
    OrderedList,
    ConfidenceInsert(ConfidenceLevel),
    SourceInsert,
    ChartInsert,
}

impl CommandKind {
    /// Commands that transform the selected text in place
    pub fn requires_selection(&self) -> bool {
        matches!(
            self,
            CommandKind::Bold
                | CommandKind::Italic
                | CommandKind::Underline
                | CommandKind::ConfidenceInsert(_)
                | CommandKind::SourceInsert
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Heading(_) => "heading",
            CommandKind::Bold => "bold",
            CommandKind::Italic => "italic",
            CommandKind::Underline => "underline",
            CommandKind::UnorderedList => "unordered-list",
            CommandKind::OrderedList => "ordered-list",
            CommandKind::ConfidenceInsert(_) => "confidence-insert",
            CommandKind::SourceInsert => "source-insert",
            CommandKind::ChartInsert => "chart-insert",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Select some text first")]
    EmptySelection,

    #[error("Command dismissed without input")]
    Dismissed,

    #[error("No document is loaded")]
    NoDocument,

    #[error("Heading level must be between 1 and 3, got {0}")]
    InvalidHeadingLevel(u8),
}

/// Asks the user for auxiliary text. `None` means dismissed.
pub trait Prompt {
    fn ask(&mut self, message: &str) -> Option<String>;
}

impl<F> Prompt for F
where
    F: FnMut(&str) -> Option<String>,
{
    fn ask(&mut self, message: &str) -> Option<String> {
        self(message)
    }
}

/// Prompt that always dismisses
pub struct NoPrompt;

impl Prompt for NoPrompt {
    fn ask(&mut self, _message: &str) -> Option<String> {
        None
    }
}

fn ask(prompt: &mut dyn Prompt, message: &str) -> Result<String, CommandError> {
    prompt
        .ask(message)
        .map(|answer| answer.trim().to_string())
        .filter(|answer| !answer.is_empty())
        .ok_or(CommandError::Dismissed)
}

/// A command bound to the selection it was invoked with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub kind: CommandKind,
    pub selection: SelectionRange,
}

impl Command {
    pub fn new(kind: CommandKind, selection: SelectionRange) -> Self {
        Self { kind, selection }
    }

    /// Checks that need no user input
    pub fn validate(&self, document: &Document) -> Result<(), CommandError> {
        if let CommandKind::Heading(level) = self.kind {
            if !(1..=3).contains(&level) {
                return Err(CommandError::InvalidHeadingLevel(level));
            }
        }

        if self.kind.requires_selection() {
            let len = document.surface_text().chars().count();
            let (start, end) = self.selection.clamp(len);
            if start == end {
                return Err(CommandError::EmptySelection);
            }
        }

        Ok(())
    }

    /// Apply to `document`, returning the edited copy
    pub fn apply(&self, document: &Document, prompt: &mut dyn Prompt) -> Result<Document, CommandError> {
        self.validate(document)?;

        let mut layout = Layout::new(document);
        let (start, end) = self.selection.clamp(layout.len);

        match self.kind {
            CommandKind::Heading(level) => layout.set_heading(start, end, level)?,
            CommandKind::Bold => layout.toggle_mark(start, end, MarkKind::Bold)?,
            CommandKind::Italic => layout.toggle_mark(start, end, MarkKind::Italic)?,
            CommandKind::Underline => layout.toggle_mark(start, end, MarkKind::Underline)?,
            CommandKind::UnorderedList => layout.toggle_list(start, end, false)?,
            CommandKind::OrderedList => layout.toggle_list(start, end, true)?,
            CommandKind::ConfidenceInsert(level) => {
                layout.annotate(start, end, |text| Inline::confidence(level, text))?
            }
            CommandKind::SourceInsert => {
                let source = ask(prompt, SOURCE_PROMPT)?;
                layout.annotate(start, end, |text| Inline::citation(source.clone(), text))?
            }
            CommandKind::ChartInsert => {
                let description = ask(prompt, CHART_PROMPT)?;
                layout.insert_chart(start, description);
            }
        }

        Ok(layout.into_document())
    }
}

#[derive(Debug, Clone, Copy)]
enum MarkKind {
    Bold,
    Italic,
    Underline,
}

impl MarkKind {
    fn get(self, marks: Marks) -> bool {
        match self {
            MarkKind::Bold => marks.bold,
            MarkKind::Italic => marks.italic,
            MarkKind::Underline => marks.underline,
        }
    }

    fn set(self, marks: &mut Marks, on: bool) {
        match self {
            MarkKind::Bold => marks.bold = on,
            MarkKind::Italic => marks.italic = on,
            MarkKind::Underline => marks.underline = on,
        }
    }
}

/// Lists are flattened into their items so commands can address them one
/// by one; `group` remembers which list an item came from.
enum Block {
    Node(Node),
    Item {
        ordered: bool,
        group: usize,
        item: ListItem,
    },
}

impl Block {
    fn content_mut(&mut self) -> Option<&mut Vec<Inline>> {
        match self {
            Block::Node(Node::Heading { content, .. }) | Block::Node(Node::Paragraph { content }) => {
                Some(content)
            }
            Block::Item { item, .. } => Some(&mut item.content),
            Block::Node(_) => None,
        }
    }

    fn take_content(&mut self) -> Vec<Inline> {
        self.content_mut().map(std::mem::take).unwrap_or_default()
    }
}

/// One line of the surface text
struct Unit {
    block: usize,
    start: usize,
    end: usize,
    editable: bool,
}

impl Unit {
    fn touched_by(&self, start: usize, end: usize) -> bool {
        if start == end {
            self.start <= start && start <= self.end
        } else if self.start == self.end {
            start <= self.start && self.start < end
        } else {
            self.start < end && start < self.end
        }
    }
}

struct Layout {
    blocks: Vec<Block>,
    units: Vec<Unit>,
    len: usize,
    next_group: usize,
}

impl Layout {
    fn new(document: &Document) -> Self {
        let mut blocks = Vec::new();
        let mut group = 0;

        for node in &document.nodes {
            match node {
                Node::List(list) => {
                    for item in &list.items {
                        blocks.push(Block::Item {
                            ordered: list.ordered,
                            group,
                            item: item.clone(),
                        });
                    }
                    group += 1;
                }
                other => blocks.push(Block::Node(other.clone())),
            }
        }

        let mut layout = Self {
            blocks,
            units: Vec::new(),
            len: 0,
            next_group: group,
        };
        layout.measure();
        layout
    }

    fn measure(&mut self) {
        self.units.clear();
        let mut offset = 0;
        let mut first = true;

        for (index, block) in self.blocks.iter().enumerate() {
            let (lines, editable) = match block {
                Block::Node(node) => (
                    node.surface_lines(),
                    matches!(node, Node::Heading { .. } | Node::Paragraph { .. }),
                ),
                Block::Item { item, .. } => (vec![inline_text(&item.content)], true),
            };

            for line in lines {
                if !first {
                    offset += 1;
                }
                first = false;

                let len = line.chars().count();
                self.units.push(Unit {
                    block: index,
                    start: offset,
                    end: offset + len,
                    editable,
                });
                offset += len;
            }
        }

        self.len = offset;
    }

    /// Editable blocks touched by the range, in order
    fn touched_blocks(&self, start: usize, end: usize) -> Vec<usize> {
        let mut blocks: Vec<usize> = Vec::new();
        for unit in &self.units {
            if unit.editable && unit.touched_by(start, end) && blocks.last() != Some(&unit.block) {
                blocks.push(unit.block);
            }
        }
        blocks
    }

    /// Selected slices of every editable unit, as `(block, from, to)` in
    /// unit-local character offsets
    fn selected_spans(&self, start: usize, end: usize) -> Vec<(usize, usize, usize)> {
        self.units
            .iter()
            .filter(|unit| unit.editable && unit.start < end && start < unit.end)
            .map(|unit| {
                (
                    unit.block,
                    start.max(unit.start) - unit.start,
                    end.min(unit.end) - unit.start,
                )
            })
            .collect()
    }

    fn selected_runs(&mut self, start: usize, end: usize) -> Vec<Inline> {
        let mut runs = Vec::new();
        for (block, from, to) in self.selected_spans(start, end) {
            if let Some(content) = self.blocks[block].content_mut() {
                runs.extend(split_runs(content, from, to).1);
            }
        }
        runs
    }

    fn map_selected(
        &mut self,
        start: usize,
        end: usize,
        f: &mut dyn FnMut(Inline) -> Inline,
    ) -> Result<(), CommandError> {
        let spans = self.selected_spans(start, end);
        let mut touched = false;

        for (block, from, to) in spans {
            if let Some(content) = self.blocks[block].content_mut() {
                let (before, selected, after) = split_runs(content, from, to);
                touched |= selected.iter().any(|run| run.char_len() > 0);

                let mut runs = before;
                runs.extend(selected.into_iter().map(&mut *f));
                runs.extend(after);
                *content = normalize_inlines(runs);
            }
        }

        if touched {
            Ok(())
        } else {
            Err(CommandError::EmptySelection)
        }
    }

    /// Set the mark on the selection, or clear it if every selected run
    /// already carries it
    fn toggle_mark(&mut self, start: usize, end: usize, kind: MarkKind) -> Result<(), CommandError> {
        let runs = self.selected_runs(start, end);
        let enable = !runs
            .iter()
            .filter(|run| run.char_len() > 0)
            .all(|run| kind.get(run.marks()));

        self.map_selected(start, end, &mut |mut run: Inline| {
            kind.set(run.marks_mut(), enable);
            run
        })
    }

    /// Re-annotate the selected text, keeping its marks
    fn annotate<F>(&mut self, start: usize, end: usize, make: F) -> Result<(), CommandError>
    where
        F: Fn(String) -> Inline,
    {
        self.map_selected(start, end, &mut |run: Inline| {
            let mut annotated = make(run.as_text().to_string());
            *annotated.marks_mut() = run.marks();
            annotated
        })
    }

    fn set_heading(&mut self, start: usize, end: usize, level: u8) -> Result<(), CommandError> {
        let touched = self.touched_blocks(start, end);
        if touched.is_empty() {
            return Err(CommandError::EmptySelection);
        }

        for index in touched {
            let content = self.blocks[index].take_content();
            self.blocks[index] = Block::Node(Node::heading(level, content));
        }
        Ok(())
    }

    fn toggle_list(&mut self, start: usize, end: usize, ordered: bool) -> Result<(), CommandError> {
        let touched = self.touched_blocks(start, end);
        if touched.is_empty() {
            return Err(CommandError::EmptySelection);
        }

        let already = touched
            .iter()
            .all(|&index| matches!(self.blocks[index], Block::Item { ordered: o, .. } if o == ordered));

        let group = self.next_group;
        self.next_group += 1;

        for index in touched {
            let content = self.blocks[index].take_content();
            self.blocks[index] = if already {
                Block::Node(Node::paragraph(content))
            } else {
                Block::Item {
                    ordered,
                    group,
                    item: ListItem { content },
                }
            };
        }
        Ok(())
    }

    /// Insert after the block holding `at`, or at the end
    fn insert_chart(&mut self, at: usize, description: String) {
        let position = self
            .units
            .iter()
            .find(|unit| unit.touched_by(at, at))
            .map(|unit| unit.block + 1)
            .unwrap_or(self.blocks.len());

        self.blocks
            .insert(position, Block::Node(Node::ChartPlaceholder { description }));
    }

    fn into_document(self) -> Document {
        let mut nodes = Vec::new();
        let mut current: Option<(usize, ListBlock)> = None;

        for block in self.blocks {
            match block {
                Block::Item {
                    ordered,
                    group,
                    item,
                } => match &mut current {
                    Some((current_group, list)) if *current_group == group && list.ordered == ordered => {
                        list.items.push(item)
                    }
                    _ => {
                        if let Some((_, list)) = current.take() {
                            nodes.push(Node::List(list));
                        }
                        current = Some((
                            group,
                            ListBlock {
                                ordered,
                                items: vec![item],
                            },
                        ));
                    }
                },
                Block::Node(node) => {
                    if let Some((_, list)) = current.take() {
                        nodes.push(Node::List(list));
                    }
                    nodes.push(node);
                }
            }
        }

        if let Some((_, list)) = current {
            nodes.push(Node::List(list));
        }
        Document::from_nodes(nodes)
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(offset, _)| offset)
        .unwrap_or(text.len())
}

/// Split runs at character offsets `from..to` into before / selected / after
fn split_runs(content: &[Inline], from: usize, to: usize) -> (Vec<Inline>, Vec<Inline>, Vec<Inline>) {
    let mut before = Vec::new();
    let mut selected = Vec::new();
    let mut after = Vec::new();
    let mut offset = 0;

    for run in content {
        let len = run.char_len();
        let run_start = offset;
        offset += len;

        if len == 0 {
            if run_start <= from {
                before.push(run.clone());
            } else if run_start >= to {
                after.push(run.clone());
            } else {
                selected.push(run.clone());
            }
            continue;
        }

        let text = run.as_text();
        let a = byte_offset(text, from.clamp(run_start, offset) - run_start);
        let b = byte_offset(text, to.clamp(run_start, offset) - run_start);

        if a > 0 {
            before.push(run.with_text(&text[..a]));
        }
        if b > a {
            selected.push(run.with_text(&text[a..b]));
        }
        if b < text.len() {
            after.push(run.with_text(&text[b..]));
        }
    }

    (before, selected, after)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_parser::parse;

    fn apply(doc: &Document, kind: CommandKind, start: usize, end: usize) -> Result<Document, CommandError> {
        Command::new(kind, SelectionRange::new(start, end)).apply(doc, &mut NoPrompt)
    }

    #[test]
    fn test_split_runs_at_char_offsets() {
        let content = vec![Inline::text("héllo "), Inline::confidence(ConfidenceLevel::High, "wörld")];
        let (before, selected, after) = split_runs(&content, 3, 8);

        assert_eq!(before, vec![Inline::text("hél")]);
        assert_eq!(
            selected,
            vec![Inline::text("lo "), Inline::confidence(ConfidenceLevel::High, "wö")]
        );
        assert_eq!(after, vec![Inline::confidence(ConfidenceLevel::High, "rld")]);
    }

    #[test]
    fn test_bold_splits_and_toggles() {
        let doc = parse("Revenue grew strongly");
        let bolded = apply(&doc, CommandKind::Bold, 8, 12).unwrap();

        let mut grew = Inline::text("grew");
        grew.marks_mut().bold = true;
        assert_eq!(
            bolded.nodes,
            vec![Node::paragraph(vec![
                Inline::text("Revenue "),
                grew,
                Inline::text(" strongly"),
            ])]
        );

        let restored = apply(&bolded, CommandKind::Bold, 8, 12).unwrap();
        assert_eq!(restored, doc);
    }

    #[test]
    fn test_empty_selection_rejected() {
        let doc = parse("Some text");
        assert_eq!(apply(&doc, CommandKind::Italic, 3, 3), Err(CommandError::EmptySelection));
        assert_eq!(
            apply(&doc, CommandKind::ConfidenceInsert(ConfidenceLevel::Low), 40, 50),
            Err(CommandError::EmptySelection)
        );
    }

    #[test]
    fn test_selection_over_chart_only_is_empty() {
        let doc = parse("[CHART: Revenue]");
        assert_eq!(apply(&doc, CommandKind::Bold, 0, 5), Err(CommandError::EmptySelection));
    }

    #[test]
    fn test_confidence_insert_wraps_selection() {
        let doc = parse("Margins improved");
        let edited = apply(&doc, CommandKind::ConfidenceInsert(ConfidenceLevel::Medium), 8, 16).unwrap();
        assert_eq!(
            edited.nodes,
            vec![Node::paragraph(vec![
                Inline::text("Margins "),
                Inline::confidence(ConfidenceLevel::Medium, "improved"),
            ])]
        );
    }

    #[test]
    fn test_source_insert_prompts_for_name() {
        let doc = parse("Costs fell");
        let mut asked = Vec::new();
        let mut prompt = |message: &str| {
            asked.push(message.to_string());
            Some("  Annual Report ".to_string())
        };

        let edited = Command::new(CommandKind::SourceInsert, SelectionRange::new(0, 5))
            .apply(&doc, &mut prompt)
            .unwrap();

        assert_eq!(asked, vec![SOURCE_PROMPT.to_string()]);
        assert_eq!(
            edited.nodes,
            vec![Node::paragraph(vec![
                Inline::citation("Annual Report", "Costs"),
                Inline::text(" fell"),
            ])]
        );
    }

    #[test]
    fn test_dismissed_prompt_abandons() {
        let doc = parse("Costs fell");
        let mut blank = |_: &str| Some("   ".to_string());
        assert_eq!(
            Command::new(CommandKind::SourceInsert, SelectionRange::new(0, 5)).apply(&doc, &mut blank),
            Err(CommandError::Dismissed)
        );
        assert_eq!(apply(&doc, CommandKind::ChartInsert, 0, 0), Err(CommandError::Dismissed));
    }

    #[test]
    fn test_heading_with_caret() {
        let doc = parse("Intro\nBody");
        let edited = apply(&doc, CommandKind::Heading(2), 7, 7).unwrap();
        assert_eq!(
            edited.nodes,
            vec![
                Node::paragraph(vec![Inline::text("Intro")]),
                Node::heading(2, vec![Inline::text("Body")]),
            ]
        );
        assert_eq!(apply(&doc, CommandKind::Heading(4), 0, 0), Err(CommandError::InvalidHeadingLevel(4)));
    }

    #[test]
    fn test_list_toggle() {
        let doc = parse("one\ntwo\nthree");
        let listed = apply(&doc, CommandKind::UnorderedList, 0, 7).unwrap();
        assert_eq!(listed.len(), 2);
        assert!(matches!(&listed.nodes[0], Node::List(list) if !list.ordered && list.items.len() == 2));

        let unlisted = apply(&listed, CommandKind::UnorderedList, 0, 7).unwrap();
        assert_eq!(unlisted, doc);
    }

    #[test]
    fn test_list_kind_change_splits_list() {
        let doc = parse("- a\n- b\n- c");
        let edited = apply(&doc, CommandKind::OrderedList, 2, 3).unwrap();
        let kinds: Vec<bool> = edited
            .nodes
            .iter()
            .map(|node| match node {
                Node::List(list) => list.ordered,
                other => panic!("Expected list, got {:?}", other),
            })
            .collect();
        assert_eq!(kinds, vec![false, true, false]);
    }

    #[test]
    fn test_chart_insert_after_block() {
        let doc = parse("# Title\nBody");
        let mut prompt = |_: &str| Some("Revenue".to_string());
        let edited = Command::new(CommandKind::ChartInsert, SelectionRange::caret(2))
            .apply(&doc, &mut prompt)
            .unwrap();

        assert_eq!(
            edited.nodes[1],
            Node::ChartPlaceholder {
                description: "Revenue".to_string()
            }
        );
        assert_eq!(edited.len(), 3);
    }

    #[test]
    fn test_chart_insert_into_empty_document() {
        let mut prompt = |_: &str| Some("Growth".to_string());
        let edited = Command::new(CommandKind::ChartInsert, SelectionRange::caret(0))
            .apply(&Document::new(), &mut prompt)
            .unwrap();
        assert_eq!(edited.len(), 1);
    }
}
