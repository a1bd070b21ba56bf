//! Lexer for generated report text using logos
//!
//! Lines are classified by hand (block structure is line-oriented), the
//! content of each line is lexed into inline tokens by a logos DFA.

use crate::ast::{ConfidenceLevel, MetadataKind};
use logos::Logos;

/// Inline tokens recognized inside a single line
#[derive(Logos, Debug, Clone, PartialEq, Eq)]
pub enum InlineToken<'src> {
    #[regex(r"\[[ \t]*(high|medium|low)([ \t]+confidence)?[ \t]*\]", confidence_level, ignore(ascii_case))]
    #[regex(r"\[[ \t]*no[ \t]*data[ \t]*\]", |_| ConfidenceLevel::NoData, ignore(ascii_case))]
    Confidence(ConfidenceLevel),

    #[regex(r"\[[ \t]*source[ \t]*:[^\]\n]+\]", |lex| bracket_value(lex.slice()), ignore(ascii_case))]
    Source(&'src str),

    #[regex(r"\[[ \t]*chart[ \t]*:[^\]\n]+\]", |lex| bracket_value(lex.slice()), ignore(ascii_case))]
    Chart(&'src str),

    #[regex(r"\[[ \t]*draft([ \t]+report)?[ \t]*\]", ignore(ascii_case))]
    Draft,

    #[regex(r"[^\[\n]+", |lex| lex.slice())]
    Text(&'src str),

    #[token("[")]
    LBracket,
}

fn confidence_level<'src>(lex: &mut logos::Lexer<'src, InlineToken<'src>>) -> Option<ConfidenceLevel> {
    let inner = lex.slice().trim_start_matches('[').trim_start().to_ascii_lowercase();
    if inner.starts_with("high") {
        Some(ConfidenceLevel::High)
    } else if inner.starts_with("medium") {
        Some(ConfidenceLevel::Medium)
    } else if inner.starts_with("low") {
        Some(ConfidenceLevel::Low)
    } else {
        None
    }
}

/// Text after the colon of a `[Name: value]` token, trimmed; empty values are rejected
fn bracket_value(slice: &str) -> Option<&str> {
    let inner = slice.strip_prefix('[')?.strip_suffix(']')?;
    let (_, value) = inner.split_once(':')?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Lex one line into tokens with their byte ranges.
///
/// Lexer errors are reported as `None` so callers can keep the slice as text.
pub fn tokenize_line(line: &str) -> Vec<(Option<InlineToken<'_>>, std::ops::Range<usize>)> {
    InlineToken::lexer(line)
        .spanned()
        .map(|(token, span)| (token.ok(), span))
        .collect()
}

/// Block-level classification of one source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'src> {
    Blank,
    MetadataHeader(MetadataKind),
    Heading { level: u8, text: &'src str },
    Bullet(&'src str),
    Numbered(&'src str),
    Draft(&'src str),
    Text(&'src str),
}

pub const MAX_HEADING_LEVEL: u8 = 3;

/// Classify a line. The first matching rule wins, in pipeline order:
/// metadata, headings, lists, draft notice, paragraph text.
pub fn classify_line(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineKind::Blank;
    }
    if let Some(kind) = metadata_header(trimmed) {
        return LineKind::MetadataHeader(kind);
    }
    if let Some((level, text)) = heading(trimmed) {
        return LineKind::Heading { level, text };
    }
    if let Some(text) = bullet(trimmed) {
        return LineKind::Bullet(text);
    }
    if let Some(text) = numbered(trimmed) {
        return LineKind::Numbered(text);
    }
    if let Some(text) = draft_notice(trimmed) {
        return LineKind::Draft(text);
    }
    LineKind::Text(trimmed)
}

fn metadata_header(line: &str) -> Option<MetadataKind> {
    let label = line
        .trim_start_matches(|c: char| c == '#' || c == '*' || c.is_whitespace())
        .trim_end_matches(|c: char| c == '*' || c.is_whitespace())
        .strip_suffix(':')?
        .trim_end_matches(|c: char| c == '*' || c.is_whitespace())
        .to_ascii_lowercase();

    match label.as_str() {
        "confidence levels" | "confidence level" => Some(MetadataKind::ConfidenceLevels),
        "draft status" => Some(MetadataKind::DraftStatus),
        "source citations" | "sources" | "citations" => Some(MetadataKind::SourceCitations),
        "user requirements" => Some(MetadataKind::UserRequirements),
        _ => None,
    }
}

fn heading(line: &str) -> Option<(u8, &str)> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if hashes == 0 {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let level = hashes.min(MAX_HEADING_LEVEL as usize) as u8;
    Some((level, rest.trim()))
}

fn bullet(line: &str) -> Option<&str> {
    let mut chars = line.chars();
    let marker = chars.next()?;
    if !matches!(marker, '-' | '*' | '•') {
        return None;
    }
    let rest = chars.as_str();
    if rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn numbered(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix(|c: char| c == '.' || c == ')')?;
    if rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn draft_notice(line: &str) -> Option<&str> {
    let mut lexer = InlineToken::lexer(line);
    match lexer.next() {
        Some(Ok(InlineToken::Draft)) => Some(lexer.remainder().trim()),
        _ => None,
    }
}
