//! Card-sheet template language: `{field}` placeholders plus `[batch]` and
//! `[card]` repetition blocks.
//!
//! A template is document text with one `[batch]...[/batch]` block rendered
//! once per batch and, inside it, one `[card]...[/card]` block rendered once
//! per card. `{field}` inside a card block substitutes the card's field.
//! `\{`, `\[`, `\]`, `\}` and `\\` escape literally; unknown placeholders and
//! unknown square-bracket tags pass through unchanged.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::carddeck::Card;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Placeholder(String),
    Open(BlockKind),
    Close(BlockKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Batch,
    Card,
}

impl BlockKind {
    fn tag(self) -> &'static str {
        match self {
            Self::Batch => "batch",
            Self::Card => "card",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Placeholder(String),
    Batch(Vec<Node>),
    Card(Vec<Node>),
}

/// A parsed card-sheet template, ready to render any number of batch sets.
#[derive(Debug, Clone)]
pub struct CardTemplate {
    nodes: Vec<Node>,
}

impl CardTemplate {
    pub fn parse(source: &str) -> Result<Self, String> {
        let nodes = build_tree(lex(source))?;
        Ok(Self { nodes })
    }

    /// Renders the ordered batch sequence into document text.
    pub fn render(&self, batches: &[Vec<Card>]) -> String {
        let mut out = String::new();
        render_nodes(&self.nodes, batches, None, None, &mut out);
        out
    }
}

fn render_nodes(
    nodes: &[Node],
    batches: &[Vec<Card>],
    current_batch: Option<&[Card]>,
    current_card: Option<&Card>,
    out: &mut String,
) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Placeholder(name) => match current_card.and_then(|card| card.get(name)) {
                Some(value) => out.push_str(value),
                None => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            },
            Node::Batch(children) => {
                for batch in batches {
                    render_nodes(children, batches, Some(batch), current_card, out);
                }
            }
            Node::Card(children) => {
                let cards = current_batch.unwrap_or_default();
                for card in cards {
                    render_nodes(children, batches, current_batch, Some(card), out);
                }
            }
        }
    }
}

fn lex(source: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut text_buffer = String::new();
    let mut chars = source.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                if let Some(next) = chars.next() {
                    match next {
                        '{' | '}' | '[' | ']' | '\\' => text_buffer.push(next),
                        _ => {
                            text_buffer.push('\\');
                            text_buffer.push(next);
                        }
                    }
                } else {
                    text_buffer.push('\\');
                }
            }
            '{' => {
                if let Some(content) = read_until(&mut chars, '}') {
                    let key = content.trim();
                    if key.is_empty() {
                        text_buffer.push_str(&format!("{{{content}}}"));
                    } else {
                        flush_text(&mut segments, &mut text_buffer);
                        segments.push(Segment::Placeholder(key.to_string()));
                    }
                } else {
                    text_buffer.push('{');
                }
            }
            '[' => {
                if let Some(content) = read_until(&mut chars, ']') {
                    match parse_tag(&content) {
                        Some(segment) => {
                            flush_text(&mut segments, &mut text_buffer);
                            segments.push(segment);
                        }
                        None => text_buffer.push_str(&format!("[{content}]")),
                    }
                } else {
                    text_buffer.push('[');
                }
            }
            _ => text_buffer.push(ch),
        }
    }
    flush_text(&mut segments, &mut text_buffer);
    segments
}

fn parse_tag(content: &str) -> Option<Segment> {
    match content.trim().to_ascii_lowercase().as_str() {
        "batch" => Some(Segment::Open(BlockKind::Batch)),
        "/batch" => Some(Segment::Close(BlockKind::Batch)),
        "card" => Some(Segment::Open(BlockKind::Card)),
        "/card" => Some(Segment::Close(BlockKind::Card)),
        _ => None,
    }
}

fn build_tree(segments: Vec<Segment>) -> Result<Vec<Node>, String> {
    let mut stack: Vec<(BlockKind, Vec<Node>)> = Vec::new();
    let mut top_level: Vec<Node> = Vec::new();

    for segment in segments {
        match segment {
            Segment::Text(text) => {
                current_nodes(&mut stack, &mut top_level).push(Node::Text(text));
            }
            Segment::Placeholder(name) => {
                current_nodes(&mut stack, &mut top_level).push(Node::Placeholder(name));
            }
            Segment::Open(kind) => {
                let inside = stack.last().map(|(open, _)| *open);
                match (kind, inside) {
                    (BlockKind::Batch, Some(_)) => {
                        return Err("template error: [batch] blocks cannot nest".to_string());
                    }
                    (BlockKind::Card, None) => {
                        return Err(
                            "template error: [card] block outside a [batch] block".to_string()
                        );
                    }
                    (BlockKind::Card, Some(BlockKind::Card)) => {
                        return Err("template error: [card] blocks cannot nest".to_string());
                    }
                    _ => stack.push((kind, Vec::new())),
                }
            }
            Segment::Close(kind) => match stack.pop() {
                Some((open, children)) if open == kind => {
                    let node = match kind {
                        BlockKind::Batch => Node::Batch(children),
                        BlockKind::Card => Node::Card(children),
                    };
                    current_nodes(&mut stack, &mut top_level).push(node);
                }
                Some((open, _)) => {
                    return Err(format!(
                        "template error: [/{}] closes an open [{}] block",
                        kind.tag(),
                        open.tag()
                    ));
                }
                None => {
                    return Err(format!(
                        "template error: [/{}] without a matching [{}]",
                        kind.tag(),
                        kind.tag()
                    ));
                }
            },
        }
    }

    if let Some((open, _)) = stack.last() {
        return Err(format!("template error: unclosed [{}] block", open.tag()));
    }
    Ok(top_level)
}

fn current_nodes<'a>(
    stack: &'a mut Vec<(BlockKind, Vec<Node>)>,
    top_level: &'a mut Vec<Node>,
) -> &'a mut Vec<Node> {
    match stack.last_mut() {
        Some((_, nodes)) => nodes,
        None => top_level,
    }
}

fn flush_text(segments: &mut Vec<Segment>, text_buffer: &mut String) {
    if text_buffer.is_empty() {
        return;
    }
    segments.push(Segment::Text(std::mem::take(text_buffer)));
}

fn read_until(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    terminal: char,
) -> Option<String> {
    let mut collected = String::new();
    for ch in chars.by_ref() {
        if ch == terminal {
            return Some(collected);
        }
        collected.push(ch);
    }
    None
}

/// Resolves template names strictly inside one root directory. Names that
/// are absolute or traverse upward are rejected before touching the disk.
#[derive(Debug, Clone)]
pub struct TemplateEnvironment {
    root: PathBuf,
}

impl TemplateEnvironment {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn get_template(&self, name: &str) -> Result<CardTemplate, String> {
        validate_template_name(name)?;
        let path = self.root.join(name);
        let source = fs::read_to_string(&path)
            .map_err(|error| format!("failed to read template {}: {error}", path.display()))?;
        CardTemplate::parse(&source)
    }
}

fn validate_template_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("template error: empty template name".to_string());
    }
    let path = Path::new(name);
    let escapes = path.is_absolute()
        || path
            .components()
            .any(|component| !matches!(component, Component::Normal(_)));
    if escapes {
        return Err(format!(
            "template error: template name '{name}' escapes the template root"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_template_name, CardTemplate};
    use crate::carddeck::Card;

    fn card(pairs: &[(&str, &str)]) -> Card {
        Card::from_pairs(
            pairs
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        )
    }

    fn two_batches() -> Vec<Vec<Card>> {
        vec![
            vec![card(&[("title", "One")]), card(&[("title", "Two")])],
            vec![card(&[("title", "Three")])],
        ]
    }

    #[test]
    fn test_plain_text_passthrough() {
        let template = CardTemplate::parse("<html>deck</html>").unwrap();
        assert_eq!(template.render(&two_batches()), "<html>deck</html>");
    }

    #[test]
    fn test_batch_and_card_repetition() {
        let template = CardTemplate::parse("[batch]<p>[card]{title};[/card]</p>[/batch]").unwrap();
        assert_eq!(template.render(&two_batches()), "<p>One;Two;</p><p>Three;</p>");
    }

    #[test]
    fn test_unknown_placeholder_renders_literally() {
        let template = CardTemplate::parse("[batch][card]{title}{missing}[/card][/batch]").unwrap();
        assert_eq!(
            template.render(&vec![vec![card(&[("title", "One")])]]),
            "One{missing}"
        );
    }

    #[test]
    fn test_placeholder_outside_card_renders_literally() {
        let template = CardTemplate::parse("{title}").unwrap();
        assert_eq!(template.render(&two_batches()), "{title}");
    }

    #[test]
    fn test_escaping_special_characters() {
        let template = CardTemplate::parse("\\{title\\} \\[batch\\] \\\\").unwrap();
        assert_eq!(template.render(&[]), "{title} [batch] \\");
    }

    #[test]
    fn test_unknown_tag_passes_through() {
        let template = CardTemplate::parse("[style]x[/style]").unwrap();
        assert_eq!(template.render(&[]), "[style]x[/style]");
    }

    #[test]
    fn test_zero_batches_render_an_empty_block() {
        let template = CardTemplate::parse("a[batch]b[card]c[/card][/batch]d").unwrap();
        assert_eq!(template.render(&[]), "ad");
    }

    #[test]
    fn test_card_outside_batch_is_rejected() {
        let error = CardTemplate::parse("[card]x[/card]").unwrap_err();
        assert!(error.contains("outside"), "unexpected: {error}");
    }

    #[test]
    fn test_unclosed_block_is_rejected() {
        let error = CardTemplate::parse("[batch]x").unwrap_err();
        assert!(error.contains("unclosed"), "unexpected: {error}");
    }

    #[test]
    fn test_mismatched_close_is_rejected() {
        let error = CardTemplate::parse("[batch][card]x[/batch][/card]").unwrap_err();
        assert!(error.contains("closes an open"), "unexpected: {error}");
    }

    #[test]
    fn test_nested_batches_are_rejected() {
        let error = CardTemplate::parse("[batch][batch]x[/batch][/batch]").unwrap_err();
        assert!(error.contains("cannot nest"), "unexpected: {error}");
    }

    #[test]
    fn test_template_names_stay_inside_the_root() {
        assert!(validate_template_name("card_sheet_a4.tmpl").is_ok());
        assert!(validate_template_name("sheets/card_sheet_a4.tmpl").is_ok());
        assert!(validate_template_name("../card_sheet_a4.tmpl").is_err());
        assert!(validate_template_name("/etc/passwd").is_err());
        assert!(validate_template_name("").is_err());
    }
}
