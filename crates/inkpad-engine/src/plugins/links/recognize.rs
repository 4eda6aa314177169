//! Link pattern recognition over textblock content.
//!
//! Matching runs on a flattened view of one textblock: every character of
//! its text runs, with atoms standing in as U+FFFC so positions line up.
//! Characters already carrying a link or code mark are ineligible and no
//! match may cover them.

use std::sync::OnceLock;

use regex::Regex;

use crate::editing::Transaction;
use crate::error::EditResult;
use crate::model::{Document, Mark, MarkType, Node};

const OBJECT_REPLACEMENT: char = '\u{FFFC}';

fn markdown_link_regex() -> &'static Regex {
    static MARKDOWN_LINK: OnceLock<Regex> = OnceLock::new();
    MARKDOWN_LINK.get_or_init(|| {
        Regex::new(r"\[([^\[\]\n\x{FFFC}]+)\]\(([^()\s\x{FFFC}]+)\)")
            .expect("Invalid markdown link regex")
    })
}

fn url_regex() -> &'static Regex {
    static URL_REGEX: OnceLock<Regex> = OnceLock::new();
    URL_REGEX.get_or_init(|| {
        Regex::new(r"https?://[^\s<>\[\]\x{FFFC}]+").expect("Invalid URL regex")
    })
}

/// Punctuation that ends a sentence rather than a URL.
pub fn is_url_trailer(c: char) -> bool {
    matches!(c, '.' | ',' | ':' | ';' | '!' | '?' | ')' | ']' | '}')
}

/// Characters whose input may complete a pattern typed before them.
pub fn is_trigger(c: char) -> bool {
    c.is_whitespace() || c.is_ascii_punctuation()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkPattern {
    /// `[text](href)` typed as raw characters.
    Markdown { text: String, href: String },
    /// A bare `http(s)://` URL.
    Bare { href: String },
}

/// A pattern found in the document, `[from, to)` in document positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMatch {
    pub from: usize,
    pub to: usize,
    pub pattern: LinkPattern,
}

/// Flattened text of one textblock.
#[derive(Debug, Clone)]
pub struct TextView {
    /// Position where the textblock's content starts.
    pub start: usize,
    text: String,
    eligible: Vec<bool>,
}

impl TextView {
    pub fn build(block: &Node, start: usize) -> Self {
        let mut text = String::new();
        let mut eligible = Vec::new();
        for child in block.children() {
            match child.as_text() {
                Some(t) => {
                    let free = !child.marks().has(MarkType::Link)
                        && !child.marks().has(MarkType::Code);
                    text.push_str(&t.text);
                    eligible.extend(std::iter::repeat_n(free, t.text.chars().count()));
                }
                None => {
                    text.push(OBJECT_REPLACEMENT);
                    eligible.push(false);
                }
            }
        }
        Self {
            start,
            text,
            eligible,
        }
    }

    /// Views of every textblock in the document except code blocks.
    pub fn all(doc: &Document) -> Vec<TextView> {
        doc.textblocks()
            .into_iter()
            .filter(|(_, block)| block.node_type() != crate::model::NodeType::CodeBlock)
            .map(|(start, block)| Self::build(block, start))
            .collect()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn end(&self) -> usize {
        self.start + self.eligible.len()
    }

    /// Character at a document position inside this block.
    pub fn char_at(&self, pos: usize) -> Option<char> {
        pos.checked_sub(self.start)
            .and_then(|i| self.text.chars().nth(i))
    }

    fn position(&self, byte: usize) -> usize {
        self.start + self.text[..byte].chars().count()
    }

    fn is_eligible(&self, from: usize, to: usize) -> bool {
        (from..to).all(|pos| self.eligible.get(pos - self.start).copied().unwrap_or(false))
    }

    /// Markdown links and bare URLs, ordered by start. Bare URLs overlapping
    /// a markdown link or sitting right after `(` are skipped.
    pub fn find_links(&self) -> Vec<LinkMatch> {
        let mut found: Vec<LinkMatch> = Vec::new();

        for caps in markdown_link_regex().captures_iter(&self.text) {
            let (Some(whole), Some(text), Some(href)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            let from = self.position(whole.start());
            let to = self.position(whole.end());
            if self.is_eligible(from, to) {
                found.push(LinkMatch {
                    from,
                    to,
                    pattern: LinkPattern::Markdown {
                        text: text.as_str().to_string(),
                        href: href.as_str().to_string(),
                    },
                });
            }
        }

        for url in url_regex().find_iter(&self.text) {
            let trimmed = url.as_str().trim_end_matches(is_url_trailer);
            if trimmed.is_empty() || self.text[..url.start()].ends_with('(') {
                continue;
            }
            let from = self.position(url.start());
            let to = from + trimmed.chars().count();
            let overlaps = found.iter().any(|m| from < m.to && to > m.from);
            if !overlaps && self.is_eligible(from, to) {
                found.push(LinkMatch {
                    from,
                    to,
                    pattern: LinkPattern::Bare {
                        href: trimmed.to_string(),
                    },
                });
            }
        }

        found.sort_by_key(|m| m.from);
        found
    }
}

/// Every pattern lying entirely within `[from, to)`.
pub fn find_in_range(doc: &Document, from: usize, to: usize) -> Vec<LinkMatch> {
    TextView::all(doc)
        .iter()
        .filter(|view| view.start <= to && view.end() >= from)
        .flat_map(TextView::find_links)
        .filter(|m| m.from >= from && m.to <= to)
        .collect()
}

/// Raw `[text](href)` runs whose range does not touch `[sel_from, sel_to]`.
pub fn collapsible(doc: &Document, sel_from: usize, sel_to: usize) -> Vec<LinkMatch> {
    TextView::all(doc)
        .iter()
        .flat_map(TextView::find_links)
        .filter(|m| matches!(m.pattern, LinkPattern::Markdown { .. }))
        .filter(|m| !(m.from <= sel_to && sel_from <= m.to))
        .collect()
}

/// The pattern completed by the trigger character just before the cursor.
///
/// A markdown link must end right before the trigger. A bare URL needs a
/// whitespace trigger, with nothing but trailing punctuation in between.
pub fn completed_by_trigger(doc: &Document, cursor: usize) -> Option<LinkMatch> {
    let trigger_at = cursor.checked_sub(1)?;
    let view = TextView::all(doc)
        .into_iter()
        .find(|view| view.start <= trigger_at && trigger_at < view.end())?;
    let trigger = view.char_at(trigger_at)?;
    view.find_links().into_iter().find(|m| match m.pattern {
        LinkPattern::Markdown { .. } => m.to == trigger_at,
        LinkPattern::Bare { .. } => {
            trigger.is_whitespace()
                && m.to <= trigger_at
                && (m.to..trigger_at).all(|pos| view.char_at(pos).is_some_and(is_url_trailer))
        }
    })
}

/// Turns a match into link-marked text inside `tr`.
pub fn apply(tr: &mut Transaction, m: &LinkMatch) -> EditResult<()> {
    match &m.pattern {
        LinkPattern::Markdown { text, href } => {
            let marks = tr
                .doc()
                .resolve(m.from)?
                .marks()
                .with(Mark::link(href.clone()));
            tr.replace_text(m.from, m.to, text, Some(marks))?;
        }
        LinkPattern::Bare { href } => {
            tr.add_mark(m.from, m.to, Mark::link(href.clone()))?;
        }
    }
    Ok(())
}
