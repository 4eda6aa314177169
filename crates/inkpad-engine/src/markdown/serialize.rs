use super::escape::{escape_heading_end, escape_line_start, escape_text};
use super::kinds::{CodeSpan, Emphasis, Footnote, LinkSyntax, TaskItem};
use crate::model::{Document, Mark, MarkType, Node, NodeKind, NodeType};

const BLOCK_SEPARATOR: &str = "\n\n";
const FOOTNOTE_INDENT: &str = "    ";

/// Writes a document back to markdown.
///
/// Blocks are separated by one blank line and the output has no trailing
/// newline. Parsing the output yields the same document for everything the
/// schema can express, apart from whitespace at the edges of text, marks on
/// whitespace-only runs and empty paragraphs, which markdown cannot spell and
/// are dropped.
pub fn serialize(doc: &Document) -> String {
    blocks(doc.root().children())
}

fn is_empty_paragraph(node: &Node) -> bool {
    node.node_type() == NodeType::Paragraph && node.child_count() == 0
}

fn blocks(nodes: &[Node]) -> String {
    let mut parts = Vec::with_capacity(nodes.len());
    let mut previous: Option<NodeType> = None;
    let mut alternate = false;
    for node in nodes.iter().filter(|n| !is_empty_paragraph(n)) {
        let ty = node.node_type();
        // Two lists of the same type in a row only stay apart with different markers.
        alternate = is_list(ty) && previous == Some(ty) && !alternate;
        parts.push(block(node, alternate));
        previous = Some(ty);
    }
    parts.join(BLOCK_SEPARATOR)
}

fn is_list(ty: NodeType) -> bool {
    matches!(ty, NodeType::BulletList | NodeType::OrderedList)
}

fn block(node: &Node, alternate: bool) -> String {
    let Some(kind) = node.kind() else {
        return String::new();
    };
    match kind {
        NodeKind::Paragraph => inline(node.children()),
        NodeKind::Heading { level } => {
            let text = escape_heading_end(&inline(node.children()));
            let hashes = "#".repeat(usize::from(*level));
            if text.is_empty() {
                hashes
            } else {
                format!("{hashes} {text}")
            }
        }
        NodeKind::CodeBlock { info } => {
            let code = node.text_content();
            let fence = CodeSpan::block_fence(&code);
            if code.is_empty() {
                format!("{fence}{info}\n{fence}")
            } else {
                format!("{fence}{info}\n{code}\n{fence}")
            }
        }
        NodeKind::Blockquote => prefix_lines(&blocks(node.children()), "> ", "> "),
        NodeKind::BulletList => {
            let marker = if alternate { "* " } else { "- " };
            list(node, |_| marker.to_string())
        }
        NodeKind::OrderedList { start } => {
            let delimiter = if alternate { ')' } else { '.' };
            list(node, |index| format!("{}{delimiter} ", start + index as u64))
        }
        NodeKind::FootnoteDef { id } => prefix_lines(
            &blocks(node.children()),
            &Footnote::definition_prefix(id),
            FOOTNOTE_INDENT,
        ),
        NodeKind::HorizontalRule => "---".to_string(),
        // Items are written by their list; inline kinds never stand alone.
        NodeKind::ListItem { .. }
        | NodeKind::Doc
        | NodeKind::FootnoteRef { .. }
        | NodeKind::HardBreak => blocks(node.children()),
    }
}

fn list(node: &Node, marker: impl Fn(usize) -> String) -> String {
    node.children()
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let marker = marker(index);
            let checked = match item.kind() {
                Some(NodeKind::ListItem { checked }) => *checked,
                _ => None,
            };
            let first = format!("{marker}{}", TaskItem::checkbox(checked));
            prefix_lines(&item_content(item), &first, &" ".repeat(marker.len()))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Item children, keeping nested lists tight against the text above them.
fn item_content(item: &Node) -> String {
    let mut out = String::new();
    for (index, child) in item.children().iter().enumerate() {
        if index > 0 && is_empty_paragraph(child) {
            continue;
        }
        if index > 0 {
            out.push_str(if is_list(child.node_type()) {
                "\n"
            } else {
                BLOCK_SEPARATOR
            });
        }
        out.push_str(&block(child, false));
    }
    out
}

/// Prefixes the first line with `first` and every later line with `rest`.
/// Blank later lines get `rest` without its trailing spaces.
fn prefix_lines(text: &str, first: &str, rest: &str) -> String {
    let mut out = String::with_capacity(text.len() + first.len());
    for (index, line) in text.split('\n').enumerate() {
        if index == 0 {
            out.push_str(first);
            out.push_str(line);
            continue;
        }
        out.push('\n');
        if line.is_empty() {
            out.push_str(rest.trim_end());
        } else {
            out.push_str(rest);
            out.push_str(line);
        }
    }
    out
}

fn inline(content: &[Node]) -> String {
    // A break at the very end of a block has no markdown spelling.
    let end = content
        .iter()
        .rposition(|n| n.node_type() != NodeType::HardBreak)
        .map_or(0, |i| i + 1);
    let mut writer = InlineWriter::default();
    for (index, node) in content[..end].iter().enumerate() {
        writer.node(node, content.get(index + 1));
    }
    writer.finish()
}

#[derive(Default)]
struct InlineWriter {
    out: String,
    /// Marks currently open, outermost first.
    open: Vec<Mark>,
    /// Whitespace held back so it lands outside a closing delimiter.
    pending: String,
    /// Output length right after a footnote reference written at line start.
    reference_end: Option<usize>,
    /// Output length right after a closing delimiter run that follows punctuation.
    closer_end: Option<usize>,
}

/// Punctuation as the delimiter flanking rules see it.
fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || (!c.is_ascii() && !c.is_alphanumeric() && !c.is_whitespace())
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !is_punctuation(c)
}

/// `c` spelled as a numeric character reference, which starts and ends
/// with punctuation whatever `c` is.
fn char_reference(c: char) -> String {
    format!("&#{};", u32::from(c))
}

/// First character a mark's opening syntax writes.
fn opening_char(mark: &Mark) -> Option<char> {
    match mark {
        Mark::Link { .. } => Some(LinkSyntax::OPEN),
        other => Emphasis::delimiter(other.mark_type()).and_then(|d| d.chars().next()),
    }
}

impl InlineWriter {
    fn node(&mut self, node: &Node, next: Option<&Node>) {
        match node {
            Node::Text(t) => self.text(&t.text, node, next),
            Node::Element(el) => {
                self.flush_pending();
                match &el.kind {
                    NodeKind::HardBreak => self.out.push_str("\\\n"),
                    NodeKind::FootnoteRef { id } => {
                        let line_start = self.at_line_start();
                        self.out.push_str(&Footnote::reference(id));
                        if line_start {
                            self.reference_end = Some(self.out.len());
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    fn text(&mut self, text: &str, node: &Node, next: Option<&Node>) {
        let marks = node.marks();
        let is_code = marks.has(MarkType::Code);

        if let Some(href) = self.autolink(text, node, next) {
            self.sync(&[], None);
            self.out.push(LinkSyntax::AUTO_OPEN);
            self.out.push_str(href);
            self.out.push(LinkSyntax::AUTO_CLOSE);
            return;
        }

        let mut desired: Vec<Mark> = marks
            .iter()
            .filter(|m| m.mark_type() != MarkType::Code)
            .cloned()
            .collect();
        let keep = self.common_prefix(&desired);

        let opens_emphasis = desired[keep.min(desired.len())..]
            .iter()
            .any(|m| m.mark_type() != MarkType::Link);
        let mut body = text;
        if opens_emphasis && !is_code {
            let trimmed = text.trim_start();
            if trimmed.is_empty() {
                // Delimiters cannot wrap whitespace alone. The run is written
                // with the marks already open and merges into its neighbours
                // when parsed back.
                desired.truncate(keep);
            } else {
                let lead = &text[..text.len() - trimmed.len()];
                self.close_to(keep);
                self.flush_pending();
                self.out.push_str(lead);
                body = trimmed;
            }
        }
        let first = if is_code {
            Some(CodeSpan::TICK as char)
        } else {
            body.chars().next()
        };
        self.sync(&desired, first);

        if is_code {
            self.out.push_str(&CodeSpan::wrap(body));
            return;
        }
        let emphasis_open = self.open.iter().any(|m| m.mark_type() != MarkType::Link);
        let (body, trailing) = if emphasis_open {
            let trimmed = body.trim_end();
            (trimmed, &body[trimmed.len()..])
        } else {
            (body, "")
        };
        if !body.is_empty() {
            let mut escaped = escape_text(body);
            if self.at_line_start() {
                escaped = escape_line_start(&escaped);
            }
            self.push_guarded(&escaped);
        }
        self.pending.push_str(trailing);
    }

    /// The href when this run is best written as `<href>`.
    fn autolink<'n>(&self, text: &str, node: &'n Node, next: Option<&Node>) -> Option<&'n str> {
        let marks = node.marks();
        let link = marks.get(MarkType::Link)?;
        let Mark::Link { href, title: None } = link else {
            return None;
        };
        let continues = next.is_some_and(|n| n.marks().contains(link));
        let alone = marks.len() == 1 && !self.open.contains(link);
        (alone && !continues && text == href.as_str() && LinkSyntax::is_autolink(href))
            .then_some(href.as_str())
    }

    fn common_prefix(&self, desired: &[Mark]) -> usize {
        self.open
            .iter()
            .zip(desired)
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Writes escaped text right after whatever came before it.
    ///
    /// `[^id]:` at the start of a line reads as a definition, so the colon is
    /// escaped. A closing delimiter run after punctuation only closes when it
    /// is not followed by a word character, so that character is written as a
    /// character reference.
    fn push_guarded(&mut self, escaped: &str) {
        let len = self.out.len();
        let mut rest = escaped;
        if self.reference_end == Some(len) && rest.starts_with(':') {
            self.out.push('\\');
        } else if self.closer_end == Some(len)
            && let Some(c) = rest.chars().next()
            && is_word_char(c)
        {
            self.out.push_str(&char_reference(c));
            rest = &rest[c.len_utf8()..];
        }
        self.out.push_str(rest);
    }

    /// Closes and opens delimiters so exactly `desired` is open. `first` is
    /// the character written right after them.
    fn sync(&mut self, desired: &[Mark], first: Option<char>) {
        let keep = self.common_prefix(desired);
        self.close_to(keep);
        self.flush_pending();
        let opening = &desired[keep..];
        self.guard_opener(opening, first);
        for mark in opening {
            self.open_mark(mark);
        }
    }

    /// An opening delimiter run followed by punctuation only opens when it is
    /// not preceded by a word character; that character is rewritten as a
    /// character reference.
    fn guard_opener(&mut self, opening: &[Mark], first: Option<char>) {
        let Some(head) = opening.first() else {
            return;
        };
        if head.mark_type() == MarkType::Link {
            return;
        }
        let run = opening_char(head);
        let after = match opening[1..].iter().map(opening_char).find(|c| *c != run) {
            Some(c) => c,
            None => first,
        };
        if after.is_some_and(is_punctuation)
            && let Some(before) = self.out.chars().next_back()
            && is_word_char(before)
        {
            self.out.pop();
            self.out.push_str(&char_reference(before));
        }
    }

    fn close_to(&mut self, keep: usize) {
        // Delimiter character of the run being written, and whether the run
        // follows punctuation.
        let mut run: Option<(char, bool)> = None;
        while self.open.len() > keep {
            let Some(mark) = self.open.pop() else {
                break;
            };
            match &mark {
                Mark::Link { href, title } => {
                    self.out
                        .push_str(&LinkSyntax::close(href, title.as_deref()));
                    run = None;
                }
                other => {
                    let delimiter = Emphasis::delimiter(other.mark_type()).unwrap_or_default();
                    if let Some(c) = delimiter.chars().next()
                        && run.is_none_or(|(current, _)| current != c)
                    {
                        let after_punctuation =
                            self.out.chars().next_back().is_some_and(is_punctuation);
                        run = Some((c, after_punctuation));
                    }
                    self.out.push_str(delimiter);
                }
            }
        }
        if let Some((_, true)) = run {
            self.closer_end = Some(self.out.len());
        }
    }

    fn open_mark(&mut self, mark: &Mark) {
        match mark {
            Mark::Link { .. } => {
                // `![` would read as an image.
                if self.out.ends_with('!') && !self.out.ends_with("\\!") {
                    self.out.pop();
                    self.out.push_str("\\!");
                }
                self.out.push(LinkSyntax::OPEN);
            }
            other => self
                .out
                .push_str(Emphasis::delimiter(other.mark_type()).unwrap_or_default()),
        }
        self.open.push(mark.clone());
    }

    fn flush_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        self.out.push_str(&pending);
    }

    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    fn finish(mut self) -> String {
        self.close_to(0);
        self.flush_pending();
        self.out
    }
}
