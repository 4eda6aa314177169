use log::warn;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use super::kinds::{Footnote, FootnoteSegment};
use crate::model::schema::is_footnote_id;
use crate::model::{Document, Mark, MarkSet, MarkType, Node, NodeKind, NodeType};

pub(crate) fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options
}

/// Parses markdown into a schema-valid document.
///
/// Constructs the schema has no node for are kept as close as possible:
/// images become link-marked alt text, raw HTML becomes plain text.
pub fn parse(markdown: &str) -> Document {
    let mut processor = MarkdownProcessor::new(markdown);
    for (event, range) in Parser::new_ext(markdown, options()).into_offset_iter() {
        processor.process_event(event, range);
    }
    processor.finish()
}

/// Inline content collected for a textblock before it is closed.
#[derive(Debug)]
enum Inline {
    Node(Node),
    /// `literal` is false when the source spelled the text differently
    /// (escapes, entities), which keeps it from being read as a footnote reference.
    Text {
        text: String,
        marks: MarkSet,
        literal: bool,
    },
}

#[derive(Debug)]
struct Frame {
    kind: NodeKind,
    content: Vec<Inline>,
    /// Paragraph opened for the bare text of a tight list item.
    implicit: bool,
}

impl Frame {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            content: Vec::new(),
            implicit: false,
        }
    }
}

/// Builds the node tree from pulldown-cmark events.
///
/// # Event flow
///
/// Containers arrive as `Start(..)`/`End(..)` pairs and nest as in the
/// source. Tight list items carry their text directly:
///
/// ```markdown
/// - [x] done
///   - child
/// ```
///
/// yields `Start(List)`, `Start(Item)`, `TaskListMarker(true)`, `Text("done")`,
/// `Start(List)`, `Start(Item)`, `Text("child")`, `End(Item)`, `End(List)`,
/// `End(Item)`, `End(List)`. Text outside a textblock therefore opens an
/// implicit paragraph that the next block boundary closes.
///
/// `stack` holds the open containers with the document at the bottom;
/// `marks` holds the inline marks opened so far (`None` for links that
/// could not become a mark, so their end event still pops one entry).
struct MarkdownProcessor<'s> {
    source: &'s str,
    stack: Vec<Frame>,
    marks: Vec<Option<Mark>>,
    in_code_block: bool,
}

impl<'s> MarkdownProcessor<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            stack: vec![Frame::new(NodeKind::Doc)],
            marks: Vec::new(),
            in_code_block: false,
        }
    }

    fn process_event(&mut self, event: Event<'_>, range: std::ops::Range<usize>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    self.push_inline(Inline::Text {
                        text: text.to_string(),
                        marks: MarkSet::empty(),
                        literal: false,
                    });
                } else {
                    let literal = is_literal(self.source, range, &text);
                    self.push_text(&text, literal);
                }
            }
            Event::Code(code) => {
                let marks = self.current_marks().with(Mark::Code);
                self.push_inline(Inline::Text {
                    text: code.replace('\n', " "),
                    marks,
                    literal: false,
                });
            }
            Event::InlineHtml(html) | Event::InlineMath(html) | Event::DisplayMath(html) => {
                self.push_text(&html, false);
            }
            Event::Html(html) => {
                // One event per source line of an HTML block.
                let has_content = self
                    .stack
                    .last()
                    .is_some_and(|frame| frame.kind.node_type().is_textblock() && !frame.content.is_empty());
                if has_content {
                    self.push_inline(Inline::Node(Node::element(NodeKind::HardBreak, vec![])));
                }
                self.push_text(html.trim_end_matches('\n'), false);
            }
            Event::FootnoteReference(label) => {
                let node = Node::element(
                    NodeKind::FootnoteRef {
                        id: footnote_id(&label),
                    },
                    vec![],
                );
                self.push_inline(Inline::Node(node));
            }
            Event::SoftBreak => self.push_text(" ", true),
            Event::HardBreak => {
                self.push_inline(Inline::Node(Node::element(NodeKind::HardBreak, vec![])));
            }
            Event::Rule => {
                self.close_implicit();
                self.append_block(Node::element(NodeKind::HorizontalRule, vec![]));
            }
            Event::TaskListMarker(checked) => {
                if let Some(frame) = self
                    .stack
                    .iter_mut()
                    .rev()
                    .find(|f| f.kind.node_type() == NodeType::ListItem)
                {
                    frame.kind = NodeKind::ListItem {
                        checked: Some(checked),
                    };
                }
            }
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.open_block(NodeKind::Paragraph),
            Tag::Heading { level, .. } => self.open_block(NodeKind::Heading { level: level as u8 }),
            Tag::BlockQuote(_) => self.open_block(NodeKind::Blockquote),
            Tag::CodeBlock(kind) => {
                let info = match kind {
                    CodeBlockKind::Fenced(info) => info.lines().next().unwrap_or("").to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                self.open_block(NodeKind::CodeBlock { info });
                self.in_code_block = true;
            }
            Tag::HtmlBlock => self.open_block(NodeKind::Paragraph),
            Tag::List(Some(start)) => self.open_block(NodeKind::OrderedList { start }),
            Tag::List(None) => self.open_block(NodeKind::BulletList),
            Tag::Item => self.open_block(NodeKind::ListItem { checked: None }),
            Tag::FootnoteDefinition(label) => self.open_block(NodeKind::FootnoteDef {
                id: footnote_id(&label),
            }),
            Tag::Emphasis => self.marks.push(Some(Mark::Em)),
            Tag::Strong => self.marks.push(Some(Mark::Strong)),
            Tag::Strikethrough => self.marks.push(Some(Mark::Strike)),
            Tag::Link {
                dest_url, title, ..
            }
            | Tag::Image {
                dest_url, title, ..
            } => {
                let mark = (!dest_url.is_empty() && !dest_url.contains('\n')).then(|| Mark::Link {
                    href: dest_url.to_string(),
                    title: (!title.is_empty()).then(|| title.replace('\n', " ")),
                });
                self.marks.push(mark);
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::BlockQuote(_)
            | TagEnd::HtmlBlock
            | TagEnd::List(_)
            | TagEnd::Item
            | TagEnd::FootnoteDefinition => {
                self.close_implicit();
                self.close_block();
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.close_block();
            }
            TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Link
            | TagEnd::Image => {
                self.marks.pop();
            }
            _ => {}
        }
    }

    fn current_marks(&self) -> MarkSet {
        self.marks.iter().flatten().cloned().collect()
    }

    fn open_block(&mut self, kind: NodeKind) {
        self.close_implicit();
        self.stack.push(Frame::new(kind));
    }

    fn push_text(&mut self, text: &str, literal: bool) {
        let marks = self.current_marks();
        self.push_inline(Inline::Text {
            text: text.replace('\n', " "),
            marks,
            literal,
        });
    }

    /// Adds inline content, opening an implicit paragraph when the innermost
    /// container holds blocks.
    fn push_inline(&mut self, inline: Inline) {
        let needs_paragraph = self
            .stack
            .last()
            .is_none_or(|frame| !frame.kind.node_type().is_textblock());
        if needs_paragraph {
            let mut frame = Frame::new(NodeKind::Paragraph);
            frame.implicit = true;
            self.stack.push(frame);
        }
        if let Some(frame) = self.stack.last_mut() {
            frame.content.push(inline);
        }
    }

    fn close_implicit(&mut self) {
        if self.stack.last().is_some_and(|frame| frame.implicit) {
            self.close_block();
        }
    }

    fn append_block(&mut self, node: Node) {
        if let Some(frame) = self.stack.last_mut() {
            frame.content.push(Inline::Node(node));
        }
    }

    fn close_block(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        if let Some(frame) = self.stack.pop() {
            let node = build(frame);
            self.append_block(node);
        }
    }

    fn finish(mut self) -> Document {
        self.close_implicit();
        while self.stack.len() > 1 {
            self.close_block();
        }
        let root = match self.stack.pop() {
            Some(frame) => build(frame),
            None => Node::element(NodeKind::Doc, vec![]),
        };
        Document::new(root).unwrap_or_else(|err| {
            warn!("markdown produced an invalid document, starting empty: {err}");
            Document::empty()
        })
    }
}

/// Whether `text` is spelled as-is at `range` in the source.
///
/// An escaped character is reported without its backslash, so an odd run
/// of backslashes right before the range means the first character was
/// escaped.
fn is_literal(source: &str, range: std::ops::Range<usize>, text: &str) -> bool {
    let start = range.start;
    if source.get(range) != Some(text) {
        return false;
    }
    let backslashes = source.as_bytes()[..start]
        .iter()
        .rev()
        .take_while(|b| **b == b'\\')
        .count();
    backslashes % 2 == 0
}

fn footnote_id(label: &str) -> String {
    if is_footnote_id(label) {
        return label.to_string();
    }
    let id: String = label
        .chars()
        .map(|c| if c.is_whitespace() || c == '[' || c == ']' { '-' } else { c })
        .collect();
    if id.is_empty() { "-".to_string() } else { id }
}

fn build(frame: Frame) -> Node {
    let ty = frame.kind.node_type();
    match ty {
        NodeType::CodeBlock => {
            let mut code: String = frame
                .content
                .into_iter()
                .filter_map(|inline| match inline {
                    Inline::Text { text, .. } => Some(text),
                    Inline::Node(_) => None,
                })
                .collect();
            if code.ends_with('\n') {
                code.pop();
            }
            Node::element(frame.kind, vec![Node::text(code)])
        }
        _ if ty.is_textblock() => Node::element(frame.kind, inline_nodes(frame.content)),
        _ => {
            let mut blocks: Vec<Node> = frame
                .content
                .into_iter()
                .filter_map(|inline| match inline {
                    Inline::Node(node) => Some(node),
                    Inline::Text { .. } => None,
                })
                .collect();
            let needs_leading_paragraph = match ty {
                NodeType::ListItem => blocks
                    .first()
                    .is_none_or(|b| b.node_type() != NodeType::Paragraph),
                NodeType::Doc | NodeType::Blockquote | NodeType::FootnoteDef => blocks.is_empty(),
                _ => false,
            };
            if needs_leading_paragraph {
                blocks.insert(0, Node::element(NodeKind::Paragraph, vec![]));
            }
            Node::element(frame.kind, blocks)
        }
    }
}

/// Merges literal text runs and turns `[^id]` spelled in them into references.
fn inline_nodes(content: Vec<Inline>) -> Vec<Node> {
    let mut merged: Vec<Inline> = Vec::with_capacity(content.len());
    for inline in content {
        if let Inline::Text {
            text,
            marks,
            literal: true,
        } = &inline
            && let Some(Inline::Text {
                text: prev,
                marks: prev_marks,
                literal: true,
            }) = merged.last_mut()
            && prev_marks == marks
        {
            prev.push_str(text);
            continue;
        }
        merged.push(inline);
    }

    let mut out = Vec::with_capacity(merged.len());
    for inline in merged {
        match inline {
            Inline::Node(node) => out.push(node),
            Inline::Text {
                text,
                marks,
                literal,
            } => {
                if !literal || marks.has(MarkType::Code) {
                    out.push(Node::marked_text(text, marks));
                    continue;
                }
                for segment in Footnote::split_references(&text) {
                    match segment {
                        FootnoteSegment::Text(t) => out.push(Node::marked_text(t, marks.clone())),
                        FootnoteSegment::Reference(id) => out.push(Node::element(
                            NodeKind::FootnoteRef { id: id.to_string() },
                            vec![],
                        )),
                    }
                }
            }
        }
    }
    out
}
