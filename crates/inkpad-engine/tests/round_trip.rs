//! Markdown codec behaviour seen from outside the crate.

use inkpad_engine::markdown::{self, footnotes};
use inkpad_engine::model::{Document, Mark, MarkSet, Node, NodeKind};
use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use rstest::rstest;

fn normalize(md: &str) -> String {
    markdown::serialize(&markdown::parse(md))
}

#[rstest]
#[case::inline_marks("# Title\n\nSome **bold** and *em* and ~~gone~~ text.")]
#[case::links("See [docs](https://x.com) or <https://y.com>.")]
#[case::code("Use `cargo` here.\n\n```rust\nfn main() {}\n```")]
#[case::quote("> quoted\n>\n> second")]
#[case::ordered("3. three\n4. four")]
#[case::tasks("- [ ] open\n- [x] done\n  - [ ] nested")]
#[case::footnotes("a[^1] b[^2]\n\n[^1]: first\n\n[^2]: second")]
#[case::rule("above\n\n---\n\nbelow")]
#[case::hard_break("one\\\ntwo")]
#[case::escapes("not \\*em\\* and \\[^1\\] stays text")]
fn normalized_markdown_is_a_fixed_point(#[case] md: &str) {
    assert_eq!(normalize(md), md);
}

#[rstest]
#[case("* a\n* b\n\n+ c")]
#[case("Setext\n======\n\ntext with  \nbreak")]
#[case("1) one\n2) two\n\n- [x] done\n\n> - quoted item\n>\n>   more")]
#[case("[^note]: defined but unused\n\nand [^missing] unused definition")]
#[case("**bold *nested em* end** and [**strong link**](u)")]
#[case("    indented code\n\n~~~\nfenced ``` inside\n~~~")]
fn parse_of_serialize_is_structurally_equal(#[case] md: &str) {
    let doc = markdown::parse(md);
    let reparsed = markdown::parse(&markdown::serialize(&doc));
    assert_eq!(reparsed, doc);
}

#[test]
fn bullet_markers_are_normalized() {
    assert_snapshot!(normalize("* a\n* b"), @r"
    - a
    - b
    ");
}

#[test]
fn emphasis_uses_star_delimiters() {
    assert_snapshot!(normalize("__strong__ _em_"), @"**strong** *em*");
}

#[test]
fn setext_headings_become_atx() {
    assert_snapshot!(normalize("Setext\n======"), @"# Setext");
}

#[test]
fn soft_breaks_join_lines() {
    assert_snapshot!(normalize("line one\nline two"), @"line one line two");
}

#[test]
fn indented_code_becomes_fenced() {
    assert_snapshot!(normalize("    indented code"), @r"
    ```
    indented code
    ```
    ");
}

#[test]
fn dangling_footnotes_survive() {
    let md = "text[^gone]\n\n[^spare]: unused";
    let doc = markdown::parse(md);
    let inventory = footnotes(&doc);
    let ids = |entries: Vec<&inkpad_engine::markdown::FootnoteEntry>| {
        entries.into_iter().map(|e| e.id.clone()).collect::<Vec<_>>()
    };
    assert_eq!(ids(inventory.undefined()), vec!["gone"]);
    assert_eq!(ids(inventory.unreferenced()), vec!["spare"]);
    assert_eq!(markdown::serialize(&doc), md);
}

#[test]
fn task_state_is_an_attribute_of_the_item() {
    let doc = markdown::parse("- [x] done");
    let list = doc.root().child(0).unwrap();
    assert_eq!(
        list.child(0).and_then(|n| n.kind()),
        Some(&NodeKind::ListItem {
            checked: Some(true)
        })
    );
}

fn doc(blocks: Vec<Node>) -> Document {
    Document::new(Node::element(NodeKind::Doc, blocks)).unwrap()
}

fn para(content: Vec<Node>) -> Node {
    Node::element(NodeKind::Paragraph, content)
}

fn text(t: &str) -> Node {
    Node::text(t)
}

fn marked(t: &str, marks: Vec<Mark>) -> Node {
    Node::marked_text(t, MarkSet::from(marks))
}

fn reference(id: &str) -> Node {
    Node::element(NodeKind::FootnoteRef { id: id.into() }, vec![])
}

fn item(checked: Option<bool>, content: Vec<Node>) -> Node {
    Node::element(NodeKind::ListItem { checked }, content)
}

fn bullets(items: Vec<Node>) -> Node {
    Node::element(NodeKind::BulletList, items)
}

#[rstest]
#[case::reference_at_paragraph_start(doc(vec![para(vec![reference("1"), text(": hi")])]))]
#[case::defined_reference_at_paragraph_start(doc(vec![
    para(vec![reference("1"), text(": hi")]),
    Node::element(NodeKind::FootnoteDef { id: "1".into() }, vec![para(vec![text("note")])]),
]))]
#[case::reference_after_a_break(doc(vec![para(vec![
    text("a"),
    Node::element(NodeKind::HardBreak, vec![]),
    reference("1"),
    text(":b"),
])]))]
#[case::reference_in_a_quote(doc(vec![Node::element(
    NodeKind::Blockquote,
    vec![para(vec![reference("n"), text(": q")])],
)]))]
#[case::reference_in_a_list_item(doc(vec![bullets(vec![item(
    None,
    vec![para(vec![reference("1"), text(": x")])],
)])]))]
#[case::strong_punctuation_inside_a_word(doc(vec![para(vec![
    text("a"),
    marked("(b)", vec![Mark::Strong]),
    text("c"),
])]))]
#[case::em_starting_with_punctuation(doc(vec![para(vec![
    text("a"),
    marked(".x", vec![Mark::Em]),
    text("b"),
])]))]
#[case::em_ending_with_punctuation(doc(vec![para(vec![
    text("a"),
    marked("b.", vec![Mark::Em]),
    text("c"),
])]))]
#[case::strike_around_punctuation(doc(vec![para(vec![
    text("a"),
    marked("!b?", vec![Mark::Strike]),
    text("c"),
])]))]
#[case::strong_link_between_words(doc(vec![para(vec![
    text("a"),
    marked("(x)", vec![Mark::link("u"), Mark::Strong]),
    text("c"),
])]))]
#[case::nested_task_items(doc(vec![bullets(vec![item(
    Some(false),
    vec![
        para(vec![text("one")]),
        bullets(vec![item(Some(true), vec![para(vec![text("two")])])]),
    ],
)])]))]
#[case::item_text_that_looks_like_a_checkbox(doc(vec![bullets(vec![item(
    None,
    vec![para(vec![text("[x] not a task")])],
)])]))]
#[case::empty_heading(doc(vec![
    Node::element(NodeKind::Heading { level: 2 }, vec![]),
    para(vec![text("x")]),
]))]
#[case::empty_code_block(doc(vec![Node::element(
    NodeKind::CodeBlock { info: "rust".into() },
    vec![],
)]))]
#[case::escaped_reference_text(doc(vec![para(vec![text("[^1] stays text")])]))]
fn constructed_documents_survive_a_round_trip(#[case] doc: Document) {
    let written = markdown::serialize(&doc);
    assert_eq!(markdown::parse(&written), doc, "written as {written:?}");
}

#[test]
fn marks_on_whitespace_alone_are_not_written() {
    let d = doc(vec![para(vec![
        text("a"),
        marked(" ", vec![Mark::Strong]),
        text("c"),
    ])]);
    assert_snapshot!(markdown::serialize(&d), @"a c");
}

#[test]
fn empty_paragraphs_are_not_written() {
    let d = doc(vec![para(vec![text("a")]), para(vec![])]);
    assert_snapshot!(markdown::serialize(&d), @"a");
    assert_eq!(markdown::parse("a"), doc(vec![para(vec![text("a")])]));
}
