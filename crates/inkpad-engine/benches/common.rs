// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_markdown_content(size: usize) -> String {
    let base = "# Title\n\n## Section\n\nParagraph with **some** content and a [link](https://example.com)[^1].\n\n- [ ] Task item\n  - Nested item\n- [x] Done item\n\n> Quoted *text*\n\n```rust\nfn example() {\n    println!(\"Hello\");\n}\n```\n\n[^1]: A footnote.\n\n";
    base.repeat(size)
}

/// One paragraph of `runs` alternating plain and linked runs, each linked
/// run split by inner marks so a span covers several text nodes.
#[allow(dead_code)]
pub fn generate_linked_paragraph(runs: usize) -> String {
    let mut content = String::new();
    for i in 0..runs {
        content.push_str(&format!("plain {i} [linked **bold** *em* {i}](https://example.com/{i}) "));
    }
    content
}
