//! Backslash escaping for text written back to markdown.
//!
//! Every character that could start inline syntax is escaped wherever it
//! appears; block markers only at the start of a line.

/// Characters escaped anywhere in running text.
const INLINE_SPECIAL: &[char] = &['\\', '*', '_', '~', '[', ']', '`', '<', '&'];

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if INLINE_SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escapes an already inline-escaped string that begins a line, so it cannot
/// be read as a heading, list item, quote, rule or setext underline.
pub fn escape_line_start(text: &str) -> String {
    let text = text.trim_start();
    let mut chars = text.chars();
    match chars.next() {
        Some(c @ ('#' | '-' | '+' | '>' | '=')) => format!("\\{c}{}", chars.as_str()),
        Some(c) if c.is_ascii_digit() => {
            let digits = text.chars().take_while(char::is_ascii_digit).count();
            let rest = &text[digits..];
            match rest.chars().next() {
                Some(p @ ('.' | ')')) => format!("{}\\{p}{}", &text[..digits], &rest[1..]),
                _ => text.to_string(),
            }
        }
        _ => text.to_string(),
    }
}

/// Heading text may not end in `#`, which would read as a closing sequence.
pub fn escape_heading_end(text: &str) -> String {
    match text.strip_suffix('#') {
        Some(rest) if !rest.ends_with('\\') => format!("{rest}\\#"),
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("plain", "plain")]
    #[case("a*b_c", "a\\*b\\_c")]
    #[case("[^1]", "\\[^1\\]")]
    #[case("x < y & z", "x \\< y \\& z")]
    #[case("C:\\dir", "C:\\\\dir")]
    fn inline_escapes(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(escape_text(text), expected);
    }

    #[rstest]
    #[case("# not a heading", "\\# not a heading")]
    #[case("- not a list", "\\- not a list")]
    #[case("12. not ordered", "12\\. not ordered")]
    #[case("1999 was a year", "1999 was a year")]
    #[case("> not a quote", "\\> not a quote")]
    #[case("   indented", "indented")]
    fn line_start_escapes(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(escape_line_start(text), expected);
    }

    #[test]
    fn heading_closing_hash_is_escaped() {
        assert_eq!(escape_heading_end("C#"), "C\\#");
        assert_eq!(escape_heading_end("plain"), "plain");
    }
}
