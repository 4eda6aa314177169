use crate::markdown::cursor::Cursor;

pub struct CodeSpan;

impl CodeSpan {
    pub const TICK: u8 = b'`';
    /// Shortest fence for a fenced code block.
    pub const MIN_BLOCK_FENCE: usize = 3;

    /// Longest run of backticks in `text`.
    pub fn longest_tick_run(text: &str) -> usize {
        let mut cur = Cursor::new(text);
        let mut longest = 0;
        while !cur.eof() {
            if cur.peek() == Some(Self::TICK) {
                longest = longest.max(cur.bump_run(Self::TICK));
            } else {
                cur.bump();
            }
        }
        longest
    }

    /// Writes `text` as an inline code span with a fence no run inside can close.
    pub fn wrap(text: &str) -> String {
        let fence = "`".repeat(Self::longest_tick_run(text) + 1);
        let pad = text.starts_with('`')
            || text.ends_with('`')
            || (text.starts_with(' ') && text.ends_with(' ') && !text.trim().is_empty());
        if pad {
            format!("{fence} {text} {fence}")
        } else {
            format!("{fence}{text}{fence}")
        }
    }

    pub fn block_fence(code: &str) -> String {
        "`".repeat((Self::longest_tick_run(code) + 1).max(Self::MIN_BLOCK_FENCE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("x", "`x`")]
    #[case("a`b", "``a`b``")]
    #[case("`tick", "`` `tick ``")]
    #[case(" both ", "`  both  `")]
    fn inline_spans(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(CodeSpan::wrap(text), expected);
    }

    #[test]
    fn block_fences_outgrow_inner_runs() {
        assert_eq!(CodeSpan::block_fence("plain"), "```");
        assert_eq!(CodeSpan::block_fence("````"), "`````");
    }
}
