use crate::markdown::cursor::Cursor;
use crate::model::schema::is_footnote_id;

pub struct Footnote;

/// A piece of inline text split around footnote references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FootnoteSegment<'a> {
    Text(&'a str),
    Reference(&'a str),
}

impl Footnote {
    pub const OPEN: &'static [u8; 2] = b"[^";
    pub const CLOSE: u8 = b']';
    pub const DEF_SUFFIX: &'static str = ": ";

    pub fn reference(id: &str) -> String {
        format!("[^{id}]")
    }

    pub fn definition_prefix(id: &str) -> String {
        format!("[^{id}]{}", Self::DEF_SUFFIX)
    }

    /// Parses a `[^id]` reference at the cursor, restoring it on failure.
    pub fn try_parse_reference<'a>(cur: &mut Cursor<'a>) -> Option<&'a str> {
        let saved = cur.clone();
        if !cur.starts_with(Self::OPEN) {
            return None;
        }
        cur.bump_n(Self::OPEN.len());
        let start = cur.i;
        while let Some(b) = cur.peek() {
            if b == Self::CLOSE {
                break;
            }
            cur.bump();
        }
        let id = cur.slice_from(start);
        if cur.peek() == Some(Self::CLOSE) && is_footnote_id(id) {
            cur.bump();
            return Some(id);
        }
        *cur = saved;
        None
    }

    /// Splits `text` around every well-formed `[^id]` reference.
    pub fn split_references(text: &str) -> Vec<FootnoteSegment<'_>> {
        let mut out = Vec::new();
        let mut cur = Cursor::new(text);
        let mut plain_start = 0;
        while !cur.eof() {
            let at = cur.i;
            if let Some(id) = Self::try_parse_reference(&mut cur) {
                if at > plain_start {
                    out.push(FootnoteSegment::Text(&text[plain_start..at]));
                }
                out.push(FootnoteSegment::Reference(id));
                plain_start = cur.i;
            } else {
                // Step over one whole char so slices stay on char boundaries.
                let width = text[cur.i..].chars().next().map_or(1, char::len_utf8);
                cur.bump_n(width);
            }
        }
        if plain_start < text.len() {
            out.push(FootnoteSegment::Text(&text[plain_start..]));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn references_are_split_out() {
        assert_eq!(
            Footnote::split_references("see[^1] and [^note-2]."),
            vec![
                FootnoteSegment::Text("see"),
                FootnoteSegment::Reference("1"),
                FootnoteSegment::Text(" and "),
                FootnoteSegment::Reference("note-2"),
                FootnoteSegment::Text("."),
            ]
        );
    }

    #[test]
    fn malformed_references_stay_text() {
        assert_eq!(
            Footnote::split_references("[^] [^a b] [^x"),
            vec![FootnoteSegment::Text("[^] [^a b] [^x")]
        );
    }

    #[test]
    fn syntax_helpers() {
        assert_eq!(Footnote::reference("7"), "[^7]");
        assert_eq!(Footnote::definition_prefix("7"), "[^7]: ");
    }
}
