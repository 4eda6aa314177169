/// A byte cursor over one text run, used by the syntax kinds to recognize
/// their delimiters. Callers slice the run with `i` directly.
#[derive(Clone)]
pub struct Cursor<'a> {
    pub s: &'a str,
    /// Byte index into `s`.
    pub i: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(s: &'a str) -> Self {
        Self { s, i: 0 }
    }

    pub fn eof(&self) -> bool {
        self.i >= self.s.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.s.as_bytes().get(self.i).copied()
    }

    pub fn starts_with(&self, pat: &[u8]) -> bool {
        self.s.as_bytes()[self.i..].starts_with(pat)
    }

    pub fn bump(&mut self) -> Option<u8> {
        let b = self.s.as_bytes().get(self.i).copied()?;
        self.i += 1;
        Some(b)
    }

    pub fn bump_n(&mut self, n: usize) {
        self.i += n;
    }

    /// Consumes a run of `b` and returns its length.
    pub fn bump_run(&mut self, b: u8) -> usize {
        let start = self.i;
        while self.peek() == Some(b) {
            self.i += 1;
        }
        self.i - start
    }

    /// Text between `start` (local index) and the cursor.
    pub fn slice_from(&self, start: usize) -> &'a str {
        &self.s[start..self.i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_advances_one_byte() {
        let mut cur = Cursor::new("hi");
        assert_eq!(cur.bump(), Some(b'h'));
        assert_eq!(cur.i, 1);
        assert_eq!(cur.bump(), Some(b'i'));
        assert_eq!(cur.bump(), None);
        assert!(cur.eof());
    }

    #[test]
    fn cursor_starts_with() {
        let cur = Cursor::new("[^note]");
        assert!(cur.starts_with(b"[^"));
        assert!(!cur.starts_with(b"]"));
    }

    #[test]
    fn runs_are_counted() {
        let mut cur = Cursor::new("```x");
        assert_eq!(cur.bump_run(b'`'), 3);
        assert_eq!(cur.slice_from(0), "```");
        assert_eq!(cur.peek(), Some(b'x'));
    }

    #[test]
    fn empty_string_input() {
        let cur = Cursor::new("");
        assert!(cur.eof());
        assert_eq!(cur.peek(), None);
    }
}
