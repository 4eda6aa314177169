pub struct LinkSyntax;

impl LinkSyntax {
    pub const OPEN: char = '[';
    pub const MIDDLE: &'static str = "](";
    pub const CLOSE: char = ')';
    pub const AUTO_OPEN: char = '<';
    pub const AUTO_CLOSE: char = '>';

    /// Whether `href` can be written as an `<href>` autolink.
    pub fn is_autolink(href: &str) -> bool {
        let has_scheme = href
            .split_once(':')
            .is_some_and(|(scheme, _)| {
                scheme.len() >= 2
                    && scheme.chars().all(|c| c.is_ascii_alphanumeric() || "+.-".contains(c))
            });
        has_scheme && !href.chars().any(|c| c.is_whitespace() || c == '<' || c == '>')
    }

    /// Link destination, angle-bracketed when it would not survive bare.
    pub fn destination(href: &str) -> String {
        let mut depth = 0i32;
        let mut balanced = true;
        for c in href.chars() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    balanced &= depth >= 0;
                }
                _ => {}
            }
        }
        balanced &= depth == 0;
        if balanced && !href.chars().any(|c| c.is_whitespace() || c == '<' || c == '>') {
            href.replace('\\', "\\\\")
        } else {
            format!("<{}>", href.replace('\\', "\\\\").replace('<', "\\<").replace('>', "\\>"))
        }
    }

    pub fn title(title: &str) -> String {
        format!(" \"{}\"", title.replace('\\', "\\\\").replace('"', "\\\""))
    }

    /// Closing part of an inline link: `](href "title")`.
    pub fn close(href: &str, title: Option<&str>) -> String {
        format!(
            "{}{}{}{}",
            Self::MIDDLE,
            Self::destination(href),
            title.map(Self::title).unwrap_or_default(),
            Self::CLOSE
        )
    }
}
