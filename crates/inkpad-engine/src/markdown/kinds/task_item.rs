pub struct TaskItem;

impl TaskItem {
    pub const UNCHECKED: &'static str = "[ ] ";
    pub const CHECKED: &'static str = "[x] ";

    /// Checkbox written after the list marker; plain items have none.
    pub fn checkbox(checked: Option<bool>) -> &'static str {
        match checked {
            Some(true) => Self::CHECKED,
            Some(false) => Self::UNCHECKED,
            None => "",
        }
    }
}
