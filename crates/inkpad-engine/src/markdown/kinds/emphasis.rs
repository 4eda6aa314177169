use crate::model::MarkType;

pub struct Emphasis;

impl Emphasis {
    pub const STRONG: &'static str = "**";
    pub const EM: &'static str = "*";
    pub const STRIKE: &'static str = "~~";

    /// Delimiter for marks written as symmetric runs around their text.
    pub fn delimiter(mark_type: MarkType) -> Option<&'static str> {
        match mark_type {
            MarkType::Strong => Some(Self::STRONG),
            MarkType::Em => Some(Self::EM),
            MarkType::Strike => Some(Self::STRIKE),
            MarkType::Link | MarkType::Code => None,
        }
    }
}
