/// Errors raised by the editing core.
///
/// None of these ever reach the host as a crash: plugins catch them at their
/// boundary, log them, and leave the editor in its prior state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    #[error("position {pos} is out of range (document size {size})")]
    OutOfRange { pos: usize, size: usize },

    #[error("position stamped at version {stamped} can no longer be rebased (document is at version {current})")]
    StalePosition { stamped: u64, current: u64 },

    #[error("transaction was started at version {started} but the document is at version {current}")]
    StaleTransaction { started: u64, current: u64 },

    #[error("transaction failed: {0}")]
    TransactionFailed(Box<EditError>),
}

impl EditError {
    pub(crate) fn schema(msg: impl Into<String>) -> Self {
        EditError::SchemaViolation(msg.into())
    }

    /// The underlying step error, unwrapping `TransactionFailed`.
    pub fn root_cause(&self) -> &EditError {
        match self {
            EditError::TransactionFailed(inner) => inner.root_cause(),
            other => other,
        }
    }
}

pub type EditResult<T> = Result<T, EditError>;
