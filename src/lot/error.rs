use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LotError {
    #[error("parking lot is full")]
    Full,
    #[error("slot index out of range 0..{capacity}")]
    InvalidIndex { capacity: usize },
    #[error("no slot is held by {0}")]
    OccupantNotFound(String),
}

impl LotError {
    /// Stable, machine-readable reason reported to clients.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Full => "lot full",
            Self::InvalidIndex { .. } => "invalid index",
            Self::OccupantNotFound(_) => "not found",
        }
    }
}
