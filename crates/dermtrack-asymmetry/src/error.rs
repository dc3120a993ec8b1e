/// Errors returned by the asymmetry scorer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AsymmetryError {
    #[error("invalid mask: {reason}")]
    InvalidMask { reason: String },
}

impl AsymmetryError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidMask {
            reason: reason.into(),
        }
    }
}
