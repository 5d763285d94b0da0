use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TourError {
    /// A part the controller cannot run without was not supplied.
    #[error("missing required reference: {0}")]
    MissingReference(&'static str),

    #[error("invalid setting `{name}`: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}

pub type Result<T, E = TourError> = std::result::Result<T, E>;
