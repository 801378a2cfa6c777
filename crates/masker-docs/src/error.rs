use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported document: {0}")]
    Format(String),

    #[error("Upstream service unavailable: {0}")]
    Unavailable(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error(transparent)]
    Mask(#[from] masker_core::Error),

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the failure lies with a service this one depends on
    pub fn is_upstream(&self) -> bool {
        match self {
            Error::Unavailable(_) | Error::Upstream(_) => true,
            Error::Mask(e) => matches!(
                e,
                masker_core::Error::Unavailable(_) | masker_core::Error::Upstream(_)
            ),
            _ => false,
        }
    }

    /// Whether the caller sent something unusable
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Error::InvalidInput(_) | Error::Format(_) | Error::Zip(_) => true,
            Error::Mask(e) => matches!(e, masker_core::Error::InvalidInput(_)),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
