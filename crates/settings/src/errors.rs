use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ron error: {0}")]
    Ron(#[from] ron::Error),

    #[error("failed to parse settings file: {0}")]
    Parse(#[from] ron::error::SpannedError),

    #[error("record not found: {0}")]
    NotFound(&'static str),

    #[error("record already exists: {0}")]
    AlreadyExists(&'static str),

    #[error("invalid settings: {0}")]
    Invalid(&'static str),
}
