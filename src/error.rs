use thiserror::Error;

#[derive(Error, Debug)]
pub enum MiloError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("File has no data rows")]
    EmptyFile,

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown date format: {0}")]
    UnknownDateFormat(String),

    #[error("Mapping references column '{0}' which is not in the file")]
    UnknownColumn(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, MiloError>;
