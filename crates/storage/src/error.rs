use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to parse document: {0}")]
    Parse(String),

    #[error("failed to serialize document: {0}")]
    Serialize(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for rbac::Error {
    fn from(err: Error) -> Self {
        rbac::Error::store(err)
    }
}
