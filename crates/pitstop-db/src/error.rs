use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A task referenced a car that does not exist.
    #[error("Car not found")]
    CarMissing,

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
