pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("administrator id must be non-zero")]
    InvalidAdmin,

    #[error("administrator id is out of range: {0}")]
    AdminOutOfRange(#[from] courier_common::Error),

    #[error(transparent)]
    Transport(#[from] courier_channels::Error),
}
