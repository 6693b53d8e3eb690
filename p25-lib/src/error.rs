#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A bit was appended to a message that already holds its declared number of bits.
    ///
    /// This indicates a frame length table or configuration defect, never a transmission
    /// error.
    #[error("message buffer full at {capacity} bits")]
    BufferFull { capacity: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
