use thiserror::Error;

/// `anvil-io`'s error type: every [`anvil_core::AnvilError`] variant, plus
/// the I/O and NBT-parsing failures that only arise once bytes are involved.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] anvil_core::AnvilError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("NBT decode error: {0}")]
    Nbt(#[from] fastnbt::error::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn corrupted(message: impl Into<String>, bytes: Vec<u8>) -> Self {
        anvil_core::AnvilError::CorruptedData {
            message: message.into(),
            bytes,
        }
        .into()
    }
}
