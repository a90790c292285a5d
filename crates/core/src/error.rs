use thiserror::Error;

/// The closed set of failure modes this crate and `anvil-io` can surface.
///
/// There is no retry path anywhere in this codebase: a region or chunk is
/// either well-formed or it isn't, and every variant here is reported to the
/// caller rather than recovered from internally.
#[derive(Debug, Error)]
pub enum AnvilError {
    #[error("{axis} coordinate {value} is out of bounds ({min}..={max})")]
    OutOfBounds {
        axis: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("chunk ({x}, {z}) has not been generated")]
    ChunkNotFound { x: i32, z: i32 },

    #[error("region file is empty")]
    EmptyRegion,

    #[error("chunk data is gzip-compressed, which is not supported")]
    GZipChunkData,

    #[error("expected a file path or a readable byte source")]
    InvalidFileType,

    #[error("chunk data is corrupted: {message}")]
    CorruptedData { message: String, bytes: Vec<u8> },

    #[error("section at y={0} already exists")]
    SectionAlreadyExists(i8),
}

pub type Result<T> = std::result::Result<T, AnvilError>;

impl AnvilError {
    pub fn out_of_bounds(axis: &'static str, value: i64, min: i64, max: i64) -> Self {
        Self::OutOfBounds {
            axis,
            value,
            min,
            max,
        }
    }
}
