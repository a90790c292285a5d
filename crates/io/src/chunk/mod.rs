mod builder;
mod reader;

pub use builder::{ChunkBuilder, DEFAULT_DATA_VERSION};
pub use reader::{BlockStream, Chunk, DecodedBlock};
