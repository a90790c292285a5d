//! Reads and writes Minecraft's Anvil (`.mca`) region files.
//!
//! This crate owns everything [`anvil_core`] deliberately doesn't: the tag
//! tree (via `fastnbt`), sector/compression framing (via `flate2`), the
//! version-dispatching chunk reader, and the chunk/region builders. See
//! [`region::Region`] for the read path and [`region::RegionBuilder`] for
//! the write path.

pub mod chunk;
pub mod error;
pub mod region;
mod tag;

pub use anvil_core::{Block, LegacyBlockTable, OldBlock, PropertyValue};
pub use chunk::{BlockStream, Chunk, ChunkBuilder, DecodedBlock};
pub use error::{Error, Result};
pub use region::{Region, RegionBuilder};
