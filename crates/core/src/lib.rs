//! Dependency-light core of the Anvil (`.mca`) codec: the block model, the
//! palette bit-packing codec, and the in-memory section builder.
//!
//! This crate does no I/O and knows nothing about NBT or `.mca` file
//! layout — that's [`anvil_io`], which depends on this crate. Keeping the
//! split means the hard bit-level arithmetic here (`bitpack`) can be
//! exhaustively unit-tested without touching a byte of file format framing.

pub mod bitpack;
pub mod block;
pub mod error;
pub mod section;

pub use block::{Block, LegacyBlockTable, OldBlock, PropertyValue};
pub use error::{AnvilError, Result};
pub use section::{RawSection, SectionBuilder};
