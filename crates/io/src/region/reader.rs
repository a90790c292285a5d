//! Parsing a `.mca` region file: header, sector lookup, per-chunk
//! decompression framing (spec §4.3, §6).

use std::io::Read;
use std::path::Path;

use anvil_core::AnvilError;
use flate2::read::ZlibDecoder;

use crate::chunk::Chunk;
use crate::error::{Error, Result};

/// Bytes in one allocation unit of a region file.
pub const SECTOR_SIZE: usize = 4096;
/// Two sectors' worth of header: 1024 directory entries, then 1024 timestamps.
pub const HEADER_SIZE: usize = 2 * SECTOR_SIZE;

/// A parsed `.mca` file: the raw byte buffer plus the directory/sector
/// lookups over it. Read-only — chunk bytes are decompressed into a fresh,
/// owned buffer on every `chunk_bytes`/`get_chunk` call, so there is no
/// shared-reference cycle between `Region` and the chunks it produces (see
/// the data model's note on this).
pub struct Region {
    data: Vec<u8>,
}

/// Chunk slot index within the 32x32 grid, `(cx mod 32) + 32 * (cz mod 32)`.
fn slot(cx: i32, cz: i32) -> usize {
    (cx.rem_euclid(32) + 32 * cz.rem_euclid(32)) as usize
}

impl Region {
    /// Parse an in-memory `.mca` buffer. Fails with `EmptyRegion` if `data`
    /// is empty.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if data.is_empty() {
            return Err(AnvilError::EmptyRegion.into());
        }
        Ok(Self { data })
    }

    /// Read and parse a `.mca` file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Read and parse a `.mca` file from any readable byte source.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Raw `(sector_offset, sector_count)` directory entry for `(cx, cz)`.
    /// `(0, 0)` means the chunk has not been generated.
    fn directory_entry(&self, cx: i32, cz: i32) -> (u32, u8) {
        let off = slot(cx, cz) * 4;
        let entry = &self.data[off..off + 4];
        let sector_offset = u32::from_be_bytes([0, entry[0], entry[1], entry[2]]);
        (sector_offset, entry[3])
    }

    pub fn has_chunk(&self, cx: i32, cz: i32) -> bool {
        self.directory_entry(cx, cz) != (0, 0)
    }

    /// Decompressed, parsed-NBT-ready bytes for chunk `(cx, cz)`.
    ///
    /// Validates the payload's self-reported `length` against the sector
    /// range before trusting it, so a corrupted directory entry fails
    /// loudly (`CorruptedData`) instead of panicking on an out-of-bounds
    /// slice.
    pub fn chunk_bytes(&self, cx: i32, cz: i32) -> Result<Vec<u8>> {
        let (sector_offset, sector_count) = self.directory_entry(cx, cz);
        if sector_offset == 0 && sector_count == 0 {
            tracing::debug!(cx, cz, "chunk not generated");
            return Err(AnvilError::ChunkNotFound { x: cx, z: cz }.into());
        }

        let start = sector_offset as usize * SECTOR_SIZE;
        let capacity = sector_count as usize * SECTOR_SIZE;
        if start + 5 > self.data.len() {
            tracing::warn!(cx, cz, sector_offset, "chunk sector offset lies outside the file");
            return Err(Error::corrupted(
                "chunk sector offset lies outside the file".to_owned(),
                Vec::new(),
            ));
        }

        let length = u32::from_be_bytes(self.data[start..start + 4].try_into().unwrap()) as usize;
        let compression = self.data[start + 4];

        if length == 0 || length + 5 > capacity || start + 5 + (length - 1) > self.data.len() {
            tracing::warn!(cx, cz, length, sector_count, "chunk payload length does not fit its sectors");
            return Err(Error::corrupted(
                format!("payload length {length} does not fit its {sector_count} allocated sector(s)"),
                Vec::new(),
            ));
        }

        let payload = &self.data[start + 5..start + 5 + length - 1];

        match compression {
            1 => {
                tracing::warn!(cx, cz, "chunk is gzip-compressed, which is unsupported");
                Err(AnvilError::GZipChunkData.into())
            }
            2 => {
                let mut decoder = ZlibDecoder::new(payload);
                let mut out = Vec::new();
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| Error::corrupted(e.to_string(), payload.to_vec()))?;
                Ok(out)
            }
            3 => Ok(payload.to_vec()),
            other => {
                tracing::warn!(cx, cz, compression = other, "unknown compression scheme byte");
                Err(Error::corrupted(
                    format!("unknown compression scheme byte {other}"),
                    payload.to_vec(),
                ))
            }
        }
    }

    /// Decompress and parse chunk `(cx, cz)` into a [`Chunk`].
    pub fn get_chunk(&self, cx: i32, cz: i32) -> Result<Chunk> {
        let bytes = self.chunk_bytes(cx, cz)?;
        let value = crate::tag::parse(&bytes)
            .map_err(|_| Error::corrupted("malformed NBT tag tree".to_owned(), bytes.clone()))?;
        Chunk::from_value(cx, cz, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::builder::RegionBuilder;
    use anvil_core::Block;

    #[test]
    fn zero_byte_region_is_empty_region_error() {
        let err = Region::from_bytes(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::Core(AnvilError::EmptyRegion)));
    }

    #[test]
    fn absent_chunk_is_chunk_not_found() {
        let bytes = RegionBuilder::new().save().unwrap();
        let region = Region::from_bytes(bytes).unwrap();
        assert!(!region.has_chunk(0, 0));
        let err = region.get_chunk(0, 0).unwrap_err();
        assert!(matches!(err, Error::Core(AnvilError::ChunkNotFound { x: 0, z: 0 })));
    }

    #[test]
    fn gzip_compression_byte_is_rejected() {
        // Build a minimal region by hand: one chunk at slot 0, sector 2,
        // 1 sector, compression byte = 1 (gzip).
        let mut bytes = vec![0u8; HEADER_SIZE + SECTOR_SIZE];
        bytes[0..4].copy_from_slice(&[0, 0, 2, 1]); // offset=2 (24-bit BE), 1 sector
        let payload_start = 2 * SECTOR_SIZE;
        bytes[payload_start..payload_start + 4].copy_from_slice(&5u32.to_be_bytes());
        bytes[payload_start + 4] = 1; // gzip

        let region = Region::from_bytes(bytes).unwrap();
        let err = region.chunk_bytes(0, 0).unwrap_err();
        assert!(matches!(err, Error::Core(AnvilError::GZipChunkData)));
    }

    #[test]
    fn corrupt_zlib_payload_is_corrupted_data() {
        let mut builder = RegionBuilder::new();
        builder
            .chunk_mut(0, 0)
            .set_block(0, 0, 0, Block::from_name("minecraft:stone"))
            .unwrap();
        let mut bytes = builder.save().unwrap();

        // Flip a byte inside chunk (0,0)'s zlib payload to invalidate it.
        let entry = &bytes[0..4];
        let sector_offset = u32::from_be_bytes([0, entry[0], entry[1], entry[2]]) as usize;
        let payload_start = sector_offset * SECTOR_SIZE + 5;
        bytes[payload_start] ^= 0xFF;
        bytes[payload_start + 1] ^= 0xFF;

        let region = Region::from_bytes(bytes).unwrap();
        let err = region.chunk_bytes(0, 0).unwrap_err();
        assert!(matches!(err, Error::Core(AnvilError::CorruptedData { .. })));
    }
}
