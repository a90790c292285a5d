//! Emitting a `.mca` region file from a grid of chunk builders (spec §4.8).

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::chunk::ChunkBuilder;
use crate::error::Result;
use crate::region::reader::{HEADER_SIZE, SECTOR_SIZE};

/// Chunk slot index within the 32x32 grid, `(cx mod 32) + 32 * (cz mod 32)`.
fn slot(cx: i32, cz: i32) -> usize {
    (cx.rem_euclid(32) + 32 * cz.rem_euclid(32)) as usize
}

fn zlib_compress(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

/// A 32x32 grid of chunk builders, addressed by chunk coordinates. Saving
/// serializes every present chunk, compresses it, and lays the result out
/// as a fresh `.mca` byte buffer — sectors 0 and 1 are always the header,
/// compressed chunk payloads start at sector 2 in grid order.
pub struct RegionBuilder {
    chunks: Vec<Option<ChunkBuilder>>,
}

impl Default for RegionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionBuilder {
    pub fn new() -> Self {
        Self {
            chunks: (0..1024).map(|_| None).collect(),
        }
    }

    /// The chunk builder at `(cx, cz)`, creating an empty one on first use.
    pub fn chunk_mut(&mut self, cx: i32, cz: i32) -> &mut ChunkBuilder {
        let idx = slot(cx, cz);
        self.chunks[idx].get_or_insert_with(|| ChunkBuilder::new(cx, cz))
    }

    pub fn has_chunk(&self, cx: i32, cz: i32) -> bool {
        self.chunks[slot(cx, cz)].is_some()
    }

    /// Serialize every present chunk through the tag-tree adapter,
    /// zlib-compress it, and emit a complete `.mca` byte buffer with a
    /// greedily sector-packed directory. Timestamps are left zeroed.
    pub fn save(&self) -> Result<Vec<u8>> {
        let mut directory = vec![0u8; SECTOR_SIZE];
        let timestamps = vec![0u8; SECTOR_SIZE];
        let mut sectors = Vec::new();
        let mut next_sector: u32 = 2;
        let present = self.chunks.iter().filter(|c| c.is_some()).count();
        tracing::info!(chunks = present, "saving region");

        for (idx, maybe) in self.chunks.iter().enumerate() {
            let Some(chunk) = maybe else { continue };

            let value = chunk.to_value();
            let nbt_bytes = crate::tag::to_bytes(&value)?;
            let compressed = zlib_compress(&nbt_bytes)?;

            let length = (compressed.len() + 1) as u32;
            let mut payload = Vec::with_capacity(5 + compressed.len());
            payload.extend_from_slice(&length.to_be_bytes());
            payload.push(2); // zlib, per §4.3 step 5
            payload.extend_from_slice(&compressed);

            let sector_count = payload.len().div_ceil(SECTOR_SIZE);
            payload.resize(sector_count * SECTOR_SIZE, 0);

            let offset_bytes = next_sector.to_be_bytes();
            let entry_off = idx * 4;
            directory[entry_off] = offset_bytes[1];
            directory[entry_off + 1] = offset_bytes[2];
            directory[entry_off + 2] = offset_bytes[3];
            directory[entry_off + 3] = sector_count as u8;

            sectors.extend_from_slice(&payload);
            next_sector += sector_count as u32;
        }

        let mut out = Vec::with_capacity(HEADER_SIZE + sectors.len());
        out.extend_from_slice(&directory);
        out.extend_from_slice(&timestamps);
        out.extend_from_slice(&sectors);
        tracing::info!(bytes = out.len(), sectors = next_sector - 2, "region saved");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::reader::Region;
    use anvil_core::Block;

    #[test]
    fn empty_builder_round_trips_through_bytes() {
        let builder = RegionBuilder::new();
        let bytes = builder.save().unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE);
        let region = Region::from_bytes(bytes).unwrap();
        assert!(!region.has_chunk(0, 0));
    }

    #[test]
    fn single_block_round_trips() {
        let mut builder = RegionBuilder::new();
        builder
            .chunk_mut(0, 0)
            .set_block(3, 64, 5, Block::from_name("minecraft:stone"))
            .unwrap();
        let bytes = builder.save().unwrap();

        let region = Region::from_bytes(bytes).unwrap();
        let chunk = region.get_chunk(0, 0).unwrap();
        assert_eq!(chunk.get_block(3, 64, 5).unwrap().full_name(), "minecraft:stone");
        assert_eq!(chunk.get_block(0, 64, 0).unwrap().full_name(), "minecraft:air");
    }

    #[test]
    fn sectors_do_not_overlap_across_two_chunks() {
        let mut builder = RegionBuilder::new();
        builder.chunk_mut(0, 0).set_block(0, 0, 0, Block::from_name("minecraft:stone")).unwrap();
        builder.chunk_mut(1, 0).set_block(0, 0, 0, Block::from_name("minecraft:dirt")).unwrap();
        let bytes = builder.save().unwrap();

        let region = Region::from_bytes(bytes).unwrap();
        let a = region.get_chunk(0, 0).unwrap();
        let b = region.get_chunk(1, 0).unwrap();
        assert_eq!(a.get_block(0, 0, 0).unwrap().full_name(), "minecraft:stone");
        assert_eq!(b.get_block(0, 0, 0).unwrap().full_name(), "minecraft:dirt");
    }
}
