//! In-memory 16x16x16 block grid used by the write path (C6).
//!
//! A `SectionBuilder` is a dense array of optional blocks — `None` is the
//! canonical representation of air, mirroring the teacher's dense
//! `ChunkSection` array but over `Option<Block>` instead of a flat numeric
//! id, since the modern palette format needs full `Block` values to build
//! its palette.

use crate::bitpack::{self, Discipline};
use crate::block::Block;
use crate::error::{AnvilError, Result};

/// Number of blocks along each axis of a section.
pub const SECTION_SIZE: usize = 16;
/// Total block count in one section (16^3).
pub const SECTION_VOLUME: usize = SECTION_SIZE * SECTION_SIZE * SECTION_SIZE;

#[inline]
fn check_bound(axis: &'static str, value: u8) -> Result<()> {
    if value > 15 {
        Err(AnvilError::out_of_bounds(axis, value as i64, 0, 15))
    } else {
        Ok(())
    }
}

/// Y-major, then Z, then X: `index = y*256 + z*16 + x`, per the data model.
#[inline]
pub const fn index(x: u8, y: u8, z: u8) -> usize {
    (y as usize) * SECTION_SIZE * SECTION_SIZE + (z as usize) * SECTION_SIZE + (x as usize)
}

/// A section under construction: section-Y plus a dense 4096-entry block
/// grid. `None` is air.
#[derive(Clone)]
pub struct SectionBuilder {
    y: i8,
    blocks: Box<[Option<Block>; SECTION_VOLUME]>,
}

impl SectionBuilder {
    pub fn new(y: i8) -> Self {
        Self {
            y,
            blocks: Box::new(std::array::from_fn(|_| None)),
        }
    }

    pub fn y(&self) -> i8 {
        self.y
    }

    pub fn get(&self, x: u8, y: u8, z: u8) -> Result<Option<&Block>> {
        check_bound("x", x)?;
        check_bound("y", y)?;
        check_bound("z", z)?;
        Ok(self.blocks[index(x, y, z)].as_ref())
    }

    pub fn set(&mut self, x: u8, y: u8, z: u8, block: Block) -> Result<()> {
        check_bound("x", x)?;
        check_bound("y", y)?;
        check_bound("z", z)?;
        self.blocks[index(x, y, z)] = if block.is_air() { None } else { Some(block) };
        Ok(())
    }

    /// True if every cell is air (`None`) — this section can be elided from
    /// the saved chunk entirely.
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(Option::is_none)
    }

    /// The set of distinct blocks in this section, in first-seen order, with
    /// air guaranteed to be present (explicitly, or as index 0 if the
    /// section is otherwise non-air but never explicitly stores air).
    pub fn palette(&self) -> Vec<Block> {
        let mut palette = vec![Block::air()];
        for maybe in self.blocks.iter() {
            let block = maybe.as_ref().cloned().unwrap_or_else(Block::air);
            if !palette.contains(&block) {
                palette.push(block);
            }
        }
        palette
    }

    /// Encode this section's blocks as a packed 64-bit word array at
    /// `bits = max(4, ceil_log2(palette_len))`, under whichever `discipline`
    /// the caller's target data-version dictates (§4.1: "writers always
    /// produce the form dictated by the target data-version").
    ///
    /// Returns `None` when the palette is just `{air}` — such a section
    /// carries no `data` array at all (an absent array means "all air").
    pub fn pack(&self, discipline: Discipline) -> Option<(Vec<Block>, Vec<u64>)> {
        let palette = self.palette();
        if palette.len() <= 1 {
            return None;
        }

        let bits = bitpack::bits_for_palette_len(palette.len());
        let indices: Vec<u32> = self
            .blocks
            .iter()
            .map(|maybe| {
                let block = maybe.as_ref().cloned().unwrap_or_else(Block::air);
                palette.iter().position(|b| *b == block).unwrap() as u32
            })
            .collect();

        let words = bitpack::pack(&indices, bits, discipline);
        Some((palette, words))
    }
}

/// A section built from an externally supplied palette and an already
/// palette-indexed block stream (e.g. re-saving a section read from a
/// region file without re-deriving its palette). Only the final pack step
/// is performed; `palette`/indices are taken as given.
pub struct RawSection {
    pub y: i8,
    pub palette: Vec<Block>,
    pub indices: Vec<u32>,
}

impl RawSection {
    pub fn new(y: i8, palette: Vec<Block>, indices: Vec<u32>) -> Self {
        Self { y, palette, indices }
    }

    /// Pack `indices` against `palette` exactly as `SectionBuilder::pack`
    /// would, without re-deriving the palette from a dense grid.
    pub fn pack(&self, discipline: Discipline) -> Option<Vec<u64>> {
        if self.palette.len() <= 1 {
            return None;
        }
        let bits = bitpack::bits_for_palette_len(self.palette.len());
        Some(bitpack::pack(&self.indices, bits, discipline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_section_has_only_air_palette() {
        let s = SectionBuilder::new(0);
        assert!(s.is_empty());
        assert_eq!(s.palette(), vec![Block::air()]);
        assert!(s.pack(Discipline::Padded).is_none());
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut s = SectionBuilder::new(4);
        s.set(3, 0, 5, Block::from_name("minecraft:stone")).unwrap();
        assert_eq!(s.get(3, 0, 5).unwrap(), Some(&Block::from_name("minecraft:stone")));
        assert_eq!(s.get(0, 0, 0).unwrap(), None);
        assert!(!s.is_empty());
    }

    #[test]
    fn out_of_bounds_axis_errors() {
        let mut s = SectionBuilder::new(0);
        let err = s.set(16, 0, 0, Block::air()).unwrap_err();
        assert!(matches!(err, AnvilError::OutOfBounds { axis: "x", .. }));
    }

    #[test]
    fn pack_bits_match_palette_len() {
        let mut s = SectionBuilder::new(0);
        for i in 0..20u8 {
            s.set(i % 16, i / 16, 0, Block::new("minecraft", format!("b{i}"), Default::default()))
                .unwrap();
        }
        let (palette, words) = s.pack(Discipline::Padded).unwrap();
        let bits = bitpack::bits_for_palette_len(palette.len());
        assert!(bits >= 4);
        let decoded = bitpack::unpack(&words, bits, SECTION_VOLUME, Discipline::Padded);
        assert!(decoded.iter().all(|&i| (i as usize) < palette.len()));
    }

    #[test]
    fn raw_section_packs_given_palette_and_indices_without_rederiving() {
        let palette = vec![Block::air(), Block::from_name("minecraft:stone"), Block::from_name("minecraft:dirt")];
        let indices: Vec<u32> = (0..SECTION_VOLUME as u32).map(|i| i % 3).collect();
        let raw = RawSection::new(7, palette.clone(), indices.clone());

        let words = raw.pack(Discipline::Padded).unwrap();
        let bits = bitpack::bits_for_palette_len(palette.len());
        let decoded = bitpack::unpack(&words, bits, indices.len(), Discipline::Padded);
        assert_eq!(decoded, indices);
        assert_eq!(raw.y, 7);
        assert_eq!(raw.palette, palette);
    }

    #[test]
    fn raw_section_with_single_entry_palette_packs_nothing() {
        let raw = RawSection::new(0, vec![Block::air()], vec![0; SECTION_VOLUME]);
        assert!(raw.pack(Discipline::Padded).is_none());
    }

    #[test]
    fn pack_honors_requested_discipline() {
        let mut s = SectionBuilder::new(0);
        for i in 0..20u8 {
            s.set(i % 16, i / 16, 0, Block::new("minecraft", format!("b{i}"), Default::default()))
                .unwrap();
        }
        let (palette, stretched) = s.pack(Discipline::Stretched).unwrap();
        let (_, padded) = s.pack(Discipline::Padded).unwrap();
        assert_ne!(stretched, padded, "21-entry palette needs 5 bits, where disciplines diverge");

        let bits = bitpack::bits_for_palette_len(palette.len());
        let decoded = bitpack::unpack(&stretched, bits, SECTION_VOLUME, Discipline::Stretched);
        assert!(decoded.iter().all(|&i| (i as usize) < palette.len()));
    }
}
