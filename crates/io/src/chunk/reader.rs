//! Version-dispatching chunk reader (spec §4.4).
//!
//! A `Chunk` wraps an owned, already-decompressed tag tree (see
//! `region::reader` for why it's owned rather than borrowed: decompression
//! always produces a fresh buffer, so there is no cycle to resolve, just a
//! tree this type owns outright and never mutates).

use fastnbt::Value;

use anvil_core::bitpack::{self, Discipline};
use anvil_core::{AnvilError, Block, LegacyBlockTable, OldBlock};

use crate::error::{Error, Result};
use crate::tag;

/// Data-version thresholds from the component table (§4.4), canonical names
/// retained for traceability back to the spec. `poi-folder` (1937) and
/// `height-revert` (2709) are informational-only in the spec's own table —
/// point-of-interest data lives outside the chunk tree, and the revert
/// didn't change how `yPos` is located — so this reader has no branch keyed
/// on either.
const FLATTENING: i32 = 1451;
const HEIGHT_EXTENSION: i32 = 2694;
const BLOCK_STATES_RENAME: i32 = 2836;
const LEVEL_ELISION: i32 = 2844;

/// A block as decoded off a chunk's tag tree: either the modern namespaced
/// form, or — for chunks predating the flattening (data-version < 1451) —
/// the raw numeric form, left unconverted unless the caller asks for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedBlock {
    Modern(Block),
    Legacy(OldBlock),
}

impl DecodedBlock {
    /// Force conversion to a modern `Block`, converting a `Legacy` value
    /// through `table` (falling back to `minecraft:air` per
    /// `OldBlock::convert`'s documented behavior). `Modern` values pass
    /// through unchanged.
    pub fn into_block(self, table: Option<&dyn LegacyBlockTable>) -> Block {
        match self {
            DecodedBlock::Modern(b) => b,
            DecodedBlock::Legacy(o) => o.convert(table),
        }
    }
}

pub struct Chunk {
    x: i32,
    z: i32,
    data_version: Option<i32>,
    root: Value,
}

fn nibble(bytes: &[u8], index: usize) -> u8 {
    let value = bytes[index / 2];
    if index % 2 == 1 {
        value >> 4
    } else {
        value & 0x0F
    }
}

impl Chunk {
    /// Wrap an already-parsed tag tree as a chunk at `(cx, cz)`.
    pub fn from_value(cx: i32, cz: i32, root: Value) -> Result<Self> {
        let data_version = tag::get(&root, "DataVersion")
            .and_then(tag::as_i64)
            .map(|v| v as i32);
        Ok(Self {
            x: cx,
            z: cz,
            data_version,
            root,
        })
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn z(&self) -> i32 {
        self.z
    }

    pub fn data_version(&self) -> Option<i32> {
        self.data_version
    }

    fn at_least(&self, threshold: i32) -> bool {
        self.data_version.is_some_and(|v| v >= threshold)
    }

    fn discipline(&self) -> Discipline {
        Discipline::for_data_version(self.data_version)
    }

    /// The compound holding chunk-level fields: the root itself once the
    /// `Level` wrapper is gone (≥2844), or `root["Level"]` before that.
    fn level(&self) -> &Value {
        if self.at_least(LEVEL_ELISION) {
            &self.root
        } else {
            tag::get(&self.root, "Level").unwrap_or(&self.root)
        }
    }

    fn sections_key(&self) -> &'static str {
        if self.at_least(LEVEL_ELISION) {
            "sections"
        } else {
            "Sections"
        }
    }

    /// The sections tag itself, distinguishing "absent" (no key at all, a
    /// chunk with no sections ever written) from "present" (a list, whether
    /// empty or not — an empty list is still a malformed read per §4.4).
    fn sections_tag(&self) -> Option<&Value> {
        tag::get(self.level(), self.sections_key())
    }

    fn sections(&self) -> Option<&[Value]> {
        self.sections_tag().and_then(tag::as_list)
    }

    fn section_y(section: &Value) -> Option<i8> {
        tag::get(section, "Y").and_then(tag::as_i8)
    }

    /// Lowest section-Y, from `yPos` where the schema carries one
    /// (data-version ≥ 2694), else the first entry of the sections list.
    ///
    /// A chunk with no sections tag at all (never touched, or built with
    /// zero non-air sections) has no lowest section; `0` is returned so that,
    /// paired with `highest_y`'s `-1` in the same case, `highest_y <=
    /// lowest_y` holds without raising `EmptyRegion` for a chunk that was
    /// never short of data — only present-but-empty is a corrupt read.
    pub fn lowest_y(&self) -> Result<i32> {
        if self.at_least(HEIGHT_EXTENSION) {
            if let Some(y) = tag::get(self.level(), "yPos").and_then(tag::as_i64) {
                return Ok(y as i32);
            }
        }
        let Some(_) = self.sections_tag() else { return Ok(0) };
        let sections = self.sections().ok_or(AnvilError::EmptyRegion)?;
        let first = sections.first().ok_or(AnvilError::EmptyRegion)?;
        Self::section_y(first)
            .map(i32::from)
            .ok_or_else(|| Error::corrupted("section missing Y tag".to_owned(), Vec::new()))
    }

    /// Highest section-Y, from the last entry of the sections list. See
    /// `lowest_y` for the no-sections-tag case.
    pub fn highest_y(&self) -> Result<i32> {
        let Some(_) = self.sections_tag() else { return Ok(-1) };
        let sections = self.sections().ok_or(AnvilError::EmptyRegion)?;
        let last = sections.last().ok_or(AnvilError::EmptyRegion)?;
        Self::section_y(last)
            .map(i32::from)
            .ok_or_else(|| Error::corrupted("section missing Y tag".to_owned(), Vec::new()))
    }

    /// The section at section-Y `y`, or `None` for a hole in an otherwise
    /// contiguous range. `y` outside `[lowest_y, highest_y]` is `OutOfBounds`.
    pub fn get_section(&self, y: i32) -> Result<Option<&Value>> {
        let lowest = self.lowest_y()?;
        let highest = self.highest_y()?;
        if y < lowest || y > highest {
            return Err(AnvilError::out_of_bounds("section_y", y as i64, lowest as i64, highest as i64).into());
        }
        let sections = self.sections().unwrap_or(&[]);
        Ok(sections.iter().find(|s| Self::section_y(s) == Some(y as i8)))
    }

    /// Whether `data-version ≥ 2836`: the version where `BlockStates`/
    /// `Palette` move under a `block_states` subcompound as `data`/`palette`.
    fn uses_block_states_subcompound(&self) -> bool {
        self.at_least(BLOCK_STATES_RENAME)
    }

    fn palette_parent<'s>(&self, section: &'s Value) -> Option<&'s Value> {
        if self.uses_block_states_subcompound() {
            tag::get(section, "block_states")
        } else {
            Some(section)
        }
    }

    fn palette_key(&self) -> &'static str {
        if self.uses_block_states_subcompound() {
            "palette"
        } else {
            "Palette"
        }
    }

    fn data_key(&self) -> &'static str {
        if self.uses_block_states_subcompound() {
            "data"
        } else {
            "BlockStates"
        }
    }

    fn block_from_palette_entry(entry: &Value) -> Result<Block> {
        let name = tag::get(entry, "Name")
            .and_then(tag::as_str)
            .ok_or_else(|| Error::corrupted("palette entry missing Name".to_owned(), Vec::new()))?;
        let mut block = Block::from_namespaced_name(name);
        if let Some(props) = tag::get(entry, "Properties").and_then(tag::as_compound) {
            for (k, v) in props {
                if let Some(s) = tag::as_str(v) {
                    block = block.with_property(k.clone(), s);
                }
            }
        }
        Ok(block)
    }

    /// The palette for a given section's tag compound (as returned by
    /// `get_section`), in on-disk order.
    pub fn get_palette(&self, section: &Value) -> Result<Vec<Block>> {
        let Some(parent) = self.palette_parent(section) else {
            return Ok(Vec::new());
        };
        let entries = tag::get(parent, self.palette_key()).and_then(tag::as_list).unwrap_or(&[]);
        entries.iter().map(Self::block_from_palette_entry).collect()
    }

    /// Convenience wrapper: the palette at section-Y `y`, or `[minecraft:air]`
    /// for a missing section (a caller inspecting a chunk rarely wants to
    /// special-case "no section here" separately from "an all-air section").
    pub fn palette(&self, y: i32) -> Result<Vec<Block>> {
        match self.get_section(y)? {
            Some(section) => self.get_palette(section),
            None => Ok(vec![Block::air()]),
        }
    }

    fn get_old_block(section: Option<&Value>, x: u8, y: u8, z: u8) -> OldBlock {
        let Some(section) = section else {
            return OldBlock::new(0, 0);
        };
        let Some(blocks) = tag::get(section, "Blocks").and_then(tag::as_byte_array) else {
            return OldBlock::new(0, 0);
        };
        let index = anvil_core::section::index(x, y, z);
        let mut id = blocks[index] as u16;
        if let Some(add) = tag::get(section, "Add").and_then(tag::as_byte_array) {
            id += (nibble(&add, index) as u16) << 8;
        }
        let data = tag::get(section, "Data")
            .and_then(tag::as_byte_array)
            .map(|d| nibble(&d, index))
            .unwrap_or(0);
        OldBlock::new(id, data)
    }

    fn get_modern_block(&self, section: Option<&Value>, x: u8, y: u8, z: u8) -> Result<Block> {
        let Some(section) = section else {
            return Ok(Block::air());
        };
        let Some(parent) = self.palette_parent(section) else {
            return Ok(Block::air());
        };
        // An absent packed-index container means the section is all air,
        // regardless of what the palette otherwise contains.
        let Some(words) = tag::get(parent, self.data_key()).and_then(tag::as_long_array) else {
            return Ok(Block::air());
        };
        let palette = self.get_palette(section)?;
        if palette.is_empty() {
            return Ok(Block::air());
        }
        let bits = bitpack::bits_for_palette_len(palette.len());
        let index = anvil_core::section::index(x, y, z);
        let palette_index = bitpack::unpack_one(&words, bits, index, self.discipline())
            .ok_or_else(|| Error::corrupted("packed block array too short for section".to_owned(), Vec::new()))?
            as usize;
        Ok(palette.get(palette_index).cloned().unwrap_or_else(Block::air))
    }

    /// The block at absolute chunk-local `(x, y, z)` — `x`/`z` in `0..=15`,
    /// `y` within the chunk's section extent.
    pub fn get_block(&self, x: u8, y: i32, z: u8) -> Result<DecodedBlock> {
        if x > 15 {
            return Err(AnvilError::out_of_bounds("x", x as i64, 0, 15).into());
        }
        if z > 15 {
            return Err(AnvilError::out_of_bounds("z", z as i64, 0, 15).into());
        }
        let lowest = self.lowest_y()?;
        let highest = self.highest_y()?;
        let (min_y, max_y) = (lowest * 16, highest * 16 + 15);
        if y < min_y || y > max_y {
            return Err(AnvilError::out_of_bounds("y", y as i64, min_y as i64, max_y as i64).into());
        }

        let section_y = y.div_euclid(16);
        let local_y = y.rem_euclid(16) as u8;
        let section = self.get_section(section_y)?;

        if self.data_version.is_none_or(|v| v < FLATTENING) {
            Ok(DecodedBlock::Legacy(Self::get_old_block(section, x, local_y, z)))
        } else {
            self.get_modern_block(section, x, local_y, z).map(DecodedBlock::Modern)
        }
    }

    /// A single-pass walk of all 4096 blocks of section-Y `y`, in Y,Z,X
    /// order — the same decode path `get_block` uses, carrying a sliding
    /// bit window rather than recomputing a bit offset per block. Each item
    /// is itself a `Result`: a packed array too short for the section is the
    /// same `CorruptedData` `get_block` would raise for that position, and
    /// ends the walk early rather than substituting a wrong block.
    pub fn stream_blocks(&self, y: i32) -> Result<BlockStream> {
        let section = self.get_section(y)?;

        if self.data_version.is_none_or(|v| v < FLATTENING) {
            let (blocks, add, data) = match section {
                Some(section) => (
                    tag::get(section, "Blocks").and_then(tag::as_byte_array),
                    tag::get(section, "Add").and_then(tag::as_byte_array),
                    tag::get(section, "Data").and_then(tag::as_byte_array),
                ),
                None => (None, None, None),
            };
            return Ok(BlockStream::Legacy { blocks, add, data, index: 0 });
        }

        let Some(section) = section else {
            return Ok(BlockStream::Modern {
                palette: vec![Block::air()],
                words: Vec::new(),
                bits: 4,
                discipline: self.discipline(),
                index: 0,
            });
        };
        let palette = self.get_palette(section)?;
        let words = self
            .palette_parent(section)
            .and_then(|parent| tag::get(parent, self.data_key()))
            .and_then(tag::as_long_array)
            .unwrap_or_default();
        let bits = bitpack::bits_for_palette_len(palette.len().max(1));
        let palette = if palette.is_empty() { vec![Block::air()] } else { palette };

        Ok(BlockStream::Modern {
            palette,
            words,
            bits,
            discipline: self.discipline(),
            index: 0,
        })
    }

    /// The block-entity compound at absolute `(x, y, z)`, if any.
    pub fn get_block_entity(&self, x: i32, y: i32, z: i32) -> Result<Option<&Value>> {
        let key = if self.at_least(LEVEL_ELISION) { "block_entities" } else { "TileEntities" };
        let Some(list) = tag::get(self.level(), key).and_then(tag::as_list) else {
            return Ok(None);
        };
        for entity in list {
            let ex = tag::get(entity, "x").and_then(tag::as_i64);
            let ey = tag::get(entity, "y").and_then(tag::as_i64);
            let ez = tag::get(entity, "z").and_then(tag::as_i64);
            if ex == Some(x as i64) && ey == Some(y as i64) && ez == Some(z as i64) {
                return Ok(Some(entity));
            }
        }
        Ok(None)
    }
}

/// Iterator yielding every block in a section in Y,Z,X order, or a
/// `CorruptedData` error (and nothing further) the first time the packed
/// index array runs out before the 4096 indices a section needs. Owns its
/// backing byte/word arrays (copied out of the chunk's tag tree once) so it
/// isn't tied to the tree's lifetime.
pub enum BlockStream {
    Legacy {
        blocks: Option<Vec<u8>>,
        add: Option<Vec<u8>>,
        data: Option<Vec<u8>>,
        index: usize,
    },
    Modern {
        palette: Vec<Block>,
        words: Vec<u64>,
        bits: u32,
        discipline: Discipline,
        index: usize,
    },
}

impl Iterator for BlockStream {
    type Item = Result<DecodedBlock>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            BlockStream::Legacy { blocks, add, data, index } => {
                if *index >= 4096 {
                    return None;
                }
                let block = match blocks {
                    None => OldBlock::new(0, 0),
                    Some(blocks) => {
                        let mut id = blocks[*index] as u16;
                        if let Some(add) = add {
                            id += (nibble(add, *index) as u16) << 8;
                        }
                        let data_nibble = data.as_ref().map(|d| nibble(d, *index)).unwrap_or(0);
                        OldBlock::new(id, data_nibble)
                    }
                };
                *index += 1;
                Some(Ok(DecodedBlock::Legacy(block)))
            }
            BlockStream::Modern { palette, words, bits, discipline, index } => {
                if *index >= 4096 {
                    return None;
                }
                if words.is_empty() {
                    *index += 1;
                    return Some(Ok(DecodedBlock::Modern(Block::air())));
                }
                // A short packed array is the same condition `get_modern_block`
                // treats as corruption (reader.rs `get_modern_block`) — stream
                // and single-block lookup must agree, so this stops the walk
                // rather than silently substituting palette index 0.
                let Some(palette_index) = bitpack::unpack_one(words, *bits, *index, *discipline) else {
                    *index = 4096;
                    return Some(Err(Error::corrupted(
                        "packed block array too short for section".to_owned(),
                        Vec::new(),
                    )));
                };
                let block = palette.get(palette_index as usize).cloned().unwrap_or_else(Block::air);
                *index += 1;
                Some(Ok(DecodedBlock::Modern(block)))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = match self {
            BlockStream::Legacy { index, .. } | BlockStream::Modern { index, .. } => 4096 - *index,
        };
        (remaining, Some(remaining))
    }
}
