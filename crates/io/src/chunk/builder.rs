//! Assembling a writable chunk tag tree from sections (spec §4.7).

use std::collections::HashMap;

use fastnbt::Value;

use anvil_core::bitpack::Discipline;
use anvil_core::{AnvilError, Block, SectionBuilder};

use crate::error::{Error, Result};
use crate::tag;

/// Data-version stamped on every chunk this crate writes: an early-1.15
/// value vanilla Minecraft accepts and upgrades on load (§4.7, §1 Non-goals
/// — this crate never writes a post-height-extension chunk).
pub const DEFAULT_DATA_VERSION: i32 = 1976;

/// Aggregates up to 16 sections (section-Y `0..=15`) into a save-ready
/// chunk. Sections are created lazily on first write.
pub struct ChunkBuilder {
    cx: i32,
    cz: i32,
    data_version: i32,
    sections: Box<[Option<SectionBuilder>; 16]>,
}

impl ChunkBuilder {
    pub fn new(cx: i32, cz: i32) -> Self {
        Self {
            cx,
            cz,
            data_version: DEFAULT_DATA_VERSION,
            sections: Box::new(std::array::from_fn(|_| None)),
        }
    }

    pub fn x(&self) -> i32 {
        self.cx
    }

    pub fn z(&self) -> i32 {
        self.cz
    }

    pub fn data_version(&self) -> i32 {
        self.data_version
    }

    /// Override the `DataVersion` stamped into the saved chunk. The section
    /// tree this builder emits always follows the pre-2836 on-section
    /// `Palette`/`BlockStates` layout regardless of this value, but the
    /// bit-pack discipline used to encode `BlockStates` tracks it (§4.1:
    /// "writers always produce the form dictated by the target
    /// data-version") — setting a data-version `>= 2529` switches saved
    /// sections to padded packing.
    pub fn set_data_version(&mut self, data_version: i32) -> &mut Self {
        self.data_version = data_version;
        self
    }

    /// Set the block at absolute chunk-local `(x, y, z)`, `y` in `0..=255`.
    /// Creates the backing section on demand.
    pub fn set_block(&mut self, x: u8, y: u16, z: u8, block: Block) -> Result<()> {
        if y > 255 {
            return Err(AnvilError::out_of_bounds("y", y as i64, 0, 255).into());
        }
        let section_y = (y / 16) as usize;
        let local_y = (y % 16) as u8;
        self.sections[section_y]
            .get_or_insert_with(|| SectionBuilder::new(section_y as i8))
            .set(x, local_y, z, block)
            .map_err(Error::from)
    }

    pub fn get_block(&self, x: u8, y: u16, z: u8) -> Result<Option<&Block>> {
        if y > 255 {
            return Err(AnvilError::out_of_bounds("y", y as i64, 0, 255).into());
        }
        let section_y = (y / 16) as usize;
        let local_y = (y % 16) as u8;
        match &self.sections[section_y] {
            Some(section) => section.get(x, local_y, z).map_err(Error::from),
            None => Ok(None),
        }
    }

    /// Build the saved chunk tag tree: a `Level`-wrapped compound with
    /// empty entity/liquid-tick lists and a `Sections` list carrying every
    /// non-air section.
    ///
    /// A chunk with zero non-air sections omits the `Sections` key entirely
    /// rather than writing an empty list: the reader treats "key present"
    /// as "at least one section exists" (an empty list there is a corrupt
    /// read, not an empty chunk), so a never-touched or all-air chunk must
    /// come back as "key absent" for `highest_y`/`lowest_y` to agree with
    /// `get_chunk` succeeding on it (§8 concrete scenario 1).
    pub fn to_value(&self) -> Value {
        let discipline = Discipline::for_data_version(Some(self.data_version));
        let sections: Vec<Value> = self
            .sections
            .iter()
            .filter_map(|maybe| maybe.as_ref())
            .filter(|section| !section.is_empty())
            .map(|section| section_to_value(section, discipline))
            .collect();

        let mut level = HashMap::new();
        level.insert("Entities".to_owned(), Value::List(Vec::new()));
        level.insert("TileEntities".to_owned(), Value::List(Vec::new()));
        level.insert("LiquidTicks".to_owned(), Value::List(Vec::new()));
        level.insert("xPos".to_owned(), Value::Int(self.cx));
        level.insert("zPos".to_owned(), Value::Int(self.cz));
        level.insert("LastUpdate".to_owned(), Value::Long(0));
        level.insert("InhabitedTime".to_owned(), Value::Long(0));
        level.insert("isLightOn".to_owned(), Value::Byte(1));
        level.insert("Status".to_owned(), Value::String("full".to_owned()));
        if !sections.is_empty() {
            level.insert("Sections".to_owned(), Value::List(sections));
        }

        let mut root = HashMap::new();
        root.insert("DataVersion".to_owned(), Value::Int(self.data_version));
        root.insert("Level".to_owned(), Value::Compound(level));
        Value::Compound(root)
    }
}

fn section_to_value(section: &SectionBuilder, discipline: Discipline) -> Value {
    let mut compound = HashMap::new();
    compound.insert("Y".to_owned(), Value::Byte(section.y()));

    // `is_empty` was already checked by the caller, and `palette()` always
    // force-includes air, so a non-empty section's palette has at least two
    // entries and `pack()` never returns `None` here.
    let (palette, words) = section.pack(discipline).expect("non-empty section always packs");
    compound.insert(
        "Palette".to_owned(),
        Value::List(palette.iter().map(palette_entry_value).collect()),
    );
    compound.insert("BlockStates".to_owned(), tag::long_array_value(&words));
    Value::Compound(compound)
}

fn palette_entry_value(block: &Block) -> Value {
    let mut entry = HashMap::new();
    entry.insert("Name".to_owned(), Value::String(block.full_name()));
    if !block.properties().is_empty() {
        let mut props = HashMap::new();
        for (k, v) in block.properties() {
            props.insert(k.clone(), Value::String(v.as_canonical_string()));
        }
        entry.insert("Properties".to_owned(), Value::Compound(props));
    }
    Value::Compound(entry)
}
