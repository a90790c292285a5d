//! Block identifiers: the modern namespaced form (`Block`) and the
//! pre-flattening numeric form (`OldBlock`), plus the external seam used to
//! convert between them.

use std::collections::BTreeMap;
use std::fmt;

/// A property value attached to a `Block`.
///
/// Properties are canonically strings on the wire (`Properties` is always a
/// compound of `TAG_String` in vanilla chunk data), but booleans and integers
/// are common enough to deserve their own variants so callers building a
/// `Block` by hand don't have to pre-render `"true"` / `"4"` themselves.
/// Anything else read off the tag tree (the "opaque tag" case in the data
/// model) is kept as its already-rendered string form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl PropertyValue {
    /// The canonical string form written into `Properties` on save.
    pub fn as_canonical_string(&self) -> String {
        match self {
            PropertyValue::Bool(b) => if *b { "true" } else { "false" }.to_owned(),
            PropertyValue::Int(i) => i.to_string(),
            PropertyValue::Str(s) => s.clone(),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Int(i)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Str(s.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Str(s)
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_canonical_string())
    }
}

/// An ordered property map. `BTreeMap` gives us a stable iteration order for
/// `Display` and for building a deterministic palette, without requiring
/// callers to sort anything themselves.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A modern (post-flattening) block: a namespaced identifier plus an
/// unordered (here: ordered-for-determinism) property map.
///
/// Two blocks are equal iff namespace, id, and property map are equal;
/// `#[derive(Hash)]` follows the same fields, so `Block` can be used as a
/// palette key directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Block {
    namespace: String,
    id: String,
    properties: Properties,
}

impl Block {
    /// Build a block from an explicit namespace, id, and property map.
    pub fn new(namespace: impl Into<String>, id: impl Into<String>, properties: Properties) -> Self {
        Self {
            namespace: namespace.into(),
            id: id.into(),
            properties,
        }
    }

    /// Build a block with the default `minecraft` namespace and no properties.
    pub fn from_name(id: impl Into<String>) -> Self {
        Self::from_namespaced_name(id.into())
    }

    /// Build a block from a possibly-namespaced name (`"stone"` or
    /// `"minecraft:stone"`), defaulting the namespace to `minecraft`.
    pub fn from_namespaced_name(name: impl AsRef<str>) -> Self {
        let name = name.as_ref();
        match name.split_once(':') {
            Some((namespace, id)) => Self::new(namespace, id, Properties::new()),
            None => Self::new("minecraft", name, Properties::new()),
        }
    }

    pub fn air() -> Self {
        Self::from_name("air")
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// The full `namespace:id` name, as it appears in a palette's `Name` tag.
    pub fn full_name(&self) -> String {
        format!("{}:{}", self.namespace, self.id)
    }

    pub fn is_air(&self) -> bool {
        self.namespace == "minecraft" && self.id == "air"
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::air()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.id)?;
        if !self.properties.is_empty() {
            f.write_str("[")?;
            let mut first = true;
            for (k, v) in &self.properties {
                if !first {
                    f.write_str(",")?;
                }
                first = false;
                write!(f, "{k}={v}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

/// A pre-flattening (data-version < 1451) block: a 12-bit numeric id plus a
/// 4-bit data value, exactly as `Blocks`/`Data` store it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OldBlock {
    id: u16,
    data: u8,
}

impl OldBlock {
    /// `id` is masked to 12 bits, `data` to 4 bits, matching the storage
    /// width (`Blocks` + the optional `Add` nibble give 12 bits total;
    /// `Data` gives a 4-bit nibble).
    pub fn new(id: u16, data: u8) -> Self {
        Self {
            id: id & 0x0FFF,
            data: data & 0x0F,
        }
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn data(&self) -> u8 {
        self.data
    }

    /// Convert to a modern `Block` via an external lookup table. Unknown ids
    /// (including "no table supplied") resolve to `minecraft:air`, per the
    /// data model's documented fallback.
    pub fn convert(&self, table: Option<&dyn LegacyBlockTable>) -> Block {
        table
            .and_then(|t| t.lookup(self.id, self.data))
            .unwrap_or_else(Block::air)
    }
}

/// The seam for a legacy-numeric-id to modern-namespaced-id conversion
/// table. The table itself (a data asset covering every pre-flattening
/// block) is out of this crate's scope; callers supply their own
/// implementation, typically backed by a static lookup generated from the
/// Minecraft wiki's pre-flattening block id list.
pub trait LegacyBlockTable {
    fn lookup(&self, id: u16, data: u8) -> Option<Block>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_equality_ignores_constructor_path() {
        let a = Block::from_name("minecraft:stone");
        let b = Block::from_name("stone");
        assert_eq!(a, b);
    }

    #[test]
    fn block_display_sorts_properties() {
        let b = Block::new("minecraft", "oak_stairs", Properties::new())
            .with_property("facing", "north")
            .with_property("waterlogged", false);
        assert_eq!(b.to_string(), "minecraft:oak_stairs[facing=north,waterlogged=false]");
    }

    #[test]
    fn old_block_masks_width() {
        let b = OldBlock::new(0x1FFF, 0xFF);
        assert_eq!(b.id(), 0x0FFF);
        assert_eq!(b.data(), 0x0F);
    }

    #[test]
    fn old_block_convert_without_table_is_air() {
        let b = OldBlock::new(1, 5);
        assert_eq!(b.convert(None), Block::air());
    }

    struct StoneOnly;
    impl LegacyBlockTable for StoneOnly {
        fn lookup(&self, id: u16, _data: u8) -> Option<Block> {
            (id == 1).then(|| Block::from_name("minecraft:stone"))
        }
    }

    #[test]
    fn old_block_convert_with_table() {
        let b = OldBlock::new(1, 5);
        assert_eq!(b.convert(Some(&StoneOnly)), Block::from_name("minecraft:stone"));
        let unknown = OldBlock::new(999, 0);
        assert_eq!(unknown.convert(Some(&StoneOnly)), Block::air());
    }
}
