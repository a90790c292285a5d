mod builder;
mod reader;

pub use builder::RegionBuilder;
pub use reader::{Region, HEADER_SIZE, SECTOR_SIZE};
