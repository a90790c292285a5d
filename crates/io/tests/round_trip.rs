//! End-to-end coverage of the builder -> bytes -> reader path, matching the
//! concrete scenarios and quantified invariants from the shared test plan
//! (an empty region, a single placed block, and sector non-overlap across
//! multiple chunks and regions).

use anvil_core::Block;
use anvil_io::{Region, RegionBuilder};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn empty_region_round_trips() {
    init_tracing();
    let builder = RegionBuilder::new();
    let bytes = builder.save().expect("save");

    let region = Region::from_bytes(bytes).expect("parse");
    assert!(!region.has_chunk(0, 0));
}

#[test]
fn empty_chunk_round_trips_with_degenerate_height_range() {
    let mut builder = RegionBuilder::new();
    builder.chunk_mut(0, 0);

    let bytes = builder.save().expect("save");
    let region = Region::from_bytes(bytes).expect("parse");
    let chunk = region.get_chunk(0, 0).expect("get_chunk");

    let lowest = chunk.lowest_y().expect("lowest_y");
    let highest = chunk.highest_y().expect("highest_y");
    assert!(highest <= lowest, "empty chunk has a degenerate (empty) height range");
}

#[test]
fn single_chunk_single_block_round_trips() {
    let mut builder = RegionBuilder::new();
    builder
        .chunk_mut(0, 0)
        .set_block(3, 64, 5, Block::from_name("minecraft:stone"))
        .expect("set_block");

    let bytes = builder.save().expect("save");
    let region = Region::from_bytes(bytes).expect("parse");
    let chunk = region.get_chunk(0, 0).expect("get_chunk");

    assert_eq!(chunk.data_version(), Some(anvil_io::ChunkBuilder::new(0, 0).data_version()));
    assert_eq!(
        chunk.get_block(3, 64, 5).unwrap().into_block(None).full_name(),
        "minecraft:stone"
    );
    assert_eq!(chunk.get_block(0, 64, 0).unwrap().into_block(None).full_name(), "minecraft:air");

    let highest = chunk.highest_y().unwrap();
    let lowest = chunk.lowest_y().unwrap();
    assert!(highest >= lowest);
}

#[test]
fn many_chunks_in_one_region_do_not_corrupt_each_other() {
    let mut builder = RegionBuilder::new();
    for cx in 0..5 {
        for cz in 0..5 {
            builder
                .chunk_mut(cx, cz)
                .set_block(0, 0, 0, Block::new("minecraft", format!("block_{cx}_{cz}"), Default::default()))
                .unwrap();
        }
    }
    let bytes = builder.save().unwrap();
    let region = Region::from_bytes(bytes).unwrap();

    for cx in 0..5 {
        for cz in 0..5 {
            let chunk = region.get_chunk(cx, cz).unwrap();
            let block = chunk.get_block(0, 0, 0).unwrap().into_block(None);
            assert_eq!(block.full_name(), format!("minecraft:block_{cx}_{cz}"));
        }
    }
}

#[test]
fn get_block_agrees_with_stream_blocks_on_a_saved_chunk() {
    let mut builder = RegionBuilder::new();
    let chunk_builder = builder.chunk_mut(0, 0);
    for i in 0..30u8 {
        chunk_builder
            .set_block(i % 16, (i * 7) as u16 % 256, (i * 3) % 16, Block::new("minecraft", format!("b{i}"), Default::default()))
            .unwrap();
    }
    let bytes = builder.save().unwrap();
    let region = Region::from_bytes(bytes).unwrap();
    let chunk = region.get_chunk(0, 0).unwrap();

    let lowest = chunk.lowest_y().unwrap();
    let highest = chunk.highest_y().unwrap();
    for section_y in lowest..=highest {
        let Ok(streamed) = chunk.stream_blocks(section_y) else { continue };
        let streamed: Vec<_> = streamed.collect::<Result<Vec<_>, _>>().expect("section is well-formed");
        for (i, expected) in streamed.iter().enumerate() {
            let y = i / 256;
            let z = (i / 16) % 16;
            let x = i % 16;
            let global_y = section_y * 16 + y as i32;
            let direct = chunk.get_block(x as u8, global_y, z as u8).unwrap();
            assert_eq!(&direct, expected);
        }
    }
}

#[test]
fn out_of_bounds_coordinate_is_rejected() {
    let mut builder = RegionBuilder::new();
    let err = builder.chunk_mut(0, 0).set_block(0, 0, 16, Block::air()).unwrap_err();
    assert!(err.to_string().contains("out of bounds"));
}
