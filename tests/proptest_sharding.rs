use facerecords::ir::{BBoxXYXY, Coord, Landmarks, Record};
use facerecords::shard::{ShardPlan, ShardWriter};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn plan_sizes_sum_to_total_and_respect_capacity(
        total in 0usize..5000,
        num_shards in 1usize..300,
    ) {
        let plan = ShardPlan::new(total, num_shards).expect("valid plan");
        let sizes = plan.shard_sizes();
        let capacity = total.div_ceil(num_shards);

        prop_assert_eq!(plan.capacity, capacity);
        prop_assert_eq!(sizes.iter().sum::<usize>(), total);
        prop_assert!(sizes.len() <= num_shards);
        prop_assert!(sizes.iter().all(|&s| s <= capacity && s > 0));
        if let Some((_, before_last)) = sizes.split_last() {
            prop_assert!(before_last.iter().all(|&s| s == capacity));
        }
    }

    #[test]
    fn shard_for_is_monotonic_and_matches_sizes(
        total in 1usize..2000,
        num_shards in 1usize..50,
    ) {
        let plan = ShardPlan::new(total, num_shards).expect("valid plan");
        let mut counts = vec![0usize; plan.shard_count()];
        let mut last = 0;
        for position in 0..total {
            let shard = plan.shard_for(position).expect("position in range");
            prop_assert!(shard >= last);
            last = shard;
            counts[shard] += 1;
        }
        prop_assert_eq!(counts, plan.shard_sizes());
    }
}

fn tagged_record(tag: u32) -> Record {
    Record {
        image_bytes: tag.to_le_bytes().to_vec(),
        face_box: BBoxXYXY::from_xyxy(0.25, 0.25, 0.75, 0.75),
        landmarks: Landmarks::new([Coord::new(0.5, 0.5); 5]),
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 16, ..proptest_config() })]

    #[test]
    fn writer_preserves_arrival_order_across_shards(
        total in 1u32..60,
        num_shards in 1usize..8,
    ) {
        let temp = tempfile::tempdir().expect("create temp dir");
        let plan = ShardPlan::new(total as usize, num_shards).expect("valid plan");
        let mut writer = ShardWriter::new(temp.path(), plan);
        for tag in 0..total {
            writer.write(&tagged_record(tag)).expect("write");
        }
        let summaries = writer.finish().expect("finish");

        let mut seen = Vec::new();
        for summary in &summaries {
            let path = temp.path().join(&summary.file_name);
            for record in facerecords::inspect::read_shard_records(&path).expect("read") {
                let tag = u32::from_le_bytes(record.image_bytes[..4].try_into().expect("4 bytes"));
                seen.push(tag);
            }
        }
        prop_assert_eq!(seen, (0..total).collect::<Vec<_>>());
    }
}
