//! End-to-end tracing scenarios over synthetic and file-backed volumes

mod common;

use common::{assert_all_in_bounds, label_mask, TestVolumes};
use tract_core::eigenvector_io;
use tract_core::nifti_io;
use tract_core::trace::{
    CancelToken, ReplaySeeds, SeedingPolicy, StopReason, TraceConfig, Tracer,
};
use tract_core::track::PALETTE;
use tract_core::volume::{Lattice, ScalarVolume, VolumeField};

#[test]
fn golden_free_trace_on_axis_field() {
    // 4x4x4 lattice, uniform confidence 0.9, every cell pointing (1,0,0),
    // seed (1,2,2), alpha 0.5, step 1. First expansion records the seed and
    // admits (2,2,2) then (0,2,2); growth is combinatorial and only 4
    // distinct x values ever appear.
    let volumes = TestVolumes::uniform((4, 4, 4), 0.9, [1.0, 0.0, 0.0]);
    let field = VolumeField::new(&volumes.confidence, &volumes.directions).unwrap();
    let config = TraceConfig {
        alpha: 0.5,
        step_size: 1.0,
        max_steps: 8,
    };

    let outcome = Tracer::new(field, config)
        .trace(SeedingPolicy::SingleSeed {
            seed: [1.0, 2.0, 2.0],
        })
        .unwrap();

    assert_eq!(outcome.stop, StopReason::StepCeiling);
    let points = &outcome.tracks[0].points;
    assert_eq!(
        points,
        &vec![
            [1.0, 2.0, 2.0],
            [2.0, 2.0, 2.0],
            [0.0, 2.0, 2.0],
            [3.0, 2.0, 2.0],
            [1.0, 2.0, 2.0],
            [1.0, 2.0, 2.0],
            [2.0, 2.0, 2.0],
            [2.0, 2.0, 2.0],
        ]
    );

    let mut xs: Vec<i64> = points.iter().map(|p| p[0] as i64).collect();
    xs.sort_unstable();
    xs.dedup();
    assert_eq!(xs, vec![0, 1, 2, 3]);
    assert_all_in_bounds(points, volumes.lattice);
}

#[test]
fn free_runs_are_deterministic() {
    let mut volumes = TestVolumes::uniform((6, 6, 6), 0.8, [0.8, 0.5, 0.0]);
    volumes.block_cell(4, 4, 3);
    let field = VolumeField::new(&volumes.confidence, &volumes.directions).unwrap();
    let config = TraceConfig {
        alpha: 0.3,
        step_size: 1.5,
        max_steps: 2000,
    };

    let trace = || {
        Tracer::new(field, config)
            .trace(SeedingPolicy::SingleSeed {
                seed: [2.0, 2.0, 3.0],
            })
            .unwrap()
            .tracks
            .remove(0)
            .points
    };
    assert_eq!(trace(), trace());
}

#[test]
fn admission_threshold_holds_for_every_recorded_point() {
    // Seed confidence is above threshold here, so every recorded point
    // (seed included) must satisfy the admission predicate.
    let mut volumes = TestVolumes::uniform((8, 8, 8), 0.9, [1.0, 0.0, 0.0]);
    volumes.block_cell(5, 4, 4);
    volumes.block_cell(2, 4, 4);
    let field = VolumeField::new(&volumes.confidence, &volumes.directions).unwrap();
    let config = TraceConfig {
        alpha: 0.5,
        step_size: 1.0,
        max_steps: 500,
    };

    let outcome = Tracer::new(field, config)
        .trace(SeedingPolicy::SingleSeed {
            seed: [4.0, 4.0, 4.0],
        })
        .unwrap();

    for p in &outcome.tracks[0].points {
        let value = field.sample_scalar(*p).unwrap();
        assert!(
            value >= config.alpha,
            "recorded point {:?} has confidence {} below threshold",
            p,
            value
        );
    }
}

#[test]
fn label_mask_scan_order_and_merged_ranks() {
    let volumes = TestVolumes::uniform((4, 4, 4), 0.9, [1.0, 0.0, 0.0]);
    let field = VolumeField::new(&volumes.confidence, &volumes.directions).unwrap();
    let labels = label_mask(volumes.lattice, &[[1, 0, 0], [0, 0, 0]]);

    // scan order is x-major regardless of insertion order
    let seeds = tract_core::trace::label_seed_cells(&labels);
    assert_eq!(seeds, vec![[0, 0, 0], [1, 0, 0]]);

    let outcome = Tracer::new(field, TraceConfig::claimed_labeled())
        .trace(SeedingPolicy::LabelMaskSeeds { labels: &labels })
        .unwrap();

    let visited = outcome.visited.expect("label-mask run carries ranks");
    assert_eq!(visited.rank([0, 0, 0]), 1);
    assert_eq!(visited.rank([1, 0, 0]), 1);
    // (0,0,0) expands first but both its candidates are claimed or out of
    // bounds; (1,0,0) then claims (2,0,0), which claims (3,0,0)
    assert_eq!(visited.rank([2, 0, 0]), 2);
    assert_eq!(visited.rank([3, 0, 0]), 3);
    assert_eq!(outcome.stop, StopReason::FrontierExhausted);
}

#[test]
fn claimed_ranks_are_monotonic_and_final() {
    let volumes = TestVolumes::uniform((8, 1, 1), 0.9, [1.0, 0.0, 0.0]);
    let field = VolumeField::new(&volumes.confidence, &volumes.directions).unwrap();
    let labels = label_mask(volumes.lattice, &[[4, 0, 0]]);

    let outcome = Tracer::new(field, TraceConfig::claimed_labeled())
        .trace(SeedingPolicy::LabelMaskSeeds { labels: &labels })
        .unwrap();
    let visited = outcome.visited.unwrap();

    // every claimed cell has a distinct rank in 1..=counter
    let mut ranks: Vec<u32> = (0..8).map(|x| visited.rank([x, 0, 0])).collect();
    ranks.retain(|&r| r != 0);
    let mut sorted = ranks.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), ranks.len(), "ranks must be unique");
    assert_eq!(*sorted.last().unwrap(), visited.counter());
}

#[test]
fn interactive_replay_palette_and_stop() {
    let volumes = TestVolumes::uniform((5, 5, 5), 0.9, [0.0, 1.0, 0.0]);
    let field = VolumeField::new(&volumes.confidence, &volumes.directions).unwrap();
    let config = TraceConfig {
        alpha: 0.5,
        step_size: 1.0,
        max_steps: 10,
    };

    let mut feed = ReplaySeeds::new([
        [2.0, 2.0, 2.0],
        [1.0, 1.0, 1.0],
        [20.0, 0.0, 0.0], // out of bounds: empty round
    ]);
    let outcome = Tracer::new(field, config)
        .trace(SeedingPolicy::InteractiveSeed { feed: &mut feed })
        .unwrap();

    assert_eq!(outcome.tracks.len(), 3);
    assert_eq!(outcome.tracks[0].color, PALETTE[0]);
    assert_eq!(outcome.tracks[1].color, PALETTE[1]);
    assert_eq!(outcome.tracks[2].color, PALETTE[2]);
    assert!(outcome.tracks[2].points.is_empty());
    assert_eq!(outcome.stop, StopReason::FrontierExhausted);
}

#[test]
fn cancellation_aborts_combinatorial_growth() {
    let volumes = TestVolumes::uniform((16, 16, 16), 0.9, [1.0, 0.0, 0.0]);
    let field = VolumeField::new(&volumes.confidence, &volumes.directions).unwrap();
    let config = TraceConfig {
        alpha: 0.5,
        step_size: 1.0,
        max_steps: 200_000,
    };

    let cancel = CancelToken::new();
    cancel.cancel();
    let outcome = Tracer::new(field, config)
        .with_cancel(cancel)
        .trace(SeedingPolicy::SingleSeed {
            seed: [8.0, 8.0, 8.0],
        })
        .unwrap();
    assert_eq!(outcome.stop, StopReason::Cancelled);
    assert!(outcome.tracks[0].points.is_empty());
}

#[test]
fn file_backed_end_to_end() {
    // Write both input volumes to disk, load them through the file loaders,
    // trace, and save the rank volume as NIfTI.
    let lattice = Lattice::new(4, 4, 4);
    let volumes = TestVolumes::uniform((4, 4, 4), 0.9, [1.0, 0.0, 0.0]);

    let tmp = std::env::temp_dir();
    let fa_path = tmp.join("tract_e2e_fa.nii.gz");
    let vec_path = tmp.join("tract_e2e_vectors.bin");
    let out_path = tmp.join("tract_e2e_ranks.nii.gz");

    let affine = nifti_io::scaled_identity_affine((1.0, 1.0, 1.0));
    nifti_io::save_nifti_to_file(
        &fa_path,
        volumes.confidence.data(),
        lattice.dims(),
        (1.0, 1.0, 1.0),
        &affine,
    )
    .unwrap();
    eigenvector_io::write_eigenvector_file(&vec_path, &volumes.directions).unwrap();

    let confidence = nifti_io::read_scalar_volume(&fa_path, lattice).unwrap();
    let directions = eigenvector_io::read_eigenvector_file(&vec_path, lattice).unwrap();
    let field = VolumeField::new(&confidence, &directions).unwrap();

    let outcome = Tracer::new(field, TraceConfig::claimed_labeled())
        .trace_single_seed_claimed([1, 2, 2])
        .unwrap();
    let visited = outcome.visited.unwrap();
    assert_eq!(visited.counter(), 4);

    nifti_io::save_nifti_to_file(
        &out_path,
        &visited.to_rank_data(),
        lattice.dims(),
        (1.0, 1.0, 1.0),
        &affine,
    )
    .unwrap();

    let ranks = nifti_io::read_scalar_volume(&out_path, lattice).unwrap();
    assert_eq!(ranks.get(1, 2, 2), 1.0);
    assert_eq!(ranks.get(2, 2, 2), 2.0);
    assert_eq!(ranks.get(0, 2, 2), 3.0);
    assert_eq!(ranks.get(3, 2, 2), 4.0);
    assert_eq!(ranks.get(1, 1, 1), 0.0);

    std::fs::remove_file(&fa_path).ok();
    std::fs::remove_file(&vec_path).ok();
    std::fs::remove_file(&out_path).ok();
}

#[test]
fn mismatched_volumes_fail_before_tracing() {
    let confidence = ScalarVolume::fill(Lattice::new(4, 4, 4), 0.9);
    let small = TestVolumes::uniform((3, 3, 3), 0.9, [1.0, 0.0, 0.0]);
    assert!(VolumeField::new(&confidence, &small.directions).is_err());
}
