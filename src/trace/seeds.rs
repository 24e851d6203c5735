//! Seed discovery: label-mask scanning and interactive seed feeds

use crate::volume::{Point, ScalarVolume};

/// Label value marking a seed voxel; all other values are ignored.
pub const SEED_LABEL: f64 = 1.0;

/// Collect every label-1 cell of a label volume, in scan order.
///
/// The scan order is fixed (x outer, then y, then z) so a given label volume
/// always yields the same seed sequence, and therefore the same merged
/// traversal ranks under the claim-once variant.
pub fn label_seed_cells(labels: &ScalarVolume) -> Vec<[usize; 3]> {
    let lattice = labels.lattice();
    let mut seeds = Vec::new();
    for x in 0..lattice.nx {
        for y in 0..lattice.ny {
            for z in 0..lattice.nz {
                if labels.get(x, y, z) == SEED_LABEL {
                    seeds.push([x, y, z]);
                }
            }
        }
    }
    seeds
}

/// Source of interactive seed updates, one per tracing round
///
/// The caller (typically a renderer translating pointer clicks into lattice
/// space) owns the latest-seed state and hands it to each round explicitly;
/// the engine holds no seed state of its own. Returning `None` is the
/// "no update occurred" signal that ends the interactive loop.
pub trait SeedFeed {
    fn next_seed(&mut self) -> Option<Point>;
}

/// A seed feed that replays a fixed sequence, for tests and offline runs
#[derive(Debug, Clone)]
pub struct ReplaySeeds {
    seeds: std::collections::VecDeque<Point>,
}

impl ReplaySeeds {
    pub fn new(seeds: impl IntoIterator<Item = Point>) -> Self {
        ReplaySeeds {
            seeds: seeds.into_iter().collect(),
        }
    }
}

impl SeedFeed for ReplaySeeds {
    fn next_seed(&mut self) -> Option<Point> {
        self.seeds.pop_front()
    }
}
