//! Common test utilities for tract-core integration tests

use tract_core::volume::{Lattice, ScalarVolume, VectorVolume};

/// Synthetic volume pair sharing one lattice
pub struct TestVolumes {
    pub lattice: Lattice,
    pub confidence: ScalarVolume,
    pub directions: VectorVolume,
}

impl TestVolumes {
    /// Uniform confidence with every cell pointing the same way
    pub fn uniform(dims: (usize, usize, usize), confidence: f64, direction: [f32; 3]) -> Self {
        let lattice = Lattice::new(dims.0, dims.1, dims.2);
        TestVolumes {
            lattice,
            confidence: ScalarVolume::fill(lattice, confidence),
            directions: VectorVolume::fill(lattice, direction),
        }
    }

    /// Drop the confidence of a single cell below any sensible threshold
    pub fn block_cell(&mut self, x: usize, y: usize, z: usize) {
        self.confidence.set(x, y, z, 0.0);
    }
}

/// Label volume with the given cells marked as seeds (label 1)
pub fn label_mask(lattice: Lattice, seed_cells: &[[usize; 3]]) -> ScalarVolume {
    let mut labels = ScalarVolume::fill(lattice, 0.0);
    for &[x, y, z] in seed_cells {
        labels.set(x, y, z, 1.0);
    }
    labels
}

/// Assert that every recorded point lies inside the lattice
pub fn assert_all_in_bounds(points: &[[f64; 3]], lattice: Lattice) {
    for p in points {
        assert!(
            lattice.contains(*p),
            "recorded point {:?} outside lattice {:?}",
            p,
            lattice.dims()
        );
    }
}
