//! Visit-rank bookkeeping for the claim-once tracing variants
//!
//! Maps every lattice cell to a small integer rank: 0 means unclaimed, any
//! other value records when the cell was claimed. A rank, once set, is never
//! overwritten, and the counter that produces ranks also serves as the step
//! budget shared across all seeds of one run.

use crate::volume::Lattice;

/// Per-cell monotonic visit ranks over one lattice
#[derive(Debug, Clone)]
pub struct VisitedIndex {
    lattice: Lattice,
    ranks: Vec<u32>,
    counter: u32,
}

impl VisitedIndex {
    /// All cells unclaimed; the rank counter starts at 1 so that seeds claimed
    /// before the first expansion share rank 1.
    pub fn new(lattice: Lattice) -> Self {
        VisitedIndex {
            lattice,
            ranks: vec![0; lattice.len()],
            counter: 1,
        }
    }

    pub fn lattice(&self) -> Lattice {
        self.lattice
    }

    /// Current value of the shared counter (also the step count of the run)
    pub fn counter(&self) -> u32 {
        self.counter
    }

    fn idx(&self, cell: [usize; 3]) -> usize {
        cell[0] + cell[1] * self.lattice.nx + cell[2] * self.lattice.nx * self.lattice.ny
    }

    /// Rank of a cell, 0 if unclaimed
    pub fn rank(&self, cell: [usize; 3]) -> u32 {
        self.ranks[self.idx(cell)]
    }

    pub fn is_claimed(&self, cell: [usize; 3]) -> bool {
        self.rank(cell) != 0
    }

    /// Claim a seed cell at the counter's current value without advancing it.
    ///
    /// Every seed of a run gets the same rank (1 for a fresh index).
    pub fn claim_seed(&mut self, cell: [usize; 3]) {
        let i = self.idx(cell);
        debug_assert_eq!(self.ranks[i], 0, "seed cell already claimed");
        self.ranks[i] = self.counter;
    }

    /// Advance the counter and claim a cell at the new value.
    ///
    /// Callers must check `is_claimed` first; ranks never decrease or change.
    pub fn claim_next(&mut self, cell: [usize; 3]) -> u32 {
        let i = self.idx(cell);
        debug_assert_eq!(self.ranks[i], 0, "cell already claimed");
        self.counter += 1;
        self.ranks[i] = self.counter;
        self.counter
    }

    /// Ranks as a Fortran-ordered f64 buffer, suitable for the NIfTI writer
    pub fn to_rank_data(&self) -> Vec<f64> {
        self.ranks.iter().map(|&r| r as f64).collect()
    }
}
