//! Lattice geometry and read-only volume accessors
//!
//! All volumes in a session share one fixed 3-D integer lattice. The scalar
//! confidence volume uses Fortran (column-major) ordering to match NIfTI
//! convention: index = x + y*nx + z*nx*ny. The vector volume uses the row-major
//! `(x, y, z, component)` layout of the flat eigenvector dump:
//! index = (x*ny*nz + y*nz + z)*3 + c.

use crate::error::{Result, TractError};

/// A point in lattice coordinates. Not necessarily integer while in flight;
/// sampling truncates to the containing cell.
pub type Point = [f64; 3];

/// Fixed 3-D grid extent shared by all volumes in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lattice {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl Lattice {
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Lattice { nx, ny, nz }
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Extent as a tuple, for diagnostics
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }

    /// True iff every coordinate is >= 0 and strictly less than its extent.
    ///
    /// This predicate is the sole gate against out-of-range sampling; it must
    /// run before every sample call. NaN coordinates compare false and are
    /// therefore out of bounds.
    pub fn contains(&self, p: Point) -> bool {
        p[0] >= 0.0
            && p[0] < self.nx as f64
            && p[1] >= 0.0
            && p[1] < self.ny as f64
            && p[2] >= 0.0
            && p[2] < self.nz as f64
    }
}

/// Per-cell floating-point confidence values over a lattice
///
/// Read-only to the tracer. Values are compared directly against the
/// admission threshold; no NaN or negative-confidence semantics are defined.
#[derive(Debug, Clone)]
pub struct ScalarVolume {
    lattice: Lattice,
    data: Vec<f64>,
}

impl ScalarVolume {
    /// Wrap a Fortran-ordered buffer. The buffer length must match the lattice.
    pub fn new(lattice: Lattice, data: Vec<f64>) -> Result<Self> {
        if data.len() != lattice.len() {
            return Err(TractError::VolumeMismatch {
                what: "scalar volume buffer",
                expected: lattice.dims(),
                found: (data.len(), 1, 1),
            });
        }
        Ok(ScalarVolume { lattice, data })
    }

    /// Uniform volume, mostly useful in tests and fixtures
    pub fn fill(lattice: Lattice, value: f64) -> Self {
        let data = vec![value; lattice.len()];
        ScalarVolume { lattice, data }
    }

    pub fn lattice(&self) -> Lattice {
        self.lattice
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Value at an integer cell. Callers must keep the cell in bounds.
    pub fn get(&self, x: usize, y: usize, z: usize) -> f64 {
        self.data[x + y * self.lattice.nx + z * self.lattice.nx * self.lattice.ny]
    }

    /// Set a cell value; used by fixture builders, not by the tracer.
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: f64) {
        self.data[x + y * self.lattice.nx + z * self.lattice.nx * self.lattice.ny] = value;
    }
}

/// Per-cell principal directions over a lattice
///
/// Stored as f32 triples, the native precision of the flat eigenvector dump;
/// sampling widens to f64.
#[derive(Debug, Clone)]
pub struct VectorVolume {
    lattice: Lattice,
    data: Vec<f32>,
}

impl VectorVolume {
    /// Wrap a `(x, y, z, component)` row-major buffer of `nx*ny*nz*3` floats.
    pub fn new(lattice: Lattice, data: Vec<f32>) -> Result<Self> {
        if data.len() != lattice.len() * 3 {
            return Err(TractError::VolumeMismatch {
                what: "vector volume buffer",
                expected: lattice.dims(),
                found: (data.len(), 3, 1),
            });
        }
        Ok(VectorVolume { lattice, data })
    }

    /// Uniform direction field, mostly useful in tests and fixtures
    pub fn fill(lattice: Lattice, direction: [f32; 3]) -> Self {
        let mut data = Vec::with_capacity(lattice.len() * 3);
        for _ in 0..lattice.len() {
            data.extend_from_slice(&direction);
        }
        VectorVolume { lattice, data }
    }

    pub fn lattice(&self) -> Lattice {
        self.lattice
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Direction at an integer cell. Callers must keep the cell in bounds.
    pub fn get(&self, x: usize, y: usize, z: usize) -> [f64; 3] {
        let base = (x * self.lattice.ny * self.lattice.nz + y * self.lattice.nz + z) * 3;
        [
            self.data[base] as f64,
            self.data[base + 1] as f64,
            self.data[base + 2] as f64,
        ]
    }

    /// Set a cell direction; used by fixture builders, not by the tracer.
    pub fn set(&mut self, x: usize, y: usize, z: usize, direction: [f32; 3]) {
        let base = (x * self.lattice.ny * self.lattice.nz + y * self.lattice.nz + z) * 3;
        self.data[base..base + 3].copy_from_slice(&direction);
    }
}

/// Read-only accessor pairing the confidence and direction volumes of one run
///
/// Construction fails with `VolumeMismatch` if the two volumes disagree on
/// extent, so a mismatch is never discovered mid-trace.
#[derive(Debug, Clone, Copy)]
pub struct VolumeField<'a> {
    scalar: &'a ScalarVolume,
    vector: &'a VectorVolume,
}

impl<'a> VolumeField<'a> {
    pub fn new(scalar: &'a ScalarVolume, vector: &'a VectorVolume) -> Result<Self> {
        if scalar.lattice() != vector.lattice() {
            return Err(TractError::VolumeMismatch {
                what: "direction volume vs confidence volume",
                expected: scalar.lattice().dims(),
                found: vector.lattice().dims(),
            });
        }
        Ok(VolumeField { scalar, vector })
    }

    pub fn lattice(&self) -> Lattice {
        self.scalar.lattice()
    }

    /// Bounds predicate; see [`Lattice::contains`].
    pub fn in_bounds(&self, p: Point) -> bool {
        self.lattice().contains(p)
    }

    /// Confidence at the cell containing `p` (coordinates truncated toward zero).
    pub fn sample_scalar(&self, p: Point) -> Result<f64> {
        if !self.in_bounds(p) {
            return Err(TractError::OutOfBoundsSample { point: p });
        }
        Ok(self.scalar.get(p[0] as usize, p[1] as usize, p[2] as usize))
    }

    /// Direction at the cell containing `p` (coordinates truncated toward zero).
    pub fn sample_vector(&self, p: Point) -> Result<[f64; 3]> {
        if !self.in_bounds(p) {
            return Err(TractError::OutOfBoundsSample { point: p });
        }
        Ok(self.vector.get(p[0] as usize, p[1] as usize, p[2] as usize))
    }
}
