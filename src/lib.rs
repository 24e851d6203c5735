//! Tract-Core: voxel-space fiber tractography
//!
//! This crate traces fiber-like paths through a per-voxel principal-direction
//! field derived from diffusion tensor imaging, gated by a scalar confidence
//! field, and prepares the traced geometry for an external renderer.
//!
//! # Modules
//! - `volume`: Lattice geometry, scalar/vector volumes, bounds-checked sampling
//! - `visited`: Visit-rank bookkeeping for the claim-once variants
//! - `trace`: Seeding policies and the stepping/expansion engine
//! - `track`: Track accumulation and display colors
//! - `render`: Geometry and color buffers for the renderer boundary
//! - `error`: Error types

// Core modules
pub mod error;
pub mod volume;
pub mod visited;

// Tracing engine
pub mod trace;
pub mod track;

// I/O modules
pub mod eigenvector_io;
pub mod nifti_io;

// Renderer boundary
pub mod render;
