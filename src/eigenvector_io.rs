//! Flat binary principal-direction I/O
//!
//! The eigenvector dump is a headerless file of exactly `nx*ny*nz*3`
//! little-endian 32-bit floats in row-major `(x, y, z, component)` order.
//! The byte length is validated strictly: a short or oversized file fails
//! with `MalformedVolumeFile` instead of yielding undefined trailing reads.

use std::path::Path;

use crate::error::{Result, TractError};
use crate::volume::{Lattice, VectorVolume};

/// Decode an eigenvector dump from bytes.
pub fn load_eigenvectors(bytes: &[u8], lattice: Lattice) -> Result<VectorVolume> {
    let expected_bytes = lattice.len() * 3 * 4;
    if bytes.len() != expected_bytes {
        return Err(TractError::MalformedVolumeFile {
            path: "<bytes>".into(),
            expected_bytes,
            found_bytes: bytes.len(),
        });
    }

    let mut data = Vec::with_capacity(lattice.len() * 3);
    for chunk in bytes.chunks_exact(4) {
        data.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    VectorVolume::new(lattice, data)
}

/// Read an eigenvector dump from a file.
pub fn read_eigenvector_file(path: &Path, lattice: Lattice) -> Result<VectorVolume> {
    let bytes = std::fs::read(path).map_err(|e| TractError::VolumeLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    load_eigenvectors(&bytes, lattice).map_err(|e| match e {
        TractError::MalformedVolumeFile {
            expected_bytes,
            found_bytes,
            ..
        } => TractError::MalformedVolumeFile {
            path: path.to_path_buf(),
            expected_bytes,
            found_bytes,
        },
        other => other,
    })
}

/// Encode a vector volume back into the flat dump format.
pub fn save_eigenvectors(volume: &VectorVolume) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(volume.data().len() * 4);
    for &v in volume.data() {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Write a vector volume to a flat dump file.
pub fn write_eigenvector_file(path: &Path, volume: &VectorVolume) -> Result<()> {
    std::fs::write(path, save_eigenvectors(volume)).map_err(|e| TractError::VolumeSave {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
