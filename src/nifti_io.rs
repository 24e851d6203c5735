//! NIfTI file I/O
//!
//! Byte-level loading and saving of NIfTI-1 volumes (.nii and .nii.gz, gzip
//! auto-detected), plus typed wrappers that bind files to a session lattice.
//! Scalar data is extracted in Fortran order (x varies fastest) to match
//! NIfTI convention: index = x + y*nx + z*nx*ny.

use std::io::Cursor;
use std::path::Path;

use flate2::read::GzDecoder;
use ndarray::Array;
use nifti::volume::ndarray::IntoNdArray;
use nifti::{InMemNiftiObject, NiftiHeader, NiftiObject};

use crate::error::{Result, TractError};
use crate::volume::{Lattice, ScalarVolume, VectorVolume};

/// A scalar NIfTI volume loaded into memory
pub struct NiftiVolume {
    /// Volume data in Fortran order, as f64
    pub data: Vec<f64>,
    /// Dimensions (nx, ny, nz)
    pub dims: (usize, usize, usize),
    /// Voxel sizes in mm
    pub voxel_size: (f64, f64, f64),
    /// Affine transformation matrix (4x4, row-major)
    pub affine: [f64; 16],
}

/// Check if bytes are gzip compressed
fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b
}

/// Get header info for diagnostics
fn header_info(bytes: &[u8]) -> String {
    if bytes.len() < 348 {
        return format!("file too small ({} bytes, need at least 348)", bytes.len());
    }

    let sizeof_hdr = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let magic = String::from_utf8_lossy(&bytes[344..348]).to_string();
    let datatype = i16::from_le_bytes([bytes[70], bytes[71]]);

    format!("sizeof_hdr={}, magic='{}', datatype={}", sizeof_hdr, magic, datatype)
}

fn read_object(bytes: &[u8]) -> Result<InMemNiftiObject, String> {
    if is_gzip(bytes) {
        let decoder = GzDecoder::new(Cursor::new(bytes));
        InMemNiftiObject::from_reader(decoder)
            .map_err(|e| format!("failed to read gzipped NIfTI: {}", e))
    } else {
        InMemNiftiObject::from_reader(Cursor::new(bytes))
            .map_err(|e| format!("failed to read NIfTI: {} ({})", e, header_info(bytes)))
    }
}

/// Affine transformation matrix from the header
///
/// Prefers the sform when present, otherwise falls back to identity with
/// voxel scaling.
fn affine_from_header(header: &NiftiHeader) -> [f64; 16] {
    if header.sform_code > 0 {
        let s = &header.srow_x;
        let t = &header.srow_y;
        let u = &header.srow_z;
        [
            s[0] as f64, s[1] as f64, s[2] as f64, s[3] as f64,
            t[0] as f64, t[1] as f64, t[2] as f64, t[3] as f64,
            u[0] as f64, u[1] as f64, u[2] as f64, u[3] as f64,
            0.0, 0.0, 0.0, 1.0,
        ]
    } else {
        let vsx = header.pixdim[1] as f64;
        let vsy = header.pixdim[2] as f64;
        let vsz = header.pixdim[3] as f64;
        [
            vsx, 0.0, 0.0, 0.0,
            0.0, vsy, 0.0, 0.0,
            0.0, 0.0, vsz, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ]
    }
}

/// Load a scalar NIfTI volume from bytes
///
/// Supports .nii and .nii.gz. A 4-D file contributes its first frame.
pub fn load_nifti(bytes: &[u8]) -> Result<NiftiVolume, String> {
    let obj = read_object(bytes)?;
    let header = obj.header();

    let pixdim = header.pixdim;
    let voxel_size = (pixdim[1] as f64, pixdim[2] as f64, pixdim[3] as f64);
    let affine = affine_from_header(header);

    let array: Array<f64, _> = obj
        .into_volume()
        .into_ndarray()
        .map_err(|e| format!("failed to convert to ndarray: {}", e))?;

    let shape = array.shape().to_vec();
    if shape.len() < 3 {
        return Err(format!("expected at least 3D volume, got {}D", shape.len()));
    }
    let (nx, ny, nz) = (shape[0], shape[1], shape[2]);

    // Extract in Fortran order (x varies fastest)
    let mut data = Vec::with_capacity(nx * ny * nz);
    if shape.len() == 3 {
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    data.push(array[[i, j, k]]);
                }
            }
        }
    } else {
        // 4-D or higher: take the first frame
        let mut index = vec![0usize; shape.len()];
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    index[0] = i;
                    index[1] = j;
                    index[2] = k;
                    data.push(array[index.as_slice()]);
                }
            }
        }
    }

    Ok(NiftiVolume {
        data,
        dims: (nx, ny, nz),
        voxel_size,
        affine,
    })
}

/// Load a 3-component vector NIfTI volume from bytes
///
/// Accepts 4-D `(x, y, z, 3)` layouts and the 5-D `(x, y, z, 1, 3)` layout
/// some writers emit for vector images. Returns components in row-major
/// `(x, y, z, component)` order together with the spatial dims.
pub fn load_nifti_vector(bytes: &[u8]) -> Result<(Vec<f32>, (usize, usize, usize)), String> {
    let obj = read_object(bytes)?;

    let array: Array<f64, _> = obj
        .into_volume()
        .into_ndarray()
        .map_err(|e| format!("failed to convert to ndarray: {}", e))?;

    let shape = array.shape().to_vec();
    let (nx, ny, nz) = match shape.as_slice() {
        [nx, ny, nz, 3] => (*nx, *ny, *nz),
        [nx, ny, nz, 1, 3] => (*nx, *ny, *nz),
        other => {
            return Err(format!(
                "expected a 3-component vector image, got shape {:?}",
                other
            ))
        }
    };

    let five_d = shape.len() == 5;
    let mut data = Vec::with_capacity(nx * ny * nz * 3);
    for i in 0..nx {
        for j in 0..ny {
            for k in 0..nz {
                for c in 0..3 {
                    let v = if five_d {
                        array[[i, j, k, 0, c]]
                    } else {
                        array[[i, j, k, c]]
                    };
                    data.push(v as f32);
                }
            }
        }
    }

    Ok((data, (nx, ny, nz)))
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| TractError::VolumeLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn check_extent(
    what: &'static str,
    lattice: Lattice,
    found: (usize, usize, usize),
) -> Result<()> {
    if found != lattice.dims() {
        return Err(TractError::VolumeMismatch {
            what,
            expected: lattice.dims(),
            found,
        });
    }
    Ok(())
}

/// Read a scalar confidence volume and bind it to the session lattice.
pub fn read_scalar_volume(path: &Path, lattice: Lattice) -> Result<ScalarVolume> {
    let nifti = load_nifti(&read_bytes(path)?).map_err(|reason| TractError::VolumeLoad {
        path: path.to_path_buf(),
        reason,
    })?;
    check_extent("confidence volume", lattice, nifti.dims)?;
    ScalarVolume::new(lattice, nifti.data)
}

/// Read a label volume (integer labels stored as scalars) for seed scanning.
pub fn read_label_volume(path: &Path, lattice: Lattice) -> Result<ScalarVolume> {
    let nifti = load_nifti(&read_bytes(path)?).map_err(|reason| TractError::VolumeLoad {
        path: path.to_path_buf(),
        reason,
    })?;
    check_extent("label volume", lattice, nifti.dims)?;
    ScalarVolume::new(lattice, nifti.data)
}

/// Read a principal-direction volume from a vector NIfTI image.
pub fn read_vector_volume(path: &Path, lattice: Lattice) -> Result<VectorVolume> {
    let (data, dims) =
        load_nifti_vector(&read_bytes(path)?).map_err(|reason| TractError::VolumeLoad {
            path: path.to_path_buf(),
            reason,
        })?;
    check_extent("direction volume", lattice, dims)?;
    VectorVolume::new(lattice, data)
}

/// Save data as NIfTI bytes (uncompressed .nii, FLOAT32 data)
pub fn save_nifti(
    data: &[f64],
    dims: (usize, usize, usize),
    voxel_size: (f64, f64, f64),
    affine: &[f64; 16],
) -> Vec<u8> {
    let (nx, ny, nz) = dims;
    let (vsx, vsy, vsz) = voxel_size;

    // NIfTI-1 header (348 bytes)
    let mut header = [0u8; 348];

    // sizeof_hdr = 348
    header[0..4].copy_from_slice(&348i32.to_le_bytes());

    // dim[0..7]
    let dim: [i16; 8] = [3, nx as i16, ny as i16, nz as i16, 1, 1, 1, 1];
    for (i, &d) in dim.iter().enumerate() {
        let offset = 40 + i * 2;
        header[offset..offset + 2].copy_from_slice(&d.to_le_bytes());
    }

    // datatype = 16 (FLOAT32), bitpix = 32
    header[70..72].copy_from_slice(&16i16.to_le_bytes());
    header[72..74].copy_from_slice(&32i16.to_le_bytes());

    // pixdim[0..7]
    let pixdim: [f32; 8] = [1.0, vsx as f32, vsy as f32, vsz as f32, 1.0, 1.0, 1.0, 1.0];
    for (i, &p) in pixdim.iter().enumerate() {
        let offset = 76 + i * 4;
        header[offset..offset + 4].copy_from_slice(&p.to_le_bytes());
    }

    // vox_offset = 352 (header + 4-byte extension)
    header[108..112].copy_from_slice(&352.0f32.to_le_bytes());

    // scl_slope = 1.0, scl_inter = 0.0
    header[112..116].copy_from_slice(&1.0f32.to_le_bytes());
    header[116..120].copy_from_slice(&0.0f32.to_le_bytes());

    // sform_code = 1 (scanner anat)
    header[254..256].copy_from_slice(&1i16.to_le_bytes());

    // srow_x, srow_y, srow_z
    for row in 0..3 {
        for i in 0..4 {
            let offset = 280 + row * 16 + i * 4;
            header[offset..offset + 4]
                .copy_from_slice(&(affine[row * 4 + i] as f32).to_le_bytes());
        }
    }

    // magic = "n+1\0" for single-file NIfTI-1
    header[344..348].copy_from_slice(b"n+1\0");

    let mut buffer = Vec::with_capacity(352 + data.len() * 4);
    buffer.extend_from_slice(&header);
    // 4-byte extension marker, all zeros = no extension
    buffer.extend_from_slice(&[0u8; 4]);
    for &val in data {
        buffer.extend_from_slice(&(val as f32).to_le_bytes());
    }
    buffer
}

/// Save data as gzipped NIfTI bytes (.nii.gz)
pub fn save_nifti_gz(
    data: &[f64],
    dims: (usize, usize, usize),
    voxel_size: (f64, f64, f64),
    affine: &[f64; 16],
) -> Result<Vec<u8>, String> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let uncompressed = save_nifti(data, dims, voxel_size, affine);
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&uncompressed)
        .map_err(|e| format!("gzip compression failed: {}", e))?;
    encoder.finish().map_err(|e| format!("gzip finish failed: {}", e))
}

/// Save scalar data to a NIfTI file, gzipped when the path ends in .nii.gz.
pub fn save_nifti_to_file(
    path: &Path,
    data: &[f64],
    dims: (usize, usize, usize),
    voxel_size: (f64, f64, f64),
    affine: &[f64; 16],
) -> Result<()> {
    let bytes = if path.to_string_lossy().ends_with(".nii.gz") {
        save_nifti_gz(data, dims, voxel_size, affine).map_err(|reason| {
            TractError::VolumeSave {
                path: path.to_path_buf(),
                reason,
            }
        })?
    } else {
        save_nifti(data, dims, voxel_size, affine)
    };
    std::fs::write(path, &bytes).map_err(|e| TractError::VolumeSave {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Identity affine with voxel scaling, for outputs with no source geometry
pub fn scaled_identity_affine(voxel_size: (f64, f64, f64)) -> [f64; 16] {
    [
        voxel_size.0, 0.0, 0.0, 0.0,
        0.0, voxel_size.1, 0.0, 0.0,
        0.0, 0.0, voxel_size.2, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ]
}
