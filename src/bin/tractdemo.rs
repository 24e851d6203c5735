//! Fiber tracing demo over DTI-derived volumes.
//!
//! Run with: cargo run --release --bin tractdemo -- <args>
//!
//! Usage:
//!   tractdemo --fa FA.nii --vectors eigenvector_data.bin --dims 144,144,85 \
//!       single --seed 72,72,34
//!   tractdemo ... labeled --labels FALabeled.nii --output ranks.nii.gz
//!   tractdemo ... interactive --seeds 72,72,34 --seeds 80,70,30
//!
//! The vector volume is read as a flat eigenvector dump unless the path ends
//! in .nii or .nii.gz, in which case it is read as a vector NIfTI image.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tract_core::error::Result;
use tract_core::nifti_io;
use tract_core::render::{build_batch, Coloring};
use tract_core::trace::{ReplaySeeds, SeedingPolicy, TraceConfig, Tracer};
use tract_core::volume::{Lattice, Point, ScalarVolume, VectorVolume, VolumeField};
use tract_core::{eigenvector_io, track::Track};

fn parse_dims(s: &str) -> Result<(usize, usize, usize), String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err(format!("expected nx,ny,nz, got '{}'", s));
    }
    let mut dims = [0usize; 3];
    for (i, part) in parts.iter().enumerate() {
        dims[i] = part
            .trim()
            .parse()
            .map_err(|e| format!("invalid dimension '{}': {}", part, e))?;
    }
    Ok((dims[0], dims[1], dims[2]))
}

fn parse_point(s: &str) -> Result<Point, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z, got '{}'", s));
    }
    let mut point = [0.0f64; 3];
    for (i, part) in parts.iter().enumerate() {
        point[i] = part
            .trim()
            .parse()
            .map_err(|e| format!("invalid coordinate '{}': {}", part, e))?;
    }
    Ok(point)
}

#[derive(Parser)]
#[command(name = "tractdemo")]
#[command(about = "Trace fiber paths through a DTI principal-direction field")]
struct Args {
    /// Scalar confidence volume (NIfTI)
    #[arg(long)]
    fa: PathBuf,

    /// Principal-direction volume (flat .bin dump or vector NIfTI)
    #[arg(long)]
    vectors: PathBuf,

    /// Lattice extent, e.g. 144,144,85
    #[arg(long, value_parser = parse_dims)]
    dims: (usize, usize, usize),

    /// Confidence admission threshold (defaults per variant)
    #[arg(long)]
    alpha: Option<f64>,

    /// Per-step displacement scale (defaults per variant)
    #[arg(long)]
    step_size: Option<f64>,

    /// Step ceiling (defaults per variant)
    #[arg(long)]
    max_steps: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Trace from one fixed seed
    Single {
        /// Seed point in lattice coordinates
        #[arg(long, value_parser = parse_point, default_value = "72,72,34")]
        seed: Point,

        /// Use claim-once lattice stepping instead of free-form stepping
        #[arg(long)]
        claimed: bool,

        /// Save the visit-rank volume (claim-once runs only)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Trace from every label-1 voxel of a label volume (claim-once)
    Labeled {
        /// Label volume (NIfTI), value 1 marks seeds
        #[arg(long)]
        labels: PathBuf,

        /// Use free-form stepping with a merged track instead of claim-once
        #[arg(long)]
        free: bool,

        /// Save the visit-rank volume (claim-once runs only)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replay a sequence of interactive seed updates
    Interactive {
        /// Seed points, one per round
        #[arg(long, value_parser = parse_point)]
        seeds: Vec<Point>,
    },
}

fn print_tracks(tracks: &[Track], coloring: Coloring) {
    let total: usize = tracks.iter().map(|t| t.points.len()).sum();
    println!("[INFO] {} track(s), {} points total", tracks.len(), total);
    for (i, track) in tracks.iter().enumerate() {
        let batch = build_batch(track, coloring);
        println!(
            "[INFO]   track {}: {} points, {} segments",
            i,
            batch.points.len(),
            batch.segments.len()
        );
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let lattice = Lattice::new(args.dims.0, args.dims.1, args.dims.2);

    println!("[INFO] Loading confidence volume {}...", args.fa.display());
    let start = Instant::now();
    let fa_bytes = std::fs::read(&args.fa).map_err(|e| tract_core::error::TractError::VolumeLoad {
        path: args.fa.clone(),
        reason: e.to_string(),
    })?;
    let fa_nifti = nifti_io::load_nifti(&fa_bytes).map_err(|reason| {
        tract_core::error::TractError::VolumeLoad {
            path: args.fa.clone(),
            reason,
        }
    })?;
    if fa_nifti.dims != lattice.dims() {
        return Err(tract_core::error::TractError::VolumeMismatch {
            what: "confidence volume",
            expected: lattice.dims(),
            found: fa_nifti.dims,
        });
    }
    let voxel_size = fa_nifti.voxel_size;
    let affine = fa_nifti.affine;
    let scalar = ScalarVolume::new(lattice, fa_nifti.data)?;

    println!("[INFO] Loading direction volume {}...", args.vectors.display());
    let vector: VectorVolume = {
        let name = args.vectors.to_string_lossy();
        if name.ends_with(".nii") || name.ends_with(".nii.gz") {
            nifti_io::read_vector_volume(&args.vectors, lattice)?
        } else {
            eigenvector_io::read_eigenvector_file(&args.vectors, lattice)?
        }
    };
    println!("[INFO] Loaded in {:.2?}", start.elapsed());
    println!(
        "[INFO] Lattice: {}x{}x{}",
        lattice.nx, lattice.ny, lattice.nz
    );

    let field = VolumeField::new(&scalar, &vector)?;

    let with_overrides = |mut config: TraceConfig| {
        if let Some(alpha) = args.alpha {
            config.alpha = alpha;
        }
        if let Some(step_size) = args.step_size {
            config.step_size = step_size;
        }
        if let Some(max_steps) = args.max_steps {
            config.max_steps = max_steps;
        }
        config
    };

    match &args.command {
        Command::Single {
            seed,
            claimed,
            output,
        } => {
            let start = Instant::now();
            let outcome = if *claimed {
                let config = with_overrides(TraceConfig::claimed_single());
                let cell = [seed[0] as usize, seed[1] as usize, seed[2] as usize];
                Tracer::new(field, config).trace_single_seed_claimed(cell)?
            } else {
                let config = with_overrides(TraceConfig::free_single());
                Tracer::new(field, config).trace(SeedingPolicy::SingleSeed { seed: *seed })?
            };
            println!(
                "[INFO] Single-seed trace finished in {:.2?} ({:?})",
                start.elapsed(),
                outcome.stop
            );
            print_tracks(&outcome.tracks, Coloring::IndexGradient);
            if let (Some(path), Some(visited)) = (output, &outcome.visited) {
                nifti_io::save_nifti_to_file(
                    path,
                    &visited.to_rank_data(),
                    lattice.dims(),
                    voxel_size,
                    &affine,
                )?;
                println!("[INFO] Rank volume saved to {}", path.display());
            }
        }
        Command::Labeled {
            labels,
            free,
            output,
        } => {
            println!("[INFO] Loading label volume {}...", labels.display());
            let label_volume = nifti_io::read_label_volume(labels, lattice)?;

            let start = Instant::now();
            let outcome = if *free {
                let config = with_overrides(TraceConfig::free_labeled());
                Tracer::new(field, config).trace_label_mask_free(&label_volume)?
            } else {
                let config = with_overrides(TraceConfig::claimed_labeled());
                Tracer::new(field, config).trace(SeedingPolicy::LabelMaskSeeds {
                    labels: &label_volume,
                })?
            };
            println!(
                "[INFO] Labeled trace finished in {:.2?} ({:?})",
                start.elapsed(),
                outcome.stop
            );
            print_tracks(&outcome.tracks, Coloring::IndexGradient);
            if let Some(visited) = &outcome.visited {
                println!("[INFO] Step count: {}", visited.counter());
                if let Some(path) = output {
                    nifti_io::save_nifti_to_file(
                        path,
                        &visited.to_rank_data(),
                        lattice.dims(),
                        voxel_size,
                        &affine,
                    )?;
                    println!("[INFO] Rank volume saved to {}", path.display());
                }
            }
        }
        Command::Interactive { seeds } => {
            let start = Instant::now();
            let config = with_overrides(TraceConfig::interactive());
            let mut feed = ReplaySeeds::new(seeds.iter().copied());
            let outcome = Tracer::new(field, config)
                .trace(SeedingPolicy::InteractiveSeed { feed: &mut feed })?;
            println!(
                "[INFO] Interactive replay finished in {:.2?} ({:?})",
                start.elapsed(),
                outcome.stop
            );
            print_tracks(&outcome.tracks, Coloring::TrackColor);
        }
    }

    Ok(())
}
