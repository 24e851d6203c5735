//! The tracing engine: configuration, seeding policies, and run drivers
//!
//! A run pairs one seeding policy with one stepping axis. The free axis
//! (`free`) steps with continuous displacement and no de-duplication; the
//! claim-once axis (`claimed`) rounds displacement onto the lattice and
//! suppresses re-expansion through a [`VisitedIndex`]. The two axes differ in
//! exactly those two behaviors and must not be unified: rounding is what lets
//! the claimed variant index its visit ranks, and the free variant's
//! re-enqueueing is deliberate, ceiling-bounded behavior.

pub mod claimed;
pub mod free;
pub mod seeds;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::info;
use serde::Deserialize;

use crate::error::{Result, TractError};
use crate::track::{palette_color, Rgb, Track, TrackCollector};
use crate::visited::VisitedIndex;
use crate::volume::{Point, ScalarVolume, VolumeField};

pub use seeds::{label_seed_cells, ReplaySeeds, SeedFeed, SEED_LABEL};

/// Parameters recognized by every tracing variant
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TraceConfig {
    /// Confidence admission threshold: a candidate cell is only admitted when
    /// its sampled confidence is at least this value.
    pub alpha: f64,
    /// Per-step displacement scale applied to the sampled direction.
    pub step_size: f64,
    /// Step ceiling. Free-axis runs stop once this many points are recorded
    /// in one traversal; claim-once runs stop once the shared rank counter
    /// reaches it.
    pub max_steps: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        TraceConfig {
            alpha: 0.5,
            step_size: 1.0,
            max_steps: 200_000,
        }
    }
}

impl TraceConfig {
    /// Free-axis single-seed defaults
    pub fn free_single() -> Self {
        TraceConfig {
            alpha: 0.3,
            step_size: 1.5,
            max_steps: 200_000,
        }
    }

    /// Free-axis label-mask defaults
    pub fn free_labeled() -> Self {
        TraceConfig {
            alpha: 0.3,
            step_size: 1.5,
            max_steps: 200_000,
        }
    }

    /// Interactive defaults
    pub fn interactive() -> Self {
        TraceConfig {
            alpha: 0.5,
            step_size: 0.8,
            max_steps: 200_000,
        }
    }

    /// Claim-once single-seed defaults
    pub fn claimed_single() -> Self {
        TraceConfig {
            alpha: 0.5,
            step_size: 2.0,
            max_steps: 20_000,
        }
    }

    /// Claim-once label-mask defaults
    pub fn claimed_labeled() -> Self {
        TraceConfig {
            alpha: 0.5,
            step_size: 1.0,
            max_steps: 20_000,
        }
    }
}

/// Why a tracing run stopped
///
/// Hitting the step ceiling is a normal, silent termination condition, not an
/// error; it is kept distinguishable from natural frontier exhaustion for
/// logs and callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The frontier drained naturally.
    FrontierExhausted,
    /// The configured step ceiling was reached.
    StepCeiling,
    /// The caller cancelled the run.
    Cancelled,
}

/// Cooperative cancellation handle, checked once per expansion
///
/// Clone the token and hand it to the run; calling `cancel` from anywhere
/// stops the run at its next expansion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The three seeding variants and the stepping axis each one uses
///
/// A closed set: each variant carries its own admission rules (plain
/// bounds-plus-threshold for the free axis, bounds-plus-threshold-plus-claim
/// for the label mask) and its own displacement policy.
pub enum SeedingPolicy<'a> {
    /// One fixed lattice coordinate; free-axis stepping, one track.
    SingleSeed { seed: Point },
    /// Every label-1 cell of the mask in scan order; claim-once stepping,
    /// one merged traversal sharing a VisitedIndex and step budget.
    LabelMaskSeeds { labels: &'a ScalarVolume },
    /// Caller-driven rounds; free-axis stepping, one palette-colored track
    /// per round until the feed reports no update.
    InteractiveSeed { feed: &'a mut dyn SeedFeed },
}

/// Result of one tracing run
#[derive(Debug)]
pub struct TraceOutcome {
    /// Completed tracks in creation order
    pub tracks: Vec<Track>,
    /// Visit ranks, present for claim-once runs only
    pub visited: Option<VisitedIndex>,
    /// Why the run (or its last round) stopped
    pub stop: StopReason,
}

/// The stepping/expansion engine bound to one volume field
pub struct Tracer<'a> {
    field: VolumeField<'a>,
    config: TraceConfig,
    cancel: CancelToken,
}

impl<'a> Tracer<'a> {
    pub fn new(field: VolumeField<'a>, config: TraceConfig) -> Self {
        Tracer {
            field,
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Attach a cancellation token shared with the caller.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// Run one seeding policy to completion.
    pub fn trace(&self, policy: SeedingPolicy<'_>) -> Result<TraceOutcome> {
        match policy {
            SeedingPolicy::SingleSeed { seed } => self.trace_single_seed(seed),
            SeedingPolicy::LabelMaskSeeds { labels } => self.trace_label_mask(labels),
            SeedingPolicy::InteractiveSeed { feed } => self.trace_interactive(feed),
        }
    }

    /// Free-axis trace from one seed, producing one track.
    pub fn trace_single_seed(&self, seed: Point) -> Result<TraceOutcome> {
        let mut collector = TrackCollector::new();
        collector.begin_track(Rgb::RED);
        let (recorded, stop) =
            free::extend_track(&self.field, &self.config, &self.cancel, seed, &mut collector)?;
        collector.close_track();
        info!("single-seed trace recorded {} points ({:?})", recorded, stop);
        Ok(TraceOutcome {
            tracks: collector.export_tracks(),
            visited: None,
            stop,
        })
    }

    /// Claim-once trace over every label-1 cell of the mask.
    ///
    /// All seeds share one VisitedIndex and one step budget; the outcome
    /// carries the rank volume alongside the merged track.
    pub fn trace_label_mask(&self, labels: &ScalarVolume) -> Result<TraceOutcome> {
        self.check_labels(labels)?;
        let seed_cells = label_seed_cells(labels);
        info!("label mask yielded {} seed(s)", seed_cells.len());

        let mut visited = VisitedIndex::new(self.field.lattice());
        let mut collector = TrackCollector::new();
        collector.begin_track(Rgb::RED);
        let stop = claimed::extend_claimed(
            &self.field,
            &self.config,
            &self.cancel,
            &seed_cells,
            &mut visited,
            &mut collector,
        )?;
        collector.close_track();
        info!(
            "label-mask trace stopped ({:?}) at step count {}",
            stop,
            visited.counter()
        );
        Ok(TraceOutcome {
            tracks: collector.export_tracks(),
            visited: Some(visited),
            stop,
        })
    }

    /// Interactive rounds: one free-axis track per supplied seed, each tagged
    /// with the next palette color, until the feed reports no update.
    pub fn trace_interactive(&self, feed: &mut dyn SeedFeed) -> Result<TraceOutcome> {
        let mut collector = TrackCollector::new();
        let mut stop = StopReason::FrontierExhausted;
        let mut round = 0usize;

        while let Some(seed) = feed.next_seed() {
            if self.cancel.is_cancelled() {
                stop = StopReason::Cancelled;
                break;
            }
            collector.begin_track(palette_color(round));
            let (recorded, round_stop) =
                free::extend_track(&self.field, &self.config, &self.cancel, seed, &mut collector)?;
            collector.close_track();
            info!(
                "interactive round {} recorded {} points ({:?})",
                round, recorded, round_stop
            );
            stop = round_stop;
            round += 1;
        }

        Ok(TraceOutcome {
            tracks: collector.export_tracks(),
            visited: None,
            stop,
        })
    }

    /// Free-axis trace over every label-1 cell, merged into one track.
    ///
    /// The step ceiling applies per seed; no VisitedIndex is involved, so
    /// traversals from different seeds may re-expand each other's cells.
    pub fn trace_label_mask_free(&self, labels: &ScalarVolume) -> Result<TraceOutcome> {
        self.check_labels(labels)?;
        let seed_cells = label_seed_cells(labels);
        info!("label mask yielded {} seed(s)", seed_cells.len());

        let mut collector = TrackCollector::new();
        collector.begin_track(Rgb::RED);
        let mut stop = StopReason::FrontierExhausted;
        for cell in seed_cells {
            let seed = [cell[0] as f64, cell[1] as f64, cell[2] as f64];
            let (_, seed_stop) =
                free::extend_track(&self.field, &self.config, &self.cancel, seed, &mut collector)?;
            if seed_stop == StopReason::Cancelled {
                stop = seed_stop;
                break;
            }
            if seed_stop == StopReason::StepCeiling {
                stop = seed_stop;
            }
        }
        collector.close_track();
        Ok(TraceOutcome {
            tracks: collector.export_tracks(),
            visited: None,
            stop,
        })
    }

    /// Claim-once trace from one fixed seed cell.
    pub fn trace_single_seed_claimed(&self, seed: [usize; 3]) -> Result<TraceOutcome> {
        let mut visited = VisitedIndex::new(self.field.lattice());
        let mut collector = TrackCollector::new();
        collector.begin_track(Rgb::RED);
        let stop = claimed::extend_claimed(
            &self.field,
            &self.config,
            &self.cancel,
            &[seed],
            &mut visited,
            &mut collector,
        )?;
        collector.close_track();
        info!(
            "claimed single-seed trace stopped ({:?}) at step count {}",
            stop,
            visited.counter()
        );
        Ok(TraceOutcome {
            tracks: collector.export_tracks(),
            visited: Some(visited),
            stop,
        })
    }

    fn check_labels(&self, labels: &ScalarVolume) -> Result<()> {
        if labels.lattice() != self.field.lattice() {
            return Err(TractError::VolumeMismatch {
                what: "label volume",
                expected: self.field.lattice().dims(),
                found: labels.lattice().dims(),
            });
        }
        Ok(())
    }
}
