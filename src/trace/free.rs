//! Free-form tracing: continuous displacement, no de-duplication
//!
//! The frontier holds floating-point lattice points. Each expansion records
//! the popped point and proposes one step forward and one step backward along
//! the sampled direction, unrounded. Nothing prevents a cell from being
//! enqueued again via a different path; the same region may be re-expanded
//! many times, so the recorded-point ceiling is the only bound on growth.

use std::collections::VecDeque;

use log::debug;

use crate::error::Result;
use crate::track::TrackCollector;
use crate::volume::{Point, VolumeField};

use super::{CancelToken, StopReason, TraceConfig};

/// Grow one free-form traversal from `seed`, recording into the open track.
///
/// Records at most `config.max_steps` points per call; an out-of-bounds seed
/// records nothing. Returns the number of points recorded and why the run
/// stopped.
pub fn extend_track(
    field: &VolumeField<'_>,
    config: &TraceConfig,
    cancel: &CancelToken,
    seed: Point,
    collector: &mut TrackCollector,
) -> Result<(usize, StopReason)> {
    let mut frontier: VecDeque<Point> = VecDeque::new();
    if field.in_bounds(seed) {
        frontier.push_back(seed);
    }

    let mut recorded = 0usize;
    let mut stop = StopReason::FrontierExhausted;

    while let Some(current) = frontier.pop_front() {
        if cancel.is_cancelled() {
            stop = StopReason::Cancelled;
            break;
        }
        if recorded >= config.max_steps {
            stop = StopReason::StepCeiling;
            break;
        }

        collector.record(current);
        recorded += 1;

        let v = field.sample_vector(current)?;
        for sign in [1.0, -1.0] {
            let next = [
                current[0] + sign * config.step_size * v[0],
                current[1] + sign * config.step_size * v[1],
                current[2] + sign * config.step_size * v[2],
            ];

            if !field.in_bounds(next) {
                continue;
            }
            if field.sample_scalar(next)? < config.alpha {
                continue;
            }
            frontier.push_back(next);
        }
    }

    debug!(
        "free trace from {:?} stopped ({:?}) after {} points",
        seed, stop, recorded
    );
    Ok((recorded, stop))
}
