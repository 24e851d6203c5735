//! Claim-once tracing: integer-rounded displacement over a VisitedIndex
//!
//! Unlike the free-form tracer, every frontier entry is an integer lattice
//! cell: each component of the scaled direction is rounded to the nearest
//! integer before stepping, so candidates land exactly on cells and can be
//! claimed. One VisitedIndex and one rank counter span all seeds of a run;
//! the counter doubles as the step budget, so seeds late in scan order can be
//! starved by earlier ones.

use std::collections::VecDeque;

use log::debug;

use crate::error::Result;
use crate::track::TrackCollector;
use crate::visited::VisitedIndex;
use crate::volume::VolumeField;

use super::{CancelToken, StopReason, TraceConfig};

/// Grow one merged claim-once traversal from `seeds`, recording into the
/// open track and claiming cells in `visited`.
///
/// Seeds are claimed at rank 1 before expansion begins. A popped cell whose
/// confidence is below the threshold is skipped without being recorded; this
/// is the only confidence gate seeds ever see, since admission checks apply
/// to stepped candidates only.
pub fn extend_claimed(
    field: &VolumeField<'_>,
    config: &TraceConfig,
    cancel: &CancelToken,
    seeds: &[[usize; 3]],
    visited: &mut VisitedIndex,
    collector: &mut TrackCollector,
) -> Result<StopReason> {
    let lattice = field.lattice();
    let mut frontier: VecDeque<[usize; 3]> = VecDeque::new();

    for &seed in seeds {
        let p = [seed[0] as f64, seed[1] as f64, seed[2] as f64];
        if !lattice.contains(p) || visited.is_claimed(seed) {
            continue;
        }
        visited.claim_seed(seed);
        frontier.push_back(seed);
    }

    let mut stop = StopReason::FrontierExhausted;

    while let Some(cell) = frontier.pop_front() {
        if cancel.is_cancelled() {
            stop = StopReason::Cancelled;
            break;
        }
        if visited.counter() as usize >= config.max_steps {
            stop = StopReason::StepCeiling;
            break;
        }

        let current = [cell[0] as f64, cell[1] as f64, cell[2] as f64];
        if field.sample_scalar(current)? < config.alpha {
            continue;
        }
        collector.record(current);

        let v = field.sample_vector(current)?;
        for sign in [1i64, -1] {
            let mut next = [cell[0] as i64, cell[1] as i64, cell[2] as i64];
            for i in 0..3 {
                next[i] += sign * (v[i] * config.step_size).round() as i64;
            }

            let p = [next[0] as f64, next[1] as f64, next[2] as f64];
            if !field.in_bounds(p) {
                continue;
            }
            let next_cell = [next[0] as usize, next[1] as usize, next[2] as usize];
            if visited.is_claimed(next_cell) {
                continue;
            }
            if field.sample_scalar(p)? < config.alpha {
                continue;
            }

            visited.claim_next(next_cell);
            frontier.push_back(next_cell);
        }
    }

    debug!(
        "claimed trace over {} seed(s) stopped ({:?}) at step count {}",
        seeds.len(),
        stop,
        visited.counter()
    );
    Ok(stop)
}
