//! Renderer boundary: geometry and color buffers for an external renderer
//!
//! The engine makes no rendering calls. This module only shapes traced tracks
//! into the flat buffers a polyline renderer consumes: point positions,
//! segment index pairs between consecutive recorded points, and per-point
//! byte colors. Segments connect discovery order, not anatomy.

use crate::track::Track;
use crate::volume::Point;

/// How per-point colors are generated for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coloring {
    /// Every point gets the track's own color.
    TrackColor,
    /// Red-to-blue ramp over the point index.
    IndexGradient,
}

/// Flat buffers for one track, ready for a polyline renderer
#[derive(Debug, Clone)]
pub struct RenderBatch {
    pub points: Vec<Point>,
    /// Index pairs joining consecutive recorded points
    pub segments: Vec<[usize; 2]>,
    /// One RGB byte triple per point
    pub colors: Vec<[u8; 3]>,
}

/// Red-to-blue gradient over `point_count` indices
///
/// Point `i` gets `R = (1-t)*255, G = 0, B = t*255` with
/// `t = i / (point_count - 1)`. A single-point track has no defined ramp and
/// yields the start color rather than dividing by zero.
pub fn gradient_colors(point_count: usize) -> Vec<[u8; 3]> {
    (0..point_count)
        .map(|i| {
            let ratio = if point_count > 1 {
                i as f64 / (point_count - 1) as f64
            } else {
                0.0
            };
            [((1.0 - ratio) * 255.0) as u8, 0, (ratio * 255.0) as u8]
        })
        .collect()
}

/// Build the renderer input for one track
pub fn build_batch(track: &Track, coloring: Coloring) -> RenderBatch {
    let n = track.points.len();
    let segments = (1..n).map(|i| [i - 1, i]).collect();
    let colors = match coloring {
        Coloring::IndexGradient => gradient_colors(n),
        Coloring::TrackColor => {
            let c = [
                (track.color.r * 255.0) as u8,
                (track.color.g * 255.0) as u8,
                (track.color.b * 255.0) as u8,
            ];
            vec![c; n]
        }
    };
    RenderBatch {
        points: track.points.clone(),
        segments,
        colors,
    }
}
