//! Turns two arbitrary points of a room into a short list of waypoints.

use std::sync::Arc;

#[cfg(feature = "bevy_reflect")]
use bevy_reflect::prelude::*;
use glam::Vec2;

use crate::{NavSnapshot, NearestWalkableFinder, math::cell_center, point_to_cell};

/// Specifies how [`PathPlanner`] resolves endpoints and simplifies routes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(
    all(feature = "serialize", feature = "bevy_reflect"),
    reflect(Serialize, Deserialize)
)]
pub struct PlannerConfig {
    /// How far to look for a navigable cell when the start point is not navigable. `[Limit: >= 0] [Units: cells]`
    pub source_search_radius: u16,

    /// How far to look for a navigable cell when the target point is not navigable. `[Limit: >= 0] [Units: cells]`
    ///
    /// Targets usually come from user clicks, which can land far outside any walkable area,
    /// so this is larger than [`Self::source_search_radius`].
    pub target_search_radius: u16,

    /// The dot product between incoming and outgoing directions below which a waypoint is kept. `[Limit: -1 <= value <= 1]`
    ///
    /// Values between 0.94 and 0.98 keep points where the route turns by roughly 11° to 20° or more.
    pub turn_threshold: f32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            source_search_radius: NearestWalkableFinder::DEFAULT_MAX_RADIUS,
            target_search_radius: NearestWalkableFinder::CLICK_MAX_RADIUS,
            turn_threshold: 0.96,
        }
    }
}

/// Computes simplified routes over a [`NavSnapshot`].
///
/// Cheap to clone. A planner keeps the snapshot it was created with alive,
/// so it keeps answering consistently even after the room geometry is replaced.
#[derive(Debug, Clone)]
pub struct PathPlanner {
    snapshot: Arc<NavSnapshot>,
    config: PlannerConfig,
}

impl PathPlanner {
    /// Creates a planner over `snapshot`.
    pub fn new(snapshot: Arc<NavSnapshot>, config: PlannerConfig) -> Self {
        Self { snapshot, config }
    }

    /// The snapshot routes are computed on.
    pub fn snapshot(&self) -> &Arc<NavSnapshot> {
        &self.snapshot
    }

    /// The configuration of the planner.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Computes the waypoints leading from `from` to `to`.
    ///
    /// The current position is not part of the result unless `from` had to be moved onto the graph,
    /// in which case the center of the resolved start cell is the first waypoint.
    /// The last waypoint is exactly `to` if its cell is navigable, otherwise the center of the closest navigable cell.
    ///
    /// Returns an empty list if no route exists or an endpoint cannot be resolved.
    /// Callers should treat that as "stay put".
    pub fn compute_path(&self, from: Vec2, to: Vec2) -> Vec<Vec2> {
        let walkability = self.snapshot.walkability();
        let graph = self.snapshot.graph();
        let finder = NearestWalkableFinder::new(walkability, graph.padding());

        let from_cell = finder.quantize(from);
        let to_cell = finder.quantize(to);
        let start = finder
            .find_nearest_cell(from_cell, self.config.source_search_radius)
            .filter(|cell| graph.has_cell(*cell));
        let end = finder
            .find_nearest_cell(to_cell, self.config.target_search_radius)
            .filter(|cell| graph.has_cell(*cell));
        let (Some(start), Some(end)) = (start, end) else {
            tracing::debug!("Could not resolve a navigable cell for a path from {from} to {to}");
            return Vec::new();
        };

        let source_moved = start != point_to_cell(from);
        let target = if end == point_to_cell(to) {
            to
        } else {
            cell_center(end)
        };

        if start == end {
            return vec![target];
        }

        let cells = graph.shortest_path(start, end);
        if cells.is_empty() {
            tracing::debug!("No route from {from} to {to}");
            return Vec::new();
        }

        let mut path = simplify_path(&cells, self.config.turn_threshold);
        if let Some(last) = path.last_mut() {
            *last = target;
        }
        if !source_moved && path.len() > 1 {
            path.remove(0);
        }
        tracing::trace!(
            "Path from {from} to {to}: {} cells simplified to {} waypoints",
            cells.len(),
            path.len()
        );
        path
    }
}

/// Collapses points that do not represent a meaningful change of direction.
///
/// An interior point is kept only if the dot product of the unit directions into and out of it is below `turn_threshold`.
/// The first and last points are always kept, and consecutive duplicates are removed.
pub fn simplify_path(points: &[Vec2], turn_threshold: f32) -> Vec<Vec2> {
    let mut deduped: Vec<Vec2> = Vec::with_capacity(points.len());
    for point in points {
        if deduped.last() != Some(point) {
            deduped.push(*point);
        }
    }
    if deduped.len() <= 2 {
        return deduped;
    }

    let mut simplified = Vec::with_capacity(deduped.len());
    simplified.push(deduped[0]);
    for window in deduped.windows(3) {
        let [previous, current, next] = [window[0], window[1], window[2]];
        let incoming = (current - previous).normalize_or_zero();
        let outgoing = (next - current).normalize_or_zero();
        if incoming.dot(outgoing) < turn_threshold {
            simplified.push(current);
        }
    }
    simplified.extend(deduped.last());
    simplified
}
