//! Ties geometry, walkability, graph and planner of one room together.

use std::sync::Arc;

use glam::{IVec2, Vec2};

use crate::{
    NavGraph, NearestWalkableFinder, PaddedWalkability, PathPlanner, PlannerConfig, RoomGeometry,
    RoomGeometryError, WalkabilityField, WalkabilityQuery,
};

/// Everything navigation needs to know about a room, built in one go from a [`RoomGeometry`].
///
/// Immutable once built. Share it with [`Arc`] and replace it wholesale when the geometry changes.
#[derive(Debug)]
pub struct NavSnapshot {
    geometry: Arc<RoomGeometry>,
    walkability: PaddedWalkability,
    graph: NavGraph,
    generation: u64,
}

impl NavSnapshot {
    /// Validates `geometry` and derives walkability, clearance and the navigation graph from it.
    ///
    /// `generation` is an opaque tag that lets holders of old snapshots detect that the room changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry fails [`RoomGeometry::validate`].
    pub fn build(
        geometry: impl Into<Arc<RoomGeometry>>,
        generation: u64,
    ) -> Result<Self, RoomGeometryError> {
        let geometry: Arc<RoomGeometry> = geometry.into();
        geometry.validate()?;

        let field = WalkabilityField::new(&geometry);
        let walkable_cells = field.walkable_count();
        let walkability = PaddedWalkability::new(field);
        let graph = NavGraph::build(&walkability, geometry.rule.padding_cells);
        tracing::debug!(
            "Built navigation generation {generation} for a {}x{} room ({:?}): {walkable_cells} walkable cells, {} navigable with a padding of {}",
            geometry.width,
            geometry.height,
            walkability.field().mode(),
            graph.node_count(),
            graph.padding(),
        );
        if graph.node_count() == 0 {
            tracing::warn!("Room has no navigable cells. Every path request will come back empty.");
        }

        Ok(Self {
            geometry,
            walkability,
            graph,
            generation,
        })
    }

    /// The geometry this snapshot was built from.
    pub fn geometry(&self) -> &Arc<RoomGeometry> {
        &self.geometry
    }

    /// Raw and padded walkability.
    pub fn walkability(&self) -> &PaddedWalkability {
        &self.walkability
    }

    /// The navigation graph.
    pub fn graph(&self) -> &NavGraph {
        &self.graph
    }

    /// The tag passed to [`Self::build`].
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns whether `cell` is walkable without clearance.
    #[inline]
    pub fn is_walkable(&self, cell: IVec2) -> bool {
        self.walkability.is_walkable(cell)
    }

    /// Returns whether `cell` is walkable with `margin` cells of clearance.
    #[inline]
    pub fn is_walkable_with_padding(&self, cell: IVec2, margin: u8) -> bool {
        self.walkability.is_walkable_with_padding(cell, margin)
    }

    /// A finder that prefers cells with the room's padding.
    pub fn nearest_walkable_finder(&self) -> NearestWalkableFinder<'_> {
        NearestWalkableFinder::new(&self.walkability, self.graph.padding())
    }
}

impl WalkabilityQuery for NavSnapshot {
    fn is_walkable_point(&self, point: Vec2) -> bool {
        self.walkability.field().is_walkable_point(point)
    }
}

/// The navigation state of the current room.
///
/// Owns the active [`NavSnapshot`] and a lazily created [`PathPlanner`] over it.
/// Replacing the geometry builds a complete new snapshot before swapping it in,
/// so readers never observe a half-built room.
#[derive(Debug)]
pub struct RoomNavigation {
    snapshot: Arc<NavSnapshot>,
    planner_config: PlannerConfig,
    planner: Option<PathPlanner>,
}

impl RoomNavigation {
    /// Builds the navigation for `geometry`.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry fails [`RoomGeometry::validate`].
    pub fn new(
        geometry: impl Into<Arc<RoomGeometry>>,
        planner_config: PlannerConfig,
    ) -> Result<Self, RoomGeometryError> {
        Ok(Self {
            snapshot: Arc::new(NavSnapshot::build(geometry, 0)?),
            planner_config,
            planner: None,
        })
    }

    /// Rebuilds everything from `geometry` and swaps it in.
    ///
    /// On error, the previous snapshot stays active. Planners handed out earlier keep using the snapshot they were created with.
    ///
    /// # Errors
    ///
    /// Returns an error if the geometry fails [`RoomGeometry::validate`].
    pub fn replace_geometry(
        &mut self,
        geometry: impl Into<Arc<RoomGeometry>>,
    ) -> Result<(), RoomGeometryError> {
        let generation = self.snapshot.generation() + 1;
        let snapshot = NavSnapshot::build(geometry, generation)?;
        self.snapshot = Arc::new(snapshot);
        self.planner = None;
        Ok(())
    }

    /// The active snapshot.
    pub fn snapshot(&self) -> &Arc<NavSnapshot> {
        &self.snapshot
    }

    /// The active geometry.
    pub fn geometry(&self) -> &Arc<RoomGeometry> {
        self.snapshot.geometry()
    }

    /// The configuration new planners are created with.
    pub fn planner_config(&self) -> &PlannerConfig {
        &self.planner_config
    }

    /// Changes the planner configuration. Takes effect with the next planner.
    pub fn set_planner_config(&mut self, planner_config: PlannerConfig) {
        self.planner_config = planner_config;
        self.planner = None;
    }

    /// Returns whether the cell containing `point` is walkable, without clearance.
    pub fn is_walkable(&self, point: Vec2) -> bool {
        self.snapshot.is_walkable_point(point)
    }

    /// The planner for the active snapshot, created on first use.
    pub fn planner(&mut self) -> &PathPlanner {
        let snapshot = &self.snapshot;
        let config = self.planner_config;
        self.planner
            .get_or_insert_with(|| PathPlanner::new(snapshot.clone(), config))
    }

    /// Shorthand for [`PathPlanner::compute_path`] on [`Self::planner`].
    pub fn compute_path(&mut self, from: Vec2, to: Vec2) -> Vec<Vec2> {
        self.planner().compute_path(from, to)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{LumaMask, RoomGeometryBuilder, WalkabilityMode, WalkabilityRule};

    use super::*;

    fn open_room(width: u16, height: u16) -> RoomGeometry {
        RoomGeometryBuilder {
            width,
            height,
            ..Default::default()
        }
        .build()
        .unwrap()
    }

    #[test]
    fn snapshot_uses_the_room_padding() {
        let snapshot = NavSnapshot::build(open_room(20, 20), 7).unwrap();
        assert_eq!(snapshot.generation(), 7);
        assert_eq!(snapshot.walkability().field().mode(), WalkabilityMode::Open);
        assert_eq!(snapshot.graph().padding(), 3);
        assert_eq!(snapshot.graph().node_count(), 14 * 14);
        assert!(snapshot.is_walkable(IVec2::new(0, 0)));
        assert!(!snapshot.is_walkable_with_padding(IVec2::new(0, 0), 3));
        assert!(snapshot.is_walkable_point(Vec2::new(19.9, 0.1)));
        assert!(!snapshot.is_walkable_point(Vec2::new(20.0, 0.1)));
    }

    #[test]
    fn invalid_geometry_is_rejected() {
        let geometry = RoomGeometry {
            width: 0,
            height: 10,
            rule: WalkabilityRule::default(),
            walkable_polygon: None,
            raster_mask: None,
        };
        assert!(matches!(
            NavSnapshot::build(geometry.clone(), 0),
            Err(RoomGeometryError::EmptyRoom { .. })
        ));
        assert!(RoomNavigation::new(geometry, PlannerConfig::default()).is_err());
    }

    #[test]
    fn rebuilds_are_idempotent() {
        let mask = LumaMask::from_fn(30, 20, |x, y| if (x + y) % 9 == 0 { 0.0 } else { 1.0 });
        let geometry = Arc::new(
            RoomGeometryBuilder {
                width: 30,
                height: 20,
                raster_mask: Some(Arc::new(mask)),
                ..Default::default()
            }
            .build()
            .unwrap(),
        );
        let first = NavSnapshot::build(geometry.clone(), 0).unwrap();
        let second = NavSnapshot::build(geometry, 0).unwrap();
        assert_eq!(first.walkability(), second.walkability());
        assert_eq!(first.graph(), second.graph());
    }

    #[test]
    fn replacing_geometry_swaps_everything() {
        let mut navigation = RoomNavigation::new(open_room(40, 40), PlannerConfig::default()).unwrap();
        let old_planner = navigation.planner().clone();
        assert_eq!(navigation.snapshot().generation(), 0);

        // The new room blocks the left half.
        let mask = LumaMask::from_fn(40, 40, |x, _| if x < 20 { 0.0 } else { 1.0 });
        let geometry = RoomGeometryBuilder {
            width: 40,
            height: 40,
            raster_mask: Some(Arc::new(mask)),
            ..Default::default()
        }
        .build()
        .unwrap();
        navigation.replace_geometry(geometry).unwrap();

        assert_eq!(navigation.snapshot().generation(), 1);
        assert!(!navigation.is_walkable(Vec2::new(5.5, 5.5)));
        assert!(!Arc::ptr_eq(navigation.planner().snapshot(), old_planner.snapshot()));
        // The old planner still answers with the old room.
        assert!(old_planner.snapshot().is_walkable_point(Vec2::new(5.5, 5.5)));
    }

    #[test]
    fn failed_replacement_keeps_the_old_room() {
        let mut navigation = RoomNavigation::new(open_room(40, 40), PlannerConfig::default()).unwrap();
        let mut geometry = open_room(40, 40);
        geometry.rule.padding_cells = 200;
        assert!(navigation.replace_geometry(geometry).is_err());
        assert_eq!(navigation.snapshot().generation(), 0);
        assert_eq!(navigation.geometry().rule.padding_cells, 3);
    }

    #[test]
    fn planner_is_reused_until_invalidated() {
        let mut navigation = RoomNavigation::new(open_room(40, 40), PlannerConfig::default()).unwrap();
        let first = navigation.planner().snapshot().clone();
        let second = navigation.planner().snapshot().clone();
        assert!(Arc::ptr_eq(&first, &second));

        navigation.set_planner_config(PlannerConfig {
            turn_threshold: 0.9,
            ..Default::default()
        });
        assert_eq!(navigation.planner().config().turn_threshold, 0.9);
    }

    #[test]
    fn computes_paths_on_the_active_room() {
        let mut navigation = RoomNavigation::new(open_room(40, 40), PlannerConfig::default()).unwrap();
        let target = Vec2::new(30.2, 31.7);
        let path = navigation.compute_path(Vec2::new(5.5, 5.5), target);
        assert_eq!(path.last(), Some(&target));
    }
}
