#![doc = include_str!("../../../readme.md")]

mod erosion;
mod geometry;
mod locomotion;
pub(crate) mod math;
mod nav_graph;
mod nearest;
mod planner;
mod room;
mod walkability;

pub use erosion::PaddedWalkability;
pub use geometry::{
    LumaMask, RasterMask, RgbMask, RoomGeometry, RoomGeometryBuilder, RoomGeometryError,
    WalkabilityRule, luma,
};
pub use locomotion::{LocomotionConfig, LocomotionController, Replanner, TickOutcome};
pub use math::{Facing, cell_center, point_to_cell};
pub use nav_graph::{Connections, NavGraph};
pub use nearest::NearestWalkableFinder;
pub use planner::{PathPlanner, PlannerConfig, simplify_path};
pub use room::{NavSnapshot, RoomNavigation};
pub use walkability::{WalkabilityField, WalkabilityMode, WalkabilityQuery};
