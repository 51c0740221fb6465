use glam::{IVec2, Vec2};

use crate::{
    PaddedWalkability,
    math::{point_to_cell, square_ring},
};

/// Snaps points that are not navigable to the nearest navigable cell with a square spiral search.
#[derive(Debug, Clone, Copy)]
pub struct NearestWalkableFinder<'a> {
    walkability: &'a PaddedWalkability,
    padding: u8,
}

impl<'a> NearestWalkableFinder<'a> {
    /// The search radius used for general clamping. `[Units: cells]`
    pub const DEFAULT_MAX_RADIUS: u16 = 60;
    /// The search radius used for click-to-walk targets, which can land far outside any walkable area. `[Units: cells]`
    pub const CLICK_MAX_RADIUS: u16 = 80;

    /// Creates a finder that prefers cells with `padding` cells of clearance.
    pub fn new(walkability: &'a PaddedWalkability, padding: u8) -> Self {
        Self {
            walkability,
            padding,
        }
    }

    /// Returns the cell containing `point`, clamped into the room.
    pub fn quantize(&self, point: Vec2) -> IVec2 {
        let field = self.walkability.field();
        let max = IVec2::new(field.width() as i32 - 1, field.height() as i32 - 1);
        point_to_cell(point).clamp(IVec2::ZERO, max.max(IVec2::ZERO))
    }

    /// Finds the closest cell to `point` that is walkable with padding, falling back to unpadded walkability.
    ///
    /// The point is first quantized and clamped into the room. Rings up to Chebyshev distance `max_radius`
    /// are then visited in a fixed order, so the first hit is reproducible.
    /// Returns `None` if no walkable cell exists within the radius, even without padding.
    pub fn find_nearest_walkable(&self, point: Vec2, max_radius: u16) -> Option<IVec2> {
        self.find_nearest_cell(self.quantize(point), max_radius)
    }

    /// Like [`Self::find_nearest_walkable`], but starts from a cell. Cells outside the room are clamped into it first.
    pub fn find_nearest_cell(&self, cell: IVec2, max_radius: u16) -> Option<IVec2> {
        let field = self.walkability.field();
        let max = IVec2::new(field.width() as i32 - 1, field.height() as i32 - 1);
        let origin = cell.clamp(IVec2::ZERO, max.max(IVec2::ZERO));

        let padded = |cell: IVec2| self.walkability.is_walkable_with_padding(cell, self.padding);
        let unpadded = |cell: IVec2| self.walkability.is_walkable(cell);

        self.spiral(origin, max_radius, padded)
            .or_else(|| self.spiral(origin, max_radius, unpadded))
    }

    /// Returns the nearest walkable cell, or the cell containing `point` if the search is exhausted.
    ///
    /// The fallback is not clamped into the room, so it may lie outside it.
    ///
    /// Callers must treat an unwalkable result as "could not resolve" and abort the requested motion.
    pub fn clamp_to_nearest_walkable(&self, point: Vec2, max_radius: u16) -> IVec2 {
        self.find_nearest_walkable(point, max_radius).unwrap_or_else(|| {
            tracing::debug!("No walkable cell within {max_radius} cells of {point}");
            point_to_cell(point)
        })
    }

    fn spiral(
        &self,
        origin: IVec2,
        max_radius: u16,
        accept: impl Fn(IVec2) -> bool,
    ) -> Option<IVec2> {
        let field = self.walkability.field();
        (0..=max_radius as i32)
            .flat_map(|radius| square_ring(origin, radius))
            .find(|cell| field.contains(*cell) && accept(*cell))
    }
}
