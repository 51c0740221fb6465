use glam::IVec2;

use crate::WalkabilityField;

/// A [`WalkabilityField`] eroded by a clearance margin, used for navigation decisions.
///
/// Stores, for every cell, the Chebyshev distance to the nearest unwalkable cell,
/// where everything outside the room counts as unwalkable.
/// Raw walkability is still available through [`Self::is_walkable`] for tight checks
/// like "is the clicked pixel itself walkable", where padding would be too conservative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddedWalkability {
    field: WalkabilityField,
    /// Distance to the closest blocked cell, saturating at `u8::MAX`. Zero for unwalkable cells.
    clearance: Vec<u8>,
}

impl PaddedWalkability {
    /// Computes the clearance of every cell in `field`.
    pub fn new(field: WalkabilityField) -> Self {
        let width = field.width() as i32;
        let height = field.height() as i32;
        let mut clearance = vec![u8::MAX; width as usize * height as usize];

        // Mark blocked cells.
        for z in 0..height {
            for x in 0..width {
                let cell = IVec2::new(x, z);
                if !field.is_walkable(cell) {
                    clearance[field.cell_index(cell)] = 0;
                }
            }
        }

        let distance_at = |clearance: &[u8], cell: IVec2| {
            if field.contains(cell) {
                clearance[field.cell_index(cell)]
            } else {
                // The room boundary blocks like a wall.
                0
            }
        };

        // Pass 1: propagate from the top-left.
        for z in 0..height {
            for x in 0..width {
                let cell = IVec2::new(x, z);
                let index = field.cell_index(cell);
                if clearance[index] == 0 {
                    continue;
                }
                let nearest = [
                    IVec2::new(-1, 0),
                    IVec2::new(-1, -1),
                    IVec2::new(0, -1),
                    IVec2::new(1, -1),
                ]
                .into_iter()
                .map(|offset| distance_at(&clearance, cell + offset))
                .min()
                .unwrap_or(u8::MAX);
                clearance[index] = clearance[index].min(nearest.saturating_add(1));
            }
        }

        // Pass 2: propagate from the bottom-right.
        for z in (0..height).rev() {
            for x in (0..width).rev() {
                let cell = IVec2::new(x, z);
                let index = field.cell_index(cell);
                if clearance[index] == 0 {
                    continue;
                }
                let nearest = [
                    IVec2::new(1, 0),
                    IVec2::new(1, 1),
                    IVec2::new(0, 1),
                    IVec2::new(-1, 1),
                ]
                .into_iter()
                .map(|offset| distance_at(&clearance, cell + offset))
                .min()
                .unwrap_or(u8::MAX);
                clearance[index] = clearance[index].min(nearest.saturating_add(1));
            }
        }

        Self { field, clearance }
    }

    /// The unpadded field this was eroded from.
    #[inline]
    pub fn field(&self) -> &WalkabilityField {
        &self.field
    }

    /// Returns whether `cell` is walkable without any clearance requirement.
    #[inline]
    pub fn is_walkable(&self, cell: IVec2) -> bool {
        self.field.is_walkable(cell)
    }

    /// The Chebyshev distance from `cell` to the closest unwalkable or out-of-room cell.
    /// Zero for unwalkable and out-of-room cells, saturating at `u8::MAX`.
    #[inline]
    pub fn clearance(&self, cell: IVec2) -> u8 {
        if self.field.contains(cell) {
            self.clearance[self.field.cell_index(cell)]
        } else {
            0
        }
    }

    /// Returns whether `cell` and every cell within Chebyshev distance `margin` (diagonals included) is walkable.
    ///
    /// Margin cells outside the room make the result `false`. A margin of zero is [`Self::is_walkable`].
    #[inline]
    pub fn is_walkable_with_padding(&self, cell: IVec2, margin: u8) -> bool {
        self.clearance(cell) > margin
    }
}
