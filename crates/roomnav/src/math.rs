use std::f32::consts::FRAC_PI_4;

#[cfg(feature = "bevy_reflect")]
use bevy_reflect::prelude::*;
use glam::{IVec2, Vec2};

/// Gets the standard width (x-axis) offset for the specified direction.
/// # Arguments
/// - `direction`: The direction. [Limits: 0 <= value < 4]
/// # Returns
///
/// The width offset to apply to the current cell position to move in the direction.
pub(crate) fn dir_offset_x(direction: u8) -> i32 {
    const OFFSET: [i32; 4] = [-1, 0, 1, 0];
    OFFSET[direction as usize & 0x03]
}

/// Gets the standard height (y-axis) offset for the specified direction.
/// # Arguments
/// - `direction`: The direction. [Limits: 0 <= value < 4]
/// # Returns
///
/// The height offset to apply to the current cell position to move in the direction.
/// Base coordinates grow downwards, so `1` points south.
pub(crate) fn dir_offset_y(direction: u8) -> i32 {
    const OFFSET: [i32; 4] = [0, 1, 0, -1];
    OFFSET[direction as usize & 0x03]
}

/// Returns the cell containing `point`.
///
/// Negative coordinates map to negative cells, which are never walkable.
#[inline]
pub fn point_to_cell(point: Vec2) -> IVec2 {
    point.floor().as_ivec2()
}

/// Returns the center of `cell` in base coordinates, i.e. `(x + 0.5, y + 0.5)`.
#[inline]
pub fn cell_center(cell: IVec2) -> Vec2 {
    cell.as_vec2() + Vec2::splat(0.5)
}

/// Iterates the `8 * radius` cells forming the square ring at Chebyshev distance `radius` around `center`.
///
/// The order is fixed: top edge left to right, right edge top to bottom,
/// bottom edge right to left, left edge bottom to top.
/// A radius of zero yields only `center`.
pub(crate) fn square_ring(center: IVec2, radius: i32) -> impl Iterator<Item = IVec2> {
    let r = radius;
    let top = (-r..=r).map(move |dx| center + IVec2::new(dx, -r));
    let right = (-r + 1..=r).map(move |dy| center + IVec2::new(r, dy));
    let bottom = (-r..=r - 1).rev().map(move |dx| center + IVec2::new(dx, r));
    let left = (-r + 1..=r - 1).rev().map(move |dy| center + IVec2::new(-r, dy));
    top.chain(right).chain(bottom).chain(left)
}

/// One of the eight compass directions a character sprite can face.
///
/// Base coordinates grow downwards, so [`Facing::South`] is `+y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(
    all(feature = "serialize", feature = "bevy_reflect"),
    reflect(Serialize, Deserialize)
)]
pub enum Facing {
    /// `+x`
    East,
    /// `+x, +y`
    SouthEast,
    /// `+y`
    #[default]
    South,
    /// `-x, +y`
    SouthWest,
    /// `-x`
    West,
    /// `-x, -y`
    NorthWest,
    /// `-y`
    North,
    /// `+x, -y`
    NorthEast,
}

impl Facing {
    /// All facings in bucket order, starting east and turning clockwise on screen.
    pub const ALL: [Facing; 8] = [
        Facing::East,
        Facing::SouthEast,
        Facing::South,
        Facing::SouthWest,
        Facing::West,
        Facing::NorthWest,
        Facing::North,
        Facing::NorthEast,
    ];

    /// Buckets a direction into one of the eight facings. Each bucket spans 45° centered on its axis.
    /// Returns `None` for a zero or non-finite direction.
    pub fn from_direction(direction: Vec2) -> Option<Self> {
        if !direction.is_finite() || direction.length_squared() <= f32::EPSILON {
            return None;
        }
        let angle = direction.y.atan2(direction.x);
        let bucket = ((angle / FRAC_PI_4).round() as i32).rem_euclid(8);
        Some(Self::ALL[bucket as usize])
    }

    /// The bucket index of this facing. [Limits: 0 <= value < 8]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// The number of 45° steps between two facings, going the short way round. [Limits: 0 <= value <= 4]
    pub fn steps_to(self, other: Facing) -> u8 {
        let diff = (self.index() as i8 - other.index() as i8).rem_euclid(8) as u8;
        diff.min(8 - diff)
    }

    /// The unit vector this facing points along.
    pub fn to_vec2(self) -> Vec2 {
        Vec2::from_angle(self.index() as f32 * FRAC_PI_4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_has_eight_r_cells_in_fixed_order() {
        let ring: Vec<_> = square_ring(IVec2::new(5, 5), 1).collect();
        assert_eq!(
            ring,
            vec![
                IVec2::new(4, 4),
                IVec2::new(5, 4),
                IVec2::new(6, 4),
                IVec2::new(6, 5),
                IVec2::new(6, 6),
                IVec2::new(5, 6),
                IVec2::new(4, 6),
                IVec2::new(4, 5),
            ]
        );
        for radius in 1..6 {
            let ring: Vec<_> = square_ring(IVec2::ZERO, radius).collect();
            assert_eq!(ring.len(), 8 * radius as usize);
            assert!(
                ring.iter()
                    .all(|cell| cell.x.abs().max(cell.y.abs()) == radius)
            );
        }
    }

    #[test]
    fn ring_of_radius_zero_is_center() {
        let ring: Vec<_> = square_ring(IVec2::new(3, 7), 0).collect();
        assert_eq!(ring, vec![IVec2::new(3, 7)]);
    }

    #[test]
    fn quantizes_points_to_cells() {
        assert_eq!(point_to_cell(Vec2::new(5.9, 0.1)), IVec2::new(5, 0));
        assert_eq!(point_to_cell(Vec2::new(-0.1, 2.0)), IVec2::new(-1, 2));
        assert_eq!(cell_center(IVec2::new(2, 3)), Vec2::new(2.5, 3.5));
    }

    #[test]
    fn buckets_directions() {
        assert_eq!(Facing::from_direction(Vec2::X), Some(Facing::East));
        assert_eq!(Facing::from_direction(Vec2::Y), Some(Facing::South));
        assert_eq!(Facing::from_direction(-Vec2::Y), Some(Facing::North));
        assert_eq!(Facing::from_direction(-Vec2::X), Some(Facing::West));
        assert_eq!(
            Facing::from_direction(Vec2::new(1.0, 1.0)),
            Some(Facing::SouthEast)
        );
        assert_eq!(
            Facing::from_direction(Vec2::new(1.0, -1.0)),
            Some(Facing::NorthEast)
        );
        // 20° below the x-axis is still east.
        assert_eq!(
            Facing::from_direction(Vec2::from_angle(20_f32.to_radians())),
            Some(Facing::East)
        );
        assert_eq!(Facing::from_direction(Vec2::ZERO), None);
    }

    #[test]
    fn counts_steps_the_short_way() {
        assert_eq!(Facing::East.steps_to(Facing::East), 0);
        assert_eq!(Facing::East.steps_to(Facing::NorthEast), 1);
        assert_eq!(Facing::NorthEast.steps_to(Facing::SouthEast), 2);
        assert_eq!(Facing::East.steps_to(Facing::West), 4);
    }
}
