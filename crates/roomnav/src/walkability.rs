//! Per-cell walkability, derived from a [`RoomGeometry`].

use glam::{IVec2, UVec2, Vec2};

use crate::{
    RasterMask, RoomGeometry, WalkabilityRule,
    math::{cell_center, point_to_cell},
};

/// Which source of a [`RoomGeometry`] decides walkability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalkabilityMode {
    /// The walkable polygon is authoritative.
    Polygon,
    /// The raster mask is sampled per cell.
    Raster,
    /// Neither source is present, so every cell of the room is walkable.
    Open,
}

impl RoomGeometry {
    /// Returns the source that decides walkability. The polygon takes precedence over the raster mask.
    pub fn mode(&self) -> WalkabilityMode {
        if self.walkable_polygon.is_some() {
            WalkabilityMode::Polygon
        } else if self.raster_mask.is_some() {
            WalkabilityMode::Raster
        } else {
            WalkabilityMode::Open
        }
    }
}

/// Answers whether a point in base coordinates can be stood on.
///
/// Implemented by [`WalkabilityField`], [`NavSnapshot`](crate::NavSnapshot) and any `Fn(Vec2) -> bool`.
pub trait WalkabilityQuery {
    /// Returns whether the cell containing `point` is walkable. Points outside the room are never walkable.
    fn is_walkable_point(&self, point: Vec2) -> bool;
}

impl<F> WalkabilityQuery for F
where
    F: Fn(Vec2) -> bool,
{
    fn is_walkable_point(&self, point: Vec2) -> bool {
        self(point)
    }
}

/// The unpadded walkable set of a room, one flag per cell in `width * height` order.
///
/// Dilation from [`WalkabilityRule::expand_pixels`] is already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkabilityField {
    /// The width of the field along the x-axis in cells
    width: u16,
    /// The height of the field along the y-axis in cells
    height: u16,
    /// The source the field was built from
    mode: WalkabilityMode,
    /// Whether each cell is walkable
    walkable: Vec<bool>,
}

impl WalkabilityField {
    /// Evaluates the walkability of every cell of `geometry`.
    ///
    /// The geometry is expected to be valid, see [`RoomGeometry::validate`].
    pub fn new(geometry: &RoomGeometry) -> Self {
        let width = geometry.width;
        let height = geometry.height;
        let mode = geometry.mode();
        let mut walkable = vec![false; width as usize * height as usize];

        match mode {
            WalkabilityMode::Polygon => {
                let polygon = geometry.walkable_polygon.as_deref().unwrap_or_default();
                for y in 0..height {
                    for x in 0..width {
                        let center = cell_center(IVec2::new(x as i32, y as i32));
                        walkable[x as usize + y as usize * width as usize] =
                            point_in_polygon(center, polygon);
                    }
                }
            }
            WalkabilityMode::Raster => {
                if let Some(mask) = geometry.raster_mask.as_deref() {
                    let room_size = geometry.size();
                    for y in 0..height {
                        for x in 0..width {
                            walkable[x as usize + y as usize * width as usize] = sample_raster(
                                mask,
                                &geometry.rule,
                                UVec2::new(x as u32, y as u32),
                                room_size,
                            );
                        }
                    }
                }
                if geometry.rule.expand_pixels > 0 {
                    walkable = dilate(&walkable, width, height, geometry.rule.expand_pixels);
                }
            }
            WalkabilityMode::Open => walkable.fill(true),
        }

        Self {
            width,
            height,
            mode,
            walkable,
        }
    }

    /// The width of the field along the x-axis in cells.
    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// The height of the field along the y-axis in cells.
    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// The source the field was built from.
    #[inline]
    pub fn mode(&self) -> WalkabilityMode {
        self.mode
    }

    /// Returns whether `cell` lies inside the room.
    #[inline]
    pub fn contains(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.x < self.width as i32 && cell.y >= 0 && cell.y < self.height as i32
    }

    #[inline]
    pub(crate) fn cell_index(&self, cell: IVec2) -> usize {
        cell.x as usize + cell.y as usize * self.width as usize
    }

    /// Returns whether `cell` is walkable. Cells outside the room are never walkable.
    #[inline]
    pub fn is_walkable(&self, cell: IVec2) -> bool {
        self.contains(cell) && self.walkable[self.cell_index(cell)]
    }

    /// Returns whether the cell containing `point` is walkable.
    #[inline]
    pub fn is_walkable_point(&self, point: Vec2) -> bool {
        self.is_walkable(point_to_cell(point))
    }

    /// The number of walkable cells.
    pub fn walkable_count(&self) -> usize {
        self.walkable.iter().filter(|walkable| **walkable).count()
    }
}

impl WalkabilityQuery for WalkabilityField {
    fn is_walkable_point(&self, point: Vec2) -> bool {
        WalkabilityField::is_walkable_point(self, point)
    }
}

/// Even-odd ray casting. Uses the half-open convention `(yi > py) != (yj > py)`,
/// so a point exactly on a horizontal boundary belongs to the polygon above it only if it is inside the span below.
fn point_in_polygon(point: Vec2, vertices: &[Vec2]) -> bool {
    let Some(last) = vertices.len().checked_sub(1) else {
        return false;
    };
    let mut inside = false;
    let mut j = last;
    for i in 0..vertices.len() {
        let vi = vertices[i];
        let vj = vertices[j];
        if ((vi.y > point.y) != (vj.y > point.y))
            && (point.x < (vj.x - vi.x) * (point.y - vi.y) / (vj.y - vi.y) + vi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Samples the mask pixel covering `cell`, scaling room cells into mask pixels.
fn sample_raster(
    mask: &dyn RasterMask,
    rule: &WalkabilityRule,
    cell: UVec2,
    room_size: UVec2,
) -> bool {
    let mask_size = mask.size();
    if mask_size.x == 0 || mask_size.y == 0 {
        return false;
    }
    let scale = |cell: u32, room_len: u32, mask_len: u32| {
        let scaled = cell as u64 * mask_len as u64 / room_len.max(1) as u64;
        scaled.min(mask_len as u64 - 1) as u32
    };
    let mask_x = scale(cell.x, room_size.x, mask_size.x);
    let mask_y = scale(cell.y, room_size.y, mask_size.y);
    rule.accepts(mask.sample_luminance(mask_x, mask_y))
}

/// Grows the walkable set by `radius` cells in Chebyshev distance.
/// A square neighborhood is separable, so this runs one pass along each axis.
fn dilate(walkable: &[bool], width: u16, height: u16, radius: u8) -> Vec<bool> {
    let width = width as usize;
    let height = height as usize;
    let radius = radius as usize;

    let mut horizontal = vec![false; walkable.len()];
    for y in 0..height {
        let row = &walkable[y * width..(y + 1) * width];
        for x in 0..width {
            let min = x.saturating_sub(radius);
            let max = (x + radius).min(width - 1);
            horizontal[x + y * width] = row[min..=max].iter().any(|walkable| *walkable);
        }
    }

    let mut dilated = vec![false; walkable.len()];
    for y in 0..height {
        let min = y.saturating_sub(radius);
        let max = (y + radius).min(height - 1);
        for x in 0..width {
            dilated[x + y * width] = (min..=max).any(|z| horizontal[x + z * width]);
        }
    }
    dilated
}
