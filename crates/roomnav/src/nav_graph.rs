//! The navigation graph: a 4-connected, uniform-cost grid over the navigable cells of a room.

use std::collections::VecDeque;

use bitflags::bitflags;
use glam::{IVec2, Vec2};

use crate::{
    PaddedWalkability,
    math::{cell_center, dir_offset_x, dir_offset_y},
};

bitflags! {
    /// The neighbors a navigable cell is connected to. Bit `n` corresponds to direction `n`
    /// of the standard direction offsets: west, south, east, north.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Connections: u8 {
        /// Connected to the cell at `x - 1`.
        const WEST = 1 << 0;
        /// Connected to the cell at `y + 1`.
        const SOUTH = 1 << 1;
        /// Connected to the cell at `x + 1`.
        const EAST = 1 << 2;
        /// Connected to the cell at `y - 1`.
        const NORTH = 1 << 3;
    }
}

impl Connections {
    /// The flag for direction `direction`. [Limits: 0 <= value < 4]
    #[inline]
    pub fn from_direction(direction: u8) -> Self {
        Self::from_bits_truncate(1 << (direction & 0x03))
    }
}

/// The set of navigable cells of a room and their 4-neighbor adjacency.
///
/// Built in full from a [`PaddedWalkability`]; there are no incremental updates.
/// Adjacency is symmetric and every edge has weight 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavGraph {
    /// The width of the graph along the x-axis in cells
    width: u16,
    /// The height of the graph along the y-axis in cells
    height: u16,
    /// The clearance margin the graph was built with
    padding: u8,
    /// Connections of each cell in `width * height` order. `None` if the cell is not in the graph.
    cells: Vec<Option<Connections>>,
    /// The number of cells in the graph
    node_count: usize,
}

impl NavGraph {
    const UNVISITED: u32 = u32::MAX;

    /// Builds the graph from every cell that is walkable with `padding` cells of clearance.
    pub fn build(walkability: &PaddedWalkability, padding: u8) -> Self {
        let width = walkability.field().width();
        let height = walkability.field().height();
        let kept = |cell: IVec2| walkability.is_walkable_with_padding(cell, padding);

        let mut cells = vec![None; width as usize * height as usize];
        let mut node_count = 0;
        for z in 0..height as i32 {
            for x in 0..width as i32 {
                let cell = IVec2::new(x, z);
                if !kept(cell) {
                    continue;
                }
                let mut connections = Connections::empty();
                for dir in 0..4_u8 {
                    let neighbor = cell + IVec2::new(dir_offset_x(dir), dir_offset_y(dir));
                    if kept(neighbor) {
                        connections |= Connections::from_direction(dir);
                    }
                }
                cells[x as usize + z as usize * width as usize] = Some(connections);
                node_count += 1;
            }
        }

        Self {
            width,
            height,
            padding,
            cells,
            node_count,
        }
    }

    /// The width of the graph along the x-axis in cells.
    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// The height of the graph along the y-axis in cells.
    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// The clearance margin the graph was built with.
    #[inline]
    pub fn padding(&self) -> u8 {
        self.padding
    }

    /// The number of navigable cells.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    #[inline]
    fn index(&self, cell: IVec2) -> Option<usize> {
        let in_bounds = cell.x >= 0
            && cell.x < self.width as i32
            && cell.y >= 0
            && cell.y < self.height as i32;
        in_bounds.then(|| cell.x as usize + cell.y as usize * self.width as usize)
    }

    /// Returns the neighbors of `cell`. `None` if the cell is not in the graph.
    #[inline]
    pub fn connections(&self, cell: IVec2) -> Option<Connections> {
        self.index(cell).and_then(|index| self.cells[index])
    }

    /// Returns whether `cell` is a node of the graph.
    #[inline]
    pub fn has_cell(&self, cell: IVec2) -> bool {
        self.connections(cell).is_some()
    }

    /// Finds a path with the minimal number of cells from `start` to `end` using breadth-first search.
    ///
    /// Returns the centers of the visited cells, both endpoints included,
    /// or an empty list if either cell is not in the graph or `end` is unreachable.
    /// Neighbors are expanded in a fixed order, so the same query on the same graph always returns the same path.
    pub fn shortest_path(&self, start: IVec2, end: IVec2) -> Vec<Vec2> {
        let (Some(start_index), Some(end_index)) = (self.index(start), self.index(end)) else {
            return Vec::new();
        };
        if !self.has_cell(start) || !self.has_cell(end) {
            return Vec::new();
        }
        if start == end {
            return vec![cell_center(start)];
        }

        // came_from[cell] = index of the cell we reached it from.
        let mut came_from = vec![Self::UNVISITED; self.cells.len()];
        came_from[start_index] = start_index as u32;
        let mut open = VecDeque::from([start]);

        while let Some(current) = open.pop_front() {
            let current_index = current.x as usize + current.y as usize * self.width as usize;
            if current_index == end_index {
                return self.reconstruct_path(&came_from, start_index, end_index);
            }
            let Some(connections) = self.cells[current_index] else {
                continue;
            };
            for dir in 0..4_u8 {
                if !connections.contains(Connections::from_direction(dir)) {
                    continue;
                }
                let neighbor = current + IVec2::new(dir_offset_x(dir), dir_offset_y(dir));
                let neighbor_index =
                    neighbor.x as usize + neighbor.y as usize * self.width as usize;
                if came_from[neighbor_index] != Self::UNVISITED {
                    continue;
                }
                came_from[neighbor_index] = current_index as u32;
                open.push_back(neighbor);
            }
        }

        // No path found.
        Vec::new()
    }

    fn reconstruct_path(&self, came_from: &[u32], start_index: usize, end_index: usize) -> Vec<Vec2> {
        let mut path = Vec::new();
        let mut index = end_index;
        loop {
            let cell = IVec2::new(
                (index % self.width as usize) as i32,
                (index / self.width as usize) as i32,
            );
            path.push(cell_center(cell));
            if index == start_index {
                break;
            }
            index = came_from[index] as usize;
        }
        path.reverse();
        path
    }
}
