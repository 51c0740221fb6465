//! The geometry module contains the description of a room that walkability is derived from.
//!
//! A [`RoomGeometry`] is produced by the room loader (or an editor) and treated as an immutable snapshot:
//! edits replace it wholesale, see [`RoomNavigation::replace_geometry`](crate::RoomNavigation::replace_geometry).

use std::{fmt::Debug, sync::Arc};

#[cfg(feature = "bevy_reflect")]
use bevy_reflect::prelude::*;
use glam::{UVec2, Vec2, Vec3};
use thiserror::Error;

/// The rule deciding which cells of a room are walkable and how much clearance navigation keeps from walls.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "bevy_reflect", derive(Reflect))]
#[cfg_attr(
    all(feature = "serialize", feature = "bevy_reflect"),
    reflect(Serialize, Deserialize)
)]
pub struct WalkabilityRule {
    /// Minimum mask luminance that counts as walkable. `[Limit: 0 <= value <= 1]`
    ///
    /// Only used in raster mode.
    pub luma_threshold: f32,

    /// Inverts the raster test, so that dark pixels are walkable instead of bright ones.
    pub invert: bool,

    /// Dilates the raster walkable area by this many cells. `[Limit: 0 <= value <= 5] [Units: cells]`
    ///
    /// A cell becomes walkable if any cell within this Chebyshev distance is walkable.
    /// This patches thin or broken lines in hand-drawn masks, but moves gameplay-visible boundaries,
    /// so it is never applied implicitly. Ignored in polygon mode.
    pub expand_pixels: u8,

    /// The clearance navigation keeps from unwalkable cells. `[Limit: 0 <= value <= 10] [Units: cells]`
    ///
    /// A cell is navigable only if every cell within this Chebyshev distance is walkable and inside the room.
    pub padding_cells: u8,
}

impl WalkabilityRule {
    /// Upper limit for [`Self::expand_pixels`].
    pub const MAX_EXPAND_PIXELS: u8 = 5;
    /// Upper limit for [`Self::padding_cells`].
    pub const MAX_PADDING_CELLS: u8 = 10;

    /// Returns whether a sample with the given luminance is walkable under this rule.
    #[inline]
    pub fn accepts(&self, luminance: f32) -> bool {
        (luminance >= self.luma_threshold) != self.invert
    }
}

impl Default for WalkabilityRule {
    fn default() -> Self {
        Self {
            luma_threshold: 0.5,
            invert: false,
            expand_pixels: 0,
            padding_cells: 3,
        }
    }
}

/// A luminance source sampled to decide raster walkability, usually a decoded mask image.
///
/// Coordinates are in mask pixels, `0 <= x < size().x` and `0 <= y < size().y`.
/// The mask may have a different resolution than the room; [`WalkabilityField`](crate::WalkabilityField) maps between them.
pub trait RasterMask: Debug + Send + Sync {
    /// The size of the mask in pixels.
    fn size(&self) -> UVec2;

    /// Returns the luminance of the pixel at `(x, y)`. `[Limit: 0 <= value <= 1]`
    fn sample_luminance(&self, x: u32, y: u32) -> f32;
}

/// Converts a normalized RGB color into luminance using the broadcast video weights `0.299 R + 0.587 G + 0.114 B`.
#[inline]
pub fn luma(rgb: Vec3) -> f32 {
    rgb.dot(Vec3::new(0.299, 0.587, 0.114))
}

/// A mask that stores one pre-computed luminance value per pixel in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct LumaMask {
    size: UVec2,
    luminance: Vec<f32>,
}

impl LumaMask {
    /// Creates a mask from row-major luminance values.
    pub fn new(width: u32, height: u32, luminance: Vec<f32>) -> Result<Self, RoomGeometryError> {
        let expected = width as usize * height as usize;
        if luminance.len() != expected {
            return Err(RoomGeometryError::MaskDataLength {
                expected,
                actual: luminance.len(),
            });
        }
        Ok(Self {
            size: UVec2::new(width, height),
            luminance,
        })
    }

    /// Creates a mask by evaluating `f` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f32) -> Self {
        let mut luminance = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                luminance.push(f(x, y));
            }
        }
        Self {
            size: UVec2::new(width, height),
            luminance,
        }
    }

    /// Creates a mask where every pixel has the same luminance.
    pub fn uniform(width: u32, height: u32, luminance: f32) -> Self {
        Self::from_fn(width, height, |_, _| luminance)
    }
}

impl RasterMask for LumaMask {
    fn size(&self) -> UVec2 {
        self.size
    }

    fn sample_luminance(&self, x: u32, y: u32) -> f32 {
        self.luminance[x as usize + y as usize * self.size.x as usize]
    }
}

/// A mask backed by 8-bit RGB pixels, converted with [`luma`] when sampled.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbMask {
    size: UVec2,
    pixels: Vec<[u8; 3]>,
}

impl RgbMask {
    /// Creates a mask from row-major RGB pixels.
    pub fn new(width: u32, height: u32, pixels: Vec<[u8; 3]>) -> Result<Self, RoomGeometryError> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(RoomGeometryError::MaskDataLength {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            size: UVec2::new(width, height),
            pixels,
        })
    }

    /// Creates a mask from tightly packed RGBA8 bytes, as produced by most image decoders. Alpha is ignored.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Result<Self, RoomGeometryError> {
        let expected = width as usize * height as usize * 4;
        if bytes.len() != expected {
            return Err(RoomGeometryError::MaskDataLength {
                expected,
                actual: bytes.len(),
            });
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|rgba| [rgba[0], rgba[1], rgba[2]])
            .collect();
        Self::new(width, height, pixels)
    }
}

impl RasterMask for RgbMask {
    fn size(&self) -> UVec2 {
        self.size
    }

    fn sample_luminance(&self, x: u32, y: u32) -> f32 {
        let [r, g, b] = self.pixels[x as usize + y as usize * self.size.x as usize];
        luma(Vec3::new(r as f32, g as f32, b as f32) / 255.0)
    }
}

/// The room description walkability is derived from.
///
/// Exactly one source determines walkability: the polygon if present, otherwise the raster mask.
/// A room with neither is open floor, i.e. walkable everywhere.
/// Build with [`RoomGeometryBuilder`], or deserialize and call [`RoomGeometry::validate`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct RoomGeometry {
    /// The width of the room along the x-axis. `[Limit: > 0] [Units: cells]`
    pub width: u16,
    /// The height of the room along the y-axis. `[Limit: > 0] [Units: cells]`
    pub height: u16,
    /// How walkability is decided and how much clearance navigation keeps.
    pub rule: WalkabilityRule,
    /// A simple, single-contour polygon in base coordinates. `[Limit: >= 3 vertices]`
    ///
    /// When present, it is authoritative and the raster mask is ignored.
    pub walkable_polygon: Option<Vec<Vec2>>,
    /// A luminance mask covering the room, proportionally mapped if its size differs from the room's.
    ///
    /// Masks are image data owned by the loader and are never serialized.
    #[cfg_attr(feature = "serialize", serde(skip))]
    pub raster_mask: Option<Arc<dyn RasterMask>>,
}

impl RoomGeometry {
    /// Checks the construction-time preconditions of the geometry.
    pub fn validate(&self) -> Result<(), RoomGeometryError> {
        if self.width == 0 || self.height == 0 {
            return Err(RoomGeometryError::EmptyRoom {
                width: self.width,
                height: self.height,
            });
        }
        let threshold = self.rule.luma_threshold;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(RoomGeometryError::LumaThresholdOutOfRange { threshold });
        }
        if self.rule.expand_pixels > WalkabilityRule::MAX_EXPAND_PIXELS {
            return Err(RoomGeometryError::ExpandPixelsOutOfRange {
                expand_pixels: self.rule.expand_pixels,
            });
        }
        if self.rule.padding_cells > WalkabilityRule::MAX_PADDING_CELLS {
            return Err(RoomGeometryError::PaddingOutOfRange {
                padding_cells: self.rule.padding_cells,
            });
        }
        if let Some(polygon) = &self.walkable_polygon {
            if polygon.len() < 3 {
                return Err(RoomGeometryError::DegeneratePolygon {
                    vertex_count: polygon.len(),
                });
            }
            if let Some(index) = polygon.iter().position(|vertex| !vertex.is_finite()) {
                return Err(RoomGeometryError::NonFinitePolygonVertex { index });
            }
        }
        if let Some(mask) = &self.raster_mask {
            let size = mask.size();
            if size.x == 0 || size.y == 0 {
                return Err(RoomGeometryError::EmptyRasterMask {
                    width: size.x,
                    height: size.y,
                });
            }
        }
        Ok(())
    }

    /// The room size in cells.
    #[inline]
    pub fn size(&self) -> UVec2 {
        UVec2::new(self.width as u32, self.height as u32)
    }
}

/// A builder for [`RoomGeometry`]s.
#[derive(Debug, Clone, Default)]
pub struct RoomGeometryBuilder {
    /// The width of the room along the x-axis in cells
    pub width: u16,
    /// The height of the room along the y-axis in cells
    pub height: u16,
    /// The walkability rule
    pub rule: WalkabilityRule,
    /// The optional walkable polygon
    pub walkable_polygon: Option<Vec<Vec2>>,
    /// The optional raster mask
    pub raster_mask: Option<Arc<dyn RasterMask>>,
}

impl RoomGeometryBuilder {
    /// Builds the geometry.
    ///
    /// # Errors
    ///
    /// Returns an error if the room is empty, the rule is out of range, or the polygon or mask is degenerate.
    pub fn build(self) -> Result<RoomGeometry, RoomGeometryError> {
        let geometry = RoomGeometry {
            width: self.width,
            height: self.height,
            rule: self.rule,
            walkable_polygon: self.walkable_polygon,
            raster_mask: self.raster_mask,
        };
        geometry.validate()?;
        if geometry.walkable_polygon.is_some() && geometry.raster_mask.is_some() {
            tracing::warn!("Room geometry has both a walkable polygon and a raster mask. The raster mask is ignored.");
        }
        Ok(geometry)
    }
}

/// Errors that can occur when building or validating a [`RoomGeometry`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RoomGeometryError {
    /// Happens when the room has no cells.
    #[error("Room must have a positive size, got {width}x{height}")]
    EmptyRoom {
        /// The width of the room
        width: u16,
        /// The height of the room
        height: u16,
    },
    /// Happens when the luma threshold is not a number in `[0, 1]`.
    #[error("Luma threshold must be within [0, 1], got {threshold}")]
    LumaThresholdOutOfRange {
        /// The offending threshold
        threshold: f32,
    },
    /// Happens when the dilation is above [`WalkabilityRule::MAX_EXPAND_PIXELS`].
    #[error("Expand pixels must be at most {max}, got {expand_pixels}", max = WalkabilityRule::MAX_EXPAND_PIXELS)]
    ExpandPixelsOutOfRange {
        /// The offending dilation
        expand_pixels: u8,
    },
    /// Happens when the padding is above [`WalkabilityRule::MAX_PADDING_CELLS`].
    #[error("Padding must be at most {max} cells, got {padding_cells}", max = WalkabilityRule::MAX_PADDING_CELLS)]
    PaddingOutOfRange {
        /// The offending padding
        padding_cells: u8,
    },
    /// Happens when the walkable polygon has fewer than 3 vertices.
    #[error("Walkable polygon needs at least 3 vertices, got {vertex_count}")]
    DegeneratePolygon {
        /// The number of vertices in the polygon
        vertex_count: usize,
    },
    /// Happens when a polygon vertex is NaN or infinite.
    #[error("Walkable polygon vertex {index} is not finite")]
    NonFinitePolygonVertex {
        /// The index of the offending vertex
        index: usize,
    },
    /// Happens when the raster mask has no pixels.
    #[error("Raster mask must have a positive size, got {width}x{height}")]
    EmptyRasterMask {
        /// The width of the mask in pixels
        width: u32,
        /// The height of the mask in pixels
        height: u32,
    },
    /// Happens when mask pixel data does not match the mask size.
    #[error("Mask data has {actual} entries, but its size requires {expected}")]
    MaskDataLength {
        /// The number of entries required by the size
        expected: usize,
        /// The number of entries supplied
        actual: usize,
    },
}
