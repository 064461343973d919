//! Screen coordinates and rectangular regions.
//!
//! All values are absolute screen pixels. Regions are built from two
//! user-supplied corners and are always normalized to a positive size.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// An absolute screen coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns this point shifted by `(dx, dy)`.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

impl std::fmt::Display for ScreenPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A rectangle on screen with a strictly positive width and height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScreenRegion {
    origin: ScreenPoint,
    width: u32,
    height: u32,
}

impl ScreenRegion {
    /// Creates a region from its top-left corner and size.
    ///
    /// Returns `None` if either dimension is zero or the far edge does not
    /// fit in an `i32`.
    pub fn new(origin: ScreenPoint, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        origin.x.checked_add_unsigned(width)?;
        origin.y.checked_add_unsigned(height)?;
        Some(Self {
            origin,
            width,
            height,
        })
    }

    /// Creates a region spanning two opposite corners, in any order.
    ///
    /// Corners given right-to-left or bottom-to-top are swapped so the
    /// region always has a positive size. Returns `None` for a zero-area span
    /// or one wider than the `i32` range.
    pub fn from_corners(a: ScreenPoint, b: ScreenPoint) -> Option<Self> {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        let width = a.x.abs_diff(b.x);
        let height = a.y.abs_diff(b.y);
        Self::new(ScreenPoint::new(left, top), width, height)
    }

    /// A single-pixel region at `point`.
    pub const fn pixel(point: ScreenPoint) -> Self {
        Self {
            origin: point,
            width: 1,
            height: 1,
        }
    }

    pub fn origin(&self) -> ScreenPoint {
        self.origin
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn left(&self) -> i32 {
        self.origin.x
    }

    pub fn top(&self) -> i32 {
        self.origin.y
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.origin.x.saturating_add_unsigned(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.origin.y.saturating_add_unsigned(self.height)
    }

    pub fn contains(&self, point: ScreenPoint) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }

    /// Grows the region by `dx` pixels on the left and right and `dy` pixels
    /// on the top and bottom. `None` if the result leaves the `i32` range.
    pub fn expand(&self, dx: u32, dy: u32) -> Option<Self> {
        let origin = ScreenPoint::new(
            self.origin.x.checked_sub_unsigned(dx)?,
            self.origin.y.checked_sub_unsigned(dy)?,
        );
        let width = self.width.checked_add(dx.checked_mul(2)?)?;
        let height = self.height.checked_add(dy.checked_mul(2)?)?;
        Self::new(origin, width, height)
    }

    /// Picks a point uniformly at random inside the region.
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> ScreenPoint {
        ScreenPoint::new(
            rng.gen_range(self.left()..self.right()),
            rng.gen_range(self.top()..self.bottom()),
        )
    }
}

impl std::fmt::Display for ScreenRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} at {}", self.width, self.height, self.origin)
    }
}
