//! Geometry primitives shared by the layout code
//!
//! `Rect` uses edge coordinates (left/top inclusive, right/bottom exclusive)
//! because every layout rule in the frame resolver is expressed per edge.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in display pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const EMPTY: Rect = Rect::new(0, 0, 0, 0);

    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// Build a rectangle from an origin and a size
    pub const fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// A rectangle with no area (including inverted ones) is empty
    pub fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    pub fn set_empty(&mut self) {
        *self = Self::EMPTY;
    }

    pub fn offset(&mut self, dx: i32, dy: i32) {
        self.left += dx;
        self.right += dx;
        self.top += dy;
        self.bottom += dy;
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        !self.is_empty() && x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }

    /// Intersection of two rectangles, `None` when they do not overlap
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        (!r.is_empty()).then_some(r)
    }

    /// Pull every edge inside `bounds` without checking for emptiness.
    ///
    /// Unlike [`Rect::intersect`] the result may be inverted when the two
    /// rectangles are disjoint; the inset math downstream relies on that.
    pub fn clamp_within(&self, bounds: &Rect) -> Rect {
        Rect::new(
            self.left.max(bounds.left),
            self.top.max(bounds.top),
            self.right.min(bounds.right),
            self.bottom.min(bounds.bottom),
        )
    }

    /// Scale every edge, rounding to the nearest pixel
    pub fn scale(&mut self, scale: f32) {
        if scale != 1.0 {
            self.left = scale_round(self.left, scale);
            self.top = scale_round(self.top, scale);
            self.right = scale_round(self.right, scale);
            self.bottom = scale_round(self.bottom, scale);
        }
    }

    pub fn scaled(mut self, scale: f32) -> Rect {
        self.scale(scale);
        self
    }

    /// Shrink by `insets` (negative insets grow the rectangle)
    pub fn inset_by(&self, insets: &Insets) -> Rect {
        Rect::new(
            self.left + insets.left,
            self.top + insets.top,
            self.right - insets.right,
            self.bottom - insets.bottom,
        )
    }

    /// Grow by `insets` on every side
    pub fn outset_by(&self, insets: &Insets) -> Rect {
        Rect::new(
            self.left - insets.left,
            self.top - insets.top,
            self.right + insets.right,
            self.bottom + insets.bottom,
        )
    }

    /// Edge distances from `outer` to `self` (positive when `self` lies inside)
    pub fn insets_within(&self, outer: &Rect) -> Insets {
        Insets::new(
            self.left - outer.left,
            self.top - outer.top,
            outer.right - self.right,
            outer.bottom - self.bottom,
        )
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}][{},{}]", self.left, self.top, self.right, self.bottom)
    }
}

/// Per-edge distances (overscan/content/visible/stable insets, outsets)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Insets {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Insets {
    pub const ZERO: Insets = Insets::new(0, 0, 0, 0);

    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Clamp negative edges to zero
    pub fn clamped(&self) -> Insets {
        Insets::new(self.left.max(0), self.top.max(0), self.right.max(0), self.bottom.max(0))
    }

    pub fn scale(&mut self, scale: f32) {
        if scale != 1.0 {
            self.left = scale_round(self.left, scale);
            self.top = scale_round(self.top, scale);
            self.right = scale_round(self.right, scale);
            self.bottom = scale_round(self.bottom, scale);
        }
    }

    pub fn scaled(mut self, scale: f32) -> Insets {
        self.scale(scale);
        self
    }
}

impl std::fmt::Display for Insets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{},{},{})", self.left, self.top, self.right, self.bottom)
    }
}

fn scale_round(value: i32, scale: f32) -> i32 {
    (value as f32 * scale + 0.5) as i32
}
