//! Lambda-unit geometry for technology descriptions.
//!
//! Coordinates are `f64` lambda values. Unlike layout geometry, rectangles here
//! are never normalized: a [`Rect`] may be degenerate or inverted, and every
//! operation is plain arithmetic on its edges.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

pub mod scaled;
pub mod transform;

pub use scaled::ScaledRect;
pub use transform::Translate;

/// Bit pattern used for hashing, with `-0.0` folded onto `0.0`.
#[inline]
fn canonical_bits(v: f64) -> u64 {
    (v + 0.0).to_bits()
}

/// A point in two-dimensional lambda-space.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new [`Point`] from (x,y) coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the origin, (0, 0).
    #[inline]
    pub fn zero() -> Self {
        Self { x: 0., y: 0. }
    }

    /// Returns the point with its x and y coordinates exchanged.
    #[inline]
    pub fn transpose(self) -> Self {
        Self {
            x: self.y,
            y: self.x,
        }
    }
}

// Coordinates are required to be finite, which makes `==` an equivalence.
impl Eq for Point {}

impl Hash for Point {
    fn hash<H: Hasher>(&self, state: &mut H) {
        canonical_bits(self.x).hash(state);
        canonical_bits(self.y).hash(state);
    }
}

impl std::ops::Add<Point> for Point {
    type Output = Self;
    fn add(self, rhs: Point) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from(value: (f64, f64)) -> Self {
        Self {
            x: value.0,
            y: value.1,
        }
    }
}

/// A horizontal and vertical dimension with no specified location.
#[derive(Copy, Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Dims {
    /// The width dimension.
    pub w: f64,
    /// The height dimension.
    pub h: f64,
}

impl Dims {
    /// Creates a new [`Dims`] from a width and height.
    pub fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }
    /// Creates a new [`Dims`] with width and height equal to `value`.
    pub fn square(value: f64) -> Self {
        Self { w: value, h: value }
    }
    /// Returns a new [`Dims`] with the horizontal and vertical dimensions flipped.
    pub fn transpose(self) -> Self {
        Self {
            w: self.h,
            h: self.w,
        }
    }
    /// Returns `true` if both dimensions are equal.
    #[inline]
    pub fn is_square(&self) -> bool {
        self.w == self.h
    }
}

impl std::ops::Mul<f64> for Dims {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.w * rhs, self.h * rhs)
    }
}

impl From<(f64, f64)> for Dims {
    fn from(value: (f64, f64)) -> Self {
        Self::new(value.0, value.1)
    }
}

/// An axis-aligned rectangle given by its low corner `p0` and high corner `p1`.
///
/// No ordering is enforced between the corners. The default rectangle is
/// `(-1, -1, 1, 1)`, the unit magnification used by [`ScaledRect`].
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Rect {
    /// The low (`klx`, `kly`) corner.
    pub p0: Point,
    /// The high (`khx`, `khy`) corner.
    pub p1: Point,
}

impl Default for Rect {
    fn default() -> Self {
        Self::new(-1., -1., 1., 1.)
    }
}

impl Rect {
    /// Creates a rectangle from its four edges, in `(lx, ly, hx, hy)` order.
    pub const fn new(lx: f64, ly: f64, hx: f64, hy: f64) -> Self {
        Self {
            p0: Point { x: lx, y: ly },
            p1: Point { x: hx, y: hy },
        }
    }

    /// Creates an origin-centered rectangle of the given width and height.
    pub fn centered(w: f64, h: f64) -> Self {
        Self::new(-w / 2., -h / 2., w / 2., h / 2.)
    }

    /// Creates an origin-centered square with side `side`.
    #[inline]
    pub fn square(side: f64) -> Self {
        Self::centered(side, side)
    }

    /// Creates an origin-centered rectangle with the given [`Dims`].
    #[inline]
    pub fn with_dims(dims: Dims) -> Self {
        Self::centered(dims.w, dims.h)
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.p0.x
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.p0.y
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.p1.x
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.p1.y
    }

    /// Returns the horizontal width of the rectangle.
    #[inline]
    pub fn width(&self) -> f64 {
        self.p1.x - self.p0.x
    }

    /// Returns the vertical height of the rectangle.
    #[inline]
    pub fn height(&self) -> f64 {
        self.p1.y - self.p0.y
    }

    /// Returns the width and height of the rectangle.
    #[inline]
    pub fn dims(&self) -> Dims {
        Dims::new(self.width(), self.height())
    }

    /// Moves the left and right edges outward by `dx` and the bottom and top
    /// edges outward by `dy`.
    ///
    /// Negative amounts shrink the rectangle.
    pub fn grow(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.p0.x - dx, self.p0.y - dy, self.p1.x + dx, self.p1.y + dy)
    }

    /// Grows every edge outward by `amount`.
    #[inline]
    pub fn grow_all(&self, amount: f64) -> Self {
        self.grow(amount, amount)
    }

    /// Grows the rectangle by the width and height of `dims`.
    #[inline]
    pub fn grow_dims(&self, dims: Dims) -> Self {
        self.grow(dims.w, dims.h)
    }

    /// Returns the rectangle translated by `(dx, dy)`.
    pub fn shift(&self, dx: f64, dy: f64) -> Self {
        let mut rect = *self;
        rect.translate(Point::new(dx, dy));
        rect
    }

    /// Exchanges the roles of the x and y axes.
    ///
    /// Applied to an origin-centered enclosure, this rotates it by 90 degrees.
    pub fn swap_axes(&self) -> Self {
        Self {
            p0: self.p0.transpose(),
            p1: self.p1.transpose(),
        }
    }

    /// Intersects two rectangles while keeping the origin inside the result.
    ///
    /// Each low edge is `min(0, max(a, b))` and each high edge is
    /// `max(0, min(a, b))`.
    pub fn clamped_intersection(&self, other: &Rect) -> Self {
        Self::new(
            self.p0.x.max(other.p0.x).min(0.),
            self.p0.y.max(other.p0.y).min(0.),
            self.p1.x.min(other.p1.x).max(0.),
            self.p1.y.min(other.p1.y).max(0.),
        )
    }
}
