//! Rectangles expressed relative to a parent's size.

use serde::{Deserialize, Serialize};

use crate::transform::Translate;
use crate::{Dims, Point, Rect};

/// A rectangle whose edges track the size of a parent shape.
///
/// Each resolved edge is `add.edge + (mult.edge / 2) * parent_dim`, where the
/// parent dimension is the width for `x` edges and the height for `y` edges.
/// `mult` stores a doubled magnification, so the default `mult` of
/// `(-1, -1, 1, 1)` maps a zero-sized `add` onto exactly the parent footprint.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ScaledRect {
    /// The fixed offset of each edge.
    pub add: Rect,
    /// The doubled magnification of each edge.
    pub mult: Rect,
}

impl ScaledRect {
    /// Creates a [`ScaledRect`] from explicit offset and magnification rectangles.
    pub fn new(add: Rect, mult: Rect) -> Self {
        Self { add, mult }
    }

    /// Creates a [`ScaledRect`] that magnifies the parent by `mx` horizontally
    /// and `my` vertically.
    pub fn with_magnification(add: Rect, mx: f64, my: f64) -> Self {
        Self::new(add, Rect::centered(2. * mx, 2. * my))
    }

    /// Creates an origin-centered `w` by `h` offset at unit magnification.
    pub fn centered(w: f64, h: f64) -> Self {
        Rect::centered(w, h).into()
    }

    /// Returns the [`ScaledRect`] with its offset translated by `(dx, dy)`.
    ///
    /// The magnification is unchanged.
    pub fn shift(&self, dx: f64, dy: f64) -> Self {
        let mut add = self.add;
        add.translate(Point::new(dx, dy));
        Self::new(add, self.mult)
    }

    /// Returns `true` if the magnification is the unit default.
    #[inline]
    pub fn has_default_mult(&self) -> bool {
        self.mult == Rect::default()
    }

    /// Resolves the rectangle against a parent of size `parent`.
    pub fn resolve(&self, parent: Dims) -> Rect {
        Rect::new(
            self.add.p0.x + (self.mult.p0.x / 2.) * parent.w,
            self.add.p0.y + (self.mult.p0.y / 2.) * parent.h,
            self.add.p1.x + (self.mult.p1.x / 2.) * parent.w,
            self.add.p1.y + (self.mult.p1.y / 2.) * parent.h,
        )
    }
}

impl From<Rect> for ScaledRect {
    fn from(add: Rect) -> Self {
        Self::with_magnification(add, 1., 1.)
    }
}

impl Translate for ScaledRect {
    fn translate(&mut self, p: Point) {
        self.add.translate(p);
    }
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::*;

    #[test]
    fn unit_magnification_is_the_default_mult() {
        let s = ScaledRect::from(Rect::centered(0.2, 0.4));
        assert!(s.has_default_mult());
        assert_eq!(s.mult, Rect::default());
        assert!(!ScaledRect::with_magnification(Rect::default(), 0.5, 1.).has_default_mult());
    }

    #[test]
    fn zero_offset_resolves_to_parent() {
        let s = ScaledRect::from(Rect::new(0., 0., 0., 0.));
        let r = s.resolve(Dims::new(3., 5.));
        assert_eq!(r, Rect::centered(3., 5.));
    }

    #[test]
    fn shift_moves_only_the_offset() {
        let s = ScaledRect::new(Rect::centered(1., 1.), Rect::new(-1., 0., 1., 1.));
        let t = s.shift(0.5, -0.5);
        assert_eq!(t.mult, s.mult);
        assert_eq!(t.add, Rect::new(0., -1., 1., 0.));
    }

    #[test]
    fn resolution_is_linear_in_parent_size() {
        let s = ScaledRect::new(Rect::new(-0.1, -0.2, 0.3, 0.4), Rect::new(-1., 0., 1., 1.));
        let parent = Dims::new(1.5, 2.5);
        let zero = s.resolve(Dims::default());
        let once = s.resolve(parent);
        let twice = s.resolve(parent * 2.);

        assert_eq!(zero, s.add);
        for (z, a, b) in [
            (zero.left(), once.left(), twice.left()),
            (zero.bottom(), once.bottom(), twice.bottom()),
            (zero.right(), once.right(), twice.right()),
            (zero.top(), once.top(), twice.top()),
        ] {
            assert_float_eq!(b - z, 2. * (a - z), abs <= 1e-12);
        }
    }

    #[test]
    fn edge_pinned_magnification() {
        // Pinned to the left edge of the parent: both x edges move with the left edge.
        let s = ScaledRect::new(Rect::new(-0.2, -0.1, -0.2, 0.1), Rect::new(-1., -1., -1., 1.));
        let r = s.resolve(Dims::new(2., 1.));
        assert_float_eq!(r.left(), -1.2, abs <= 1e-12);
        assert_float_eq!(r.right(), -1.2, abs <= 1e-12);
        assert_float_eq!(r.bottom(), -0.6, abs <= 1e-12);
        assert_float_eq!(r.top(), 0.6, abs <= 1e-12);
    }
}
