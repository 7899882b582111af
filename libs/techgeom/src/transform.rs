//! Translation of lambda-space geometry.

use super::{Point, Rect};

/// A trait for specifying how an object is translated by a [`Point`].
pub trait Translate {
    /// Translates the shape by [`Point`], modifying it in-place.
    fn translate(&mut self, p: Point);
}

impl Translate for Point {
    fn translate(&mut self, p: Point) {
        self.x += p.x;
        self.y += p.y;
    }
}

impl Translate for Rect {
    fn translate(&mut self, p: Point) {
        self.p0.translate(p);
        self.p1.translate(p);
    }
}
