//! Almost all nontrivial graphics programs are built on a foundation
//! of geometric classes. The Markov chains only need the 2D subset:
//! raster positions, pixel coordinates and image bounds.

// std
use std::ops;
// pbrt
use crate::core::pbrt::lerp;
use crate::core::pbrt::Float;

// see geometry.h

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Vector2f {
    pub x: Float,
    pub y: Float,
}

impl Vector2f {
    pub fn length(&self) -> Float {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Vector2i {
    pub x: i32,
    pub y: i32,
}

impl Vector2i {
    pub fn new(x: i32, y: i32) -> Self {
        Vector2i { x, y }
    }
    /// Number of pixels covered by an image of this size.
    pub fn area(&self) -> usize {
        (self.x.max(0) as usize) * (self.y.max(0) as usize)
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Point2f {
    pub x: Float,
    pub y: Float,
}

impl Point2f {
    pub fn has_nans(&self) -> bool {
        self.x.is_nan() || self.y.is_nan()
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Point2i {
    pub x: i32,
    pub y: i32,
}

impl_op_ex!(+|a: &Point2f, b: &Vector2f| -> Point2f {
    Point2f {
        x: a.x + b.x,
        y: a.y + b.y,
    }
});

impl_op_ex!(-|a: &Point2f, b: &Point2f| -> Vector2f {
    Vector2f {
        x: a.x - b.x,
        y: a.y - b.y,
    }
});

impl_op_ex!(-|a: &Point2i, b: &Point2i| -> Vector2i {
    Vector2i {
        x: a.x - b.x,
        y: a.y - b.y,
    }
});

impl_op_ex!(*|a: &Vector2f, s: Float| -> Vector2f {
    Vector2f {
        x: a.x * s,
        y: a.y * s,
    }
});

#[derive(Debug, Default, Copy, Clone)]
pub struct Bounds2f {
    pub p_min: Point2f,
    pub p_max: Point2f,
}

impl Bounds2f {
    pub fn lerp(&self, t: &Point2f) -> Point2f {
        Point2f {
            x: lerp(t.x, self.p_min.x, self.p_max.x),
            y: lerp(t.y, self.p_min.y, self.p_max.y),
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Bounds2i {
    pub p_min: Point2i,
    pub p_max: Point2i,
}

impl Bounds2i {
    pub fn new(p1: Point2i, p2: Point2i) -> Self {
        let p_min: Point2i = Point2i {
            x: std::cmp::min(p1.x, p2.x),
            y: std::cmp::min(p1.y, p2.y),
        };
        let p_max: Point2i = Point2i {
            x: std::cmp::max(p1.x, p2.x),
            y: std::cmp::max(p1.y, p2.y),
        };
        Bounds2i { p_min, p_max }
    }
    pub fn from_size(size: &Vector2i) -> Self {
        Bounds2i {
            p_min: Point2i { x: 0, y: 0 },
            p_max: Point2i {
                x: size.x,
                y: size.y,
            },
        }
    }
    pub fn area(&self) -> i32 {
        let d: Vector2i = self.p_max - self.p_min;
        d.x * d.y
    }
    pub fn to_float(&self) -> Bounds2f {
        Bounds2f {
            p_min: Point2f {
                x: self.p_min.x as Float,
                y: self.p_min.y as Float,
            },
            p_max: Point2f {
                x: self.p_max.x as Float,
                y: self.p_max.y as Float,
            },
        }
    }
}

pub struct Bounds2Iterator<'a> {
    p: Point2i,
    bounds: &'a Bounds2i,
}

impl<'a> Iterator for Bounds2Iterator<'a> {
    type Item = Point2i;

    fn next(&mut self) -> Option<Point2i> {
        if self.bounds.p_min.x >= self.bounds.p_max.x {
            return None;
        }
        self.p.x += 1;
        if self.p.x == self.bounds.p_max.x {
            self.p.x = self.bounds.p_min.x;
            self.p.y += 1;
        }
        if self.p.y >= self.bounds.p_max.y {
            None
        } else {
            Some(self.p)
        }
    }
}

impl<'a> IntoIterator for &'a Bounds2i {
    type Item = Point2i;
    type IntoIter = Bounds2Iterator<'a>;

    fn into_iter(self) -> Self::IntoIter {
        Bounds2Iterator {
            // need to start 1 before p_min.x as next() will be called
            // to get the first element
            p: Point2i {
                x: self.p_min.x - 1,
                y: self.p_min.y,
            },
            bounds: self,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bounds_iterate_row_major() {
        let b = Bounds2i::new(Point2i { x: 1, y: 2 }, Point2i { x: 3, y: 4 });
        let pixels: Vec<Point2i> = b.into_iter().collect();
        assert_eq!(pixels.len(), b.area() as usize);
        assert_eq!(pixels[0], Point2i { x: 1, y: 2 });
        assert_eq!(pixels[1], Point2i { x: 2, y: 2 });
        assert_eq!(pixels[3], Point2i { x: 2, y: 3 });
    }

    #[test]
    fn empty_bounds_yield_nothing() {
        let b = Bounds2i::new(Point2i { x: 0, y: 0 }, Point2i { x: 0, y: 5 });
        assert_eq!(b.into_iter().count(), 0);
    }

    #[test]
    fn raster_lerp() {
        let b = Bounds2i::from_size(&Vector2i::new(100, 50)).to_float();
        let p = b.lerp(&Point2f { x: 0.5, y: 0.25 });
        assert_eq!(p, Point2f { x: 50.0, y: 12.5 });
    }
}
