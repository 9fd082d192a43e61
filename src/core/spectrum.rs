//! Path contributions are carried as RGB triples; the Markov chains
//! only ever look at their luminance.

// std
use std::ops;
use std::ops::{AddAssign, Index, MulAssign};
// others
use num::Zero;
// pbrt
use crate::core::pbrt::Float;

/// Luminance weights of linear sRGB primaries.
pub const Y_WEIGHT: [Float; 3] = [0.212_671, 0.715_160, 0.072_169];

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct RGBSpectrum {
    pub c: [Float; 3],
}

impl RGBSpectrum {
    pub fn new(v: Float) -> Self {
        RGBSpectrum { c: [v, v, v] }
    }
    pub fn rgb(r: Float, g: Float, b: Float) -> RGBSpectrum {
        RGBSpectrum { c: [r, g, b] }
    }
    /// Luminance (the Y coordinate of CIE XYZ).
    pub fn y(&self) -> Float {
        Y_WEIGHT[0] * self.c[0] + Y_WEIGHT[1] * self.c[1] + Y_WEIGHT[2] * self.c[2]
    }
    pub fn is_black(&self) -> bool {
        self.c.iter().all(|v| *v == 0.0 as Float)
    }
    pub fn has_nans(&self) -> bool {
        self.c.iter().any(|v| v.is_nan())
    }
    /// True if no channel is NaN or infinite.
    pub fn is_valid(&self) -> bool {
        self.c.iter().all(|v| v.is_finite())
    }
}

impl_op_ex!(+|a: &RGBSpectrum, b: &RGBSpectrum| -> RGBSpectrum {
    RGBSpectrum {
        c: [a.c[0] + b.c[0], a.c[1] + b.c[1], a.c[2] + b.c[2]],
    }
});

impl_op_ex!(-|a: &RGBSpectrum, b: &RGBSpectrum| -> RGBSpectrum {
    RGBSpectrum {
        c: [a.c[0] - b.c[0], a.c[1] - b.c[1], a.c[2] - b.c[2]],
    }
});

impl_op_ex!(*|a: &RGBSpectrum, b: &RGBSpectrum| -> RGBSpectrum {
    RGBSpectrum {
        c: [a.c[0] * b.c[0], a.c[1] * b.c[1], a.c[2] * b.c[2]],
    }
});

impl_op_ex!(*|a: &RGBSpectrum, s: Float| -> RGBSpectrum {
    RGBSpectrum {
        c: [a.c[0] * s, a.c[1] * s, a.c[2] * s],
    }
});

impl_op_ex!(/|a: &RGBSpectrum, s: Float| -> RGBSpectrum {
    let inv: Float = 1.0 as Float / s;
    RGBSpectrum {
        c: [a.c[0] * inv, a.c[1] * inv, a.c[2] * inv],
    }
});

impl AddAssign for RGBSpectrum {
    fn add_assign(&mut self, rhs: RGBSpectrum) {
        self.c[0] += rhs.c[0];
        self.c[1] += rhs.c[1];
        self.c[2] += rhs.c[2];
    }
}

impl MulAssign<Float> for RGBSpectrum {
    fn mul_assign(&mut self, rhs: Float) {
        self.c[0] *= rhs;
        self.c[1] *= rhs;
        self.c[2] *= rhs;
    }
}

impl Zero for RGBSpectrum {
    fn zero() -> RGBSpectrum {
        RGBSpectrum::new(0.0 as Float)
    }

    fn is_zero(&self) -> bool {
        self.is_black()
    }
}

impl Index<usize> for RGBSpectrum {
    type Output = Float;
    fn index(&self, index: usize) -> &Float {
        &self.c[index]
    }
}

impl From<Float> for RGBSpectrum {
    fn from(f: Float) -> Self {
        RGBSpectrum::new(f)
    }
}
