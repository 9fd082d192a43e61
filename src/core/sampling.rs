//! Piecewise-constant distribution used to pick Markov chain seeds in
//! proportion to their luminance.

// pbrt
use crate::core::pbrt::find_interval;
use crate::core::pbrt::Float;

// see sampling.h

#[derive(Debug, Default, Clone)]
pub struct Distribution1D {
    pub func: Vec<Float>,
    pub cdf: Vec<Float>,
    pub func_int: Float,
}

impl Distribution1D {
    pub fn new(f: Vec<Float>) -> Self {
        let n: usize = f.len();
        // compute integral of step function at $x_i$
        let mut cdf: Vec<Float> = Vec::with_capacity(n + 1);
        cdf.push(0.0 as Float);
        for i in 1..(n + 1) {
            let previous: Float = cdf[i - 1];
            cdf.push(previous + f[i - 1] / n as Float);
        }
        // transform step function integral into CDF
        let func_int: Float = cdf[n];
        if func_int == 0.0 as Float {
            for (i, c) in cdf.iter_mut().enumerate().skip(1) {
                *c = i as Float / n as Float;
            }
        } else {
            for c in cdf.iter_mut().skip(1) {
                *c /= func_int;
            }
        }
        Distribution1D { func: f, cdf, func_int }
    }
    fn offset(&self, u: Float) -> usize {
        let cdf = &self.cdf;
        find_interval(cdf.len() as i32, |index| cdf[index as usize] <= u) as usize
    }
    /// Picks an index with probability proportional to its function
    /// value (uniformly if all values are zero).
    pub fn sample_discrete(&self, u: Float) -> usize {
        self.offset(u)
    }
}
