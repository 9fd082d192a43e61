//! Random Number Generator

use hexf::*;

// pbrt
use crate::core::pbrt::Float;

// see rng.h

pub const FLOAT_ONE_MINUS_EPSILON: Float = hexf32!("0x1.fffffep-1");
pub const PCG32_DEFAULT_STATE: u64 = 0x853c_49e6_748f_ea9b;
pub const PCG32_DEFAULT_STREAM: u64 = 0xda3e_39cb_94b9_5bdb;
pub const PCG32_MULT: u64 = 0x5851_f42d_4c95_7f2d;

/// PCG32 random number generator. Streams can be selected with
/// [`Rng::set_sequence`] and repositioned with [`Rng::advance`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rng {
    state: u64,
    inc: u64,
}

impl Default for Rng {
    fn default() -> Self {
        Rng::new()
    }
}

impl Rng {
    pub fn new() -> Self {
        Rng {
            state: PCG32_DEFAULT_STATE,
            inc: PCG32_DEFAULT_STREAM,
        }
    }
    pub fn with_sequence(initseq: u64) -> Self {
        let mut rng = Rng::new();
        rng.set_sequence(initseq);
        rng
    }
    pub fn set_sequence(&mut self, initseq: u64) {
        self.state = 0_u64;
        self.inc = initseq.wrapping_shl(1) | 1;
        self.uniform_uint32();
        self.state = self.state.wrapping_add(PCG32_DEFAULT_STATE);
        self.uniform_uint32();
    }
    pub fn uniform_uint32(&mut self) -> u32 {
        let oldstate: u64 = self.state;
        self.state = oldstate.wrapping_mul(PCG32_MULT).wrapping_add(self.inc);
        let xorshifted: u32 = (oldstate.wrapping_shr(18) ^ oldstate).wrapping_shr(27) as u32;
        let rot: u32 = oldstate.wrapping_shr(59) as u32;
        xorshifted.rotate_right(rot)
    }
    pub fn uniform_uint32_bounded(&mut self, b: u32) -> u32 {
        let threshold: u32 = b.wrapping_neg() % b;
        loop {
            let r = self.uniform_uint32();
            if r >= threshold {
                return r % b;
            }
        }
    }
    pub fn uniform_float(&mut self) -> Float {
        (self.uniform_uint32() as Float * hexf32!("0x1.0p-32") as Float)
            .min(FLOAT_ONE_MINUS_EPSILON)
    }
    /// Skip `delta` draws ahead in the current stream in O(log delta).
    pub fn advance(&mut self, delta: u64) {
        let mut cur_mult: u64 = PCG32_MULT;
        let mut cur_plus: u64 = self.inc;
        let mut acc_mult: u64 = 1_u64;
        let mut acc_plus: u64 = 0_u64;
        let mut delta: u64 = delta;
        while delta > 0 {
            if delta & 1 == 1 {
                acc_mult = acc_mult.wrapping_mul(cur_mult);
                acc_plus = acc_plus.wrapping_mul(cur_mult).wrapping_add(cur_plus);
            }
            cur_plus = cur_mult.wrapping_add(1).wrapping_mul(cur_plus);
            cur_mult = cur_mult.wrapping_mul(cur_mult);
            delta /= 2;
        }
        self.state = acc_mult.wrapping_mul(self.state).wrapping_add(acc_plus);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn advance_matches_stepping() {
        let mut stepped = Rng::with_sequence(7);
        let mut jumped = stepped;
        for _ in 0..1000 {
            stepped.uniform_uint32();
        }
        jumped.advance(1000);
        assert_eq!(stepped, jumped);
        assert_eq!(stepped.uniform_uint32(), jumped.uniform_uint32());
    }

    #[test]
    fn sequences_differ() {
        let mut a = Rng::with_sequence(0);
        let mut b = Rng::with_sequence(1);
        let same = (0..16).filter(|_| a.uniform_uint32() == b.uniform_uint32()).count();
        assert!(same < 16);
    }

    #[test]
    fn uniform_float_in_unit_interval() {
        let mut rng = Rng::new();
        for _ in 0..10_000 {
            let u = rng.uniform_float();
            assert!(u >= 0.0 && u < 1.0);
        }
    }

    #[test]
    fn bounded_stays_below_bound() {
        let mut rng = Rng::with_sequence(3);
        for _ in 0..1000 {
            assert!(rng.uniform_uint32_bounded(5) < 5);
        }
    }
}
