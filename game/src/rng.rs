use serde::{Deserialize, Serialize};

/// Uniform integer source used to pick tetrad kinds and colors.
pub trait RandomSource {
    /// Returns a value in `0..n`. `n` must be non-zero.
    fn next_int_below(&mut self, n: u32) -> u32;
}

/// xorshift64* generator. Small, deterministic and serialisable so a whole
/// engine round-trips through the time machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XorShiftRng {
    state: u64,
}

impl XorShiftRng {
    pub fn new(seed: u64) -> Self {
        let seed = if seed == 0 {
            0x9E37_79B9_7F4A_7C15
        } else {
            seed
        };
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        (x.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 32) as u32
    }
}

impl Default for XorShiftRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RandomSource for XorShiftRng {
    fn next_int_below(&mut self, n: u32) -> u32 {
        assert!(n > 0, "next_int_below called with n = 0");
        // Widening multiply keeps the bias negligible without a rejection loop.
        ((self.next_u32() as u64 * n as u64) >> 32) as u32
    }
}

/// Replays a fixed list of values, cycling when exhausted. Values are reduced
/// modulo `n` so any script is valid for any bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedRandom {
    values: Vec<u32>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(values: impl Into<Vec<u32>>) -> Self {
        let values = values.into();
        assert!(!values.is_empty(), "scripted random source needs at least one value");
        Self { values, cursor: 0 }
    }
}

impl RandomSource for ScriptedRandom {
    fn next_int_below(&mut self, n: u32) -> u32 {
        assert!(n > 0, "next_int_below called with n = 0");
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v % n
    }
}
