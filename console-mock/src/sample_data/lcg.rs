//! Linear congruential generator used to make synthetic series reproducible.

const MULTIPLIER: u64 = 1_664_525;
const INCREMENT: u64 = 1_013_904_223;
const MODULUS: u64 = 1 << 32;

/// Classic 32-bit LCG (`x' = (a·x + c) mod 2^32`).
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self { state: seed % MODULUS }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = (MULTIPLIER * self.state + INCREMENT) % MODULUS;
        self.state as u32
    }

    /// Uniform value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / MODULUS as f64
    }
}

/// Sum of the character codes of `name`, used to give each metric its own seed.
pub fn name_checksum(name: &str) -> u64 {
    name.chars().map(|c| u64::from(u32::from(c))).sum()
}
