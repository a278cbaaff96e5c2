//! Seeded xorshift128 generator.
//!
//! State is taken from the SHA-256 digest of the seed string so that any
//! caller-supplied identifier maps onto a full 128-bit state. All arithmetic
//! is on `u32`, matching the 32-bit wraparound the generated themes were
//! first published with.

use sha2::{Digest, Sha256};

const TWO_POW_32: f64 = 4_294_967_296.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRng {
    a: u32,
    b: u32,
    c: u32,
    d: u32,
}

impl SeededRng {
    pub fn new(seed: &str) -> Self {
        let digest = Sha256::digest(seed.as_bytes());
        let word = |i: usize| {
            u32::from_le_bytes([digest[i], digest[i + 1], digest[i + 2], digest[i + 3]])
        };

        Self {
            a: word(0),
            b: word(4),
            c: word(8),
            d: word(12),
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        let t = self.a ^ (self.a << 11);
        self.a = self.b;
        self.b = self.c;
        self.c = self.d;
        self.d = (self.d ^ (self.d >> 19)) ^ (t ^ (t >> 8));
        self.d
    }

    /// Next draw in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / TWO_POW_32
    }
}

impl Iterator for SeededRng {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        Some(self.next_f64())
    }
}
