//! Seeded randomness for test variations.
//!
//! Every run picks a seed (or reads `TAGSTREAM_TEST_SEED`) so that a failing
//! chunk split can be replayed exactly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seeded generator for test variations.
pub struct Gen {
    rng: StdRng,
    pub seed: u64,
}

impl Gen {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Seed from `TAGSTREAM_TEST_SEED` if set, otherwise a random one.
    pub fn from_env_or_random() -> Self {
        let seed = std::env::var("TAGSTREAM_TEST_SEED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(rand::random);
        Self::new(seed)
    }

    /// Geometric distribution: count of successes before the first failure.
    pub fn geometric(&mut self, alpha: f64) -> usize {
        let mut n = 0;
        while self.rng.gen::<f64>() < alpha {
            n += 1;
        }
        n
    }

    /// Poisson distribution (Knuth's method, fine for small lambda).
    pub fn poisson(&mut self, lambda: f64) -> usize {
        let l = (-lambda).exp();
        let mut k = 0;
        let mut p = 1.0;
        loop {
            k += 1;
            p *= self.rng.gen::<f64>();
            if p <= l {
                return k - 1;
            }
        }
    }

    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen::<f64>() < p
    }

    pub fn range(&mut self, low: usize, high: usize) -> usize {
        self.rng.gen_range(low..high)
    }

    /// A short lowercase tag name.
    pub fn name(&mut self) -> String {
        let len = 1 + self.poisson(2.0);
        (0..len).map(|_| self.rng.gen_range(b'a'..=b'z') as char).collect()
    }

    /// Split `input` into chunks at random byte offsets. Offsets may land
    /// inside a multi-byte character.
    pub fn chunks<'a>(&mut self, input: &'a [u8]) -> Vec<&'a [u8]> {
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < input.len() {
            let remaining = input.len() - start;
            let len = 1 + self.geometric(0.7).min(remaining - 1);
            chunks.push(&input[start..start + len]);
            start += len;
        }
        // Empty chunks are no-ops and must stay that way.
        if self.chance(0.2) {
            let at = self.range(0, chunks.len() + 1);
            chunks.insert(at, &input[..0]);
        }
        chunks
    }

    /// A random document of nested elements, text and comments.
    pub fn document(&mut self, depth: usize) -> String {
        let mut out = String::new();
        self.fill(&mut out, depth);
        out
    }

    fn fill(&mut self, out: &mut String, depth: usize) {
        let children = self.poisson(2.0);
        for _ in 0..children {
            if depth > 0 && self.chance(0.5) {
                let name = self.name();
                out.push('<');
                out.push_str(&name);
                if self.chance(0.3) {
                    out.push_str(&format!(" {}=\"{}\"", self.name(), self.name()));
                }
                if self.chance(0.2) {
                    out.push_str("/>");
                    continue;
                }
                out.push('>');
                self.fill(out, depth - 1);
                out.push_str(&format!("</{name}>"));
            } else if self.chance(0.1) {
                out.push_str(&format!("<!--{}-->", self.name()));
            } else {
                out.push_str(&self.name());
                if self.chance(0.2) {
                    out.push_str(" &amp; é");
                }
            }
        }
    }
}
