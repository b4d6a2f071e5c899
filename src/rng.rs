/// Seeded mulberry32 generator. Every random roll in a match goes through
/// one of these so replays with the same seed produce identical shards.
#[derive(Clone, Debug)]
pub struct Rng {
    seed: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn next_f64(&mut self) -> f64 {
        self.seed = self.seed.wrapping_add(0x6d2b79f5);
        let mut t = self.seed;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        let out = t ^ (t >> 14);
        out as f64 / 4_294_967_296.0
    }

    /// Uniform in `[min, min + span)`.
    pub fn range(&mut self, min: f64, span: f64) -> f64 {
        min + self.next_f64() * span
    }

    /// Uniform in `[-0.5, 0.5) * scale`.
    pub fn centered(&mut self, scale: f64) -> f64 {
        (self.next_f64() - 0.5) * scale
    }

    pub fn bool(&mut self, probability: f64) -> bool {
        self.next_f64() < probability
    }
}

#[cfg(test)]
mod tests {
    use super::Rng;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Rng::new(7);
        let mut b = Rng::new(7);
        for _ in 0..32 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
    }

    #[test]
    fn centered_stays_in_half_open_band() {
        let mut rng = Rng::new(99);
        for _ in 0..500 {
            let v = rng.centered(10.0);
            assert!((-5.0..5.0).contains(&v));
        }
    }
}
