use num::complex::Complex64;
use rand::distributions::Uniform;
use rand::{Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoroshiro64Star;
use serde::{Deserialize, Serialize};

use crate::structure::IndexSet;
use crate::tensors::ITensor;

const IM: u64 = 134_456;
const IA: u64 = 8121;
const IC: u64 = 28_411;

/// A small linear congruential generator.
///
/// Low quality, but cheap and reproducible across platforms. Each generator owns its state,
/// so independent streams never interfere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickRan {
    state: u64,
}

impl QuickRan {
    pub fn new(seed: u64) -> Self {
        QuickRan { state: seed % IM }
    }

    fn step(&mut self) -> u64 {
        self.state = (self.state * IA + IC) % IM;
        self.state
    }

    /// Uniform in `[0, 1)`
    pub fn next_real(&mut self) -> f64 {
        self.step() as f64 / IM as f64
    }
}

impl RngCore for QuickRan {
    fn next_u32(&mut self) -> u32 {
        // state < IM, so this stays below 2^32
        ((self.step() << 32) / IM) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(self.next_u32());
        let lo = u64::from(self.next_u32());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for QuickRan {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        QuickRan::new(u64::from_le_bytes(seed))
    }
}

/// A tensor with elements drawn uniformly from `[-1, 1)`.
pub fn random_tensor<R: Rng + ?Sized>(inds: IndexSet, rng: &mut R) -> ITensor {
    let dist = Uniform::new(-1.0, 1.0);
    let mut t = ITensor::null(inds);
    t.generate(|| rng.sample(dist));
    t
}

/// Real and imaginary parts drawn independently from `[-1, 1)`.
pub fn random_tensor_complex<R: Rng + ?Sized>(inds: IndexSet, rng: &mut R) -> ITensor {
    let dist = Uniform::new(-1.0, 1.0);
    let mut t = ITensor::null(inds);
    t.generate_complex(|| Complex64::new(rng.sample(dist), rng.sample(dist)));
    t
}

pub fn random_tensor_seeded(inds: IndexSet, seed: u64) -> ITensor {
    let mut rng = Xoroshiro64Star::seed_from_u64(seed);
    random_tensor(inds, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index_set;
    use crate::structure::index::Index;

    #[test]
    fn quickran_sequence() {
        let mut r = QuickRan::new(0);
        assert_eq!(r.next_real(), 28411.0 / 134456.0);
        assert_eq!(r.next_real(), 27646.0 / 134456.0);
    }

    #[test]
    fn quickran_streams_are_independent() {
        let mut a = QuickRan::new(42);
        let mut b = QuickRan::new(42);
        let first = a.next_real();
        let mut c = QuickRan::new(7);
        c.next_real();
        assert_eq!(b.next_real(), first);
        assert_eq!(a, b);

        for _ in 0..1000 {
            let x = a.next_real();
            assert!((0.0..1.0).contains(&x));
        }
    }

    #[test]
    fn quickran_as_rng() {
        let mut r = QuickRan::seed_from_u64(3);
        let x: f64 = r.gen_range(2.0..3.0);
        assert!((2.0..3.0).contains(&x));

        let mut bytes = [0u8; 7];
        r.fill_bytes(&mut bytes);
    }

    #[test]
    fn seeded_tensors_repeat() {
        let i = Index::new("i", 3);
        let j = Index::new("j", 4);
        let a = random_tensor_seeded(index_set![i, j].unwrap(), 12);
        let b = random_tensor_seeded(index_set![i, j].unwrap(), 12);
        let c = random_tensor_seeded(index_set![i, j].unwrap(), 13);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!a.is_complex());
        assert!(a.norm().unwrap() > 0.0);
    }

    #[test]
    fn complex_random_tensor() {
        let i = Index::new("i", 5);
        let mut rng = QuickRan::new(1);
        let t = random_tensor_complex(index_set![i].unwrap(), &mut rng);
        assert!(t.is_complex());
        assert!(t.sum_els_cplx().unwrap().im != 0.0);
    }
}
