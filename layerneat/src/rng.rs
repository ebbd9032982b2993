use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Error, Rng, RngCore, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Random source used by every engine operation.
///
/// A population owns a single `NeatRng`, so seeding it
/// makes mutation, selection and crossover reproducible.
#[derive(Clone, Debug)]
pub struct NeatRng(StdRng);

impl NeatRng {
    /// Returns a generator seeded from `seed`.
    ///
    /// # Examples
    /// ```
    /// use layerneat::NeatRng;
    ///
    /// let mut a = NeatRng::seeded(7);
    /// let mut b = NeatRng::seeded(7);
    /// assert_eq!(a.randrange(), b.randrange());
    /// ```
    pub fn seeded(seed: u64) -> NeatRng {
        NeatRng(StdRng::seed_from_u64(seed))
    }

    /// Returns a generator seeded from system entropy.
    pub fn from_entropy() -> NeatRng {
        NeatRng(StdRng::from_entropy())
    }

    /// Uniform sample in `[0, 1)`.
    pub fn randrange(&mut self) -> f64 {
        self.0.gen::<f64>()
    }

    /// Uniform sample in `[a, b)`. Degenerate ranges return `a`.
    pub fn uniform(&mut self, a: f64, b: f64) -> f64 {
        a + (b - a) * self.randrange()
    }

    /// Gaussian sample. An invalid standard deviation
    /// (negative or non-finite) yields the mean.
    pub fn normal(&mut self, mean: f64, stdev: f64) -> f64 {
        if !(stdev >= 0.0 && stdev.is_finite()) {
            return mean;
        }
        match Normal::new(mean, stdev) {
            Ok(normal) => normal.sample(&mut self.0),
            Err(_) => mean,
        }
    }

    /// Uniform integer in `[0, n)`.
    ///
    /// # Panics
    /// Panics if `n == 0`.
    pub fn below(&mut self, n: usize) -> usize {
        self.0.gen_range(0..n)
    }

    /// Returns `true` with probability `chance`.
    pub fn chance(&mut self, chance: f64) -> bool {
        self.randrange() < chance
    }

    /// Random alphanumeric tag of `len` characters.
    pub fn tag(&mut self, len: usize) -> String {
        (&mut self.0)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }
}

impl RngCore for NeatRng {
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.0.try_fill_bytes(dest)
    }
}
