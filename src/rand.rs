use std::num::Wrapping;
use std::time::{SystemTime, UNIX_EPOCH};

// Linear congruential generator parameters
const MUL: u64 = 6364136223846793005; // Knuth section 3.3.4 (p.108)
const INC: u64 = 1442695040888963407;

/// Seeded random source. Every render takes one of these explicitly; there is no global generator.
#[derive(Clone, PartialEq)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn from_seed(seed: &[u8]) -> Rng {
        let lower = murmur2(seed, 1690382925).swap_bytes();
        let upper = murmur2(seed, 72970470).swap_bytes();
        let state = u64::from(lower) | (u64::from(upper) << 32);
        Rng { state }
    }

    /// Seeds a generator from the wall clock, so that separate renders are uncorrelated.
    pub fn from_time() -> Rng {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        Rng::from_seed(&nanos.to_le_bytes())
    }

    /// Picks a random value uniformly distributed between `0.0` (inclusive) and `1.0` (exclusive).
    pub fn rnd(&mut self) -> f64 {
        let old_state = self.state;
        self.state = old_state.wrapping_mul(MUL).wrapping_add(INC);
        // PCG-XSH-RR output function over the old state.
        let xorshifted = ((((old_state >> 18) & !(3 << 30)) ^ old_state) >> 27) as u32;
        let fac = xorshifted.rotate_right((old_state >> 59) as u32);
        2.0f64.powi(-32) * f64::from(fac)
    }

    /// Picks a random value uniformly distributed between `min` (inclusive) and `max` (exclusive).
    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        self.rnd() * (max - min) + min
    }

    /// Picks an integer uniformly from `0..n`. Returns `0` when `n <= 0`.
    pub fn below(&mut self, n: i32) -> i32 {
        if n <= 0 {
            return 0;
        }
        ((self.rnd() * f64::from(n)) as i32).min(n - 1)
    }

    /// Chooses an item from `items` at a uniformly random index.
    ///
    /// # Panics
    ///
    /// Panics if `items.is_empty()`.
    pub fn choice<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        items
            .get(self.index(items.len()))
            .expect("no items")
    }

    /// Picks an index uniformly from `0..len`. Returns `0` for an empty range.
    pub fn index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        (self.uniform(0.0, len as f64) as usize).min(len - 1)
    }
}

impl std::fmt::Debug for Rng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rng({:#018x})", self.state)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_seed_state() {
        assert_eq!(Rng::from_seed(b"").state, 0x381a85e943aeeb00);
        assert_eq!(
            Rng::from_seed(&hex!(
                "efa7bdd92b5e9cd9de9b54ac0e3dc60623f1c989a80ed9c5157fffff10c2a148"
            ))
            .state,
            0x506997572177a894
        );
    }

    #[test]
    fn test_rnd_sequence() {
        let mut rng = Rng::from_seed(b"");
        let us: [f64; 4] = std::array::from_fn(|_| rng.rnd());
        assert_eq!(
            us,
            [
                0.8438512671273202,
                0.43491613143123686,
                0.26782758394256234,
                0.9794597257860005,
            ]
        );
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = Rng::from_seed(b"A1b2");
        let mut b = Rng::from_seed(b"A1b2");
        for _ in 0..64 {
            assert_eq!(a.rnd(), b.rnd());
        }
    }

    #[test]
    fn test_uniform_range() {
        let mut rng = Rng::from_seed(b"uniform");
        for _ in 0..1000 {
            let v = rng.uniform(3.0, 6.0);
            assert!((3.0..6.0).contains(&v), "{} out of range", v);
        }
    }

    #[test]
    fn test_below() {
        let mut rng = Rng::from_seed(b"below");
        assert_eq!(rng.below(0), 0);
        assert_eq!(rng.below(-5), 0);
        assert_eq!(rng.below(1), 0);
        let mut seen = [false; 6];
        for _ in 0..1000 {
            let v = rng.below(6);
            assert!((0..6).contains(&v));
            seen[v as usize] = true;
        }
        assert_eq!(seen, [true; 6]);
    }

    #[test]
    fn test_choice_covers_all_items() {
        let mut rng = Rng::from_seed(b"");
        let colors = &["red", "green", "blue"];
        let picks: Vec<&str> = (0..64).map(|_| *rng.choice(colors)).collect();
        for color in colors {
            assert!(picks.contains(color), "never picked {}", color);
        }
    }

    #[test]
    #[should_panic(expected = "no items")]
    fn test_choice_empty() {
        let mut rng = Rng::from_seed(b"");
        rng.choice::<u8>(&[]);
    }
}

fn murmur2(bytes: &[u8], seed: u32) -> u32 {
    const K: usize = 16;
    const MASK: Wrapping<u32> = Wrapping(0xffff);
    const MASK_BYTE: Wrapping<u32> = Wrapping(0xff);
    const M: Wrapping<u32> = Wrapping(0x5bd1e995);

    let mut l: usize = bytes.len();
    let mut h = Wrapping(seed ^ (l as u32));
    let mut i = 0;

    let byte32 = |i: usize| Wrapping(u32::from(bytes[i]));

    while l >= 4 {
        let mut k = (byte32(i) & MASK_BYTE)
            | ((byte32(i + 1) & MASK_BYTE) << 8)
            | ((byte32(i + 2) & MASK_BYTE) << 16)
            | ((byte32(i + 3) & MASK_BYTE) << 24);
        i += 4;
        k = (k & MASK) * M + ((((k >> K) * M) & MASK) << K);
        k ^= k >> 24;
        k = (k & MASK) * M + ((((k >> K) * M) & MASK) << K);
        h = ((h & MASK) * M + ((((h >> K) * M) & MASK) << K)) ^ k;
        l -= 4;
    }
    if l >= 3 {
        h ^= (byte32(i + 2) & MASK_BYTE) << K;
    }
    if l >= 2 {
        h ^= (byte32(i + 1) & MASK_BYTE) << 8;
    }
    if l >= 1 {
        h ^= byte32(i) & MASK_BYTE;
        h = (h & MASK) * M + ((((h >> K) * M) & MASK) << K);
    }

    h ^= h >> 13;
    h = (h & MASK) * M + ((((h >> K) * M) & MASK) << K);
    h ^= h >> 15;

    h.0
}

#[cfg(test)]
mod murmur2_test {
    use super::*;

    #[test]
    fn test() {
        assert_eq!(murmur2(b"", 0), 0);
        assert_eq!(murmur2(b"\x12", 0), 0x85701953);
        assert_eq!(murmur2(b"\x12\x34\x56\x78", 0), 0x52bcf091);
    }
}
