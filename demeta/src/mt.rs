//! 64-bit Mersenne Twister (MT19937-64).

const NN: usize = 312;
const MM: usize = 156;
const MATRIX_A: u64 = 0xB502_6F5A_A966_19E9;
const UPPER_MASK: u64 = 0xFFFF_FFFF_8000_0000;
const LOWER_MASK: u64 = 0x0000_0000_7FFF_FFFF;

/// MT19937-64 generator. One instance per stream; state is not shared.
#[derive(Clone)]
pub struct Mt64 {
    state: [u64; NN],
    index: usize,
}

impl Mt64 {
    pub fn new(seed: u64) -> Self {
        let mut state = [0; NN];
        state[0] = seed;
        for i in 1..NN {
            let prev = state[i - 1];
            state[i] = 6364136223846793005u64
                .wrapping_mul(prev ^ (prev >> 62))
                .wrapping_add(i as u64);
        }
        Self { state, index: NN }
    }

    /// Seeds from a key array the way the reference `init_by_array64` does.
    /// An empty key behaves as a single zero word.
    pub fn from_key(key: &[u64]) -> Self {
        let mut mt = Self::new(19650218);
        let s = &mut mt.state;
        let key_len = key.len().max(1);

        let (mut i, mut j) = (1, 0);
        for _ in 0..NN.max(key_len) {
            let prev = s[i - 1];
            s[i] = (s[i] ^ (prev ^ (prev >> 62)).wrapping_mul(3935559000370003845))
                .wrapping_add(key.get(j).copied().unwrap_or_default())
                .wrapping_add(j as u64);
            i += 1;
            j += 1;
            if i >= NN {
                s[0] = s[NN - 1];
                i = 1;
            }
            if j >= key_len {
                j = 0;
            }
        }
        for _ in 0..NN - 1 {
            let prev = s[i - 1];
            s[i] = (s[i] ^ (prev ^ (prev >> 62)).wrapping_mul(2862933555777941757))
                .wrapping_sub(i as u64);
            i += 1;
            if i >= NN {
                s[0] = s[NN - 1];
                i = 1;
            }
        }
        s[0] = 1 << 63;
        mt
    }

    fn twist(&mut self) {
        for i in 0..NN {
            let x = (self.state[i] & UPPER_MASK) | (self.state[(i + 1) % NN] & LOWER_MASK);
            let mut next = self.state[(i + MM) % NN] ^ (x >> 1);
            if x & 1 != 0 {
                next ^= MATRIX_A;
            }
            self.state[i] = next;
        }
        self.index = 0;
    }

    /// Next tempered output in `[0, 2^64)`
    pub fn next_u64(&mut self) -> u64 {
        if self.index >= NN {
            self.twist();
        }
        let mut x = self.state[self.index];
        self.index += 1;

        x ^= (x >> 29) & 0x5555_5555_5555_5555;
        x ^= (x << 17) & 0x71D6_7FFF_EDA6_0000;
        x ^= (x << 37) & 0xFFF7_EEE0_0000_0000;
        x ^ (x >> 43)
    }

    /// Next output in `[0, 2^63)`
    pub fn next63(&mut self) -> u64 {
        self.next_u64() >> 1
    }
}

impl std::fmt::Debug for Mt64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mt64")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}
