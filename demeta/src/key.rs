use crate::BLOCK_SIZE;

/// Size of the footer key material folded into [`RoundKeys`]
pub const SCHEDULE_SEED_SIZE: usize = 0xB00;

/// Number of 16-byte subkeys: initial whitening, nine rounds and the final round
pub const SUBKEY_COUNT: usize = 11;

/// Round key schedule of the block transform
#[derive(Clone, PartialEq, Eq)]
pub struct RoundKeys([u8; SUBKEY_COUNT * BLOCK_SIZE]);

impl RoundKeys {
    /// Folds each 16-byte chunk of `seed` into one key byte by XOR
    pub fn compress(seed: &[u8; SCHEDULE_SEED_SIZE]) -> Self {
        let mut keys = [0; SUBKEY_COUNT * BLOCK_SIZE];
        for (key, chunk) in keys.iter_mut().zip(seed.chunks_exact(BLOCK_SIZE)) {
            *key = chunk.iter().fold(0, |acc, b| acc ^ b);
        }
        Self(keys)
    }

    pub fn subkey(&self, round: usize) -> &[u8] {
        &self.0[round * BLOCK_SIZE..(round + 1) * BLOCK_SIZE]
    }

    pub fn as_bytes(&self) -> &[u8; SUBKEY_COUNT * BLOCK_SIZE] {
        &self.0
    }
}

impl From<[u8; SUBKEY_COUNT * BLOCK_SIZE]> for RoundKeys {
    fn from(value: [u8; SUBKEY_COUNT * BLOCK_SIZE]) -> Self {
        Self(value)
    }
}

impl std::fmt::Debug for RoundKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RoundKeys({})", hex::encode(self.0))
    }
}
