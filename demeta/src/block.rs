//! The 16-byte block transform.
//!
//! Structurally this is a decryption-direction AES with its tables swapped out:
//! key whitening, nine rounds of four-table lookups over a shuffled block, then a
//! substitution-only final round. Unlike AES the final round combines its table
//! with the complement of the input byte, and the schedule is folded from footer
//! data instead of being expanded from a cipher key.
use crate::ext::xor_in_place;
use crate::{LookupTables, RoundKeys, PERMUTATION};

pub const BLOCK_SIZE: usize = 16;

/// Rounds including the final substitution-only round
const ROUNDS: usize = 10;

/// Block transform bound to one file's round keys
#[derive(Debug, Clone, Copy)]
pub struct BlockCipher<'a> {
    keys: &'a RoundKeys,
    tables: &'a LookupTables,
}

impl<'a> BlockCipher<'a> {
    pub fn new(keys: &'a RoundKeys, tables: &'a LookupTables) -> Self {
        Self { keys, tables }
    }

    /// Decrypts a single 16-byte block in place
    pub fn decrypt_block(&self, block: &mut [u8; BLOCK_SIZE]) {
        self.decrypt_at(block, 0)
    }

    /// Decrypts the block at `data[offset..offset + 16]` in place
    pub fn decrypt_at(&self, data: &mut [u8], offset: usize) {
        let block = &mut data[offset..offset + BLOCK_SIZE];
        let [a, b, c, d] = &self.tables.round;

        xor_in_place(block, self.keys.subkey(0));

        for round in 1..ROUNDS {
            let mut mixed = [0u8; BLOCK_SIZE];
            for (lane, out) in mixed.chunks_exact_mut(4).enumerate() {
                let p = &PERMUTATION[4 * lane..4 * lane + 4];
                let word = a[block[p[0] as usize] as usize]
                    ^ b[block[p[1] as usize] as usize]
                    ^ c[block[p[2] as usize] as usize]
                    ^ d[block[p[3] as usize] as usize];
                out.copy_from_slice(&word.to_le_bytes());
            }
            xor_in_place(&mut mixed, self.keys.subkey(round));
            block.copy_from_slice(&mixed);
        }

        let mut last = [0u8; BLOCK_SIZE];
        for (out, &p) in last.iter_mut().zip(&PERMUTATION) {
            let t = block[p as usize];
            *out = self.tables.last[t as usize] ^ !t;
        }
        xor_in_place(&mut last, self.keys.subkey(ROUNDS));
        block.copy_from_slice(&last);
    }

    /// Decrypts `data` in CBC fashion starting from `iv`.
    ///
    /// Each block is XORed with the ciphertext of the block before it, the first
    /// with `iv`. A trailing partial block is left untouched.
    pub fn decrypt_chain(&self, data: &mut [u8], iv: &[u8; BLOCK_SIZE]) {
        let mut chain = *iv;
        let end = data.len() - data.len() % BLOCK_SIZE;
        for offset in (0..end).step_by(BLOCK_SIZE) {
            let mut cipher = [0u8; BLOCK_SIZE];
            cipher.copy_from_slice(&data[offset..offset + BLOCK_SIZE]);
            self.decrypt_at(data, offset);
            xor_in_place(&mut data[offset..offset + BLOCK_SIZE], &chain);
            chain = cipher;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Mt64;

    const SUBKEY_COUNT_BYTES: usize = crate::SUBKEY_COUNT * BLOCK_SIZE;

    fn random_tables(seed: u64) -> LookupTables {
        let mut rng = Mt64::new(seed);
        let round = std::array::from_fn(|_| std::array::from_fn(|_| rng.next_u64() as u32));
        let last = std::array::from_fn(|_| rng.next_u64() as u8);
        LookupTables::new(round, last)
    }

    fn random_keys(seed: u64) -> RoundKeys {
        let mut rng = Mt64::new(seed);
        RoundKeys::from(std::array::from_fn(|_| rng.next_u64() as u8))
    }

    #[test]
    fn test_zero_tables() {
        // every round collapses to its subkey, leaving only the final round
        let tables = LookupTables::new([[0; 256]; 4], [0; 256]);
        let keys = random_keys(1);
        let cipher = BlockCipher::new(&keys, &tables);

        let mut block = [0x42; BLOCK_SIZE];
        cipher.decrypt_block(&mut block);

        for (i, &out) in block.iter().enumerate() {
            let t = keys.subkey(9)[PERMUTATION[i] as usize];
            assert_eq!(out, !t ^ keys.subkey(10)[i]);
        }
    }

    #[test]
    fn test_lane_layout() {
        // first table passes its index through to the low byte of the lane
        let mut round = [[0; 256]; 4];
        round[0] = std::array::from_fn(|i| i as u32);
        let tables = LookupTables::new(round, [0; 256]);
        let keys = RoundKeys::from([0; SUBKEY_COUNT_BYTES]);
        let cipher = BlockCipher::new(&keys, &tables);

        let mut block: [u8; BLOCK_SIZE] = std::array::from_fn(|i| 0x10 + i as u8);
        cipher.decrypt_block(&mut block);

        let mut expected = [0xFF; BLOCK_SIZE];
        expected[0] = !0x10;
        expected[4] = !0x14;
        expected[8] = !0x18;
        expected[12] = !0x1C;
        assert_eq!(block, expected);
    }

    #[test]
    fn test_deterministic() {
        let tables = random_tables(2);
        let keys = random_keys(3);
        let cipher = BlockCipher::new(&keys, &tables);

        let input: [u8; BLOCK_SIZE] = std::array::from_fn(|i| i as u8 * 17);
        let mut first = input;
        let mut second = input;
        cipher.decrypt_block(&mut first);
        cipher.decrypt_block(&mut second);
        assert_eq!(first, second);
        assert_ne!(first, input);

        // same transform at an offset inside a larger buffer
        let mut data = [0xEE; 3 * BLOCK_SIZE];
        data[BLOCK_SIZE..2 * BLOCK_SIZE].copy_from_slice(&input);
        cipher.decrypt_at(&mut data, BLOCK_SIZE);
        assert_eq!(&data[BLOCK_SIZE..2 * BLOCK_SIZE], &first);
        assert!(data[..BLOCK_SIZE].iter().all(|&b| b == 0xEE));
        assert!(data[2 * BLOCK_SIZE..].iter().all(|&b| b == 0xEE));
    }

    #[test]
    fn test_diffusion() {
        let tables = random_tables(4);
        let keys = random_keys(5);
        let cipher = BlockCipher::new(&keys, &tables);

        let input = [0u8; BLOCK_SIZE];
        let mut base = input;
        cipher.decrypt_block(&mut base);

        for i in 0..BLOCK_SIZE {
            let mut changed = input;
            changed[i] ^= 0x01;
            cipher.decrypt_block(&mut changed);
            for lane in 0..4 {
                assert_ne!(
                    &base[4 * lane..4 * lane + 4],
                    &changed[4 * lane..4 * lane + 4],
                    "input byte {i} did not reach lane {lane}"
                );
            }
        }
    }

    #[test]
    fn test_chain() {
        let tables = random_tables(6);
        let keys = random_keys(7);
        let cipher = BlockCipher::new(&keys, &tables);
        let iv = [0x3C; BLOCK_SIZE];

        let ciphertext: [u8; 3 * BLOCK_SIZE] = std::array::from_fn(|i| (i * 7) as u8);
        let mut plain = ciphertext;
        cipher.decrypt_chain(&mut plain, &iv);

        for n in 0..3 {
            let mut block = [0; BLOCK_SIZE];
            block.copy_from_slice(&ciphertext[n * BLOCK_SIZE..(n + 1) * BLOCK_SIZE]);
            cipher.decrypt_block(&mut block);
            let prev = match n {
                0 => &iv[..],
                _ => &ciphertext[(n - 1) * BLOCK_SIZE..n * BLOCK_SIZE],
            };
            xor_in_place(&mut block, prev);
            assert_eq!(&plain[n * BLOCK_SIZE..(n + 1) * BLOCK_SIZE], &block);
        }

        // tampering with block 1 ciphertext only affects blocks 1 and 2
        let mut tampered = ciphertext;
        tampered[BLOCK_SIZE] ^= 0x80;
        cipher.decrypt_chain(&mut tampered, &iv);
        assert_eq!(&tampered[..BLOCK_SIZE], &plain[..BLOCK_SIZE]);
        assert_ne!(&tampered[BLOCK_SIZE..2 * BLOCK_SIZE], &plain[BLOCK_SIZE..2 * BLOCK_SIZE]);
        let diff: Vec<u8> = tampered[2 * BLOCK_SIZE..]
            .iter()
            .zip(&plain[2 * BLOCK_SIZE..])
            .map(|(a, b)| a ^ b)
            .collect();
        let mut expected = [0; BLOCK_SIZE];
        expected[0] = 0x80;
        assert_eq!(diff, expected);
    }

    #[test]
    fn test_chain_partial_tail() {
        let tables = random_tables(8);
        let keys = random_keys(9);
        let cipher = BlockCipher::new(&keys, &tables);

        let mut data = [0x11; BLOCK_SIZE + 5];
        cipher.decrypt_chain(&mut data, &[0; BLOCK_SIZE]);
        assert_eq!(&data[BLOCK_SIZE..], &[0x11; 5]);
    }
}
