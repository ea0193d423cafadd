use crate::ext::{xor_in_place, SliceExt};
use crate::{EntryLayout, RoundKeys, BLOCK_SIZE, FOOTER_SIZE, SCHEDULE_SEED_SIZE};

const MAGIC_OFFSET: usize = 0xC8;
const KEY_OFFSET_OFFSET: usize = 0xD2;
const SEED_PAD_OFFSET: usize = 0x3000;
const SCHEDULE_PAD_OFFSET: usize = 0x3010;

/// Constant mixed into the chain IV of every file
pub const HARD_KEY: [u8; BLOCK_SIZE] = hex_literal::hex!("AD2F4230 6704B09C 9D2AC0BA 0EBFA568");

/// Key material recovered from the trailing [`FOOTER_SIZE`] bytes of an obfuscated
/// metadata file.
///
/// Parsing copies everything it needs out of the buffer, so the buffer can be
/// decrypted in place afterwards.
#[derive(Clone)]
pub struct Footer {
    magic: u32,
    key_offset: u16,
    seed: [u8; BLOCK_SIZE],
    schedule_seed: [u8; SCHEDULE_SEED_SIZE],
    layout: EntryLayout,
}

impl Footer {
    pub fn parse(metadata: &[u8]) -> Result<Self, super::Error> {
        if metadata.len() < FOOTER_SIZE {
            return Err(super::Error::TooSmall {
                len: metadata.len(),
                min: FOOTER_SIZE,
            });
        }
        let footer = &metadata[metadata.len() - FOOTER_SIZE..];

        let magic = footer.u32_at(MAGIC_OFFSET);
        if magic != super::MAGIC {
            return Err(super::Error::FormatMismatch { magic });
        }

        let key_offset = footer.u16_at(KEY_OFFSET_OFFSET);
        let start = key_offset as usize;
        let material = footer
            .get(start..start + BLOCK_SIZE + SCHEDULE_SEED_SIZE)
            .ok_or(super::Error::CorruptFooter { offset: key_offset })?;

        let mut seed = [0; BLOCK_SIZE];
        seed.copy_from_slice(&material[..BLOCK_SIZE]);
        xor_in_place(&mut seed, &footer[SEED_PAD_OFFSET..]);

        let mut schedule_seed = [0; SCHEDULE_SEED_SIZE];
        schedule_seed.copy_from_slice(&material[BLOCK_SIZE..]);
        let pad = &footer[SCHEDULE_PAD_OFFSET..SCHEDULE_PAD_OFFSET + SCHEDULE_SEED_SIZE];
        for (i, (b, p)) in schedule_seed.iter_mut().zip(pad).enumerate() {
            *b ^= p ^ seed[i % BLOCK_SIZE];
        }

        let layout = EntryLayout::new(metadata.len());
        log::debug!(
            "footer: magic {magic:#x}, key offset {key_offset:#x}, entry size {:#x}",
            layout.entry_size
        );

        Ok(Self {
            magic,
            key_offset,
            seed,
            schedule_seed,
            layout,
        })
    }

    pub fn magic(&self) -> u32 {
        self.magic
    }

    /// Offset of the key material within the footer
    pub fn key_offset(&self) -> u16 {
        self.key_offset
    }

    /// Unmasked per-file seed
    pub fn seed(&self) -> &[u8; BLOCK_SIZE] {
        &self.seed
    }

    /// Unmasked key schedule seed
    pub fn schedule_seed(&self) -> &[u8; SCHEDULE_SEED_SIZE] {
        &self.schedule_seed
    }

    pub fn layout(&self) -> EntryLayout {
        self.layout
    }

    pub fn round_keys(&self) -> RoundKeys {
        RoundKeys::compress(&self.schedule_seed)
    }

    /// Value every entry's chain starts from
    pub fn chain_iv(&self) -> [u8; BLOCK_SIZE] {
        let mut iv = self.seed;
        xor_in_place(&mut iv, &HARD_KEY);
        iv
    }
}

impl std::fmt::Debug for Footer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Footer")
            .field("magic", &format_args!("{:#x}", self.magic))
            .field("key_offset", &format_args!("{:#x}", self.key_offset))
            .field("seed", &hex::encode(self.seed))
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}
