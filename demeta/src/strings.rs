use crate::ext::SliceExt;
use crate::Mt64;
use byteorder::{ByteOrder, ReadBytesExt, WriteBytesExt, LE};
use std::io::{Read, Write};

/// Size of the keystream used to decode string data
pub const STRING_BLOB_SIZE: usize = 0x5000;

/// Header words gathered into the seed selection table, as (offset, count)
const SEED_WORDS: [(usize, usize); 5] = [(0x60, 4), (0x140, 4), (0x100, 4), (0xF0, 2), (0x8, 4)];
const SEED_WORD_COUNT: usize = 18;

/// Bytes of header needed to derive the context
const HEADER_SPAN: usize = 0x150;

/// Masks and keystream a metadata parser needs to decode the string tables of a
/// decrypted metadata file.
#[derive(Clone, PartialEq, Eq)]
pub struct StringDecryptionContext {
    pub string_count_xor: u32,
    pub string_offset_xor: u32,
    pub string_literal_offset_xor: u32,
    pub string_literal_data_count_xor: u32,
    pub string_literal_data_offset_xor: u32,
    pub string_decryption_blob: Box<[u8; STRING_BLOB_SIZE]>,
}

impl StringDecryptionContext {
    /// Derives the context from the header of a decrypted metadata file
    pub fn derive(metadata: &[u8]) -> Result<Self, super::Error> {
        let mut rng = Mt64::new(Self::seed(metadata)?);

        let string_count_xor = rng.next63() as u32;
        let string_offset_xor = rng.next63() as u32;
        // this draw masks a field the parser never reads
        rng.next63();
        let string_literal_offset_xor = rng.next63() as u32;
        let string_literal_data_count_xor = rng.next63() as u32;
        let string_literal_data_offset_xor = rng.next63() as u32;

        let mut string_decryption_blob = Box::new([0u8; STRING_BLOB_SIZE]);
        for slot in string_decryption_blob.chunks_exact_mut(8) {
            LE::write_u64(slot, rng.next63());
        }

        Ok(Self {
            string_count_xor,
            string_offset_xor,
            string_literal_offset_xor,
            string_literal_data_count_xor,
            string_literal_data_offset_xor,
            string_decryption_blob,
        })
    }

    /// Seed of the keystream generator.
    ///
    /// Two of eighteen header words are picked by the low nibbles of two others
    /// and joined into the high and low halves.
    pub fn seed(metadata: &[u8]) -> Result<u64, super::Error> {
        if metadata.len() < HEADER_SPAN {
            return Err(super::Error::TooSmall {
                len: metadata.len(),
                min: HEADER_SPAN,
            });
        }
        let mut values = [0u32; SEED_WORD_COUNT];
        let mut filled = 0;
        for (offset, count) in SEED_WORDS {
            metadata.u32s_at(offset, &mut values[filled..filled + count]);
            filled += count;
        }

        let high = values[(values[0] & 0xF) as usize];
        let low = values[(values[SEED_WORD_COUNT - 1] & 0xF) as usize + 2];
        let seed = (u64::from(high) << 32) | u64::from(low);
        log::trace!("string decryption seed: {seed:#018x}");
        Ok(seed)
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self, super::Error> {
        let string_count_xor = reader.read_u32::<LE>()?;
        let string_offset_xor = reader.read_u32::<LE>()?;
        let string_literal_offset_xor = reader.read_u32::<LE>()?;
        let string_literal_data_count_xor = reader.read_u32::<LE>()?;
        let string_literal_data_offset_xor = reader.read_u32::<LE>()?;
        let mut string_decryption_blob = Box::new([0u8; STRING_BLOB_SIZE]);
        reader.read_exact(&mut string_decryption_blob[..])?;
        Ok(Self {
            string_count_xor,
            string_offset_xor,
            string_literal_offset_xor,
            string_literal_data_count_xor,
            string_literal_data_offset_xor,
            string_decryption_blob,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), super::Error> {
        writer.write_u32::<LE>(self.string_count_xor)?;
        writer.write_u32::<LE>(self.string_offset_xor)?;
        writer.write_u32::<LE>(self.string_literal_offset_xor)?;
        writer.write_u32::<LE>(self.string_literal_data_count_xor)?;
        writer.write_u32::<LE>(self.string_literal_data_offset_xor)?;
        writer.write_all(&self.string_decryption_blob[..])?;
        Ok(())
    }
}

impl std::fmt::Debug for StringDecryptionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringDecryptionContext")
            .field("string_count_xor", &format_args!("{:#010x}", self.string_count_xor))
            .field("string_offset_xor", &format_args!("{:#010x}", self.string_offset_xor))
            .field(
                "string_literal_offset_xor",
                &format_args!("{:#010x}", self.string_literal_offset_xor),
            )
            .field(
                "string_literal_data_count_xor",
                &format_args!("{:#010x}", self.string_literal_data_count_xor),
            )
            .field(
                "string_literal_data_offset_xor",
                &format_args!("{:#010x}", self.string_literal_data_offset_xor),
            )
            .finish_non_exhaustive()
    }
}
