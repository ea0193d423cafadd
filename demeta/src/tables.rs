use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use std::io::{Read, Write};

/// Byte order applied to the block before every table lookup round
pub const PERMUTATION: [u8; 16] = [0, 13, 10, 7, 4, 1, 14, 11, 8, 5, 2, 15, 12, 9, 6, 3];

/// Serialized size of [`LookupTables`]: four 256 entry u32 tables and one 256 entry byte table
pub const TABLES_SIZE: usize = 4 * 256 * 4 + 256;

/// Substitution tables of the block transform.
///
/// These are opaque data lifted from the game binary and are not derivable from
/// anything in the metadata file, so they are loaded from a table asset rather
/// than compiled in. The asset holds the four round tables as little-endian u32s,
/// in lookup order, followed by the final round byte table.
#[derive(Clone, PartialEq, Eq)]
pub struct LookupTables {
    pub(crate) round: [[u32; 256]; 4],
    pub(crate) last: [u8; 256],
}

impl LookupTables {
    pub fn new(round: [[u32; 256]; 4], last: [u8; 256]) -> Self {
        Self { round, last }
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self, super::Error> {
        let mut round = [[0; 256]; 4];
        for table in &mut round {
            reader.read_u32_into::<LE>(table)?;
        }
        let mut last = [0; 256];
        reader.read_exact(&mut last)?;
        Ok(Self { round, last })
    }

    /// Parses a table asset, which must be exactly [`TABLES_SIZE`] bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, super::Error> {
        if bytes.len() != TABLES_SIZE {
            return Err(super::Error::Tables { len: bytes.len() });
        }
        Self::read(&mut std::io::Cursor::new(bytes))
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), super::Error> {
        for table in &self.round {
            for &word in table {
                writer.write_u32::<LE>(word)?;
            }
        }
        writer.write_all(&self.last)?;
        Ok(())
    }
}

impl std::fmt::Debug for LookupTables {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupTables").finish_non_exhaustive()
    }
}
