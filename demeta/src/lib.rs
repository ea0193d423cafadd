//! Decryption of obfuscated IL2CPP `global-metadata.dat` files.
//!
//! Some games ship their metadata with a custom 16-byte substitution-permutation
//! cipher applied in a CBC-like mode over 256 equal partitions of the file, keyed
//! from a trailing 0x4000 byte footer. The string tables are further masked with
//! values drawn from an MT19937-64 stream seeded from the decrypted header.
//!
//! [`decrypt_metadata`] reverses both layers: the buffer is decrypted in place and
//! the returned [`StringDecryptionContext`] carries what a metadata parser needs
//! to decode the string tables.
mod block;
mod decryptor;
mod error;
mod ext;
mod footer;
mod key;
mod mt;
mod strings;
mod tables;

pub use {
    block::*, decryptor::*, error::*, footer::*, key::*, mt::*, strings::*, tables::*,
};

/// Size of the trailing control region of an obfuscated metadata file
pub const FOOTER_SIZE: usize = 0x4000;

/// Magic found at footer offset 0xC8 of every obfuscated metadata file
pub const MAGIC: u32 = 0x2CFEFC2E;

/// Number of equal partitions the block decryptor splits a file into
pub const ENTRY_COUNT: usize = 0x100;

/// Number of leading bytes of each entry chained by [`ChainSpan::Prefix`]
pub const PREFIX_SPAN: usize = 0x40;

/// How much of each entry the block chain covers.
#[derive(
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Debug,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum ChainSpan {
    /// Every 16-byte block of the entry
    #[default]
    Entry,
    /// Only the first [`PREFIX_SPAN`] bytes of the entry
    Prefix,
}

// strum shouldn't need to be installed by users
impl ChainSpan {
    pub fn iter() -> ChainSpanIter {
        <ChainSpan as strum::IntoEnumIterator>::iter()
    }

    /// Number of bytes chained in an entry of `entry_size` bytes
    pub fn chained_len(self, entry_size: usize) -> usize {
        match self {
            ChainSpan::Entry => entry_size,
            ChainSpan::Prefix => entry_size.min(PREFIX_SPAN),
        }
    }
}

/// Decrypts `metadata` in place with the default options and derives the string
/// decryption context from the result.
///
/// Nothing is written to `metadata` unless the footer validates.
pub fn decrypt_metadata(
    metadata: &mut [u8],
    tables: &LookupTables,
) -> Result<StringDecryptionContext, Error> {
    DecryptorBuilder::new().build(tables.clone()).decrypt(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_chain_span_names() {
        assert_eq!(ChainSpan::from_str("entry").unwrap(), ChainSpan::Entry);
        assert_eq!(ChainSpan::from_str("prefix").unwrap(), ChainSpan::Prefix);
        assert!(ChainSpan::from_str("global").is_err());
        assert_eq!(ChainSpan::Prefix.to_string(), "prefix");
        assert_eq!(ChainSpan::iter().count(), 2);
    }

    #[test]
    fn test_chained_len() {
        assert_eq!(ChainSpan::Entry.chained_len(0x100), 0x100);
        assert_eq!(ChainSpan::Prefix.chained_len(0x100), 0x40);
        assert_eq!(ChainSpan::Prefix.chained_len(0), 0);
        assert_eq!(ChainSpan::default(), ChainSpan::Entry);
    }
}
