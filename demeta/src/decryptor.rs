use crate::{
    BlockCipher, ChainSpan, Error, Footer, LookupTables, StringDecryptionContext, ENTRY_COUNT,
};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Entry sizes are rounded down to a multiple of this
const ENTRY_ALIGN: usize = 0x40;

/// Partitioning of a metadata file into [`ENTRY_COUNT`] equal entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryLayout {
    /// Length of the whole file
    pub len: usize,
    /// Length of each entry
    pub entry_size: usize,
}

impl EntryLayout {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            entry_size: len / ENTRY_COUNT / ENTRY_ALIGN * ENTRY_ALIGN,
        }
    }

    /// A file too small to hold a single aligned block per entry decrypts to itself
    pub fn is_degenerate(&self) -> bool {
        self.entry_size == 0
    }

    /// Bytes covered by entries. Anything past this is never decrypted.
    pub fn region(&self) -> usize {
        self.entry_size * ENTRY_COUNT
    }
}

#[derive(Debug, Default, Clone)]
pub struct DecryptorBuilder {
    chain_span: ChainSpan,
}

impl DecryptorBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn chain_span(mut self, chain_span: ChainSpan) -> Self {
        self.chain_span = chain_span;
        self
    }
    pub fn build(self, tables: LookupTables) -> MetadataDecryptor {
        MetadataDecryptor {
            tables,
            chain_span: self.chain_span,
        }
    }
}

/// Reusable decryptor for obfuscated metadata files
#[derive(Debug, Clone)]
pub struct MetadataDecryptor {
    tables: LookupTables,
    chain_span: ChainSpan,
}

impl MetadataDecryptor {
    pub fn builder() -> DecryptorBuilder {
        DecryptorBuilder::new()
    }

    pub fn chain_span(&self) -> ChainSpan {
        self.chain_span
    }

    /// Decrypts `metadata` in place and derives its string decryption context
    pub fn decrypt(&self, metadata: &mut [u8]) -> Result<StringDecryptionContext, Error> {
        self.decrypt_blocks(metadata)?;
        StringDecryptionContext::derive(metadata)
    }

    /// Decrypts the block cipher layer of `metadata` in place.
    ///
    /// The footer is fully validated before the first write, so on error the
    /// buffer is untouched.
    pub fn decrypt_blocks(&self, metadata: &mut [u8]) -> Result<EntryLayout, Error> {
        let footer = Footer::parse(metadata)?;
        let layout = footer.layout();
        if layout.is_degenerate() {
            log::warn!(
                "metadata of {:#x} bytes is too small to hold any entries, leaving it as is",
                layout.len
            );
            return Ok(layout);
        }

        let keys = footer.round_keys();
        let cipher = BlockCipher::new(&keys, &self.tables);
        let iv = footer.chain_iv();
        let chained = self.chain_span.chained_len(layout.entry_size);
        log::debug!(
            "decrypting {ENTRY_COUNT} entries of {:#x} bytes, {chained:#x} chained each",
            layout.entry_size
        );

        let entries = &mut metadata[..layout.region()];
        #[cfg(feature = "parallel")]
        let entries = entries.par_chunks_mut(layout.entry_size);
        #[cfg(not(feature = "parallel"))]
        let entries = entries.chunks_mut(layout.entry_size);
        // the chain restarts from the same IV in every entry
        entries.for_each(|entry| cipher.decrypt_chain(&mut entry[..chained], &iv));

        Ok(layout)
    }
}
