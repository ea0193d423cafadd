#[derive(thiserror::Error)]
pub enum Error {
    // dependency errors
    #[error("enum conversion: {0}")]
    Strum(#[from] strum::ParseError),

    // std errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    // crate errors
    #[error("found footer magic of {magic:#x} instead of {:#x}", super::MAGIC)]
    FormatMismatch { magic: u32 },

    #[error("footer key material at offset {offset:#x} runs past the end of the footer")]
    CorruptFooter { offset: u16 },

    #[error("metadata is {len:#x} bytes but at least {min:#x} are required")]
    TooSmall { len: usize, min: usize },

    #[error("lookup tables must be {} bytes, got {len}", super::TABLES_SIZE)]
    Tables { len: usize },

    #[error("refusing to overwrite input file \"{0}\"")]
    OverwriteInput(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}
