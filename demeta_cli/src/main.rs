use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use sha1::{Digest, Sha1};

#[derive(Parser, Debug)]
struct ActionInfo {
    /// Input global-metadata.dat path
    #[arg(index = 1)]
    input: String,
}

#[derive(Parser, Debug)]
struct ActionDecrypt {
    /// Input global-metadata.dat path
    #[arg(index = 1)]
    input: String,

    /// Output path. Defaults to <input>.decrypted
    #[arg(index = 2)]
    output: Option<String>,

    /// Lookup table asset the block cipher was built with
    #[arg(short, long)]
    tables: String,

    /// String decryption context output path. Defaults to <output>.strings
    #[arg(short, long)]
    context: Option<String>,

    /// How much of each entry is block chained
    #[arg(long, default_value_t = demeta::ChainSpan::Entry)]
    chain_span: demeta::ChainSpan,
}

#[derive(Parser, Debug)]
struct ActionContext {
    /// Already decrypted global-metadata.dat path
    #[arg(index = 1)]
    input: String,

    /// Output path. Defaults to <input>.strings
    #[arg(index = 2)]
    output: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Print footer info without decrypting
    Info(ActionInfo),
    /// Decrypt metadata and write its string decryption context
    Decrypt(ActionDecrypt),
    /// Write the string decryption context of already decrypted metadata
    Context(ActionContext),
}

#[derive(Parser, Debug)]
#[command(author, version)]
struct Args {
    #[command(subcommand)]
    action: Action,

    /// Log more, repeat for trace output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), demeta::Error> {
    let args = Args::parse();
    init_log(args.verbose);

    match args.action {
        Action::Info(args) => info(args),
        Action::Decrypt(args) => decrypt(args),
        Action::Context(args) => context(args),
    }
}

fn init_log(verbose: u8) {
    let level = match verbose {
        0 => simplelog::LevelFilter::Warn,
        1 => simplelog::LevelFilter::Debug,
        _ => simplelog::LevelFilter::Trace,
    };
    // only fails if a logger is already installed
    let _ = simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    );
}

/// Appends `.ext` to the full file name, keeping any existing extension
fn with_suffix(path: impl AsRef<Path>, ext: &str) -> PathBuf {
    let mut name = OsString::from(path.as_ref().as_os_str());
    name.push(".");
    name.push(ext);
    name.into()
}

fn info(args: ActionInfo) -> Result<(), demeta::Error> {
    let metadata = fs::read(&args.input)?;
    let footer = demeta::Footer::parse(&metadata)?;
    let layout = footer.layout();
    println!("length: {:#x}", layout.len);
    println!("magic: {:#x}", footer.magic());
    println!("key offset: {:#x}", footer.key_offset());
    println!("entry size: {:#x}", layout.entry_size);
    for span in demeta::ChainSpan::iter() {
        println!(
            "chained per entry ({span}): {:#x}",
            span.chained_len(layout.entry_size)
        );
    }
    println!("sha1: {}", hex::encode(Sha1::digest(&metadata)));
    Ok(())
}

fn decrypt(args: ActionDecrypt) -> Result<(), demeta::Error> {
    let output = args
        .output
        .map(PathBuf::from)
        .unwrap_or_else(|| with_suffix(&args.input, "decrypted"));
    if output == Path::new(&args.input) {
        return Err(demeta::Error::OverwriteInput(args.input));
    }
    let context_path = args
        .context
        .map(PathBuf::from)
        .unwrap_or_else(|| with_suffix(&output, "strings"));

    let tables = demeta::LookupTables::from_bytes(&fs::read(&args.tables)?)?;
    let mut metadata = fs::read(&args.input)?;
    let context = demeta::MetadataDecryptor::builder()
        .chain_span(args.chain_span)
        .build(tables)
        .decrypt(&mut metadata)?;

    fs::write(&output, &metadata)?;
    log::info!("wrote decrypted metadata to {}", output.display());
    write_context(&context, &context_path)
}

fn context(args: ActionContext) -> Result<(), demeta::Error> {
    let output = args
        .output
        .map(PathBuf::from)
        .unwrap_or_else(|| with_suffix(&args.input, "strings"));
    let metadata = fs::read(&args.input)?;
    let context = demeta::StringDecryptionContext::derive(&metadata)?;
    write_context(&context, &output)
}

fn write_context(
    context: &demeta::StringDecryptionContext,
    path: &Path,
) -> Result<(), demeta::Error> {
    log::debug!("{context:?}");
    let mut writer = BufWriter::new(File::create(path)?);
    context.write(&mut writer)?;
    writer.flush()?;
    log::info!("wrote string decryption context to {}", path.display());
    Ok(())
}
