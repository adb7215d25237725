#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[cfg(not(target_env = "musl"))]
use mimalloc as _;

use std::path::PathBuf;
use std::{fs, io::prelude::*};

use amxasm_assembler::prelude::*;
use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::{Level, LevelFilter};
use orthrus_core::data::Endian;
use owo_colors::OwoColorize;

fn color_level(level: Level) -> String {
    match level {
        Level::Error => level.red().to_string(),
        Level::Warn => level.yellow().to_string(),
        Level::Info => level.green().to_string(),
        Level::Debug => level.blue().to_string(),
        Level::Trace => level.purple().to_string(),
    }
}

const fn level_filter(verbose: usize) -> LevelFilter {
    match verbose {
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        4 => LevelFilter::Debug,
        5 => LevelFilter::Trace,
        //default to off
        _ => LevelFilter::Off,
    }
}

/// Assembles a register-machine instruction listing into a loadable binary image.
#[derive(Parser, Debug)]
#[clap(name = "amxasm", version, author)]
struct Args {
    /// Assembly listing to assemble.
    input: PathBuf,

    /// Side-car description of the symbol/tag/library/debug tables (see
    /// `amxasm_assembler::symtab::SymbolTable::parse`).
    symbols: PathBuf,

    /// Output path for the assembled image.
    #[clap(short, long, default_value = "a.amx")]
    output: PathBuf,

    /// Disable compact (variable-length) cell encoding; write every cell at full width.
    #[clap(long)]
    no_compact: bool,

    /// Emit the overlay table and treat public/function addresses as overlay indices.
    #[clap(long)]
    overlay: bool,

    /// Append a debug block after the image.
    #[clap(short, long)]
    debug: bool,

    /// Disable array bounds checks in the emitted image.
    #[clap(long)]
    nochecks: bool,

    /// Declare the "uses sleep" flag in the header.
    #[clap(long)]
    uses_sleep: bool,

    /// Required alignment of the code section and of raw-mode cell writes.
    #[clap(long)]
    data_align: Option<usize>,

    /// Expansion margin for the compact codec; must be greater than 2.
    #[clap(long)]
    compact_margin: Option<usize>,

    /// Fallback stack+heap size, in cells, used when the listing carries no `stksize` directive.
    #[clap(long)]
    stack_cells: Option<u32>,

    /// Write the image big-endian instead of little-endian.
    #[clap(long)]
    big_endian: bool,

    /// Be verbose. Repeat for more detail (error, warn, info, debug, trace).
    #[clap(short, long, parse(from_occurrences))]
    verbose: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose != 0 {
        Builder::new()
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{}] {} {}",
                    orthrus_core::time::current_time(),
                    color_level(record.level()),
                    record.args()
                )
            })
            .filter(None, level_filter(args.verbose))
            .init();
    }

    let listing = fs::read_to_string(&args.input)
        .with_context(|| format!("reading listing {}", args.input.display()))?;
    let symbols_text = fs::read_to_string(&args.symbols)
        .with_context(|| format!("reading symbol table {}", args.symbols.display()))?;
    let table = SymbolTable::parse(&symbols_text).context("parsing symbol table")?;

    let defaults = AssemblerConfig::default();
    let config = AssemblerConfig {
        compact: !args.no_compact,
        overlay: args.overlay,
        debug: args.debug,
        nochecks: args.nochecks,
        uses_sleep: args.uses_sleep,
        data_align: args.data_align.unwrap_or(defaults.data_align),
        compact_margin: args.compact_margin.unwrap_or(defaults.compact_margin),
        stack_cells: args.stack_cells.unwrap_or(defaults.stack_cells),
    };
    let endian = if args.big_endian { Endian::Big } else { Endian::Little };

    log::info!("assembling {} -> {}", args.input.display(), args.output.display());
    let assembled = assemble(&listing, &table, &config, endian).context("assembling image")?;
    fs::write(&args.output, &assembled.bytes)
        .with_context(|| format!("writing {}", args.output.display()))?;

    log::info!(
        "wrote {} bytes ({} header+tables, {} code+data+debug)",
        assembled.bytes.len(),
        assembled.header_size,
        assembled.bytes.len() as u32 - assembled.header_size
    );
    Ok(())
}
