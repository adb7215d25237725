//! Error conditions raised while assembling an image.

use orthrus_core::prelude::data::Error as DataError;
use snafu::prelude::*;

/// Errors produced by the assembler.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum Error {
    /// Thrown when a mnemonic is not present in the opcode table.
    #[snafu(display("Invalid assembler instruction: {mnemonic}"))]
    InvalidInstruction { mnemonic: String },

    /// Thrown when a symbolic operand can't be resolved against the symbol table.
    #[snafu(display("Undefined symbol: {name}"))]
    UndefinedSymbol { name: String },

    /// Thrown when a label reference has no corresponding `l.<hex>` definition.
    #[snafu(display("Undefined label: l.{index:x}"))]
    UndefinedLabel { index: usize },

    /// Thrown when a label is defined more than once.
    #[snafu(display("Label l.{index:x} is already defined"))]
    DuplicateLabel { index: usize },

    /// Thrown when a `parm1_p` operand doesn't fit in half a cell.
    #[snafu(display("Packed operand {value:#x} does not fit in {bits} bits"))]
    OperandTooWide { value: i128, bits: u32 },

    /// Thrown by the codec when compact-encoding a cell would overflow the compaction margin.
    /// The driver catches this, truncates the sink, disables compact mode, and restarts once.
    #[snafu(display("Compact encoding overflowed (bytes_out - bytes_in >= margin)"))]
    CompactOverflow,

    /// Thrown when a compact-encoding restart has already happened once.
    #[snafu(display("Compact encoding overflowed twice; giving up"))]
    CompactOverflowFatal,

    /// Thrown when an overlay index would not be sequential.
    #[snafu(display("Overlay index {got} is not sequential (expected {expected})"))]
    NonSequentialOverlay { got: u32, expected: u32 },

    /// Thrown when a malformed debug-string line is encountered.
    #[snafu(display("Malformed debug line: {line}"))]
    MalformedDebugLine { line: String },

    /// Thrown when a positional write runs past the end of the sink.
    #[snafu(display("Write error: disk full or sink exhausted"))]
    WriteError,

    /// Wraps errors from the underlying byte cursor (used for input reading).
    #[snafu(display("{source}"))]
    Data { source: DataError },

    /// Wraps standard I/O errors (reading the listing/side-car files from disk).
    #[snafu(display("{source}"))]
    Io { source: std::io::Error },
}

impl From<DataError> for Error {
    fn from(source: DataError) -> Self {
        Self::Data { source }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io { source }
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
