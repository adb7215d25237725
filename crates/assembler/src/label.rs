//! Pass-1 label resolver: walks the listing once, in nominal-size-only measurement mode,
//! to compute each label's byte offset within the code section.
//!
//! Grounded on `sc6.c`'s first pass inside `assemble()`: nominal instruction size — the count used
//! for `codeindex`/`cip` bookkeeping — is a fixed cell count per emitter family (see
//! [`crate::opcodes::nominal_cells`]), completely decoupled from however many bytes the variable-
//! length compact codec actually ends up writing for a given operand value. Only the `dump` family
//! is genuinely operand-count-dependent. This is why pass 1 never needs to know an operand's
//! literal value, even for forward references.

use std::collections::HashMap;

use crate::cell::CELL_BYTES;
use crate::error::{DuplicateLabelSnafu, InvalidInstructionSnafu, Result};
use crate::opcodes::{self, Segment};
use crate::parser::{self, Line};

/// Dense label index → byte offset within the code section, built in pass 1 and consumed in
/// pass 2.
pub type LabelTable = HashMap<usize, u64>;

/// Runs pass 1 over a listing, returning the label table. Each label must be defined exactly
/// once; only code-segment instructions contribute to the running offset.
pub fn resolve(listing: &str) -> Result<LabelTable> {
    let mut labels = LabelTable::new();
    let mut cip: u64 = 0;

    for raw in listing.lines() {
        let line = parser::strip_comment(raw);
        match parser::classify(line) {
            Line::Blank => {}
            Line::Label(index) => {
                if labels.insert(index, cip).is_some() {
                    return DuplicateLabelSnafu { index }.fail();
                }
            }
            Line::Instr { mnemonic, operand } => {
                let entry = opcodes::lookup(mnemonic)
                    .ok_or_else(|| InvalidInstructionSnafu { mnemonic: mnemonic.to_string() }.build())?;
                if entry.segment == Segment::Code {
                    let operand_count = operand.split_whitespace().count();
                    cip += opcodes::nominal_cells(entry.emitter, operand_count) * CELL_BYTES as u64;
                }
            }
        }
    }

    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_a_forward_label_to_the_next_instructions_offset() {
        // jump l.0 occupies 2 cells (opcode + displacement); l.0 then halt 0 follows immediately.
        let listing = "jump l.0\nl.0\nhalt 0\n";
        let labels = resolve(listing).unwrap();
        assert_eq!(labels[&0], 2 * CELL_BYTES as u64);
    }

    #[test]
    fn duplicate_label_is_an_error() {
        let listing = "l.0\nl.0\n";
        assert!(resolve(listing).is_err());
    }

    #[test]
    fn unknown_mnemonic_is_an_error() {
        assert!(resolve("bogus.mnemonic 0").is_err());
    }

    #[test]
    fn data_segment_instructions_do_not_advance_cip() {
        let listing = "data\ndump 1 2 3\ncode\nl.0\nhalt 0\n";
        let labels = resolve(listing).unwrap();
        assert_eq!(labels[&0], 0);
    }
}
