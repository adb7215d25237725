//! The instruction table: mnemonic to opcode number, target segment, and operand shape.
//!
//! Grounded on the abstract machine's own `opcodelist[]`: entries are its real mnemonics and real
//! opcode numbers, kept alphabetically sorted so [`lookup`] can binary-search the way the original
//! `findopcode` did. This crate ships the slice of the real instruction set needed to assemble the
//! scenarios this crate is tested against and to exercise every [`Emitter`] family at least once;
//! extending the table to the full instruction set is a matter of appending more rows.

use core::cmp::Ordering;

/// Which segment an instruction's bytes land in once emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// The code segment (`CODE`/`.code`): most instructions.
    Code,
    /// The data segment (`DATA`/`.data`): `dump` and the `data`/`code` pseudo-directives toggle it.
    Data,
    /// Pseudo-instructions that don't belong to either segment (`stksize`).
    None,
}

/// Tags which family of operand parsing and emission an opcode uses. Chosen over literal function
/// pointers in the table (the abstract machine's own approach): every emitter needs `&mut
/// Assembler` for label/symbol resolution and the running byte counters, and an enum dispatched
/// through one `match` in the driver reads more plainly than a table of closures capturing that
/// context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emitter {
    /// No operands: only the opcode cell itself.
    Parm0,
    /// One full-cell operand following the opcode cell.
    Parm1,
    /// One operand packed into the high half-cell alongside the opcode in the low half.
    Parm1Packed,
    /// Two full-cell operands.
    Parm2,
    /// Three full-cell operands.
    Parm3,
    /// Four full-cell operands.
    Parm4,
    /// Five full-cell operands.
    Parm5,
    /// `call`: operand is a symbol name resolved to an address, not a literal.
    Call,
    /// A conditional or unconditional jump: operand is a label reference.
    Jump,
    /// `switch`/`iswitch`: operand is a case-table label reference.
    Switch,
    /// `case`: emits no opcode cell of its own, only a value/label pair.
    Case,
    /// `icase`: like [`Emitter::Case`], for the dense integer case-table variant.
    Icase,
    /// `dump`: emits a run of raw data-segment words, no opcode cell.
    Dump,
    /// `code`/`data`: pseudo-directive that selects the current segment and source file.
    SetCurrentFile,
    /// The sentinel "invalid instruction" entry, never matched by [`lookup`].
    Noop,
}

/// One row of the instruction table.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeEntry {
    pub opcode: u32,
    pub mnemonic: &'static str,
    pub segment: Segment,
    pub emitter: Emitter,
}

/// The instruction table, alphabetically sorted by mnemonic (case folded to lowercase, matching
/// the abstract machine's own sort order, which was produced by a case-insensitive `qsort`).
///
/// One representative row per emitter family, plus enough of the arithmetic/stack/load-store
/// families to assemble realistic listings. Real opcode numbers throughout.
pub static OPCODES: &[OpcodeEntry] = &[
    OpcodeEntry { opcode: 78, mnemonic: "add", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 87, mnemonic: "add.c", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 197, mnemonic: "add.p.c", segment: Segment::Code, emitter: Emitter::Parm1Packed },
    OpcodeEntry { opcode: 14, mnemonic: "addr.alt", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 13, mnemonic: "addr.pri", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 81, mnemonic: "and", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 121, mnemonic: "bounds", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 137, mnemonic: "break", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 49, mnemonic: "call", segment: Segment::Code, emitter: Emitter::Call },
    OpcodeEntry { opcode: 0, mnemonic: "case", segment: Segment::Code, emitter: Emitter::Case },
    OpcodeEntry { opcode: 130, mnemonic: "casetbl", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 0, mnemonic: "code", segment: Segment::Code, emitter: Emitter::SetCurrentFile },
    OpcodeEntry { opcode: 156, mnemonic: "const", segment: Segment::Code, emitter: Emitter::Parm2 },
    OpcodeEntry { opcode: 12, mnemonic: "const.alt", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 11, mnemonic: "const.pri", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 0, mnemonic: "data", segment: Segment::Data, emitter: Emitter::SetCurrentFile },
    OpcodeEntry { opcode: 114, mnemonic: "dec", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 112, mnemonic: "dec.pri", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 0, mnemonic: "dump", segment: Segment::Data, emitter: Emitter::Dump },
    OpcodeEntry { opcode: 95, mnemonic: "eq", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 105, mnemonic: "eq.c.pri", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 119, mnemonic: "fill", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 100, mnemonic: "geq", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 99, mnemonic: "grtr", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 120, mnemonic: "halt", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 45, mnemonic: "heap", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 158, mnemonic: "icall", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 0, mnemonic: "icase", segment: Segment::Code, emitter: Emitter::Icase },
    OpcodeEntry { opcode: 161, mnemonic: "icasetbl", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 27, mnemonic: "idxaddr", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 109, mnemonic: "inc", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 86, mnemonic: "invert", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 159, mnemonic: "iretn", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 160, mnemonic: "iswitch", segment: Segment::Code, emitter: Emitter::Switch },
    OpcodeEntry { opcode: 55, mnemonic: "jeq", segment: Segment::Code, emitter: Emitter::Jump },
    OpcodeEntry { opcode: 60, mnemonic: "jgeq", segment: Segment::Code, emitter: Emitter::Jump },
    OpcodeEntry { opcode: 59, mnemonic: "jgrtr", segment: Segment::Code, emitter: Emitter::Jump },
    OpcodeEntry { opcode: 58, mnemonic: "jleq", segment: Segment::Code, emitter: Emitter::Jump },
    OpcodeEntry { opcode: 57, mnemonic: "jless", segment: Segment::Code, emitter: Emitter::Jump },
    OpcodeEntry { opcode: 56, mnemonic: "jneq", segment: Segment::Code, emitter: Emitter::Jump },
    OpcodeEntry { opcode: 54, mnemonic: "jnz", segment: Segment::Code, emitter: Emitter::Jump },
    OpcodeEntry { opcode: 51, mnemonic: "jump", segment: Segment::Code, emitter: Emitter::Jump },
    OpcodeEntry { opcode: 53, mnemonic: "jzer", segment: Segment::Code, emitter: Emitter::Jump },
    OpcodeEntry { opcode: 31, mnemonic: "lctrl", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 98, mnemonic: "leq", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 97, mnemonic: "less", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 25, mnemonic: "lidx", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 2, mnemonic: "load.alt", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 154, mnemonic: "load.both", segment: Segment::Code, emitter: Emitter::Parm2 },
    OpcodeEntry { opcode: 9, mnemonic: "load.i", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 1, mnemonic: "load.pri", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 4, mnemonic: "load.s.alt", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 3, mnemonic: "load.s.pri", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 6, mnemonic: "lref.alt", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 5, mnemonic: "lref.pri", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 34, mnemonic: "move.alt", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 33, mnemonic: "move.pri", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 117, mnemonic: "movs", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 85, mnemonic: "neg", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 96, mnemonic: "neq", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 134, mnemonic: "nop", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 84, mnemonic: "not", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 82, mnemonic: "or", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 43, mnemonic: "pop.alt", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 42, mnemonic: "pop.pri", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 46, mnemonic: "proc", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 40, mnemonic: "push", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 37, mnemonic: "push.alt", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 36, mnemonic: "push.pri", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 139, mnemonic: "push2", segment: Segment::Code, emitter: Emitter::Parm2 },
    OpcodeEntry { opcode: 143, mnemonic: "push3", segment: Segment::Code, emitter: Emitter::Parm3 },
    OpcodeEntry { opcode: 147, mnemonic: "push4", segment: Segment::Code, emitter: Emitter::Parm4 },
    OpcodeEntry { opcode: 151, mnemonic: "push5", segment: Segment::Code, emitter: Emitter::Parm5 },
    OpcodeEntry { opcode: 47, mnemonic: "ret", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 48, mnemonic: "retn", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 32, mnemonic: "sctrl", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 73, mnemonic: "sdiv", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 65, mnemonic: "shl", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 66, mnemonic: "shr", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 72, mnemonic: "smul", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 20, mnemonic: "sref.alt", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 19, mnemonic: "sref.pri", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 44, mnemonic: "stack", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 0, mnemonic: "stksize", segment: Segment::None, emitter: Emitter::Noop },
    OpcodeEntry { opcode: 16, mnemonic: "stor.alt", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 23, mnemonic: "stor.i", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 15, mnemonic: "stor.pri", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 79, mnemonic: "sub", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 80, mnemonic: "sub.alt", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 129, mnemonic: "switch", segment: Segment::Code, emitter: Emitter::Switch },
    OpcodeEntry { opcode: 123, mnemonic: "sysreq.c", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 135, mnemonic: "sysreq.n", segment: Segment::Code, emitter: Emitter::Parm2 },
    OpcodeEntry { opcode: 122, mnemonic: "sysreq.pri", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 76, mnemonic: "udiv", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 75, mnemonic: "umul", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 35, mnemonic: "xchg", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 83, mnemonic: "xor", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 91, mnemonic: "zero", segment: Segment::Code, emitter: Emitter::Parm1 },
    OpcodeEntry { opcode: 90, mnemonic: "zero.alt", segment: Segment::Code, emitter: Emitter::Parm0 },
    OpcodeEntry { opcode: 89, mnemonic: "zero.pri", segment: Segment::Code, emitter: Emitter::Parm0 },
];

/// Looks up a mnemonic case-insensitively via binary search, mirroring `findopcode`'s behavior.
#[must_use]
pub fn lookup(mnemonic: &str) -> Option<&'static OpcodeEntry> {
    OPCODES
        .binary_search_by(|entry| cmp_ignore_ascii_case(entry.mnemonic, mnemonic))
        .ok()
        .map(|i| &OPCODES[i])
}

/// The nominal size, in cells, an instruction of this emitter family occupies for addressing
/// purposes — completely decoupled from however many bytes the codec actually writes for it.
/// `operand_count` is only consulted for [`Emitter::Dump`], whose nominal size is
/// operand-count-dependent; every other family returns a fixed count per `parm0`..`do_case` in the
/// abstract machine's own emitters (each of which returns `opcodes(n) + opargs(m)` unconditionally,
/// whether or not it actually wrote anything).
#[must_use]
pub fn nominal_cells(emitter: Emitter, operand_count: usize) -> u64 {
    match emitter {
        Emitter::Parm0 => 1,
        Emitter::Parm1 => 2,
        Emitter::Parm1Packed => 1,
        Emitter::Parm2 => 3,
        Emitter::Parm3 => 4,
        Emitter::Parm4 => 5,
        Emitter::Parm5 => 6,
        Emitter::Call | Emitter::Jump | Emitter::Switch => 2,
        Emitter::Case | Emitter::Icase => 2,
        Emitter::Dump => operand_count as u64,
        Emitter::SetCurrentFile | Emitter::Noop => 0,
    }
}

fn cmp_ignore_ascii_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.chars().map(|c| c.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_and_opcode_unique() {
        for pair in OPCODES.windows(2) {
            assert!(
                cmp_ignore_ascii_case(pair[0].mnemonic, pair[1].mnemonic) == Ordering::Less,
                "table out of order: {} >= {}",
                pair[0].mnemonic,
                pair[1].mnemonic
            );
        }
        let mut seen = std::collections::HashSet::new();
        for entry in OPCODES {
            if entry.opcode == 0 {
                continue; // pseudo-instructions and the case/icase/dump family share opcode 0
            }
            assert!(seen.insert(entry.opcode), "duplicate opcode {}", entry.opcode);
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("CONST.PRI").unwrap().opcode, 11);
        assert_eq!(lookup("const.pri").unwrap().opcode, 11);
        assert!(lookup("not.a.real.mnemonic").is_none());
    }

    #[test]
    fn every_emitter_family_is_represented() {
        let families = [
            Emitter::Parm0,
            Emitter::Parm1,
            Emitter::Parm1Packed,
            Emitter::Parm2,
            Emitter::Parm3,
            Emitter::Parm4,
            Emitter::Parm5,
            Emitter::Call,
            Emitter::Jump,
            Emitter::Switch,
            Emitter::Case,
            Emitter::Icase,
            Emitter::Dump,
            Emitter::SetCurrentFile,
            Emitter::Noop,
        ];
        for family in families {
            assert!(OPCODES.iter().any(|e| e.emitter == family), "no entry uses {family:?}");
        }
    }

    #[test]
    fn nominal_cells_matches_opargs_plus_opcodes() {
        assert_eq!(nominal_cells(Emitter::Parm0, 0), 1);
        assert_eq!(nominal_cells(Emitter::Parm1, 0), 2);
        assert_eq!(nominal_cells(Emitter::Parm1Packed, 0), 1);
        assert_eq!(nominal_cells(Emitter::Parm5, 0), 6);
        assert_eq!(nominal_cells(Emitter::Call, 0), 2);
        assert_eq!(nominal_cells(Emitter::Case, 0), 2);
        assert_eq!(nominal_cells(Emitter::Dump, 7), 7);
        assert_eq!(nominal_cells(Emitter::Noop, 0), 0);
    }
}
