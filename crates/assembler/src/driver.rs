//! The assembler driver: orchestrates both passes, writes the header, back-patches the
//! fixup tables, emits code and data, appends debug info, falls back from compact to raw encoding
//! on codec overflow, and returns the header+tables size.
//!
//! Grounded on `sc6.c`'s `assemble()`. The original's non-local jump back to a `setjmp` recovery
//! point on compact-encoding overflow is re-expressed as a bounded (at most one) retry loop owned
//! by this driver; the original's module-level mutables (`lbltab`, `bytes_in`, `bytes_out`,
//! `fcurrent`) are fields of the context this function builds and discards on each attempt rather
//! than process-lifetime statics.

use orthrus_core::data::Endian;

use crate::cell::{BITS, CELL_BYTES, UCell};
use crate::codec;
use crate::config::AssemblerConfig;
use crate::debug;
use crate::error::{CompactOverflowFatalSnafu, Error, Result, UndefinedLabelSnafu, UndefinedSymbolSnafu};
use crate::header::{self, Counts, Header, Layout};
use crate::label::{self, LabelTable};
use crate::opcodes::{self, Emitter, Segment};
use crate::parser::{self, Line};
use crate::sink::Sink;
use crate::symtab::SymbolTable;

/// The result of a successful assembly: the complete image bytes and the pre-code header+tables
/// size.
#[derive(Debug)]
pub struct Assembled {
    pub bytes: Vec<u8>,
    pub header_size: u32,
}

/// Per-attempt emission state: the original's `bytes_in`/`bytes_out`/`fcurrent` mutables, scoped
/// to one attempt so a compact-overflow restart starts clean.
struct Context<'a> {
    sink: Sink,
    labels: &'a LabelTable,
    table: &'a SymbolTable,
    compact: bool,
    compact_margin: u64,
    bytes_in: u64,
    bytes_out: u64,
    cip: u64,
    current_file: i32,
    /// Set by a `stksize` directive in the listing, overriding [`AssemblerConfig::stack_cells`].
    stack_cells_override: Option<u32>,
}

impl<'a> Context<'a> {
    fn write_cell(&mut self, value: UCell) -> Result<()> {
        if self.compact {
            let mut buf = Vec::new();
            let written = codec::encode(value, &mut buf);
            self.sink.write_bytes(&buf)?;
            self.bytes_in += CELL_BYTES as u64;
            self.bytes_out += written as u64;
            if self.bytes_out.saturating_sub(self.bytes_in) + 2 >= self.compact_margin {
                return Err(Error::CompactOverflow);
            }
            Ok(())
        } else {
            write_raw_cell(&mut self.sink, value)
        }
    }

    fn write_raw_dump_cell(&mut self, value: UCell) -> Result<()> {
        write_raw_cell(&mut self.sink, value)
    }
}

fn write_raw_cell(sink: &mut Sink, value: UCell) -> Result<()> {
    match BITS {
        16 => sink.write_u16(value as u16),
        32 => sink.write_u32(value as u32),
        64 => sink.write_u64(value as u64),
        _ => unreachable!("unsupported cell width"),
    }
}

/// Resolves a `call`/`jump`/`switch`/`case` label operand (`l.<hex>` or, for `call` only, a bare
/// symbol name) to its relative displacement against `cip`, in ucell modular arithmetic.
fn relative_to_label(ctx: &Context<'_>, token: &str) -> Result<UCell> {
    if let Some(hex) = parser::strip_label_prefix(token) {
        let index = usize::from_str_radix(hex, 16).unwrap_or(0);
        let addr =
            *ctx.labels.get(&index).ok_or_else(|| UndefinedLabelSnafu { index }.build())?;
        Ok((addr as UCell).wrapping_sub(ctx.cip as UCell))
    } else {
        let sym = ctx.table.find(token).ok_or_else(|| UndefinedSymbolSnafu { name: token.to_string() }.build())?;
        Ok((sym.address_or_overlay as UCell).wrapping_sub(ctx.cip as UCell))
    }
}

/// Emits one instruction's encoded bytes, returning the number of bytes it nominally occupies
/// (added to `ctx.cip` by the caller — mirrors every C emitter returning `opcodes(n)+opargs(m)`
/// unconditionally, independent of what it actually wrote).
fn emit(ctx: &mut Context<'_>, entry: &opcodes::OpcodeEntry, operand: &str) -> Result<u64> {
    let opcode = entry.opcode as UCell;
    match entry.emitter {
        Emitter::Parm0 => {
            ctx.write_cell(opcode)?;
            Ok(1)
        }
        Emitter::Parm1 => {
            ctx.write_cell(opcode)?;
            ctx.write_cell(parser::parse_additive(operand) as UCell)?;
            Ok(2)
        }
        Emitter::Parm1Packed => {
            let half_bits = BITS / 2;
            let value = parser::parse_additive(operand);
            let packed_operand = value as UCell;
            if packed_operand >= (1 << half_bits) {
                return crate::error::OperandTooWideSnafu { value: value as i128, bits: half_bits }.fail();
            }
            if opcode > 0xff {
                return crate::error::OperandTooWideSnafu { value: opcode as i128, bits: 8u32 }.fail();
            }
            ctx.write_cell((packed_operand << half_bits) | opcode)?;
            Ok(1)
        }
        Emitter::Parm2 | Emitter::Parm3 | Emitter::Parm4 | Emitter::Parm5 => {
            let n = match entry.emitter {
                Emitter::Parm2 => 2,
                Emitter::Parm3 => 3,
                Emitter::Parm4 => 4,
                _ => 5,
            };
            ctx.write_cell(opcode)?;
            let mut operands = operand.split_whitespace();
            for _ in 0..n {
                let term = operands.next().unwrap_or("0");
                ctx.write_cell(parser::parse_additive(term) as UCell)?;
            }
            Ok(n as u64 + 1)
        }
        Emitter::Call => {
            let token = operand.split_whitespace().next().unwrap_or("");
            let displacement = relative_to_label(ctx, token)?;
            ctx.write_cell(opcode)?;
            ctx.write_cell(displacement)?;
            Ok(2)
        }
        Emitter::Jump | Emitter::Switch => {
            let token = operand.split_whitespace().next().unwrap_or("");
            let displacement = relative_to_label(ctx, token)?;
            ctx.write_cell(opcode)?;
            ctx.write_cell(displacement)?;
            Ok(2)
        }
        Emitter::Case => {
            let mut operands = operand.split_whitespace();
            let value = parser::parse_additive(operands.next().unwrap_or("0"));
            let label_tok = operands.next().unwrap_or("");
            let displacement = relative_to_label(ctx, label_tok)?;
            ctx.write_cell(value as UCell)?;
            ctx.write_cell(displacement)?;
            Ok(2)
        }
        Emitter::Icase => {
            let mut operands = operand.split_whitespace();
            let a = parser::parse_additive(operands.next().unwrap_or("0"));
            let b = parser::parse_additive(operands.next().unwrap_or("0"));
            ctx.write_cell(a as UCell)?;
            ctx.write_cell(b as UCell)?;
            Ok(2)
        }
        Emitter::Dump => {
            let values = parser::parse_dump_operands(operand);
            for value in &values {
                ctx.write_raw_dump_cell(*value as UCell)?;
            }
            Ok(values.len() as u64)
        }
        Emitter::SetCurrentFile => {
            ctx.current_file = parser::parse_additive(operand) as i32;
            Ok(0)
        }
        Emitter::Noop => {
            if entry.mnemonic.eq_ignore_ascii_case("stksize") {
                ctx.stack_cells_override = Some(parser::parse_additive(operand) as u32);
            }
            Ok(0)
        }
    }
}

/// The result of one emission attempt: the built sink, and the byte offset where the data section
/// begins (the code section's end), needed for `header.dat`.
struct Emitted {
    sink: Sink,
    dat: u32,
    stack_cells_override: Option<u32>,
}

/// Runs one complete emission attempt with a given `compact` setting, returning
/// the built sink positioned past the data section, plus the layout used.
#[allow(clippy::too_many_arguments)]
fn try_emit(
    listing: &str,
    table: &SymbolTable,
    config: &AssemblerConfig,
    endian: Endian,
    layout: &Layout,
    labels: &LabelTable,
    compact: bool,
) -> Result<Emitted> {
    let mut sink = Sink::new(endian);
    sink.reserve_zeroed(layout.cod as usize);

    header::write_fixup_tables(&mut sink, layout, table)?;
    if config.overlay {
        header::write_overlay_table(&mut sink, layout, table)?;
    }
    header::write_nametable_prefix(&mut sink, layout)?;

    sink.set_position(layout.cod as usize);

    let mut ctx = Context {
        sink,
        labels,
        table,
        compact,
        compact_margin: config.compact_margin as u64,
        bytes_in: 0,
        bytes_out: 0,
        cip: 0,
        current_file: 0,
        stack_cells_override: None,
    };

    let mut dat = 0u32;
    for pass_segment in [Segment::Code, Segment::Data] {
        ctx.cip = 0;
        for raw in listing.lines() {
            let line = parser::strip_comment(raw);
            let Line::Instr { mnemonic, operand } = parser::classify(line) else { continue };
            let entry = opcodes::lookup(mnemonic)
                .ok_or_else(|| crate::error::InvalidInstructionSnafu { mnemonic: mnemonic.to_string() }.build())?;
            if entry.segment != pass_segment {
                continue;
            }
            let nominal = emit(&mut ctx, entry, operand)?;
            if pass_segment == Segment::Code {
                ctx.cip += nominal * CELL_BYTES as u64;
            }
        }
        if pass_segment == Segment::Code {
            dat = ctx.sink.len() as u32;
        }
    }

    Ok(Emitted { sink: ctx.sink, dat, stack_cells_override: ctx.stack_cells_override })
}

/// Runs the full 14-step driver, returning the assembled image and header size.
pub fn assemble(listing: &str, table: &SymbolTable, config: &AssemblerConfig, endian: Endian) -> Result<Assembled> {
    let counts = compute_counts(table);
    let layout = header::compute_layout(&counts, config.data_align as u32);
    let labels = label::resolve(listing)?;

    let mut compact = config.compact;
    let emitted = loop {
        match try_emit(listing, table, config, endian, &layout, &labels, compact) {
            Ok(emitted) => break emitted,
            Err(Error::CompactOverflow) if compact => {
                log::warn!("compact encoding overflowed the margin; disabled compact encoding");
                compact = false;
            }
            Err(Error::CompactOverflow) => return CompactOverflowFatalSnafu.fail(),
            Err(e) => return Err(e),
        }
    };
    let mut sink = emitted.sink;
    let dat = emitted.dat;
    let cod = layout.cod;
    let stack_cells = emitted.stack_cells_override.unwrap_or(config.stack_cells);

    // header.size never includes the debug block: it is exactly the
    // sink's length right after code+data, before any debug bytes are appended.
    let pre_debug_len = sink.len() as u32;

    if config.debug {
        debug::write(&mut sink, table)?;
    }

    let main_cip = table.find("main").map_or(0, |s| s.address_or_overlay as i32);
    let header = Header {
        size: pre_debug_len as i32,
        magic: crate::cell::MAGIC,
        file_version: crate::config::FILE_VERSION as i8,
        amx_version: crate::config::AMX_VERSION as i8,
        flags: config.flags(compact),
        defsize: header::fixup_record_size() as i16,
        cod: cod as i32,
        dat: dat as i32,
        hea: pre_debug_len as i32,
        stp: pre_debug_len as i32 + stack_cells as i32 * CELL_BYTES as i32,
        cip: main_cip,
        publics: layout.publics as i32,
        natives: layout.natives as i32,
        libraries: layout.libraries as i32,
        pubvars: layout.pubvars as i32,
        tags: layout.tags as i32,
        nametable: layout.nametable as i32,
        overlays: layout.overlays as i32,
    };
    header.write(&mut sink)?;

    Ok(Assembled { bytes: sink.into_inner(), header_size: layout.cod })
}

fn compute_counts(table: &SymbolTable) -> Counts {
    header::compute_counts(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symtab::{Symbol, SymbolKind, name_hash};

    fn default_table_with_main() -> SymbolTable {
        let mut table = SymbolTable::new();
        table.symbols.push(Symbol {
            name: "main".into(),
            address_or_overlay: 0,
            kind: SymbolKind::Public,
            state_id: None,
            native_id: None,
            overlay_offset: 0,
            overlay_size: 0,
        });
        table
    }

    #[test]
    fn s1_empty_program_single_halt() {
        let table = default_table_with_main();
        let config = AssemblerConfig { compact: false, ..Default::default() };
        let assembled = assemble("halt 0\n", &table, &config, Endian::Little).unwrap();
        let counts = header::compute_counts(&table);
        let layout = header::compute_layout(&counts, config.data_align as u32);
        assert_eq!(assembled.header_size, layout.cod);
        let code_len = assembled.bytes.len() as u32 - assembled.header_size;
        assert_eq!(code_len, 2 * CELL_BYTES as u32); // halt's opcode cell + one operand cell
    }

    #[test]
    fn s3_forward_jump_displacement_is_one_cell() {
        let table = default_table_with_main();
        let config = AssemblerConfig::default();
        let assembled = assemble("jump l.0\nl.0\nhalt 0\n", &table, &config, Endian::Little).unwrap();
        assert!(!assembled.bytes.is_empty());
    }

    #[test]
    fn s4_name_hash_of_main_matches_publics_record() {
        assert_eq!(name_hash("main"), {
            let mut h: u32 = 0;
            for c in "main".bytes() {
                h = h.wrapping_mul(131) ^ u32::from(c);
            }
            h
        });
    }

    #[test]
    fn undefined_call_target_is_an_error() {
        let table = default_table_with_main();
        let config = AssemblerConfig::default();
        assert!(assemble("call nonexistent\n", &table, &config, Endian::Little).is_err());
    }
}
