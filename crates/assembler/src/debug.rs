//! Debug-info serializer: consumes the debug-string table and appends a self-sized block
//! after the main image. Two passes over the same ordered line sequence — the first accumulates
//! the total byte size the header declares, the second actually writes — because the debug
//! header's `size` field must be correct before any of the block's own bytes are written.
//!
//! Grounded on `sc6.c`'s `append_dbginfo`: same field order, same file-collapsing rule, same
//! fixed-prefix-then-name-then-dimension-records shape for symbols.

use crate::cell::{CELL_BYTES, UCell};
use crate::error::Result;
use crate::sink::Sink;
use crate::symtab::{DebugLine, SymbolTable};

/// `AMX_DBG_MAGIC`-equivalent: a fixed value identifying a debug block, independent of cell width.
pub const DBG_MAGIC: u16 = 0xf1ef;

/// Size, in bytes, of the fixed debug header: `size:i32, magic:u16, file_version:i8,
/// amx_version:i8, flags:i16, files:i16, lines:i16, symbols:i16, tags:i16, automatons:i16,
/// states:i16`.
pub const DBG_HEADER_SIZE: u32 = 4 + 2 + 1 + 1 + 2 * 7;

/// One collapsed file-table entry: the last path recorded for a given codeindex run.
struct FileEntry<'a> {
    codeindex: u32,
    path: &'a str,
}

/// Collapses consecutive `File` entries sharing a codeindex: only the last path
/// for each codeindex run is kept, in first-seen order.
fn collapse_files(lines: &[DebugLine]) -> Vec<FileEntry<'_>> {
    let mut out: Vec<FileEntry<'_>> = Vec::new();
    for line in lines {
        if let DebugLine::File { codeindex, path } = line {
            match out.last_mut() {
                Some(last) if last.codeindex == *codeindex => last.path = path,
                _ => out.push(FileEntry { codeindex: *codeindex, path }),
            }
        }
    }
    out
}

/// Computes the total byte size of the debug block (header + all tables) without writing
/// anything, per the two-pass size-then-write structure the debug header's self-description
/// demands.
#[must_use]
pub fn compute_size(table: &SymbolTable) -> u32 {
    let mut size = DBG_HEADER_SIZE;

    for entry in collapse_files(&table.debug_lines) {
        size += CELL_BYTES as u32 + entry.path.len() as u32 + 1;
    }

    for line in &table.debug_lines {
        if let DebugLine::Line { .. } = line {
            size += CELL_BYTES as u32 + 4;
        }
    }

    for line in &table.debug_lines {
        if let DebugLine::Symbol { name, dims, .. } = line {
            size += symbol_fixed_size() + name.len() as u32 + 1;
            size += dims.len() as u32 * symdim_size();
        }
    }

    for tag in &table.tags {
        size += 2 + tag.name.len() as u32 + 1;
    }

    // This crate's symbol-table facade carries no automaton collaborator table (only
    // symbols/tags/libraries/debug-lines); automatons and states are always empty.

    size
}

fn symbol_fixed_size() -> u32 {
    // address, codestart, codeend: ucell; tag, dim: i16; ident, vclass: i8.
    3 * CELL_BYTES as u32 + 2 + 2 + 1 + 1
}

fn symdim_size() -> u32 {
    2 + CELL_BYTES as u32
}

/// Writes the debug header and every table, appending to the sink at its current
/// position (the caller has already positioned it past the end of the main image).
pub fn write(sink: &mut Sink, table: &SymbolTable) -> Result<()> {
    let size = compute_size(table);
    let files = collapse_files(&table.debug_lines);
    let lines: Vec<&DebugLine> =
        table.debug_lines.iter().filter(|l| matches!(l, DebugLine::Line { .. })).collect();
    let symbols: Vec<&DebugLine> =
        table.debug_lines.iter().filter(|l| matches!(l, DebugLine::Symbol { .. })).collect();

    sink.write_i32(size as i32)?;
    sink.write_u16(DBG_MAGIC)?;
    sink.write_i8(crate::config::FILE_VERSION as i8)?;
    sink.write_i8(crate::config::AMX_VERSION as i8)?;
    sink.write_i16(0)?; // flags: no debug-header bits are modeled
    sink.write_i16(files.len() as i16)?;
    sink.write_i16(lines.len() as i16)?;
    sink.write_i16(symbols.len() as i16)?;
    sink.write_i16(table.tags.len() as i16)?;
    sink.write_i16(0)?; // automatons: always empty, see compute_size
    sink.write_i16(0)?; // states: always empty, see compute_size

    for entry in &files {
        write_ucell(sink, entry.codeindex as UCell)?;
        write_cstr(sink, entry.path)?;
    }

    for line in &lines {
        if let DebugLine::Line { address, line } = line {
            write_ucell(sink, *address as UCell)?;
            sink.write_i32(*line as i32)?;
        }
    }

    for symbol in &symbols {
        if let DebugLine::Symbol { address, tag, name, codestart, codeend, ident, vclass, dims } = symbol {
            write_ucell(sink, *address as UCell)?;
            sink.write_i16(*tag as i16)?;
            write_ucell(sink, *codestart as UCell)?;
            write_ucell(sink, *codeend as UCell)?;
            sink.write_i8(*ident as i8)?;
            sink.write_i8(*vclass as i8)?;
            sink.write_i16(dims.len() as i16)?;
            write_cstr(sink, name)?;
            for (dim_tag, dim_size) in dims {
                sink.write_i16(*dim_tag as i16)?;
                write_ucell(sink, *dim_size as UCell)?;
            }
        }
    }

    for tag in &table.tags {
        sink.write_i16(tag.id as i16)?;
        write_cstr(sink, &tag.name)?;
    }

    Ok(())
}

fn write_ucell(sink: &mut Sink, value: UCell) -> Result<()> {
    match crate::cell::BITS {
        16 => sink.write_u16(value as u16),
        32 => sink.write_u32(value as u32),
        64 => sink.write_u64(value as u64),
        _ => unreachable!("unsupported cell width"),
    }
}

fn write_cstr(sink: &mut Sink, text: &str) -> Result<()> {
    sink.write_bytes(text.as_bytes())?;
    sink.write_u8(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symtab::Tag;
    use orthrus_core::data::Endian;

    #[test]
    fn computed_size_matches_actual_written_bytes() {
        let mut table = SymbolTable::new();
        table.debug_lines.push(DebugLine::File { codeindex: 0, path: "main.asm".into() });
        table.debug_lines.push(DebugLine::File { codeindex: 0, path: "main.asm".into() });
        table.debug_lines.push(DebugLine::Line { address: 0, line: 1 });
        table.debug_lines.push(DebugLine::Symbol {
            address: 0,
            tag: 0,
            name: "x".into(),
            codestart: 0,
            codeend: 4,
            ident: 1,
            vclass: 2,
            dims: vec![(0, 4)],
        });
        table.tags.push(Tag { id: 1, name: "bool".into() });

        let mut sink = Sink::new(Endian::Little);
        write(&mut sink, &table).unwrap();
        assert_eq!(sink.len() as u32, compute_size(&table));
    }

    #[test]
    fn consecutive_same_codeindex_files_collapse_to_last_path() {
        let mut table = SymbolTable::new();
        table.debug_lines.push(DebugLine::File { codeindex: 0, path: "a.asm".into() });
        table.debug_lines.push(DebugLine::File { codeindex: 0, path: "b.asm".into() });
        table.debug_lines.push(DebugLine::File { codeindex: 5, path: "c.asm".into() });
        let files = collapse_files(&table.debug_lines);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "b.asm");
        assert_eq!(files[1].path, "c.asm");
    }
}
