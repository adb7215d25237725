//! Header layout and fixup-table back-patching.
//!
//! Grounded on `sc6.c`'s header field list inside `assemble()` and `amx.h`'s
//! `AMX_HEADER`/`AMX_FUNCSTUBNT`/`AMX_OVERLAYINFO` layouts. Every table offset is the cumulative
//! sum of the previous offset plus the previous table's record count times its record size; the
//! name table carries no inline names, so its interior is exactly the `sNAMEMAX` prefix.

use orthrus_core::data::Endian;

use crate::cell::{BITS, CELL_BYTES, UCell};
use crate::config::HeaderFlags;
use crate::error::Result;
use crate::sink::Sink;
use crate::symtab::{SymbolKind, SymbolTable, name_hash, pubvar_nameofs};

/// Size, in bytes, of one `(address: ucell, nameofs: uint32)` fixup record.
#[must_use]
pub const fn fixup_record_size() -> u32 {
    CELL_BYTES as u32 + 4
}

/// Size, in bytes, of one `(offset: int32, size: int32)` overlay record.
pub const OVERLAY_RECORD_SIZE: u32 = 8;

/// Size, in bytes, of the fixed-layout header: one `i32` `size`, one `u16` `magic`, two `i8`
/// version bytes, one `i16` `flags`, one `i16` `defsize`, then thirteen `i32` table offsets.
pub const HEADER_SIZE: u32 = 4 + 2 + 1 + 1 + 2 + 2 + 4 * 12;

/// The on-disk header, little-endian on wire, swapped at write time on big-endian hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Header {
    pub size: i32,
    pub magic: u16,
    pub file_version: i8,
    pub amx_version: i8,
    pub flags: HeaderFlags,
    pub defsize: i16,
    pub cod: i32,
    pub dat: i32,
    pub hea: i32,
    pub stp: i32,
    pub cip: i32,
    pub publics: i32,
    pub natives: i32,
    pub libraries: i32,
    pub pubvars: i32,
    pub tags: i32,
    pub nametable: i32,
    pub overlays: i32,
}

impl Header {
    /// Writes every field at its fixed position from the start of the sink.
    pub fn write(&self, sink: &mut Sink) -> Result<()> {
        sink.set_position(0);
        sink.write_i32(self.size)?;
        sink.write_u16(self.magic)?;
        sink.write_i8(self.file_version)?;
        sink.write_i8(self.amx_version)?;
        sink.write_i16(self.flags.bits() as i16)?;
        sink.write_i16(self.defsize)?;
        sink.write_i32(self.cod)?;
        sink.write_i32(self.dat)?;
        sink.write_i32(self.hea)?;
        sink.write_i32(self.stp)?;
        sink.write_i32(self.cip)?;
        sink.write_i32(self.publics)?;
        sink.write_i32(self.natives)?;
        sink.write_i32(self.libraries)?;
        sink.write_i32(self.pubvars)?;
        sink.write_i32(self.tags)?;
        sink.write_i32(self.nametable)?;
        sink.write_i32(self.overlays)?;
        Ok(())
    }
}

/// Table record counts, walked from the symbol table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Counts {
    pub publics: u32,
    pub natives: u32,
    pub libraries: u32,
    pub pubvars: u32,
    pub tags: u32,
    pub overlays: u32,
}

/// Walks the symbol table counting each fixup table's records. Overlay count is one per
/// non-native function symbol (`Public` or `Function`) plus one per state variant; this crate
/// models no reserved "special" overlays (return-point stubs are a compiler-internal concept with
/// no counterpart in the facade's `Symbol` type).
#[must_use]
pub fn compute_counts(table: &SymbolTable) -> Counts {
    let mut counts = Counts::default();
    for symbol in &table.symbols {
        match symbol.kind {
            SymbolKind::Public => {
                counts.publics += 1;
                counts.overlays += 1;
            }
            SymbolKind::Native => counts.natives += 1,
            SymbolKind::PubVar => counts.pubvars += 1,
            SymbolKind::Function => counts.overlays += 1,
            SymbolKind::StateFunction => counts.overlays += 1,
        }
    }
    counts.libraries = table.libraries.len() as u32;
    counts.tags = table.tags.len() as u32;
    counts
}

/// The cumulative table-offset layout, computed before a single byte of code or
/// data exists.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub publics: u32,
    pub natives: u32,
    pub libraries: u32,
    pub pubvars: u32,
    pub tags: u32,
    pub overlays: u32,
    pub nametable: u32,
    pub cod: u32,
}

/// Computes the layout from record counts and the required `cod` alignment.
#[must_use]
pub fn compute_layout(counts: &Counts, data_align: u32) -> Layout {
    let rec = fixup_record_size();
    let publics = HEADER_SIZE;
    let natives = publics + counts.publics * rec;
    let libraries = natives + counts.natives * rec;
    let pubvars = libraries + counts.libraries * rec;
    let tags = pubvars + counts.pubvars * rec;
    let overlays = tags + counts.tags * rec;
    let nametable = overlays + counts.overlays * OVERLAY_RECORD_SIZE;
    const NAMETABLE_PREFIX_SIZE: u32 = 2; // sNAMEMAX only; no inline names
    let raw_cod = nametable + NAMETABLE_PREFIX_SIZE;
    let cod = align_up(raw_cod, data_align.max(1));
    Layout { publics, natives, libraries, pubvars, tags, overlays, nametable, cod }
}

fn align_up(value: u32, align: u32) -> u32 {
    value.div_ceil(align) * align
}

/// Writes the name-table prefix: a 16-bit `sNAMEMAX`.
pub fn write_nametable_prefix(sink: &mut Sink, layout: &Layout) -> Result<()> {
    sink.write_at(layout.nametable as usize, &name_max_bytes(crate::config::NAME_MAX, sink.endian()))
}

fn name_max_bytes(value: u16, endian: Endian) -> [u8; 2] {
    match endian {
        Endian::Little => value.to_le_bytes(),
        Endian::Big => value.to_be_bytes(),
    }
}

fn ucell_bytes(value: UCell, endian: Endian) -> Vec<u8> {
    match BITS {
        16 => {
            let v = value as u16;
            if endian == Endian::Little { v.to_le_bytes().to_vec() } else { v.to_be_bytes().to_vec() }
        }
        32 => {
            let v = value as u32;
            if endian == Endian::Little { v.to_le_bytes().to_vec() } else { v.to_be_bytes().to_vec() }
        }
        64 => {
            let v = value as u64;
            if endian == Endian::Little { v.to_le_bytes().to_vec() } else { v.to_be_bytes().to_vec() }
        }
        _ => unreachable!("unsupported cell width"),
    }
}

fn u32_bytes(value: u32, endian: Endian) -> [u8; 4] {
    if endian == Endian::Little { value.to_le_bytes() } else { value.to_be_bytes() }
}

fn i32_bytes(value: i32, endian: Endian) -> [u8; 4] {
    if endian == Endian::Little { value.to_le_bytes() } else { value.to_be_bytes() }
}

/// Back-patches one fixup record at `base + index * record_size`.
fn write_fixup_record(sink: &mut Sink, base: u32, index: u32, address: UCell, nameofs: u32) -> Result<()> {
    let endian = sink.endian();
    let pos = (base + index * fixup_record_size()) as usize;
    let mut bytes = ucell_bytes(address, endian);
    bytes.extend_from_slice(&u32_bytes(nameofs, endian));
    sink.write_at(pos, &bytes)
}

/// Back-patches every fixup table: publics, natives (in ascending declared-id
/// order), libraries, pubvars, and tags.
pub fn write_fixup_tables(sink: &mut Sink, layout: &Layout, table: &SymbolTable) -> Result<()> {
    let mut public_index = 0u32;
    let mut pubvar_index = 0u32;
    for symbol in &table.symbols {
        match symbol.kind {
            SymbolKind::Public => {
                write_fixup_record(sink, layout.publics, public_index, symbol.address_or_overlay as UCell, name_hash(&symbol.name))?;
                public_index += 1;
            }
            SymbolKind::PubVar => {
                write_fixup_record(
                    sink,
                    layout.pubvars,
                    pubvar_index,
                    symbol.address_or_overlay as UCell,
                    pubvar_nameofs(&symbol.name),
                )?;
                pubvar_index += 1;
            }
            _ => {}
        }
    }

    for (index, symbol) in table.natives_by_id().into_values().enumerate() {
        write_fixup_record(sink, layout.natives, index as u32, 0, name_hash(&symbol.name))?;
    }
    for (index, library) in table.libraries.iter().enumerate() {
        write_fixup_record(sink, layout.libraries, index as u32, 0, name_hash(&library.name))?;
    }
    for (index, tag) in table.tags.iter().enumerate() {
        write_fixup_record(sink, layout.tags, index as u32, tag.id as UCell, name_hash(&tag.name))?;
    }
    Ok(())
}

/// Back-patches the overlay table: one record per non-native function symbol
/// (`Public`/`Function`, in declaration order), then one per state variant, asserting sequential
/// indices — this crate reserves no "special" overlays (see [`compute_counts`]).
pub fn write_overlay_table(sink: &mut Sink, layout: &Layout, table: &SymbolTable) -> Result<()> {
    let endian = sink.endian();
    let mut index = 0u32;
    for symbol in &table.symbols {
        let is_overlay_function =
            matches!(symbol.kind, SymbolKind::Public | SymbolKind::Function | SymbolKind::StateFunction);
        if !is_overlay_function {
            continue;
        }
        let pos = (layout.overlays + index * OVERLAY_RECORD_SIZE) as usize;
        let mut bytes = Vec::with_capacity(OVERLAY_RECORD_SIZE as usize);
        bytes.extend_from_slice(&i32_bytes(symbol.overlay_offset as i32, endian));
        bytes.extend_from_slice(&i32_bytes(symbol.overlay_size as i32, endian));
        sink.write_at(pos, &bytes)?;
        index += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symtab::{Library, Symbol, Tag};

    fn symbol(name: &str, kind: SymbolKind, address: u32) -> Symbol {
        Symbol {
            name: name.to_string(),
            address_or_overlay: address,
            kind,
            state_id: None,
            native_id: None,
            overlay_offset: 0,
            overlay_size: 0,
        }
    }

    #[test]
    fn layout_offsets_are_strictly_increasing_and_cod_is_aligned() {
        let mut table = SymbolTable::new();
        table.symbols.push(symbol("main", SymbolKind::Public, 0));
        table.symbols.push(Symbol { native_id: Some(0), ..symbol("print", SymbolKind::Native, 0) });
        table.libraries.push(Library { name: "core".into() });
        table.symbols.push(symbol("g", SymbolKind::PubVar, 4));
        table.tags.push(Tag { id: 1, name: "bool".into() });

        let counts = compute_counts(&table);
        let layout = compute_layout(&counts, CELL_BYTES as u32);

        assert!(layout.publics < layout.natives);
        assert!(layout.natives < layout.libraries);
        assert!(layout.libraries < layout.pubvars);
        assert!(layout.pubvars < layout.tags);
        assert!(layout.tags < layout.overlays);
        assert!(layout.overlays < layout.nametable);
        assert!(u64::from(layout.nametable) <= u64::from(layout.cod));
        assert_eq!(layout.cod % CELL_BYTES as u32, 0);
    }

    #[test]
    fn empty_table_layout_matches_header_size_exactly() {
        let table = SymbolTable::new();
        let counts = compute_counts(&table);
        let layout = compute_layout(&counts, CELL_BYTES as u32);
        assert_eq!(layout.publics, HEADER_SIZE);
        assert_eq!(layout.natives, HEADER_SIZE);
        assert_eq!(layout.overlays, HEADER_SIZE);
    }
}
