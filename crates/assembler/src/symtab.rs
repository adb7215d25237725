//! Symbol-table facade: a minimal in-crate stand-in for the excluded semantic analyzer's
//! symbol/tag/library/debug-string tables. Carries exactly the fields the driver reads and ships a
//! small textual loader so the assembler is exercisable without a full compiler front end attached.

use std::collections::BTreeMap;

use crate::error::{MalformedDebugLineSnafu, Result};

/// What role a symbol plays, which determines which fixup table it lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Public,
    Native,
    PubVar,
    Function,
    StateFunction,
}

/// One entry of the global symbol table.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    /// Code address, or (in overlay mode) overlay index. Always 0 for natives.
    pub address_or_overlay: u32,
    pub kind: SymbolKind,
    /// Set only for `StateFunction` symbols: which state variant this is.
    pub state_id: Option<u32>,
    /// Set only for `Native` symbols: the declared native id, used to build the sparse
    /// ascending-id ordering array the natives fixup table is emitted from. Declaration order in
    /// the source need not match id order.
    pub native_id: Option<u32>,
    /// Set only for non-native functions when overlay mode is enabled: the function's code
    /// offset and byte size, needed to write its overlay record. The excluded semantic analyzer
    /// is the real owner of this information; the facade just carries it through.
    pub overlay_offset: u32,
    pub overlay_size: u32,
}

/// A public tag record.
#[derive(Debug, Clone)]
pub struct Tag {
    pub id: u32,
    pub name: String,
}

/// A required-library record.
#[derive(Debug, Clone)]
pub struct Library {
    pub name: String,
}

/// One line of the debug-string table, already tagged by kind.
#[derive(Debug, Clone)]
pub enum DebugLine {
    /// `F:<codeindex> <path>`
    File { codeindex: u32, path: String },
    /// `L:<address> <line>`
    Line { address: u32, line: u32 },
    /// `S:<address> <tag> : <name> <codestart> <codeend> <ident> <vclass> [<tag>:<size> ...]`
    Symbol {
        address: u32,
        tag: u32,
        name: String,
        codestart: u32,
        codeend: u32,
        ident: u32,
        vclass: u32,
        dims: Vec<(u32, u32)>,
    },
}

/// The full set of "external" tables the driver consults: symbols, tags, libraries, and the
/// debug-string lines. Built directly or parsed from a side-car textual description (see
/// [`SymbolTable::parse`]).
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    pub symbols: Vec<Symbol>,
    pub tags: Vec<Tag>,
    pub libraries: Vec<Library>,
    pub debug_lines: Vec<DebugLine>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds a global symbol by name (case-sensitive, matching symbol-name comparisons elsewhere).
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name == name)
    }

    /// Builds the sparse native-id → symbol array the natives fixup table is emitted from: one
    /// symbol-table walk, filled in by declared id so emission order is ascending by id regardless
    /// of declaration order.
    #[must_use]
    pub fn natives_by_id(&self) -> BTreeMap<u32, &Symbol> {
        self.symbols
            .iter()
            .filter(|s| s.kind == SymbolKind::Native)
            .map(|s| (s.native_id.unwrap_or(0), s))
            .collect()
    }

    /// A public variable's `nameofs`: the parsed hex suffix of a `_x`-prefixed name (id ordering)
    /// or the name hash otherwise. The original assembler's check skips the name's first character
    /// before comparing the next two against `"_x"`, and reads the hex digits starting two
    /// characters after that — i.e. `name[1..3] == "_x"`, id from `name[3..]`.
    #[must_use]
    pub fn pubvar_nameofs(name: &str) -> u32 {
        let bytes = name.as_bytes();
        if bytes.len() > 3 && &bytes[1..3] == b"_x" {
            if let Ok(text) = core::str::from_utf8(&bytes[3..]) {
                let hex: String = text.chars().take_while(|c| c.is_ascii_hexdigit()).collect();
                if let Ok(id) = u32::from_str_radix(&hex, 16) {
                    return id;
                }
            }
        }
        name_hash(name)
    }

    /// Parses the side-car textual description the CLI reads. One directive per line:
    ///
    /// ```text
    /// public <name> <hex-addr> [<hex-overlay-offset> <hex-overlay-size>]
    /// native <name> <hex-id>
    /// pubvar <name> <hex-addr> [<hex-overlay-offset> <hex-overlay-size>]
    /// function <name> <hex-addr> [<hex-overlay-offset> <hex-overlay-size>]
    /// state <name> <hex-addr> <hex-state-id> [<hex-overlay-offset> <hex-overlay-size>]
    /// tag <hex-id> <name>
    /// library <name>
    /// F:<hex-codeindex> <path>
    /// L:<hex-address> <hex-line>
    /// S:<hex-address> <hex-tag> : <name> <hex-codestart> <hex-codeend> <hex-ident> <hex-vclass> [<hex-tag>:<hex-size> ...]
    /// ```
    ///
    /// Blank lines and lines starting with `;` are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let mut table = Self::new();
        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            if let Some(rest) = line.strip_prefix("F:") {
                table.debug_lines.push(parse_file_line(rest)?);
            } else if let Some(rest) = line.strip_prefix("L:") {
                table.debug_lines.push(parse_line_line(rest)?);
            } else if let Some(rest) = line.strip_prefix("S:") {
                table.debug_lines.push(parse_symbol_line(rest)?);
            } else {
                let mut parts = line.split_whitespace();
                let directive = parts.next().unwrap_or_default();
                match directive {
                    "public" | "pubvar" | "function" => {
                        let name = parts.next().unwrap_or_default().to_string();
                        let addr = parse_hex_u32(parts.next().unwrap_or("0"), line)?;
                        let kind = match directive {
                            "public" => SymbolKind::Public,
                            "pubvar" => SymbolKind::PubVar,
                            _ => SymbolKind::Function,
                        };
                        let overlay_offset = parse_hex_u32(parts.next().unwrap_or("0"), line)?;
                        let overlay_size = parse_hex_u32(parts.next().unwrap_or("0"), line)?;
                        table.symbols.push(Symbol {
                            name,
                            address_or_overlay: addr,
                            kind,
                            state_id: None,
                            native_id: None,
                            overlay_offset,
                            overlay_size,
                        });
                    }
                    "native" => {
                        let name = parts.next().unwrap_or_default().to_string();
                        let native_id = parse_hex_u32(parts.next().unwrap_or("0"), line)?;
                        table.symbols.push(Symbol {
                            name,
                            address_or_overlay: 0,
                            kind: SymbolKind::Native,
                            state_id: None,
                            native_id: Some(native_id),
                            overlay_offset: 0,
                            overlay_size: 0,
                        });
                    }
                    "state" => {
                        let name = parts.next().unwrap_or_default().to_string();
                        let addr = parse_hex_u32(parts.next().unwrap_or("0"), line)?;
                        let state_id = parse_hex_u32(parts.next().unwrap_or("0"), line)?;
                        let overlay_offset = parse_hex_u32(parts.next().unwrap_or("0"), line)?;
                        let overlay_size = parse_hex_u32(parts.next().unwrap_or("0"), line)?;
                        table.symbols.push(Symbol {
                            name,
                            address_or_overlay: addr,
                            kind: SymbolKind::StateFunction,
                            state_id: Some(state_id),
                            native_id: None,
                            overlay_offset,
                            overlay_size,
                        });
                    }
                    "tag" => {
                        let id = parse_hex_u32(parts.next().unwrap_or("0"), line)?;
                        let name = parts.next().unwrap_or_default().to_string();
                        table.tags.push(Tag { id, name });
                    }
                    "library" => {
                        let name = parts.next().unwrap_or_default().to_string();
                        table.libraries.push(Library { name });
                    }
                    _ => return MalformedDebugLineSnafu { line: line.to_string() }.fail(),
                }
            }
        }
        Ok(table)
    }
}

/// `hash = 0; for each byte c: hash = 131*hash ^ c`, unsigned 32-bit arithmetic, matching the
/// abstract machine's own `hashStr`. Used for every `nameofs` field except `_x`-prefixed pubvars.
#[must_use]
pub fn name_hash(name: &str) -> u32 {
    name.bytes().fold(0u32, |hash, c| hash.wrapping_mul(131) ^ u32::from(c))
}

/// Free-function form of [`SymbolTable::pubvar_nameofs`], for callers that don't otherwise need a
/// `SymbolTable` in scope (the header fixup-table writer).
#[must_use]
pub fn pubvar_nameofs(name: &str) -> u32 {
    SymbolTable::pubvar_nameofs(name)
}

fn parse_hex_u32(token: &str, line: &str) -> Result<u32> {
    u32::from_str_radix(token.trim_start_matches("0x"), 16)
        .map_err(|_| MalformedDebugLineSnafu { line: line.to_string() }.build())
}

fn parse_file_line(rest: &str) -> Result<DebugLine> {
    let mut parts = rest.splitn(2, ' ');
    let codeindex = parse_hex_u32(parts.next().unwrap_or_default(), rest)?;
    let path = parts.next().unwrap_or_default().to_string();
    Ok(DebugLine::File { codeindex, path })
}

fn parse_line_line(rest: &str) -> Result<DebugLine> {
    let mut parts = rest.split_whitespace();
    let address = parse_hex_u32(parts.next().unwrap_or_default(), rest)?;
    let line = parse_hex_u32(parts.next().unwrap_or_default(), rest)?;
    Ok(DebugLine::Line { address, line })
}

fn parse_symbol_line(rest: &str) -> Result<DebugLine> {
    let (head, name_and_tail) =
        rest.split_once(':').ok_or_else(|| MalformedDebugLineSnafu { line: rest.to_string() }.build())?;
    let mut head_parts = head.split_whitespace();
    let address = parse_hex_u32(head_parts.next().unwrap_or_default(), rest)?;
    let tag = parse_hex_u32(head_parts.next().unwrap_or_default(), rest)?;

    let mut tail_parts = name_and_tail.split_whitespace();
    let name = tail_parts.next().unwrap_or_default().to_string();
    let codestart = parse_hex_u32(tail_parts.next().unwrap_or_default(), rest)?;
    let codeend = parse_hex_u32(tail_parts.next().unwrap_or_default(), rest)?;
    let ident = parse_hex_u32(tail_parts.next().unwrap_or_default(), rest)?;
    let vclass = parse_hex_u32(tail_parts.next().unwrap_or_default(), rest)?;

    let mut dims = Vec::new();
    for token in tail_parts {
        let (tag_str, size_str) =
            token.split_once(':').ok_or_else(|| MalformedDebugLineSnafu { line: rest.to_string() }.build())?;
        dims.push((parse_hex_u32(tag_str, rest)?, parse_hex_u32(size_str, rest)?));
    }

    Ok(DebugLine::Symbol { address, tag, name, codestart, codeend, ident, vclass, dims })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_symbols_and_debug_lines() {
        let text = "\
            public main 0\n\
            native print\n\
            pubvar g_x1f 0\n\
            tag 1 bool\n\
            library core\n\
            F:0 main.asm\n\
            L:0 a\n\
            S:0 0 : x 0 4 1 2\n\
        ";
        let table = SymbolTable::parse(text).unwrap();
        assert_eq!(table.symbols.len(), 3);
        assert_eq!(table.tags.len(), 1);
        assert_eq!(table.libraries.len(), 1);
        assert_eq!(table.debug_lines.len(), 3);
        assert!(table.find("main").is_some());
        assert!(table.find("missing").is_none());
    }

    #[test]
    fn malformed_line_errors() {
        assert!(SymbolTable::parse("bogus directive here").is_err());
    }

    #[test]
    fn natives_emit_in_ascending_declared_id_order_not_declaration_order() {
        let table = SymbolTable::parse("native second 1\nnative first 0\n").unwrap();
        let by_id = table.natives_by_id();
        let names: Vec<&str> = by_id.values().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn pubvar_nameofs_prefers_x_id_over_hash() {
        // "g_x1f": skip 'g', next two chars "_x", hex suffix from index 3 onward is "1f".
        assert_eq!(SymbolTable::pubvar_nameofs("g_x1f"), 0x1f);
        assert_eq!(SymbolTable::pubvar_nameofs("plain"), name_hash("plain"));
    }
}
