//! Compile-time and per-invocation configuration for the driver.

/// `sNAMEMAX` — bound on a symbol name's length, written as the name table's prefix field.
pub const NAME_MAX: u16 = 63;

/// File format version this driver writes. Mirrors the abstract machine's own `CUR_FILE_VERSION`.
pub const FILE_VERSION: u8 = 10;

/// Required abstract-machine version for a file of [`FILE_VERSION`].
pub const AMX_VERSION: u8 = 10;

bitflags::bitflags! {
    /// Header flag bits. Only the bits this crate sets or reads are modeled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct HeaderFlags: u16 {
        const OVERLAY   = 0x01;
        const DEBUG     = 0x02;
        const COMPACT   = 0x04;
        const SLEEP     = 0x08;
        const NOCHECKS  = 0x10;
    }
}

/// Per-invocation configuration the driver reads. Equivalent to the compile-time globals
/// (`sc_compact`, `sc_dataalign`, ...) the original assembler consulted.
#[derive(Debug, Clone, Copy)]
pub struct AssemblerConfig {
    /// Whether to attempt compact (variable-length) cell encoding at all.
    pub compact: bool,
    /// Whether to emit the overlay table and treat public/function addresses as overlay indices.
    pub overlay: bool,
    /// Whether to append a debug block after the image.
    pub debug: bool,
    /// Whether array bounds checks (and BREAK opcodes) are disabled in the emitted image.
    pub nochecks: bool,
    /// Required alignment of `header.cod`, and of raw-mode cell writes.
    pub data_align: usize,
    /// Expansion margin for the compact codec; must be `> 2`. Default 64.
    pub compact_margin: usize,
    /// Whether the produced image declares the "uses sleep" flag.
    pub uses_sleep: bool,
    /// Fallback stack+heap size, in cells, used for `header.stp` when the listing carries no
    /// `stksize` directive. Mirrors `sc_stksize`.
    pub stack_cells: u32,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            compact: true,
            overlay: false,
            debug: false,
            nochecks: false,
            data_align: core::mem::size_of::<crate::cell::Cell>(),
            compact_margin: 64,
            uses_sleep: false,
            stack_cells: 4096,
        }
    }
}

impl AssemblerConfig {
    /// Header flags for a finished attempt. `compact` is the driver's effective, post-fallback
    /// setting, not `self.compact`: a compact-to-raw restart must clear the bit it advertises.
    pub(crate) fn flags(&self, compact: bool) -> HeaderFlags {
        let mut flags = HeaderFlags::empty();
        if self.overlay {
            flags |= HeaderFlags::OVERLAY;
        }
        if self.debug {
            flags |= HeaderFlags::DEBUG;
        }
        if compact {
            flags |= HeaderFlags::COMPACT;
        }
        if self.uses_sleep {
            flags |= HeaderFlags::SLEEP;
        }
        if self.nochecks {
            flags |= HeaderFlags::NOCHECKS;
        }
        flags
    }
}
