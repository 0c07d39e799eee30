//! MessagePack lead-byte classification.
//!
//! Every format is described by a bit prefix of the lead byte. Prefixes have
//! different widths (1 bit for positive fixint, 3 for fixstr and negative
//! fixint, 4 for fixmap/fixarray, 8 for everything else), so matching them in
//! table order is sensitive to ordering. Instead, [`LOOKUP`] is computed at
//! compile time by assigning each of the 256 possible lead bytes to its longest
//! matching prefix, and [`classify`] is a single index.

/// Decoded MessagePack format of a lead byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    PositiveFixint,
    Fixmap,
    Fixarray,
    Fixstr,
    Nil,
    False,
    True,
    Bin8,
    Bin16,
    Bin32,
    Ext8,
    Ext16,
    Ext32,
    Float32,
    Float64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Fixext1,
    Fixext2,
    Fixext4,
    Fixext8,
    Fixext16,
    Str8,
    Str16,
    Str32,
    Array16,
    Array32,
    Map16,
    Map32,
    NegativeFixint,
}

/// One row of the format table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatDescriptor {
    /// Significant bits of the lead byte; the remaining low bits are zero.
    pub prefix: u8,
    /// Number of significant leading bits in `prefix`.
    pub prefix_bits: u8,
    pub format: Format,
    /// Width of the explicit field following the lead byte: a length or
    /// count for strings, binaries, extensions and containers, the raw value
    /// for fixed-width numbers, the payload size for `fixext`. Zero when
    /// everything is embedded in the lead byte.
    pub len: u8,
    pub flags: u8,
}

impl FormatDescriptor {
    /// Size or value is fixed by the format itself.
    pub const FIXED: u8 = 1 << 0;
    /// Map or array.
    pub const CONTAINER: u8 = 1 << 1;
    /// The lead byte alone carries the value.
    pub const TYPEVALUE: u8 = 1 << 2;
    /// Extension type; skipped by the decoder.
    pub const EXT: u8 = 1 << 3;

    const fn new(prefix: u8, prefix_bits: u8, format: Format, len: u8, flags: u8) -> Self {
        Self {
            prefix,
            prefix_bits,
            format,
            len,
            flags,
        }
    }

    /// Mask selecting the prefix bits of a lead byte.
    pub const fn mask(&self) -> u8 {
        (0xff00u16 >> self.prefix_bits) as u8
    }

    pub const fn matches(&self, byte: u8) -> bool {
        byte & self.mask() == self.prefix
    }

    /// The low bits of `lead` not covered by the prefix: the embedded length,
    /// count or value of fixed formats.
    pub const fn embedded(&self, lead: u8) -> u8 {
        lead & !self.mask()
    }

    pub const fn is_fixed(&self) -> bool {
        self.flags & Self::FIXED != 0
    }

    pub const fn is_container(&self) -> bool {
        self.flags & Self::CONTAINER != 0
    }

    pub const fn is_type_value(&self) -> bool {
        self.flags & Self::TYPEVALUE != 0
    }

    pub const fn is_ext(&self) -> bool {
        self.flags & Self::EXT != 0
    }
}

const FIXED: u8 = FormatDescriptor::FIXED;
const CONTAINER: u8 = FormatDescriptor::CONTAINER;
const TYPEVALUE: u8 = FormatDescriptor::TYPEVALUE;
const EXT: u8 = FormatDescriptor::EXT;

/// Every MessagePack format the decoder recognizes.
pub const FORMATS: [FormatDescriptor; 36] = [
    FormatDescriptor::new(0xa0, 3, Format::Fixstr, 0, FIXED),
    FormatDescriptor::new(0x00, 1, Format::PositiveFixint, 0, FIXED | TYPEVALUE),
    FormatDescriptor::new(0xe0, 3, Format::NegativeFixint, 0, FIXED | TYPEVALUE),
    FormatDescriptor::new(0x80, 4, Format::Fixmap, 0, FIXED | CONTAINER),
    FormatDescriptor::new(0x90, 4, Format::Fixarray, 0, FIXED | CONTAINER),
    FormatDescriptor::new(0xd9, 8, Format::Str8, 1, 0),
    FormatDescriptor::new(0xc4, 8, Format::Bin8, 1, 0),
    FormatDescriptor::new(0xcf, 8, Format::Uint64, 8, FIXED),
    FormatDescriptor::new(0xd3, 8, Format::Int64, 8, FIXED),
    FormatDescriptor::new(0xce, 8, Format::Uint32, 4, FIXED),
    FormatDescriptor::new(0xd2, 8, Format::Int32, 4, FIXED),
    FormatDescriptor::new(0xcb, 8, Format::Float64, 8, FIXED),
    FormatDescriptor::new(0xca, 8, Format::Float32, 4, FIXED),
    FormatDescriptor::new(0xc2, 8, Format::False, 0, FIXED | TYPEVALUE),
    FormatDescriptor::new(0xc3, 8, Format::True, 0, FIXED | TYPEVALUE),
    FormatDescriptor::new(0xcc, 8, Format::Uint8, 1, FIXED),
    FormatDescriptor::new(0xcd, 8, Format::Uint16, 2, FIXED),
    FormatDescriptor::new(0xd0, 8, Format::Int8, 1, FIXED),
    FormatDescriptor::new(0xd1, 8, Format::Int16, 2, FIXED),
    FormatDescriptor::new(0xc0, 8, Format::Nil, 0, FIXED | TYPEVALUE),
    FormatDescriptor::new(0xda, 8, Format::Str16, 2, 0),
    FormatDescriptor::new(0xdb, 8, Format::Str32, 4, 0),
    FormatDescriptor::new(0xc5, 8, Format::Bin16, 2, 0),
    FormatDescriptor::new(0xc6, 8, Format::Bin32, 4, 0),
    FormatDescriptor::new(0xdc, 8, Format::Array16, 2, CONTAINER),
    FormatDescriptor::new(0xdd, 8, Format::Array32, 4, CONTAINER),
    FormatDescriptor::new(0xde, 8, Format::Map16, 2, CONTAINER),
    FormatDescriptor::new(0xdf, 8, Format::Map32, 4, CONTAINER),
    FormatDescriptor::new(0xc7, 8, Format::Ext8, 1, EXT),
    FormatDescriptor::new(0xc8, 8, Format::Ext16, 2, EXT),
    FormatDescriptor::new(0xc9, 8, Format::Ext32, 4, EXT),
    FormatDescriptor::new(0xd4, 8, Format::Fixext1, 1, FIXED | EXT),
    FormatDescriptor::new(0xd5, 8, Format::Fixext2, 2, FIXED | EXT),
    FormatDescriptor::new(0xd6, 8, Format::Fixext4, 4, FIXED | EXT),
    FormatDescriptor::new(0xd7, 8, Format::Fixext8, 8, FIXED | EXT),
    FormatDescriptor::new(0xd8, 8, Format::Fixext16, 16, FIXED | EXT),
];

/// Runtime copy of [`FORMATS`] that lookups can borrow for `'static`.
static TABLE: [FormatDescriptor; 36] = FORMATS;

const INVALID: u8 = u8::MAX;

/// Index into [`FORMATS`] for every lead byte; `u8::MAX` marks the one byte
/// (`0xc1`) that MessagePack leaves unused.
pub const LOOKUP: [u8; 256] = build_lookup();

const fn build_lookup() -> [u8; 256] {
    let mut table = [INVALID; 256];
    let mut byte = 0;
    while byte < 256 {
        let mut best_bits = 0;
        let mut i = 0;
        while i < FORMATS.len() {
            let desc = &FORMATS[i];
            if desc.matches(byte as u8) && desc.prefix_bits > best_bits {
                table[byte] = i as u8;
                best_bits = desc.prefix_bits;
            }
            i += 1;
        }
        byte += 1;
    }
    table
}

/// Find the format of a lead byte, or `None` for an unassigned byte.
#[inline]
pub fn classify(lead: u8) -> Option<&'static FormatDescriptor> {
    match LOOKUP[usize::from(lead)] {
        INVALID => None,
        idx => TABLE.get(usize::from(idx)),
    }
}
