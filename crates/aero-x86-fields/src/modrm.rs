//! ModR/M, SIB and displacement decoding.

use tracing::trace;

use crate::cursor::ByteCursor;
use crate::error::{Field, Result};
use crate::mode::OperatingMode;

/// ModR/M byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ModRm(pub u8);

impl ModRm {
    pub fn new(byte: u8) -> Self {
        Self(byte)
    }

    pub fn byte(self) -> u8 {
        self.0
    }

    /// Bits 7..6.
    pub fn mod_(self) -> u8 {
        self.0 >> 6
    }

    /// Bits 5..3.
    pub fn reg(self) -> u8 {
        (self.0 >> 3) & 0x7
    }

    /// Bits 2..0.
    pub fn rm(self) -> u8 {
        self.0 & 0x7
    }

    pub fn is_register(self) -> bool {
        self.mod_() == 0b11
    }
}

/// SIB byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Sib(pub u8);

impl Sib {
    pub fn new(byte: u8) -> Self {
        Self(byte)
    }

    pub fn byte(self) -> u8 {
        self.0
    }

    /// Raw 2-bit scale field; the multiplier is `1 << scale`.
    pub fn scale(self) -> u8 {
        self.0 >> 6
    }

    pub fn index(self) -> u8 {
        (self.0 >> 3) & 0x7
    }

    pub fn base(self) -> u8 {
        self.0 & 0x7
    }
}

/// Whether a SIB byte follows this ModR/M byte.
///
/// The rule is the same in every mode; 16-bit addressing has no SIB byte but
/// the field view is still reported as the raw encoding dictates.
pub fn has_sib(modrm: ModRm) -> bool {
    !modrm.is_register() && modrm.rm() == 0b100
}

// Indexed by mod. The absolute `mod = 00` form (rm=110 / rm=101) is handled
// before the lookup.
const DISP_16: [u8; 4] = [0, 1, 2, 0];
const DISP_32: [u8; 4] = [0, 1, 4, 0];

/// Displacement width in bytes implied by `modrm` in `mode`.
///
/// The SIB byte is never consulted: `mod = 00` with SIB `base = 101` gets no
/// displacement here even though the encoding carries a disp32.
pub fn displacement_size(mode: OperatingMode, modrm: ModRm) -> u8 {
    let md = usize::from(modrm.mod_());
    match mode {
        OperatingMode::Bits16 if md == 0b00 && modrm.rm() == 0b110 => 2,
        OperatingMode::Bits16 => DISP_16[md],
        _ if md == 0b00 && modrm.rm() == 0b101 => 4,
        _ => DISP_32[md],
    }
}

/// Memory-addressing fields read after the opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addressing {
    pub modrm: ModRm,
    pub sib: Option<Sib>,
    pub displacement: Option<i32>,
    pub displacement_size: u8,
}

/// Read ModR/M, then SIB and displacement as the ModR/M byte requires.
pub fn read_addressing(cur: &mut ByteCursor<'_>, mode: OperatingMode) -> Result<Addressing> {
    let modrm = ModRm::new(cur.read_u8(Field::ModRm)?);
    let sib = if has_sib(modrm) {
        Some(Sib::new(cur.read_u8(Field::Sib)?))
    } else {
        None
    };

    let displacement_size = displacement_size(mode, modrm);
    let field = Field::Displacement;
    let displacement = match displacement_size {
        0 => None,
        1 => Some(i32::from(i8::from_le_bytes(cur.read_array(field)?))),
        2 => Some(i32::from(i16::from_le_bytes(cur.read_array(field)?))),
        _ => Some(i32::from_le_bytes(cur.read_array(field)?)),
    };

    trace!(
        modrm = modrm.0,
        sib = ?sib.map(Sib::byte),
        displacement_size,
        "addressing"
    );

    Ok(Addressing {
        modrm,
        sib,
        displacement,
        displacement_size,
    })
}
