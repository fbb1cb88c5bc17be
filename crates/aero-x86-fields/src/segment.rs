//! Implied segment selection.
//!
//! An explicit override prefix always wins. Otherwise the segment follows from
//! the addressing form: stack-pointer/frame-pointer based forms use SS,
//! RIP-relative forms in 64-bit mode report CS, and everything else uses DS.

use core::fmt;

use crate::mode::OperatingMode;
use crate::modrm::{ModRm, Sib};
use crate::prefix::PrefixRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SegmentRegister {
    Cs,
    Ss,
    Ds,
    Es,
    Fs,
    Gs,
}

impl SegmentRegister {
    pub fn from_override_prefix(byte: u8) -> Option<Self> {
        Some(match byte {
            0x2E => Self::Cs,
            0x36 => Self::Ss,
            0x3E => Self::Ds,
            0x26 => Self::Es,
            0x64 => Self::Fs,
            0x65 => Self::Gs,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Cs => "CS",
            Self::Ss => "SS",
            Self::Ds => "DS",
            Self::Es => "ES",
            Self::Fs => "FS",
            Self::Gs => "GS",
        }
    }
}

impl fmt::Display for SegmentRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

use SegmentRegister::{Cs, Ds, Ss};

// [mod][rm]
const SEGMENT_16: [[SegmentRegister; 8]; 4] = [
    [Ds, Ds, Ss, Ss, Ds, Ds, Ds, Ds],
    [Ds, Ds, Ss, Ss, Ds, Ds, Ss, Ds],
    [Ds, Ds, Ss, Ss, Ds, Ds, Ss, Ds],
    [Ds; 8],
];

// Forms without a SIB byte, [mod][rm]. `rm = 100` defers to the SIB tables.
const SEGMENT_32_NO_SIB: [[SegmentRegister; 8]; 4] = [
    [Ds; 8],
    [Ds, Ds, Ds, Ds, Ds, Ss, Ds, Ds],
    [Ds, Ds, Ds, Ds, Ds, Ss, Ds, Ds],
    [Ds; 8],
];

const SEGMENT_64_NO_SIB: [[SegmentRegister; 8]; 4] = [
    [Ds, Ds, Ds, Ds, Ds, Cs, Ds, Ds],
    [Ds, Ds, Ds, Ds, Ds, Ss, Ds, Ds],
    [Ds, Ds, Ds, Ds, Ds, Ss, Ds, Ds],
    [Ds; 8],
];

// SIB forms (`rm = 100`, `mod != 11`), [mod][base]. Identical in 32- and 64-bit
// mode. `base = 101` with `mod = 00` is disp32 with no base register.
//
// REX.B is not consulted, so `base = 101` is always treated as (E/R)BP even
// when REX.B selects R13.
const SEGMENT_SIB: [[SegmentRegister; 8]; 3] = [
    [Ds, Ds, Ds, Ds, Ss, Ds, Ds, Ds],
    [Ds, Ds, Ds, Ds, Ss, Ss, Ds, Ds],
    [Ds, Ds, Ds, Ds, Ss, Ss, Ds, Ds],
];

/// Segment implied by the ModRM/SIB addressing form, ignoring prefixes.
///
/// A missing SIB byte reads as `0`, so a SIB-less `rm = 100` form (which the
/// analyzer never produces) falls back to DS.
pub fn default_segment(mode: OperatingMode, modrm: ModRm, sib: Option<Sib>) -> SegmentRegister {
    let md = usize::from(modrm.mod_());
    let rm = usize::from(modrm.rm());
    if md == 0b11 {
        return Ds;
    }
    let base = usize::from(sib.map_or(0, Sib::base));

    match mode {
        OperatingMode::Bits16 => SEGMENT_16[md][rm],
        OperatingMode::Bits32 | OperatingMode::Bits64 if rm == 0b100 => SEGMENT_SIB[md][base],
        OperatingMode::Bits32 => SEGMENT_32_NO_SIB[md][rm],
        OperatingMode::Bits64 => SEGMENT_64_NO_SIB[md][rm],
    }
}

/// Resolve the segment an instruction's memory operand uses.
///
/// When several override prefixes are present the winner is chosen by the
/// fixed order CS, SS, DS, ES, FS, GS rather than by position in the stream.
/// Without an override or a ModRM byte there is no memory operand to inspect
/// and DS is reported.
pub fn infer_segment(
    prefixes: &[PrefixRecord],
    modrm: Option<ModRm>,
    sib: Option<Sib>,
    mode: OperatingMode,
) -> SegmentRegister {
    let overrides = prefixes.iter().filter_map(PrefixRecord::segment_override);
    if let Some(seg) = overrides.min() {
        return seg;
    }
    match modrm {
        Some(modrm) => default_segment(mode, modrm, sib),
        None => Ds,
    }
}
