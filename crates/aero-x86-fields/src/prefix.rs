//! Legacy and REX prefix scanning.

use crate::cursor::ByteCursor;
use crate::mode::OperatingMode;
use crate::segment::SegmentRegister;

pub const LOCK: u8 = 0xF0;
pub const REPNE: u8 = 0xF2;
pub const REP: u8 = 0xF3;
pub const OPERAND_SIZE_OVERRIDE: u8 = 0x66;
pub const ADDRESS_SIZE_OVERRIDE: u8 = 0x67;

/// One prefix byte as it appeared in the instruction stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PrefixRecord {
    pub byte: u8,
    pub name: &'static str,
}

impl PrefixRecord {
    pub fn is_rex(&self) -> bool {
        rex_name(self.byte).is_some()
    }

    /// REX bits, if this record came from the REX slot.
    ///
    /// Only meaningful for records produced by a 64-bit scan; in other modes
    /// `40..=4F` are never recorded as prefixes.
    pub fn rex(&self) -> Option<Rex> {
        self.is_rex().then(|| Rex::from_byte(self.byte))
    }

    pub fn segment_override(&self) -> Option<SegmentRegister> {
        SegmentRegister::from_override_prefix(self.byte)
    }
}

/// REX prefix fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Rex {
    pub w: bool,
    pub r: bool,
    pub x: bool,
    pub b: bool,
}

impl Rex {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            w: byte & 0b1000 != 0,
            r: byte & 0b0100 != 0,
            x: byte & 0b0010 != 0,
            b: byte & 0b0001 != 0,
        }
    }
}

fn legacy_name(byte: u8) -> Option<&'static str> {
    Some(match byte {
        LOCK => "LOCK",
        REPNE => "REPNE",
        REP => "REP/REPE",
        0x2E => "CS",
        0x36 => "SS",
        0x3E => "DS",
        0x26 => "ES",
        0x64 => "FS",
        0x65 => "GS",
        OPERAND_SIZE_OVERRIDE => "Operand-size override",
        ADDRESS_SIZE_OVERRIDE => "Address-size override",
        _ => return None,
    })
}

// Indexed by the low nibble (W R X B).
const REX_NAMES: [&str; 16] = [
    "REX", "REX.B", "REX.X", "REX.XB", "REX.R", "REX.RB", "REX.RX", "REX.RXB", "REX.W", "REX.WB",
    "REX.WX", "REX.WXB", "REX.WR", "REX.WRB", "REX.WRX", "REX.WRXB",
];

fn rex_name(byte: u8) -> Option<&'static str> {
    match byte {
        0x40..=0x4F => Some(REX_NAMES[usize::from(byte & 0x0F)]),
        _ => None,
    }
}

/// Consume the prefix run at the cursor.
///
/// Legacy prefixes are taken in any order and number. In 64-bit mode a single
/// REX byte directly after them is also taken; a second REX byte is left for
/// the opcode resolver.
pub fn scan_prefixes(cur: &mut ByteCursor<'_>, mode: OperatingMode) -> Vec<PrefixRecord> {
    let mut prefixes = Vec::new();

    while let Some((byte, name)) = cur.peek().and_then(|b| Some((b, legacy_name(b)?))) {
        prefixes.push(PrefixRecord { byte, name });
        cur.bump();
    }

    if mode.allows_rex() {
        if let Some((byte, name)) = cur.peek().and_then(|b| Some((b, rex_name(b)?))) {
            prefixes.push(PrefixRecord { byte, name });
            cur.bump();
        }
    }

    prefixes
}

pub fn has_prefix(prefixes: &[PrefixRecord], byte: u8) -> bool {
    prefixes.iter().any(|p| p.byte == byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(bytes: &[u8], mode: OperatingMode) -> (Vec<u8>, usize) {
        let mut cur = ByteCursor::new(bytes);
        let prefixes = scan_prefixes(&mut cur, mode);
        (prefixes.iter().map(|p| p.byte).collect(), cur.position())
    }

    #[test]
    fn empty_input_has_no_prefixes() {
        assert_eq!(scan(&[], OperatingMode::Bits64), (vec![], 0));
        assert_eq!(scan(&[0x90], OperatingMode::Bits32), (vec![], 0));
    }

    #[test]
    fn legacy_prefixes_keep_stream_order_and_duplicates() {
        let (bytes, len) = scan(&[0xF3, 0x66, 0x66, 0x2E, 0xA5], OperatingMode::Bits32);
        assert_eq!(bytes, vec![0xF3, 0x66, 0x66, 0x2E]);
        assert_eq!(len, 4);
    }

    #[test]
    fn rex_only_in_long_mode() {
        let bytes = [0x48, 0x89, 0xC3];
        assert_eq!(scan(&bytes, OperatingMode::Bits64), (vec![0x48], 1));
        assert_eq!(scan(&bytes, OperatingMode::Bits32), (vec![], 0));
        assert_eq!(scan(&bytes, OperatingMode::Bits16), (vec![], 0));
    }

    #[test]
    fn rex_is_taken_once_after_legacy_prefixes() {
        let (bytes, len) = scan(&[0x66, 0x41, 0x48, 0x89], OperatingMode::Bits64);
        assert_eq!(bytes, vec![0x66, 0x41]);
        assert_eq!(len, 2);
    }

    #[test]
    fn legacy_prefix_after_rex_ends_the_scan() {
        let (bytes, _) = scan(&[0x48, 0x66, 0x89, 0xC3], OperatingMode::Bits64);
        assert_eq!(bytes, vec![0x48]);
    }

    #[test]
    fn rex_names_spell_out_set_bits() {
        assert_eq!(rex_name(0x40), Some("REX"));
        assert_eq!(rex_name(0x48), Some("REX.W"));
        assert_eq!(rex_name(0x4D), Some("REX.WRB"));
        assert_eq!(rex_name(0x4F), Some("REX.WRXB"));
        assert_eq!(rex_name(0x50), None);

        let rex = Rex::from_byte(0x4D);
        assert_eq!(
            rex,
            Rex {
                w: true,
                r: true,
                x: false,
                b: true
            }
        );
    }

    #[test]
    fn records_expose_segment_overrides() {
        let mut cur = ByteCursor::new(&[0x64, 0x8B, 0x00]);
        let prefixes = scan_prefixes(&mut cur, OperatingMode::Bits64);
        assert_eq!(prefixes[0].name, "FS");
        assert_eq!(prefixes[0].segment_override(), Some(SegmentRegister::Fs));
        assert_eq!(prefixes[0].rex(), None);
    }
}
