use core::fmt;

use thiserror::Error;

use crate::mode::OperatingMode;

pub type Result<T> = std::result::Result<T, DecodeError>;

/// Instruction field that was being read when the byte stream ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Field {
    Opcode,
    ModRm,
    Sib,
    Displacement,
    Immediate,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Opcode => "opcode",
            Self::ModRm => "ModRM",
            Self::Sib => "SIB",
            Self::Displacement => "displacement",
            Self::Immediate => "immediate",
        })
    }
}

/// Decoder error.
///
/// Every variant is terminal for the call that produced it: the decoder never
/// hands back a partially-filled record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The byte stream ended before `field` could be read.
    #[error("truncated instruction: {field} missing at byte offset {offset}")]
    Truncated { field: Field, offset: usize },

    /// The opcode byte has no entry in the opcode table.
    #[error("unsupported opcode {opcode:#04x}")]
    Unsupported { opcode: u8 },

    /// The opcode exists but is not encodable in the requested mode.
    #[error("opcode {opcode:#04x} is not valid in {mode}")]
    ModeIncompatible { opcode: u8, mode: OperatingMode },

    /// A bitness other than 16, 32 or 64 was supplied as an operating mode.
    ///
    /// `0` stands for text that did not parse as a number at all.
    #[error("invalid operating mode: {}", describe_bitness(.0))]
    InvalidMode(u32),
}

fn describe_bitness(bits: &u32) -> String {
    match bits {
        0 => "not a bitness".to_owned(),
        n => format!("{n}-bit"),
    }
}

/// Field-less classification of [`DecodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeErrorKind {
    Truncated,
    Unsupported,
    ModeIncompatible,
    InvalidMode,
}

impl DecodeError {
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            Self::Truncated { .. } => DecodeErrorKind::Truncated,
            Self::Unsupported { .. } => DecodeErrorKind::Unsupported,
            Self::ModeIncompatible { .. } => DecodeErrorKind::ModeIncompatible,
            Self::InvalidMode(_) => DecodeErrorKind::InvalidMode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_field() {
        let err = DecodeError::Truncated {
            field: Field::Displacement,
            offset: 3,
        };
        assert_eq!(
            err.to_string(),
            "truncated instruction: displacement missing at byte offset 3"
        );
        assert_eq!(
            DecodeError::Unsupported { opcode: 0x0f }.to_string(),
            "unsupported opcode 0x0f"
        );
        assert_eq!(
            DecodeError::ModeIncompatible {
                opcode: 0x06,
                mode: OperatingMode::Bits64
            }
            .to_string(),
            "opcode 0x06 is not valid in 64-bit mode"
        );
    }

    #[test]
    fn invalid_mode_message_separates_unparseable_text() {
        assert_eq!(
            DecodeError::InvalidMode(8).to_string(),
            "invalid operating mode: 8-bit"
        );
        assert_eq!(
            DecodeError::InvalidMode(0).to_string(),
            "invalid operating mode: not a bitness"
        );
    }

    #[test]
    fn kind_drops_payload() {
        assert_eq!(
            DecodeError::InvalidMode(8).kind(),
            DecodeErrorKind::InvalidMode
        );
        assert_eq!(
            DecodeError::Unsupported { opcode: 0xd6 }.kind(),
            DecodeErrorKind::Unsupported
        );
    }
}
