use crate::cursor::ByteCursor;
use crate::error::{Field, Result};
use crate::size::OperandSize;

/// Width of an immediate operand.
///
/// The primary opcode map never encodes a wider immediate than 32 bits through
/// this path, so only three widths exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ImmediateSize {
    Byte,
    Word,
    Dword,
}

impl ImmediateSize {
    pub fn bytes(self) -> u8 {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::Dword => 4,
        }
    }
}

impl From<OperandSize> for ImmediateSize {
    fn from(size: OperandSize) -> Self {
        match size {
            OperandSize::Bits16 => Self::Word,
            OperandSize::Bits32 => Self::Dword,
        }
    }
}

/// Read a little-endian, zero-extended immediate of exactly `size`.
pub fn read_immediate(cur: &mut ByteCursor<'_>, size: ImmediateSize) -> Result<u32> {
    let field = Field::Immediate;
    Ok(match size {
        ImmediateSize::Byte => u32::from(cur.read_u8(field)?),
        ImmediateSize::Word => u32::from(u16::from_le_bytes(cur.read_array(field)?)),
        ImmediateSize::Dword => u32::from_le_bytes(cur.read_array(field)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;

    #[test]
    fn zero_extends_each_width() {
        let mut cur = ByteCursor::new(&[0xFF, 0x34, 0x12, 0x78, 0x56, 0x34, 0xF2]);
        assert_eq!(read_immediate(&mut cur, ImmediateSize::Byte), Ok(0xFF));
        assert_eq!(read_immediate(&mut cur, ImmediateSize::Word), Ok(0x1234));
        assert_eq!(
            read_immediate(&mut cur, ImmediateSize::Dword),
            Ok(0xF234_5678)
        );
    }

    #[test]
    fn short_immediate_is_truncated() {
        let mut cur = ByteCursor::new(&[0x34]);
        assert_eq!(
            read_immediate(&mut cur, ImmediateSize::Word),
            Err(DecodeError::Truncated {
                field: Field::Immediate,
                offset: 0
            })
        );
    }

    #[test]
    fn operand_size_picks_the_immediate_width() {
        assert_eq!(ImmediateSize::from(OperandSize::Bits16).bytes(), 2);
        assert_eq!(ImmediateSize::from(OperandSize::Bits32).bytes(), 4);
    }
}
