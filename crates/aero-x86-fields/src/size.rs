use crate::mode::OperatingMode;
use crate::prefix::{has_prefix, PrefixRecord, ADDRESS_SIZE_OVERRIDE, OPERAND_SIZE_OVERRIDE};

/// Effective operand size.
///
/// REX.W is not taken into account, so there is no 64-bit variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum OperandSize {
    Bits16,
    Bits32,
}

impl OperandSize {
    pub fn bytes(self) -> u8 {
        match self {
            Self::Bits16 => 2,
            Self::Bits32 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AddressSize {
    Bits16,
    Bits32,
    Bits64,
}

impl AddressSize {
    pub fn bytes(self) -> u8 {
        match self {
            Self::Bits16 => 2,
            Self::Bits32 => 4,
            Self::Bits64 => 8,
        }
    }
}

pub fn effective_operand_size(mode: OperatingMode, prefixes: &[PrefixRecord]) -> OperandSize {
    let default = match mode {
        OperatingMode::Bits16 => OperandSize::Bits16,
        OperatingMode::Bits32 | OperatingMode::Bits64 => OperandSize::Bits32,
    };
    if !has_prefix(prefixes, OPERAND_SIZE_OVERRIDE) {
        return default;
    }
    match default {
        OperandSize::Bits16 => OperandSize::Bits32,
        OperandSize::Bits32 => OperandSize::Bits16,
    }
}

pub fn effective_address_size(mode: OperatingMode, prefixes: &[PrefixRecord]) -> AddressSize {
    let overridden = has_prefix(prefixes, ADDRESS_SIZE_OVERRIDE);
    match (mode, overridden) {
        (OperatingMode::Bits16, false) => AddressSize::Bits16,
        (OperatingMode::Bits16, true) => AddressSize::Bits32,
        (OperatingMode::Bits32, false) => AddressSize::Bits32,
        (OperatingMode::Bits32, true) => AddressSize::Bits16,
        (OperatingMode::Bits64, false) => AddressSize::Bits64,
        (OperatingMode::Bits64, true) => AddressSize::Bits32,
    }
}
