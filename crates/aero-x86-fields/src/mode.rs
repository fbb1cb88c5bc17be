use core::fmt;
use core::str::FromStr;

use crate::error::DecodeError;

/// CPU operating mode the instruction bytes were encoded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum OperatingMode {
    /// Real mode or 16-bit protected mode.
    Bits16,
    /// 32-bit protected mode.
    Bits32,
    /// Long mode with a 64-bit code segment.
    Bits64,
}

impl OperatingMode {
    pub const ALL: [OperatingMode; 3] = [Self::Bits16, Self::Bits32, Self::Bits64];

    pub fn bitness(self) -> u32 {
        match self {
            Self::Bits16 => 16,
            Self::Bits32 => 32,
            Self::Bits64 => 64,
        }
    }

    /// REX prefixes only exist in 64-bit mode; elsewhere `40..=4F` are INC/DEC.
    pub fn allows_rex(self) -> bool {
        self == Self::Bits64
    }
}

impl TryFrom<u32> for OperatingMode {
    type Error = DecodeError;

    fn try_from(bitness: u32) -> Result<Self, Self::Error> {
        match bitness {
            16 => Ok(Self::Bits16),
            32 => Ok(Self::Bits32),
            64 => Ok(Self::Bits64),
            other => Err(DecodeError::InvalidMode(other)),
        }
    }
}

impl FromStr for OperatingMode {
    type Err = DecodeError;

    /// Accepts `16`, `32`, `64`, optionally suffixed with `bit` or `-bit`.
    ///
    /// Text that is not a number fails with `InvalidMode(0)`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s
            .strip_suffix("-bit")
            .or_else(|| s.strip_suffix("bit"))
            .unwrap_or(s);
        let bitness: u32 = digits.parse().map_err(|_| DecodeError::InvalidMode(0))?;
        Self::try_from(bitness)
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit mode", self.bitness())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitness_round_trips() {
        for mode in OperatingMode::ALL {
            assert_eq!(OperatingMode::try_from(mode.bitness()), Ok(mode));
        }
        assert_eq!(OperatingMode::try_from(8), Err(DecodeError::InvalidMode(8)));
    }

    #[test]
    fn parses_textual_bitness() {
        assert_eq!("64".parse::<OperatingMode>(), Ok(OperatingMode::Bits64));
        assert_eq!("32bit".parse::<OperatingMode>(), Ok(OperatingMode::Bits32));
        assert_eq!(
            " 16-bit ".parse::<OperatingMode>(),
            Ok(OperatingMode::Bits16)
        );
        assert_eq!(
            "128".parse::<OperatingMode>(),
            Err(DecodeError::InvalidMode(128))
        );
        let err = "long".parse::<OperatingMode>().unwrap_err();
        assert_eq!(err, DecodeError::InvalidMode(0));
        assert_eq!(err.to_string(), "invalid operating mode: not a bitness");
    }
}
