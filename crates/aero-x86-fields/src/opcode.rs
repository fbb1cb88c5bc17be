//! Primary opcode map.
//!
//! Each descriptor only records the *shape* of the bytes that follow the
//! opcode (ModR/M present, immediate present and how wide, mode
//! restrictions). Operation semantics are out of scope.

use std::ops::RangeInclusive;
use std::sync::OnceLock;

use tracing::trace;

use crate::cursor::ByteCursor;
use crate::error::{DecodeError, Field, Result};
use crate::immediate::ImmediateSize;
use crate::mode::OperatingMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OpcodeDescriptor {
    /// Opcode byte this descriptor is stored under.
    pub value: u8,
    /// Display hint; group opcodes use the group name.
    pub mnemonic: &'static str,
    pub has_modrm: bool,
    pub has_immediate: bool,
    /// Fixed immediate width. `None` means "follow the operand size".
    pub immediate_size: Option<ImmediateSize>,
    /// Removed in long mode.
    pub invalid_64bit: bool,
    /// Only encodable in long mode.
    pub only_64bit: bool,
    /// Group 3 (`F6`/`F7`): only the TEST forms (`/0`, `/1`) carry an immediate.
    pub test_group_immediate: bool,
}

impl OpcodeDescriptor {
    pub const fn new(mnemonic: &'static str) -> Self {
        Self {
            value: 0,
            mnemonic,
            has_modrm: false,
            has_immediate: false,
            immediate_size: None,
            invalid_64bit: false,
            only_64bit: false,
            test_group_immediate: false,
        }
    }

    pub const fn with_modrm(mut self) -> Self {
        self.has_modrm = true;
        self
    }

    /// Operand-size immediate (`iw`/`id`).
    pub const fn with_imm(mut self) -> Self {
        self.has_immediate = true;
        self.immediate_size = None;
        self
    }

    pub const fn with_imm8(mut self) -> Self {
        self.has_immediate = true;
        self.immediate_size = Some(ImmediateSize::Byte);
        self
    }

    pub const fn with_imm16(mut self) -> Self {
        self.has_immediate = true;
        self.immediate_size = Some(ImmediateSize::Word);
        self
    }

    pub const fn invalid_in_64bit(mut self) -> Self {
        self.invalid_64bit = true;
        self
    }

    pub const fn requires_64bit(mut self) -> Self {
        self.only_64bit = true;
        self
    }

    const fn test_group(mut self, size: Option<ImmediateSize>) -> Self {
        self.test_group_immediate = true;
        self.immediate_size = size;
        self
    }

    pub fn is_valid_in(&self, mode: OperatingMode) -> bool {
        match mode {
            OperatingMode::Bits64 => !self.invalid_64bit,
            OperatingMode::Bits16 | OperatingMode::Bits32 => !self.only_64bit,
        }
    }
}

/// 256-entry lookup table keyed by the first opcode byte.
#[derive(Debug, Clone)]
pub struct OpcodeTable {
    entries: [Option<OpcodeDescriptor>; 256],
}

impl OpcodeTable {
    /// The built-in primary map. Built on first use and shared afterwards.
    pub fn primary() -> &'static OpcodeTable {
        static PRIMARY: OnceLock<OpcodeTable> = OnceLock::new();
        PRIMARY.get_or_init(|| OpcodeTableBuilder::primary().build())
    }

    /// Start from an empty table.
    pub fn builder() -> OpcodeTableBuilder {
        OpcodeTableBuilder::empty()
    }

    pub fn lookup(&self, byte: u8) -> Option<&OpcodeDescriptor> {
        self.entries[usize::from(byte)].as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OpcodeDescriptor> {
        self.entries.iter().flatten()
    }
}

#[derive(Debug, Clone)]
pub struct OpcodeTableBuilder {
    entries: [Option<OpcodeDescriptor>; 256],
}

const ALU_OPS: [&str; 8] = ["add", "or", "adc", "sbb", "and", "sub", "xor", "cmp"];

impl OpcodeTableBuilder {
    pub fn empty() -> Self {
        Self {
            entries: [None; 256],
        }
    }

    /// Builder pre-populated with the primary map, for callers that want to
    /// patch a few entries.
    pub fn primary() -> Self {
        let mut b = Self::empty();

        for (i, name) in ALU_OPS.iter().copied().enumerate() {
            let base = (i as u8) << 3;
            b.insert_range(base..=base + 3, OpcodeDescriptor::new(name).with_modrm());
            b.insert(base + 4, OpcodeDescriptor::new(name).with_imm8());
            b.insert(base + 5, OpcodeDescriptor::new(name).with_imm());
        }

        // Segment register push/pop and BCD adjust sit in the ALU rows.
        let legacy = [
            (0x06, "push es"),
            (0x07, "pop es"),
            (0x0E, "push cs"),
            (0x16, "push ss"),
            (0x17, "pop ss"),
            (0x1E, "push ds"),
            (0x1F, "pop ds"),
            (0x27, "daa"),
            (0x2F, "das"),
            (0x37, "aaa"),
            (0x3F, "aas"),
        ];
        for (op, name) in legacy {
            b.insert(op, OpcodeDescriptor::new(name).invalid_in_64bit());
        }

        // In 64-bit mode these bytes are REX prefixes; one that reaches the
        // opcode slot is a second REX and is rejected.
        b.insert_range(0x40..=0x47, OpcodeDescriptor::new("inc").invalid_in_64bit());
        b.insert_range(0x48..=0x4F, OpcodeDescriptor::new("dec").invalid_in_64bit());
        b.insert_range(0x50..=0x57, OpcodeDescriptor::new("push"));
        b.insert_range(0x58..=0x5F, OpcodeDescriptor::new("pop"));

        b.insert(0x60, OpcodeDescriptor::new("pusha").invalid_in_64bit());
        b.insert(0x61, OpcodeDescriptor::new("popa").invalid_in_64bit());
        b.insert(
            0x62,
            OpcodeDescriptor::new("bound")
                .with_modrm()
                .invalid_in_64bit(),
        );
        b.insert(0x63, OpcodeDescriptor::new("arpl/movsxd").with_modrm());
        b.insert(0x68, OpcodeDescriptor::new("push").with_imm());
        b.insert(0x69, OpcodeDescriptor::new("imul").with_modrm().with_imm());
        b.insert(0x6A, OpcodeDescriptor::new("push").with_imm8());
        b.insert(0x6B, OpcodeDescriptor::new("imul").with_modrm().with_imm8());
        b.insert(0x6C, OpcodeDescriptor::new("insb"));
        b.insert(0x6D, OpcodeDescriptor::new("ins"));
        b.insert(0x6E, OpcodeDescriptor::new("outsb"));
        b.insert(0x6F, OpcodeDescriptor::new("outs"));
        b.insert_range(0x70..=0x7F, OpcodeDescriptor::new("jcc").with_imm8());

        b.insert(0x80, OpcodeDescriptor::new("grp1").with_modrm().with_imm8());
        b.insert(0x81, OpcodeDescriptor::new("grp1").with_modrm().with_imm());
        b.insert(
            0x82,
            OpcodeDescriptor::new("grp1")
                .with_modrm()
                .with_imm8()
                .invalid_in_64bit(),
        );
        b.insert(0x83, OpcodeDescriptor::new("grp1").with_modrm().with_imm8());
        b.insert_range(0x84..=0x85, OpcodeDescriptor::new("test").with_modrm());
        b.insert_range(0x86..=0x87, OpcodeDescriptor::new("xchg").with_modrm());
        b.insert_range(0x88..=0x8C, OpcodeDescriptor::new("mov").with_modrm());
        b.insert(0x8D, OpcodeDescriptor::new("lea").with_modrm());
        b.insert(0x8E, OpcodeDescriptor::new("mov").with_modrm());
        b.insert(0x8F, OpcodeDescriptor::new("pop").with_modrm());

        b.insert(0x90, OpcodeDescriptor::new("nop"));
        b.insert_range(0x91..=0x97, OpcodeDescriptor::new("xchg"));
        b.insert(0x98, OpcodeDescriptor::new("cbw"));
        b.insert(0x99, OpcodeDescriptor::new("cwd"));
        b.insert(0x9B, OpcodeDescriptor::new("fwait"));
        b.insert(0x9C, OpcodeDescriptor::new("pushf"));
        b.insert(0x9D, OpcodeDescriptor::new("popf"));
        b.insert(0x9E, OpcodeDescriptor::new("sahf"));
        b.insert(0x9F, OpcodeDescriptor::new("lahf"));

        b.insert(0xA4, OpcodeDescriptor::new("movsb"));
        b.insert(0xA5, OpcodeDescriptor::new("movs"));
        b.insert(0xA6, OpcodeDescriptor::new("cmpsb"));
        b.insert(0xA7, OpcodeDescriptor::new("cmps"));
        b.insert(0xA8, OpcodeDescriptor::new("test").with_imm8());
        b.insert(0xA9, OpcodeDescriptor::new("test").with_imm());
        b.insert(0xAA, OpcodeDescriptor::new("stosb"));
        b.insert(0xAB, OpcodeDescriptor::new("stos"));
        b.insert(0xAC, OpcodeDescriptor::new("lodsb"));
        b.insert(0xAD, OpcodeDescriptor::new("lods"));
        b.insert(0xAE, OpcodeDescriptor::new("scasb"));
        b.insert(0xAF, OpcodeDescriptor::new("scas"));
        b.insert_range(0xB0..=0xB7, OpcodeDescriptor::new("mov").with_imm8());
        b.insert_range(0xB8..=0xBF, OpcodeDescriptor::new("mov").with_imm());

        b.insert_range(
            0xC0..=0xC1,
            OpcodeDescriptor::new("grp2").with_modrm().with_imm8(),
        );
        b.insert(0xC2, OpcodeDescriptor::new("ret").with_imm16());
        b.insert(0xC3, OpcodeDescriptor::new("ret"));
        // VEX escapes in long mode.
        b.insert(
            0xC4,
            OpcodeDescriptor::new("les").with_modrm().invalid_in_64bit(),
        );
        b.insert(
            0xC5,
            OpcodeDescriptor::new("lds").with_modrm().invalid_in_64bit(),
        );
        b.insert(0xC6, OpcodeDescriptor::new("mov").with_modrm().with_imm8());
        b.insert(0xC7, OpcodeDescriptor::new("mov").with_modrm().with_imm());
        b.insert(0xC9, OpcodeDescriptor::new("leave"));
        b.insert(0xCA, OpcodeDescriptor::new("retf").with_imm16());
        b.insert(0xCB, OpcodeDescriptor::new("retf"));
        b.insert(0xCC, OpcodeDescriptor::new("int3"));
        b.insert(0xCD, OpcodeDescriptor::new("int").with_imm8());
        b.insert(0xCE, OpcodeDescriptor::new("into").invalid_in_64bit());
        b.insert(0xCF, OpcodeDescriptor::new("iret"));

        b.insert_range(0xD0..=0xD3, OpcodeDescriptor::new("grp2").with_modrm());
        b.insert(
            0xD4,
            OpcodeDescriptor::new("aam").with_imm8().invalid_in_64bit(),
        );
        b.insert(
            0xD5,
            OpcodeDescriptor::new("aad").with_imm8().invalid_in_64bit(),
        );
        b.insert(0xD7, OpcodeDescriptor::new("xlat"));
        b.insert_range(0xD8..=0xDF, OpcodeDescriptor::new("esc").with_modrm());

        b.insert(0xE0, OpcodeDescriptor::new("loopne").with_imm8());
        b.insert(0xE1, OpcodeDescriptor::new("loope").with_imm8());
        b.insert(0xE2, OpcodeDescriptor::new("loop").with_imm8());
        b.insert(0xE3, OpcodeDescriptor::new("jcxz").with_imm8());
        b.insert_range(0xE4..=0xE5, OpcodeDescriptor::new("in").with_imm8());
        b.insert_range(0xE6..=0xE7, OpcodeDescriptor::new("out").with_imm8());
        b.insert(0xE8, OpcodeDescriptor::new("call").with_imm());
        b.insert(0xE9, OpcodeDescriptor::new("jmp").with_imm());
        b.insert(0xEB, OpcodeDescriptor::new("jmp").with_imm8());
        b.insert_range(0xEC..=0xED, OpcodeDescriptor::new("in"));
        b.insert_range(0xEE..=0xEF, OpcodeDescriptor::new("out"));

        b.insert(0xF1, OpcodeDescriptor::new("int1"));
        b.insert(0xF4, OpcodeDescriptor::new("hlt"));
        b.insert(0xF5, OpcodeDescriptor::new("cmc"));
        b.insert(
            0xF6,
            OpcodeDescriptor::new("grp3")
                .with_modrm()
                .test_group(Some(ImmediateSize::Byte)),
        );
        b.insert(
            0xF7,
            OpcodeDescriptor::new("grp3").with_modrm().test_group(None),
        );
        b.insert(0xF8, OpcodeDescriptor::new("clc"));
        b.insert(0xF9, OpcodeDescriptor::new("stc"));
        b.insert(0xFA, OpcodeDescriptor::new("cli"));
        b.insert(0xFB, OpcodeDescriptor::new("sti"));
        b.insert(0xFC, OpcodeDescriptor::new("cld"));
        b.insert(0xFD, OpcodeDescriptor::new("std"));
        b.insert(0xFE, OpcodeDescriptor::new("grp4").with_modrm());
        b.insert(0xFF, OpcodeDescriptor::new("grp5").with_modrm());

        b
    }

    /// Store `desc` under `value`, overwriting any previous entry.
    pub fn insert(&mut self, value: u8, desc: OpcodeDescriptor) -> &mut Self {
        self.entries[usize::from(value)] = Some(OpcodeDescriptor { value, ..desc });
        self
    }

    pub fn insert_range(
        &mut self,
        values: RangeInclusive<u8>,
        desc: OpcodeDescriptor,
    ) -> &mut Self {
        for value in values {
            self.insert(value, desc);
        }
        self
    }

    pub fn remove(&mut self, value: u8) -> &mut Self {
        self.entries[usize::from(value)] = None;
        self
    }

    pub fn build(&self) -> OpcodeTable {
        OpcodeTable {
            entries: self.entries,
        }
    }
}

impl Default for OpcodeTableBuilder {
    fn default() -> Self {
        Self::empty()
    }
}

/// Read the opcode byte and check it against `table` and `mode`.
pub fn resolve_opcode(
    cur: &mut ByteCursor<'_>,
    table: &OpcodeTable,
    mode: OperatingMode,
) -> Result<OpcodeDescriptor> {
    let opcode = cur.read_u8(Field::Opcode)?;
    let desc = *table
        .lookup(opcode)
        .ok_or(DecodeError::Unsupported { opcode })?;
    if !desc.is_valid_in(mode) {
        return Err(DecodeError::ModeIncompatible { opcode, mode });
    }
    trace!(opcode, mnemonic = desc.mnemonic, "opcode");
    Ok(desc)
}
