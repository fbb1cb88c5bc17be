use tracing::{trace, trace_span};

use crate::cursor::ByteCursor;
use crate::error::Result;
use crate::immediate::{read_immediate, ImmediateSize};
use crate::mode::OperatingMode;
use crate::modrm::{read_addressing, ModRm, Sib};
use crate::opcode::{resolve_opcode, OpcodeDescriptor, OpcodeTable};
use crate::prefix::{scan_prefixes, PrefixRecord};
use crate::segment::{infer_segment, SegmentRegister};
use crate::size::{effective_address_size, effective_operand_size, AddressSize, OperandSize};

/// The fields of one decoded instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DecodedInstruction {
    /// Legacy prefixes in stream order, followed by the REX prefix if any.
    pub prefixes: Vec<PrefixRecord>,
    pub opcode: OpcodeDescriptor,
    pub modrm: Option<ModRm>,
    pub sib: Option<Sib>,
    /// Sign-extended from `displacement_size` bytes.
    pub displacement: Option<i32>,
    /// In bytes; `0` when there is no displacement.
    pub displacement_size: u8,
    /// Zero-extended from `immediate_size` bytes.
    pub immediate: Option<u32>,
    /// In bytes; `0` when there is no immediate.
    pub immediate_size: u8,
    pub address_size: AddressSize,
    pub operand_size: OperandSize,
    pub segment: SegmentRegister,
    /// Number of bytes consumed from the input.
    pub length: usize,
}

impl DecodedInstruction {
    /// Operand width in bytes as a front-end would show it: the opcode's fixed
    /// immediate width if it has one, otherwise the resolved operand size.
    pub fn effective_operand_size(&self) -> u8 {
        self.opcode
            .immediate_size
            .map_or(self.operand_size.bytes(), ImmediateSize::bytes)
    }

    pub fn rex(&self) -> Option<crate::prefix::Rex> {
        self.prefixes.iter().find_map(PrefixRecord::rex)
    }
}

/// Decoder bound to an operating mode and an opcode table.
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'t> {
    mode: OperatingMode,
    table: &'t OpcodeTable,
}

impl Decoder<'static> {
    /// Decoder over the built-in primary opcode map.
    pub fn new(mode: OperatingMode) -> Self {
        Self::with_table(mode, OpcodeTable::primary())
    }
}

impl<'t> Decoder<'t> {
    pub fn with_table(mode: OperatingMode, table: &'t OpcodeTable) -> Self {
        Self { mode, table }
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: OperatingMode) {
        self.mode = mode;
    }

    /// Decode the instruction at the start of `bytes`.
    ///
    /// Bytes after the instruction are ignored; compare
    /// [`DecodedInstruction::length`] against the input length to detect them.
    pub fn decode(&self, bytes: &[u8]) -> Result<DecodedInstruction> {
        let span = trace_span!("decode", mode = self.mode.bitness(), len = bytes.len());
        let _enter = span.enter();
        let mode = self.mode;
        let mut cur = ByteCursor::new(bytes);

        let prefixes = scan_prefixes(&mut cur, mode);
        trace!(count = prefixes.len(), "prefixes");

        let opcode = resolve_opcode(&mut cur, self.table, mode)?;

        let operand_size = effective_operand_size(mode, &prefixes);
        let address_size = effective_address_size(mode, &prefixes);

        let addressing = if opcode.has_modrm {
            Some(read_addressing(&mut cur, mode)?)
        } else {
            None
        };
        let modrm = addressing.map(|a| a.modrm);
        let sib = addressing.and_then(|a| a.sib);

        let wants_immediate = opcode.has_immediate
            || (opcode.test_group_immediate && modrm.is_some_and(|m| m.reg() <= 1));
        let immediate = if wants_immediate {
            let size = opcode
                .immediate_size
                .unwrap_or_else(|| ImmediateSize::from(operand_size));
            trace!(size = size.bytes(), "immediate");
            Some((size, read_immediate(&mut cur, size)?))
        } else {
            None
        };

        let segment = infer_segment(&prefixes, modrm, sib, mode);

        let (displacement, displacement_size) =
            addressing.map_or((None, 0), |a| (a.displacement, a.displacement_size));

        Ok(DecodedInstruction {
            prefixes,
            opcode,
            modrm,
            sib,
            displacement,
            displacement_size,
            immediate: immediate.map(|(_, value)| value),
            immediate_size: immediate.map_or(0, |(size, _)| size.bytes()),
            address_size,
            operand_size,
            segment,
            length: cur.position(),
        })
    }
}

/// Decode one instruction with the built-in opcode map.
pub fn decode(bytes: &[u8], mode: OperatingMode) -> Result<DecodedInstruction> {
    Decoder::new(mode).decode(bytes)
}
