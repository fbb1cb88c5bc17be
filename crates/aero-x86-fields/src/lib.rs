//! Field-level x86 instruction decoding.
//!
//! This crate reverse-parses the bytes of a single x86 instruction into its
//! architectural fields (legacy/REX prefixes, opcode, ModRM, SIB, displacement,
//! immediate) plus the effective operand/address widths and the segment the
//! memory operand resolves against. It does not try to understand what the
//! instruction *does*; that is the job of a full decoder such as `aero-x86`.
//!
//! Only the primary (one-byte) opcode map is supported. The table driving it is
//! a plain data structure ([`OpcodeTable`]) that can be swapped out by callers.
//!
//! ```
//! use aero_x86_fields::{decode, OperatingMode, SegmentRegister};
//!
//! // mov rbx, rax
//! let inst = decode(&[0x48, 0x89, 0xC3], OperatingMode::Bits64).unwrap();
//! assert_eq!(inst.prefixes[0].name, "REX.W");
//! assert_eq!(inst.opcode.value, 0x89);
//! assert_eq!(inst.segment, SegmentRegister::Ds);
//! ```

mod cursor;
mod decoder;
mod error;
mod immediate;
mod mode;
mod modrm;
mod opcode;
mod prefix;
mod segment;
mod size;

pub mod pipeline;

pub use cursor::ByteCursor;
pub use decoder::{decode, DecodedInstruction, Decoder};
pub use error::{DecodeError, DecodeErrorKind, Field, Result};
pub use immediate::ImmediateSize;
pub use mode::OperatingMode;
pub use modrm::{displacement_size, has_sib, ModRm, Sib};
pub use opcode::{OpcodeDescriptor, OpcodeTable, OpcodeTableBuilder};
pub use prefix::{PrefixRecord, Rex};
pub use segment::SegmentRegister;
pub use size::{AddressSize, OperandSize};
