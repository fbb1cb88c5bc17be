// Shared test helpers (integration tests compile as separate crates, so put
// common code in a submodule to avoid it becoming its own test target).
#![allow(dead_code)]

use aero_x86_fields::pipeline::{EncodeError, Encoder};
use aero_x86_fields::OperatingMode;
use aero_x86_fields::OperatingMode::{Bits16, Bits32, Bits64};

/// Reference encodings, Intel syntax, assembled at address 0.
pub const CORPUS: &[(OperatingMode, &str, &[u8])] = &[
    (Bits64, "mov rbx, rax", &[0x48, 0x89, 0xC3]),
    (
        Bits64,
        "mov rax, qword ptr [rip+0x12345678]",
        &[0x48, 0x8B, 0x05, 0x78, 0x56, 0x34, 0x12],
    ),
    (
        Bits64,
        "mov rax, qword ptr [rbx+rcx*4+0x12345678]",
        &[0x48, 0x8B, 0x84, 0x8B, 0x78, 0x56, 0x34, 0x12],
    ),
    (Bits64, "add eax, 1", &[0x83, 0xC0, 0x01]),
    (Bits64, "push rbp", &[0x55]),
    (
        Bits64,
        "mov dword ptr fs:[rax], 5",
        &[0x64, 0xC7, 0x00, 0x05, 0x00, 0x00, 0x00],
    ),
    (Bits64, "lea rsp, [rsp+8]", &[0x48, 0x8D, 0x64, 0x24, 0x08]),
    (Bits64, "ret", &[0xC3]),
    (Bits64, "call 0x10", &[0xE8, 0x0B, 0x00, 0x00, 0x00]),
    (
        Bits64,
        "mov eax, 0x12345678",
        &[0xB8, 0x78, 0x56, 0x34, 0x12],
    ),
    (
        Bits64,
        "mov r13d, dword ptr [r13+8]",
        &[0x45, 0x8B, 0x6D, 0x08],
    ),
    (Bits32, "mov eax, dword ptr [ebp-8]", &[0x8B, 0x45, 0xF8]),
    (Bits32, "mov ax, 0x1234", &[0x66, 0xB8, 0x34, 0x12]),
    (Bits32, "rep movsd", &[0xF3, 0xA5]),
    (Bits32, "lock add dword ptr [eax], ecx", &[0xF0, 0x01, 0x08]),
    (Bits32, "test al, 0x7f", &[0xA8, 0x7F]),
    (Bits32, "jmp 2", &[0xEB, 0x00]),
    (Bits32, "imul eax, ecx, 10", &[0x6B, 0xC1, 0x0A]),
    (
        Bits32,
        "mov dword ptr [esp+4], 1",
        &[0xC7, 0x44, 0x24, 0x04, 0x01, 0x00, 0x00, 0x00],
    ),
    (Bits32, "inc eax", &[0x40]),
    (
        Bits32,
        "test dword ptr [ebx], 0x100",
        &[0xF7, 0x03, 0x00, 0x01, 0x00, 0x00],
    ),
    (Bits16, "mov ax, word ptr [bp+si]", &[0x8B, 0x02]),
    (
        Bits16,
        "mov ax, word ptr [0x1234]",
        &[0x8B, 0x06, 0x34, 0x12],
    ),
    (Bits16, "int 0x10", &[0xCD, 0x10]),
    (Bits16, "mov eax, 1", &[0x66, 0xB8, 0x01, 0x00, 0x00, 0x00]),
    (
        Bits16,
        "add byte ptr [bx+di+0x10], 5",
        &[0x80, 0x41, 0x10, 0x05],
    ),
    (Bits16, "push cs", &[0x0E]),
];

/// Encoder backed by [`CORPUS`].
pub struct CorpusEncoder;

impl Encoder for CorpusEncoder {
    fn encode(&self, statement: &str, mode: OperatingMode) -> Result<Vec<u8>, EncodeError> {
        CORPUS
            .iter()
            .find(|(m, text, _)| *m == mode && *text == statement)
            .map(|(_, _, bytes)| bytes.to_vec())
            .ok_or_else(|| EncodeError::Rejected {
                statement: statement.to_string(),
                reason: "not in corpus".to_string(),
            })
    }
}

/// Tiny deterministic PRNG for test input generation.
pub struct XorShift64(pub u64);

impl XorShift64 {
    pub fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.0;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.0 = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    pub fn fill(&mut self, buf: &mut [u8]) {
        for chunk in buf.chunks_mut(8) {
            let v = self.next_u64().to_le_bytes();
            let n = chunk.len();
            chunk.copy_from_slice(&v[..n]);
        }
    }
}
