//! Text → bytes → fields.
//!
//! The assembler lives outside this crate; hosts plug one in through
//! [`Encoder`]. The pipeline keeps "could not assemble" and "assembled, but
//! could not decode" apart so front-ends can report them differently.

use thiserror::Error;
use tracing::debug;

use crate::decoder::{DecodedInstruction, Decoder};
use crate::error::DecodeError;
use crate::mode::OperatingMode;

/// Failure reported by an [`Encoder`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Nothing to assemble after trimming.
    #[error("empty instruction text")]
    Empty,

    /// The assembler rejected the statement.
    #[error("failed to assemble `{statement}`: {reason}")]
    Rejected { statement: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("assembled bytes could not be decoded: {0}")]
    Decode(#[from] DecodeError),
}

/// Turns one assembly statement into machine code.
pub trait Encoder {
    fn encode(&self, statement: &str, mode: OperatingMode) -> Result<Vec<u8>, EncodeError>;
}

impl<F> Encoder for F
where
    F: Fn(&str, OperatingMode) -> Result<Vec<u8>, EncodeError>,
{
    fn encode(&self, statement: &str, mode: OperatingMode) -> Result<Vec<u8>, EncodeError> {
        self(statement, mode)
    }
}

/// First `;`-separated statement of `text`, trimmed.
pub fn first_statement(text: &str) -> &str {
    text.split(';').next().unwrap_or_default().trim()
}

/// Assemble the first statement of `text` and decode the resulting bytes.
pub fn assemble_and_decode<E: Encoder + ?Sized>(
    encoder: &E,
    text: &str,
    mode: OperatingMode,
) -> Result<DecodedInstruction, PipelineError> {
    assemble_and_decode_with(encoder, text, Decoder::new(mode))
}

/// Like [`assemble_and_decode`], with an explicit decoder (and so opcode table).
pub fn assemble_and_decode_with<E: Encoder + ?Sized>(
    encoder: &E,
    text: &str,
    decoder: Decoder<'_>,
) -> Result<DecodedInstruction, PipelineError> {
    let statement = first_statement(text);
    if statement.is_empty() {
        return Err(EncodeError::Empty.into());
    }

    let bytes = encoder
        .encode(statement, decoder.mode())
        .inspect_err(|err| debug!(%err, statement, "encoder rejected statement"))?;
    debug!(statement, bytes = ?bytes, "assembled");

    Ok(decoder.decode(&bytes)?)
}
