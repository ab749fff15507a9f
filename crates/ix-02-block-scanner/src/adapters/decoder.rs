//! # Legacy Transaction Decoder
//!
//! ```text
//! tx     = version(4) | vin_count(varint) | input* | vout_count(varint) | output* | lock_time(4)
//! input  = prev_hash(32) | prev_index(4) | script_len(varint) | script | sequence(4)
//! output = value(8) | script_len(varint) | script
//! ```
//!
//! The decoder only measures the transaction; scripts are skipped, not parsed.

use shared_types::display_hash256;

use crate::domain::entities::DecodeOutcome;
use crate::domain::reader::{ByteReader, ReadError};
use crate::ports::outbound::TransactionDecoder;

/// Decoder for the pre-witness transaction layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyTransactionDecoder;

impl LegacyTransactionDecoder {
    pub fn new() -> Self {
        Self
    }
}

enum Failure {
    Truncated,
    Invalid(String),
}

impl From<ReadError> for Failure {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Truncated { .. } => Failure::Truncated,
            ReadError::Io(e) => Failure::Invalid(e.to_string()),
        }
    }
}

fn skip(reader: &mut ByteReader<&[u8]>, len: u64) -> Result<(), Failure> {
    let len = usize::try_from(len)
        .map_err(|_| Failure::Invalid(format!("script length {} out of range", len)))?;
    reader.read_exact_bytes(len)?;
    Ok(())
}

fn skip_script(reader: &mut ByteReader<&[u8]>) -> Result<(), Failure> {
    let len = reader.read_varint()?;
    skip(reader, len)
}

/// Length in bytes of the transaction at the start of `input`.
fn measure(input: &[u8]) -> Result<usize, Failure> {
    let mut reader = ByteReader::new(input);

    reader.read_exact_bytes(4)?; // version

    let vin_count = reader.read_varint()?;
    if vin_count == 0 {
        return Err(Failure::Invalid(
            "zero inputs (witness marker or empty input list)".into(),
        ));
    }
    for _ in 0..vin_count {
        skip(&mut reader, 36)?; // outpoint
        skip_script(&mut reader)?;
        skip(&mut reader, 4)?; // sequence
    }

    let vout_count = reader.read_varint()?;
    for _ in 0..vout_count {
        skip(&mut reader, 8)?; // value
        skip_script(&mut reader)?;
    }

    reader.read_exact_bytes(4)?; // lock_time

    usize::try_from(reader.consumed()).map_err(|e| Failure::Invalid(e.to_string()))
}

impl TransactionDecoder for LegacyTransactionDecoder {
    fn decode(&self, input: &[u8]) -> DecodeOutcome {
        match measure(input) {
            Ok(consumed) => DecodeOutcome::Complete {
                txid: display_hash256(&input[..consumed]),
                consumed,
            },
            Err(Failure::Truncated) => DecodeOutcome::Incomplete,
            Err(Failure::Invalid(reason)) => DecodeOutcome::Malformed(reason),
        }
    }
}
