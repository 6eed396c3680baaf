//! Error taxonomy for the codec, session, and dispatch layers.
//!
//! Each enum corresponds to one surface point in the error handling design:
//! reader/IMEI/frame/record/IO-table errors are fatal to the session that
//! raised them; store/publish errors are logged and otherwise swallowed.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReaderError {
    #[error("truncated buffer: needed {needed} bytes, had {available}")]
    Truncated { needed: usize, available: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImeiError {
    #[error("imei length mismatch: prefix said {expected}, got {actual} bytes")]
    ImeiLengthMismatch { expected: usize, actual: usize },
    #[error("imei contains a non-ASCII-digit byte: {0:#04x}")]
    ImeiNotAscii(u8),
    #[error(transparent)]
    Reader(#[from] ReaderError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("invalid preamble: expected 0x00000000, got {0:#010x}")]
    InvalidPreamble(u32),
    #[error("unsupported codec id: {0:#04x}")]
    UnsupportedCodec(u8),
    #[error("record count mismatch: header said {header}, trailer said {trailer}")]
    RecordCountMismatch { header: u8, trailer: u8 },
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error(transparent)]
    Reader(#[from] ReaderError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("invalid priority byte: {0}")]
    InvalidPriority(u8),
    #[error(transparent)]
    IoTable(#[from] IoTableError),
    #[error(transparent)]
    Reader(#[from] ReaderError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IoTableError {
    #[error("io table count mismatch: n1+n2+n4+n8 = {summed} but total_count = {total}")]
    IoCountMismatch { total: u16, summed: u16 },
    #[error(transparent)]
    Reader(#[from] ReaderError),
}

/// Raised by a session; carries enough context for the caller to decide
/// whether to close silently (EOF) or log a warning (anything else).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Imei(#[from] ImeiError),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("peer closed the connection before a complete frame arrived")]
    Eof,
}

#[derive(Debug, Error)]
#[error("store error: {0}")]
pub struct StoreError(pub String);

#[derive(Debug, Error)]
#[error("publish error: {0}")]
pub struct PubError(pub String);
